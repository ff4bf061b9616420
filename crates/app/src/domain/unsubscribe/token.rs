//! Unsubscribe tokens.
//!
//! A token is `base64url("{user_uuid}:{unix_seconds}:{sig}")` where `sig` is
//! the first 16 hex characters of HMAC-SHA256 over `"{user_uuid}:{unix_seconds}"`.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jiff::{SignedDuration, Timestamp};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    domain::users::records::UserUuid,
    signing::{MessageSigner, SigningKeyError},
};

/// How long an unsubscribe link stays valid.
pub const TOKEN_VALIDITY: SignedDuration = SignedDuration::from_hours(30 * 24);

const SIGNATURE_HEX_LENGTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token is empty")]
    Empty,

    #[error("token is malformed")]
    Malformed,

    #[error("token signature does not match")]
    BadSignature,

    #[error("token has expired")]
    Expired,
}

/// Issues and verifies unsubscribe tokens.
#[derive(Debug, Clone)]
pub struct UnsubscribeSigner {
    signer: MessageSigner,
}

impl UnsubscribeSigner {
    /// # Errors
    ///
    /// Returns an error if `secret` is blank or not a usable HMAC key.
    pub fn new(secret: &[u8]) -> Result<Self, SigningKeyError> {
        Ok(Self {
            signer: MessageSigner::new(secret)?,
        })
    }

    /// Token for `user`, issued at `issued_at`.
    #[must_use]
    pub fn sign(&self, user: UserUuid, issued_at: Timestamp) -> String {
        let data = format!("{user}:{}", issued_at.as_second());
        let signature = self.signer.sign_hex(data.as_bytes());
        let short = signature.get(..SIGNATURE_HEX_LENGTH).unwrap_or(&signature);

        URL_SAFE_NO_PAD.encode(format!("{data}:{short}"))
    }

    /// Recover the user a token was issued for.
    ///
    /// # Errors
    ///
    /// Returns a [`TokenError`] if the token is empty, malformed, forged or
    /// older than [`TOKEN_VALIDITY`] at `now`.
    pub fn verify(&self, token: &str, now: Timestamp) -> Result<UserUuid, TokenError> {
        let token = token.trim();

        if token.is_empty() {
            return Err(TokenError::Empty);
        }

        let decoded = URL_SAFE_NO_PAD
            .decode(token.trim_end_matches('='))
            .map_err(|_ignored| TokenError::Malformed)?;

        let payload = String::from_utf8(decoded).map_err(|_ignored| TokenError::Malformed)?;

        let mut parts = payload.split(':');

        let (Some(user), Some(seconds), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Malformed);
        };

        if signature.len() != SIGNATURE_HEX_LENGTH {
            return Err(TokenError::BadSignature);
        }

        let tag = hex::decode(signature).map_err(|_ignored| TokenError::BadSignature)?;
        let data = format!("{user}:{seconds}");

        if !self.signer.verify_truncated(data.as_bytes(), &tag) {
            return Err(TokenError::BadSignature);
        }

        let issued_at = seconds
            .parse::<i64>()
            .ok()
            .and_then(|seconds| Timestamp::from_second(seconds).ok())
            .ok_or(TokenError::Malformed)?;

        if now.duration_since(issued_at) > TOKEN_VALIDITY {
            return Err(TokenError::Expired);
        }

        let user = Uuid::parse_str(user).map_err(|_ignored| TokenError::Malformed)?;

        Ok(UserUuid::from_uuid(user))
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn signer() -> Result<UnsubscribeSigner, SigningKeyError> {
        UnsubscribeSigner::new(b"unsubscribe-secret")
    }

    fn issued() -> Timestamp {
        Timestamp::from_second(1_792_375_200).unwrap_or(Timestamp::UNIX_EPOCH)
    }

    #[test]
    fn token_round_trips_within_validity() -> TestResult {
        let signer = signer()?;
        let user = UserUuid::new();

        let token = signer.sign(user, issued());
        let later = issued() + SignedDuration::from_hours(24 * 29);

        assert_eq!(signer.verify(&token, later), Ok(user));

        Ok(())
    }

    #[test]
    fn token_payload_is_readable() -> TestResult {
        let signer = signer()?;
        let user = UserUuid::new();

        let token = signer.sign(user, issued());
        let payload = String::from_utf8(URL_SAFE_NO_PAD.decode(&token)?)?;

        assert!(
            payload.starts_with(&format!("{user}:1792375200:")),
            "unexpected payload {payload}"
        );
        assert_eq!(payload.rsplit(':').next().map(str::len), Some(16));

        Ok(())
    }

    #[test]
    fn expired_token_is_rejected() -> TestResult {
        let signer = signer()?;
        let token = signer.sign(UserUuid::new(), issued());
        let later = issued() + SignedDuration::from_hours(24 * 31);

        assert_eq!(signer.verify(&token, later), Err(TokenError::Expired));

        Ok(())
    }

    #[test]
    fn tampered_user_is_rejected() -> TestResult {
        let signer = signer()?;
        let token = signer.sign(UserUuid::new(), issued());

        let payload = String::from_utf8(URL_SAFE_NO_PAD.decode(&token)?)?;
        let (_, rest) = payload.split_once(':').ok_or("missing separator")?;
        let forged = URL_SAFE_NO_PAD.encode(format!("{}:{rest}", UserUuid::new()));

        assert_eq!(signer.verify(&forged, issued()), Err(TokenError::BadSignature));

        Ok(())
    }

    #[test]
    fn token_from_other_secret_is_rejected() -> TestResult {
        let token = UnsubscribeSigner::new(b"other")?.sign(UserUuid::new(), issued());

        assert_eq!(signer()?.verify(&token, issued()), Err(TokenError::BadSignature));

        Ok(())
    }

    #[test]
    fn garbage_is_rejected() -> TestResult {
        let signer = signer()?;

        assert_eq!(signer.verify("", issued()), Err(TokenError::Empty));
        assert_eq!(signer.verify("%%%", issued()), Err(TokenError::Malformed));
        assert_eq!(
            signer.verify(&URL_SAFE_NO_PAD.encode("a:b"), issued()),
            Err(TokenError::Malformed)
        );

        Ok(())
    }

    #[test]
    fn empty_secret_cannot_sign() {
        assert!(
            matches!(UnsubscribeSigner::new(b""), Err(SigningKeyError::Blank)),
            "empty secret must be refused"
        );
    }
}
