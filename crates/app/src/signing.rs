//! HMAC-SHA256 message signing.

use std::fmt::{Debug, Formatter, Result as FmtResult};

use hmac::{Hmac, Mac, digest::InvalidLength};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SigningKeyError {
    /// Empty or whitespace only.
    #[error("signing key is empty or blank")]
    Blank,

    #[error("signing key rejected")]
    Rejected(#[from] InvalidLength),
}

/// A keyed HMAC-SHA256 signer. Verification is constant time.
#[derive(Clone)]
pub struct MessageSigner {
    mac: HmacSha256,
}

impl MessageSigner {
    /// Create a signer for `secret`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is blank or rejected by the MAC
    /// implementation.
    pub fn new(secret: &[u8]) -> Result<Self, SigningKeyError> {
        if secret.trim_ascii().is_empty() {
            return Err(SigningKeyError::Blank);
        }

        Ok(Self {
            mac: HmacSha256::new_from_slice(secret)?,
        })
    }

    /// Raw 32-byte tag for `message`.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();

        mac.update(message);

        mac.finalize().into_bytes().to_vec()
    }

    /// Lowercase hex tag for `message`.
    #[must_use]
    pub fn sign_hex(&self, message: &[u8]) -> String {
        hex::encode(self.sign(message))
    }

    /// Check a full-length tag.
    #[must_use]
    pub fn verify(&self, message: &[u8], tag: &[u8]) -> bool {
        let mut mac = self.mac.clone();

        mac.update(message);

        mac.verify_slice(tag).is_ok()
    }

    /// Check a tag truncated to its leftmost bytes. Empty tags never match.
    #[must_use]
    pub fn verify_truncated(&self, message: &[u8], tag: &[u8]) -> bool {
        let mut mac = self.mac.clone();

        mac.update(message);

        mac.verify_truncated_left(tag).is_ok()
    }
}

impl Debug for MessageSigner {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("MessageSigner").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn signature_verifies_against_same_message() -> TestResult {
        let signer = MessageSigner::new(b"secret")?;
        let tag = signer.sign(b"hello");

        assert!(signer.verify(b"hello", &tag));
        assert!(!signer.verify(b"hello!", &tag));

        Ok(())
    }

    #[test]
    fn different_keys_produce_different_tags() -> TestResult {
        let a = MessageSigner::new(b"key-a")?;
        let b = MessageSigner::new(b"key-b")?;

        assert_ne!(a.sign_hex(b"payload"), b.sign_hex(b"payload"));

        Ok(())
    }

    #[test]
    fn truncated_tag_matches_prefix_only() -> TestResult {
        let signer = MessageSigner::new(b"secret")?;
        let tag = signer.sign(b"message");
        let prefix = tag.get(..8).ok_or("tag too short")?;

        assert!(signer.verify_truncated(b"message", prefix));
        assert!(!signer.verify_truncated(b"other", prefix));
        assert!(!signer.verify_truncated(b"message", &[]));

        Ok(())
    }

    #[test]
    fn blank_keys_are_refused() {
        for secret in [&b""[..], b"   ", b"\t\n"] {
            assert!(
                matches!(MessageSigner::new(secret), Err(SigningKeyError::Blank)),
                "{secret:?} should be refused"
            );
        }
    }

    #[test]
    fn debug_output_hides_key() -> TestResult {
        let signer = MessageSigner::new(b"super-secret")?;

        assert!(!format!("{signer:?}").contains("super-secret"));

        Ok(())
    }
}
