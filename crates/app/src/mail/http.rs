//! Mail delivery through an HTTP relay.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::mail::{MailError, MailTransport};

/// Mail relay settings.
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// Endpoint accepting `POST` message submissions.
    pub relay_url: String,

    pub api_token: String,
    pub from_address: String,
    pub from_name: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct HttpMailTransport {
    config: MailConfig,
    http: Client,
}

impl HttpMailTransport {
    /// Create a transport for the given relay.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: MailConfig) -> Result<Self, MailError> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { config, http })
    }
}

#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    from: RelayAddress<'a>,
    to: [RelayAddress<'a>; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Debug, Serialize)]
struct RelayAddress<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

fn is_plausible_address(address: &str) -> bool {
    match address.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !address.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

#[async_trait]
impl MailTransport for HttpMailTransport {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailError> {
        if !is_plausible_address(to) {
            return Err(MailError::InvalidRecipient(to.to_string()));
        }

        let message = RelayMessage {
            from: RelayAddress {
                email: &self.config.from_address,
                name: Some(&self.config.from_name),
            },
            to: [RelayAddress {
                email: to,
                name: None,
            }],
            subject,
            html: html_body,
        };

        let response = self
            .http
            .post(&self.config.relay_url)
            .bearer_auth(&self.config.api_token)
            .json(&message)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();

            return Err(MailError::Rejected { status, body });
        }

        debug!("relayed email");

        Ok(())
    }
}
