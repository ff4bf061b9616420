//! Outbound email.

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

mod http;

pub use http::{HttpMailTransport, MailConfig};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail relay request failed")]
    Http(#[from] reqwest::Error),

    #[error("mail relay rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("invalid recipient address: {0}")]
    InvalidRecipient(String),
}

/// Delivers a single HTML email.
#[automock]
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailError>;
}
