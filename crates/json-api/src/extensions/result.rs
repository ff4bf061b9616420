//! Collapsing unexpected failures into logged 500s.

use std::fmt::Display;

use salvo::prelude::StatusError;
use tracing::error;

/// Turn an error that the caller cannot act on into a 500, logging it first.
pub(crate) trait ResultExt<T> {
    fn or_500(self, context: &str) -> Result<T, StatusError>;
}

impl<T, E: Display> ResultExt<T> for Result<T, E> {
    fn or_500(self, context: &str) -> Result<T, StatusError> {
        self.map_err(|source| {
            error!(%source, "{context}");

            StatusError::internal_server_error()
        })
    }
}
