//! Shared status parsing.

use thiserror::Error;

/// A stored status or type string that does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown value: {0}")]
pub struct UnknownVariant(pub String);

pub(crate) fn decode_column<T>(index: &str, value: &str) -> Result<T, sqlx::Error>
where
    T: std::str::FromStr<Err = UnknownVariant>,
{
    value.parse().map_err(|e: UnknownVariant| sqlx::Error::ColumnDecode {
        index: index.to_string(),
        source: Box::new(e),
    })
}
