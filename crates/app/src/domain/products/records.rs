//! Product Records

use std::{convert::Infallible, fmt, str::FromStr};

use crate::uuids::TypedUuid;

/// Product UUID
pub type ProductUuid = TypedUuid<ProductRecord>;

/// What buying a product grants.
///
/// Stored as text so that kinds introduced later by the catalog still load;
/// they surface as [`ProductKind::Unrecognised`] and grant nothing here.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProductKind {
    /// Adds one paid invitation credit per unit purchased.
    CreditTopup,

    /// Entitles the buyer to one promotion email recipient per unit purchased.
    ServiceEntitlement,

    /// A kind this build does not know how to fulfil.
    Unrecognised(String),
}

impl ProductKind {
    pub const CREDIT_TOPUP: &'static str = "credit_topup";
    pub const SERVICE_ENTITLEMENT: &'static str = "service_entitlement";

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::CreditTopup => Self::CREDIT_TOPUP,
            Self::ServiceEntitlement => Self::SERVICE_ENTITLEMENT,
            Self::Unrecognised(kind) => kind,
        }
    }
}

impl From<String> for ProductKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            Self::CREDIT_TOPUP => Self::CreditTopup,
            Self::SERVICE_ENTITLEMENT => Self::ServiceEntitlement,
            _ => Self::Unrecognised(value),
        }
    }
}

impl FromStr for ProductKind {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(value.to_string()))
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Product Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub uuid: ProductUuid,
    pub kind: ProductKind,
    pub name: String,
    pub description: String,

    /// Unit price in minor currency units.
    pub price: u64,
}
