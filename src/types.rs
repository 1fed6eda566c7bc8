//! Shared primitive IDs, money aliases, and purchase status codes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Integral currency amount.
pub type Money = u64;
/// Number of units of a product in one purchase.
pub type BuyCount = u32;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Returns the raw identifier text.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Server-assigned purchase identity.
    PurchaseId
);
string_id!(
    /// Server-assigned product identity.
    ProductId
);
string_id!(
    /// Server-assigned user identity.
    UserId
);
string_id!(
    /// Server-assigned category identity.
    CategoryId
);

/// Status code partitioning purchase records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum PurchaseStatus {
    /// Sitting in the cart.
    InCart,
    /// Every status; only meaningful as a query filter.
    All,
    /// Ordered, waiting for the shop to confirm.
    WaitForConfirmation,
    /// Confirmed, waiting for pickup.
    WaitForGetting,
    /// Being shipped.
    InProgress,
    /// Delivered to the buyer.
    Delivered,
    /// Cancelled.
    Cancelled,
}

impl PurchaseStatus {
    /// Status shown on the completed-orders view.
    pub const COMPLETED: PurchaseStatus = PurchaseStatus::Delivered;

    /// Wire code for this status.
    pub fn code(self) -> i32 {
        match self {
            PurchaseStatus::InCart => -1,
            PurchaseStatus::All => 0,
            PurchaseStatus::WaitForConfirmation => 1,
            PurchaseStatus::WaitForGetting => 2,
            PurchaseStatus::InProgress => 3,
            PurchaseStatus::Delivered => 4,
            PurchaseStatus::Cancelled => 5,
        }
    }
}

/// Error for status codes the backend does not define.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown purchase status code {0}")]
pub struct UnknownStatus(pub i32);

impl TryFrom<i32> for PurchaseStatus {
    type Error = UnknownStatus;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            -1 => Ok(PurchaseStatus::InCart),
            0 => Ok(PurchaseStatus::All),
            1 => Ok(PurchaseStatus::WaitForConfirmation),
            2 => Ok(PurchaseStatus::WaitForGetting),
            3 => Ok(PurchaseStatus::InProgress),
            4 => Ok(PurchaseStatus::Delivered),
            5 => Ok(PurchaseStatus::Cancelled),
            other => Err(UnknownStatus(other)),
        }
    }
}

impl From<PurchaseStatus> for i32 {
    fn from(status: PurchaseStatus) -> Self {
        status.code()
    }
}
