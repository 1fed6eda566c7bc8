//! Backend collaborator interfaces and wire envelopes.

/// reqwest implementation of every backend call.
pub mod http;
/// Product list query options.
pub mod query;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    form::FieldErrors,
    persist::PersistError,
    purchase::{Purchase, PurchaseLine},
    types::{PurchaseId, PurchaseStatus},
};

/// Successful response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessResponse<T> {
    /// User-facing message.
    pub message: String,
    /// Payload.
    pub data: T,
}

/// Error response body; `data` holds per-field messages on validation errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// User-facing message.
    #[serde(default)]
    pub message: String,
    /// Optional structured detail.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Payload of the delete-purchases call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedCount {
    /// Rows removed by the backend.
    pub deleted_count: u64,
}

/// Failures surfaced by backend calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Connection, timeout, or protocol failure.
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),
    /// Body did not match the expected shape.
    #[error("decode: {0}")]
    Decode(#[from] serde_json::Error),
    /// 422 with per-field messages.
    #[error("validation failed: {message}")]
    Validation {
        /// Top-level message.
        message: String,
        /// Field name to message.
        fields: FieldErrors,
    },
    /// 401; the stored session has been cleared.
    #[error("unauthorized: {message}")]
    Unauthorized {
        /// Server message.
        message: String,
    },
    /// Any other non-success status.
    #[error("http {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Server message.
        message: String,
    },
    /// Session storage could not be read or written.
    #[error("session storage: {0}")]
    Storage(#[from] PersistError),
    /// Failure produced outside the HTTP layer.
    #[error("{0}")]
    Message(String),
}

impl ApiError {
    /// Text suitable for a transient notification.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Validation { message, .. }
            | ApiError::Unauthorized { message }
            | ApiError::Status { message, .. }
            | ApiError::Message(message)
                if !message.is_empty() =>
            {
                message.clone()
            }
            other => other.to_string(),
        }
    }
}

/// Result alias for backend calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Purchase endpoints the cart runtime depends on.
#[async_trait]
pub trait PurchaseApi: Send + Sync {
    /// Purchases in `status`, in server order.
    async fn get_purchases(&self, status: PurchaseStatus) -> ApiResult<Vec<Purchase>>;
    /// Adds a product to the cart and returns the cart row.
    async fn add_to_cart(&self, line: PurchaseLine) -> ApiResult<Purchase>;
    /// Replaces the quantity of the cart row for `line.product_id`.
    async fn update_purchase(&self, line: PurchaseLine) -> ApiResult<Purchase>;
    /// Removes cart rows.
    async fn delete_purchases(&self, ids: Vec<PurchaseId>) -> ApiResult<DeletedCount>;
    /// Checks out lines and returns the confirmation message.
    async fn buy_products(&self, lines: Vec<PurchaseLine>) -> ApiResult<String>;
}
