//! Runtime event stream payloads.

use crate::{
    op::MutationKind,
    types::{BuyCount, PurchaseId},
};

/// Severity of a transient notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Neutral hint, e.g. nothing selected.
    Info,
    /// Confirmation from the backend.
    Success,
    /// A mutation failed.
    Error,
}

/// Transient, non-blocking user notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Text to show.
    pub message: String,
}

impl Notice {
    pub(crate) fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Events emitted from the cart runtime loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEvent {
    /// A fetch was reconciled into the store.
    Reconciled {
        /// Rows now in the store.
        count: usize,
    },
    /// A row's displayed quantity changed locally.
    QuantityEdited {
        /// Edited row.
        id: PurchaseId,
        /// Value now shown.
        buy_count: BuyCount,
    },
    /// A mutation was sent.
    Dispatched {
        /// Mutation kind.
        kind: MutationKind,
    },
    /// A mutation succeeded; a refetch follows.
    Succeeded {
        /// Mutation kind.
        kind: MutationKind,
    },
    /// A mutation failed; rows are back to idle, nothing rolled back.
    Failed {
        /// Mutation kind.
        kind: MutationKind,
    },
    /// Notification for the user.
    Notice(Notice),
    /// The store was cleared.
    Reset,
}
