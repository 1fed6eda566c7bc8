//! Cart mutation model dispatched to the purchase API.

use crate::{
    purchase::PurchaseLine,
    types::{BuyCount, ProductId, PurchaseId},
};

/// Network mutation issued on behalf of the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Replace the quantity of one cart row.
    UpdateQuantity {
        /// Row whose quantity changes.
        id: PurchaseId,
        /// Product referenced by the row.
        product_id: ProductId,
        /// New quantity.
        buy_count: BuyCount,
    },
    /// Remove cart rows.
    Delete {
        /// Rows to remove.
        ids: Vec<PurchaseId>,
    },
    /// Check out cart rows.
    Buy {
        /// Rows being bought, parallel to `lines`.
        ids: Vec<PurchaseId>,
        /// Request body.
        lines: Vec<PurchaseLine>,
    },
    /// Put a product into the cart, then navigate there.
    AddToCart {
        /// Request body.
        line: PurchaseLine,
    },
}

/// Coarse mutation discriminant reported in events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// [`Mutation::UpdateQuantity`].
    UpdateQuantity,
    /// [`Mutation::Delete`].
    Delete,
    /// [`Mutation::Buy`].
    Buy,
    /// [`Mutation::AddToCart`].
    AddToCart,
}

impl Mutation {
    /// Coarse discriminant.
    pub fn kind(&self) -> MutationKind {
        match self {
            Mutation::UpdateQuantity { .. } => MutationKind::UpdateQuantity,
            Mutation::Delete { .. } => MutationKind::Delete,
            Mutation::Buy { .. } => MutationKind::Buy,
            Mutation::AddToCart { .. } => MutationKind::AddToCart,
        }
    }

    /// Existing cart rows this mutation puts into the committing state.
    pub fn affected_ids(&self) -> Vec<PurchaseId> {
        match self {
            Mutation::UpdateQuantity { id, .. } => vec![id.clone()],
            Mutation::Delete { ids } | Mutation::Buy { ids, .. } => ids.clone(),
            Mutation::AddToCart { .. } => Vec::new(),
        }
    }
}
