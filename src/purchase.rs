//! Catalog product, purchase record, and client-side extended purchase types.

use serde::{Deserialize, Serialize};

use crate::types::{BuyCount, CategoryId, Money, ProductId, PurchaseId, PurchaseStatus, UserId};

/// Product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category identity.
    #[serde(rename = "_id")]
    pub id: CategoryId,
    /// Display name.
    pub name: String,
}

/// Catalog product as served by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Product identity.
    #[serde(rename = "_id")]
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Primary image URL.
    pub image: String,
    /// Current unit price.
    pub price: Money,
    /// Unit price before discount.
    pub price_before_discount: Money,
    /// Units available in stock.
    pub quantity: BuyCount,
    /// Gallery image URLs.
    #[serde(default)]
    pub images: Vec<String>,
    /// Average rating, 0 to 5.
    #[serde(default)]
    pub rating: f64,
    /// Units sold so far.
    #[serde(default)]
    pub sold: u64,
    /// View counter.
    #[serde(default)]
    pub view: u64,
    /// Long-form HTML description.
    #[serde(default)]
    pub description: String,
    /// Owning category, when the backend populates it.
    #[serde(default)]
    pub category: Option<Category>,
}

/// Server-owned purchase record linking a user, a product, and a quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    /// Purchase identity.
    #[serde(rename = "_id")]
    pub id: PurchaseId,
    /// Units purchased.
    pub buy_count: BuyCount,
    /// Unit price captured on the purchase.
    pub price: Money,
    /// Unit price before discount captured on the purchase.
    pub price_before_discount: Money,
    /// Status partition.
    pub status: PurchaseStatus,
    /// Owning user.
    pub user: UserId,
    /// Referenced product.
    pub product: Product,
}

/// Purchase annotated with client-only selection and in-flight flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtendedPurchase {
    /// Server record. `buy_count` may run ahead of the server while editing.
    #[serde(flatten)]
    pub purchase: Purchase,
    /// Selected for checkout.
    pub is_checked: bool,
    /// A mutation touching this row is in flight.
    pub is_disabled: bool,
}

impl ExtendedPurchase {
    /// Wraps a fetched purchase with both flags cleared.
    pub fn new(purchase: Purchase) -> Self {
        Self {
            purchase,
            is_checked: false,
            is_disabled: false,
        }
    }

    /// Purchase identity.
    pub fn id(&self) -> &PurchaseId {
        &self.purchase.id
    }

    /// Current (possibly optimistic) quantity.
    pub fn buy_count(&self) -> BuyCount {
        self.purchase.buy_count
    }

    /// Request line that would buy or update this row as shown.
    pub fn line(&self) -> PurchaseLine {
        PurchaseLine {
            product_id: self.purchase.product.id.clone(),
            buy_count: self.purchase.buy_count,
        }
    }
}

/// `(product, quantity)` body shared by add-to-cart, update, and buy calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseLine {
    /// Product to buy.
    pub product_id: ProductId,
    /// Units.
    pub buy_count: BuyCount,
}
