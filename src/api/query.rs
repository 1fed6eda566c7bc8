use serde::{Deserialize, Serialize};

use crate::{
    purchase::Product,
    types::{CategoryId, Money, ProductId},
};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

/// Product list sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortBy {
    /// Newest first.
    #[serde(rename = "createdAt")]
    CreatedAt,
    /// Most viewed.
    #[serde(rename = "view")]
    View,
    /// Best selling.
    #[serde(rename = "sold")]
    Sold,
    /// By price; direction from [`Order`].
    #[serde(rename = "price")]
    Price,
}

/// Query-string options for the product list. Unset fields are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductQuery {
    /// 1-based page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Page size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Direction for [`SortBy::Price`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
    /// Sort key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortBy>,
    /// Restrict to one category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryId>,
    /// Leave this product out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<ProductId>,
    /// Minimum star rating.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating_filter: Option<u8>,
    /// Upper price bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_max: Option<Money>,
    /// Lower price bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_min: Option<Money>,
    /// Name search.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ProductQuery {
    /// Default listing: first page, 20 per page, newest first.
    pub fn first_page() -> Self {
        Self {
            page: Some(1),
            limit: Some(20),
            sort_by: Some(SortBy::CreatedAt),
            ..Self::default()
        }
    }

    /// Products similar to `product`: same category, excluding itself.
    pub fn related_to(product: &Product) -> Self {
        Self {
            page: Some(1),
            limit: Some(20),
            category: product.category.as_ref().map(|c| c.id.clone()),
            exclude: Some(product.id.clone()),
            ..Self::default()
        }
    }
}

/// Paging block of a product list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Current page.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    /// Total number of pages.
    pub page_size: u32,
}

/// One page of products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    /// Products on this page.
    pub products: Vec<Product>,
    /// Paging info.
    pub pagination: Pagination,
}
