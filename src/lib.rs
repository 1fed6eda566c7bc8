//! Storefront cart client: purchase reconciliation, debounced quantity
//! commits, checkout totals, and the REST backend they talk to.
//!
//! # Examples
//!
//! Pure reconciliation with [`core::reconcile`]:
//! ```
//! use shopcart::{
//!     core::{reconcile::{reconcile, toggle_all}, totals::Totals},
//!     purchase::{Product, Purchase},
//!     types::PurchaseStatus,
//! };
//!
//! let product = Product {
//!     id: "p1".into(),
//!     name: "Mug".to_string(),
//!     image: String::new(),
//!     price: 100,
//!     price_before_discount: 150,
//!     quantity: 10,
//!     images: vec![],
//!     rating: 0.0,
//!     sold: 0,
//!     view: 0,
//!     description: String::new(),
//!     category: None,
//! };
//! let fetched = vec![Purchase {
//!     id: "a".into(),
//!     buy_count: 2,
//!     price: 100,
//!     price_before_discount: 150,
//!     status: PurchaseStatus::InCart,
//!     user: "u1".into(),
//!     product,
//! }];
//!
//! let store = reconcile(&fetched, &[], None);
//! assert!(!store[0].is_checked);
//! let store = toggle_all(&store);
//! let totals = Totals::compute(&store);
//! assert_eq!(totals.total_amount, 200);
//! assert_eq!(totals.total_saved, 100);
//! ```
//!
//! Runtime usage against the HTTP backend:
//! ```no_run
//! use std::sync::Arc;
//!
//! use shopcart::{
//!     api::http::{ClientConfig, HttpClient},
//!     core::quantity::QuantityAction,
//!     persist::sqlite::SqliteSessionStorage,
//!     runtime::handle::{spawn_cart, CartConfig},
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let storage = SqliteSessionStorage::open("session.db").expect("open sqlite");
//! let client = HttpClient::new(ClientConfig::from_env(), Box::new(storage)).expect("client");
//! let cart = spawn_cart(Arc::new(client), CartConfig::default());
//! cart.enter_cart(None).await.expect("load cart");
//! cart.change_quantity(0, QuantityAction::Increase, 1).await.expect("increase");
//! cart.shutdown().await.expect("shutdown");
//! # }
//! ```

#![deny(missing_docs)]

/// Backend collaborator trait and reqwest client.
pub mod api;
/// Reducers, store, quantity rules, totals, and session state.
pub mod core;
/// Form error mapping and validation rules.
pub mod form;
/// Price and slug formatting helpers.
pub mod format;
/// Cart mutation model.
pub mod op;
/// Session persistence abstraction and SQLite implementation.
pub mod persist;
/// Product and purchase records.
pub mod purchase;
/// Single-writer cart runtime and events.
pub mod runtime;
/// Facade over client, session, and cart runtime.
pub mod storefront;
/// Shared primitive types and enums.
pub mod types;
/// Account records and auth payloads.
pub mod user;
