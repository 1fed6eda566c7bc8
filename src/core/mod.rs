//! Client-side cart state: reducers, store, quantity rules, and totals.

/// Authentication and profile state container.
pub mod app;
/// Quantity stepper rules.
pub mod quantity;
/// Pure reconciliation and toggle reducers.
pub mod reconcile;
/// Extended purchase store.
pub mod store;
/// Checkout totals.
pub mod totals;
