//! Derived checkout totals over the checked subset.

use crate::{purchase::ExtendedPurchase, types::Money};

/// Totals shown in the checkout bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Totals {
    /// Number of checked rows.
    pub checked_count: usize,
    /// Sum of `price * buy_count` over checked rows.
    pub total_amount: Money,
    /// Sum of `(price_before_discount - price) * buy_count` over checked rows.
    pub total_saved: i64,
}

impl Totals {
    /// Recomputes totals from scratch. Sums saturate instead of wrapping.
    pub fn compute(entries: &[ExtendedPurchase]) -> Self {
        entries
            .iter()
            .filter(|entry| entry.is_checked)
            .fold(Self::default(), |acc, entry| {
                let product = &entry.purchase.product;
                let count = u64::from(entry.buy_count());
                let saved_per_unit = i128::from(product.price_before_discount) - i128::from(product.price);
                let saved = i128::from(acc.total_saved) + saved_per_unit * i128::from(count);
                Self {
                    checked_count: acc.checked_count + 1,
                    total_amount: acc.total_amount.saturating_add(product.price.saturating_mul(count)),
                    total_saved: saved.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64,
                }
            })
    }
}
