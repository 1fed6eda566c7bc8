use hashbrown::HashMap;

use crate::{
    purchase::{ExtendedPurchase, Purchase},
    types::{BuyCount, PurchaseId},
};

use super::{reconcile, totals::Totals};

/// Lookup failures on the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No row has this identity.
    #[error("no cart row with id {0}")]
    MissingPurchase(PurchaseId),
    /// No row at this position.
    #[error("cart row index {0} out of range")]
    IndexOutOfRange(usize),
}

/// Extended purchase store for the active status filter.
///
/// Every change swaps in a new sequence built by the reducers in
/// [`super::reconcile`]; rows are never edited in place.
#[derive(Debug, Default)]
pub struct PurchaseStore {
    entries: Vec<ExtendedPurchase>,
    pos: HashMap<PurchaseId, usize>,
    confirmed: HashMap<PurchaseId, BuyCount>,
    reconciliations: u64,
}

impl PurchaseStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconciles a fresh fetch into the store and returns the new row count.
    pub fn apply_fetched(&mut self, fetched: &[Purchase], just_purchased: Option<&PurchaseId>) -> usize {
        let next = reconcile::reconcile(fetched, &self.entries, just_purchased);
        self.confirmed = fetched
            .iter()
            .map(|purchase| (purchase.id.clone(), purchase.buy_count))
            .collect();
        self.replace(next);
        self.reconciliations += 1;
        self.entries.len()
    }

    /// Flips the checked flag of `id`.
    pub fn toggle_one(&mut self, id: &PurchaseId) -> Result<(), StoreError> {
        if !self.pos.contains_key(id) {
            return Err(StoreError::MissingPurchase(id.clone()));
        }
        let next = reconcile::toggle_one(&self.entries, id);
        self.replace(next);
        Ok(())
    }

    /// See [`reconcile::toggle_all`].
    pub fn toggle_all(&mut self) {
        let next = reconcile::toggle_all(&self.entries);
        self.replace(next);
    }

    /// Optimistically shows `buy_count` on the row at `index`.
    pub fn set_buy_count(&mut self, index: usize, buy_count: BuyCount) -> Result<&ExtendedPurchase, StoreError> {
        if index >= self.entries.len() {
            return Err(StoreError::IndexOutOfRange(index));
        }
        let next = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let mut row = entry.clone();
                if i == index {
                    row.purchase.buy_count = buy_count;
                }
                row
            })
            .collect();
        self.replace(next);
        Ok(&self.entries[index])
    }

    /// Marks rows as in flight, or back to idle.
    pub fn set_disabled(&mut self, ids: &[PurchaseId], disabled: bool) {
        if ids.is_empty() {
            return;
        }
        let next = reconcile::set_disabled(&self.entries, ids, disabled);
        self.replace(next);
    }

    /// Clears all rows, e.g. on sign-out.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.pos.clear();
        self.confirmed.clear();
    }

    /// Rows in server order.
    pub fn entries(&self) -> &[ExtendedPurchase] {
        &self.entries
    }

    /// Row count.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the cart has no rows.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Row by identity.
    pub fn get(&self, id: &PurchaseId) -> Option<&ExtendedPurchase> {
        self.pos.get(id).and_then(|idx| self.entries.get(*idx))
    }

    /// Row by position.
    pub fn get_index(&self, index: usize) -> Option<&ExtendedPurchase> {
        self.entries.get(index)
    }

    /// Position of `id`.
    pub fn position(&self, id: &PurchaseId) -> Option<usize> {
        self.pos.get(id).copied()
    }

    /// Quantity last reported by the server for `id`.
    pub fn confirmed_buy_count(&self, id: &PurchaseId) -> Option<BuyCount> {
        self.confirmed.get(id).copied()
    }

    /// Checked rows in order.
    pub fn checked(&self) -> Vec<&ExtendedPurchase> {
        self.entries.iter().filter(|entry| entry.is_checked).collect()
    }

    /// Owned copy of [`PurchaseStore::checked`].
    pub fn checked_cloned(&self) -> Vec<ExtendedPurchase> {
        self.checked().into_iter().cloned().collect()
    }

    /// True when every row is checked, or the store is empty.
    pub fn is_all_checked(&self) -> bool {
        reconcile::is_all_checked(&self.entries)
    }

    /// Checkout totals over the checked rows.
    pub fn totals(&self) -> Totals {
        Totals::compute(&self.entries)
    }

    /// Number of reconciliations applied since creation.
    pub fn reconciliations(&self) -> u64 {
        self.reconciliations
    }

    fn replace(&mut self, next: Vec<ExtendedPurchase>) {
        self.pos = next
            .iter()
            .enumerate()
            .map(|(idx, entry)| (entry.id().clone(), idx))
            .collect();
        self.entries = next;
    }
}
