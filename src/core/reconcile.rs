//! Pure reducers over the extended purchase sequence.
//!
//! Every function returns a fresh sequence; inputs are never mutated.

use hashbrown::HashMap;

use crate::{
    purchase::{ExtendedPurchase, Purchase},
    types::PurchaseId,
};

/// Merges freshly fetched purchases with the previous store.
///
/// Output order and membership follow `fetched`. `is_checked` survives by
/// identity, the `just_purchased` identity is forced checked, and
/// `is_disabled` is cleared on every row.
pub fn reconcile(
    fetched: &[Purchase],
    previous: &[ExtendedPurchase],
    just_purchased: Option<&PurchaseId>,
) -> Vec<ExtendedPurchase> {
    let prev_checked: HashMap<&PurchaseId, bool> = previous
        .iter()
        .map(|entry| (entry.id(), entry.is_checked))
        .collect();

    fetched
        .iter()
        .map(|purchase| {
            let carried = prev_checked.get(&purchase.id).copied().unwrap_or(false);
            let forced = just_purchased.is_some_and(|id| *id == purchase.id);
            ExtendedPurchase {
                purchase: purchase.clone(),
                is_checked: carried || forced,
                is_disabled: false,
            }
        })
        .collect()
}

/// Flips `is_checked` on the row with identity `id`.
pub fn toggle_one(entries: &[ExtendedPurchase], id: &PurchaseId) -> Vec<ExtendedPurchase> {
    entries
        .iter()
        .map(|entry| {
            let mut next = entry.clone();
            if entry.id() == id {
                next.is_checked = !entry.is_checked;
            }
            next
        })
        .collect()
}

/// Clears every row when all are checked, otherwise checks every row.
pub fn toggle_all(entries: &[ExtendedPurchase]) -> Vec<ExtendedPurchase> {
    let target = !is_all_checked(entries);
    entries
        .iter()
        .map(|entry| ExtendedPurchase {
            is_checked: target,
            ..entry.clone()
        })
        .collect()
}

/// True when every row is checked. Vacuously true for an empty sequence.
pub fn is_all_checked(entries: &[ExtendedPurchase]) -> bool {
    entries.iter().all(|entry| entry.is_checked)
}

/// Sets `is_disabled` on the listed rows, leaving the others as they are.
pub fn set_disabled(
    entries: &[ExtendedPurchase],
    ids: &[PurchaseId],
    disabled: bool,
) -> Vec<ExtendedPurchase> {
    entries
        .iter()
        .map(|entry| {
            let mut next = entry.clone();
            if ids.contains(entry.id()) {
                next.is_disabled = disabled;
            }
            next
        })
        .collect()
}
