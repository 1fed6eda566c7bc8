//! Quantity stepper semantics for a single cart row.

use crate::types::BuyCount;

/// User gesture on a quantity control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityAction {
    /// `+` button.
    Increase,
    /// `-` button.
    Decrease,
    /// Direct text entry.
    Change,
}

/// Inclusive bounds for a row's quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantityBounds {
    /// Lowest allowed quantity.
    pub min: BuyCount,
    /// Highest allowed quantity.
    pub max: BuyCount,
}

impl QuantityBounds {
    /// Builds bounds, raising `max` to `min` when stock is below the floor.
    pub fn new(min: BuyCount, max: BuyCount) -> Self {
        Self {
            min,
            max: max.max(min),
        }
    }

    /// Clamps `value` into `[min, max]`.
    pub fn clamp(&self, value: BuyCount) -> BuyCount {
        value.clamp(self.min, self.max)
    }
}

/// Result of applying a [`QuantityAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityOutcome {
    /// Out of bounds; nothing changes and nothing is sent.
    Unchanged,
    /// Show the value now; committed later on blur.
    Local(BuyCount),
    /// Show the value now and schedule a debounced commit.
    Debounced(BuyCount),
}

impl QuantityOutcome {
    /// Value to display, if it changed.
    pub fn value(self) -> Option<BuyCount> {
        match self {
            QuantityOutcome::Unchanged => None,
            QuantityOutcome::Local(v) | QuantityOutcome::Debounced(v) => Some(v),
        }
    }
}

/// Applies `action` to `value` within `bounds`.
pub fn apply(action: QuantityAction, value: BuyCount, bounds: QuantityBounds) -> QuantityOutcome {
    match action {
        QuantityAction::Decrease => match value.checked_sub(1) {
            Some(next) if next >= bounds.min => QuantityOutcome::Debounced(next),
            _ => QuantityOutcome::Unchanged,
        },
        QuantityAction::Increase => match value.checked_add(1) {
            Some(next) if next <= bounds.max => QuantityOutcome::Debounced(next),
            _ => QuantityOutcome::Unchanged,
        },
        QuantityAction::Change => QuantityOutcome::Local(bounds.clamp(value)),
    }
}
