use tokio::time::{Duration, Instant};

use crate::types::{BuyCount, PurchaseId};

/// Quantity waiting for the debounce window to close.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCommit {
    /// Row the value belongs to.
    pub id: PurchaseId,
    /// Value to commit.
    pub buy_count: BuyCount,
}

/// Single-slot trailing-edge debouncer.
///
/// Scheduling replaces whatever is pending and restarts the wait, so only
/// the last value of a burst is ever released. The owner polls
/// [`QuantityDebouncer::deadline`] from its event loop.
#[derive(Debug)]
pub struct QuantityDebouncer {
    delay: Duration,
    slot: Option<(PendingCommit, Instant)>,
}

impl QuantityDebouncer {
    /// Empty debouncer with a fixed quiet period.
    pub fn new(delay: Duration) -> Self {
        Self { delay, slot: None }
    }

    /// Replaces the pending commit and restarts the wait from now.
    pub fn schedule(&mut self, commit: PendingCommit) {
        self.schedule_at(commit, Instant::now());
    }

    /// [`QuantityDebouncer::schedule`] with an explicit clock reading.
    pub fn schedule_at(&mut self, commit: PendingCommit, now: Instant) {
        self.slot = Some((commit, now + self.delay));
    }

    /// When the pending commit becomes due.
    pub fn deadline(&self) -> Option<Instant> {
        self.slot.as_ref().map(|(_, deadline)| *deadline)
    }

    /// True while a commit is waiting.
    pub fn is_pending(&self) -> bool {
        self.slot.is_some()
    }

    /// The pending commit, if any.
    pub fn pending(&self) -> Option<&PendingCommit> {
        self.slot.as_ref().map(|(commit, _)| commit)
    }

    /// Releases the pending commit if its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<PendingCommit> {
        match &self.slot {
            Some((_, deadline)) if *deadline <= now => self.slot.take().map(|(commit, _)| commit),
            _ => None,
        }
    }

    /// Drops the pending commit if it targets `id`.
    pub fn cancel_for(&mut self, id: &PurchaseId) -> bool {
        if self.pending().is_some_and(|c| c.id == *id) {
            self.slot = None;
            return true;
        }
        false
    }

    /// Drops whatever is pending.
    pub fn cancel(&mut self) {
        self.slot = None;
    }
}
