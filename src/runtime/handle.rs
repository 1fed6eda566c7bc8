use std::sync::Arc;

use tokio::{
    sync::{broadcast, mpsc, oneshot},
    time::{Duration, Instant},
};

use crate::{
    api::{ApiError, ApiResult, PurchaseApi},
    core::{
        quantity::{self, QuantityAction, QuantityBounds, QuantityOutcome},
        store::{PurchaseStore, StoreError},
        totals::Totals,
    },
    op::Mutation,
    purchase::{ExtendedPurchase, Purchase, PurchaseLine},
    types::{BuyCount, ProductId, PurchaseId, PurchaseStatus},
};

use super::{
    debounce::{PendingCommit, QuantityDebouncer},
    events::{CartEvent, Notice, NoticeLevel},
};

/// Shown when checkout is requested with nothing selected.
pub const EMPTY_SELECTION_MESSAGE: &str = "You have not selected any products to buy yet";

/// Errors returned through a [`CartHandle`].
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// Unknown purchase or row index.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// The cart was reset before the awaited request completed.
    #[error("cart was reset while the request was in flight")]
    Superseded,
    /// The runtime task has stopped.
    #[error("cart runtime stopped")]
    ChannelClosed,
}

/// Cart runtime tuning.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Quiet period before a stepped quantity is committed.
    pub debounce_ms: u64,
    /// Capacity of the command channel.
    pub command_queue_bound: usize,
    /// Capacity of the event broadcast channel.
    pub event_capacity: usize,
    /// Lowest quantity a row may hold.
    pub min_buy_count: BuyCount,
    /// Status fetched and reconciled into the store.
    pub status: PurchaseStatus,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 600,
            command_queue_bound: 256,
            event_capacity: 1024,
            min_buy_count: 1,
            status: PurchaseStatus::InCart,
        }
    }
}

/// Whether a dispatcher actually issued a network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A request was issued.
    Sent,
    /// Nothing to send: empty selection, unchanged value, or row in flight.
    Skipped,
}

/// Everything a cart view renders, read in one round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct CartSnapshot {
    /// Rows in server order.
    pub entries: Vec<ExtendedPurchase>,
    /// Totals over checked rows.
    pub totals: Totals,
    /// Header checkbox state.
    pub is_all_checked: bool,
}

/// Cloneable front end of the cart runtime.
pub struct CartHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<CartEvent>,
}

impl Clone for CartHandle {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
            events_tx: self.events_tx.clone(),
        }
    }
}

type Reply<T> = oneshot::Sender<Result<T, RuntimeError>>;

enum Command {
    Refetch {
        resp: Reply<usize>,
    },
    EnterCart {
        just_purchased: Option<PurchaseId>,
        resp: Reply<usize>,
    },
    ToggleOne {
        id: PurchaseId,
        resp: Reply<()>,
    },
    ToggleAll {
        resp: Reply<()>,
    },
    ChangeQuantity {
        index: usize,
        action: QuantityAction,
        value: BuyCount,
        resp: Reply<QuantityOutcome>,
    },
    Blur {
        index: usize,
        value: BuyCount,
        resp: Reply<Dispatch>,
    },
    UpdateQuantity {
        id: PurchaseId,
        buy_count: BuyCount,
        resp: Reply<Dispatch>,
    },
    Delete {
        ids: Vec<PurchaseId>,
        resp: Reply<Dispatch>,
    },
    DeleteChecked {
        resp: Reply<Dispatch>,
    },
    BuyChecked {
        resp: Reply<Dispatch>,
    },
    AddToCart {
        line: PurchaseLine,
        resp: Reply<PurchaseId>,
    },
    Snapshot {
        resp: Reply<CartSnapshot>,
    },
    Reset {
        resp: Reply<()>,
    },
    Shutdown {
        resp: Reply<()>,
    },
}

enum AfterFetch {
    Nothing,
    Count(Reply<usize>),
    Navigated { id: PurchaseId, resp: Reply<PurchaseId> },
}

enum MutationOutput {
    Done,
    Message(String),
    Added(Purchase),
}

enum Completion {
    Fetched {
        epoch: u64,
        result: ApiResult<Vec<Purchase>>,
        after: AfterFetch,
    },
    Mutated {
        epoch: u64,
        mutation: Mutation,
        result: ApiResult<MutationOutput>,
        reply: Option<Reply<PurchaseId>>,
    },
}

/// Spawns the single-writer cart loop and returns its handle.
pub fn spawn_cart(api: Arc<dyn PurchaseApi>, config: CartConfig) -> CartHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.command_queue_bound);
    let (events_tx, _) = broadcast::channel::<CartEvent>(config.event_capacity);
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion>();

    let mut cart = CartLoop {
        store: PurchaseStore::new(),
        debouncer: QuantityDebouncer::new(Duration::from_millis(config.debounce_ms)),
        just_purchased: None,
        epoch: 0,
        api,
        events_tx: events_tx.clone(),
        done_tx,
        config,
    };

    tokio::spawn(async move {
        loop {
            let deadline = cart.debouncer.deadline();
            tokio::select! {
                cmd = cmd_rx.recv() => {
                    let Some(cmd) = cmd else { break; };
                    if cart.handle_command(cmd) {
                        break;
                    }
                }
                Some(done) = done_rx.recv() => {
                    cart.handle_completion(done);
                }
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    cart.flush_debounce(Instant::now());
                }
            }
        }
        log::debug!("cart runtime stopped");
    });

    CartHandle { cmd_tx, events_tx }
}

impl CartHandle {
    /// Subscribes to runtime events.
    pub fn subscribe(&self) -> broadcast::Receiver<CartEvent> {
        self.events_tx.subscribe()
    }

    /// Fetches the cart and waits for reconciliation. Returns the row count.
    pub async fn refetch(&self) -> Result<usize, RuntimeError> {
        self.request(|resp| Command::Refetch { resp }).await
    }

    /// Opens the cart view, optionally carrying a just-purchased identity
    /// that will be checked by the next reconciliation.
    pub async fn enter_cart(&self, just_purchased: Option<PurchaseId>) -> Result<usize, RuntimeError> {
        self.request(|resp| Command::EnterCart { just_purchased, resp }).await
    }

    /// Flips the checked flag of one row.
    pub async fn toggle_one(&self, id: PurchaseId) -> Result<(), RuntimeError> {
        self.request(|resp| Command::ToggleOne { id, resp }).await
    }

    /// Checks every row, or clears them all when all are checked.
    pub async fn toggle_all(&self) -> Result<(), RuntimeError> {
        self.request(|resp| Command::ToggleAll { resp }).await
    }

    /// Applies a quantity gesture to the row at `index`; `value` is the
    /// quantity the control currently shows.
    pub async fn change_quantity(
        &self,
        index: usize,
        action: QuantityAction,
        value: BuyCount,
    ) -> Result<QuantityOutcome, RuntimeError> {
        self.request(|resp| Command::ChangeQuantity {
            index,
            action,
            value,
            resp,
        })
        .await
    }

    /// Clamps `value` to the row's bounds and commits it right away if it
    /// differs from the server. Skipped while the row has a mutation in flight.
    pub async fn blur(&self, index: usize, value: BuyCount) -> Result<Dispatch, RuntimeError> {
        self.request(|resp| Command::Blur { index, value, resp }).await
    }

    /// Sends a quantity for `id`, clamped to the row's bounds. Skipped while
    /// the row has a mutation in flight.
    pub async fn update_quantity(&self, id: PurchaseId, buy_count: BuyCount) -> Result<Dispatch, RuntimeError> {
        self.request(|resp| Command::UpdateQuantity { id, buy_count, resp })
            .await
    }

    /// Removes one row.
    pub async fn delete_one(&self, id: PurchaseId) -> Result<Dispatch, RuntimeError> {
        self.delete_many(vec![id]).await
    }

    /// Removes the listed rows. Skipped when `ids` is empty.
    pub async fn delete_many(&self, ids: Vec<PurchaseId>) -> Result<Dispatch, RuntimeError> {
        self.request(|resp| Command::Delete { ids, resp }).await
    }

    /// Removes every checked row.
    pub async fn delete_checked(&self) -> Result<Dispatch, RuntimeError> {
        self.request(|resp| Command::DeleteChecked { resp }).await
    }

    /// Checks out the checked rows. Skipped, with a notice, when none are checked.
    pub async fn buy_checked(&self) -> Result<Dispatch, RuntimeError> {
        self.request(|resp| Command::BuyChecked { resp }).await
    }

    /// Adds a product to the cart, then reloads the cart with the new row
    /// checked. Resolves once that reload has been reconciled.
    pub async fn add_to_cart_and_navigate(
        &self,
        product_id: ProductId,
        buy_count: BuyCount,
    ) -> Result<PurchaseId, RuntimeError> {
        let line = PurchaseLine { product_id, buy_count };
        self.request(|resp| Command::AddToCart { line, resp }).await
    }

    /// Current rows and totals.
    pub async fn snapshot(&self) -> Result<CartSnapshot, RuntimeError> {
        self.request(|resp| Command::Snapshot { resp }).await
    }

    /// Clears rows, the pending quantity commit, and the just-purchased marker.
    pub async fn reset(&self) -> Result<(), RuntimeError> {
        self.request(|resp| Command::Reset { resp }).await
    }

    /// Stops the runtime task.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.request(|resp| Command::Shutdown { resp }).await
    }

    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<T, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }
}

struct CartLoop {
    store: PurchaseStore,
    debouncer: QuantityDebouncer,
    just_purchased: Option<PurchaseId>,
    epoch: u64,
    api: Arc<dyn PurchaseApi>,
    events_tx: broadcast::Sender<CartEvent>,
    done_tx: mpsc::UnboundedSender<Completion>,
    config: CartConfig,
}

impl CartLoop {
    fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Refetch { resp } => {
                self.spawn_fetch(AfterFetch::Count(resp));
            }
            Command::EnterCart { just_purchased, resp } => {
                self.just_purchased = just_purchased;
                self.spawn_fetch(AfterFetch::Count(resp));
            }
            Command::ToggleOne { id, resp } => {
                let _ = resp.send(self.store.toggle_one(&id).map_err(RuntimeError::from));
            }
            Command::ToggleAll { resp } => {
                self.store.toggle_all();
                let _ = resp.send(Ok(()));
            }
            Command::ChangeQuantity {
                index,
                action,
                value,
                resp,
            } => {
                let _ = resp.send(self.change_quantity(index, action, value));
            }
            Command::Blur { index, value, resp } => {
                let _ = resp.send(self.blur(index, value));
            }
            Command::UpdateQuantity { id, buy_count, resp } => {
                let _ = resp.send(self.update_quantity(id, buy_count));
            }
            Command::Delete { ids, resp } => {
                let _ = resp.send(Ok(self.delete(ids)));
            }
            Command::DeleteChecked { resp } => {
                let ids = self.store.checked().into_iter().map(|e| e.id().clone()).collect();
                let _ = resp.send(Ok(self.delete(ids)));
            }
            Command::BuyChecked { resp } => {
                let _ = resp.send(Ok(self.buy_checked()));
            }
            Command::AddToCart { line, resp } => {
                self.dispatch(Mutation::AddToCart { line }, Some(resp));
            }
            Command::Snapshot { resp } => {
                let _ = resp.send(Ok(CartSnapshot {
                    entries: self.store.entries().to_vec(),
                    totals: self.store.totals(),
                    is_all_checked: self.store.is_all_checked(),
                }));
            }
            Command::Reset { resp } => {
                self.epoch += 1;
                self.store.reset();
                self.debouncer.cancel();
                self.just_purchased = None;
                let _ = self.events_tx.send(CartEvent::Reset);
                let _ = resp.send(Ok(()));
            }
            Command::Shutdown { resp } => {
                let _ = resp.send(Ok(()));
                return true;
            }
        }

        false
    }

    fn change_quantity(
        &mut self,
        index: usize,
        action: QuantityAction,
        value: BuyCount,
    ) -> Result<QuantityOutcome, RuntimeError> {
        let entry = self
            .store
            .get_index(index)
            .ok_or(StoreError::IndexOutOfRange(index))?;
        if entry.is_disabled {
            return Ok(QuantityOutcome::Unchanged);
        }
        let id = entry.id().clone();
        let bounds = self.bounds(entry);

        let outcome = quantity::apply(action, value, bounds);
        if let Some(buy_count) = outcome.value() {
            self.store.set_buy_count(index, buy_count)?;
            let _ = self.events_tx.send(CartEvent::QuantityEdited {
                id: id.clone(),
                buy_count,
            });
        }
        if let QuantityOutcome::Debounced(buy_count) = outcome {
            self.debouncer.schedule(PendingCommit { id, buy_count });
        }
        Ok(outcome)
    }

    fn bounds(&self, entry: &ExtendedPurchase) -> QuantityBounds {
        QuantityBounds::new(self.config.min_buy_count, entry.purchase.product.quantity)
    }

    fn blur(&mut self, index: usize, value: BuyCount) -> Result<Dispatch, RuntimeError> {
        let entry = self
            .store
            .get_index(index)
            .ok_or(StoreError::IndexOutOfRange(index))?;
        if entry.is_disabled {
            return Ok(Dispatch::Skipped);
        }
        let id = entry.id().clone();
        let shown = entry.buy_count();
        let buy_count = self.bounds(entry).clamp(value);
        if buy_count != shown {
            self.store.set_buy_count(index, buy_count)?;
            let _ = self.events_tx.send(CartEvent::QuantityEdited {
                id: id.clone(),
                buy_count,
            });
        }
        self.debouncer.cancel_for(&id);
        Ok(self.commit_quantity(&id, buy_count))
    }

    fn update_quantity(&mut self, id: PurchaseId, buy_count: BuyCount) -> Result<Dispatch, RuntimeError> {
        let entry = self
            .store
            .get(&id)
            .ok_or_else(|| StoreError::MissingPurchase(id.clone()))?;
        if entry.is_disabled {
            return Ok(Dispatch::Skipped);
        }
        let buy_count = self.bounds(entry).clamp(buy_count);
        let product_id = entry.purchase.product.id.clone();
        self.dispatch(
            Mutation::UpdateQuantity {
                id,
                product_id,
                buy_count,
            },
            None,
        );
        Ok(Dispatch::Sent)
    }

    /// A commit that comes due while its row is in flight is dropped; the
    /// refetch that ends the flight replaces the row anyway.
    fn flush_debounce(&mut self, now: Instant) {
        if let Some(commit) = self.debouncer.take_due(now) {
            if self.commit_quantity(&commit.id, commit.buy_count) == Dispatch::Skipped {
                log::debug!("debounced quantity for {} not sent", commit.id);
            }
        }
    }

    /// Sends `buy_count` unless it matches what the server last reported or
    /// the row is already in flight.
    fn commit_quantity(&mut self, id: &PurchaseId, buy_count: BuyCount) -> Dispatch {
        let Some(entry) = self.store.get(id) else {
            return Dispatch::Skipped;
        };
        if entry.is_disabled || self.store.confirmed_buy_count(id) == Some(buy_count) {
            return Dispatch::Skipped;
        }
        let product_id = entry.purchase.product.id.clone();
        self.dispatch(
            Mutation::UpdateQuantity {
                id: id.clone(),
                product_id,
                buy_count,
            },
            None,
        );
        Dispatch::Sent
    }

    fn delete(&mut self, ids: Vec<PurchaseId>) -> Dispatch {
        if ids.is_empty() {
            return Dispatch::Skipped;
        }
        self.dispatch(Mutation::Delete { ids }, None);
        Dispatch::Sent
    }

    fn buy_checked(&mut self) -> Dispatch {
        let checked = self.store.checked();
        if checked.is_empty() {
            let _ = self
                .events_tx
                .send(CartEvent::Notice(Notice::new(NoticeLevel::Info, EMPTY_SELECTION_MESSAGE)));
            return Dispatch::Skipped;
        }
        let (ids, lines) = checked.into_iter().map(|e| (e.id().clone(), e.line())).unzip();
        self.dispatch(Mutation::Buy { ids, lines }, None);
        Dispatch::Sent
    }

    fn spawn_fetch(&self, after: AfterFetch) {
        let api = Arc::clone(&self.api);
        let done_tx = self.done_tx.clone();
        let status = self.config.status;
        let epoch = self.epoch;
        tokio::spawn(async move {
            let result = api.get_purchases(status).await;
            let _ = done_tx.send(Completion::Fetched { epoch, result, after });
        });
    }

    fn dispatch(&mut self, mutation: Mutation, reply: Option<Reply<PurchaseId>>) {
        let kind = mutation.kind();
        log::debug!("dispatching {kind:?}");
        self.store.set_disabled(&mutation.affected_ids(), true);
        let _ = self.events_tx.send(CartEvent::Dispatched { kind });

        let api = Arc::clone(&self.api);
        let done_tx = self.done_tx.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            let result = match &mutation {
                Mutation::UpdateQuantity {
                    product_id,
                    buy_count,
                    ..
                } => api
                    .update_purchase(PurchaseLine {
                        product_id: product_id.clone(),
                        buy_count: *buy_count,
                    })
                    .await
                    .map(|_| MutationOutput::Done),
                Mutation::Delete { ids } => api.delete_purchases(ids.clone()).await.map(|_| MutationOutput::Done),
                Mutation::Buy { lines, .. } => api.buy_products(lines.clone()).await.map(MutationOutput::Message),
                Mutation::AddToCart { line } => api.add_to_cart(line.clone()).await.map(MutationOutput::Added),
            };
            let _ = done_tx.send(Completion::Mutated {
                epoch,
                mutation,
                result,
                reply,
            });
        });
    }

    fn handle_completion(&mut self, done: Completion) {
        match done {
            Completion::Fetched { epoch, result, after } => self.on_fetched(epoch, result, after),
            Completion::Mutated {
                epoch,
                mutation,
                result,
                reply,
            } => self.on_mutated(epoch, mutation, result, reply),
        }
    }

    fn on_fetched(&mut self, epoch: u64, result: ApiResult<Vec<Purchase>>, after: AfterFetch) {
        if epoch != self.epoch {
            log::debug!("dropping fetch issued before reset");
            after.fail(RuntimeError::Superseded);
            return;
        }

        match result {
            Ok(purchases) => {
                let marker = self
                    .just_purchased
                    .take_if(|id| purchases.iter().any(|p| p.id == *id));
                let count = self.store.apply_fetched(&purchases, marker.as_ref());
                let _ = self.events_tx.send(CartEvent::Reconciled { count });
                match after {
                    AfterFetch::Nothing => {}
                    AfterFetch::Count(resp) => {
                        let _ = resp.send(Ok(count));
                    }
                    AfterFetch::Navigated { id, resp } => {
                        let _ = resp.send(Ok(id));
                    }
                }
            }
            Err(err) => {
                log::warn!("cart fetch failed: {err}");
                let _ = self
                    .events_tx
                    .send(CartEvent::Notice(Notice::new(NoticeLevel::Error, err.user_message())));
                after.fail(RuntimeError::Api(err));
            }
        }
    }

    fn on_mutated(
        &mut self,
        epoch: u64,
        mutation: Mutation,
        result: ApiResult<MutationOutput>,
        reply: Option<Reply<PurchaseId>>,
    ) {
        let kind = mutation.kind();
        if epoch != self.epoch {
            if let Some(resp) = reply {
                let _ = resp.send(Err(RuntimeError::Superseded));
            }
            return;
        }

        match result {
            Ok(output) => {
                let _ = self.events_tx.send(CartEvent::Succeeded { kind });
                match output {
                    MutationOutput::Done => self.spawn_fetch(AfterFetch::Nothing),
                    MutationOutput::Message(message) => {
                        let _ = self
                            .events_tx
                            .send(CartEvent::Notice(Notice::new(NoticeLevel::Success, message)));
                        self.spawn_fetch(AfterFetch::Nothing);
                    }
                    MutationOutput::Added(purchase) => {
                        self.just_purchased = Some(purchase.id.clone());
                        let after = match reply {
                            Some(resp) => AfterFetch::Navigated {
                                id: purchase.id,
                                resp,
                            },
                            None => AfterFetch::Nothing,
                        };
                        self.spawn_fetch(after);
                    }
                }
            }
            Err(err) => {
                log::warn!("{kind:?} failed: {err}");
                self.store.set_disabled(&mutation.affected_ids(), false);
                let _ = self.events_tx.send(CartEvent::Failed { kind });
                let _ = self
                    .events_tx
                    .send(CartEvent::Notice(Notice::new(NoticeLevel::Error, err.user_message())));
                if let Some(resp) = reply {
                    let _ = resp.send(Err(RuntimeError::Api(err)));
                }
            }
        }
    }
}

impl AfterFetch {
    fn fail(self, err: RuntimeError) {
        match self {
            AfterFetch::Nothing => {}
            AfterFetch::Count(resp) => {
                let _ = resp.send(Err(err));
            }
            AfterFetch::Navigated { resp, .. } => {
                let _ = resp.send(Err(err));
            }
        }
    }
}
