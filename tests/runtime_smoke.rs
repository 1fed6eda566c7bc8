use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::broadcast;

use shopcart::{
    api::{ApiError, ApiResult, DeletedCount, PurchaseApi},
    core::quantity::{QuantityAction, QuantityOutcome},
    op::MutationKind,
    purchase::{Product, Purchase, PurchaseLine},
    runtime::{
        events::{CartEvent, Notice, NoticeLevel},
        handle::{CartConfig, Dispatch, EMPTY_SELECTION_MESSAGE, RuntimeError, spawn_cart},
    },
    types::{BuyCount, Money, PurchaseId, PurchaseStatus},
};

fn product(id: &str, price: Money, price_before_discount: Money, stock: BuyCount) -> Product {
    Product {
        id: id.into(),
        name: format!("Product {id}"),
        image: String::new(),
        price,
        price_before_discount,
        quantity: stock,
        images: vec![],
        rating: 0.0,
        sold: 0,
        view: 0,
        description: String::new(),
        category: None,
    }
}

fn purchase_of(id: &str, product: Product, buy_count: BuyCount) -> Purchase {
    Purchase {
        id: id.into(),
        buy_count,
        price: product.price,
        price_before_discount: product.price_before_discount,
        status: PurchaseStatus::InCart,
        user: "u1".into(),
        product,
    }
}

fn purchase(id: &str, buy_count: BuyCount) -> Purchase {
    purchase_of(id, product(&format!("prod-{id}"), 100, 150, 10), buy_count)
}

/// In-process backend that records every mutation it receives.
#[derive(Default)]
struct FakeBackend {
    cart: Mutex<Vec<Purchase>>,
    catalog: Vec<Product>,
    updates: Mutex<Vec<PurchaseLine>>,
    deletes: Mutex<Vec<Vec<PurchaseId>>>,
    buys: Mutex<Vec<Vec<PurchaseLine>>>,
    fetches: AtomicUsize,
    fail_updates: AtomicBool,
    /// Held by a test to keep mutations in flight.
    gate: tokio::sync::Mutex<()>,
}

impl FakeBackend {
    fn with_cart(rows: Vec<Purchase>) -> Arc<Self> {
        Arc::new(Self {
            cart: Mutex::new(rows),
            catalog: vec![product("prod-z", 40, 60, 5)],
            ..Self::default()
        })
    }

    fn updates(&self) -> Vec<PurchaseLine> {
        self.updates.lock().expect("lock").clone()
    }
}

#[async_trait]
impl PurchaseApi for FakeBackend {
    async fn get_purchases(&self, status: PurchaseStatus) -> ApiResult<Vec<Purchase>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let cart = self.cart.lock().expect("lock");
        Ok(cart.iter().filter(|p| p.status == status).cloned().collect())
    }

    async fn add_to_cart(&self, line: PurchaseLine) -> ApiResult<Purchase> {
        let _open = self.gate.lock().await;
        let mut cart = self.cart.lock().expect("lock");
        if let Some(row) = cart.iter_mut().find(|p| p.product.id == line.product_id) {
            row.buy_count += line.buy_count;
            return Ok(row.clone());
        }
        let product = self
            .catalog
            .iter()
            .find(|p| p.id == line.product_id)
            .cloned()
            .ok_or_else(|| ApiError::Message("unknown product".to_string()))?;
        let row = purchase_of(&format!("pur-new-{}", line.product_id), product, line.buy_count);
        cart.push(row.clone());
        Ok(row)
    }

    async fn update_purchase(&self, line: PurchaseLine) -> ApiResult<Purchase> {
        let _open = self.gate.lock().await;
        self.updates.lock().expect("lock").push(line.clone());
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                status: 500,
                message: "update failed".to_string(),
            });
        }
        let mut cart = self.cart.lock().expect("lock");
        let row = cart
            .iter_mut()
            .find(|p| p.product.id == line.product_id)
            .ok_or_else(|| ApiError::Message("not in cart".to_string()))?;
        row.buy_count = line.buy_count;
        Ok(row.clone())
    }

    async fn delete_purchases(&self, ids: Vec<PurchaseId>) -> ApiResult<DeletedCount> {
        let _open = self.gate.lock().await;
        let mut cart = self.cart.lock().expect("lock");
        let before = cart.len();
        cart.retain(|p| !ids.contains(&p.id));
        let deleted_count = (before - cart.len()) as u64;
        self.deletes.lock().expect("lock").push(ids);
        Ok(DeletedCount { deleted_count })
    }

    async fn buy_products(&self, lines: Vec<PurchaseLine>) -> ApiResult<String> {
        let _open = self.gate.lock().await;
        self.cart
            .lock()
            .expect("lock")
            .retain(|p| !lines.iter().any(|l| l.product_id == p.product.id));
        self.buys.lock().expect("lock").push(lines);
        Ok("Buy successfully".to_string())
    }
}

async fn wait_for(sub: &mut broadcast::Receiver<CartEvent>, pred: impl Fn(&CartEvent) -> bool) -> CartEvent {
    loop {
        let evt = tokio::time::timeout(Duration::from_secs(5), sub.recv())
            .await
            .expect("event timeout")
            .expect("recv");
        if pred(&evt) {
            return evt;
        }
    }
}

fn is_reconciled(evt: &CartEvent) -> bool {
    matches!(evt, CartEvent::Reconciled { .. })
}

#[tokio::test(start_paused = true)]
async fn rapid_increments_coalesce_into_one_update() {
    let api = FakeBackend::with_cart(vec![purchase("a", 1)]);
    let cart = spawn_cart(api.clone(), CartConfig::default());
    cart.refetch().await.expect("refetch");

    let mut shown = 1;
    for _ in 0..3 {
        let out = cart
            .change_quantity(0, QuantityAction::Increase, shown)
            .await
            .expect("increase");
        shown = out.value().expect("within stock");
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    assert_eq!(shown, 4);
    assert!(api.updates().is_empty(), "window restarts on every edit");

    let mut sub = cart.subscribe();
    wait_for(&mut sub, is_reconciled).await;

    assert_eq!(
        api.updates(),
        vec![PurchaseLine {
            product_id: "prod-a".into(),
            buy_count: 4,
        }]
    );
    let snap = cart.snapshot().await.expect("snapshot");
    assert_eq!(snap.entries[0].buy_count(), 4);
    assert!(!snap.entries[0].is_disabled);

    cart.shutdown().await.expect("shutdown");
}

#[tokio::test(start_paused = true)]
async fn blur_commits_only_changed_values_and_replaces_pending_debounce() {
    let api = FakeBackend::with_cart(vec![purchase("a", 1)]);
    let cart = spawn_cart(api.clone(), CartConfig::default());
    cart.refetch().await.expect("refetch");

    assert_eq!(cart.blur(0, 1).await.expect("blur"), Dispatch::Skipped);

    let out = cart
        .change_quantity(0, QuantityAction::Change, 7)
        .await
        .expect("change");
    assert_eq!(out, QuantityOutcome::Local(7));
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(api.updates().is_empty(), "typed values wait for blur");

    let out = cart
        .change_quantity(0, QuantityAction::Increase, 7)
        .await
        .expect("increase");
    assert_eq!(out, QuantityOutcome::Debounced(8));

    let mut sub = cart.subscribe();
    assert_eq!(cart.blur(0, 8).await.expect("blur"), Dispatch::Sent);
    wait_for(&mut sub, is_reconciled).await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(
        api.updates(),
        vec![PurchaseLine {
            product_id: "prod-a".into(),
            buy_count: 8,
        }]
    );

    cart.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn committed_quantities_are_clamped_to_stock() {
    let api = FakeBackend::with_cart(vec![purchase("a", 1)]);
    let cart = spawn_cart(api.clone(), CartConfig::default());
    cart.refetch().await.expect("refetch");
    let mut sub = cart.subscribe();

    assert_eq!(cart.blur(0, 999).await.expect("blur"), Dispatch::Sent);
    wait_for(&mut sub, is_reconciled).await;
    assert_eq!(cart.snapshot().await.expect("snapshot").entries[0].buy_count(), 10);

    assert_eq!(cart.blur(0, 0).await.expect("blur"), Dispatch::Sent);
    wait_for(&mut sub, is_reconciled).await;

    assert_eq!(cart.update_quantity("a".into(), 50).await.expect("update"), Dispatch::Sent);
    wait_for(&mut sub, is_reconciled).await;

    let sent: Vec<BuyCount> = api.updates().iter().map(|l| l.buy_count).collect();
    assert_eq!(sent, vec![10, 1, 10]);

    cart.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn rows_in_flight_refuse_further_commits() {
    let api = FakeBackend::with_cart(vec![purchase("a", 1)]);
    let cart = spawn_cart(api.clone(), CartConfig::default());
    cart.refetch().await.expect("refetch");
    let mut sub = cart.subscribe();

    let gate = api.gate.lock().await;
    assert_eq!(cart.update_quantity("a".into(), 3).await.expect("update"), Dispatch::Sent);
    assert_eq!(cart.blur(0, 4).await.expect("blur"), Dispatch::Skipped);
    assert_eq!(cart.update_quantity("a".into(), 3).await.expect("update"), Dispatch::Skipped);

    drop(gate);
    wait_for(&mut sub, is_reconciled).await;

    assert_eq!(
        api.updates(),
        vec![PurchaseLine {
            product_id: "prod-a".into(),
            buy_count: 3,
        }]
    );
    assert_eq!(cart.snapshot().await.expect("snapshot").entries[0].buy_count(), 3);

    cart.shutdown().await.expect("shutdown");
}

#[tokio::test(start_paused = true)]
async fn debounce_due_during_flight_is_dropped() {
    let api = FakeBackend::with_cart(vec![purchase("a", 1)]);
    let cart = spawn_cart(api.clone(), CartConfig::default());
    cart.refetch().await.expect("refetch");
    let mut sub = cart.subscribe();

    let out = cart
        .change_quantity(0, QuantityAction::Increase, 1)
        .await
        .expect("increase");
    assert_eq!(out, QuantityOutcome::Debounced(2));

    let gate = api.gate.lock().await;
    assert_eq!(cart.update_quantity("a".into(), 5).await.expect("update"), Dispatch::Sent);
    tokio::time::sleep(Duration::from_millis(700)).await;

    drop(gate);
    wait_for(&mut sub, is_reconciled).await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    let sent: Vec<BuyCount> = api.updates().iter().map(|l| l.buy_count).collect();
    assert_eq!(sent, vec![5]);
    assert_eq!(cart.snapshot().await.expect("snapshot").entries[0].buy_count(), 5);

    cart.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn quantity_outside_stock_is_ignored() {
    let api = FakeBackend::with_cart(vec![purchase("a", 10)]);
    let cart = spawn_cart(api.clone(), CartConfig::default());
    cart.refetch().await.expect("refetch");

    let up = cart
        .change_quantity(0, QuantityAction::Increase, 10)
        .await
        .expect("increase");
    assert_eq!(up, QuantityOutcome::Unchanged);

    let typed = cart
        .change_quantity(0, QuantityAction::Change, 99)
        .await
        .expect("change");
    assert_eq!(typed, QuantityOutcome::Local(10));

    let missing = cart.change_quantity(3, QuantityAction::Decrease, 2).await;
    assert!(matches!(missing, Err(RuntimeError::Store(_))));

    cart.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn checkout_with_nothing_selected_sends_nothing() {
    let api = FakeBackend::with_cart(vec![purchase("a", 1)]);
    let cart = spawn_cart(api.clone(), CartConfig::default());
    cart.refetch().await.expect("refetch");
    let mut sub = cart.subscribe();

    assert_eq!(cart.buy_checked().await.expect("buy"), Dispatch::Skipped);

    let evt = wait_for(&mut sub, |e| matches!(e, CartEvent::Notice(_))).await;
    assert_eq!(
        evt,
        CartEvent::Notice(Notice {
            level: NoticeLevel::Info,
            message: EMPTY_SELECTION_MESSAGE.to_string(),
        })
    );
    assert!(api.buys.lock().expect("lock").is_empty());

    cart.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn buy_checked_sends_checked_lines_then_refetches() {
    let api = FakeBackend::with_cart(vec![purchase("a", 2), purchase("b", 1)]);
    let cart = spawn_cart(api.clone(), CartConfig::default());
    cart.refetch().await.expect("refetch");
    cart.toggle_one("a".into()).await.expect("toggle");
    let mut sub = cart.subscribe();

    assert_eq!(cart.buy_checked().await.expect("buy"), Dispatch::Sent);

    let notice = wait_for(&mut sub, |e| matches!(e, CartEvent::Notice(_))).await;
    assert_eq!(
        notice,
        CartEvent::Notice(Notice {
            level: NoticeLevel::Success,
            message: "Buy successfully".to_string(),
        })
    );
    assert_eq!(wait_for(&mut sub, is_reconciled).await, CartEvent::Reconciled { count: 1 });

    assert_eq!(
        *api.buys.lock().expect("lock"),
        vec![vec![PurchaseLine {
            product_id: "prod-a".into(),
            buy_count: 2,
        }]]
    );
    let snap = cart.snapshot().await.expect("snapshot");
    let ids: Vec<&str> = snap.entries.iter().map(|e| e.id().as_str()).collect();
    assert_eq!(ids, vec!["b"]);

    cart.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn in_flight_rows_are_disabled_until_refetch() {
    let api = FakeBackend::with_cart(vec![purchase("a", 1), purchase("b", 1)]);
    let cart = spawn_cart(api.clone(), CartConfig::default());
    cart.refetch().await.expect("refetch");
    let mut sub = cart.subscribe();

    let gate = api.gate.lock().await;
    assert_eq!(cart.update_quantity("a".into(), 3).await.expect("update"), Dispatch::Sent);

    let snap = cart.snapshot().await.expect("snapshot");
    assert!(snap.entries[0].is_disabled);
    assert!(!snap.entries[1].is_disabled);
    let blocked = cart
        .change_quantity(0, QuantityAction::Increase, 1)
        .await
        .expect("increase");
    assert_eq!(blocked, QuantityOutcome::Unchanged);

    drop(gate);
    wait_for(&mut sub, is_reconciled).await;

    let snap = cart.snapshot().await.expect("snapshot");
    assert!(snap.entries.iter().all(|e| !e.is_disabled));
    assert_eq!(snap.entries[0].buy_count(), 3);

    cart.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn failed_update_reenables_rows_without_rollback() {
    let api = FakeBackend::with_cart(vec![purchase("a", 1)]);
    api.fail_updates.store(true, Ordering::SeqCst);
    let cart = spawn_cart(api.clone(), CartConfig::default());
    cart.refetch().await.expect("refetch");
    let mut sub = cart.subscribe();

    cart.change_quantity(0, QuantityAction::Change, 5)
        .await
        .expect("change");
    assert_eq!(cart.update_quantity("a".into(), 5).await.expect("update"), Dispatch::Sent);

    assert_eq!(
        wait_for(&mut sub, |e| matches!(e, CartEvent::Failed { .. })).await,
        CartEvent::Failed {
            kind: MutationKind::UpdateQuantity
        }
    );
    let notice = wait_for(&mut sub, |e| matches!(e, CartEvent::Notice(_))).await;
    assert_eq!(
        notice,
        CartEvent::Notice(Notice {
            level: NoticeLevel::Error,
            message: "update failed".to_string(),
        })
    );

    let snap = cart.snapshot().await.expect("snapshot");
    assert_eq!(snap.entries[0].buy_count(), 5);
    assert!(!snap.entries[0].is_disabled);
    assert_eq!(api.fetches.load(Ordering::SeqCst), 1, "no refetch after failure");

    cart.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn add_to_cart_checks_new_row_only_once() {
    let api = FakeBackend::with_cart(vec![purchase("a", 1)]);
    let cart = spawn_cart(api.clone(), CartConfig::default());
    cart.refetch().await.expect("refetch");

    let id = cart
        .add_to_cart_and_navigate("prod-z".into(), 2)
        .await
        .expect("add");
    assert_eq!(id, PurchaseId::from("pur-new-prod-z"));

    let snap = cart.snapshot().await.expect("snapshot");
    let flags: Vec<(&str, bool)> = snap
        .entries
        .iter()
        .map(|e| (e.id().as_str(), e.is_checked))
        .collect();
    assert_eq!(flags, vec![("a", false), ("pur-new-prod-z", true)]);
    assert_eq!(snap.totals.total_amount, 80);
    assert_eq!(snap.totals.total_saved, 40);

    cart.toggle_one(id.clone()).await.expect("toggle");
    cart.refetch().await.expect("refetch");
    let snap = cart.snapshot().await.expect("snapshot");
    assert!(snap.entries.iter().all(|e| !e.is_checked));

    let unknown = cart.add_to_cart_and_navigate("prod-missing".into(), 1).await;
    assert!(matches!(unknown, Err(RuntimeError::Api(_))));

    cart.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn entering_cart_with_marker_checks_that_row() {
    let api = FakeBackend::with_cart(vec![purchase("a", 1), purchase("b", 1)]);
    let cart = spawn_cart(api.clone(), CartConfig::default());

    assert_eq!(cart.enter_cart(Some("b".into())).await.expect("enter"), 2);

    let snap = cart.snapshot().await.expect("snapshot");
    assert!(!snap.entries[0].is_checked);
    assert!(snap.entries[1].is_checked);
    assert!(!snap.is_all_checked);

    cart.toggle_all().await.expect("toggle all");
    assert!(cart.snapshot().await.expect("snapshot").is_all_checked);

    cart.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn delete_checked_removes_rows_and_skips_when_empty() {
    let api = FakeBackend::with_cart(vec![purchase("a", 1), purchase("b", 1), purchase("c", 1)]);
    let cart = spawn_cart(api.clone(), CartConfig::default());
    cart.refetch().await.expect("refetch");
    let mut sub = cart.subscribe();

    cart.toggle_one("a".into()).await.expect("toggle");
    cart.toggle_one("c".into()).await.expect("toggle");
    assert_eq!(cart.delete_checked().await.expect("delete"), Dispatch::Sent);
    assert_eq!(wait_for(&mut sub, is_reconciled).await, CartEvent::Reconciled { count: 1 });

    assert_eq!(
        *api.deletes.lock().expect("lock"),
        vec![vec![PurchaseId::from("a"), PurchaseId::from("c")]]
    );
    assert_eq!(cart.delete_checked().await.expect("delete"), Dispatch::Skipped);

    assert_eq!(cart.delete_one("b".into()).await.expect("delete"), Dispatch::Sent);
    assert_eq!(wait_for(&mut sub, is_reconciled).await, CartEvent::Reconciled { count: 0 });
    assert!(cart.snapshot().await.expect("snapshot").entries.is_empty());

    cart.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn reset_clears_rows_and_supersedes_in_flight_requests() {
    let api = FakeBackend::with_cart(vec![purchase("a", 1)]);
    let cart = spawn_cart(api.clone(), CartConfig::default());
    cart.refetch().await.expect("refetch");
    let mut sub = cart.subscribe();

    let gate = api.gate.lock().await;
    let pending = tokio::spawn({
        let cart = cart.clone();
        async move { cart.add_to_cart_and_navigate("prod-z".into(), 1).await }
    });
    wait_for(&mut sub, |e| matches!(e, CartEvent::Dispatched { .. })).await;

    cart.reset().await.expect("reset");
    assert_eq!(wait_for(&mut sub, |e| *e == CartEvent::Reset).await, CartEvent::Reset);
    drop(gate);

    let res = pending.await.expect("join");
    assert!(matches!(res, Err(RuntimeError::Superseded)));
    let snap = cart.snapshot().await.expect("snapshot");
    assert!(snap.entries.is_empty());
    assert_eq!(snap.totals.checked_count, 0);

    cart.shutdown().await.expect("shutdown");
}
