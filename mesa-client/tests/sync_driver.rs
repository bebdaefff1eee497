//! Sync driver: push/poll switching and tenant changes
//!
//! Runs on paused time; the runtime auto-advances the clock whenever every
//! task is idle, so reconnect delays and poll periods pass instantly.

use std::sync::Arc;
use std::time::Duration;

use mesa_client::shared::{PushEvent, ResourceKind, TenantId};
use mesa_client::{
    MemoryStore, PushChannel, PushHub, SyncDriver, SyncEngine, SyncHandle, SyncMode,
    TenantContext,
};
use tokio::time::sleep;

const POLL: Duration = Duration::from_secs(1);

fn tenant(raw: &str) -> TenantId {
    TenantId::parse(raw).unwrap()
}

struct Harness {
    store: Arc<MemoryStore>,
    hub: PushHub,
    context: TenantContext,
    engine: SyncEngine,
    handle: SyncHandle,
}

fn start(store: Arc<MemoryStore>, hub: PushHub, context: TenantContext) -> Harness {
    let engine = SyncEngine::new(store.clone(), context.clone());
    let channel = Arc::new(PushChannel::with_backoff(
        Arc::new(hub.transport()),
        Duration::from_millis(100),
        Duration::from_millis(400),
    ));
    let handle = SyncDriver::new(engine.clone(), channel)
        .with_poll_interval(POLL)
        .spawn();
    Harness {
        store,
        hub,
        context,
        engine,
        handle,
    }
}

async fn eventually(what: &str, mut check: impl FnMut() -> bool) {
    for _ in 0..400 {
        if check() {
            return;
        }
        sleep(Duration::from_millis(25)).await;
    }
    panic!("timed out waiting for {what}");
}

#[tokio::test(start_paused = true)]
async fn test_clearing_tenant_stops_polling() {
    let store = Arc::new(MemoryStore::new());
    let a = tenant("osteria");
    store.seed_table(&a, 1);
    let hub = PushHub::new();
    hub.set_refuse(true);
    let context = TenantContext::in_memory();
    context.set_active(&a).unwrap();

    let h = start(store, hub, context);
    eventually("poll mode", || h.handle.mode() == SyncMode::PollSynced).await;

    let before = h.store.list_calls(ResourceKind::Orders);
    sleep(POLL * 3).await;
    assert!(h.store.list_calls(ResourceKind::Orders) > before);
    assert!(h.engine.read(|s| s.tables.len()) == 1);

    h.context.clear().unwrap();
    eventually("disconnected", || h.handle.mode() == SyncMode::Disconnected).await;

    let stopped_at = h.store.list_calls(ResourceKind::Orders);
    sleep(POLL * 5).await;
    assert_eq!(h.store.list_calls(ResourceKind::Orders), stopped_at);
    assert_eq!(h.engine.snapshot().tenant_id, None);
    assert!(h.engine.snapshot().is_empty());

    h.handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_push_event_reloads_only_its_resources() {
    let store = Arc::new(MemoryStore::new());
    let a = tenant("osteria");
    store.seed_table(&a, 1);
    let hub = PushHub::new();
    let context = TenantContext::in_memory();
    context.set_active(&a).unwrap();

    let h = start(store, hub, context);
    eventually("push connection", || h.hub.connections(&a) == 1).await;
    eventually("initial load", || {
        h.store.list_calls(ResourceKind::FloorPlan) == 1
    })
    .await;
    assert_eq!(h.handle.mode(), SyncMode::LiveSynced);

    let menu_before = h.store.list_calls(ResourceKind::MenuItems);
    let orders_before = h.store.list_calls(ResourceKind::Orders);
    h.store
        .seed_menu_item(&a, "Gnocchi", "Mains", rust_decimal::Decimal::TEN);
    assert_eq!(h.hub.emit(&a, PushEvent::MenuItemCreated), 1);

    eventually("menu reload", || {
        h.store.list_calls(ResourceKind::MenuItems) > menu_before
    })
    .await;
    eventually("menu item cached", || h.engine.read(|s| s.menu_items.len()) == 1).await;
    assert_eq!(h.store.list_calls(ResourceKind::Orders), orders_before);

    // Live mode never polls
    sleep(POLL * 5).await;
    assert_eq!(h.store.list_calls(ResourceKind::Orders), orders_before);

    let tables_before = h.store.list_calls(ResourceKind::Tables);
    h.hub.emit(&a, PushEvent::OrderCreated);
    eventually("order event reload", || {
        h.store.list_calls(ResourceKind::Orders) > orders_before
            && h.store.list_calls(ResourceKind::Tables) > tables_before
    })
    .await;

    h.handle.shutdown().await;
    assert_eq!(h.hub.connections(&a), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_event_reload_keeps_driver_running() {
    let store = Arc::new(MemoryStore::new());
    let a = tenant("osteria");
    store.seed_table(&a, 1);
    let hub = PushHub::new();
    let context = TenantContext::in_memory();
    context.set_active(&a).unwrap();

    let h = start(store, hub, context);
    eventually("push connection", || h.hub.connections(&a) == 1).await;
    eventually("initial load", || {
        h.store.list_calls(ResourceKind::FloorPlan) == 1
    })
    .await;

    h.store.fail_reads(ResourceKind::MenuItems, 1);
    h.store
        .seed_menu_item(&a, "Risotto", "Mains", rust_decimal::Decimal::TEN);
    let before = h.store.list_calls(ResourceKind::MenuItems);
    h.hub.emit(&a, PushEvent::MenuItemCreated);

    eventually("failed menu reload", || {
        h.store.list_calls(ResourceKind::MenuItems) > before
    })
    .await;
    sleep(POLL).await;
    assert_eq!(h.handle.mode(), SyncMode::LiveSynced);
    assert_eq!(h.engine.read(|s| s.menu_items.len()), 0);

    h.hub.emit(&a, PushEvent::MenuItemUpdated);
    eventually("menu item cached", || h.engine.read(|s| s.menu_items.len()) == 1).await;
    assert_eq!(h.handle.mode(), SyncMode::LiveSynced);

    h.handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_dropped_channel_falls_back_to_polling_until_reconnect() {
    let store = Arc::new(MemoryStore::new());
    let a = tenant("osteria");
    store.seed_table(&a, 1);
    let hub = PushHub::new();
    let context = TenantContext::in_memory();
    context.set_active(&a).unwrap();

    let h = start(store, hub, context);
    eventually("push connection", || h.hub.connections(&a) == 1).await;

    h.hub.set_refuse(true);
    h.hub.drop_connections(&a);
    eventually("poll mode", || h.handle.mode() == SyncMode::PollSynced).await;

    let before = h.store.list_calls(ResourceKind::Tables);
    sleep(POLL * 2).await;
    assert!(h.store.list_calls(ResourceKind::Tables) > before);

    h.hub.set_refuse(false);
    eventually("live again", || h.handle.mode() == SyncMode::LiveSynced).await;
    assert_eq!(h.hub.connections(&a), 1);

    let settled = h.store.list_calls(ResourceKind::Orders);
    sleep(POLL * 5).await;
    assert_eq!(h.store.list_calls(ResourceKind::Orders), settled);

    h.handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_switching_tenant_replaces_snapshot_and_channel() {
    let store = Arc::new(MemoryStore::new());
    let a = tenant("osteria");
    let b = tenant("bistro");
    store.seed_table(&a, 1);
    for number in 1..=3 {
        store.seed_table(&b, number);
    }
    let hub = PushHub::new();
    let context = TenantContext::in_memory();
    context.set_active(&a).unwrap();

    let h = start(store, hub, context);
    eventually("tenant a loaded", || h.engine.read(|s| s.tables.len()) == 1).await;
    eventually("push for a", || h.hub.connections(&a) == 1).await;

    h.context.set_active_restaurant(&b, "Bistro").unwrap();
    eventually("tenant b loaded", || {
        h.engine
            .read(|s| s.tenant_id.as_ref() == Some(&b) && s.tables.len() == 3)
    })
    .await;
    eventually("push for b", || h.hub.connections(&b) == 1).await;

    assert_eq!(h.hub.connections(&a), 0);
    assert_eq!(h.hub.emit(&a, PushEvent::TableCreated), 0);
    let b_ids: Vec<String> = h.store.tables(&b).into_iter().map(|t| t.id).collect();
    h.engine.read(|s| {
        assert!(s.tables.iter().all(|t| b_ids.contains(&t.id)));
    });
    assert_eq!(h.handle.mode(), SyncMode::LiveSynced);

    h.handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_driver_without_tenant_stays_disconnected() {
    let store = Arc::new(MemoryStore::new());
    let hub = PushHub::new();
    let h = start(store, hub, TenantContext::in_memory());

    sleep(POLL * 3).await;
    assert_eq!(h.handle.mode(), SyncMode::Disconnected);
    assert_eq!(h.hub.opened(), 0);
    assert_eq!(h.store.list_calls(ResourceKind::Tables), 0);

    h.handle.shutdown().await;
}
