//! Push channel sessions over the in-process hub

use std::sync::Arc;
use std::time::Duration;

use mesa_client::shared::{PushEvent, TenantId};
use mesa_client::{PushChannel, PushHub, PushSignal};
use tokio::sync::broadcast::error::TryRecvError;
use tokio::time::{Instant, sleep, timeout};

fn tenant(raw: &str) -> TenantId {
    TenantId::parse(raw).unwrap()
}

fn channel(hub: &PushHub) -> PushChannel {
    PushChannel::with_backoff(
        Arc::new(hub.transport()),
        Duration::from_millis(100),
        Duration::from_millis(800),
    )
}

#[tokio::test(start_paused = true)]
async fn test_reconnects_after_server_drop() {
    let hub = PushHub::new();
    let channel = channel(&hub);
    let mut signals = channel.subscribe();
    let a = tenant("osteria");

    channel.connect(&a).await;
    assert_eq!(signals.recv().await.unwrap(), PushSignal::Connected(a.clone()));

    hub.drop_connections(&a);
    assert_eq!(
        signals.recv().await.unwrap(),
        PushSignal::Disconnected(a.clone())
    );
    assert_eq!(signals.recv().await.unwrap(), PushSignal::Connected(a.clone()));
    assert_eq!(hub.opened(), 2);

    hub.emit(&a, PushEvent::FloorPlanUpdated);
    assert_eq!(
        signals.recv().await.unwrap(),
        PushSignal::Event(a.clone(), PushEvent::FloorPlanUpdated)
    );

    channel.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn test_backoff_is_capped_and_reported_once() {
    let hub = PushHub::new();
    hub.set_refuse(true);
    let channel = channel(&hub);
    let mut signals = channel.subscribe();
    let a = tenant("osteria");

    channel.connect(&a).await;
    assert_eq!(
        signals.recv().await.unwrap(),
        PushSignal::Disconnected(a.clone())
    );

    // 100 + 200 + 400 + 800 + 800 ...
    sleep(Duration::from_secs(5)).await;
    assert!(matches!(signals.try_recv(), Err(TryRecvError::Empty)));

    let healed_at = Instant::now();
    hub.set_refuse(false);
    let signal = timeout(Duration::from_secs(2), signals.recv())
        .await
        .expect("reconnect within the capped delay")
        .unwrap();
    assert_eq!(signal, PushSignal::Connected(a.clone()));
    assert!(healed_at.elapsed() <= Duration::from_millis(800));

    channel.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn test_switching_tenant_closes_previous_session() {
    let hub = PushHub::new();
    let channel = channel(&hub);
    let mut signals = channel.subscribe();
    let a = tenant("osteria");
    let b = tenant("bistro");

    channel.connect(&a).await;
    assert_eq!(signals.recv().await.unwrap(), PushSignal::Connected(a.clone()));

    channel.connect(&b).await;
    assert_eq!(signals.recv().await.unwrap(), PushSignal::Connected(b.clone()));
    assert_eq!(channel.tenant().await, Some(b.clone()));
    assert_eq!(hub.connections(&a), 0);
    assert_eq!(hub.emit(&a, PushEvent::OrderCreated), 0);

    hub.emit(&b, PushEvent::TableUpdated);
    assert_eq!(
        signals.recv().await.unwrap(),
        PushSignal::Event(b.clone(), PushEvent::TableUpdated)
    );

    channel.disconnect().await;
    sleep(Duration::from_secs(1)).await;
    assert!(matches!(signals.try_recv(), Err(TryRecvError::Empty)));
    assert_eq!(hub.connections(&b), 0);
}
