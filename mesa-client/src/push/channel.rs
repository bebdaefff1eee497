//! Push channel session management

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use shared::{PushEvent, TenantId};
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::transport::PushTransport;
use crate::ClientConfig;

/// Broadcast capacity of the signal channel
const SIGNAL_CAPACITY: usize = 256;

/// What the push channel reports, tagged with the tenant it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushSignal {
    Connected(TenantId),
    Disconnected(TenantId),
    Event(TenantId, PushEvent),
}

impl PushSignal {
    pub fn tenant(&self) -> &TenantId {
        match self {
            PushSignal::Connected(t) | PushSignal::Disconnected(t) | PushSignal::Event(t, _) => t,
        }
    }
}

struct Session {
    tenant: TenantId,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Session {
    async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!(tenant_id = %self.tenant, "Push session task failed: {e}");
        }
    }
}

/// Owns at most one live push connection
pub struct PushChannel {
    transport: Arc<dyn PushTransport>,
    signals: broadcast::Sender<PushSignal>,
    reconnect_delay: Duration,
    max_reconnect_delay: Duration,
    session: Mutex<Option<Session>>,
}

impl PushChannel {
    pub fn new(transport: Arc<dyn PushTransport>, config: &ClientConfig) -> Self {
        Self::with_backoff(
            transport,
            config.reconnect_delay,
            config.max_reconnect_delay,
        )
    }

    pub fn with_backoff(
        transport: Arc<dyn PushTransport>,
        reconnect_delay: Duration,
        max_reconnect_delay: Duration,
    ) -> Self {
        let (signals, _) = broadcast::channel(SIGNAL_CAPACITY);
        Self {
            transport,
            signals,
            reconnect_delay,
            max_reconnect_delay: max_reconnect_delay.max(reconnect_delay),
            session: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PushSignal> {
        self.signals.subscribe()
    }

    /// Tenant of the current session, if any
    pub async fn tenant(&self) -> Option<TenantId> {
        self.session.lock().await.as_ref().map(|s| s.tenant.clone())
    }

    /// Open the session for `tenant`.
    ///
    /// No-op when a session for the same tenant is running; otherwise the
    /// previous session is torn down before the new one starts.
    pub async fn connect(&self, tenant: &TenantId) {
        let mut session = self.session.lock().await;
        if let Some(current) = session.as_ref()
            && current.tenant == *tenant
            && !current.task.is_finished()
        {
            return;
        }
        if let Some(previous) = session.take() {
            previous.stop().await;
        }

        tracing::info!(tenant_id = %tenant, "Opening push channel");
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_session(
            self.transport.clone(),
            tenant.clone(),
            self.signals.clone(),
            cancel.clone(),
            self.reconnect_delay,
            self.max_reconnect_delay,
        ));
        *session = Some(Session {
            tenant: tenant.clone(),
            cancel,
            task,
        });
    }

    /// Close the session; no signal is emitted for an explicit disconnect
    pub async fn disconnect(&self) {
        let previous = self.session.lock().await.take();
        if let Some(previous) = previous {
            tracing::info!(tenant_id = %previous.tenant, "Closing push channel");
            previous.stop().await;
        }
    }
}

/// Connect, forward events, reconnect with exponential back-off until cancelled
async fn run_session(
    transport: Arc<dyn PushTransport>,
    tenant: TenantId,
    signals: broadcast::Sender<PushSignal>,
    cancel: CancellationToken,
    initial_delay: Duration,
    max_delay: Duration,
) {
    let mut delay = initial_delay;
    // Last state reported to subscribers; None until the first attempt
    let mut reported_connected: Option<bool> = None;

    loop {
        let opened = tokio::select! {
            _ = cancel.cancelled() => return,
            opened = transport.open(&tenant) => opened,
        };

        match opened {
            Ok(mut stream) => {
                delay = initial_delay;
                tracing::info!(tenant_id = %tenant, "Push channel connected");
                let _ = signals.send(PushSignal::Connected(tenant.clone()));
                reported_connected = Some(true);

                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        frame = stream.next() => match frame {
                            Some(Ok(raw)) => match raw.kind() {
                                Some(event) => {
                                    tracing::debug!(tenant_id = %tenant, event = %event, "Push event");
                                    let _ = signals.send(PushSignal::Event(tenant.clone(), event));
                                }
                                None => {
                                    tracing::debug!(tenant_id = %tenant, event = %raw.event, "Ignoring unknown push event");
                                }
                            },
                            Some(Err(e)) => {
                                tracing::warn!(tenant_id = %tenant, "Push channel error: {e}");
                                break;
                            }
                            None => {
                                tracing::warn!(tenant_id = %tenant, "Push channel closed by server");
                                break;
                            }
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!(
                    tenant_id = %tenant,
                    delay_ms = delay.as_millis() as u64,
                    "Push channel connect failed: {e}"
                );
            }
        }

        if reported_connected != Some(false) {
            let _ = signals.send(PushSignal::Disconnected(tenant.clone()));
            reported_connected = Some(false);
        }

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }
        delay = (delay * 2).min(max_delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::PushHub;

    fn id(raw: &str) -> TenantId {
        TenantId::parse(raw).unwrap()
    }

    fn channel(hub: &PushHub) -> PushChannel {
        PushChannel::with_backoff(
            Arc::new(hub.transport()),
            Duration::from_millis(10),
            Duration::from_millis(40),
        )
    }

    #[tokio::test]
    async fn test_connect_is_idempotent_for_same_tenant() {
        let hub = PushHub::new();
        let channel = channel(&hub);
        let mut signals = channel.subscribe();

        channel.connect(&id("a")).await;
        assert_eq!(signals.recv().await.unwrap(), PushSignal::Connected(id("a")));
        channel.connect(&id("a")).await;

        assert_eq!(hub.opened(), 1);
        assert_eq!(channel.tenant().await, Some(id("a")));
        channel.disconnect().await;
        assert!(channel.tenant().await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_events_are_dropped() {
        let hub = PushHub::new();
        let channel = channel(&hub);
        let mut signals = channel.subscribe();
        channel.connect(&id("a")).await;
        signals.recv().await.unwrap();

        hub.emit_raw(
            &id("a"),
            shared::RawPushEvent {
                event: "order.exploded".into(),
                data: serde_json::Value::Null,
            },
        );
        hub.emit(&id("a"), PushEvent::OrderCreated);

        assert_eq!(
            signals.recv().await.unwrap(),
            PushSignal::Event(id("a"), PushEvent::OrderCreated)
        );
        channel.disconnect().await;
    }
}
