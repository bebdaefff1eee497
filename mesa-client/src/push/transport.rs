//! Push transports: WebSocket and in-process

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use shared::{PushEvent, RawPushEvent, TenantId};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use crate::{ClientConfig, ClientError, ClientResult};

/// Frames of one connection; the stream ends (or yields an error) on disconnect
pub type PushStream = BoxStream<'static, ClientResult<RawPushEvent>>;

/// Opens tenant-scoped push connections
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn open(&self, tenant: &TenantId) -> ClientResult<PushStream>;
}

// ========== WebSocket ==========

/// Realtime service over WebSocket, one JSON text frame per event
#[derive(Debug, Clone)]
pub struct WsPushTransport {
    url: String,
}

impl WsPushTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.realtime_url())
    }

    /// Realtime URL carrying the tenant as `restaurantId` query parameter
    pub fn session_url(&self, tenant: &TenantId) -> ClientResult<String> {
        let url = reqwest::Url::parse_with_params(&self.url, &[("restaurantId", tenant.as_str())])
            .map_err(|e| ClientError::validation(format!("invalid realtime url {}: {e}", self.url)))?;
        Ok(url.into())
    }
}

#[async_trait]
impl PushTransport for WsPushTransport {
    async fn open(&self, tenant: &TenantId) -> ClientResult<PushStream> {
        let url = self.session_url(tenant)?;
        let (ws, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| ClientError::RemoteUnavailable(format!("push connect failed: {e}")))?;

        let events = stream::unfold(ws, |mut ws| async move {
            loop {
                match ws.next().await? {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<RawPushEvent>(text.as_str()) {
                            Ok(event) => return Some((Ok(event), ws)),
                            Err(e) => tracing::debug!("Ignoring malformed push frame: {e}"),
                        }
                    }
                    Ok(Message::Close(_)) => return None,
                    Ok(_) => {}
                    Err(e) => {
                        return Some((
                            Err(ClientError::RemoteUnavailable(format!("push channel: {e}"))),
                            ws,
                        ));
                    }
                }
            }
        });
        Ok(events.boxed())
    }
}

// ========== In-process ==========

#[derive(Default)]
struct HubState {
    connections: Vec<(TenantId, mpsc::UnboundedSender<RawPushEvent>)>,
    refuse: bool,
    opened: usize,
}

/// Fake realtime service: tests emit events and cut connections through it
#[derive(Clone, Default)]
pub struct PushHub {
    inner: Arc<Mutex<HubState>>,
}

impl PushHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, HubState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn transport(&self) -> MemoryPushTransport {
        MemoryPushTransport { hub: self.clone() }
    }

    /// Deliver an event to every open connection of `tenant`; returns the count reached
    pub fn emit(&self, tenant: &TenantId, event: PushEvent) -> usize {
        self.emit_raw(tenant, RawPushEvent::new(event))
    }

    pub fn emit_raw(&self, tenant: &TenantId, event: RawPushEvent) -> usize {
        let mut state = self.state();
        state.connections.retain(|(_, tx)| !tx.is_closed());
        state
            .connections
            .iter()
            .filter(|(t, _)| t == tenant)
            .filter(|(_, tx)| tx.send(event.clone()).is_ok())
            .count()
    }

    /// Close every connection of `tenant` from the server side
    pub fn drop_connections(&self, tenant: &TenantId) {
        self.state().connections.retain(|(t, _)| t != tenant);
    }

    /// While set, new connections are refused
    pub fn set_refuse(&self, refuse: bool) {
        self.state().refuse = refuse;
    }

    /// Open connections of `tenant`
    pub fn connections(&self, tenant: &TenantId) -> usize {
        let mut state = self.state();
        state.connections.retain(|(_, tx)| !tx.is_closed());
        state.connections.iter().filter(|(t, _)| t == tenant).count()
    }

    /// Connections accepted since creation
    pub fn opened(&self) -> usize {
        self.state().opened
    }
}

/// Transport backed by a [`PushHub`]
#[derive(Clone)]
pub struct MemoryPushTransport {
    hub: PushHub,
}

#[async_trait]
impl PushTransport for MemoryPushTransport {
    async fn open(&self, tenant: &TenantId) -> ClientResult<PushStream> {
        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut state = self.hub.state();
            if state.refuse {
                return Err(ClientError::RemoteUnavailable(
                    "push hub refused connection".to_string(),
                ));
            }
            state.opened += 1;
            state.connections.push((tenant.clone(), tx));
        }
        let events = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (Ok(event), rx))
        });
        Ok(events.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> TenantId {
        TenantId::parse(raw).unwrap()
    }

    #[test]
    fn test_session_url_carries_tenant() {
        let transport = WsPushTransport::new("ws://localhost:3000/realtime");
        assert_eq!(
            transport.session_url(&id("r 1")).unwrap(),
            "ws://localhost:3000/realtime?restaurantId=r+1"
        );
    }

    #[tokio::test]
    async fn test_hub_routes_by_tenant() {
        let hub = PushHub::new();
        let transport = hub.transport();
        let mut a = transport.open(&id("a")).await.unwrap();
        let _b = transport.open(&id("b")).await.unwrap();

        assert_eq!(hub.emit(&id("a"), PushEvent::TableUpdated), 1);
        let frame = a.next().await.unwrap().unwrap();
        assert_eq!(frame.kind(), Some(PushEvent::TableUpdated));

        hub.drop_connections(&id("a"));
        assert!(a.next().await.is_none());
        assert_eq!(hub.connections(&id("b")), 1);
    }

    #[tokio::test]
    async fn test_refused_connection() {
        let hub = PushHub::new();
        hub.set_refuse(true);
        assert!(matches!(
            hub.transport().open(&id("a")).await,
            Err(ClientError::RemoteUnavailable(_))
        ));
        assert_eq!(hub.opened(), 0);
    }
}
