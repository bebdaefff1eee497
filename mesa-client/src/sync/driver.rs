//! Sync driver - picks between push-driven and poll-driven refresh
//!
//! Watches the tenant context and the push channel. A new tenant resets the
//! snapshot, (re)opens the push channel and triggers a full load. Push events
//! trigger targeted reloads; while the channel is down a poll timer reloads
//! orders and tables.

use std::sync::Arc;
use std::time::Duration;

use shared::{PushEvent, ResourceKind, TenantId};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tokio_util::sync::CancellationToken;

use super::SyncEngine;
use crate::push::{PushChannel, PushSignal};

/// Synchronization state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// No active tenant
    #[default]
    Disconnected,
    /// Push channel connected
    LiveSynced,
    /// Push channel down, poll timer running
    PollSynced,
}

/// Builder for the background sync task
pub struct SyncDriver {
    engine: SyncEngine,
    channel: Arc<PushChannel>,
    poll_interval: Duration,
}

impl SyncDriver {
    pub fn new(engine: SyncEngine, channel: Arc<PushChannel>) -> Self {
        Self {
            engine,
            channel,
            poll_interval: Duration::from_secs(15),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Start the driver on the current runtime
    pub fn spawn(self) -> SyncHandle {
        let (mode_tx, mode_rx) = watch::channel(SyncMode::Disconnected);
        let cancel = CancellationToken::new();
        let state = DriverState {
            engine: self.engine,
            channel: self.channel,
            poll_interval: self.poll_interval,
            mode: mode_tx,
            active: None,
            poll: None,
        };
        let task = tokio::spawn(state.run(cancel.clone()));
        SyncHandle {
            mode: mode_rx,
            cancel,
            task,
        }
    }
}

/// Handle to a running driver
pub struct SyncHandle {
    mode: watch::Receiver<SyncMode>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SyncHandle {
    pub fn mode(&self) -> SyncMode {
        *self.mode.borrow()
    }

    pub fn subscribe_mode(&self) -> watch::Receiver<SyncMode> {
        self.mode.clone()
    }

    /// Stop polling, close the push channel and wait for the driver to exit
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::error!("Sync driver task failed: {e}");
        }
    }
}

struct DriverState {
    engine: SyncEngine,
    channel: Arc<PushChannel>,
    poll_interval: Duration,
    mode: watch::Sender<SyncMode>,
    active: Option<TenantId>,
    poll: Option<CancellationToken>,
}

impl DriverState {
    async fn run(mut self, cancel: CancellationToken) {
        tracing::info!("Sync driver started");
        let mut tenants = self.engine.tenant().subscribe();
        let mut signals = self.channel.subscribe();

        let initial = tenants.borrow_and_update().clone();
        self.on_tenant(initial).await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,

                changed = tenants.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let tenant = tenants.borrow_and_update().clone();
                    self.on_tenant(tenant).await;
                }

                signal = signals.recv() => match signal {
                    Ok(signal) => self.on_signal(signal),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Push signals lagged, reloading everything");
                        if self.active.is_some() {
                            self.spawn_full_reload();
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }

        self.stop_polling();
        self.channel.disconnect().await;
        self.set_mode(SyncMode::Disconnected);
        tracing::info!("Sync driver stopped");
    }

    fn set_mode(&self, mode: SyncMode) {
        let changed = self.mode.send_if_modified(|current| {
            if *current == mode {
                false
            } else {
                *current = mode;
                true
            }
        });
        if changed {
            tracing::info!(?mode, "Sync mode changed");
        }
    }

    async fn on_tenant(&mut self, tenant: Option<TenantId>) {
        if tenant == self.active {
            return;
        }
        self.stop_polling();

        match tenant {
            None => {
                tracing::info!("No active restaurant, stopping sync");
                self.active = None;
                self.channel.disconnect().await;
                self.engine.reset(None);
                self.set_mode(SyncMode::Disconnected);
            }
            Some(tenant) => {
                tracing::info!(tenant_id = %tenant, "Starting sync");
                self.active = Some(tenant.clone());
                self.engine.reset(Some(tenant.clone()));
                self.channel.connect(&tenant).await;
                self.set_mode(SyncMode::LiveSynced);
                self.spawn_full_reload();
            }
        }
    }

    fn on_signal(&mut self, signal: PushSignal) {
        let Some(active) = self.active.clone() else {
            return;
        };
        if *signal.tenant() != active {
            tracing::debug!(tenant_id = %signal.tenant(), "Ignoring signal for previous restaurant");
            return;
        }

        match signal {
            PushSignal::Connected(_) => {
                self.stop_polling();
                self.set_mode(SyncMode::LiveSynced);
            }
            PushSignal::Disconnected(_) => {
                self.start_polling(active);
                self.set_mode(SyncMode::PollSynced);
            }
            PushSignal::Event(_, event) => self.on_event(event),
        }
    }

    fn on_event(&self, event: PushEvent) {
        for &kind in event.resources() {
            let engine = self.engine.clone();
            tokio::spawn(async move {
                if let Err(e) = engine.reload(kind).await {
                    tracing::warn!(%event, resource = %kind, "Background reload failed: {e}");
                }
            });
        }
    }

    fn spawn_full_reload(&self) {
        let engine = self.engine.clone();
        tokio::spawn(async move {
            if let Err(e) = engine.load_all().await {
                tracing::warn!("Full reload failed: {e}");
            }
        });
    }

    fn start_polling(&mut self, tenant: TenantId) {
        if self.poll.is_some() {
            return;
        }
        tracing::info!(tenant_id = %tenant, period_secs = self.poll_interval.as_secs(), "Starting poll fallback");
        let token = CancellationToken::new();
        self.poll = Some(token.clone());
        tokio::spawn(poll_loop(self.engine.clone(), self.poll_interval, token));
    }

    fn stop_polling(&mut self) {
        if let Some(token) = self.poll.take() {
            tracing::debug!("Stopping poll fallback");
            token.cancel();
        }
    }
}

/// Reload the high-churn resources every `period` until cancelled
async fn poll_loop(engine: SyncEngine, period: Duration, cancel: CancellationToken) {
    let mut ticker = interval_at(Instant::now() + period, period);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                tracing::debug!("Poll tick");
                let (orders, tables) = tokio::join!(
                    engine.reload(ResourceKind::Orders),
                    engine.reload(ResourceKind::Tables)
                );
                for result in [orders, tables] {
                    if let Err(e) = result {
                        tracing::warn!("Poll reload failed: {e}");
                    }
                }
            }
        }
    }
}
