//! Floor monitor
//!
//! Follows one restaurant's floor live and prints a summary whenever the
//! snapshot or the sync mode changes.
//!
//! Run: MESA_RESTAURANT_ID=<id> cargo run --example floor_monitor

use std::sync::Arc;

use mesa_client::shared::TenantId;
use mesa_client::{
    ClientConfig, HttpGateway, PushChannel, Snapshot, SyncDriver, SyncEngine, TenantContext,
    WsPushTransport,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ClientConfig::from_env();
    let tenant = match &config.state_path {
        Some(path) => TenantContext::load(path.clone())?,
        None => TenantContext::in_memory(),
    };
    let config = config.with_local_state(&tenant.local_state());
    tracing::info!(api = %config.api_base_url, realtime = %config.realtime_url(), "Floor monitor starting");

    if let Some(id) = std::env::var("MESA_RESTAURANT_ID")
        .ok()
        .and_then(|v| TenantId::parse(&v))
    {
        tenant.set_active(&id)?;
    }
    if tenant.active_id().is_none() {
        anyhow::bail!("no active restaurant; set MESA_RESTAURANT_ID");
    }

    let store = Arc::new(HttpGateway::from_config(&config)?);
    let engine = SyncEngine::new(store, tenant.clone());
    let channel = Arc::new(PushChannel::new(
        Arc::new(WsPushTransport::from_config(&config)),
        &config,
    ));
    let handle = SyncDriver::new(engine.clone(), channel)
        .with_poll_interval(config.poll_interval)
        .spawn();

    let mut snapshots = engine.subscribe();
    let mut modes = handle.subscribe_mode();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                print_summary(&snapshots.borrow_and_update());
            }
            changed = modes.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("sync mode: {:?}", *modes.borrow_and_update());
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}

fn print_summary(snapshot: &Snapshot) {
    let queue = snapshot.kitchen_queue();
    println!(
        "{} tables, {} menu items, {} orders ({} incoming, {} ready)",
        snapshot.tables.len(),
        snapshot.menu_items.len(),
        snapshot.orders.len(),
        queue.incoming.len(),
        queue.ready.len(),
    );
    for table in snapshot.tables_by_number() {
        println!(
            "  table {:>3}  {:?}  {:?}  unpaid orders: {}",
            table.number,
            table.status,
            table.payment_status,
            snapshot.unpaid_order_count(table.number),
        );
    }
}
