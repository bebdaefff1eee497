//! Synchronization engine
//!
//! Owns the snapshot of the active tenant. Every mutation goes to the store
//! first and the store's answer replaces the cached row; nothing is applied
//! optimistically. Responses that arrive after the tenant changed are
//! dropped instead of being written into the new tenant's snapshot.

use std::sync::Arc;

use shared::models::{
    FloorPlan, MenuItem, MenuItemCreate, MenuItemUpdate, Order, OrderCreate, OrderItemInput,
    OrderStatus, PaymentStatus, PaymentTiming, Table, TableCreate, TableStatus, TableUpdate,
};
use shared::{ResourceKind, TenantId};
use tokio::sync::watch;

use super::derive;
use super::{OrderDraft, Snapshot};
use crate::gateway::RemoteStore;
use crate::layout::{FloorPlanDraft, default_plan, prune_unknown_tables, sanitize_plan};
use crate::tenant::TenantContext;
use crate::{ClientError, ClientResult};

/// Cloneable handle; clones share the snapshot
#[derive(Clone)]
pub struct SyncEngine {
    store: Arc<dyn RemoteStore>,
    tenant: TenantContext,
    snapshot: Arc<watch::Sender<Snapshot>>,
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("tenant", &self.tenant)
            .finish_non_exhaustive()
    }
}

impl SyncEngine {
    pub fn new(store: Arc<dyn RemoteStore>, tenant: TenantContext) -> Self {
        let (snapshot, _) = watch::channel(Snapshot::empty(tenant.active_id()));
        Self {
            store,
            tenant,
            snapshot: Arc::new(snapshot),
        }
    }

    pub fn tenant(&self) -> &TenantContext {
        &self.tenant
    }

    pub fn store(&self) -> &Arc<dyn RemoteStore> {
        &self.store
    }

    // ========== Snapshot access ==========

    /// Copy of the current snapshot
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.borrow().clone()
    }

    /// Run `f` against the current snapshot without cloning it
    pub fn read<R>(&self, f: impl FnOnce(&Snapshot) -> R) -> R {
        f(&self.snapshot.borrow())
    }

    /// Receiver notified after every committed change
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot.subscribe()
    }

    /// Drop all cached data and rebind the snapshot to `tenant`
    pub fn reset(&self, tenant: Option<TenantId>) {
        self.snapshot.send_replace(Snapshot::empty(tenant));
    }

    fn require_tenant(&self) -> ClientResult<TenantId> {
        self.tenant.require()
    }

    /// Write into the snapshot if `tenant` is still the active one
    fn commit(&self, tenant: &TenantId, f: impl FnOnce(&mut Snapshot)) -> bool {
        if self.tenant.active_id().as_ref() != Some(tenant) {
            tracing::debug!(tenant_id = %tenant, "Dropping response for inactive restaurant");
            return false;
        }
        self.snapshot.send_modify(|snap| {
            if snap.tenant_id.as_ref() != Some(tenant) {
                *snap = Snapshot::empty(Some(tenant.clone()));
            }
            f(snap);
        });
        true
    }

    /// Read the snapshot only if it belongs to `tenant`
    fn read_for<R: Default>(&self, tenant: &TenantId, f: impl FnOnce(&Snapshot) -> R) -> R {
        let snap = self.snapshot.borrow();
        if snap.tenant_id.as_ref() == Some(tenant) {
            f(&snap)
        } else {
            R::default()
        }
    }

    /// Sanitized copy of `plan` without positions of tables the snapshot does not know
    fn clean_plan(&self, tenant: &TenantId, plan: &FloorPlan) -> FloorPlan {
        let mut clean = sanitize_plan(plan);
        let tables = self.read_for(tenant, |s| s.tables.clone());
        let dropped = prune_unknown_tables(&mut clean, &tables);
        if dropped > 0 {
            tracing::debug!(tenant_id = %tenant, dropped, "Dropped positions of unknown tables");
        }
        clean
    }

    fn find_table(&self, tenant: &TenantId, table_id: &str) -> ClientResult<Table> {
        self.read_for(tenant, |s| s.table(table_id).cloned())
            .ok_or_else(|| ClientError::not_found(format!("table {table_id}")))
    }

    fn find_order(&self, tenant: &TenantId, order_id: &str) -> ClientResult<Order> {
        self.read_for(tenant, |s| s.order(order_id).cloned())
            .ok_or_else(|| ClientError::not_found(format!("order {order_id}")))
    }

    // ========== Loading ==========

    /// Tables first, then menu and orders together, then the floor plan
    pub async fn load_all(&self) -> ClientResult<()> {
        self.load_tables().await?;
        tokio::try_join!(self.load_menu_items(), self.load_orders())?;
        self.load_floor_plan().await
    }

    pub async fn load_tables(&self) -> ClientResult<()> {
        let tenant = self.require_tenant()?;
        let tables = self.store.list_tables(&tenant).await?;
        self.commit(&tenant, |s| {
            prune_unknown_tables(&mut s.floor_plan, &tables);
            s.tables = tables;
        });
        Ok(())
    }

    pub async fn load_menu_items(&self) -> ClientResult<()> {
        let tenant = self.require_tenant()?;
        let items = self.store.list_menu_items(&tenant).await?;
        self.commit(&tenant, |s| s.menu_items = items);
        Ok(())
    }

    pub async fn load_orders(&self) -> ClientResult<()> {
        let tenant = self.require_tenant()?;
        let orders = self.store.list_orders(&tenant).await?;
        let orders = orders.into_iter().map(Order::normalized).collect();
        self.commit(&tenant, |s| s.orders = orders);
        Ok(())
    }

    /// Load the plan; a tenant without a usable one gets a default plan persisted.
    ///
    /// Outages and access errors are returned as-is so a flaky read never
    /// overwrites the stored layout.
    pub async fn load_floor_plan(&self) -> ClientResult<()> {
        let tenant = self.require_tenant()?;
        let plan = match self.store.get_floor_plan(&tenant).await {
            Ok(plan) => plan,
            Err(e @ (ClientError::RemoteUnavailable(_) | ClientError::NotAuthorized(_))) => {
                return Err(e);
            }
            Err(e) => {
                tracing::info!(tenant_id = %tenant, "No usable floor plan ({e}), creating default");
                let tables = self.read_for(&tenant, |s| s.tables.clone());
                self.store
                    .put_floor_plan(&tenant, &default_plan(&tables))
                    .await?
            }
        };
        let plan = self.clean_plan(&tenant, &plan);
        self.commit(&tenant, |s| s.floor_plan = plan);
        Ok(())
    }

    /// Reload one resource category
    pub async fn reload(&self, kind: ResourceKind) -> ClientResult<()> {
        match kind {
            ResourceKind::Tables => self.load_tables().await,
            ResourceKind::MenuItems => self.load_menu_items().await,
            ResourceKind::Orders => self.load_orders().await,
            ResourceKind::FloorPlan => self.load_floor_plan().await,
        }
    }

    // ========== Tables ==========

    async fn patch_table(
        &self,
        tenant: &TenantId,
        table_id: &str,
        patch: TableUpdate,
    ) -> ClientResult<Table> {
        let table = self.store.update_table(tenant, table_id, &patch).await?;
        self.commit(tenant, |s| s.replace_table(table.clone()));
        Ok(table)
    }

    /// Write a table status.
    ///
    /// `free` and `served` always clear the current order, whatever
    /// `order_id` says; `free` also resets the payment status to unpaid.
    pub async fn set_table_status(
        &self,
        table_id: &str,
        status: TableStatus,
        order_id: Option<&str>,
    ) -> ClientResult<Table> {
        let tenant = self.require_tenant()?;
        let table = self.find_table(&tenant, table_id)?;

        let current_order_id = if status.clears_current_order() {
            None
        } else {
            order_id.map(str::to_string).or(table.current_order_id)
        };
        let payment_status = if status == TableStatus::Free {
            PaymentStatus::Unpaid
        } else {
            table.payment_status
        };

        self.patch_table(
            &tenant,
            table_id,
            TableUpdate {
                status: Some(status),
                payment_status: Some(payment_status),
                current_order_id: Some(current_order_id),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn set_table_payment_timing(
        &self,
        table_id: &str,
        timing: PaymentTiming,
    ) -> ClientResult<Table> {
        let tenant = self.require_tenant()?;
        self.find_table(&tenant, table_id)?;
        self.patch_table(
            &tenant,
            table_id,
            TableUpdate {
                payment_timing: Some(timing),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn set_table_payment_status(
        &self,
        table_id: &str,
        status: PaymentStatus,
    ) -> ClientResult<Table> {
        let tenant = self.require_tenant()?;
        self.find_table(&tenant, table_id)?;
        self.patch_table(
            &tenant,
            table_id,
            TableUpdate {
                payment_status: Some(status),
                ..Default::default()
            },
        )
        .await
    }

    /// Create a table numbered one above the current maximum
    pub async fn add_table(&self) -> ClientResult<Table> {
        let tenant = self.require_tenant()?;
        let number = self.read_for(&tenant, |s| derive::next_table_number(&s.tables));
        let number = number.max(1);
        let table = self
            .store
            .create_table(
                &tenant,
                &TableCreate {
                    number,
                    ..Default::default()
                },
            )
            .await?;
        tracing::info!(tenant_id = %tenant, number, "Table added");
        self.commit(&tenant, |s| s.replace_table(table.clone()));
        Ok(table)
    }

    /// Delete a table and every floor-plan position pointing at it.
    ///
    /// The trimmed plan is written back so the store never keeps a position
    /// for the removed table.
    pub async fn delete_table(&self, table_id: &str) -> ClientResult<()> {
        let tenant = self.require_tenant()?;
        let result = self.store.delete_table(&tenant, table_id).await?;
        if !result.deleted {
            return Err(ClientError::not_found(format!("table {table_id}")));
        }
        let mut placed = false;
        self.commit(&tenant, |s| {
            s.tables.retain(|t| t.id != table_id);
            placed = s.floor_plan.remove_table(table_id);
        });
        if !placed {
            return Ok(());
        }

        let Some(plan) = self.read_for(&tenant, |s| Some(s.floor_plan.clone())) else {
            return Ok(());
        };
        let saved = self.store.put_floor_plan(&tenant, &plan).await?;
        let saved = self.clean_plan(&tenant, &saved);
        self.commit(&tenant, |s| s.floor_plan = saved);
        Ok(())
    }

    /// Renumber a table and move its orders along with it
    pub async fn update_table_number(&self, table_id: &str, number: i32) -> ClientResult<Table> {
        let tenant = self.require_tenant()?;
        if number < 1 {
            return Err(ClientError::validation(
                "table number must be a positive integer",
            ));
        }
        let table = self.find_table(&tenant, table_id)?;
        let taken = self.read_for(&tenant, |s| {
            s.tables.iter().any(|t| t.number == number && t.id != table_id)
        });
        if taken {
            return Err(ClientError::validation(format!(
                "table number {number} is already in use"
            )));
        }

        let previous = table.number;
        let updated = self
            .store
            .update_table(
                &tenant,
                table_id,
                &TableUpdate {
                    number: Some(number),
                    ..Default::default()
                },
            )
            .await?;
        self.commit(&tenant, |s| {
            s.replace_table(updated.clone());
            let moved = derive::rekey_orders(&mut s.orders, previous, updated.number);
            tracing::debug!(tenant_id = %tenant, previous, number, moved, "Orders rekeyed");
        });
        Ok(updated)
    }

    /// End-of-service reset: free, no order, unpaid, pay at the end.
    /// Does not check [`SyncEngine::can_release_table`]; callers must.
    pub async fn release_table(&self, table_id: &str) -> ClientResult<Table> {
        let tenant = self.require_tenant()?;
        self.find_table(&tenant, table_id)?;
        self.patch_table(
            &tenant,
            table_id,
            TableUpdate {
                status: Some(TableStatus::Free),
                payment_status: Some(PaymentStatus::Unpaid),
                payment_timing: Some(PaymentTiming::End),
                current_order_id: Some(None),
                ..Default::default()
            },
        )
        .await
    }

    /// True iff every non-cancelled order of the table is paid
    pub fn can_release_table(&self, table_number: i32) -> bool {
        self.read(|s| s.can_release_table(table_number))
    }

    /// Recompute the table's payment status from the ledger and store it.
    ///
    /// Always written, so a stale flag on the store side gets corrected even
    /// when the cached row already agrees.
    async fn refresh_table_payment_status(
        &self,
        tenant: &TenantId,
        table_number: i32,
    ) -> ClientResult<()> {
        let Some((table, derived)) = self.read_for(tenant, |s| {
            s.table_by_number(table_number)
                .map(|t| (t.clone(), derive::derive_payment_status(&s.orders, table_number)))
        }) else {
            return Ok(());
        };
        tracing::debug!(tenant_id = %tenant, table_number, ?derived, "Payment status derived");
        self.patch_table(
            tenant,
            &table.id,
            TableUpdate {
                payment_status: Some(derived),
                ..Default::default()
            },
        )
        .await?;
        Ok(())
    }

    // ========== Orders ==========

    /// Place an order; the store captures unit prices and updates the table
    pub async fn submit_order(
        &self,
        table_number: i32,
        items: Vec<OrderItemInput>,
    ) -> ClientResult<Order> {
        let tenant = self.require_tenant()?;
        if items.is_empty() {
            return Err(ClientError::validation("an order needs at least one item"));
        }
        if let Some(item) = items.iter().find(|i| i.quantity < 1) {
            return Err(ClientError::validation(format!(
                "quantity for {} must be at least 1",
                item.menu_item_id
            )));
        }

        let order = self
            .store
            .create_order(&tenant, &OrderCreate { table_number, items })
            .await?
            .normalized();
        tracing::info!(tenant_id = %tenant, table_number, order_id = %order.id, total = %order.total, "Order submitted");
        self.commit(&tenant, |s| s.replace_order(order.clone()));

        self.load_tables().await?;
        self.refresh_table_payment_status(&tenant, table_number)
            .await?;
        Ok(order)
    }

    /// Submit a draft and clear it once the store accepted it
    pub async fn submit_draft(&self, draft: &mut OrderDraft) -> ClientResult<Order> {
        let order = self
            .submit_order(draft.table_number(), draft.items())
            .await?;
        draft.clear();
        Ok(order)
    }

    /// Move an order to `status`; cancelled orders stay cancelled
    pub async fn set_order_status(&self, order_id: &str, status: OrderStatus) -> ClientResult<Order> {
        let tenant = self.require_tenant()?;
        let current = self.find_order(&tenant, order_id)?;
        if current.status.is_cancelled() && !status.is_cancelled() {
            return Err(ClientError::validation(format!(
                "order {order_id} is cancelled"
            )));
        }

        let order = self
            .store
            .update_order_status(&tenant, order_id, status)
            .await?
            .normalized();
        self.commit(&tenant, |s| s.replace_order(order.clone()));
        Ok(order)
    }

    pub async fn mark_order_ready(&self, order_id: &str) -> ClientResult<Order> {
        self.set_order_status(order_id, OrderStatus::Ready).await
    }

    pub async fn mark_order_pending(&self, order_id: &str) -> ClientResult<Order> {
        self.set_order_status(order_id, OrderStatus::Pending).await
    }

    pub async fn mark_order_served(&self, order_id: &str) -> ClientResult<Order> {
        self.set_order_status(order_id, OrderStatus::Delivered)
            .await
    }

    /// Cancel an order; the table's payment status is re-derived since the
    /// order no longer has to be paid.
    pub async fn cancel_order(&self, order_id: &str) -> ClientResult<Order> {
        let tenant = self.require_tenant()?;
        let order = self
            .set_order_status(order_id, OrderStatus::Cancelled)
            .await?;
        self.refresh_table_payment_status(&tenant, order.table_number)
            .await?;
        Ok(order)
    }

    pub async fn mark_order_paid(&self, order_id: &str) -> ClientResult<Order> {
        let tenant = self.require_tenant()?;
        self.find_order(&tenant, order_id)?;
        let order = self
            .store
            .set_order_paid(&tenant, order_id, true)
            .await?
            .normalized();
        self.commit(&tenant, |s| s.replace_order(order.clone()));
        self.refresh_table_payment_status(&tenant, order.table_number)
            .await?;
        Ok(order)
    }

    /// Pay every outstanding order of the table, one at a time; returns how many
    pub async fn mark_orders_paid_for_table(&self, table_number: i32) -> ClientResult<usize> {
        let tenant = self.require_tenant()?;
        let pending = self.read_for(&tenant, |s| derive::unpaid_order_ids(&s.orders, table_number));
        for order_id in &pending {
            self.mark_order_paid(order_id).await?;
        }
        Ok(pending.len())
    }

    // ========== Menu ==========

    pub async fn add_menu_item(&self, payload: MenuItemCreate) -> ClientResult<MenuItem> {
        let tenant = self.require_tenant()?;
        if payload.name.trim().is_empty() {
            return Err(ClientError::validation("menu item name must not be empty"));
        }
        if payload.price.is_sign_negative() && !payload.price.is_zero() {
            return Err(ClientError::validation("price must not be negative"));
        }
        let item = self.store.create_menu_item(&tenant, &payload).await?;
        self.commit(&tenant, |s| s.replace_menu_item(item.clone()));
        Ok(item)
    }

    /// Send every editable field of `item`
    pub async fn update_menu_item(&self, item: &MenuItem) -> ClientResult<MenuItem> {
        let tenant = self.require_tenant()?;
        if !self.read_for(&tenant, |s| s.menu_item(&item.id).is_some()) {
            return Err(ClientError::not_found(format!("menu item {}", item.id)));
        }
        if item.price.is_sign_negative() && !item.price.is_zero() {
            return Err(ClientError::validation("price must not be negative"));
        }
        let updated = self
            .store
            .update_menu_item(&tenant, &item.id, &MenuItemUpdate::from_item(item))
            .await?;
        self.commit(&tenant, |s| s.replace_menu_item(updated.clone()));
        Ok(updated)
    }

    pub async fn delete_menu_item(&self, menu_item_id: &str) -> ClientResult<()> {
        let tenant = self.require_tenant()?;
        let result = self.store.delete_menu_item(&tenant, menu_item_id).await?;
        if !result.deleted {
            return Err(ClientError::not_found(format!("menu item {menu_item_id}")));
        }
        self.commit(&tenant, |s| s.menu_items.retain(|m| m.id != menu_item_id));
        Ok(())
    }

    // ========== Floor plan ==========

    /// Replace the plan (cleaned) without the empty-plan guard
    pub async fn set_floor_plan(&self, plan: &FloorPlan) -> ClientResult<FloorPlan> {
        let tenant = self.require_tenant()?;
        let clean = self.clean_plan(&tenant, plan);
        let saved = self.store.put_floor_plan(&tenant, &clean).await?;
        let saved = self.clean_plan(&tenant, &saved);
        self.commit(&tenant, |s| s.floor_plan = saved.clone());
        Ok(saved)
    }

    /// Sanitize and persist; refuses a plan without positions while tables exist
    pub async fn save_floor_plan(&self, plan: &FloorPlan) -> ClientResult<FloorPlan> {
        let tenant = self.require_tenant()?;
        let clean = self.clean_plan(&tenant, plan);
        let has_tables = self.read_for(&tenant, |s| !s.tables.is_empty());
        if clean.positions.is_empty() && has_tables {
            return Err(ClientError::validation(
                "refusing to save a floor plan without any placed table",
            ));
        }
        self.set_floor_plan(&clean).await
    }

    /// Editable copy of the current plan
    pub fn edit_floor_plan(&self) -> FloorPlanDraft {
        self.read(|s| FloorPlanDraft::new(&s.floor_plan, &s.tables))
    }

    /// Save the draft; on success it becomes the draft's committed baseline
    pub async fn commit_floor_plan(&self, draft: &mut FloorPlanDraft) -> ClientResult<FloorPlan> {
        let saved = self.save_floor_plan(draft.plan()).await?;
        draft.mark_committed(&saved);
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{MemoryStore, TablesGateway};

    fn id(raw: &str) -> TenantId {
        TenantId::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_late_response_for_previous_tenant_is_dropped() {
        let store = Arc::new(MemoryStore::new());
        let context = TenantContext::in_memory();
        context.set_active(&id("a")).unwrap();
        store.seed_table(&id("a"), 1);
        store.seed_table(&id("b"), 1);
        store.seed_table(&id("b"), 2);

        let engine = SyncEngine::new(store.clone(), context.clone());
        engine.load_tables().await.unwrap();
        let stale = store.list_tables(&id("a")).await.unwrap();

        context.set_active(&id("b")).unwrap();
        engine.reset(Some(id("b")));
        engine.load_tables().await.unwrap();

        assert!(!engine.commit(&id("a"), |s| s.tables = stale));
        engine.read(|s| {
            assert_eq!(s.tenant_id, Some(id("b")));
            assert_eq!(s.tables.len(), 2);
        });
    }

    #[tokio::test]
    async fn test_commit_rebinds_snapshot_of_other_tenant() {
        let store = Arc::new(MemoryStore::new());
        let context = TenantContext::in_memory();
        context.set_active(&id("a")).unwrap();
        let engine = SyncEngine::new(store, context.clone());

        context.set_active(&id("b")).unwrap();
        assert!(engine.commit(&id("b"), |_| {}));
        assert_eq!(engine.snapshot(), Snapshot::empty(Some(id("b"))));
        assert_eq!(engine.read_for(&id("a"), |s| s.tables.len()), 0);
    }
}
