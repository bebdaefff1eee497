//! Tenant context
//!
//! Process-scoped record of the active restaurant plus the owner-area flag.
//! Loaded from a small JSON file at startup and written through on every
//! change; the active tenant is published on a watch channel.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use shared::TenantId;
use tokio::sync::watch;

use crate::ClientResult;

/// Persisted key/value state of one client installation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalState {
    #[serde(default)]
    pub active_restaurant_id: Option<String>,
    #[serde(default)]
    pub active_restaurant_name: Option<String>,
    #[serde(default)]
    pub owner_authed: bool,
    /// Replaces the configured API base URL when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl LocalState {
    /// Load from file; a missing file yields the default state
    pub fn load(path: &Path) -> ClientResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let state: Self = serde_json::from_str(&content)?;
        Ok(Self {
            active_restaurant_id: non_blank(state.active_restaurant_id),
            active_restaurant_name: non_blank(state.active_restaurant_name),
            owner_authed: state.owner_authed,
            api_base_url: non_blank(state.api_base_url),
        })
    }

    /// Save to file (pretty-printed)
    pub fn save(&self, path: &Path) -> ClientResult<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.active_restaurant_id.clone().and_then(TenantId::parse)
    }
}

struct Inner {
    path: Option<PathBuf>,
    state: Mutex<LocalState>,
    active: watch::Sender<Option<TenantId>>,
}

/// Shared handle to the active tenant; clones observe the same state
#[derive(Clone)]
pub struct TenantContext {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for TenantContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantContext")
            .field("path", &self.inner.path)
            .field("active", &self.active_id())
            .finish()
    }
}

impl TenantContext {
    fn with_state(path: Option<PathBuf>, state: LocalState) -> Self {
        let (active, _) = watch::channel(state.tenant_id());
        Self {
            inner: Arc::new(Inner {
                path,
                state: Mutex::new(state),
                active,
            }),
        }
    }

    /// Restore from the state file at `path`
    pub fn load(path: impl Into<PathBuf>) -> ClientResult<Self> {
        let path = path.into();
        let state = LocalState::load(&path)?;
        if let Some(id) = &state.active_restaurant_id {
            tracing::info!(tenant_id = %id, path = %path.display(), "Restored active restaurant");
        }
        Ok(Self::with_state(Some(path), state))
    }

    /// Context without persistence
    pub fn in_memory() -> Self {
        Self::with_state(None, LocalState::default())
    }

    fn state(&self) -> MutexGuard<'_, LocalState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `f` to a copy of the state, persist it, then swap it in and
    /// publish the tenant if it changed. A failed save leaves everything as it was.
    fn update(&self, f: impl FnOnce(&mut LocalState)) -> ClientResult<()> {
        let tenant = {
            let mut state = self.state();
            let mut next = state.clone();
            f(&mut next);
            if let Some(path) = &self.inner.path {
                next.save(path)?;
            }
            let tenant = next.tenant_id();
            *state = next;
            tenant
        };
        self.inner.active.send_if_modified(|current| {
            if *current == tenant {
                false
            } else {
                *current = tenant;
                true
            }
        });
        Ok(())
    }

    pub fn active_id(&self) -> Option<TenantId> {
        self.inner.active.borrow().clone()
    }

    pub fn active_name(&self) -> Option<String> {
        self.state().active_restaurant_name.clone()
    }

    /// Active tenant, or `MissingTenant`
    pub fn require(&self) -> ClientResult<TenantId> {
        self.active_id().ok_or(crate::ClientError::MissingTenant)
    }

    /// Receiver that wakes on every tenant change
    pub fn subscribe(&self) -> watch::Receiver<Option<TenantId>> {
        self.inner.active.subscribe()
    }

    /// Switch tenant by id, keeping the stored display name
    pub fn set_active(&self, id: &TenantId) -> ClientResult<()> {
        tracing::info!(tenant_id = %id, "Switching active restaurant");
        self.update(|state| state.active_restaurant_id = Some(id.to_string()))
    }

    /// Switch tenant and record its display name
    pub fn set_active_restaurant(&self, id: &TenantId, name: &str) -> ClientResult<()> {
        tracing::info!(tenant_id = %id, name, "Switching active restaurant");
        self.update(|state| {
            state.active_restaurant_id = Some(id.to_string());
            state.active_restaurant_name = non_blank(Some(name.to_string()));
        })
    }

    /// Forget the active tenant
    pub fn clear(&self) -> ClientResult<()> {
        tracing::info!("Clearing active restaurant");
        self.update(|state| {
            state.active_restaurant_id = None;
            state.active_restaurant_name = None;
        })
    }

    // ========== Owner area ==========

    pub fn is_owner_authenticated(&self) -> bool {
        self.state().owner_authed
    }

    pub fn set_owner_authenticated(&self, authed: bool) -> ClientResult<()> {
        self.update(|state| state.owner_authed = authed)
    }

    pub fn logout_owner(&self) -> ClientResult<()> {
        self.set_owner_authenticated(false)
    }

    /// Copy of the persisted state
    pub fn local_state(&self) -> LocalState {
        self.state().clone()
    }

    pub fn api_base_url_override(&self) -> Option<String> {
        self.state().api_base_url.clone()
    }

    pub fn set_api_base_url_override(&self, url: Option<String>) -> ClientResult<()> {
        self.update(|state| state.api_base_url = non_blank(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> TenantId {
        TenantId::parse(raw).unwrap()
    }

    #[test]
    fn test_state_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mesa").join("state.json");

        let ctx = TenantContext::load(&path).unwrap();
        assert!(ctx.active_id().is_none());
        ctx.set_active_restaurant(&id("r-42"), "Casa Lupe").unwrap();
        ctx.set_owner_authenticated(true).unwrap();

        let restored = TenantContext::load(&path).unwrap();
        assert_eq!(restored.active_id(), Some(id("r-42")));
        assert_eq!(restored.active_name().as_deref(), Some("Casa Lupe"));
        assert!(restored.is_owner_authenticated());

        restored.logout_owner().unwrap();
        restored.clear().unwrap();
        let cleared = LocalState::load(&path).unwrap();
        assert_eq!(cleared, LocalState::default());
    }

    #[test]
    fn test_blank_ids_are_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"activeRestaurantId":"  ","ownerAuthed":true}"#).unwrap();

        let ctx = TenantContext::load(&path).unwrap();
        assert!(ctx.active_id().is_none());
        assert!(matches!(ctx.require(), Err(crate::ClientError::MissingTenant)));
        assert!(ctx.is_owner_authenticated());
    }

    #[test]
    fn test_watch_fires_only_on_tenant_change() {
        let ctx = TenantContext::in_memory();
        let mut rx = ctx.subscribe();

        ctx.set_active(&id("a")).unwrap();
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        ctx.set_active_restaurant(&id("a"), "Same place").unwrap();
        ctx.set_owner_authenticated(true).unwrap();
        assert!(!rx.has_changed().unwrap());

        ctx.clear().unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_none());
    }

    #[test]
    fn test_failed_save_keeps_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let ctx = TenantContext::load(&path).unwrap();
        ctx.set_active_restaurant(&id("a"), "A").unwrap();
        let mut rx = ctx.subscribe();
        rx.borrow_and_update();

        // A directory in place of the file makes every save fail
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(ctx.set_active_restaurant(&id("b"), "B").is_err());
        assert_eq!(ctx.active_id(), Some(id("a")));
        assert_eq!(ctx.active_name().as_deref(), Some("A"));
        assert!(!rx.has_changed().unwrap());

        std::fs::remove_dir(&path).unwrap();
        ctx.set_owner_authenticated(true).unwrap();
        assert_eq!(ctx.active_id(), Some(id("a")));
        assert_eq!(ctx.active_name().as_deref(), Some("A"));
        assert!(!rx.has_changed().unwrap());
        assert_eq!(LocalState::load(&path).unwrap().tenant_id(), Some(id("a")));
    }

    #[test]
    fn test_api_override_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let ctx = TenantContext::load(&path).unwrap();
        ctx.set_api_base_url_override(Some("https://pos.example.com/api".into()))
            .unwrap();

        let restored = TenantContext::load(&path).unwrap();
        assert_eq!(
            restored.local_state().api_base_url.as_deref(),
            Some("https://pos.example.com/api")
        );
        restored.set_api_base_url_override(Some("  ".into())).unwrap();
        assert!(restored.api_base_url_override().is_none());
    }
}
