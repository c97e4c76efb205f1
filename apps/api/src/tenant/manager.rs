//! Tenant Context Manager: sole owner and writer of the active tenant context.
//!
//! Every state change goes through [`transition`]; the new snapshot is then
//! pushed synchronously to all subscribers. Concurrent switches are not
//! serialized: whichever load completes last wins.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::tenant::TenantConfiguration;
use crate::models::user::UserIdentity;
use crate::tenant::context::{transition, ManagerState, TenantContext, TenantSnapshot, Transition};
use crate::tenant::resolver::{normalize_identifier, resolve_identifier, DetectionHints, TenantOptions};
use crate::tenant::TenantError;
use crate::tenant_client::TenantBackend;

pub type Listener = Arc<dyn Fn(&TenantSnapshot) + Send + Sync>;

type ListenerMap = RwLock<HashMap<Uuid, Listener>>;

/// Handle returned by [`TenantContextManager::subscribe`]. The listener stays
/// registered until this handle is dropped.
#[must_use = "dropping a Subscription unregisters its listener"]
pub struct Subscription {
    id: Uuid,
    listeners: Weak<ListenerMap>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.write().remove(&self.id);
        }
    }
}

pub struct TenantContextManager {
    backend: Arc<dyn TenantBackend>,
    options: TenantOptions,
    state: RwLock<ManagerState>,
    listeners: Arc<ListenerMap>,
}

impl TenantContextManager {
    pub fn new(backend: Arc<dyn TenantBackend>, options: TenantOptions) -> Self {
        Self {
            backend,
            options,
            state: RwLock::new(ManagerState::Uninitialized),
            listeners: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn snapshot(&self) -> TenantSnapshot {
        self.state.read().snapshot()
    }

    pub fn current_tenant(&self) -> Option<TenantConfiguration> {
        self.state.read().active_tenant().cloned()
    }

    pub fn active_slug(&self) -> Option<String> {
        self.state.read().active_tenant().map(|t| t.slug.clone())
    }

    pub fn is_initialized(&self) -> bool {
        self.state.read().is_initialized()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&TenantSnapshot) + Send + Sync + 'static,
    {
        let id = Uuid::new_v4();
        self.listeners.write().insert(id, Arc::new(listener));
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    #[cfg(test)]
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Reuses an initialized context; otherwise detects a tenant from `hints`,
    /// falls back to the configured default, or settles with no tenant.
    pub async fn initialize(&self, hints: &DetectionHints) -> Result<TenantSnapshot, TenantError> {
        if self.is_initialized() {
            return Ok(self.snapshot());
        }

        match resolve_identifier(hints, &self.options) {
            Some(identifier) => {
                info!(tenant = %identifier, "Initializing tenant context");
                self.switch_tenant(&identifier).await
            }
            None => {
                info!("No tenant identifier resolved; context settles without a tenant");
                Ok(self.apply(Transition::Settled))
            }
        }
    }

    /// Switches tenants keeping the current acting user.
    pub async fn switch_tenant(&self, identifier: &str) -> Result<TenantSnapshot, TenantError> {
        let user = self.state.read().user().cloned();
        self.switch_tenant_as(identifier, user).await
    }

    pub async fn switch_tenant_as(
        &self,
        identifier: &str,
        user: Option<UserIdentity>,
    ) -> Result<TenantSnapshot, TenantError> {
        match normalize_identifier(identifier) {
            Some(slug) => self.load(slug, user).await,
            None => {
                let err = TenantError::InvalidIdentifier(identifier.to_string());
                self.apply(Transition::Begin {
                    target: identifier.to_string(),
                });
                self.apply(Transition::Failed {
                    target: identifier.to_string(),
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    pub async fn refresh_tenant(&self) -> Result<TenantSnapshot, TenantError> {
        let (slug, user) = {
            let state = self.state.read();
            (
                state.active_tenant().map(|t| t.slug.clone()),
                state.user().cloned(),
            )
        };
        let slug = slug.ok_or(TenantError::NoActiveTenant)?;
        debug!(tenant = %slug, "Refreshing tenant context");
        self.load(slug, user).await
    }

    pub fn clear_context(&self) -> TenantSnapshot {
        info!("Tenant context cleared");
        self.apply(Transition::Cleared)
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.state.read().context().has_permission(permission)
    }

    pub fn has_any_permission<S: AsRef<str>>(&self, permissions: &[S]) -> bool {
        self.state.read().context().has_any_permission(permissions)
    }

    pub fn has_all_permissions<S: AsRef<str>>(&self, permissions: &[S]) -> bool {
        self.state.read().context().has_all_permissions(permissions)
    }

    pub fn can_access(&self, resource: &str, action: &str) -> bool {
        self.state.read().context().can_access(resource, action)
    }

    async fn load(
        &self,
        slug: String,
        user: Option<UserIdentity>,
    ) -> Result<TenantSnapshot, TenantError> {
        self.apply(Transition::Begin {
            target: slug.clone(),
        });

        let result = self
            .backend
            .fetch_config(&slug)
            .await
            .map_err(|source| TenantError::Fetch {
                slug: slug.clone(),
                source,
            })
            .and_then(|config| validate_configuration(&slug, config));

        match result {
            Ok(config) => {
                info!(tenant = %slug, "Tenant context loaded");
                Ok(self.apply(Transition::Loaded(TenantContext::resolve(config, user))))
            }
            Err(e) => {
                warn!(tenant = %slug, error = %e, "Tenant context load failed");
                self.apply(Transition::Failed {
                    target: slug,
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    fn apply(&self, event: Transition) -> TenantSnapshot {
        let (snapshot, changed) = {
            let mut state = self.state.write();
            let next = transition(&state, event);
            let changed = next != *state;
            *state = next;
            (state.snapshot(), changed)
        };

        if changed {
            self.notify(&snapshot);
        }
        snapshot
    }

    fn notify(&self, snapshot: &TenantSnapshot) {
        // Listeners may subscribe or unsubscribe from inside the callback
        let listeners: Vec<Listener> = self.listeners.read().values().cloned().collect();
        for listener in listeners {
            listener(snapshot);
        }
    }
}

fn validate_configuration(
    requested: &str,
    config: TenantConfiguration,
) -> Result<TenantConfiguration, TenantError> {
    if config.slug.eq_ignore_ascii_case(requested) || config.id == requested {
        Ok(config)
    } else {
        Err(TenantError::ConfigurationMismatch {
            requested: requested.to_string(),
            received: config.slug,
        })
    }
}
