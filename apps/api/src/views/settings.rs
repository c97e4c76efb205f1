use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::tenant::context::TenantSnapshot;
use crate::tenant::manager::TenantContextManager;
use crate::tenant::TenantError;
use crate::tenant_client::TenantBackend;
use crate::views::update_then_refresh;

pub struct SettingsView {
    manager: Arc<TenantContextManager>,
    backend: Arc<dyn TenantBackend>,
}

impl SettingsView {
    pub fn new(manager: Arc<TenantContextManager>, backend: Arc<dyn TenantBackend>) -> Self {
        Self { manager, backend }
    }

    pub fn settings(&self) -> BTreeMap<String, Value> {
        self.manager
            .current_tenant()
            .map(|t| t.settings)
            .unwrap_or_default()
    }

    pub fn setting(&self, key: &str) -> Option<Value> {
        self.settings().remove(key)
    }

    pub async fn update_settings(
        &self,
        settings: &BTreeMap<String, Value>,
    ) -> Result<TenantSnapshot, TenantError> {
        self.update_config(&json!({ "settings": settings })).await
    }

    /// Arbitrary partial configuration update.
    pub async fn update_config(&self, updates: &Value) -> Result<TenantSnapshot, TenantError> {
        let backend = &self.backend;
        update_then_refresh(&self.manager, "configuration", |slug| async move {
            backend.update_config(&slug, updates).await
        })
        .await
    }
}
