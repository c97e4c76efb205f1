use std::collections::BTreeMap;
use std::sync::Arc;

use crate::tenant::context::TenantSnapshot;
use crate::tenant::manager::TenantContextManager;
use crate::tenant::TenantError;
use crate::tenant_client::TenantBackend;
use crate::transform::rules::FEATURE_CATALOG;
use crate::views::update_then_refresh;

pub struct FeaturesView {
    manager: Arc<TenantContextManager>,
    backend: Arc<dyn TenantBackend>,
}

impl FeaturesView {
    pub fn new(manager: Arc<TenantContextManager>, backend: Arc<dyn TenantBackend>) -> Self {
        Self { manager, backend }
    }

    pub fn is_feature_enabled(&self, name: &str) -> bool {
        self.manager
            .current_tenant()
            .is_some_and(|t| t.has_feature(name))
    }

    pub fn enabled_features(&self) -> Vec<String> {
        self.manager
            .current_tenant()
            .map(|t| t.features.into_iter().collect())
            .unwrap_or_default()
    }

    /// On/off state for every catalog feature plus any extra enabled ones.
    pub fn feature_flags(&self) -> BTreeMap<String, bool> {
        let mut flags: BTreeMap<String, bool> = FEATURE_CATALOG
            .iter()
            .map(|f| (f.to_string(), false))
            .collect();
        for feature in self.enabled_features() {
            flags.insert(feature, true);
        }
        flags
    }

    pub async fn update_features(
        &self,
        features: &BTreeMap<String, bool>,
    ) -> Result<TenantSnapshot, TenantError> {
        let backend = &self.backend;
        update_then_refresh(&self.manager, "features", |slug| async move {
            backend.update_features(&slug, features).await
        })
        .await
    }

    pub async fn set_feature(
        &self,
        name: &str,
        enabled: bool,
    ) -> Result<TenantSnapshot, TenantError> {
        let update = BTreeMap::from([(name.to_string(), enabled)]);
        self.update_features(&update).await
    }
}
