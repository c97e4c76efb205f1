//! Derived management views: read/write projections over the active tenant.
//!
//! Reads come from the manager's current snapshot. Writes send a partial
//! update to the backend and then ask the manager to refresh, so the context
//! is only ever replaced wholesale.

pub mod branding;
pub mod features;
pub mod handlers;
pub mod limits;
pub mod monitoring;
pub mod security;
pub mod settings;

use std::future::Future;
use std::sync::Arc;

use tracing::info;

use crate::tenant::context::TenantSnapshot;
use crate::tenant::manager::TenantContextManager;
use crate::tenant::TenantError;
use crate::tenant_client::{TenantBackend, TenantClientError};

use self::branding::BrandingView;
use self::features::FeaturesView;
use self::limits::LimitsView;
use self::monitoring::MonitoringView;
use self::security::SecurityView;
use self::settings::SettingsView;

pub struct ManagementViews {
    pub features: FeaturesView,
    pub branding: BrandingView,
    pub limits: LimitsView,
    pub security: SecurityView,
    pub settings: SettingsView,
    pub monitoring: MonitoringView,
}

impl ManagementViews {
    pub fn new(manager: Arc<TenantContextManager>, backend: Arc<dyn TenantBackend>) -> Self {
        Self {
            features: FeaturesView::new(manager.clone(), backend.clone()),
            branding: BrandingView::new(manager.clone(), backend.clone()),
            limits: LimitsView::new(manager.clone(), backend.clone()),
            security: SecurityView::new(manager.clone(), backend.clone()),
            settings: SettingsView::new(manager.clone(), backend.clone()),
            monitoring: MonitoringView::new(manager, backend),
        }
    }
}

/// Runs `update` against the active tenant, then refreshes the context.
pub(crate) async fn update_then_refresh<F, Fut>(
    manager: &TenantContextManager,
    what: &str,
    update: F,
) -> Result<TenantSnapshot, TenantError>
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = Result<(), TenantClientError>>,
{
    let slug = manager.active_slug().ok_or(TenantError::NoActiveTenant)?;
    update(slug.clone()).await.map_err(TenantError::Update)?;
    info!(tenant = %slug, "Tenant {what} updated; refreshing context");
    manager.refresh_tenant().await
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use crate::models::tenant::TenantConfiguration;
    use crate::tenant::manager::TenantContextManager;
    use crate::tenant::resolver::TenantOptions;
    use crate::tenant_client::fake::FakeBackend;

    /// A manager with `acme` active over a fake backend.
    pub async fn active_acme(config: TenantConfiguration) -> (Arc<FakeBackend>, Arc<TenantContextManager>) {
        let backend = Arc::new(FakeBackend::new().with_tenant(config));
        let manager = Arc::new(TenantContextManager::new(
            backend.clone(),
            TenantOptions::default(),
        ));
        manager.switch_tenant("acme").await.unwrap();
        (backend, manager)
    }

    pub fn acme() -> TenantConfiguration {
        TenantConfiguration::new("t-acme", "acme", "Acme")
    }
}
