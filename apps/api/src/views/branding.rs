use std::sync::Arc;

use crate::models::tenant::Branding;
use crate::tenant::context::TenantSnapshot;
use crate::tenant::manager::TenantContextManager;
use crate::tenant::TenantError;
use crate::tenant_client::TenantBackend;
use crate::views::update_then_refresh;

pub struct BrandingView {
    manager: Arc<TenantContextManager>,
    backend: Arc<dyn TenantBackend>,
}

impl BrandingView {
    pub fn new(manager: Arc<TenantContextManager>, backend: Arc<dyn TenantBackend>) -> Self {
        Self { manager, backend }
    }

    /// Branding of the active tenant; defaults when the tenant has none.
    pub fn branding(&self) -> Option<Branding> {
        self.manager
            .current_tenant()
            .map(|t| t.branding.unwrap_or_default())
    }

    pub async fn update_branding(&self, branding: &Branding) -> Result<TenantSnapshot, TenantError> {
        let backend = &self.backend;
        update_then_refresh(&self.manager, "branding", |slug| async move {
            backend.update_branding(&slug, branding).await
        })
        .await
    }
}
