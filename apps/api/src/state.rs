use std::sync::Arc;

use crate::config::Config;
use crate::tenant::manager::TenantContextManager;
use crate::tenant_client::TenantBackend;
use crate::transform::engine::TransformationEngine;
use crate::views::ManagementViews;

/// Shared application state injected into all route handlers via Axum extractors.
/// This is the composition root: one manager and one engine per process.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<TenantContextManager>,
    pub engine: Arc<TransformationEngine>,
    pub views: Arc<ManagementViews>,
    pub backend: Arc<dyn TenantBackend>,
}

impl AppState {
    pub fn new(backend: Arc<dyn TenantBackend>, config: &Config) -> Self {
        let manager = Arc::new(TenantContextManager::new(
            backend.clone(),
            config.tenant_options(),
        ));
        let views = Arc::new(ManagementViews::new(manager.clone(), backend.clone()));

        Self {
            manager,
            engine: Arc::new(TransformationEngine::new()),
            views,
            backend,
        }
    }
}
