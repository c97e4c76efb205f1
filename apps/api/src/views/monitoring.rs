use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;

use crate::tenant::manager::TenantContextManager;
use crate::tenant::TenantError;
use crate::tenant_client::TenantBackend;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub tenant: String,
    pub checked_at: DateTime<Utc>,
    pub report: Value,
}

/// Analytics and health snapshots for the active tenant.
pub struct MonitoringView {
    manager: Arc<TenantContextManager>,
    backend: Arc<dyn TenantBackend>,
    last_health: RwLock<Option<HealthSnapshot>>,
}

impl MonitoringView {
    pub fn new(manager: Arc<TenantContextManager>, backend: Arc<dyn TenantBackend>) -> Self {
        Self {
            manager,
            backend,
            last_health: RwLock::new(None),
        }
    }

    pub async fn fetch_analytics(&self) -> Result<Value, TenantError> {
        let slug = self.manager.active_slug().ok_or(TenantError::NoActiveTenant)?;
        self.backend
            .fetch_analytics(&slug)
            .await
            .map_err(|source| TenantError::Fetch { slug, source })
    }

    pub async fn fetch_health(&self) -> Result<HealthSnapshot, TenantError> {
        let slug = self.manager.active_slug().ok_or(TenantError::NoActiveTenant)?;
        let report = self
            .backend
            .fetch_health(&slug)
            .await
            .map_err(|source| TenantError::Fetch {
                slug: slug.clone(),
                source,
            })?;
        let snapshot = HealthSnapshot {
            tenant: slug,
            checked_at: Utc::now(),
            report,
        };
        *self.last_health.write() = Some(snapshot.clone());
        Ok(snapshot)
    }

    pub fn last_health(&self) -> Option<HealthSnapshot> {
        self.last_health.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::testing::{acme, active_acme};

    #[tokio::test]
    async fn test_health_is_retained() {
        let (backend, manager) = active_acme(acme()).await;
        let view = MonitoringView::new(manager, backend);
        assert!(view.last_health().is_none());

        let snapshot = view.fetch_health().await.unwrap();
        assert_eq!(snapshot.tenant, "acme");
        assert_eq!(snapshot.report["status"], "healthy");
        assert_eq!(view.last_health(), Some(snapshot));
    }

    #[tokio::test]
    async fn test_analytics_failure_is_reported() {
        let (backend, manager) = active_acme(acme()).await;
        let view = MonitoringView::new(manager, backend.clone());
        backend.set_failing(true);
        assert!(matches!(
            view.fetch_analytics().await,
            Err(TenantError::Fetch { .. })
        ));
    }
}
