//! Periodic background work: tenant auto-refresh and health checks.
//!
//! Each task owns its own interval and ignores manual refreshes, so two
//! refreshes may overlap; context replacement is last-write-wins.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::tenant::manager::TenantContextManager;
use crate::views::monitoring::MonitoringView;
use crate::views::ManagementViews;

/// Refreshes the active tenant every `every`. Idle while no tenant is active.
pub fn spawn_auto_refresh(manager: Arc<TenantContextManager>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await; // first tick completes immediately

        loop {
            ticker.tick().await;
            if manager.active_slug().is_none() {
                continue;
            }
            debug!("Periodic tenant refresh");
            if let Err(e) = manager.refresh_tenant().await {
                warn!(error = %e, "Periodic tenant refresh failed");
            }
        }
    })
}

/// Polls tenant health every `every`; the latest report stays on the monitoring view.
pub fn spawn_health_monitor(views: Arc<ManagementViews>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            check_health(&views.monitoring).await;
        }
    })
}

async fn check_health(monitoring: &MonitoringView) {
    match monitoring.fetch_health().await {
        Ok(snapshot) => debug!(tenant = %snapshot.tenant, "Tenant health checked"),
        // Nothing to check without a tenant
        Err(crate::tenant::TenantError::NoActiveTenant) => {}
        Err(e) => warn!(error = %e, "Tenant health check failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tenant::TenantConfiguration;
    use crate::tenant::resolver::TenantOptions;
    use crate::tenant_client::fake::FakeBackend;

    fn setup() -> (Arc<FakeBackend>, Arc<TenantContextManager>) {
        let backend = Arc::new(
            FakeBackend::new().with_tenant(TenantConfiguration::new("t-1", "acme", "Acme")),
        );
        let manager = Arc::new(TenantContextManager::new(
            backend.clone(),
            TenantOptions::default(),
        ));
        (backend, manager)
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_refresh_runs_on_interval() {
        let (backend, manager) = setup();
        manager.switch_tenant("acme").await.unwrap();
        let handle = spawn_auto_refresh(manager.clone(), Duration::from_secs(300));

        tokio::time::sleep(Duration::from_secs(299)).await;
        assert_eq!(backend.call_count("fetch_config:acme"), 1);

        tokio::time::sleep(Duration::from_secs(302)).await;
        assert_eq!(backend.call_count("fetch_config:acme"), 3);
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_refresh_idles_without_tenant() {
        let (backend, manager) = setup();
        let handle = spawn_auto_refresh(manager, Duration::from_secs(300));
        tokio::time::sleep(Duration::from_secs(1000)).await;
        assert!(backend.calls().is_empty());
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_failure_is_left_on_context() {
        let (backend, manager) = setup();
        manager.switch_tenant("acme").await.unwrap();
        let handle = spawn_auto_refresh(manager.clone(), Duration::from_secs(300));

        backend.set_failing(true);
        tokio::time::sleep(Duration::from_secs(301)).await;
        let snapshot = manager.snapshot();
        assert!(snapshot.context.tenant.is_none());
        assert!(snapshot.error.is_some());
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_health_monitor_records_reports() {
        let (backend, manager) = setup();
        manager.switch_tenant("acme").await.unwrap();
        let views = Arc::new(ManagementViews::new(manager, backend.clone()));
        let handle = spawn_health_monitor(views.clone(), Duration::from_secs(300));

        tokio::time::sleep(Duration::from_secs(301)).await;
        assert_eq!(backend.call_count("fetch_health:acme"), 1);
        assert!(views.monitoring.last_health().is_some());
        handle.abort();
    }
}
