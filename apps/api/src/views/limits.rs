//! Usage & limit arithmetic over the active tenant.
//!
//! Limits come with the tenant configuration; usage is fetched separately and
//! may lag by one refresh cycle. Staleness only shows up as slightly old
//! `remaining` values, never as an error.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::warn;

use crate::models::limits::{
    is_limit_exceeded, remaining_capacity, remaining_limit, usage_percentage, Quantity,
};
use crate::models::tenant::TenantUsage;
use crate::tenant::manager::TenantContextManager;
use crate::tenant::TenantError;
use crate::tenant_client::TenantBackend;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LimitsSummary {
    pub limits: BTreeMap<String, Quantity>,
    pub usage: Option<TenantUsage>,
    pub remaining: BTreeMap<String, Quantity>,
    pub exceeded: Vec<String>,
}

pub struct LimitsView {
    manager: Arc<TenantContextManager>,
    backend: Arc<dyn TenantBackend>,
    /// Last usage snapshot, tagged with the tenant it was fetched for.
    usage: RwLock<Option<(String, TenantUsage)>>,
}

impl LimitsView {
    pub fn new(manager: Arc<TenantContextManager>, backend: Arc<dyn TenantBackend>) -> Self {
        Self {
            manager,
            backend,
            usage: RwLock::new(None),
        }
    }

    pub async fn refresh_usage(&self) -> Result<TenantUsage, TenantError> {
        let slug = self.manager.active_slug().ok_or(TenantError::NoActiveTenant)?;
        let usage = self
            .backend
            .fetch_usage(&slug)
            .await
            .map_err(|source| TenantError::Fetch {
                slug: slug.clone(),
                source,
            })?;
        *self.usage.write() = Some((slug, usage.clone()));
        Ok(usage)
    }

    /// Like [`usage`](Self::usage), but fetches a snapshot first when none exists
    /// for the active tenant. A failed fetch is logged and the fallback is used.
    pub async fn current_usage(&self) -> Option<TenantUsage> {
        let slug = self.manager.active_slug()?;
        let fetched = matches!(&*self.usage.read(), Some((s, _)) if *s == slug);
        if !fetched {
            if let Err(e) = self.refresh_usage().await {
                warn!(tenant = %slug, error = %e, "Usage fetch failed; limits use configuration usage");
            }
        }
        self.usage()
    }

    /// Usage for the active tenant: the fetched snapshot, else whatever the configuration carries.
    pub fn usage(&self) -> Option<TenantUsage> {
        let tenant = self.manager.current_tenant()?;
        match &*self.usage.read() {
            Some((slug, usage)) if *slug == tenant.slug => Some(usage.clone()),
            _ => tenant.usage,
        }
    }

    pub fn limits(&self) -> BTreeMap<String, Quantity> {
        self.manager
            .current_tenant()
            .map(|t| t.limits)
            .unwrap_or_default()
    }

    /// `None` when either the limit or the usage counter is unknown.
    pub fn remaining_limit(&self, name: &str) -> Option<Quantity> {
        remaining_limit(&self.limits(), self.usage().as_ref(), name)
    }

    pub fn is_limit_exceeded(&self, name: &str) -> bool {
        is_limit_exceeded(&self.limits(), self.usage().as_ref(), name)
    }

    pub fn usage_percentage(&self, name: &str) -> Option<f64> {
        usage_percentage(&self.limits(), self.usage().as_ref(), name)
    }

    pub fn summary(&self) -> LimitsSummary {
        let limits = self.limits();
        let usage = self.usage();
        let remaining = remaining_capacity(&limits, usage.as_ref());
        let exceeded = limits
            .keys()
            .filter(|name| is_limit_exceeded(&limits, usage.as_ref(), name))
            .cloned()
            .collect();
        LimitsSummary {
            limits,
            usage,
            remaining,
            exceeded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::testing::{acme, active_acme};

    fn q(value: f64) -> Quantity {
        Quantity::new(value).unwrap()
    }

    fn usage(users: f64) -> TenantUsage {
        TenantUsage {
            last_activity: None,
            counters: BTreeMap::from([("users".to_string(), q(users))]),
        }
    }

    async fn view_with(limits: &[(&str, f64)], used: f64) -> LimitsView {
        let mut config = acme();
        config.limits = limits.iter().map(|(k, v)| (k.to_string(), q(*v))).collect();
        let (backend, manager) = active_acme(config).await;
        backend.put_usage("acme", usage(used));
        let view = LimitsView::new(manager, backend);
        view.refresh_usage().await.unwrap();
        view
    }

    #[tokio::test]
    async fn test_limit_reached() {
        let view = view_with(&[("users", 10.0)], 10.0).await;
        assert_eq!(view.remaining_limit("users"), Some(q(0.0)));
        assert!(view.is_limit_exceeded("users"));
        assert_eq!(view.summary().exceeded, vec!["users".to_string()]);
    }

    #[tokio::test]
    async fn test_capacity_left() {
        let view = view_with(&[("users", 10.0)], 9.0).await;
        assert_eq!(view.remaining_limit("users"), Some(q(1.0)));
        assert!(!view.is_limit_exceeded("users"));
        assert_eq!(view.usage_percentage("users"), Some(90.0));
    }

    #[tokio::test]
    async fn test_no_limits_is_unknown() {
        let view = view_with(&[], 3.0).await;
        assert_eq!(view.remaining_limit("users"), None);
        assert!(!view.is_limit_exceeded("users"));
        assert!(view.summary().remaining.is_empty());
    }

    #[tokio::test]
    async fn test_usage_of_previous_tenant_is_not_reused() {
        let view = view_with(&[("users", 10.0)], 4.0).await;
        assert_eq!(view.remaining_limit("users"), Some(q(6.0)));
        view.manager.clear_context();
        assert!(view.usage().is_none());
        assert_eq!(view.remaining_limit("users"), None);
    }

    #[tokio::test]
    async fn test_current_usage_fetches_once_per_tenant() {
        let mut config = acme();
        config.limits.insert("users".to_string(), q(5.0));
        let (backend, manager) = active_acme(config).await;
        backend.put_usage("acme", usage(5.0));
        let view = LimitsView::new(manager, backend.clone());

        let current = view.current_usage().await.unwrap();
        assert_eq!(current.counter("users"), Some(q(5.0)));
        assert!(view.is_limit_exceeded("users"));

        view.current_usage().await;
        assert_eq!(backend.call_count("fetch_usage:acme"), 1);
    }

    #[tokio::test]
    async fn test_current_usage_survives_fetch_failure() {
        let (backend, manager) = active_acme(acme()).await;
        let view = LimitsView::new(manager, backend.clone());
        backend.set_failing(true);
        assert!(view.current_usage().await.is_none());
    }

    #[tokio::test]
    async fn test_refresh_usage_requires_tenant() {
        let backend = Arc::new(crate::tenant_client::fake::FakeBackend::new());
        let manager = Arc::new(TenantContextManager::new(
            backend.clone(),
            Default::default(),
        ));
        let view = LimitsView::new(manager, backend);
        assert!(matches!(
            view.refresh_usage().await,
            Err(TenantError::NoActiveTenant)
        ));
    }
}
