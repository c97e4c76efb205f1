//! In-memory tenant backend for tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use super::{TenantBackend, TenantClientError};
use crate::models::tenant::{Branding, SecurityPolicy, TenantConfiguration, TenantUsage};

#[derive(Default)]
pub struct FakeBackend {
    configs: Mutex<HashMap<String, TenantConfiguration>>,
    usage: Mutex<HashMap<String, TenantUsage>>,
    calls: Mutex<Vec<String>>,
    failing: AtomicBool,
    remote_transform: AtomicBool,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tenant(self, config: TenantConfiguration) -> Self {
        self.put_tenant(config);
        self
    }

    pub fn with_usage(self, slug: &str, usage: TenantUsage) -> Self {
        self.put_usage(slug, usage);
        self
    }

    pub fn put_usage(&self, slug: &str, usage: TenantUsage) {
        self.usage.lock().insert(slug.to_string(), usage);
    }

    pub fn put_tenant(&self, config: TenantConfiguration) {
        self.configs.lock().insert(config.slug.clone(), config);
    }

    /// Stores `config` under a key that may differ from its slug.
    pub fn put_tenant_as(&self, key: &str, config: TenantConfiguration) {
        self.configs.lock().insert(key.to_string(), config);
    }

    pub fn tenant(&self, slug: &str) -> Option<TenantConfiguration> {
        self.configs.lock().get(slug).cloned()
    }

    /// Makes every subsequent call fail with a 503.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn enable_remote_transform(&self) {
        self.remote_transform.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, call: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.as_str() == call).count()
    }

    fn record(&self, call: String) -> Result<(), TenantClientError> {
        self.calls.lock().push(call);
        if self.failing.load(Ordering::SeqCst) {
            return Err(TenantClientError::Api {
                status: 503,
                message: "tenant service unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn modify<F>(&self, slug: &str, f: F) -> Result<(), TenantClientError>
    where
        F: FnOnce(&mut TenantConfiguration),
    {
        let mut configs = self.configs.lock();
        let config = configs
            .get_mut(slug)
            .ok_or_else(|| TenantClientError::Rejected(format!("unknown tenant '{slug}'")))?;
        f(config);
        Ok(())
    }
}

#[async_trait]
impl TenantBackend for FakeBackend {
    async fn fetch_config(&self, slug: &str) -> Result<TenantConfiguration, TenantClientError> {
        self.record(format!("fetch_config:{slug}"))?;
        self.tenant(slug).ok_or(TenantClientError::Api {
            status: 404,
            message: format!("Tenant '{slug}' not found"),
        })
    }

    async fn update_config(&self, slug: &str, updates: &Value) -> Result<(), TenantClientError> {
        self.record(format!("update_config:{slug}"))?;
        let settings = updates
            .get("settings")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let name = updates.get("name").and_then(Value::as_str).map(str::to_string);
        self.modify(slug, |config| {
            config.settings.extend(settings);
            if let Some(name) = name {
                config.name = name;
            }
        })
    }

    async fn update_features(
        &self,
        slug: &str,
        features: &BTreeMap<String, bool>,
    ) -> Result<(), TenantClientError> {
        self.record(format!("update_features:{slug}"))?;
        self.modify(slug, |config| {
            for (name, enabled) in features {
                if *enabled {
                    config.features.insert(name.clone());
                } else {
                    config.features.remove(name);
                }
            }
        })
    }

    async fn update_branding(
        &self,
        slug: &str,
        branding: &Branding,
    ) -> Result<(), TenantClientError> {
        self.record(format!("update_branding:{slug}"))?;
        self.modify(slug, |config| config.branding = Some(branding.clone()))
    }

    async fn update_security(
        &self,
        slug: &str,
        security: &SecurityPolicy,
    ) -> Result<(), TenantClientError> {
        self.record(format!("update_security:{slug}"))?;
        self.modify(slug, |config| config.security = Some(security.clone()))
    }

    async fn fetch_usage(&self, slug: &str) -> Result<TenantUsage, TenantClientError> {
        self.record(format!("fetch_usage:{slug}"))?;
        Ok(self.usage.lock().get(slug).cloned().unwrap_or_default())
    }

    async fn fetch_analytics(&self, slug: &str) -> Result<Value, TenantClientError> {
        self.record(format!("fetch_analytics:{slug}"))?;
        Ok(json!({ "tenant": slug, "activeUsers": 3 }))
    }

    async fn fetch_health(&self, slug: &str) -> Result<Value, TenantClientError> {
        self.record(format!("fetch_health:{slug}"))?;
        Ok(json!({ "tenant": slug, "status": "healthy" }))
    }

    async fn transform_remote(
        &self,
        slug: &str,
        component: &Value,
        _transformation_type: &str,
    ) -> Result<Value, TenantClientError> {
        self.record(format!("transform_remote:{slug}"))?;
        if !self.remote_transform.load(Ordering::SeqCst) {
            return Err(TenantClientError::Api {
                status: 404,
                message: "remote transformation not available".to_string(),
            });
        }
        let mut component = component.clone();
        if let Some(object) = component.as_object_mut() {
            object.insert("transformedBy".to_string(), json!("server"));
        }
        Ok(component)
    }
}
