use std::sync::Arc;

use crate::models::tenant::SecurityPolicy;
use crate::tenant::context::TenantSnapshot;
use crate::tenant::manager::TenantContextManager;
use crate::tenant::TenantError;
use crate::tenant_client::TenantBackend;
use crate::views::update_then_refresh;

pub struct SecurityView {
    manager: Arc<TenantContextManager>,
    backend: Arc<dyn TenantBackend>,
}

impl SecurityView {
    pub fn new(manager: Arc<TenantContextManager>, backend: Arc<dyn TenantBackend>) -> Self {
        Self { manager, backend }
    }

    pub fn security(&self) -> Option<SecurityPolicy> {
        self.manager
            .current_tenant()
            .map(|t| t.security.unwrap_or_default())
    }

    pub fn requires_mfa(&self) -> bool {
        self.security().and_then(|s| s.mfa).unwrap_or(false)
    }

    pub fn sso_enabled(&self) -> bool {
        self.manager.current_tenant().is_some_and(|t| {
            t.security
                .as_ref()
                .and_then(|s| s.sso)
                .unwrap_or_else(|| t.has_feature("sso"))
        })
    }

    pub fn session_timeout(&self) -> Option<u64> {
        self.security().and_then(|s| s.session_timeout)
    }

    /// An empty allow-list admits everyone; entries match exactly or by a
    /// trailing `*` prefix (`10.0.*`). No tenant admits nobody.
    pub fn is_ip_allowed(&self, ip: &str) -> bool {
        let Some(policy) = self.security() else {
            return false;
        };
        policy.ip_whitelist.is_empty()
            || policy.ip_whitelist.iter().any(|entry| match entry.strip_suffix('*') {
                Some(prefix) => ip.starts_with(prefix),
                None => entry == ip,
            })
    }

    pub async fn update_security(
        &self,
        security: &SecurityPolicy,
    ) -> Result<TenantSnapshot, TenantError> {
        let backend = &self.backend;
        update_then_refresh(&self.manager, "security policy", |slug| async move {
            backend.update_security(&slug, security).await
        })
        .await
    }
}
