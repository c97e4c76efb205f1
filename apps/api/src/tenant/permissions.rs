//! Permission resolution and fail-closed permission queries.

use std::collections::BTreeSet;

use crate::models::tenant::TenantConfiguration;
use crate::models::user::{UserIdentity, UserRole};
use crate::tenant::context::TenantContext;

pub const ADMIN_PERMISSION: &str = "admin";
pub const WILDCARD_PERMISSION: &str = "*";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedAccess {
    pub permissions: BTreeSet<String>,
    pub is_admin: bool,
    pub is_owner: bool,
}

/// Resolves the effective permission set of `user` inside `tenant`.
///
/// Tenant-wide grants are unioned with the user's own; owners and admins get
/// `admin`. Without a user nothing is granted.
pub fn resolve_access(tenant: &TenantConfiguration, user: Option<&UserIdentity>) -> ResolvedAccess {
    let Some(user) = user else {
        return ResolvedAccess::default();
    };

    let mut permissions: BTreeSet<String> = tenant
        .security
        .as_ref()
        .and_then(|s| s.permissions.clone())
        .unwrap_or_default()
        .into_iter()
        .chain(user.permissions.iter().cloned())
        .collect();

    let is_owner = user.role == UserRole::Owner;
    let is_admin = is_owner || user.role == UserRole::Admin || permissions.contains(ADMIN_PERMISSION);
    if is_admin {
        permissions.insert(ADMIN_PERMISSION.to_string());
    }

    ResolvedAccess {
        permissions,
        is_admin,
        is_owner,
    }
}

impl TenantContext {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.tenant.is_some()
            && (self.permissions.contains(permission)
                || self.permissions.contains(WILDCARD_PERMISSION))
    }

    pub fn has_any_permission<S: AsRef<str>>(&self, permissions: &[S]) -> bool {
        permissions.iter().any(|p| self.has_permission(p.as_ref()))
    }

    /// An empty list is satisfied only while a tenant is active.
    pub fn has_all_permissions<S: AsRef<str>>(&self, permissions: &[S]) -> bool {
        self.tenant.is_some() && permissions.iter().all(|p| self.has_permission(p.as_ref()))
    }

    /// Checks `resource:action`, then `resource:*`; admins may access everything.
    pub fn can_access(&self, resource: &str, action: &str) -> bool {
        if self.tenant.is_none() {
            return false;
        }
        self.is_admin
            || self.has_permission(&format!("{resource}:{action}"))
            || self.has_permission(&format!("{resource}:*"))
    }
}
