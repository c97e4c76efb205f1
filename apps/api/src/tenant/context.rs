//! Active-tenant snapshot and the manager's state machine.
//!
//! `UNINITIALIZED -> LOADING -> READY | FAILED`; from `READY` or `FAILED`
//! every switch or refresh re-enters `LOADING`. All transitions go through
//! [`transition`], so a loading state never carries an error and a failed
//! state never carries tenant data.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::tenant::TenantConfiguration;
use crate::models::user::UserIdentity;
use crate::tenant::permissions::resolve_access;

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TenantContext {
    pub tenant: Option<TenantConfiguration>,
    pub user: Option<UserIdentity>,
    pub permissions: BTreeSet<String>,
    pub is_admin: bool,
    pub is_owner: bool,
}

impl TenantContext {
    /// Builds the full context for a freshly loaded tenant.
    pub fn resolve(tenant: TenantConfiguration, user: Option<UserIdentity>) -> Self {
        let access = resolve_access(&tenant, user.as_ref());
        Self {
            tenant: Some(tenant),
            user,
            permissions: access.permissions,
            is_admin: access.is_admin,
            is_owner: access.is_owner,
        }
    }

    /// Context with no tenant; the acting user is kept for the next load.
    pub fn without_tenant(user: Option<UserIdentity>) -> Self {
        Self {
            user,
            ..Self::default()
        }
    }

    pub fn slug(&self) -> Option<&str> {
        self.tenant.as_ref().map(|t| t.slug.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ManagerState {
    Uninitialized,
    /// A load for `target` is in flight; the previous context stays visible.
    Loading {
        context: TenantContext,
        target: String,
        initialized: bool,
    },
    Ready(TenantContext),
    Failed {
        user: Option<UserIdentity>,
        message: String,
    },
}

#[derive(Debug, Clone)]
pub enum Transition {
    Begin { target: String },
    Loaded(TenantContext),
    Failed { target: String, message: String },
    /// Initialization resolved no tenant identifier.
    Settled,
    Cleared,
}

impl ManagerState {
    /// The context a reader observes in this state.
    pub fn context(&self) -> TenantContext {
        match self {
            ManagerState::Uninitialized => TenantContext::default(),
            ManagerState::Loading { context, .. } | ManagerState::Ready(context) => {
                context.clone()
            }
            ManagerState::Failed { user, .. } => TenantContext::without_tenant(user.clone()),
        }
    }

    pub fn active_tenant(&self) -> Option<&TenantConfiguration> {
        match self {
            ManagerState::Loading { context, .. } | ManagerState::Ready(context) => {
                context.tenant.as_ref()
            }
            _ => None,
        }
    }

    pub fn user(&self) -> Option<&UserIdentity> {
        match self {
            ManagerState::Uninitialized => None,
            ManagerState::Loading { context, .. } | ManagerState::Ready(context) => {
                context.user.as_ref()
            }
            ManagerState::Failed { user, .. } => user.as_ref(),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ManagerState::Loading { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ManagerState::Failed { message, .. } => Some(message.as_str()),
            _ => None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        match self {
            ManagerState::Uninitialized => false,
            ManagerState::Loading { initialized, .. } => *initialized,
            ManagerState::Ready(_) | ManagerState::Failed { .. } => true,
        }
    }

    pub fn snapshot(&self) -> TenantSnapshot {
        TenantSnapshot {
            context: self.context(),
            loading: self.is_loading(),
            error: self.error().map(str::to_string),
            initialized: self.is_initialized(),
        }
    }
}

/// Applies one event to the current state. Pure; the manager is the only caller
/// that stores the result.
pub fn transition(state: &ManagerState, event: Transition) -> ManagerState {
    match event {
        Transition::Begin { target } => ManagerState::Loading {
            context: state.context(),
            target,
            initialized: state.is_initialized(),
        },
        Transition::Loaded(context) => ManagerState::Ready(context),
        Transition::Failed { target, message } => match state {
            // A concurrent load already replaced the context with another tenant;
            // the late failure of a stale load must not clobber it.
            ManagerState::Ready(context) if context.slug().is_some_and(|s| s != target) => {
                state.clone()
            }
            _ => ManagerState::Failed {
                user: state.user().cloned(),
                message,
            },
        },
        Transition::Settled => ManagerState::Ready(TenantContext::without_tenant(
            state.user().cloned(),
        )),
        Transition::Cleared => ManagerState::Uninitialized,
    }
}

/// What the UI layer reads: the context plus manager-level flags.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TenantSnapshot {
    #[serde(flatten)]
    pub context: TenantContext,
    pub loading: bool,
    pub error: Option<String>,
    pub initialized: bool,
}
