pub mod context;
pub mod handlers;
pub mod manager;
pub mod permissions;
pub mod resolver;

use thiserror::Error;

use crate::tenant_client::TenantClientError;

/// Failures of tenant context and management operations.
#[derive(Debug, Error)]
pub enum TenantError {
    #[error("No tenant is active")]
    NoActiveTenant,

    #[error("Invalid tenant identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("Tenant '{requested}' resolved to a configuration for '{received}'")]
    ConfigurationMismatch { requested: String, received: String },

    #[error("Failed to load tenant '{slug}': {source}")]
    Fetch {
        slug: String,
        #[source]
        source: TenantClientError,
    },

    #[error("Tenant update failed: {0}")]
    Update(#[source] TenantClientError),
}
