//! Tenant configuration record as served by the tenant backend.
//!
//! Wire format is camelCase JSON. `features` is a set, so duplicate entries
//! collapse on decode; limits and usage counters are non-negative quantities,
//! so a negative value fails to decode rather than reaching the limit arithmetic.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::limits::Quantity;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TenantConfiguration {
    pub id: String,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub settings: BTreeMap<String, Value>,
    #[serde(default)]
    pub features: BTreeSet<String>,
    #[serde(default)]
    pub limits: BTreeMap<String, Quantity>,
    #[serde(default)]
    pub branding: Option<Branding>,
    #[serde(default)]
    pub security: Option<SecurityPolicy>,
    #[serde(default)]
    pub integrations: BTreeMap<String, IntegrationConfig>,
    #[serde(default)]
    pub custom_fields: BTreeMap<String, Value>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    /// Latest usage snapshot, attached by the service before transforming.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TenantUsage>,
}

impl TenantConfiguration {
    /// Minimal configuration with only identity fields set.
    pub fn new(id: impl Into<String>, slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            slug: slug.into(),
            name: name.into(),
            domain: None,
            settings: BTreeMap::new(),
            features: BTreeSet::new(),
            limits: BTreeMap::new(),
            branding: None,
            security: None,
            integrations: BTreeMap::new(),
            custom_fields: BTreeMap::new(),
            last_updated: None,
            usage: None,
        }
    }

    pub fn has_feature(&self, name: &str) -> bool {
        self.features.contains(name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Branding {
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub colors: BTreeMap<String, String>,
    #[serde(default)]
    pub fonts: FontSettings,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub favicon: Option<String>,
}

/// Font family per role (`primary`, `heading`, ...) plus an optional size scale.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FontSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<BTreeMap<String, String>>,
    #[serde(flatten)]
    pub families: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SecurityPolicy {
    #[serde(default)]
    pub permissions: Option<Vec<String>>,
    #[serde(default)]
    pub sso: Option<bool>,
    #[serde(default)]
    pub mfa: Option<bool>,
    /// Session timeout in seconds.
    #[serde(default)]
    pub session_timeout: Option<u64>,
    #[serde(default)]
    pub ip_whitelist: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IntegrationConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(flatten)]
    pub settings: BTreeMap<String, Value>,
}

/// Usage counters reported by `GET tenant-limits`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TenantUsage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub counters: BTreeMap<String, Quantity>,
}

impl TenantUsage {
    pub fn counter(&self, name: &str) -> Option<Quantity> {
        self.counters.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decodes_camel_case_record() {
        let config: TenantConfiguration = serde_json::from_value(json!({
            "id": "t-1",
            "slug": "acme",
            "name": "Acme",
            "features": ["ai", "sso", "ai"],
            "limits": {"users": 10, "apiCalls": 5000},
            "branding": {
                "theme": "dark",
                "colors": {"primary": "#111111"},
                "fonts": {"primary": "Inter", "sizes": {"base": "14px"}}
            },
            "security": {"mfa": true, "sessionTimeout": 900, "ipWhitelist": ["10.0.0.1"]},
            "integrations": {"slack": {"enabled": true, "channel": "#jobs"}},
            "customFields": {"region": "eu"},
            "lastUpdated": "2024-05-01T12:00:00Z"
        }))
        .unwrap();

        assert_eq!(config.features.len(), 2);
        assert_eq!(config.limits.get("apiCalls").map(|q| q.value()), Some(5000.0));
        let branding = config.branding.unwrap();
        assert_eq!(branding.fonts.families.get("primary").unwrap(), "Inter");
        assert_eq!(
            branding.fonts.sizes.unwrap().get("base").unwrap(),
            "14px"
        );
        let security = config.security.unwrap();
        assert_eq!(security.session_timeout, Some(900));
        assert_eq!(security.sso, None);
        let slack = config.integrations.get("slack").unwrap();
        assert!(slack.enabled);
        assert_eq!(slack.settings.get("channel"), Some(&json!("#jobs")));
        assert!(config.last_updated.is_some());
    }

    #[test]
    fn test_negative_limit_is_rejected() {
        let result = serde_json::from_value::<TenantConfiguration>(json!({
            "id": "t-1",
            "slug": "acme",
            "name": "Acme",
            "limits": {"users": -1}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_usage_counters_flatten() {
        let usage: TenantUsage = serde_json::from_value(json!({
            "users": 4,
            "storage": 120,
            "apiCalls": 900,
            "lastActivity": "2024-05-01T12:00:00Z"
        }))
        .unwrap();
        assert_eq!(usage.counter("users").map(Quantity::value), Some(4.0));
        assert_eq!(usage.counter("apiCalls").map(Quantity::value), Some(900.0));
        assert_eq!(usage.counter("lastActivity"), None);
        assert!(usage.last_activity.is_some());
    }

    #[test]
    fn test_fractional_limits_and_usage_decode() {
        let config: TenantConfiguration = serde_json::from_value(json!({
            "id": "t-1",
            "slug": "acme",
            "name": "Acme",
            "limits": {"users": 10, "storage": 2.5}
        }))
        .unwrap();
        assert_eq!(config.limits.get("storage").map(|q| q.value()), Some(2.5));

        let usage: TenantUsage =
            serde_json::from_value(json!({"users": 4, "storage": 1.25})).unwrap();
        assert_eq!(usage.counter("storage").map(Quantity::value), Some(1.25));

        assert!(serde_json::from_value::<TenantUsage>(json!({"storage": -1.5})).is_err());
    }
}
