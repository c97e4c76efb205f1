//! Transformation rules: named, prioritized, pure functions
//! `(descriptor, config) -> descriptor'`.
//!
//! Default pipeline (ascending priority):
//! `theme` (10) → `features` (20) → `limits` (30) → `security` (40)
//! → `customFields` (50) → `integrations` (60).

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::models::limits::remaining_capacity;
use crate::models::tenant::TenantConfiguration;
use crate::transform::Descriptor;

/// Every feature name the platform recognizes.
pub const FEATURE_CATALOG: &[&str] = &[
    "sso",
    "ai",
    "analytics",
    "integrations",
    "custom_domain",
    "audit_logs",
    "api_access",
    "white_label",
    "advanced_search",
    "priority_support",
];

pub const DEFAULT_THEME: &str = "default";
pub const DEFAULT_PERMISSION: &str = "read";

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("descriptor is not an object")]
    NotAnObject,

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("{0}")]
    Failed(String),
}

pub type RuleFn =
    Arc<dyn Fn(&Descriptor, &TenantConfiguration) -> Result<Descriptor, RuleError> + Send + Sync>;

#[derive(Clone)]
pub struct TransformationRule {
    pub name: String,
    pub priority: i32,
    transform: RuleFn,
}

impl TransformationRule {
    pub fn new<F>(name: impl Into<String>, priority: i32, transform: F) -> Self
    where
        F: Fn(&Descriptor, &TenantConfiguration) -> Result<Descriptor, RuleError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            priority,
            transform: Arc::new(transform),
        }
    }

    pub fn apply(
        &self,
        descriptor: &Descriptor,
        config: &TenantConfiguration,
    ) -> Result<Descriptor, RuleError> {
        (self.transform)(descriptor, config)
    }
}

impl fmt::Debug for TransformationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformationRule")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish()
    }
}

/// Sentinel name selecting every registered rule.
pub const ALL_RULES: &str = "all";

/// Which rules a transformation runs: `"all"` or a list of names.
/// A list that names `"all"` selects every rule.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawSelection")]
pub enum RuleSelection {
    #[default]
    All,
    Only(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSelection {
    Name(String),
    Names(Vec<String>),
}

impl From<RawSelection> for RuleSelection {
    fn from(raw: RawSelection) -> Self {
        match raw {
            RawSelection::Name(name) => RuleSelection::only([name]),
            RawSelection::Names(names) => RuleSelection::only(names),
        }
    }
}

impl RuleSelection {
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.iter().any(|n| n == ALL_RULES) {
            RuleSelection::All
        } else {
            RuleSelection::Only(names)
        }
    }

    /// Order-independent key: the same rule subset always maps to the same string.
    pub fn cache_key(&self) -> String {
        match self {
            RuleSelection::All => ALL_RULES.to_string(),
            RuleSelection::Only(names) => {
                let mut names = names.clone();
                names.sort();
                names.dedup();
                format!("only:{}", Value::from(names))
            }
        }
    }
}

/// Rules kept sorted by ascending priority; ties keep registration order.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<TransformationRule>,
}

impl RuleSet {
    pub fn default_rules() -> Self {
        let mut set = Self::default();
        set.register(TransformationRule::new("theme", 10, theme_rule));
        set.register(TransformationRule::new("features", 20, features_rule));
        set.register(TransformationRule::new("limits", 30, limits_rule));
        set.register(TransformationRule::new("security", 40, security_rule));
        set.register(TransformationRule::new("customFields", 50, custom_fields_rule));
        set.register(TransformationRule::new("integrations", 60, integrations_rule));
        set
    }

    /// Adds a rule, replacing any rule with the same name.
    pub fn register(&mut self, rule: TransformationRule) {
        self.rules.retain(|r| r.name != rule.name);
        self.rules.push(rule);
        self.rules.sort_by_key(|r| r.priority);
    }

    /// Rules to run for `selection`, in priority order. Unknown names are skipped.
    pub fn select(&self, selection: &RuleSelection) -> Vec<TransformationRule> {
        match selection {
            RuleSelection::All => self.rules.clone(),
            RuleSelection::Only(names) => self
                .rules
                .iter()
                .filter(|r| names.iter().any(|n| n == &r.name))
                .cloned()
                .collect(),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name.as_str()).collect()
    }

}

/// Returns a copy of `descriptor` with `field` set to `value`.
pub fn attach(descriptor: &Descriptor, field: &str, value: Value) -> Result<Descriptor, RuleError> {
    let mut object: Map<String, Value> =
        descriptor.as_object().cloned().ok_or(RuleError::NotAnObject)?;
    object.insert(field.to_string(), value);
    Ok(Value::Object(object))
}

// ────────────────────────────────────────────────────────────────────────────
// Default rules
// ────────────────────────────────────────────────────────────────────────────

pub fn theme_rule(descriptor: &Descriptor, config: &TenantConfiguration) -> Result<Descriptor, RuleError> {
    let branding = config.branding.clone().unwrap_or_default();
    let theme = json!({
        "name": branding.theme.as_deref().unwrap_or(DEFAULT_THEME),
        "colors": branding.colors,
        "fonts": serde_json::to_value(&branding.fonts)?,
        "logo": branding.logo,
        "favicon": branding.favicon,
    });
    attach(descriptor, "theme", theme)
}

pub fn features_rule(
    descriptor: &Descriptor,
    config: &TenantConfiguration,
) -> Result<Descriptor, RuleError> {
    let enabled: Vec<&str> = config.features.iter().map(String::as_str).collect();
    let disabled: Vec<&str> = FEATURE_CATALOG
        .iter()
        .copied()
        .filter(|f| !config.has_feature(f))
        .collect();
    attach(
        descriptor,
        "features",
        json!({
            "enabled": enabled,
            "disabled": disabled,
            "available": FEATURE_CATALOG,
        }),
    )
}

pub fn limits_rule(descriptor: &Descriptor, config: &TenantConfiguration) -> Result<Descriptor, RuleError> {
    let mut limits: Map<String, Value> = config
        .limits
        .iter()
        .map(|(k, v)| (k.clone(), json!(v)))
        .collect();
    let usage = config
        .usage
        .as_ref()
        .map(|u| serde_json::to_value(&u.counters))
        .transpose()?
        .unwrap_or_else(|| json!({}));
    limits.insert("usage".to_string(), usage);
    limits.insert(
        "remaining".to_string(),
        serde_json::to_value(remaining_capacity(&config.limits, config.usage.as_ref()))?,
    );
    attach(descriptor, "limits", Value::Object(limits))
}

pub fn security_rule(
    descriptor: &Descriptor,
    config: &TenantConfiguration,
) -> Result<Descriptor, RuleError> {
    let policy = config.security.clone().unwrap_or_default();
    let permissions = policy
        .permissions
        .unwrap_or_else(|| vec![DEFAULT_PERMISSION.to_string()]);
    // SSO follows the policy when set, otherwise whether the `sso` feature is on
    let sso = policy.sso.unwrap_or_else(|| config.has_feature("sso"));
    attach(
        descriptor,
        "security",
        json!({
            "permissions": permissions,
            "sso": sso,
            "mfa": policy.mfa.unwrap_or(false),
        }),
    )
}

pub fn custom_fields_rule(
    descriptor: &Descriptor,
    config: &TenantConfiguration,
) -> Result<Descriptor, RuleError> {
    attach(
        descriptor,
        "customFields",
        serde_json::to_value(&config.custom_fields)?,
    )
}

pub fn integrations_rule(
    descriptor: &Descriptor,
    config: &TenantConfiguration,
) -> Result<Descriptor, RuleError> {
    let mut integrations: Map<String, Value> = config
        .integrations
        .iter()
        .map(|(name, integration)| Ok((name.clone(), serde_json::to_value(integration)?)))
        .collect::<Result<_, serde_json::Error>>()?;
    let enabled: Vec<&str> = config
        .integrations
        .iter()
        .filter(|(_, i)| i.enabled)
        .map(|(name, _)| name.as_str())
        .collect();
    integrations.insert("enabled".to_string(), json!(enabled));
    attach(descriptor, "integrations", Value::Object(integrations))
}
