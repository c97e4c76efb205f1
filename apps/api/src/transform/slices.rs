//! Single-concern transforms for call sites that need one slice of the tenant
//! configuration. They bypass the rule pipeline and the cache; each is a pure
//! function of its inputs. A non-object input is returned unchanged.

use serde_json::{json, Map, Value};

use crate::models::tenant::TenantConfiguration;
use crate::transform::rules::{DEFAULT_PERMISSION, FEATURE_CATALOG};

fn merged(base: &Value, additions: Map<String, Value>) -> Value {
    match base.as_object() {
        Some(object) => {
            let mut object = object.clone();
            object.extend(additions);
            Value::Object(object)
        }
        None => base.clone(),
    }
}

/// Adds branding as CSS custom properties (`--color-*`, `--font-*`, `--font-size-*`).
pub fn transform_styles(styles: &Value, config: &TenantConfiguration) -> Value {
    let Some(branding) = config.branding.as_ref() else {
        return styles.clone();
    };

    let mut vars = Map::new();
    for (role, color) in &branding.colors {
        vars.insert(format!("--color-{role}"), json!(color));
    }
    for (role, family) in &branding.fonts.families {
        vars.insert(format!("--font-{role}"), json!(family));
    }
    if let Some(sizes) = &branding.fonts.sizes {
        for (step, size) in sizes {
            vars.insert(format!("--font-size-{step}"), json!(size));
        }
    }
    merged(styles, vars)
}

/// Adds tenant identity, enabled features, custom fields and logo to component props.
pub fn transform_props(props: &Value, config: &TenantConfiguration) -> Value {
    let mut additions = Map::new();
    additions.insert("tenantId".into(), json!(config.id));
    additions.insert("tenantSlug".into(), json!(config.slug));
    additions.insert("tenantName".into(), json!(config.name));
    additions.insert("features".into(), json!(config.features));
    additions.insert("customFields".into(), json!(config.custom_fields));
    additions.insert(
        "logo".into(),
        json!(config.branding.as_ref().and_then(|b| b.logo.clone())),
    );
    merged(props, additions)
}

/// Adds a per-feature on/off map, the raw limits and the session timeout.
pub fn transform_behavior(behavior: &Value, config: &TenantConfiguration) -> Value {
    let flags: Map<String, Value> = FEATURE_CATALOG
        .iter()
        .map(|f| (f.to_string(), json!(config.has_feature(f))))
        .collect();

    let mut additions = Map::new();
    additions.insert("featureFlags".into(), Value::Object(flags));
    additions.insert("limits".into(), json!(config.limits));
    additions.insert(
        "sessionTimeout".into(),
        json!(config.security.as_ref().and_then(|s| s.session_timeout)),
    );
    merged(behavior, additions)
}

/// Adds the security policy with the same defaults as the `security` rule.
pub fn transform_security(security: &Value, config: &TenantConfiguration) -> Value {
    let policy = config.security.clone().unwrap_or_default();

    let mut additions = Map::new();
    additions.insert(
        "permissions".into(),
        json!(policy
            .permissions
            .unwrap_or_else(|| vec![DEFAULT_PERMISSION.to_string()])),
    );
    additions.insert(
        "ssoEnabled".into(),
        json!(policy.sso.unwrap_or_else(|| config.has_feature("sso"))),
    );
    additions.insert("requireMfa".into(), json!(policy.mfa.unwrap_or(false)));
    additions.insert("sessionTimeout".into(), json!(policy.session_timeout));
    additions.insert("ipWhitelist".into(), json!(policy.ip_whitelist));
    merged(security, additions)
}
