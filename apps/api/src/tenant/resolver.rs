//! Tenant identifier detection for manager initialization.

use std::collections::HashMap;

use reqwest::Url;

const MAX_IDENTIFIER_LEN: usize = 64;
const RESERVED_SUBDOMAINS: &[&str] = &["www", "app", "api"];
const PATH_PREFIXES: &[&str] = &["t", "tenant"];
const PARAM_KEYS: &[&str] = &["tenant", "tenant_id"];

#[derive(Debug, Clone)]
pub struct TenantOptions {
    pub auto_detect: bool,
    pub default_tenant: Option<String>,
    /// Enables `<slug>.<base_domain>` detection when set.
    pub base_domain: Option<String>,
}

impl Default for TenantOptions {
    fn default() -> Self {
        Self {
            auto_detect: true,
            default_tenant: None,
            base_domain: None,
        }
    }
}

/// Where the caller currently is: the navigation URL and the request parameters.
#[derive(Debug, Clone, Default)]
pub struct DetectionHints {
    pub navigation_url: Option<Url>,
    pub params: HashMap<String, String>,
}

/// Lowercases and validates a tenant identifier (1-64 of `[a-z0-9_-]`).
pub fn normalize_identifier(raw: &str) -> Option<String> {
    let id = raw.trim().to_lowercase();
    if id.is_empty() || id.len() > MAX_IDENTIFIER_LEN {
        return None;
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return None;
    }
    Some(id)
}

/// Subdomain of `base_domain`, then a `/t/<slug>` or `/tenant/<slug>` path, then `?tenant=`.
pub fn detect_from_url(url: &Url, base_domain: Option<&str>) -> Option<String> {
    if let (Some(host), Some(base)) = (url.host_str(), base_domain) {
        let host = host.to_lowercase();
        let suffix = format!(".{}", base.trim_start_matches('.').to_lowercase());
        if let Some(sub) = host.strip_suffix(&suffix) {
            // The label next to the base domain names the tenant
            let label = sub.rsplit('.').next().unwrap_or(sub);
            if !RESERVED_SUBDOMAINS.contains(&label) {
                if let Some(id) = normalize_identifier(label) {
                    return Some(id);
                }
            }
        }
    }

    let mut segments = url.path_segments()?;
    if let (Some(prefix), Some(slug)) = (segments.next(), segments.next()) {
        if PATH_PREFIXES.contains(&prefix) {
            if let Some(id) = normalize_identifier(slug) {
                return Some(id);
            }
        }
    }

    url.query_pairs()
        .find(|(k, _)| k == "tenant")
        .and_then(|(_, v)| normalize_identifier(&v))
}

pub fn detect_from_params(params: &HashMap<String, String>) -> Option<String> {
    PARAM_KEYS
        .iter()
        .filter_map(|key| params.get(*key))
        .find_map(|v| normalize_identifier(v))
}

/// Detection order: URL, request parameters (both only with auto-detect), then the default.
pub fn resolve_identifier(hints: &DetectionHints, options: &TenantOptions) -> Option<String> {
    if options.auto_detect {
        let detected = hints
            .navigation_url
            .as_ref()
            .and_then(|url| detect_from_url(url, options.base_domain.as_deref()))
            .or_else(|| detect_from_params(&hints.params));
        if detected.is_some() {
            return detected;
        }
    }

    options
        .default_tenant
        .as_deref()
        .and_then(normalize_identifier)
}
