//! Transformation Engine: runs the rule pipeline over a descriptor, stamps the
//! tenant context and memoizes the result per (descriptor, tenant, rule subset).
//!
//! Transformation is best-effort: a failing rule is logged and the caller gets
//! the original descriptor back, untouched and uncached.

use parking_lot::RwLock;
use serde_json::json;
use tracing::{debug, warn};

use crate::models::tenant::TenantConfiguration;
use crate::transform::cache::{CacheKey, TransformCache};
use crate::transform::rules::{attach, RuleError, RuleSelection, RuleSet, TransformationRule};
use crate::transform::Descriptor;

pub struct TransformationEngine {
    rules: RwLock<RuleSet>,
    cache: TransformCache,
}

impl TransformationEngine {
    pub fn new() -> Self {
        Self::with_rules(RuleSet::default_rules())
    }

    pub fn with_rules(rules: RuleSet) -> Self {
        Self {
            rules: RwLock::new(rules),
            cache: TransformCache::default(),
        }
    }

    /// Registers (or replaces) a rule. Cached results may depend on the old
    /// rule set, so the cache is dropped.
    pub fn register_rule(&self, rule: TransformationRule) {
        self.rules.write().register(rule);
        self.cache.clear();
    }

    pub fn rule_names(&self) -> Vec<String> {
        self.rules
            .read()
            .names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn transform_component(
        &self,
        descriptor: &Descriptor,
        config: &TenantConfiguration,
        selection: &RuleSelection,
    ) -> Descriptor {
        let key = CacheKey::new(descriptor, &config.slug, selection);
        if let Some(cached) = self.cache.get(&key) {
            debug!(tenant = %config.slug, "Transformation cache hit");
            return cached;
        }

        match self.run(descriptor, config, selection) {
            Ok(transformed) => {
                self.cache.insert(key, transformed.clone());
                transformed
            }
            Err((rule, e)) => {
                warn!(
                    tenant = %config.slug,
                    rule = %rule,
                    error = %e,
                    "Transformation rule failed; returning original descriptor"
                );
                descriptor.clone()
            }
        }
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    fn run(
        &self,
        descriptor: &Descriptor,
        config: &TenantConfiguration,
        selection: &RuleSelection,
    ) -> Result<Descriptor, (String, RuleError)> {
        let rules = self.rules.read().select(selection);

        let mut current = descriptor.clone();
        for rule in &rules {
            current = rule
                .apply(&current, config)
                .map_err(|e| (rule.name.clone(), e))?;
        }

        stamp_tenant_context(&current, config).map_err(|e| ("tenantContext".to_string(), e))
    }
}

impl Default for TransformationEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn stamp_tenant_context(
    descriptor: &Descriptor,
    config: &TenantConfiguration,
) -> Result<Descriptor, RuleError> {
    attach(
        descriptor,
        "tenantContext",
        json!({
            "tenant": config.slug,
            "id": config.id,
            "name": config.name,
            "domain": config.domain,
            "lastUpdated": config.last_updated,
        }),
    )
}
