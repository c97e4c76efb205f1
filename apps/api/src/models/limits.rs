use std::collections::BTreeMap;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::models::tenant::TenantUsage;

/// A non-negative limit or usage amount. Whole amounts serialize as integers.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Quantity(f64);

impl Quantity {
    /// `None` for negative, NaN or infinite amounts.
    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && value >= 0.0).then_some(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }

    pub fn saturating_sub(self, other: Quantity) -> Quantity {
        Quantity((self.0 - other.0).max(0.0))
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.fract() == 0.0 && self.0 <= u64::MAX as f64 {
            serializer.serialize_u64(self.0 as u64)
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Quantity::new(value).ok_or_else(|| {
            de::Error::custom(format!("expected a non-negative number, got {value}"))
        })
    }
}

/// Remaining capacity for one named resource, floored at zero.
/// `None` means unknown: the limit or the usage counter is missing.
pub fn remaining_limit(
    limits: &BTreeMap<String, Quantity>,
    usage: Option<&TenantUsage>,
    name: &str,
) -> Option<Quantity> {
    let limit = limits.get(name)?;
    let used = usage?.counter(name)?;
    Some(limit.saturating_sub(used))
}

/// `true` only when remaining capacity is known and exhausted.
pub fn is_limit_exceeded(
    limits: &BTreeMap<String, Quantity>,
    usage: Option<&TenantUsage>,
    name: &str,
) -> bool {
    remaining_limit(limits, usage, name).is_some_and(Quantity::is_zero)
}

/// Remaining capacity for every limit that also has a usage counter.
pub fn remaining_capacity(
    limits: &BTreeMap<String, Quantity>,
    usage: Option<&TenantUsage>,
) -> BTreeMap<String, Quantity> {
    limits
        .keys()
        .filter_map(|name| remaining_limit(limits, usage, name).map(|r| (name.clone(), r)))
        .collect()
}

/// Percentage of a limit consumed, unknown without both numbers or with a zero limit.
pub fn usage_percentage(
    limits: &BTreeMap<String, Quantity>,
    usage: Option<&TenantUsage>,
    name: &str,
) -> Option<f64> {
    let limit = *limits.get(name)?;
    let used = usage?.counter(name)?;
    if limit.is_zero() {
        return None;
    }
    Some(used.value() / limit.value() * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(value: f64) -> Quantity {
        Quantity::new(value).unwrap()
    }

    fn limits(pairs: &[(&str, f64)]) -> BTreeMap<String, Quantity> {
        pairs.iter().map(|(k, v)| (k.to_string(), q(*v))).collect()
    }

    fn usage(pairs: &[(&str, f64)]) -> TenantUsage {
        TenantUsage {
            last_activity: None,
            counters: limits(pairs),
        }
    }

    #[test]
    fn test_limit_reached_is_exceeded() {
        let l = limits(&[("users", 10.0)]);
        let u = usage(&[("users", 10.0)]);
        assert_eq!(remaining_limit(&l, Some(&u), "users"), Some(q(0.0)));
        assert!(is_limit_exceeded(&l, Some(&u), "users"));
    }

    #[test]
    fn test_one_slot_left() {
        let l = limits(&[("users", 10.0)]);
        let u = usage(&[("users", 9.0)]);
        assert_eq!(remaining_limit(&l, Some(&u), "users"), Some(q(1.0)));
        assert!(!is_limit_exceeded(&l, Some(&u), "users"));
    }

    #[test]
    fn test_overuse_floors_at_zero() {
        let l = limits(&[("storage", 100.0)]);
        let u = usage(&[("storage", 140.0)]);
        assert_eq!(remaining_limit(&l, Some(&u), "storage"), Some(q(0.0)));
    }

    #[test]
    fn test_missing_limit_is_unknown_not_zero() {
        let l = limits(&[]);
        let u = usage(&[("users", 3.0)]);
        assert_eq!(remaining_limit(&l, Some(&u), "users"), None);
        assert!(!is_limit_exceeded(&l, Some(&u), "users"));
        assert_eq!(remaining_limit(&limits(&[("users", 3.0)]), None, "users"), None);
    }

    #[test]
    fn test_remaining_capacity_only_covers_both_maps() {
        let l = limits(&[("users", 10.0), ("storage", 50.0), ("apiCalls", 1000.0)]);
        let u = usage(&[("users", 4.0), ("apiCalls", 1200.0)]);
        let remaining = remaining_capacity(&l, Some(&u));
        assert_eq!(remaining.len(), 2);
        assert_eq!(remaining["users"], q(6.0));
        assert_eq!(remaining["apiCalls"], q(0.0));
    }

    #[test]
    fn test_usage_percentage() {
        let l = limits(&[("users", 8.0), ("seats", 0.0)]);
        let u = usage(&[("users", 2.0), ("seats", 1.0)]);
        assert_eq!(usage_percentage(&l, Some(&u), "users"), Some(25.0));
        assert_eq!(usage_percentage(&l, Some(&u), "seats"), None);
    }

    #[test]
    fn test_fractional_amounts() {
        let l = limits(&[("storage", 2.5)]);
        let u = usage(&[("storage", 1.25)]);
        assert_eq!(remaining_limit(&l, Some(&u), "storage"), Some(q(1.25)));
        assert_eq!(usage_percentage(&l, Some(&u), "storage"), Some(50.0));

        let over = usage(&[("storage", 3.75)]);
        assert_eq!(remaining_limit(&l, Some(&over), "storage"), Some(q(0.0)));
        assert!(is_limit_exceeded(&l, Some(&over), "storage"));
    }

    #[test]
    fn test_quantity_serializes_whole_amounts_as_integers() {
        assert_eq!(serde_json::to_value(q(5.0)).unwrap(), serde_json::json!(5));
        assert_eq!(
            serde_json::to_value(q(2.5)).unwrap(),
            serde_json::json!(2.5)
        );
        assert!(serde_json::from_value::<Quantity>(serde_json::json!(-0.5)).is_err());
    }
}
