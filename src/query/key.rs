//! Cache keys for backend reads.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

use crate::api::client::Params;

/// Identifies one backend read: a resource name plus its parameters.
///
/// Parameters live in a sorted map, so two keys built with the same
/// parameters in a different order are equal and share a cache slot.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
  resource: String,
  params: BTreeMap<String, String>,
}

impl QueryKey {
  pub fn new(resource: impl Into<String>) -> Self {
    Self {
      resource: resource.into(),
      params: BTreeMap::new(),
    }
  }

  pub fn with(mut self, name: impl Into<String>, value: impl ToString) -> Self {
    self.params.insert(name.into(), value.to_string());
    self
  }

  /// Add a parameter only when it has a value
  pub fn with_opt<V: ToString>(self, name: impl Into<String>, value: Option<V>) -> Self {
    match value {
      Some(value) => self.with(name, value),
      None => self,
    }
  }

  /// Key a request by the same params it sends as its query string
  pub fn with_params(mut self, params: &Params) -> Self {
    for (name, value) in params {
      self.params.insert((*name).to_string(), value.clone());
    }
    self
  }

  pub fn resource(&self) -> &str {
    &self.resource
  }

  pub fn params(&self) -> &BTreeMap<String, String> {
    &self.params
  }

  pub fn param(&self, name: &str) -> Option<&str> {
    self.params.get(name).map(String::as_str)
  }

  /// Prefix match: `self` selects `other` when they name the same resource
  /// and every parameter of `self` appears in `other` with the same value.
  ///
  /// A bare `QueryKey::new("payments")` therefore matches every payments
  /// list regardless of filters.
  pub fn matches(&self, other: &QueryKey) -> bool {
    self.resource == other.resource
      && self
        .params
        .iter()
        .all(|(name, value)| other.params.get(name) == Some(value))
  }

  /// Stable fixed-length identifier, used in logs.
  pub fn cache_hash(&self) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.to_string().as_bytes());
    hex::encode(hasher.finalize())
  }

  /// Human-readable summary for the status line
  pub fn description(&self) -> String {
    if self.params.is_empty() {
      return self.resource.clone();
    }
    let params: Vec<String> = self.params.values().cloned().collect();
    format!("{} ({})", self.resource, params.join(", "))
  }
}

impl fmt::Display for QueryKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.resource)?;
    for (i, (name, value)) in self.params.iter().enumerate() {
      let sep = if i == 0 { '?' } else { '&' };
      write!(f, "{}{}={}", sep, name, value)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_param_order_does_not_matter() {
    let a = QueryKey::new("payments").with("status", "PAID").with("page", 1);
    let b = QueryKey::new("payments").with("page", 1).with("status", "PAID");
    assert_eq!(a, b);
    assert_eq!(a.cache_hash(), b.cache_hash());
  }

  #[test]
  fn test_different_params_different_hash() {
    let a = QueryKey::new("payments").with("status", "PAID");
    let b = QueryKey::new("payments").with("status", "PENDING");
    assert_ne!(a.cache_hash(), b.cache_hash());
    assert_eq!(a.cache_hash().len(), 64);
  }

  #[test]
  fn test_prefix_matching() {
    let prefix = QueryKey::new("payments");
    let filtered = QueryKey::new("payments").with("status", "PAID");
    let stats = QueryKey::new("payment-stats");

    assert!(prefix.matches(&prefix));
    assert!(prefix.matches(&filtered));
    assert!(!filtered.matches(&prefix));
    assert!(!prefix.matches(&stats));
  }

  #[test]
  fn test_with_opt_and_params() {
    let key = QueryKey::new("appointments")
      .with_opt("instructorId", None::<String>)
      .with_params(&vec![("status", "SCHEDULED".to_string())]);
    assert_eq!(key.param("status"), Some("SCHEDULED"));
    assert_eq!(key.param("instructorId"), None);
  }

  #[test]
  fn test_display_and_description() {
    let key = QueryKey::new("student").with("id", "s1");
    assert_eq!(key.to_string(), "student?id=s1");
    assert_eq!(key.description(), "student (s1)");
    assert_eq!(QueryKey::new("students").description(), "students");
  }
}
