//! Surrogate-id assignment and composite natural keys.
//!
//! Provider person identifiers are arbitrary-length strings; the target store
//! wants small positive integers. The resolver folds a content hash of the
//! natural id into a bounded range and memoizes the mapping for the rest of
//! the run. Distinct natural ids folding to the same surrogate are NOT
//! detected — a known limitation of the scheme, kept for compatibility with
//! existing imports.

use std::collections::HashMap;

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Surrogates start above the target store's reserved low ids.
const SURROGATE_FLOOR: i64 = 100;
/// Size of the folded range.
const SURROGATE_SPAN: u32 = 9_999_999;

/// Per-run natural-id → surrogate-id cache.
///
/// Surrogates are stable for a given natural id (the fold is a pure content
/// hash) but are not guaranteed unique across distinct natural ids, and no
/// mapping is persisted between runs.
#[derive(Debug, Default)]
pub struct IdentityResolver {
  cache: HashMap<String, i64>,
}

impl IdentityResolver {
  pub fn new() -> Self {
    Self::default()
  }

  /// Resolve a natural id to its surrogate, computing and caching it on
  /// first sight.
  pub fn surrogate(&mut self, natural_id: &str) -> i64 {
    if let Some(&id) = self.cache.get(natural_id) {
      return id;
    }
    let digest = Sha256::digest(natural_id.as_bytes());
    let head = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    let id = i64::from(head % SURROGATE_SPAN) + SURROGATE_FLOOR;
    self.cache.insert(natural_id.to_owned(), id);
    id
  }

  /// Convenience for optional link fields.
  pub fn surrogate_opt(&mut self, natural_id: Option<&str>) -> Option<i64> {
    natural_id.filter(|id| !id.is_empty()).map(|id| self.surrogate(id))
  }

  /// Number of distinct natural ids resolved so far this run.
  pub fn resolved(&self) -> usize {
    self.cache.len()
  }
}

/// Deterministic composite key for rows that carry no provider-issued natural
/// id: a UUID v5 over the non-empty parts, joined in order. Identical part
/// tuples yield identical keys regardless of processing order or run.
pub fn composite_key(parts: &[&str]) -> String {
  let joined = parts
    .iter()
    .filter(|p| !p.is_empty())
    .copied()
    .collect::<Vec<_>>()
    .join(" ");
  Uuid::new_v5(&Uuid::NAMESPACE_DNS, joined.as_bytes()).to_string()
}
