//! Cross-reference context and skip accounting shared by the normalizers.

use std::collections::HashMap;

use kindred_core::record::PersonRecord;

/// Already-normalized match records from earlier rows of the same pass,
/// keyed by natural id. A later row whose natural id matches one of these is
/// the same real-world person seen through a weaker table, and borrows the
/// resolved name/sex fields from here.
#[derive(Debug, Default)]
pub struct CrossRefContext {
  matches: HashMap<String, PersonRecord>,
}

impl CrossRefContext {
  pub fn remember(&mut self, record: &PersonRecord) {
    self.matches.insert(record.natural_id.clone(), record.clone());
  }

  pub fn get(&self, natural_id: &str) -> Option<&PersonRecord> {
    self.matches.get(natural_id)
  }

  pub fn len(&self) -> usize {
    self.matches.len()
  }

  pub fn is_empty(&self) -> bool {
    self.matches.is_empty()
  }
}

/// Rows dropped for missing required keys, and optional fields omitted from
/// otherwise valid rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipCounts {
  pub rows:   u64,
  pub fields: u64,
}

impl SkipCounts {
  pub fn absorb(&mut self, other: SkipCounts) {
    self.rows += other.rows;
    self.fields += other.fields;
  }
}
