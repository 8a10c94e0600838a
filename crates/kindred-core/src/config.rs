//! Pipeline configuration.
//!
//! One immutable value passed in at construction; there are no global
//! switches. Field names double as the keys of the optional TOML config file
//! read by the CLI.

use serde::Deserialize;

/// Which source tables participate in a run, plus batching knobs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
  pub ancestry_match_groups: bool,
  pub ancestry_match_trees:  bool,
  pub ancestry_tree_data:    bool,
  pub ancestry_icw:          bool,
  pub ancestry_ethnicity:    bool,

  pub myheritage_matches:    bool,
  pub myheritage_ancestors:  bool,
  pub myheritage_icw:        bool,

  /// Cap on rows fetched per source table; 0 means no cap.
  pub row_limit:  u32,
  /// Rows per progress checkpoint inside a merge pass; 0 means only at pass
  /// end. Checkpoints are not transaction boundaries.
  pub batch_size: u32,
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self {
      ancestry_match_groups: true,
      ancestry_match_trees:  true,
      ancestry_tree_data:    true,
      ancestry_icw:          true,
      ancestry_ethnicity:    true,
      myheritage_matches:    false,
      myheritage_ancestors:  false,
      myheritage_icw:        false,
      row_limit:  0,
      batch_size: 0,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_enable_ancestry_only() {
    let cfg = PipelineConfig::default();
    assert!(cfg.ancestry_match_groups);
    assert!(!cfg.myheritage_matches);
    assert_eq!(cfg.row_limit, 0);
  }
}
