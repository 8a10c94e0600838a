//! Extraction and normalization: provider-specific source rows in, canonical
//! records out.
//!
//! The source store is read-only here. The orchestrator hands this crate a
//! pre-filtered set of row ids per table (see [`fetch::FilteredIds`]); nothing
//! in this crate scans a full table on its own initiative.

pub mod ancestry;
pub mod context;
pub mod error;
pub mod fetch;
pub mod myheritage;
pub mod rows;

pub use error::{Error, Result};

use kindred_core::{
  config::PipelineConfig, ident::IdentityResolver, record::CanonicalRecord,
};

use crate::{
  ancestry::AncestryNormalizer, context::SkipCounts, fetch::FilteredIds,
  fetch::SourceDb, myheritage::MyHeritageNormalizer, rows::KitRow,
};

/// Fetch and normalize every enabled source table for the selected kits.
///
/// Pass order within a provider matters: match groups come first so that
/// later rows can borrow resolved name/sex data from them through the
/// cross-reference context.
pub fn normalize_all(
  source: &SourceDb,
  cfg: &PipelineConfig,
  kits: &[KitRow],
  ids: &FilteredIds,
  resolver: &mut IdentityResolver,
) -> Result<(Vec<CanonicalRecord>, SkipCounts)> {
  let mut records = Vec::new();
  let mut skips = SkipCounts::default();

  // Selected kits become self-profile records so the kit owners exist in the
  // target before the DNA pass pairs edges against them.
  records.extend(ancestry::normalize_kits(kits));

  let mut anc = AncestryNormalizer::new(resolver);
  if cfg.ancestry_match_groups {
    let groups = source.match_groups(&ids.match_groups, cfg.row_limit)?;
    let trees = source.match_trees(&ids.match_trees, cfg.row_limit)?;
    records.extend(anc.match_groups(&groups, &trees));

    if cfg.ancestry_match_trees {
      records.extend(anc.match_trees(&trees));
    }
  }
  if cfg.ancestry_tree_data {
    let rows = source.tree_data(&ids.tree_data, cfg.row_limit)?;
    records.extend(anc.tree_data(&rows));
  }
  if cfg.ancestry_icw {
    let rows = source.icw(&ids.icw, cfg.row_limit)?;
    records.extend(anc.icw(&rows));
  }
  if cfg.ancestry_ethnicity {
    let rows = source.match_ethnicity(&ids.ethnicity, cfg.row_limit)?;
    records.extend(anc.ethnicity(&rows));
  }
  skips.absorb(anc.into_skips());

  let mut mh = MyHeritageNormalizer::new(resolver);
  if cfg.myheritage_matches {
    let rows = source.mh_matches(&ids.mh_matches, cfg.row_limit)?;
    records.extend(mh.matches(&rows));
  }
  if cfg.myheritage_ancestors {
    let rows = source.mh_ancestors(&ids.mh_ancestors, cfg.row_limit)?;
    records.extend(mh.ancestors(&rows));
  }
  if cfg.myheritage_icw {
    let rows = source.mh_icw(&ids.mh_icw, cfg.row_limit)?;
    records.extend(mh.icw(&rows));
  }
  skips.absorb(mh.into_skips());

  tracing::info!(
    records = records.len(),
    rows_skipped = skips.rows,
    fields_skipped = skips.fields,
    "normalization complete"
  );
  Ok((records, skips))
}
