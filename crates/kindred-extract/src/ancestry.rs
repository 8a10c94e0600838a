//! Ancestry-schema normalization: one mapping function per source table.

use std::collections::HashSet;

use kindred_core::{
  ident::{IdentityResolver, composite_key},
  record::{
    CanonicalRecord, EthnicityRecord, IcwEdgeRecord, PersonRecord, Provider,
    Sex, TreeMetadataRecord, category, name_kind,
  },
};
use tracing::warn;

use crate::{
  context::{CrossRefContext, SkipCounts},
  rows::{IcwRow, KitRow, MatchEthnicityRow, MatchGroupRow, MatchTreeRow, TreeDataRow},
};

/// The relation-index value marking a match's own node in their tree.
const RELID_SELF: &str = "1";

/// Selected kits become self-profile records keyed by the kit guid.
pub fn normalize_kits(kits: &[KitRow]) -> Vec<CanonicalRecord> {
  kits
    .iter()
    .map(|kit| {
      let mut rec = PersonRecord::new(&kit.guid, kit.provider);
      rec.category = category::SELF_PROFILE;
      rec.given = kit.given.clone();
      rec.surname = kit.surname.clone();
      CanonicalRecord::SelfProfile(rec)
    })
    .collect()
}

pub struct AncestryNormalizer<'r> {
  ids:   &'r mut IdentityResolver,
  ctx:   CrossRefContext,
  skips: SkipCounts,
}

impl<'r> AncestryNormalizer<'r> {
  pub fn new(ids: &'r mut IdentityResolver) -> Self {
    Self { ids, ctx: CrossRefContext::default(), skips: SkipCounts::default() }
  }

  pub fn into_skips(self) -> SkipCounts {
    self.skips
  }

  /// Match groups. A group whose match has a linked tree row borrows that
  /// row's person/parent ids (and the match-with-tree category); otherwise
  /// the match guid itself seeds the surrogate and the no-tree category.
  pub fn match_groups(
    &mut self,
    groups: &[MatchGroupRow],
    trees: &[MatchTreeRow],
  ) -> Vec<CanonicalRecord> {
    let mut out = Vec::with_capacity(groups.len());
    for group in groups {
      let linked_tree = trees.iter().find(|t| {
        t.match_guid.as_deref() == Some(group.match_guid.as_str())
          && t.person_id.is_some()
      });

      let mut rec = PersonRecord::new(&group.match_guid, Provider::Ancestry);
      match linked_tree {
        Some(tree) => {
          rec.person_id = self.ids.surrogate_opt(tree.person_id.as_deref());
          rec.father_id = self.ids.surrogate_opt(tree.father_id.as_deref());
          rec.mother_id = self.ids.surrogate_opt(tree.mother_id.as_deref());
          rec.category = category::MATCH_WITH_TREE;
        }
        None => {
          rec.person_id = Some(self.ids.surrogate(&group.match_guid));
          rec.category = category::MATCH_NO_TREE;
        }
      }

      if group.display_name.is_none() {
        self.skips.fields += 1;
      }
      let (given, surname) =
        split_display_name(group.display_name.as_deref().unwrap_or(""));
      rec.given = given;
      rec.surname = surname;
      rec.sex = Sex::from_letter(group.subject_gender.as_deref());
      rec.shared_cm = group.shared_cm;
      rec.shared_segments = group.shared_segments;
      rec.note = group.note.clone();
      rec.test_guid = Some(group.test_guid.clone());
      rec.match_guid = Some(group.match_guid.clone());
      rec.created_date =
        group.created_date.clone().or_else(|| group.match_run_date.clone());

      self.ctx.remember(&rec);
      out.push(CanonicalRecord::Match(rec));
    }
    out
  }

  /// Ancestors out of match trees. The `relid == "1"` row is the match's own
  /// node: it keeps the match guid as its natural id and borrows name/sex
  /// from the already-normalized match record when the context has one.
  pub fn match_trees(&mut self, trees: &[MatchTreeRow]) -> Vec<CanonicalRecord> {
    // Structural sex evidence: ids that appear as someone's father or mother
    // link elsewhere in this batch.
    let father_ids: HashSet<&str> =
      trees.iter().filter_map(|t| t.father_id.as_deref()).collect();
    let mother_ids: HashSet<&str> =
      trees.iter().filter_map(|t| t.mother_id.as_deref()).collect();

    let mut out = Vec::with_capacity(trees.len());
    for tree in trees {
      let Some(match_guid) = tree.match_guid.as_deref() else {
        warn!(row = tree.id, "match-tree row without match guid, skipping");
        self.skips.rows += 1;
        continue;
      };

      let mut sex = Sex::Unknown;
      if let Some(person_id) = tree.person_id.as_deref() {
        if father_ids.contains(person_id) {
          sex = Sex::Male;
        } else if mother_ids.contains(person_id) {
          sex = Sex::Female;
        }
      }

      let is_self = tree.relid.as_deref() == Some(RELID_SELF);
      let natural_id = if is_self {
        match_guid.to_owned()
      } else {
        composite_key(&[
          tree.given.as_deref().unwrap_or(""),
          tree.surname.as_deref().unwrap_or(""),
          match_guid,
          tree.relid.as_deref().unwrap_or(""),
        ])
      };

      let mut rec = PersonRecord::new(natural_id, Provider::Ancestry);
      rec.person_id = self.ids.surrogate_opt(tree.person_id.as_deref());
      rec.father_id = self.ids.surrogate_opt(tree.father_id.as_deref());
      rec.mother_id = self.ids.surrogate_opt(tree.mother_id.as_deref());
      rec.category = category::TREE_ANCESTOR;
      rec.sex = sex;
      rec.given = tree.given.clone().unwrap_or_default();
      rec.surname = tree.surname.clone().unwrap_or_default();
      rec.name_kind = name_kind::ALTERNATE;
      rec.birth_date = tree.birth_date.clone();
      rec.birth_place = tree.birth_place.clone();
      rec.death_date = tree.death_date.clone();
      rec.death_place = tree.death_place.clone();
      rec.created_date = tree.created_date.clone();

      if is_self {
        rec.primary_subject = true;
        // The match record resolved this person already; its name and sex
        // outrank whatever the tree row carries.
        if let Some(resolved) = self.ctx.get(match_guid) {
          rec.given = resolved.given.clone();
          rec.surname = resolved.surname.clone();
          rec.sex = resolved.sex;
          rec.name_kind = name_kind::PRIMARY;
        }
      }

      out.push(CanonicalRecord::TreeAncestor(rec));
    }
    out
  }

  pub fn tree_data(&mut self, rows: &[TreeDataRow]) -> Vec<CanonicalRecord> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
      let Some(match_guid) = row.match_guid.clone() else {
        warn!(row = row.id, "tree-data row without guid, skipping");
        self.skips.rows += 1;
        continue;
      };
      out.push(CanonicalRecord::TreeMetadata(TreeMetadataRecord {
        provider:   Provider::Ancestry,
        match_guid,
        tree_id:    row.tree_id.clone(),
        tree_size:  row.tree_size,
        public:     row.public_tree.unwrap_or(0) != 0,
        private:    row.private_tree.unwrap_or(0) != 0,
      }));
    }
    out
  }

  pub fn icw(&mut self, rows: &[IcwRow]) -> Vec<CanonicalRecord> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
      let (Some(match_guid), Some(icw_guid)) =
        (row.match_guid.clone(), row.icw_guid.clone())
      else {
        warn!(row = row.id, "icw row missing a guid, skipping");
        self.skips.rows += 1;
        continue;
      };
      out.push(CanonicalRecord::IcwEdge(IcwEdgeRecord {
        provider:        Provider::Ancestry,
        match_guid,
        icw_guid,
        shared_cm:       row.shared_cm,
        shared_segments: row.shared_segments,
        created_date:    row.created_date.clone(),
      }));
    }
    out
  }

  pub fn ethnicity(
    &mut self,
    rows: &[MatchEthnicityRow],
  ) -> Vec<CanonicalRecord> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
      let Some(match_guid) = row.match_guid.clone() else {
        warn!(row = row.id, "ethnicity row without guid, skipping");
        self.skips.rows += 1;
        continue;
      };
      out.push(CanonicalRecord::Ethnicity(EthnicityRecord {
        provider:      Provider::Ancestry,
        match_guid,
        regions:       row.regions.clone(),
        trace_regions: row.trace_regions.clone(),
        percent:       row.percent,
      }));
    }
    out
  }
}

/// First word and last word of a display name; single-word names keep the
/// whole name as the given name.
pub(crate) fn split_display_name(name: &str) -> (String, String) {
  let words: Vec<&str> = name.split_whitespace().collect();
  match words.as_slice() {
    [] => (String::new(), String::new()),
    [only] => ((*only).to_owned(), String::new()),
    [first, .., last] => ((*first).to_owned(), (*last).to_owned()),
  }
}
