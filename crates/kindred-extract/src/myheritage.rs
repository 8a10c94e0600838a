//! MyHeritage-schema normalization.
//!
//! The MyHeritage tables carry stable guids of their own, so records keep
//! the raw guid as their natural id. Ancestor person ids are only unique
//! within one tree and get scoped with the tree id before surrogate lookup.

use std::collections::HashSet;

use kindred_core::{
  ident::{IdentityResolver, composite_key},
  record::{
    CanonicalRecord, IcwEdgeRecord, PersonRecord, Provider, Sex, category,
    name_kind,
  },
};
use tracing::warn;

use crate::{
  ancestry::split_display_name,
  context::{CrossRefContext, SkipCounts},
  rows::{MhAncestorRow, MhIcwRow, MhMatchRow},
};

const RELID_SELF: &str = "1";

pub struct MyHeritageNormalizer<'r> {
  ids:   &'r mut IdentityResolver,
  ctx:   CrossRefContext,
  skips: SkipCounts,
}

impl<'r> MyHeritageNormalizer<'r> {
  pub fn new(ids: &'r mut IdentityResolver) -> Self {
    Self { ids, ctx: CrossRefContext::default(), skips: SkipCounts::default() }
  }

  pub fn into_skips(self) -> SkipCounts {
    self.skips
  }

  pub fn matches(&mut self, rows: &[MhMatchRow]) -> Vec<CanonicalRecord> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
      let Some(guid) = row.guid.clone() else {
        warn!(row = row.id, "match row without guid, skipping");
        self.skips.rows += 1;
        continue;
      };

      let mut rec = PersonRecord::new(&guid, Provider::MyHeritage);
      rec.person_id = Some(self.ids.surrogate(&guid));
      rec.category = category::MYHERITAGE;
      rec.sex = Sex::from_letter(row.gender.as_deref());
      (rec.given, rec.surname) =
        match (row.first_name.clone(), row.last_name.clone()) {
          (None, None) => {
            if row.name.is_none() {
              self.skips.fields += 1;
            }
            split_display_name(row.name.as_deref().unwrap_or(""))
          }
          (first, last) => {
            (first.unwrap_or_default(), last.unwrap_or_default())
          }
        };
      rec.shared_cm = row.total_cm;
      rec.shared_segments = row.num_segments;
      rec.note = row.notes.clone();
      rec.match_guid = Some(guid);
      rec.created_date = row.created_date.clone();

      self.ctx.remember(&rec);
      out.push(CanonicalRecord::Match(rec));
    }
    out
  }

  pub fn ancestors(&mut self, rows: &[MhAncestorRow]) -> Vec<CanonicalRecord> {
    let father_ids: HashSet<String> =
      rows.iter().filter_map(scoped_id(|t| t.father_id.as_deref())).collect();
    let mother_ids: HashSet<String> =
      rows.iter().filter_map(scoped_id(|t| t.mother_id.as_deref())).collect();

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
      let (Some(tree_id), Some(person_id)) =
        (row.tree_id, row.person_id.as_deref())
      else {
        warn!(row = row.id, "ancestor row missing tree or person id, skipping");
        self.skips.rows += 1;
        continue;
      };
      let scoped = scope(tree_id, person_id);

      let mut sex = Sex::from_letter(row.gender.as_deref());
      if sex == Sex::Unknown {
        if father_ids.contains(&scoped) {
          sex = Sex::Male;
        } else if mother_ids.contains(&scoped) {
          sex = Sex::Female;
        }
      }

      let is_self = row.relid.as_deref() == Some(RELID_SELF);
      let resolved_match = if is_self {
        row.match_guid.as_deref().and_then(|g| self.ctx.get(g))
      } else {
        None
      };

      let natural_id = match (&resolved_match, row.match_guid.as_deref()) {
        (Some(_), Some(guid)) => guid.to_owned(),
        _ => composite_key(&[&tree_id.to_string(), person_id]),
      };

      let mut rec = PersonRecord::new(natural_id, Provider::MyHeritage);
      rec.person_id = Some(self.ids.surrogate(&scoped));
      rec.father_id = self
        .ids
        .surrogate_opt(row.father_id.as_deref().map(|id| scope(tree_id, id)).as_deref());
      rec.mother_id = self
        .ids
        .surrogate_opt(row.mother_id.as_deref().map(|id| scope(tree_id, id)).as_deref());
      rec.category = category::MYHERITAGE;
      rec.sex = sex;
      rec.given = row.given.clone().unwrap_or_default();
      rec.surname = row.surname.clone().unwrap_or_default();
      rec.name_kind = name_kind::ALTERNATE;
      rec.birth_date = row.birth_date.clone();
      rec.birth_place = row.birth_place.clone();
      rec.death_date = row.death_date.clone();
      rec.death_place = row.death_place.clone();

      if let Some(resolved) = resolved_match {
        rec.primary_subject = true;
        rec.given = resolved.given.clone();
        rec.surname = resolved.surname.clone();
        rec.sex = resolved.sex;
        rec.name_kind = name_kind::PRIMARY;
      }

      out.push(CanonicalRecord::TreeAncestor(rec));
    }
    out
  }

  pub fn icw(&mut self, rows: &[MhIcwRow]) -> Vec<CanonicalRecord> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
      let (Some(id1), Some(id2)) = (row.id1.clone(), row.id2.clone()) else {
        warn!(row = row.id, "icw row missing a guid, skipping");
        self.skips.rows += 1;
        continue;
      };
      out.push(CanonicalRecord::IcwEdge(IcwEdgeRecord {
        provider:        Provider::MyHeritage,
        match_guid:      id1,
        icw_guid:        id2,
        shared_cm:       row.total_cm,
        shared_segments: row.num_segments,
        created_date:    None,
      }));
    }
    out
  }
}

fn scope(tree_id: i64, person_id: &str) -> String {
  format!("{tree_id}/{person_id}")
}

fn scoped_id(
  pick: impl Fn(&MhAncestorRow) -> Option<&str>,
) -> impl Fn(&MhAncestorRow) -> Option<String> {
  move |row| Some(scope(row.tree_id?, pick(row)?))
}
