//! Read access to the source (DNAGedcom-style) SQLite store.
//!
//! Every row fetch goes through a pre-filtered primary-key id list supplied
//! by the orchestrator; `IN (...)` lists are chunked to stay under SQLite's
//! bound-parameter ceiling, and an optional row cap is honoured per table.

use kindred_core::{config::PipelineConfig, record::Provider};
use rusqlite::{Connection, Row};
use std::path::Path;

use crate::{
  Result,
  rows::{
    IcwRow, KitRow, MatchEthnicityRow, MatchGroupRow, MatchTreeRow,
    MhAncestorRow, MhIcwRow, MhMatchRow, TreeDataRow,
  },
};

/// SQLite's default bound-parameter limit.
const MAX_PARAMS: usize = 999;

/// Pre-filtered primary-key ids per source table, as produced by
/// [`SourceDb::filter_selected_kits`].
#[derive(Debug, Clone, Default)]
pub struct FilteredIds {
  pub match_groups: Vec<i64>,
  pub match_trees:  Vec<i64>,
  pub tree_data:    Vec<i64>,
  pub icw:          Vec<i64>,
  pub ethnicity:    Vec<i64>,
  pub mh_matches:   Vec<i64>,
  pub mh_ancestors: Vec<i64>,
  pub mh_icw:       Vec<i64>,
}

/// Read-only handle on the source store.
pub struct SourceDb {
  conn: Connection,
}

impl SourceDb {
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = Connection::open(path)?;
    Ok(Self { conn })
  }

  /// In-memory source, for tests and fixtures.
  pub fn open_in_memory() -> Result<Self> {
    Ok(Self { conn: Connection::open_in_memory()? })
  }

  pub fn conn(&self) -> &Connection {
    &self.conn
  }

  // ── Kit discovery ─────────────────────────────────────────────────────────

  /// Registered kits across providers: Ancestry profiles plus FTDNA and
  /// MyHeritage entries of the kit registry. MyHeritage guids carry a
  /// `dnakit-` prefix and a parenthesised suffix on the name; both are
  /// stripped.
  pub fn user_kits(&self) -> Result<Vec<KitRow>> {
    let mut kits = Vec::new();

    let mut stmt =
      self.conn.prepare("SELECT guid, name FROM Ancestry_Profiles")?;
    let profiles = stmt.query_map([], |row| {
      Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
    })?;
    for profile in profiles {
      let (guid, name) = profile?;
      let (given, surname) = split_kit_name(name.as_deref().unwrap_or(""));
      kits.push(KitRow { provider: Provider::Ancestry, guid, given, surname });
    }

    let mut stmt = self.conn.prepare(
      "SELECT company, guid, name FROM DNA_Kits
       WHERE company IN ('FTDNA', 'MyHeritage')",
    )?;
    let rows = stmt.query_map([], |row| {
      Ok((
        row.get::<_, String>(0)?,
        row.get::<_, String>(1)?,
        row.get::<_, Option<String>>(2)?,
      ))
    })?;
    for row in rows {
      let (company, mut guid, name) = row?;
      let mut name = name.unwrap_or_default();
      let provider = if company == "MyHeritage" {
        guid = guid.trim_start_matches("dnakit-").to_owned();
        name = strip_parenthesised(&name);
        Provider::MyHeritage
      } else {
        Provider::Ftdna
      };
      let (given, surname) = split_kit_name(name.trim());
      kits.push(KitRow { provider, guid, given, surname });
    }

    tracing::debug!(kits = kits.len(), "discovered kits");
    Ok(kits)
  }

  // ── Kit filtering ─────────────────────────────────────────────────────────

  /// Resolve the selected kits to the row ids each enabled table will
  /// process. Tree rows chain through the match guids of the selected match
  /// groups, not just the kit guids, so a match's own ancestors are included.
  pub fn filter_selected_kits(
    &self,
    kits: &[KitRow],
    cfg: &PipelineConfig,
  ) -> Result<FilteredIds> {
    let guids: Vec<String> = kits.iter().map(|k| k.guid.clone()).collect();
    let mut ids = FilteredIds::default();

    let mut match_guids = Vec::new();
    if cfg.ancestry_match_groups {
      ids.match_groups = self.ids_in(
        "SELECT Id FROM Ancestry_matchGroups WHERE testGuid IN",
        &guids,
      )?;
      match_guids = self.strings_in(
        "SELECT matchGuid FROM Ancestry_matchGroups WHERE testGuid IN",
        &guids,
      )?;

      if cfg.ancestry_match_trees {
        let mut chained = guids.clone();
        chained.extend(match_guids.iter().cloned());
        ids.match_trees = self.ids_in(
          "SELECT Id FROM Ancestry_matchTrees WHERE matchid IN",
          &chained,
        )?;
      }
    }
    if cfg.ancestry_tree_data {
      ids.tree_data = self
        .ids_in("SELECT Id FROM Ancestry_TreeData WHERE TestGuid IN", &guids)?;
    }
    if cfg.ancestry_icw {
      ids.icw = self
        .ids_in("SELECT Id FROM Ancestry_ICW WHERE matchid IN", &match_guids)?;
    }
    if cfg.ancestry_ethnicity {
      ids.ethnicity = self.ids_in(
        "SELECT Id FROM Ancestry_matchEthnicity WHERE matchGuid IN",
        &match_guids,
      )?;
    }

    if cfg.myheritage_matches {
      ids.mh_matches =
        self.ids_in("SELECT Id FROM MH_Match WHERE guid IN", &guids)?;
    }
    if cfg.myheritage_ancestors {
      ids.mh_ancestors =
        self.ids_in("SELECT Id FROM MH_Ancestors WHERE matchid IN", &guids)?;
    }
    if cfg.myheritage_icw {
      ids.mh_icw = self.ids_in("SELECT Id FROM MH_ICW WHERE id1 IN", &guids)?;
    }

    Ok(ids)
  }

  // ── Row fetches ───────────────────────────────────────────────────────────

  pub fn match_groups(
    &self,
    ids: &[i64],
    limit: u32,
  ) -> Result<Vec<MatchGroupRow>> {
    self.rows_by_id(
      "SELECT Id, testGuid, matchGuid, matchTestDisplayName, subjectGender,
              groupName, sharedCentimorgans, sharedSegment, note,
              created_date, matchRunDate
       FROM Ancestry_matchGroups WHERE Id IN",
      ids,
      limit,
      |row| {
        Ok(MatchGroupRow {
          id:              row.get(0)?,
          test_guid:       row.get(1)?,
          match_guid:      row.get(2)?,
          display_name:    row.get(3)?,
          subject_gender:  row.get(4)?,
          group_name:      row.get(5)?,
          shared_cm:       row.get(6)?,
          shared_segments: row.get(7)?,
          note:            row.get(8)?,
          created_date:    row.get(9)?,
          match_run_date:  row.get(10)?,
        })
      },
    )
  }

  pub fn match_trees(
    &self,
    ids: &[i64],
    limit: u32,
  ) -> Result<Vec<MatchTreeRow>> {
    self.rows_by_id(
      "SELECT Id, matchid, given, surname, birthdate, deathdate, birthplace,
              deathplace, relid, personId, fatherId, motherId, created_date
       FROM Ancestry_matchTrees WHERE Id IN",
      ids,
      limit,
      |row| {
        Ok(MatchTreeRow {
          id:           row.get(0)?,
          match_guid:   row.get(1)?,
          given:        row.get(2)?,
          surname:      row.get(3)?,
          birth_date:   row.get(4)?,
          death_date:   row.get(5)?,
          birth_place:  row.get(6)?,
          death_place:  row.get(7)?,
          relid:        row.get(8)?,
          person_id:    row.get(9)?,
          father_id:    row.get(10)?,
          mother_id:    row.get(11)?,
          created_date: row.get(12)?,
        })
      },
    )
  }

  pub fn tree_data(&self, ids: &[i64], limit: u32) -> Result<Vec<TreeDataRow>> {
    self.rows_by_id(
      "SELECT Id, TestGuid, TreeId, TreeSize, PublicTree, PrivateTree
       FROM Ancestry_TreeData WHERE Id IN",
      ids,
      limit,
      |row| {
        Ok(TreeDataRow {
          id:           row.get(0)?,
          match_guid:   row.get(1)?,
          tree_id:      row.get(2)?,
          tree_size:    row.get(3)?,
          public_tree:  row.get(4)?,
          private_tree: row.get(5)?,
        })
      },
    )
  }

  pub fn icw(&self, ids: &[i64], limit: u32) -> Result<Vec<IcwRow>> {
    self.rows_by_id(
      "SELECT Id, matchid, icwid, sharedCentimorgans, numSharedSegments,
              created_date
       FROM Ancestry_ICW WHERE Id IN",
      ids,
      limit,
      |row| {
        Ok(IcwRow {
          id:              row.get(0)?,
          match_guid:      row.get(1)?,
          icw_guid:        row.get(2)?,
          shared_cm:       row.get(3)?,
          shared_segments: row.get(4)?,
          created_date:    row.get(5)?,
        })
      },
    )
  }

  pub fn match_ethnicity(
    &self,
    ids: &[i64],
    limit: u32,
  ) -> Result<Vec<MatchEthnicityRow>> {
    self.rows_by_id(
      "SELECT Id, matchGuid, ethnicregions, ethnictraceregions, percent
       FROM Ancestry_matchEthnicity WHERE Id IN",
      ids,
      limit,
      |row| {
        Ok(MatchEthnicityRow {
          id:            row.get(0)?,
          match_guid:    row.get(1)?,
          regions:       row.get(2)?,
          trace_regions: row.get(3)?,
          percent:       row.get(4)?,
        })
      },
    )
  }

  pub fn mh_matches(&self, ids: &[i64], limit: u32) -> Result<Vec<MhMatchRow>> {
    self.rows_by_id(
      "SELECT Id, guid, name, first_name, last_name, gender, totalCM,
              num_segments, notes, CreatedDate
       FROM MH_Match WHERE Id IN",
      ids,
      limit,
      |row| {
        Ok(MhMatchRow {
          id:           row.get(0)?,
          guid:         row.get(1)?,
          name:         row.get(2)?,
          first_name:   row.get(3)?,
          last_name:    row.get(4)?,
          gender:       row.get(5)?,
          total_cm:     row.get(6)?,
          num_segments: row.get(7)?,
          notes:        row.get(8)?,
          created_date: row.get(9)?,
        })
      },
    )
  }

  pub fn mh_ancestors(
    &self,
    ids: &[i64],
    limit: u32,
  ) -> Result<Vec<MhAncestorRow>> {
    self.rows_by_id(
      "SELECT Id, TreeId, matchid, given, surname, birthdate, deathdate,
              birthplace, deathplace, relid, personId, fatherId, motherId,
              gender
       FROM MH_Ancestors WHERE Id IN",
      ids,
      limit,
      |row| {
        Ok(MhAncestorRow {
          id:          row.get(0)?,
          tree_id:     row.get(1)?,
          match_guid:  row.get(2)?,
          given:       row.get(3)?,
          surname:     row.get(4)?,
          birth_date:  row.get(5)?,
          death_date:  row.get(6)?,
          birth_place: row.get(7)?,
          death_place: row.get(8)?,
          relid:       row.get(9)?,
          person_id:   row.get(10)?,
          father_id:   row.get(11)?,
          mother_id:   row.get(12)?,
          gender:      row.get(13)?,
        })
      },
    )
  }

  pub fn mh_icw(&self, ids: &[i64], limit: u32) -> Result<Vec<MhIcwRow>> {
    self.rows_by_id(
      "SELECT Id, id1, id2, totalCM, num_segments FROM MH_ICW WHERE Id IN",
      ids,
      limit,
      |row| {
        Ok(MhIcwRow {
          id:           row.get(0)?,
          id1:          row.get(1)?,
          id2:          row.get(2)?,
          total_cm:     row.get(3)?,
          num_segments: row.get(4)?,
        })
      },
    )
  }

  // ── Batched IN helpers ────────────────────────────────────────────────────

  fn rows_by_id<T>(
    &self,
    sql_prefix: &str,
    ids: &[i64],
    limit: u32,
    map: impl Fn(&Row<'_>) -> rusqlite::Result<T>,
  ) -> Result<Vec<T>> {
    let mut out = Vec::new();
    for chunk in ids.chunks(MAX_PARAMS) {
      if limit > 0 && out.len() >= limit as usize {
        break;
      }
      let sql = format!("{sql_prefix} ({})", placeholders(chunk.len()));
      let mut stmt = self.conn.prepare(&sql)?;
      let rows = stmt.query_map(rusqlite::params_from_iter(chunk.iter()), &map)?;
      for row in rows {
        out.push(row?);
      }
    }
    if limit > 0 {
      out.truncate(limit as usize);
    }
    Ok(out)
  }

  fn ids_in(&self, sql_prefix: &str, keys: &[String]) -> Result<Vec<i64>> {
    self.column_in(sql_prefix, keys)
  }

  fn strings_in(
    &self,
    sql_prefix: &str,
    keys: &[String],
  ) -> Result<Vec<String>> {
    self.column_in(sql_prefix, keys)
  }

  fn column_in<T: rusqlite::types::FromSql>(
    &self,
    sql_prefix: &str,
    keys: &[String],
  ) -> Result<Vec<T>> {
    let mut out = Vec::new();
    for chunk in keys.chunks(MAX_PARAMS) {
      let sql = format!("{sql_prefix} ({})", placeholders(chunk.len()));
      let mut stmt = self.conn.prepare(&sql)?;
      let rows = stmt
        .query_map(rusqlite::params_from_iter(chunk.iter()), |row| row.get(0))?;
      for row in rows {
        out.push(row?);
      }
    }
    Ok(out)
  }
}

fn placeholders(n: usize) -> String {
  vec!["?"; n].join(", ")
}

/// Split a display name into (given, surname) on the last space.
fn split_kit_name(name: &str) -> (String, String) {
  match name.rsplit_once(' ') {
    Some((given, surname)) => (given.to_owned(), surname.to_owned()),
    None => (name.to_owned(), String::new()),
  }
}

/// Drop a `(...)` run from a kit name, e.g. `"Jane Doe (transferred)"`.
fn strip_parenthesised(name: &str) -> String {
  match (name.find('('), name.rfind(')')) {
    (Some(open), Some(close)) if close > open => {
      format!("{}{}", &name[..open], &name[close + 1..])
        .trim()
        .to_owned()
    }
    _ => name.to_owned(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn kit_name_splits_on_last_space() {
    assert_eq!(
      split_kit_name("Mary Ann Smith"),
      ("Mary Ann".to_owned(), "Smith".to_owned())
    );
    assert_eq!(split_kit_name("Cher"), ("Cher".to_owned(), String::new()));
  }

  #[test]
  fn parenthesised_suffix_is_stripped() {
    assert_eq!(strip_parenthesised("Jane Doe (transferred)"), "Jane Doe");
    assert_eq!(strip_parenthesised("Jane Doe"), "Jane Doe");
  }

  #[test]
  fn placeholder_lists() {
    assert_eq!(placeholders(1), "?");
    assert_eq!(placeholders(3), "?, ?, ?");
  }
}
