//! Canonical records — the normalized, provenance-tagged intermediate
//! representation produced by the normalizer and consumed by the merge engine.
//!
//! Each provenance has its own struct with an explicit field set, so a
//! malformed source row is rejected at the normalizer boundary instead of
//! being discovered downstream.

use crate::{Error, Result};

// ─── Sex ─────────────────────────────────────────────────────────────────────

/// Biological sex as recorded by the target store (0 male, 1 female,
/// 2 unknown — the RootsMagic convention).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sex {
  Male,
  Female,
  #[default]
  Unknown,
}

impl Sex {
  pub fn code(self) -> i64 {
    match self {
      Self::Male => 0,
      Self::Female => 1,
      Self::Unknown => 2,
    }
  }

  pub fn from_code(code: i64) -> Result<Self> {
    match code {
      0 => Ok(Self::Male),
      1 => Ok(Self::Female),
      2 => Ok(Self::Unknown),
      other => Err(Error::UnknownSex(other)),
    }
  }

  /// Provider exports use a single letter; anything else is unknown.
  pub fn from_letter(letter: Option<&str>) -> Self {
    match letter.map(str::trim) {
      Some("M") | Some("m") => Self::Male,
      Some("F") | Some("f") => Self::Female,
      _ => Self::Unknown,
    }
  }
}

// ─── Provider ────────────────────────────────────────────────────────────────

/// A DNA-testing aggregator schema. The discriminants are the `DNAProvider`
/// codes used by the target store and the source kit registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
  Ancestry,
  Ftdna,
  MyHeritage,
}

impl Provider {
  pub fn code(self) -> i64 {
    match self {
      Self::Ancestry => 2,
      Self::Ftdna => 3,
      Self::MyHeritage => 5,
    }
  }

  pub fn from_code(code: i64) -> Result<Self> {
    match code {
      2 => Ok(Self::Ancestry),
      3 => Ok(Self::Ftdna),
      5 => Ok(Self::MyHeritage),
      other => Err(Error::UnknownProvider(other)),
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Self::Ancestry => "Ancestry",
      Self::Ftdna => "FTDNA",
      Self::MyHeritage => "MyHeritage",
    }
  }

  /// Provider-side comparison link recorded on DNA edges, when the provider
  /// has one.
  pub fn compare_url(self, test_guid: &str, match_guid: &str) -> Option<String> {
    match self {
      Self::Ancestry => Some(format!(
        "https://www.ancestry.com/discoveryui-matches/compare/{test_guid}/with/{match_guid}"
      )),
      _ => None,
    }
  }
}

// ─── Category colours ────────────────────────────────────────────────────────

/// Target-store colour codes used as category tags on person rows.
pub mod category {
  pub const SELF_PROFILE: i64 = 1;
  pub const MATCH_WITH_TREE: i64 = 18;
  pub const TREE_ANCESTOR: i64 = 24;
  pub const FTDNA: i64 = 26;
  pub const MATCH_NO_TREE: i64 = 27;
  pub const MYHERITAGE: i64 = 27;
}

// ─── Name kinds ──────────────────────────────────────────────────────────────

/// `NameTable.NameType` values: 0 is the primary name, 2 an alternate one.
pub mod name_kind {
  pub const PRIMARY: i64 = 0;
  pub const ALTERNATE: i64 = 2;
}

// ─── Person-shaped records ───────────────────────────────────────────────────

/// A person-shaped canonical record: a tester's own profile, a match, or an
/// ancestor out of a match's tree. The merge engine writes `family_id` back
/// into the record when it assigns one, so the same pass's later steps can
/// reference it.
#[derive(Debug, Clone)]
pub struct PersonRecord {
  /// Natural unique key: the provider guid, or a composite key when the
  /// provider issues none for the row.
  pub natural_id:      String,
  pub provider:        Provider,
  /// Resolved surrogate person id; `None` for rows that are looked up by
  /// natural key only.
  pub person_id:       Option<i64>,
  pub father_id:       Option<i64>,
  pub mother_id:       Option<i64>,
  /// Assigned lazily by the merge engine's family pass.
  pub family_id:       Option<i64>,
  pub sex:             Sex,
  /// Colour code, see [`category`].
  pub category:        i64,
  pub given:           String,
  pub surname:         String,
  /// `NameTable.NameType`, see [`name_kind`].
  pub name_kind:       i64,
  /// The provider's relation-index sentinel marked this row as the match's
  /// own node. Its person fields are protected from lower-confidence
  /// overwrites at merge time.
  pub primary_subject: bool,
  pub birth_date:      Option<String>,
  pub birth_place:     Option<String>,
  pub death_date:      Option<String>,
  pub death_place:     Option<String>,
  pub shared_cm:       Option<f64>,
  pub shared_segments: Option<i64>,
  pub note:            Option<String>,
  /// Guid pair consumed by the DNA-edge pass (tester kit and matched kit).
  pub test_guid:       Option<String>,
  pub match_guid:      Option<String>,
  pub created_date:    Option<String>,
}

impl PersonRecord {
  /// A record with every optional field empty; normalizers fill in what the
  /// source row actually provides.
  pub fn new(natural_id: impl Into<String>, provider: Provider) -> Self {
    Self {
      natural_id:      natural_id.into(),
      provider,
      person_id:       None,
      father_id:       None,
      mother_id:       None,
      family_id:       None,
      sex:             Sex::Unknown,
      category:        category::MATCH_NO_TREE,
      given:           String::new(),
      surname:         String::new(),
      name_kind:       name_kind::PRIMARY,
      primary_subject: false,
      birth_date:      None,
      birth_place:     None,
      death_date:      None,
      death_place:     None,
      shared_cm:       None,
      shared_segments: None,
      note:            None,
      test_guid:       None,
      match_guid:      None,
      created_date:    None,
    }
  }
}

// ─── Edge and satellite records ──────────────────────────────────────────────

/// An in-common-with edge: two tested individuals who both match a third.
#[derive(Debug, Clone)]
pub struct IcwEdgeRecord {
  pub provider:        Provider,
  pub match_guid:      String,
  pub icw_guid:        String,
  pub shared_cm:       Option<f64>,
  pub shared_segments: Option<i64>,
  pub created_date:    Option<String>,
}

/// Ethnicity estimate attached to a match; merged as an annotation on the
/// match's person row.
#[derive(Debug, Clone)]
pub struct EthnicityRecord {
  pub provider:      Provider,
  pub match_guid:    String,
  pub regions:       Option<String>,
  pub trace_regions: Option<String>,
  pub percent:       Option<i64>,
}

/// Size and visibility metadata for a match's online tree.
#[derive(Debug, Clone)]
pub struct TreeMetadataRecord {
  pub provider:   Provider,
  pub match_guid: String,
  pub tree_id:    Option<String>,
  pub tree_size:  Option<i64>,
  pub public:     bool,
  pub private:    bool,
}

// ─── CanonicalRecord ─────────────────────────────────────────────────────────

/// The canonical record, tagged by provenance.
#[derive(Debug, Clone)]
pub enum CanonicalRecord {
  SelfProfile(PersonRecord),
  Match(PersonRecord),
  TreeAncestor(PersonRecord),
  IcwEdge(IcwEdgeRecord),
  Ethnicity(EthnicityRecord),
  TreeMetadata(TreeMetadataRecord),
}

impl CanonicalRecord {
  /// The person payload, for the provenances that carry one.
  pub fn person(&self) -> Option<&PersonRecord> {
    match self {
      Self::SelfProfile(p) | Self::Match(p) | Self::TreeAncestor(p) => Some(p),
      _ => None,
    }
  }

  pub fn person_mut(&mut self) -> Option<&mut PersonRecord> {
    match self {
      Self::SelfProfile(p) | Self::Match(p) | Self::TreeAncestor(p) => Some(p),
      _ => None,
    }
  }

  pub fn provenance(&self) -> &'static str {
    match self {
      Self::SelfProfile(_) => "self-profile",
      Self::Match(_) => "match",
      Self::TreeAncestor(_) => "tree-ancestor",
      Self::IcwEdge(_) => "icw-edge",
      Self::Ethnicity(_) => "ethnicity",
      Self::TreeMetadata(_) => "tree-metadata",
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sex_codes_roundtrip() {
    for sex in [Sex::Male, Sex::Female, Sex::Unknown] {
      assert_eq!(Sex::from_code(sex.code()).unwrap(), sex);
    }
    assert!(Sex::from_code(7).is_err());
  }

  #[test]
  fn sex_from_provider_letter() {
    assert_eq!(Sex::from_letter(Some("F")), Sex::Female);
    assert_eq!(Sex::from_letter(Some("m")), Sex::Male);
    assert_eq!(Sex::from_letter(Some("x")), Sex::Unknown);
    assert_eq!(Sex::from_letter(None), Sex::Unknown);
  }

  #[test]
  fn provider_codes_match_store_convention() {
    assert_eq!(Provider::Ancestry.code(), 2);
    assert_eq!(Provider::MyHeritage.code(), 5);
    assert!(Provider::from_code(4).is_err());
  }

  #[test]
  fn compare_url_only_for_ancestry() {
    assert!(Provider::Ancestry.compare_url("a", "b").unwrap().contains("/a/with/b"));
    assert!(Provider::MyHeritage.compare_url("a", "b").is_none());
  }
}
