//! Plain row structs for the provider tables we read.
//!
//! Deliberately no ORM-style back-references: joins between rows are written
//! out explicitly by the normalizers. Column nullability follows the source
//! schemas, which are lax about almost everything.

use kindred_core::record::Provider;

/// A tester's registered kit or profile, from `Ancestry_Profiles` /
/// `DNA_Kits`.
#[derive(Debug, Clone)]
pub struct KitRow {
  pub provider: Provider,
  pub guid:     String,
  pub given:    String,
  pub surname:  String,
}

/// `Ancestry_matchGroups` — one row per (tester, match) pair.
#[derive(Debug, Clone)]
pub struct MatchGroupRow {
  pub id:              i64,
  pub test_guid:       String,
  pub match_guid:      String,
  pub display_name:    Option<String>,
  pub subject_gender:  Option<String>,
  pub group_name:      Option<String>,
  pub shared_cm:       Option<f64>,
  pub shared_segments: Option<i64>,
  pub note:            Option<String>,
  pub created_date:    Option<String>,
  pub match_run_date:  Option<String>,
}

/// `Ancestry_matchTrees` — ancestors out of a match's online tree. `relid`
/// is the relation index; `"1"` marks the match's own node.
#[derive(Debug, Clone)]
pub struct MatchTreeRow {
  pub id:           i64,
  pub match_guid:   Option<String>,
  pub given:        Option<String>,
  pub surname:      Option<String>,
  pub birth_date:   Option<String>,
  pub death_date:   Option<String>,
  pub birth_place:  Option<String>,
  pub death_place:  Option<String>,
  pub relid:        Option<String>,
  pub person_id:    Option<String>,
  pub father_id:    Option<String>,
  pub mother_id:    Option<String>,
  pub created_date: Option<String>,
}

/// `Ancestry_TreeData` — size/visibility metadata for a match's tree.
#[derive(Debug, Clone)]
pub struct TreeDataRow {
  pub id:           i64,
  pub match_guid:   Option<String>,
  pub tree_id:      Option<String>,
  pub tree_size:    Option<i64>,
  pub public_tree:  Option<i64>,
  pub private_tree: Option<i64>,
}

/// `Ancestry_ICW` — in-common-with edges between two matches.
#[derive(Debug, Clone)]
pub struct IcwRow {
  pub id:              i64,
  pub match_guid:      Option<String>,
  pub icw_guid:        Option<String>,
  pub shared_cm:       Option<f64>,
  pub shared_segments: Option<i64>,
  pub created_date:    Option<String>,
}

/// `Ancestry_matchEthnicity`.
#[derive(Debug, Clone)]
pub struct MatchEthnicityRow {
  pub id:            i64,
  pub match_guid:    Option<String>,
  pub regions:       Option<String>,
  pub trace_regions: Option<String>,
  pub percent:       Option<i64>,
}

/// `MH_Match`.
#[derive(Debug, Clone)]
pub struct MhMatchRow {
  pub id:           i64,
  pub guid:         Option<String>,
  pub name:         Option<String>,
  pub first_name:   Option<String>,
  pub last_name:    Option<String>,
  pub gender:       Option<String>,
  pub total_cm:     Option<f64>,
  pub num_segments: Option<i64>,
  pub notes:        Option<String>,
  pub created_date: Option<String>,
}

/// `MH_Ancestors` — tree ancestors; person ids are scoped per tree.
#[derive(Debug, Clone)]
pub struct MhAncestorRow {
  pub id:          i64,
  pub tree_id:     Option<i64>,
  pub match_guid:  Option<String>,
  pub given:       Option<String>,
  pub surname:     Option<String>,
  pub birth_date:  Option<String>,
  pub death_date:  Option<String>,
  pub birth_place: Option<String>,
  pub death_place: Option<String>,
  pub relid:       Option<String>,
  pub person_id:   Option<String>,
  pub father_id:   Option<String>,
  pub mother_id:   Option<String>,
  pub gender:      Option<String>,
}

/// `MH_ICW`.
#[derive(Debug, Clone)]
pub struct MhIcwRow {
  pub id:           i64,
  pub id1:          Option<String>,
  pub id2:          Option<String>,
  pub total_cm:     Option<f64>,
  pub num_segments: Option<i64>,
}
