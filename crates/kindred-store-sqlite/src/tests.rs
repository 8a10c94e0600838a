//! Merge-engine tests against an in-memory target database.

use chrono::{TimeZone, Utc};

use kindred_core::{
  clock::{Clock, FixedClock},
  config::PipelineConfig,
  ident::IdentityResolver,
  record::{CanonicalRecord, IcwEdgeRecord, PersonRecord, Provider, Sex, category},
};

use crate::{Error, GraphStore, MergeEngine};

fn clock() -> FixedClock {
  FixedClock(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap())
}

fn engine() -> MergeEngine<FixedClock> {
  MergeEngine::new(GraphStore::open_in_memory().unwrap(), clock(), 0)
}

fn count(store: &GraphStore, sql: &str) -> i64 {
  store.conn().query_row(sql, [], |row| row.get(0)).unwrap()
}

fn ancestor(natural_id: &str, person_id: i64) -> PersonRecord {
  let mut rec = PersonRecord::new(natural_id, Provider::Ancestry);
  rec.person_id = Some(person_id);
  rec.category = category::TREE_ANCESTOR;
  rec.given = "Amos".into();
  rec.surname = "Hale".into();
  rec
}

// ─── Family pass ─────────────────────────────────────────────────────────────

#[test]
fn family_rows_are_idempotent_across_runs() {
  let father = ancestor("f-1", 600);
  let mut child = ancestor("c-1", 500);
  child.father_id = Some(600);

  let mut records = vec![
    CanonicalRecord::TreeAncestor(father),
    CanonicalRecord::TreeAncestor(child),
  ];

  let mut eng = engine();
  eng.run(&mut records).unwrap();
  eng.run(&mut records).unwrap();

  let store = eng.into_store();
  assert_eq!(count(&store, "SELECT COUNT(*) FROM FamilyTable"), 1);
  assert_eq!(count(&store, "SELECT COUNT(*) FROM ChildTable"), 1);

  let family_id: i64 = store
    .conn()
    .query_row("SELECT FamilyID FROM FamilyTable", [], |row| row.get(0))
    .unwrap();
  let parent_of_child: i64 = store
    .conn()
    .query_row(
      "SELECT ParentID FROM PersonTable WHERE PersonID = 500",
      [],
      |row| row.get(0),
    )
    .unwrap();
  assert_eq!(parent_of_child, family_id);

  // The father row did not exist during the first family pass; the second
  // run fixes the backlink.
  let spouse_of_father: i64 = store
    .conn()
    .query_row(
      "SELECT SpouseID FROM PersonTable WHERE PersonID = 600",
      [],
      |row| row.get(0),
    )
    .unwrap();
  assert_eq!(spouse_of_father, family_id);
}

#[test]
fn family_and_child_skips_are_counted_not_fatal() {
  // Parent link but no resolvable person id.
  let mut orphan = ancestor("o-1", 0);
  orphan.person_id = None;
  orphan.father_id = Some(601);

  let mut records = vec![CanonicalRecord::TreeAncestor(orphan)];
  let mut eng = engine();
  let report = eng.run(&mut records).unwrap();

  assert_eq!(report.families.skipped, 1);
  assert_eq!(report.children.skipped, 1);
  // The person itself still lands, by natural id.
  let store = eng.into_store();
  assert_eq!(count(&store, "SELECT COUNT(*) FROM PersonTable"), 1);
}

// ─── Person pass ─────────────────────────────────────────────────────────────

#[test]
fn primary_subject_rows_keep_resolved_fields() {
  let mut matched = PersonRecord::new("m-1", Provider::Ancestry);
  matched.person_id = Some(800);
  matched.sex = Sex::Female;
  matched.category = category::MATCH_NO_TREE;
  matched.given = "Jane".into();
  matched.surname = "Hale".into();

  let mut own_node = ancestor("m-1", 800);
  own_node.primary_subject = true;
  own_node.sex = Sex::Unknown;

  let mut records = vec![
    CanonicalRecord::Match(matched),
    CanonicalRecord::TreeAncestor(own_node),
  ];
  let mut eng = engine();
  eng.run(&mut records).unwrap();

  let store = eng.into_store();
  let (sex, color): (i64, i64) = store
    .conn()
    .query_row(
      "SELECT Sex, Color FROM PersonTable WHERE PersonID = 800",
      [],
      |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .unwrap();
  assert_eq!(sex, Sex::Female.code());
  assert_eq!(color, category::MATCH_NO_TREE);
  assert_eq!(count(&store, "SELECT COUNT(*) FROM PersonTable"), 1);
}

#[test]
fn person_timestamps_come_from_the_clock() {
  let mut records = vec![CanonicalRecord::TreeAncestor(ancestor("a-1", 700))];
  let mut eng = engine();
  eng.run(&mut records).unwrap();

  let store = eng.into_store();
  let stamp: f64 = store
    .conn()
    .query_row(
      "SELECT UTCModDate FROM PersonTable WHERE PersonID = 700",
      [],
      |row| row.get(0),
    )
    .unwrap();
  assert!((stamp - clock().mod_date()).abs() < 1e-9);
}

// ─── Name pass ───────────────────────────────────────────────────────────────

#[test]
fn names_are_overwritten_wholesale() {
  let mut records = vec![CanonicalRecord::TreeAncestor(ancestor("a-1", 900))];
  let mut eng = engine();
  eng.run(&mut records).unwrap();

  if let Some(person) = records[0].person_mut() {
    person.given = "Amos B".into();
    person.surname = "Hale Jr".into();
  }
  eng.run(&mut records).unwrap();

  let store = eng.into_store();
  assert_eq!(count(&store, "SELECT COUNT(*) FROM NameTable"), 1);
  let (given, surname, sort_date): (String, String, i64) = store
    .conn()
    .query_row(
      "SELECT Given, Surname, SortDate FROM NameTable WHERE OwnerID = 900",
      [],
      |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )
    .unwrap();
  assert_eq!(given, "Amos B");
  assert_eq!(surname, "Hale Jr");
  assert_eq!(sort_date, i64::MAX);
}

#[test]
fn rmnocase_collation_is_registered() {
  let store = GraphStore::open_in_memory().unwrap();
  store
    .conn()
    .execute(
      "INSERT INTO NameTable (OwnerID, Surname, Given) VALUES (1, 'HALE', 'AMOS')",
      [],
    )
    .unwrap();
  let found: i64 = store
    .conn()
    .query_row(
      "SELECT COUNT(*) FROM NameTable WHERE Surname = 'hale'",
      [],
      |row| row.get(0),
    )
    .unwrap();
  assert_eq!(found, 1);
}

// ─── DNA pass ────────────────────────────────────────────────────────────────

#[test]
fn dna_pairs_are_unordered() {
  let mut kit = PersonRecord::new("kit-1", Provider::Ancestry);
  kit.category = category::SELF_PROFILE;
  kit.given = "Tester".into();

  let mut matched = PersonRecord::new("m-1", Provider::Ancestry);
  matched.person_id = Some(700);
  matched.category = category::MATCH_NO_TREE;
  matched.shared_cm = Some(100.0);
  matched.shared_segments = Some(5);
  matched.test_guid = Some("kit-1".into());
  matched.match_guid = Some("m-1".into());

  let mut records = vec![
    CanonicalRecord::SelfProfile(kit),
    CanonicalRecord::Match(matched),
  ];
  let mut eng = engine();
  eng.run(&mut records).unwrap();

  // The same pair again, seen from the other side.
  let mut reversed = vec![CanonicalRecord::IcwEdge(IcwEdgeRecord {
    provider:        Provider::Ancestry,
    match_guid:      "m-1".into(),
    icw_guid:        "kit-1".into(),
    shared_cm:       Some(100.0),
    shared_segments: Some(5),
    created_date:    None,
  })];
  eng.run(&mut reversed).unwrap();

  let store = eng.into_store();
  assert_eq!(count(&store, "SELECT COUNT(*) FROM DNATable"), 1);

  let (percent, note): (f64, String) = store
    .conn()
    .query_row(
      "SELECT SharedPercent, Note FROM DNATable",
      [],
      |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .unwrap();
  assert!((percent - 1.45).abs() < 1e-9);
  assert!(note.contains("/m-1/with/kit-1"));
}

#[test]
fn failed_pass_halts_the_run_but_earlier_commits_stand() {
  let mut records = vec![CanonicalRecord::TreeAncestor(ancestor("a-1", 700))];
  let mut eng = engine();
  eng.run(&mut records).unwrap();

  // Sabotage the name pass; the person pass before it must still commit.
  let store = eng.into_store();
  store.conn().execute_batch("DROP TABLE NameTable").unwrap();

  let mut eng = MergeEngine::new(store, clock(), 0);
  let err = eng.run(&mut records).unwrap_err();
  assert!(matches!(err, Error::Pass { pass: "name", .. }));

  let store = eng.into_store();
  assert_eq!(count(&store, "SELECT COUNT(*) FROM PersonTable"), 1);
  assert_eq!(count(&store, "SELECT COUNT(*) FROM FamilyTable"), 0);
}

#[test]
fn matches_without_a_tester_guid_are_not_counted_as_skips() {
  // MyHeritage match rows have no tester guid column at all.
  let mut matched = PersonRecord::new("mh-1", Provider::MyHeritage);
  matched.person_id = Some(710);
  matched.category = category::MYHERITAGE;
  matched.match_guid = Some("mh-1".into());

  let mut records = vec![CanonicalRecord::Match(matched)];
  let mut eng = engine();
  let report = eng.run(&mut records).unwrap();
  assert_eq!(report.dna_edges.skipped, 0);
  assert_eq!(count(&eng.into_store(), "SELECT COUNT(*) FROM DNATable"), 0);
}

#[test]
fn dna_edges_without_resolvable_persons_are_skipped() {
  let mut records = vec![CanonicalRecord::IcwEdge(IcwEdgeRecord {
    provider:        Provider::Ancestry,
    match_guid:      "nobody-1".into(),
    icw_guid:        "nobody-2".into(),
    shared_cm:       None,
    shared_segments: None,
    created_date:    None,
  })];
  let mut eng = engine();
  let report = eng.run(&mut records).unwrap();
  assert_eq!(report.dna_edges.skipped, 1);
  assert_eq!(count(&eng.into_store(), "SELECT COUNT(*) FROM DNATable"), 0);
}

// ─── Event/place pass ────────────────────────────────────────────────────────

#[test]
fn events_encode_dates_and_share_places() {
  let mut a = ancestor("a-1", 901);
  a.birth_date = Some("12 jan 1756".into());
  a.birth_place = Some("Kentucky".into());
  let mut b = ancestor("b-1", 902);
  b.birth_date = Some("abt 1756".into());
  b.birth_place = Some("Kentucky".into());

  let mut records = vec![
    CanonicalRecord::TreeAncestor(a),
    CanonicalRecord::TreeAncestor(b),
  ];
  let mut eng = engine();
  eng.run(&mut records).unwrap();
  eng.run(&mut records).unwrap();

  let store = eng.into_store();
  assert_eq!(count(&store, "SELECT COUNT(*) FROM PlaceTable"), 1);
  assert_eq!(count(&store, "SELECT COUNT(*) FROM EventTable"), 2);

  let date_a: String = store
    .conn()
    .query_row(
      "SELECT Date FROM EventTable WHERE OwnerID = 901",
      [],
      |row| row.get(0),
    )
    .unwrap();
  assert_eq!(date_a, "D.+17560112..+00000000..");

  let date_b: String = store
    .conn()
    .query_row(
      "SELECT Date FROM EventTable WHERE OwnerID = 902",
      [],
      |row| row.get(0),
    )
    .unwrap();
  assert_eq!(date_b, "D.+17560000.A+00000000..");
}

// ─── Fact type ───────────────────────────────────────────────────────────────

#[test]
fn dna_kit_fact_type_is_upserted_in_place() {
  let store = GraphStore::open_in_memory().unwrap();
  store.ensure_dna_kit_fact_type(&clock()).unwrap();
  store.ensure_dna_kit_fact_type(&clock()).unwrap();

  assert_eq!(count(&store, "SELECT COUNT(*) FROM FactTypeTable"), 1);
  let (tag, flags): (String, i64) = store
    .conn()
    .query_row(
      "SELECT GedcomTag, Flags FROM FactTypeTable WHERE Name = 'DNA Kit'",
      [],
      |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .unwrap();
  assert_eq!(tag, "EVEN");
  assert_eq!(flags, 2147483647);
}

// ─── End to end ──────────────────────────────────────────────────────────────

const FIXTURE_SOURCE: &str = "
CREATE TABLE Ancestry_Profiles (guid TEXT, name TEXT);
CREATE TABLE DNA_Kits (company TEXT, guid TEXT, name TEXT);
CREATE TABLE Ancestry_matchGroups (
    Id INTEGER PRIMARY KEY, testGuid TEXT, matchGuid TEXT,
    matchTestDisplayName TEXT, subjectGender TEXT, groupName TEXT,
    sharedCentimorgans REAL, sharedSegment INTEGER, note TEXT,
    created_date TEXT, matchRunDate TEXT);
CREATE TABLE Ancestry_matchTrees (
    Id INTEGER PRIMARY KEY, matchid TEXT, given TEXT, surname TEXT,
    birthdate TEXT, deathdate TEXT, birthplace TEXT, deathplace TEXT,
    relid TEXT, personId TEXT, fatherId TEXT, motherId TEXT,
    created_date TEXT);
CREATE TABLE Ancestry_TreeData (
    Id INTEGER PRIMARY KEY, TestGuid TEXT, TreeId TEXT, TreeSize INTEGER,
    PublicTree INTEGER, PrivateTree INTEGER);
CREATE TABLE Ancestry_ICW (
    Id INTEGER PRIMARY KEY, matchid TEXT, icwid TEXT,
    sharedCentimorgans REAL, numSharedSegments INTEGER, created_date TEXT);
CREATE TABLE Ancestry_matchEthnicity (
    Id INTEGER PRIMARY KEY, matchGuid TEXT, ethnicregions TEXT,
    ethnictraceregions TEXT, percent INTEGER);

INSERT INTO Ancestry_Profiles VALUES ('kit-1', 'Test Owner');

INSERT INTO Ancestry_matchGroups VALUES
  (1, 'kit-1', 'm-1', 'Jane Q Hale', 'F', 'starred', 120.5, 6, NULL,
   '2024-01-01', NULL),
  (2, 'kit-1', 'm-2', 'Cher', NULL, NULL, 45.0, 2, NULL, '2024-01-02', NULL);

INSERT INTO Ancestry_matchTrees VALUES
  (1, 'm-1', 'J.', 'H.', NULL, NULL, NULL, NULL, '1', 't1', 't2', 't3', NULL),
  (2, 'm-1', 'Amos', 'Hale', 'abt 1756', NULL, 'Virginia', NULL, '2', 't2',
   NULL, NULL, NULL),
  (3, 'm-1', 'Mary', 'Hale', NULL, NULL, NULL, NULL, '3', 't3', NULL, NULL,
   NULL);

INSERT INTO Ancestry_TreeData VALUES (1, 'kit-1', 'tree-9', 250, 1, 0);
INSERT INTO Ancestry_ICW VALUES (1, 'm-1', 'm-2', 33.0, 2, '2024-01-03');
INSERT INTO Ancestry_matchEthnicity VALUES
  (1, 'm-2', 'Scotland', 'Wales', 54);
";

#[test]
fn full_pipeline_from_fixture_source() {
  let source = kindred_extract::fetch::SourceDb::open_in_memory().unwrap();
  source.conn().execute_batch(FIXTURE_SOURCE).unwrap();

  let cfg = PipelineConfig::default();
  let kits = source.user_kits().unwrap();
  assert_eq!(kits.len(), 1);

  let ids = source.filter_selected_kits(&kits, &cfg).unwrap();
  assert_eq!(ids.match_groups.len(), 2);
  assert_eq!(ids.match_trees.len(), 3);

  let mut resolver = IdentityResolver::new();
  let (mut records, skips) =
    kindred_extract::normalize_all(&source, &cfg, &kits, &ids, &mut resolver)
      .unwrap();
  assert_eq!(skips.rows, 0);

  let store = GraphStore::open_in_memory().unwrap();
  store.ensure_dna_kit_fact_type(&clock()).unwrap();

  let mut eng = MergeEngine::new(store, clock(), 100);
  let report = eng.run(&mut records).unwrap();
  assert!(report.persons.processed > 0);

  let store = eng.into_store();
  // kit owner, two matches (m-1 shares its row with the tree's own node),
  // and the two parents out of the tree.
  assert_eq!(count(&store, "SELECT COUNT(*) FROM PersonTable"), 5);
  // kit <-> m-1, kit <-> m-2, m-1 <-> m-2.
  assert_eq!(count(&store, "SELECT COUNT(*) FROM DNATable"), 3);
  assert_eq!(count(&store, "SELECT COUNT(*) FROM FamilyTable"), 1);
  assert_eq!(count(&store, "SELECT COUNT(*) FROM ChildTable"), 1);

  // m-1 keeps the match-group name, not the tree's initials.
  let given: String = store
    .conn()
    .query_row(
      "SELECT n.Given FROM NameTable n
       JOIN PersonTable p ON p.PersonID = n.OwnerID
       WHERE p.UniqueID = 'm-1'",
      [],
      |row| row.get(0),
    )
    .unwrap();
  assert_eq!(given, "Jane");

  // Ethnicity annotates m-2's note.
  let note: String = store
    .conn()
    .query_row(
      "SELECT Note FROM PersonTable WHERE UniqueID = 'm-2'",
      [],
      |row| row.get(0),
    )
    .unwrap();
  assert!(note.contains("Scotland"));

  // Tree metadata annotates the kit owner's note.
  let kit_note: String = store
    .conn()
    .query_row(
      "SELECT Note FROM PersonTable WHERE UniqueID = 'kit-1'",
      [],
      |row| row.get(0),
    )
    .unwrap();
  assert!(kit_note.contains("tree-9"));

  // The ancestor's birth event comes through encoded.
  let date: String = store
    .conn()
    .query_row(
      "SELECT e.Date FROM EventTable e
       JOIN PersonTable p ON p.PersonID = e.OwnerID
       JOIN NameTable n ON n.OwnerID = p.PersonID
       WHERE n.Given = 'Amos'",
      [],
      |row| row.get(0),
    )
    .unwrap();
  assert_eq!(date, "D.+17560000.A+00000000..");

  // Re-running the whole merge adds nothing.
  let mut eng = MergeEngine::new(store, clock(), 100);
  eng.run(&mut records).unwrap();
  let store = eng.into_store();
  assert_eq!(count(&store, "SELECT COUNT(*) FROM PersonTable"), 5);
  assert_eq!(count(&store, "SELECT COUNT(*) FROM DNATable"), 3);
  assert_eq!(count(&store, "SELECT COUNT(*) FROM EventTable"), 1);
}
