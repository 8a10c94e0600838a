//! The merge engine: canonical records in, graph rows out.
//!
//! Six passes in a fixed order, each wrapped in its own transaction:
//! family, person, name, child, DNA edge, event/place. A failed pass rolls
//! back and aborts the run; passes that already committed stay committed.
//! Within a pass, rows that cannot be applied (missing keys, no matching
//! person) are counted and skipped, never fatal.

use rusqlite::{OptionalExtension as _, Transaction, params};
use tracing::{debug, error, info, warn};

use kindred_core::{
  clock::Clock,
  date,
  record::{CanonicalRecord, Provider},
};

use crate::{Error, GraphStore, Result};

/// Rows applied and rows skipped by one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassCounts {
  pub processed: u64,
  pub skipped:   u64,
}

/// Per-pass outcome of a merge run.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeReport {
  pub families:  PassCounts,
  pub persons:   PassCounts,
  pub names:     PassCounts,
  pub children:  PassCounts,
  pub dna_edges: PassCounts,
  pub events:    PassCounts,
}

pub struct MergeEngine<C: Clock> {
  store:      GraphStore,
  clock:      C,
  /// Progress checkpoint interval inside a pass; 0 disables it. Not a
  /// transaction boundary.
  batch_size: u32,
}

impl<C: Clock> MergeEngine<C> {
  pub fn new(store: GraphStore, clock: C, batch_size: u32) -> Self {
    Self { store, clock, batch_size }
  }

  pub fn into_store(self) -> GraphStore {
    self.store
  }

  /// Run all passes over `records`.
  ///
  /// `records` is mutable because the family pass writes assigned family
  /// ids back into the person records for the child pass to use.
  pub fn run(&mut self, records: &mut [CanonicalRecord]) -> Result<MergeReport> {
    let batch = self.batch_size;
    let mut report = MergeReport::default();
    report.families =
      run_pass(&mut self.store, "family", |tx| {
        family_pass(tx, &self.clock, batch, records)
      })?;
    report.persons = run_pass(&mut self.store, "person", |tx| {
      person_pass(tx, &self.clock, batch, records)
    })?;
    report.names = run_pass(&mut self.store, "name", |tx| {
      name_pass(tx, &self.clock, batch, records)
    })?;
    report.children = run_pass(&mut self.store, "child", |tx| {
      child_pass(tx, &self.clock, batch, records)
    })?;
    report.dna_edges = run_pass(&mut self.store, "dna", |tx| {
      dna_pass(tx, &self.clock, batch, records)
    })?;
    report.events = run_pass(&mut self.store, "event", |tx| {
      event_pass(tx, &self.clock, batch, records)
    })?;
    Ok(report)
  }
}

fn run_pass<F>(
  store: &mut GraphStore,
  pass: &'static str,
  body: F,
) -> Result<PassCounts>
where
  F: FnOnce(&Transaction) -> rusqlite::Result<PassCounts>,
{
  let tx = store.conn.transaction().map_err(|source| Error::Pass { pass, source })?;
  match body(&tx) {
    Ok(counts) => {
      tx.commit().map_err(|source| Error::Pass { pass, source })?;
      info!(
        pass,
        processed = counts.processed,
        skipped = counts.skipped,
        "pass committed"
      );
      Ok(counts)
    }
    Err(source) => {
      // Dropping the transaction rolls it back.
      error!(pass, %source, "pass failed, rolling back");
      Err(Error::Pass { pass, source })
    }
  }
}

fn checkpoint(pass: &'static str, batch: u32, processed: u64) {
  if batch > 0 && processed > 0 && processed % u64::from(batch) == 0 {
    debug!(pass, processed, "checkpoint");
  }
}

/// `PersonID` for a record: the surrogate id when that row exists, else a
/// natural-key lookup.
fn person_row_id(
  tx: &Transaction,
  person_id: Option<i64>,
  unique_id: &str,
) -> rusqlite::Result<Option<i64>> {
  if let Some(id) = person_id {
    let found: Option<i64> = tx
      .query_row(
        "SELECT PersonID FROM PersonTable WHERE PersonID = ?1",
        params![id],
        |row| row.get(0),
      )
      .optional()?;
    if found.is_some() {
      return Ok(found);
    }
  }
  tx.query_row(
    "SELECT PersonID FROM PersonTable WHERE UniqueID = ?1",
    params![unique_id],
    |row| row.get(0),
  )
  .optional()
}

fn person_id_by_guid(
  tx: &Transaction,
  guid: &str,
) -> rusqlite::Result<Option<i64>> {
  tx.query_row(
    "SELECT PersonID FROM PersonTable WHERE UniqueID = ?1",
    params![guid],
    |row| row.get(0),
  )
  .optional()
}

// ─── Family pass ─────────────────────────────────────────────────────────────

fn family_pass<C: Clock>(
  tx: &Transaction,
  clock: &C,
  batch: u32,
  records: &mut [CanonicalRecord],
) -> rusqlite::Result<PassCounts> {
  let mut counts = PassCounts::default();

  for record in records.iter_mut() {
    let Some(person) = record.person_mut() else { continue };
    // Only rows that actually assert a parent link form a family.
    if person.father_id.is_none() && person.mother_id.is_none() {
      continue;
    }
    let Some(child_id) = person.person_id else {
      counts.skipped += 1;
      continue;
    };

    let existing: Option<i64> = match person.family_id {
      Some(fid) => tx
        .query_row(
          "SELECT FamilyID FROM FamilyTable WHERE FamilyID = ?1",
          params![fid],
          |row| row.get(0),
        )
        .optional()?,
      None => tx
        .query_row(
          "SELECT FamilyID FROM FamilyTable
           WHERE FatherID IS ?1 AND MotherID IS ?2 AND ChildID IS ?3",
          params![person.father_id, person.mother_id, child_id],
          |row| row.get(0),
        )
        .optional()?,
    };

    let family_id = match existing {
      Some(id) => {
        tx.execute(
          "UPDATE FamilyTable
           SET FatherID = COALESCE(?1, FatherID),
               MotherID = COALESCE(?2, MotherID),
               ChildID = ?3, UTCModDate = ?4
           WHERE FamilyID = ?5",
          params![person.father_id, person.mother_id, child_id, clock.mod_date(), id],
        )?;
        id
      }
      None => {
        tx.execute(
          "INSERT INTO FamilyTable (FatherID, MotherID, ChildID, UTCModDate)
           VALUES (?1, ?2, ?3, ?4)",
          params![person.father_id, person.mother_id, child_id, clock.mod_date()],
        )?;
        tx.last_insert_rowid()
      }
    };
    person.family_id = Some(family_id);

    for parent in [person.father_id, person.mother_id].into_iter().flatten() {
      tx.execute(
        "UPDATE PersonTable SET SpouseID = ?1, UTCModDate = ?2
         WHERE PersonID = ?3",
        params![family_id, clock.mod_date(), parent],
      )?;
    }
    let updated = tx.execute(
      "UPDATE PersonTable SET ParentID = ?1, UTCModDate = ?2
       WHERE PersonID = ?3",
      params![family_id, clock.mod_date(), child_id],
    )?;
    if updated == 0 {
      // Placeholder until the person pass fills the row in.
      tx.execute(
        "INSERT INTO PersonTable (PersonID, ParentID, UTCModDate)
         VALUES (?1, ?2, ?3)",
        params![child_id, family_id, clock.mod_date()],
      )?;
    }

    counts.processed += 1;
    checkpoint("family", batch, counts.processed);
  }
  Ok(counts)
}

// ─── Person pass ─────────────────────────────────────────────────────────────

fn person_pass<C: Clock>(
  tx: &Transaction,
  clock: &C,
  batch: u32,
  records: &[CanonicalRecord],
) -> rusqlite::Result<PassCounts> {
  let mut counts = PassCounts::default();

  for record in records {
    match record {
      CanonicalRecord::Ethnicity(eth) => {
        let note = match (&eth.regions, &eth.trace_regions) {
          (Some(r), Some(t)) => format!("Ethnicity: {r}; trace: {t}"),
          (Some(r), None) => format!("Ethnicity: {r}"),
          (None, Some(t)) => format!("Ethnicity trace: {t}"),
          (None, None) => continue,
        };
        if annotate_person(tx, clock, &eth.match_guid, &note)? {
          counts.processed += 1;
        } else {
          warn!(guid = %eth.match_guid, "ethnicity for unknown person");
          counts.skipped += 1;
        }
        continue;
      }
      CanonicalRecord::TreeMetadata(meta) => {
        let visibility = match (meta.public, meta.private) {
          (true, _) => "public",
          (_, true) => "private",
          _ => "unlisted",
        };
        let note = format!(
          "Tree {}: {} people, {visibility}",
          meta.tree_id.as_deref().unwrap_or("?"),
          meta.tree_size.unwrap_or(0),
        );
        if annotate_person(tx, clock, &meta.match_guid, &note)? {
          counts.processed += 1;
        } else {
          warn!(guid = %meta.match_guid, "tree metadata for unknown person");
          counts.skipped += 1;
        }
        continue;
      }
      _ => {}
    }

    let Some(person) = record.person() else { continue };
    if person.person_id.is_none() && person.natural_id.is_empty() {
      warn!(provenance = record.provenance(), "record with no usable id");
      counts.skipped += 1;
      continue;
    }

    let existing = person_row_id(tx, person.person_id, &person.natural_id)?;
    match existing {
      // Primary-subject rows only refresh the timestamp so the stronger
      // match-pass fields survive.
      Some(id) if person.primary_subject => {
        tx.execute(
          "UPDATE PersonTable SET UTCModDate = ?1 WHERE PersonID = ?2",
          params![clock.mod_date(), id],
        )?;
      }
      Some(id) => {
        tx.execute(
          "UPDATE PersonTable
           SET UniqueID = ?1, Sex = ?2, Color = ?3, UTCModDate = ?4
           WHERE PersonID = ?5",
          params![
            person.natural_id,
            person.sex.code(),
            person.category,
            clock.mod_date(),
            id
          ],
        )?;
      }
      None => {
        tx.execute(
          "INSERT INTO PersonTable (PersonID, UniqueID, Sex, Color, UTCModDate)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          params![
            person.person_id,
            person.natural_id,
            person.sex.code(),
            person.category,
            clock.mod_date()
          ],
        )?;
      }
    }

    counts.processed += 1;
    checkpoint("person", batch, counts.processed);
  }
  Ok(counts)
}

/// Append an annotation line to a person's note, keyed by natural id.
fn annotate_person<C: Clock>(
  tx: &Transaction,
  clock: &C,
  unique_id: &str,
  note: &str,
) -> rusqlite::Result<bool> {
  let updated = tx.execute(
    "UPDATE PersonTable
     SET Note = LTRIM(COALESCE(Note, '') || char(10) || ?1, char(10)),
         UTCModDate = ?2
     WHERE UniqueID = ?3",
    params![note, clock.mod_date(), unique_id],
  )?;
  Ok(updated > 0)
}

// ─── Name pass ───────────────────────────────────────────────────────────────

fn name_pass<C: Clock>(
  tx: &Transaction,
  clock: &C,
  batch: u32,
  records: &[CanonicalRecord],
) -> rusqlite::Result<PassCounts> {
  let mut counts = PassCounts::default();

  for record in records {
    let Some(person) = record.person() else { continue };
    let Some(owner) = person_row_id(tx, person.person_id, &person.natural_id)?
    else {
      warn!(natural_id = %person.natural_id, "no person row for name");
      counts.skipped += 1;
      continue;
    };

    let existing: Option<i64> = tx
      .query_row(
        "SELECT NameID FROM NameTable WHERE OwnerID = ?1",
        params![owner],
        |row| row.get(0),
      )
      .optional()?;

    match existing {
      // One active name per owner; the latest record wins outright.
      Some(name_id) => {
        tx.execute(
          "UPDATE NameTable
           SET Surname = ?1, Given = ?2, NameType = ?3, IsPrimary = 1,
               SortDate = ?4, IsPrivate = 0, Proof = 0,
               SurnameMP = ?1, GivenMP = ?2, UTCModDate = ?5
           WHERE NameID = ?6",
          params![
            person.surname,
            person.given,
            person.name_kind,
            i64::MAX,
            clock.mod_date(),
            name_id
          ],
        )?;
      }
      None => {
        tx.execute(
          "INSERT INTO NameTable
             (OwnerID, Surname, Given, NameType, IsPrimary, SortDate,
              IsPrivate, Proof, SurnameMP, GivenMP, UTCModDate)
           VALUES (?1, ?2, ?3, ?4, 1, ?5, 0, 0, ?2, ?3, ?6)",
          params![
            owner,
            person.surname,
            person.given,
            person.name_kind,
            i64::MAX,
            clock.mod_date()
          ],
        )?;
      }
    }

    counts.processed += 1;
    checkpoint("name", batch, counts.processed);
  }
  Ok(counts)
}

// ─── Child pass ──────────────────────────────────────────────────────────────

fn child_pass<C: Clock>(
  tx: &Transaction,
  clock: &C,
  batch: u32,
  records: &[CanonicalRecord],
) -> rusqlite::Result<PassCounts> {
  let mut counts = PassCounts::default();

  for record in records {
    let Some(person) = record.person() else { continue };
    if person.father_id.is_none() && person.mother_id.is_none() {
      continue;
    }
    let (Some(child_id), Some(family_id)) =
      (person.person_id, person.family_id)
    else {
      warn!(
        child = ?person.person_id,
        family = ?person.family_id,
        "child link missing an id, skipping"
      );
      counts.skipped += 1;
      continue;
    };

    let existing: Option<i64> = tx
      .query_row(
        "SELECT RecID FROM ChildTable WHERE ChildID = ?1 AND FamilyID = ?2",
        params![child_id, family_id],
        |row| row.get(0),
      )
      .optional()?;

    match existing {
      Some(rec_id) => {
        tx.execute(
          "UPDATE ChildTable SET UTCModDate = ?1 WHERE RecID = ?2",
          params![clock.mod_date(), rec_id],
        )?;
      }
      None => {
        tx.execute(
          "INSERT INTO ChildTable (ChildID, FamilyID, UTCModDate)
           VALUES (?1, ?2, ?3)",
          params![child_id, family_id, clock.mod_date()],
        )?;
      }
    }

    counts.processed += 1;
    checkpoint("child", batch, counts.processed);
  }
  Ok(counts)
}

// ─── DNA-edge pass ───────────────────────────────────────────────────────────

fn dna_pass<C: Clock>(
  tx: &Transaction,
  clock: &C,
  batch: u32,
  records: &[CanonicalRecord],
) -> rusqlite::Result<PassCounts> {
  let mut counts = PassCounts::default();

  for record in records {
    // Each edge resolves to (kit owner, match) or (match, icw match).
    let edge = match record {
      CanonicalRecord::Match(p) => {
        let Some(test_guid) = p.test_guid.as_deref() else {
          // MyHeritage match rows never carry a tester guid; there is no
          // edge to form and nothing worth counting.
          if p.provider != Provider::MyHeritage {
            counts.skipped += 1;
          }
          continue;
        };
        let Some(match_guid) = p.match_guid.as_deref() else {
          counts.skipped += 1;
          continue;
        };
        let id1 = person_id_by_guid(tx, test_guid)?;
        let id2 = person_row_id(tx, p.person_id, &p.natural_id)?;
        (
          id1,
          id2,
          test_guid,
          match_guid,
          p.provider,
          p.shared_cm,
          p.shared_segments,
          p.created_date.as_deref(),
        )
      }
      CanonicalRecord::IcwEdge(e) => (
        person_id_by_guid(tx, &e.match_guid)?,
        person_id_by_guid(tx, &e.icw_guid)?,
        e.match_guid.as_str(),
        e.icw_guid.as_str(),
        e.provider,
        e.shared_cm,
        e.shared_segments,
        e.created_date.as_deref(),
      ),
      _ => continue,
    };
    let (id1, id2, label1, label2, provider, cm, segs, date) = edge;
    let (Some(id1), Some(id2)) = (id1, id2) else {
      counts.skipped += 1;
      continue;
    };

    let percent = cm.map(|v| ((v / 69.0) * 100.0).round() / 100.0);
    let note = provider.compare_url(label1, label2);

    let existing: Option<i64> = tx
      .query_row(
        "SELECT RecID FROM DNATable
         WHERE (ID1 = ?1 AND ID2 = ?2) OR (ID1 = ?2 AND ID2 = ?1)",
        params![id1, id2],
        |row| row.get(0),
      )
      .optional()?;

    match existing {
      Some(rec_id) => {
        tx.execute(
          "UPDATE DNATable
           SET ID1 = ?1, ID2 = ?2, Label1 = ?3, Label2 = ?4,
               DNAProvider = ?5, SharedCM = ?6, SharedPercent = ?7,
               SharedSegs = ?8, Date = ?9, Note = ?10, UTCModDate = ?11
           WHERE RecID = ?12",
          params![
            id1,
            id2,
            label1,
            label2,
            provider.code(),
            cm,
            percent,
            segs,
            date,
            note,
            clock.mod_date(),
            rec_id
          ],
        )?;
      }
      None => {
        tx.execute(
          "INSERT INTO DNATable
             (ID1, ID2, Label1, Label2, DNAProvider, SharedCM, SharedPercent,
              SharedSegs, Date, Note, UTCModDate)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
          params![
            id1,
            id2,
            label1,
            label2,
            provider.code(),
            cm,
            percent,
            segs,
            date,
            note,
            clock.mod_date()
          ],
        )?;
      }
    }

    counts.processed += 1;
    checkpoint("dna", batch, counts.processed);
  }
  Ok(counts)
}

// ─── Event/place pass ────────────────────────────────────────────────────────

/// `EventTable.EventType` codes.
const EVENT_BIRTH: i64 = 1;
const EVENT_DEATH: i64 = 2;

fn event_pass<C: Clock>(
  tx: &Transaction,
  clock: &C,
  batch: u32,
  records: &[CanonicalRecord],
) -> rusqlite::Result<PassCounts> {
  let mut counts = PassCounts::default();

  for record in records {
    let Some(person) = record.person() else { continue };
    if person.birth_date.is_none()
      && person.death_date.is_none()
      && person.birth_place.is_none()
      && person.death_place.is_none()
    {
      continue;
    }
    let Some(owner) = person_row_id(tx, person.person_id, &person.natural_id)?
    else {
      warn!(natural_id = %person.natural_id, "no person row for events");
      counts.skipped += 1;
      continue;
    };

    let vitals = [
      (EVENT_BIRTH, &person.birth_date, &person.birth_place),
      (EVENT_DEATH, &person.death_date, &person.death_place),
    ];
    for (event_type, raw_date, place_name) in vitals {
      let place_id = match place_name {
        Some(name) => Some(upsert_place(tx, clock, name)?),
        None => None,
      };
      let Some(raw) = raw_date else { continue };
      let encoded = date::encode(Some(raw.as_str()));

      let existing: Option<i64> = tx
        .query_row(
          "SELECT EventID FROM EventTable
           WHERE OwnerID = ?1 AND EventType = ?2",
          params![owner, event_type],
          |row| row.get(0),
        )
        .optional()?;

      match existing {
        Some(event_id) => {
          tx.execute(
            "UPDATE EventTable SET Date = ?1, UTCModDate = ?2
             WHERE EventID = ?3",
            params![encoded, clock.mod_date(), event_id],
          )?;
        }
        None => {
          tx.execute(
            "INSERT INTO EventTable
               (EventType, OwnerType, OwnerID, FamilyID, PlaceID, SiteID,
                Date, IsPrimary, IsPrivate, Proof, Status, UTCModDate)
             VALUES (?1, 0, ?2, 0, ?3, 0, ?4, 0, 0, 0, 0, ?5)",
            params![
              event_type,
              owner,
              place_id.unwrap_or(0),
              encoded,
              clock.mod_date()
            ],
          )?;
        }
      }
    }

    counts.processed += 1;
    checkpoint("event", batch, counts.processed);
  }
  Ok(counts)
}

/// Place rows are deduplicated by exact name.
fn upsert_place<C: Clock>(
  tx: &Transaction,
  clock: &C,
  name: &str,
) -> rusqlite::Result<i64> {
  let existing: Option<i64> = tx
    .query_row(
      "SELECT PlaceID FROM PlaceTable WHERE Name = ?1",
      params![name],
      |row| row.get(0),
    )
    .optional()?;
  match existing {
    Some(id) => {
      tx.execute(
        "UPDATE PlaceTable SET UTCModDate = ?1 WHERE PlaceID = ?2",
        params![clock.mod_date(), id],
      )?;
      Ok(id)
    }
    None => {
      tx.execute(
        "INSERT INTO PlaceTable
           (PlaceType, Name, MasterID, Latitude, Longitude, LatLongExact,
            fsID, anID, UTCModDate)
         VALUES (0, ?1, 0, 0, 0, 0, 0, 0, ?2)",
        params![name, clock.mod_date()],
      )?;
      Ok(tx.last_insert_rowid())
    }
  }
}
