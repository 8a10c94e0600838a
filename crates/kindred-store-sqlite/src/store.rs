//! [`GraphStore`] — a RootsMagic-shaped genealogy database.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension as _, params};
use tracing::info;

use kindred_core::clock::Clock;

use crate::{Result, schema::SCHEMA};

/// Sentence template for the DNA-kit fact type.
const DNA_KIT_SENTENCE: &str = "[person] had a DNA test performed. View DNA \
                                Tab in profile to view matches.";

/// A genealogy graph backed by a single SQLite file.
pub struct GraphStore {
  pub(crate) conn: Connection,
}

impl GraphStore {
  /// Open (or create) a store at `path`.
  ///
  /// The `RMNOCASE` collation is registered before any statement runs;
  /// several text columns collate with it and queries against an existing
  /// RootsMagic file fail without it.
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::init(Connection::open(path)?)
  }

  /// In-memory store for tests.
  pub fn open_in_memory() -> Result<Self> {
    Self::init(Connection::open_in_memory()?)
  }

  fn init(conn: Connection) -> Result<Self> {
    conn.create_collation("RMNOCASE", |a, b| {
      a.to_lowercase().cmp(&b.to_lowercase())
    })?;
    conn.execute_batch(SCHEMA)?;
    Ok(Self { conn })
  }

  pub fn conn(&self) -> &Connection {
    &self.conn
  }

  /// Ensure the `DNA Kit` fact type exists, refreshing its fields in place
  /// when a row with that name is already present.
  pub fn ensure_dna_kit_fact_type(&self, clock: &impl Clock) -> Result<()> {
    let existing: Option<i64> = self
      .conn
      .query_row(
        "SELECT FactTypeID FROM FactTypeTable WHERE Name = ?1",
        params!["DNA Kit"],
        |row| row.get(0),
      )
      .optional()?;

    match existing {
      Some(id) => {
        self.conn.execute(
          "UPDATE FactTypeTable
           SET OwnerType = 0, Abbrev = 'DNA Kit', GedcomTag = 'EVEN',
               UseValue = 1, UseDate = 0, UsePlace = 0, Sentence = ?1,
               Flags = 2147483647, UTCModDate = ?2
           WHERE FactTypeID = ?3",
          params![DNA_KIT_SENTENCE, clock.mod_date(), id],
        )?;
      }
      None => {
        self.conn.execute(
          "INSERT INTO FactTypeTable
             (OwnerType, Name, Abbrev, GedcomTag, UseValue, UseDate,
              UsePlace, Sentence, Flags, UTCModDate)
           VALUES (0, 'DNA Kit', 'DNA Kit', 'EVEN', 1, 0, 0, ?1,
                   2147483647, ?2)",
          params![DNA_KIT_SENTENCE, clock.mod_date()],
        )?;
        info!("fact type 'DNA Kit' inserted");
      }
    }
    Ok(())
  }
}
