//! DDL for the RootsMagic-shaped target database.
//!
//! Executed once at connection startup. Idempotent thanks to
//! `CREATE TABLE IF NOT EXISTS`, so pointing at an existing RootsMagic file
//! is a no-op apart from the pragmas.
//!
//! `Given` and `Surname` collate with `RMNOCASE`, the case-insensitive
//! collation RootsMagic registers natively; the store registers a
//! compatible implementation before this script runs.

/// Full schema DDL.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS PersonTable (
    PersonID    INTEGER PRIMARY KEY,
    UniqueID    TEXT,
    Sex         INTEGER,
    ParentID    INTEGER,
    SpouseID    INTEGER,
    Color       INTEGER,
    Relate1     INTEGER,
    Relate2     INTEGER,
    Flags       INTEGER,
    Living      INTEGER,
    IsPrivate   INTEGER,
    Proof       INTEGER,
    Bookmark    INTEGER,
    Note        TEXT,
    UTCModDate  FLOAT
);

CREATE TABLE IF NOT EXISTS NameTable (
    NameID      INTEGER PRIMARY KEY,
    OwnerID     INTEGER,
    Surname     TEXT COLLATE RMNOCASE,
    Given       TEXT COLLATE RMNOCASE,
    Prefix      TEXT,
    Suffix      TEXT,
    Nickname    TEXT,
    NameType    INTEGER,
    Date        TEXT,
    SortDate    INTEGER,
    IsPrimary   INTEGER,
    IsPrivate   INTEGER,
    Proof       INTEGER,
    Sentence    TEXT,
    Note        TEXT,
    BirthYear   INTEGER,
    DeathYear   INTEGER,
    Display     INTEGER,
    Language    TEXT,
    UTCModDate  FLOAT,
    SurnameMP   TEXT,
    GivenMP     TEXT,
    NicknameMP  TEXT
);

CREATE TABLE IF NOT EXISTS FamilyTable (
    FamilyID       INTEGER PRIMARY KEY,
    FatherID       INTEGER,
    MotherID       INTEGER,
    ChildID        INTEGER,
    HusbOrder      INTEGER,
    WifeOrder      INTEGER,
    IsPrivate      INTEGER,
    Proof          INTEGER,
    SpouseLabel    INTEGER,
    FatherLabel    INTEGER,
    MotherLabel    INTEGER,
    SpouseLabelStr TEXT,
    FatherLabelStr TEXT,
    MotherLabelStr TEXT,
    Note           TEXT,
    UTCModDate     FLOAT
);

CREATE TABLE IF NOT EXISTS ChildTable (
    RecID       INTEGER PRIMARY KEY,
    ChildID     INTEGER,
    FamilyID    INTEGER,
    RelFather   INTEGER,
    RelMother   INTEGER,
    ChildOrder  INTEGER,
    IsPrivate   INTEGER,
    ProofFather INTEGER,
    ProofMother INTEGER,
    Note        TEXT,
    UTCModDate  FLOAT
);

CREATE TABLE IF NOT EXISTS DNATable (
    RecID         INTEGER PRIMARY KEY,
    ID1           INTEGER,
    ID2           INTEGER,
    Label1        TEXT,
    Label2        TEXT,
    DNAProvider   INTEGER,
    SharedCM      FLOAT,
    SharedPercent FLOAT,
    LargeSeg      FLOAT,
    SharedSegs    INTEGER,
    Date          TEXT,
    Relate1       INTEGER,
    Relate2       INTEGER,
    CommonAnc     INTEGER,
    CommonAncType INTEGER,
    Verified      INTEGER,
    Note          TEXT,
    UTCModDate    FLOAT
);

CREATE TABLE IF NOT EXISTS PlaceTable (
    PlaceID      INTEGER PRIMARY KEY,
    PlaceType    INTEGER,
    Name         TEXT,
    Abbrev       TEXT,
    Normalized   TEXT,
    Latitude     INTEGER,
    Longitude    INTEGER,
    LatLongExact INTEGER,
    MasterID     INTEGER,
    Note         TEXT,
    Reverse      TEXT,
    fsID         INTEGER,
    anID         INTEGER,
    UTCModDate   FLOAT
);

CREATE TABLE IF NOT EXISTS EventTable (
    EventID    INTEGER PRIMARY KEY,
    EventType  INTEGER,
    OwnerType  INTEGER,
    OwnerID    INTEGER,
    FamilyID   INTEGER,
    PlaceID    INTEGER,
    SiteID     INTEGER,
    Date       TEXT,
    SortDate   BIGINT,
    IsPrimary  INTEGER,
    IsPrivate  INTEGER,
    Proof      INTEGER,
    Status     INTEGER,
    Sentence   TEXT,
    Details    TEXT,
    Note       TEXT,
    UTCModDate FLOAT
);

CREATE TABLE IF NOT EXISTS FactTypeTable (
    FactTypeID INTEGER PRIMARY KEY,
    OwnerType  INTEGER,
    Name       TEXT COLLATE RMNOCASE,
    Abbrev     TEXT,
    GedcomTag  TEXT,
    UseValue   INTEGER,
    UseDate    INTEGER,
    UsePlace   INTEGER,
    Sentence   TEXT,
    Flags      INTEGER,
    UTCModDate FLOAT
);

CREATE INDEX IF NOT EXISTS idxPersonUniqueID   ON PersonTable(UniqueID);
CREATE INDEX IF NOT EXISTS idxNameOwnerID      ON NameTable(OwnerID);
CREATE INDEX IF NOT EXISTS idxFamilyFatherID   ON FamilyTable(FatherID);
CREATE INDEX IF NOT EXISTS idxFamilyMotherID   ON FamilyTable(MotherID);
CREATE INDEX IF NOT EXISTS idxChildFamilyID    ON ChildTable(FamilyID);
CREATE INDEX IF NOT EXISTS idxDnaPair          ON DNATable(ID1, ID2);
CREATE INDEX IF NOT EXISTS idxPlaceName        ON PlaceTable(Name);
CREATE INDEX IF NOT EXISTS idxEventOwner       ON EventTable(OwnerID, EventType);

PRAGMA user_version = 1;
";
