//! SQL schema for the Carelog SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// SQL predicate for "this person has no usable national id". Rows written
/// before ids were normalised may still hold `''` or `'-'`.
pub const ABSENT_NATIONAL_ID: &str =
  "(national_id IS NULL OR TRIM(national_id) IN ('', '-'))";

/// Tables whose rows belong to a person and move with it on merge.
pub const DEPENDENT_TABLES: [&str; 4] =
  ["profiles", "check_in_records", "medical_info", "family_info"];

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS persons (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    name         TEXT NOT NULL,
    national_id  TEXT,               -- NULL when unknown; never '' or '-'
    created_at   TEXT NOT NULL,      -- RFC 3339 UTC
    updated_at   TEXT NOT NULL
);

-- One person per real national id.
CREATE UNIQUE INDEX IF NOT EXISTS persons_national_id_idx
    ON persons(national_id)
    WHERE national_id IS NOT NULL AND TRIM(national_id) NOT IN ('', '-');
CREATE INDEX IF NOT EXISTS persons_name_idx ON persons(name);

-- Profiles are append-only; one per import event.
CREATE TABLE IF NOT EXISTS profiles (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    person_id    INTEGER NOT NULL REFERENCES persons(id),
    import_id    TEXT,
    gender       TEXT,
    birth_date   TEXT,               -- free text as imported
    hometown     TEXT,
    ethnicity    TEXT,
    recorded_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS check_in_records (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    person_id       INTEGER NOT NULL REFERENCES persons(id),
    import_id       TEXT,
    check_in_date   TEXT,            -- free text as imported
    attending_staff TEXT,
    notes           TEXT,
    recorded_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS medical_info (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    person_id    INTEGER NOT NULL REFERENCES persons(id),
    import_id    TEXT,
    diagnosis    TEXT,
    record_date  TEXT,               -- free text as imported
    treatment    TEXT,
    recorded_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS family_info (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    person_id     INTEGER NOT NULL REFERENCES persons(id),
    import_id     TEXT,
    guardian_name TEXT,
    relationship  TEXT,
    phone         TEXT,
    address       TEXT,
    recorded_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS profiles_person_idx  ON profiles(person_id);
CREATE INDEX IF NOT EXISTS check_ins_person_idx ON check_in_records(person_id);
CREATE INDEX IF NOT EXISTS medical_person_idx   ON medical_info(person_id);
CREATE INDEX IF NOT EXISTS family_person_idx    ON family_info(person_id);

-- Exactly one row per person. Each profile field is the value from the
-- newest profile row where that field is non-empty, looked up on its own so
-- an empty later profile never hides an earlier value.
CREATE VIEW IF NOT EXISTS person_latest_profile AS
SELECT
    p.id          AS person_id,
    p.name        AS name,
    p.national_id AS national_id,
    (SELECT TRIM(pr.gender) FROM profiles pr
      WHERE pr.person_id = p.id AND TRIM(COALESCE(pr.gender, '')) != ''
      ORDER BY pr.id DESC LIMIT 1) AS gender,
    (SELECT TRIM(pr.birth_date) FROM profiles pr
      WHERE pr.person_id = p.id AND TRIM(COALESCE(pr.birth_date, '')) != ''
      ORDER BY pr.id DESC LIMIT 1) AS birth_date,
    (SELECT TRIM(pr.hometown) FROM profiles pr
      WHERE pr.person_id = p.id AND TRIM(COALESCE(pr.hometown, '')) != ''
      ORDER BY pr.id DESC LIMIT 1) AS hometown,
    (SELECT TRIM(pr.ethnicity) FROM profiles pr
      WHERE pr.person_id = p.id AND TRIM(COALESCE(pr.ethnicity, '')) != ''
      ORDER BY pr.id DESC LIMIT 1) AS ethnicity
FROM persons p;

PRAGMA user_version = 1;
";
