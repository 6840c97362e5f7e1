//! SQLite schema definition.

/// Complete database schema for the clinic store.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    key TEXT PRIMARY KEY,                        -- derived from name + birthday
    name TEXT NOT NULL,
    birthday TEXT NOT NULL,
    city TEXT,
    sex TEXT,
    phone TEXT,
    last_updated INTEGER NOT NULL DEFAULT 0,     -- epoch millis
    need_to_upload INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_patients_need_to_upload ON patients(need_to_upload);

-- ============================================================================
-- Owned records (deleted with their patient)
-- ============================================================================

CREATE TABLE IF NOT EXISTS statuses (
    patient_key TEXT NOT NULL REFERENCES patients(key) ON DELETE CASCADE,
    date TEXT NOT NULL,                          -- YYYY-MM-DD
    name TEXT NOT NULL,
    birthday TEXT NOT NULL,
    checkin_time INTEGER NOT NULL,
    triage_completed INTEGER NOT NULL DEFAULT 0,
    doctor_completed INTEGER NOT NULL DEFAULT 0,
    pharmacy_completed INTEGER NOT NULL DEFAULT 0,
    notes TEXT,
    active INTEGER NOT NULL DEFAULT 1,
    last_updated INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (patient_key, date)
);

CREATE INDEX IF NOT EXISTS idx_statuses_today ON statuses(date, active, checkin_time);

CREATE TABLE IF NOT EXISTS soaps (
    patient_key TEXT NOT NULL REFERENCES patients(key) ON DELETE CASCADE,
    date TEXT NOT NULL,
    subjective TEXT,
    objective TEXT,
    assessment TEXT,
    plan TEXT,
    wishlist TEXT,
    provider TEXT,
    last_updated INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (patient_key, date)
);

CREATE TABLE IF NOT EXISTS triages (
    patient_key TEXT NOT NULL REFERENCES patients(key) ON DELETE CASCADE,
    date TEXT NOT NULL,
    age INTEGER,
    weight REAL,
    height REAL,
    temperature REAL,
    blood_pressure TEXT,
    pulse INTEGER,
    respiration INTEGER,
    oxygen_saturation INTEGER,
    labs_done INTEGER NOT NULL DEFAULT 0,
    notes TEXT,
    last_updated INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (patient_key, date)
);

CREATE TABLE IF NOT EXISTS drug_updates (
    patient_key TEXT NOT NULL REFERENCES patients(key) ON DELETE CASCADE,
    date TEXT NOT NULL,
    name TEXT NOT NULL,
    dose TEXT,
    frequency TEXT,
    duration TEXT,
    notes TEXT,
    last_updated INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (patient_key, date, name)
);

-- ============================================================================
-- Settings (singleton, created on first sync)
-- ============================================================================

CREATE TABLE IF NOT EXISTS settings (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    last_synced INTEGER NOT NULL
);
"#;
