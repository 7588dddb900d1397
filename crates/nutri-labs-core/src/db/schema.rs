//! SQLite schema definition.

/// Complete database schema for nutri-labs.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Lab Imports (one row per imported report)
-- ============================================================================

CREATE TABLE IF NOT EXISTS lab_imports (
    id TEXT PRIMARY KEY,
    client_id TEXT NOT NULL,
    source_filename TEXT NOT NULL,
    source_path TEXT NOT NULL,
    imported_at TEXT NOT NULL,
    content_hash TEXT                            -- SHA-256 hex of report text
);

CREATE INDEX IF NOT EXISTS idx_lab_imports_client ON lab_imports(client_id, imported_at);
CREATE INDEX IF NOT EXISTS idx_lab_imports_hash ON lab_imports(client_id, content_hash);

-- ============================================================================
-- Lab Results (extracted rows, append-only per import)
-- ============================================================================

CREATE TABLE IF NOT EXISTS lab_results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    import_id TEXT NOT NULL REFERENCES lab_imports(id) ON DELETE CASCADE,
    client_id TEXT NOT NULL,
    taken_at TEXT NOT NULL,
    test_name TEXT NOT NULL,
    result_text TEXT NOT NULL DEFAULT '',
    result_value REAL,
    unit TEXT NOT NULL DEFAULT '',
    ref_text TEXT NOT NULL DEFAULT '',
    ref_low REAL,
    ref_high REAL,
    ref_mode TEXT NOT NULL DEFAULT 'unknown'
        CHECK (ref_mode IN ('range', 'lt', 'gt', 'unknown')),
    status TEXT NOT NULL DEFAULT 'unknown'
        CHECK (status IN ('low', 'high', 'borderline', 'normal', 'unknown')),
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_lab_results_import ON lab_results(import_id);
CREATE INDEX IF NOT EXISTS idx_lab_results_client ON lab_results(client_id, taken_at);

-- ============================================================================
-- Measurements
-- ============================================================================

CREATE TABLE IF NOT EXISTS measurements (
    id TEXT PRIMARY KEY,
    client_id TEXT NOT NULL,
    measured_at TEXT NOT NULL,                   -- YYYY-MM-DD
    height_cm REAL,
    weight_kg REAL,
    waist_cm REAL,
    notes TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_measurements_client ON measurements(client_id, measured_at);

-- ============================================================================
-- App Meta (key/value settings)
-- ============================================================================

CREATE TABLE IF NOT EXISTS app_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;
