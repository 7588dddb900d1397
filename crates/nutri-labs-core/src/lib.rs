//! Nutri-Labs Core Library
//!
//! Lab report ingestion and rule-based clinical insights for a dietitian's
//! client records.
//!
//! # Architecture
//!
//! ```text
//! Report text (extracted by host)
//!        │
//!        ▼
//!   Line Row Extractor ── Reference Range Parser ── Value Classifier
//!        │
//!        ▼
//!   [lab_imports / lab_results]            [measurements]
//!        │                                        │
//!        ▼                                        ▼
//!   Test Name Normalizer → Lab Rules        Trend Analyzer
//!        │                                        │
//!        └──────────────┬─────────────────────────┘
//!                       ▼
//!            Severity-sorted insights
//!                       │
//!                       ▼
//!              Clinical Summary Export
//! ```
//!
//! # Core Principle
//!
//! **Insights are suggestions for the clinician.** The engine never
//! diagnoses; every message is phrased for review.
//!
//! # Modules
//!
//! - [`parser`]: Reference range parsing, value classification, row extraction
//! - [`normalizer`]: Test name normalization with a synonym table
//! - [`insights`]: Lab rules and measurement trend analysis
//! - [`db`]: SQLite storage for imports, results, measurements and settings
//! - [`importer`]: Text → rows → storage pipeline
//! - [`export`]: Clinical summary export
//! - [`models`]: Domain types

pub mod db;
pub mod export;
pub mod importer;
pub mod insights;
pub mod models;
pub mod normalizer;
pub mod parser;

// Re-export commonly used types
pub use db::Database;
pub use export::{ClinicalSummary, SummaryExporter};
pub use importer::{content_hash, ImportOutcome, LabImporter};
pub use insights::{InsightEngine, TrendAnalyzer};
pub use models::{
    ClinicalThresholds, Insight, LabImport, LabRow, MeasurementPoint, MeasurementRecord,
    RefBounds, RefRange, Severity, ValueStatus,
};
pub use normalizer::TestNameNormalizer;
pub use parser::{parse_report, ParserConfig, ReportParser};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum NutriLabsError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<db::DbError> for NutriLabsError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::Threshold(e) => NutriLabsError::InvalidInput(e.to_string()),
            db::DbError::NotFound(what) => NutriLabsError::NotFound(what),
            other => NutriLabsError::DatabaseError(other.to_string()),
        }
    }
}

impl From<models::ThresholdError> for NutriLabsError {
    fn from(e: models::ThresholdError) -> Self {
        NutriLabsError::InvalidInput(e.to_string())
    }
}

impl From<serde_json::Error> for NutriLabsError {
    fn from(e: serde_json::Error) -> Self {
        NutriLabsError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for NutriLabsError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        NutriLabsError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Stateless Functions (exported to FFI)
// =========================================================================

/// Parse report text into lab rows without storing anything.
#[uniffi::export]
pub fn parse_report_text(text: String) -> Vec<FfiLabRow> {
    parse_report(&text).into_iter().map(|r| r.into()).collect()
}

/// Normalized lookup key for a test name.
#[uniffi::export]
pub fn normalize_test_name(name: String) -> String {
    TestNameNormalizer::new().normalize(&name)
}

/// Built-in clinical thresholds.
#[uniffi::export]
pub fn default_clinical_thresholds() -> FfiThresholds {
    ClinicalThresholds::default().into()
}

/// Install a log subscriber with the given filter (e.g. "nutri_labs_core=debug").
///
/// Returns false when a subscriber was already installed.
#[uniffi::export]
pub fn init_logging(filter: String) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .try_init()
        .is_ok()
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<NutriLabsCore>, NutriLabsError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(NutriLabsCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<NutriLabsCore>, NutriLabsError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(NutriLabsCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct NutriLabsCore {
    db: Arc<Mutex<Database>>,
}

/// Insight engine configured with the stored thresholds.
fn stored_engine(db: &Database) -> Result<InsightEngine, NutriLabsError> {
    Ok(InsightEngine::new(db.get_clinical_thresholds()?)?)
}

#[uniffi::export]
impl NutriLabsCore {
    // =========================================================================
    // Lab Operations
    // =========================================================================

    /// Parse and store a report's text for a client.
    pub fn import_lab_report(
        &self,
        client_id: String,
        source_path: String,
        text: String,
        taken_at: Option<String>,
    ) -> Result<FfiImportOutcome, NutriLabsError> {
        let mut db = self.db.lock()?;
        let outcome = LabImporter::new(&mut *db).import_text(
            &client_id,
            &source_path,
            &text,
            taken_at.as_deref(),
        )?;
        Ok(outcome.into())
    }

    /// A client's imports, newest first.
    pub fn list_lab_imports(
        &self,
        client_id: String,
        limit: u32,
    ) -> Result<Vec<FfiLabImport>, NutriLabsError> {
        let db = self.db.lock()?;
        let imports = db.list_imports(&client_id, limit as usize)?;
        Ok(imports.into_iter().map(|i| i.into()).collect())
    }

    /// Rows stored for an import.
    pub fn get_import_results(&self, import_id: String) -> Result<Vec<FfiLabRow>, NutriLabsError> {
        let db = self.db.lock()?;
        db.require_import(&import_id)?;
        let results = db.list_results_for_import(&import_id)?;
        Ok(results.into_iter().map(|r| r.row.into()).collect())
    }

    /// Insights for the rows of the client's latest import.
    pub fn latest_lab_insights(&self, client_id: String) -> Result<Vec<FfiInsight>, NutriLabsError> {
        let db = self.db.lock()?;
        let Some(import_id) = db.latest_import_id(&client_id)? else {
            return Ok(Vec::new());
        };
        let rows: Vec<LabRow> = db
            .list_results_for_import(&import_id)?
            .into_iter()
            .map(|r| r.row)
            .collect();
        let insights = stored_engine(&db)?.lab_insights(&rows);
        Ok(insights.into_iter().map(|i| i.into()).collect())
    }

    // =========================================================================
    // Measurement Operations
    // =========================================================================

    /// Record a measurement for a client.
    pub fn add_measurement(
        &self,
        client_id: String,
        input: FfiMeasurementInput,
    ) -> Result<FfiMeasurement, NutriLabsError> {
        let date = NaiveDate::parse_from_str(input.date.trim(), "%Y-%m-%d")
            .map_err(|_| NutriLabsError::InvalidInput(format!("Invalid date: {}", input.date)))?;

        let mut record = MeasurementRecord::new(
            client_id,
            MeasurementPoint {
                date,
                weight_kg: input.weight_kg,
                waist_cm: input.waist_cm,
                height_cm: input.height_cm,
            },
        );
        record.notes = input.notes.unwrap_or_default();

        let db = self.db.lock()?;
        db.insert_measurement(&record)?;
        Ok(record.into())
    }

    /// A client's measurements, newest first.
    pub fn list_measurements(&self, client_id: String) -> Result<Vec<FfiMeasurement>, NutriLabsError> {
        let db = self.db.lock()?;
        let records = db.list_measurements_for_client(&client_id)?;
        Ok(records.into_iter().map(|m| m.into()).collect())
    }

    /// Trend alerts over the client's full measurement history.
    pub fn measurement_alerts(&self, client_id: String) -> Result<Vec<FfiInsight>, NutriLabsError> {
        let db = self.db.lock()?;
        let points: Vec<MeasurementPoint> = db
            .list_measurements_for_client(&client_id)?
            .into_iter()
            .map(|m| m.point)
            .collect();
        let alerts = stored_engine(&db)?.measurement_alerts(&points);
        Ok(alerts.into_iter().map(|i| i.into()).collect())
    }

    // =========================================================================
    // Settings
    // =========================================================================

    /// Thresholds in effect (defaults merged with stored overrides).
    pub fn get_clinical_thresholds(&self) -> Result<FfiThresholds, NutriLabsError> {
        let db = self.db.lock()?;
        Ok(db.get_clinical_thresholds()?.into())
    }

    /// Validate and store thresholds.
    pub fn save_clinical_thresholds(&self, thresholds: FfiThresholds) -> Result<(), NutriLabsError> {
        let db = self.db.lock()?;
        db.save_clinical_thresholds(&thresholds.into())?;
        Ok(())
    }

    // =========================================================================
    // Export
    // =========================================================================

    /// One-glance clinical summary as pretty JSON.
    pub fn export_clinical_summary_json(&self, client_id: String) -> Result<String, NutriLabsError> {
        let db = self.db.lock()?;
        let engine = stored_engine(&db)?;
        let summary = SummaryExporter::new(&db, &engine).summary(&client_id)?;
        Ok(summary.to_json()?)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe lab row. Enums are lowercase tags.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiLabRow {
    pub test_name: String,
    pub result_text: String,
    pub result_value: Option<f64>,
    pub unit: String,
    pub ref_text: String,
    /// "range", "lt", "gt" or "unknown"
    pub ref_mode: String,
    pub ref_low: Option<f64>,
    pub ref_high: Option<f64>,
    /// "low", "high", "borderline", "normal" or "unknown"
    pub status: String,
}

impl From<LabRow> for FfiLabRow {
    fn from(row: LabRow) -> Self {
        Self {
            ref_mode: row.reference.mode().to_string(),
            ref_low: row.reference.low(),
            ref_high: row.reference.high(),
            status: row.status.as_str().to_string(),
            test_name: row.test_name,
            result_text: row.result_text,
            result_value: row.result_value,
            unit: row.unit,
            ref_text: row.ref_text,
        }
    }
}

/// FFI-safe insight.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiInsight {
    /// "critical", "warn" or "info"
    pub severity: String,
    pub title: String,
    pub detail: String,
}

impl From<Insight> for FfiInsight {
    fn from(insight: Insight) -> Self {
        Self {
            severity: insight.severity.as_str().to_string(),
            title: insight.title,
            detail: insight.detail,
        }
    }
}

/// FFI-safe lab import.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiLabImport {
    pub id: String,
    pub client_id: String,
    pub source_filename: String,
    pub source_path: String,
    pub imported_at: String,
    pub content_hash: Option<String>,
}

impl From<LabImport> for FfiLabImport {
    fn from(import: LabImport) -> Self {
        Self {
            id: import.id,
            client_id: import.client_id,
            source_filename: import.source_filename,
            source_path: import.source_path,
            imported_at: import.imported_at,
            content_hash: import.content_hash,
        }
    }
}

/// FFI-safe import outcome.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiImportOutcome {
    pub lab_import: FfiLabImport,
    pub rows: Vec<FfiLabRow>,
    pub duplicate: bool,
}

impl From<ImportOutcome> for FfiImportOutcome {
    fn from(outcome: ImportOutcome) -> Self {
        Self {
            lab_import: outcome.import.into(),
            rows: outcome.rows.into_iter().map(|r| r.into()).collect(),
            duplicate: outcome.duplicate,
        }
    }
}

/// FFI-safe measurement input. `date` is `YYYY-MM-DD`.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMeasurementInput {
    pub date: String,
    pub weight_kg: Option<f64>,
    pub waist_cm: Option<f64>,
    pub height_cm: Option<f64>,
    pub notes: Option<String>,
}

/// FFI-safe stored measurement.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMeasurement {
    pub id: String,
    pub client_id: String,
    pub date: String,
    pub weight_kg: Option<f64>,
    pub waist_cm: Option<f64>,
    pub height_cm: Option<f64>,
    pub bmi: Option<f64>,
    pub notes: String,
}

impl From<MeasurementRecord> for FfiMeasurement {
    fn from(record: MeasurementRecord) -> Self {
        Self {
            bmi: record.point.bmi(),
            id: record.id,
            client_id: record.client_id,
            date: record.point.date.to_string(),
            weight_kg: record.point.weight_kg,
            waist_cm: record.point.waist_cm,
            height_cm: record.point.height_cm,
            notes: record.notes,
        }
    }
}

/// FFI-safe clinical thresholds.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiThresholds {
    pub weight_rate_info: f64,
    pub weight_rate_warn: f64,
    pub waist_info: f64,
    pub waist_warn: f64,
    pub crp_warn: f64,
    pub hba1c_warn: f64,
    pub hba1c_critical: f64,
    pub ldl_warn: f64,
    pub ldl_critical: f64,
}

impl From<ClinicalThresholds> for FfiThresholds {
    fn from(t: ClinicalThresholds) -> Self {
        Self {
            weight_rate_info: t.weight_rate_info,
            weight_rate_warn: t.weight_rate_warn,
            waist_info: t.waist_info,
            waist_warn: t.waist_warn,
            crp_warn: t.crp_warn,
            hba1c_warn: t.hba1c_warn,
            hba1c_critical: t.hba1c_critical,
            ldl_warn: t.ldl_warn,
            ldl_critical: t.ldl_critical,
        }
    }
}

impl From<FfiThresholds> for ClinicalThresholds {
    fn from(t: FfiThresholds) -> Self {
        ClinicalThresholds {
            weight_rate_info: t.weight_rate_info,
            weight_rate_warn: t.weight_rate_warn,
            waist_info: t.waist_info,
            waist_warn: t.waist_warn,
            crp_warn: t.crp_warn,
            hba1c_warn: t.hba1c_warn,
            hba1c_critical: t.hba1c_critical,
            ldl_warn: t.ldl_warn,
            ldl_critical: t.ldl_critical,
        }
    }
}
