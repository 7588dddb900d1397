//! Storage integration tests against an on-disk database.

use anyhow::Result;
use chrono::NaiveDate;

use nutri_labs_core::db::Database;
use nutri_labs_core::export::SummaryExporter;
use nutri_labs_core::importer::{content_hash, LabImporter};
use nutri_labs_core::insights::InsightEngine;
use nutri_labs_core::models::{ClinicalThresholds, MeasurementPoint, MeasurementRecord, Severity};

const REPORT: &str = "\
Glukoz 148 mg/dL 70 - 100
HbA1c 7,1 % 4 - 6
HDL Kolesterol 28 mg/dL >40
";

fn measurement(client_id: &str, date: &str, weight: f64, waist: f64) -> Result<MeasurementRecord> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")?;
    Ok(MeasurementRecord::new(
        client_id.to_string(),
        MeasurementPoint::new(date)
            .with_weight(weight)
            .with_waist(waist)
            .with_height(168.0),
    ))
}

#[test]
fn test_data_survives_reopen() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nutri.sqlite3");

    let import_id = {
        let mut db = Database::open(&path)?;
        let outcome = LabImporter::new(&mut db).import_text(
            "client-7",
            "/imports/enabiz-2024-05.pdf",
            REPORT,
            Some("2024-05-02"),
        )?;
        db.insert_measurement(&measurement("client-7", "2024-05-01", 82.0, 101.0)?)?;
        db.save_clinical_thresholds(&ClinicalThresholds {
            waist_info: 90.0,
            ..Default::default()
        })?;
        outcome.import.id
    };

    let db = Database::open(&path)?;
    let import = db.get_import(&import_id)?.expect("import persisted");
    assert_eq!(import.source_filename, "enabiz-2024-05.pdf");
    assert_eq!(import.content_hash, Some(content_hash(REPORT)));
    assert_eq!(db.list_results_for_import(&import_id)?.len(), 3);
    assert_eq!(db.list_measurements_for_client("client-7")?.len(), 1);
    assert_eq!(db.get_clinical_thresholds()?.waist_info, 90.0);
    Ok(())
}

#[test]
fn test_reimport_after_reopen_is_duplicate() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nutri.sqlite3");

    {
        let mut db = Database::open(&path)?;
        LabImporter::new(&mut db).import_text("c1", "a.pdf", REPORT, None)?;
    }

    let mut db = Database::open(&path)?;
    let again = LabImporter::new(&mut db).import_text("c1", "a.pdf", REPORT, None)?;
    assert!(again.duplicate);
    assert_eq!(again.rows.len(), 3);
    assert_eq!(db.list_imports("c1", 10)?.len(), 1);
    Ok(())
}

#[test]
fn test_summary_from_storage() -> Result<()> {
    let mut db = Database::open_in_memory()?;
    LabImporter::new(&mut db).import_text("c1", "old.pdf", "Ferritin 9 ng/mL 15 - 150", None)?;
    LabImporter::new(&mut db).import_text("c1", "new.pdf", REPORT, None)?;
    db.insert_measurement(&measurement("c1", "2024-01-01", 90.0, 112.0)?)?;
    db.insert_measurement(&measurement("c1", "2024-01-08", 92.5, 113.0)?)?;

    let engine = InsightEngine::new(db.get_clinical_thresholds()?)?;
    let summary = SummaryExporter::new(&db, &engine).summary("c1")?;

    assert_eq!(
        summary.latest_import.as_ref().map(|i| i.source_filename.as_str()),
        Some("new.pdf")
    );
    // ferritin only appears in the older import
    assert!(summary.lab_insights.iter().all(|i| !i.title.contains("Ferritin")));
    assert_eq!(summary.lab_insights[0].severity, Severity::Critical);

    assert!(summary
        .measurement_alerts
        .iter()
        .any(|i| i.title.starts_with("Rapid weight change")));
    assert!(summary
        .measurement_alerts
        .iter()
        .any(|i| i.title.starts_with("Waist circumference high")));

    let json = summary.to_json()?;
    let value: serde_json::Value = serde_json::from_str(&json)?;
    assert_eq!(value["latest_measurement"]["point"]["weight_kg"], 92.5);
    Ok(())
}
