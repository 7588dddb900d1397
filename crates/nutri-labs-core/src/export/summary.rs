//! One-glance clinical summary for a client.

use serde::{Deserialize, Serialize};

use crate::db::{Database, DbResult};
use crate::insights::InsightEngine;
use crate::models::{Insight, LabImport, LabRow, MeasurementPoint, MeasurementRecord};

/// Summary of a client's latest data and the insights derived from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicalSummary {
    pub client_id: String,
    /// Generation timestamp
    pub generated_at: String,
    /// Most recent measurement
    pub latest_measurement: Option<MeasurementRecord>,
    /// Most recent lab import
    pub latest_import: Option<LabImport>,
    /// Insights from the rows of the latest import
    pub lab_insights: Vec<Insight>,
    /// Trend alerts over the full measurement history
    pub measurement_alerts: Vec<Insight>,
}

impl ClinicalSummary {
    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Builds clinical summaries from storage.
pub struct SummaryExporter<'a> {
    db: &'a Database,
    engine: &'a InsightEngine,
}

impl<'a> SummaryExporter<'a> {
    pub fn new(db: &'a Database, engine: &'a InsightEngine) -> Self {
        Self { db, engine }
    }

    /// Build the summary for a client.
    pub fn summary(&self, client_id: &str) -> DbResult<ClinicalSummary> {
        let latest_import = match self.db.latest_import_id(client_id)? {
            Some(id) => self.db.get_import(&id)?,
            None => None,
        };

        let lab_insights = match &latest_import {
            Some(import) => {
                let rows: Vec<LabRow> = self
                    .db
                    .list_results_for_import(&import.id)?
                    .into_iter()
                    .map(|stored| stored.row)
                    .collect();
                self.engine.lab_insights(&rows)
            }
            None => Vec::new(),
        };

        let history = self.db.list_measurements_for_client(client_id)?;
        let points: Vec<MeasurementPoint> = history.iter().map(|m| m.point.clone()).collect();
        let measurement_alerts = self.engine.measurement_alerts(&points);

        Ok(ClinicalSummary {
            client_id: client_id.to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            latest_measurement: history.into_iter().next(),
            latest_import,
            lab_insights,
            measurement_alerts,
        })
    }
}
