//! Key/value settings stored in `app_meta`.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult};
use crate::models::ClinicalThresholds;

/// `app_meta` key holding threshold overrides.
pub const THRESHOLDS_KEY: &str = "clinical_thresholds_v1";

impl Database {
    /// Read a raw setting.
    pub fn get_meta(&self, key: &str) -> DbResult<Option<String>> {
        self.conn
            .query_row("SELECT value FROM app_meta WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(Into::into)
    }

    /// Insert or replace a raw setting.
    pub fn set_meta(&self, key: &str, value: &str) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO app_meta (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// Defaults merged with stored overrides.
    ///
    /// Stored overrides that fail to parse or validate are ignored.
    pub fn get_clinical_thresholds(&self) -> DbResult<ClinicalThresholds> {
        let Some(raw) = self.get_meta(THRESHOLDS_KEY)? else {
            return Ok(ClinicalThresholds::default());
        };

        match ClinicalThresholds::from_overrides_json(&raw) {
            Ok(thresholds) => Ok(thresholds),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring stored threshold overrides");
                Ok(ClinicalThresholds::default())
            }
        }
    }

    /// Validate and store thresholds. Only known keys are written.
    pub fn save_clinical_thresholds(&self, thresholds: &ClinicalThresholds) -> DbResult<()> {
        thresholds.validate()?;

        let fields: serde_json::Map<String, serde_json::Value> = thresholds
            .fields()
            .into_iter()
            .map(|(name, value)| (name.to_string(), serde_json::Value::from(value)))
            .collect();
        let json = serde_json::to_string(&fields)?;

        self.set_meta(THRESHOLDS_KEY, &json)?;
        tracing::info!("Saved clinical thresholds");
        Ok(())
    }
}
