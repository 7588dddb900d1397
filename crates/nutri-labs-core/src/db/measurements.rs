//! Measurement database operations.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{MeasurementPoint, MeasurementRecord};

impl Database {
    /// Insert a new measurement.
    pub fn insert_measurement(&self, record: &MeasurementRecord) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO measurements (
                id, client_id, measured_at, height_cm, weight_kg, waist_cm, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                record.id,
                record.client_id,
                record.point.date.to_string(),
                record.point.height_cm,
                record.point.weight_kg,
                record.point.waist_cm,
                record.notes,
                record.created_at,
            ],
        )?;
        tracing::info!(measurement_id = %record.id, "Saved measurement");
        Ok(())
    }

    /// A client's measurements, newest first.
    pub fn list_measurements_for_client(&self, client_id: &str) -> DbResult<Vec<MeasurementRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, client_id, measured_at, height_cm, weight_kg, waist_cm, notes, created_at
            FROM measurements
            WHERE client_id = ?
            ORDER BY measured_at DESC, created_at DESC
            "#,
        )?;

        let rows = stmt.query_map([client_id], MeasurementRow::from_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.try_into()?);
        }
        Ok(records)
    }

    /// The client's most recent measurement.
    pub fn latest_measurement_for_client(
        &self,
        client_id: &str,
    ) -> DbResult<Option<MeasurementRecord>> {
        self.conn
            .query_row(
                r#"
                SELECT id, client_id, measured_at, height_cm, weight_kg, waist_cm, notes, created_at
                FROM measurements
                WHERE client_id = ?
                ORDER BY measured_at DESC, created_at DESC
                LIMIT 1
                "#,
                [client_id],
                MeasurementRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Delete a measurement.
    pub fn delete_measurement(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM measurements WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for database mapping.
struct MeasurementRow {
    id: String,
    client_id: String,
    measured_at: String,
    height_cm: Option<f64>,
    weight_kg: Option<f64>,
    waist_cm: Option<f64>,
    notes: String,
    created_at: String,
}

impl MeasurementRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            client_id: row.get(1)?,
            measured_at: row.get(2)?,
            height_cm: row.get(3)?,
            weight_kg: row.get(4)?,
            waist_cm: row.get(5)?,
            notes: row.get(6)?,
            created_at: row.get(7)?,
        })
    }
}

impl TryFrom<MeasurementRow> for MeasurementRecord {
    type Error = DbError;

    fn try_from(row: MeasurementRow) -> Result<Self, Self::Error> {
        let date: NaiveDate = row.measured_at.parse().map_err(|_| {
            DbError::Constraint(format!("Invalid measurement date: {}", row.measured_at))
        })?;

        Ok(MeasurementRecord {
            id: row.id,
            client_id: row.client_id,
            point: MeasurementPoint {
                date,
                weight_kg: row.weight_kg,
                waist_cm: row.waist_cm,
                height_cm: row.height_cm,
            },
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}
