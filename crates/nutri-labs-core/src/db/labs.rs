//! Lab import and result database operations.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{LabImport, LabRow, RefRange, StoredLabResult, ValueStatus};

const IMPORT_COLUMNS: &str =
    "id, client_id, source_filename, source_path, imported_at, content_hash";

const RESULT_COLUMNS: &str = "id, import_id, client_id, taken_at, test_name, result_text, \
     result_value, unit, ref_text, ref_low, ref_high, ref_mode, status, created_at";

impl Database {
    /// Record a new import for a source document and return it.
    pub fn create_import(
        &self,
        client_id: &str,
        source_path: &str,
        content_hash: Option<&str>,
    ) -> DbResult<LabImport> {
        let import = LabImport::new(
            client_id.to_string(),
            source_path,
            content_hash.map(str::to_string),
        );
        self.insert_import(&import)?;
        Ok(import)
    }

    /// Insert a prepared import record.
    pub fn insert_import(&self, import: &LabImport) -> DbResult<()> {
        write_import(&self.conn, import)?;
        tracing::info!(import_id = %import.id, "Created lab import");
        Ok(())
    }

    /// Save extracted rows for an import in a single transaction.
    ///
    /// `taken_at` defaults to the current time. Returns the number of rows saved.
    pub fn save_rows(
        &mut self,
        import_id: &str,
        client_id: &str,
        rows: &[LabRow],
        taken_at: Option<&str>,
    ) -> DbResult<usize> {
        let taken_at = taken_at_or_now(taken_at);

        let tx = self.transaction()?;
        write_rows(&tx, import_id, client_id, &taken_at, rows)?;
        tx.commit()?;

        tracing::info!(import_id, rows = rows.len(), "Saved lab rows");
        Ok(rows.len())
    }

    /// Insert an import together with its rows. Nothing is written if any
    /// insert fails.
    pub fn save_import_with_rows(
        &mut self,
        import: &LabImport,
        rows: &[LabRow],
        taken_at: Option<&str>,
    ) -> DbResult<usize> {
        let taken_at = taken_at_or_now(taken_at);

        let tx = self.transaction()?;
        write_import(&tx, import)?;
        write_rows(&tx, &import.id, &import.client_id, &taken_at, rows)?;
        tx.commit()?;

        tracing::info!(import_id = %import.id, rows = rows.len(), "Saved lab import");
        Ok(rows.len())
    }

    /// Get an import by ID.
    pub fn get_import(&self, id: &str) -> DbResult<Option<LabImport>> {
        self.conn
            .query_row(
                &format!("SELECT {IMPORT_COLUMNS} FROM lab_imports WHERE id = ?"),
                [id],
                map_import,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get an import by ID, failing with `NotFound` when it does not exist.
    pub fn require_import(&self, id: &str) -> DbResult<LabImport> {
        self.get_import(id)?
            .ok_or_else(|| DbError::NotFound(format!("import {}", id)))
    }

    /// List a client's imports, newest first.
    pub fn list_imports(&self, client_id: &str, limit: usize) -> DbResult<Vec<LabImport>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {IMPORT_COLUMNS}
            FROM lab_imports
            WHERE client_id = ?
            ORDER BY imported_at DESC, rowid DESC
            LIMIT ?
            "#
        ))?;

        let rows = stmt.query_map(params![client_id, limit as i64], map_import)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// ID of the client's most recent import.
    pub fn latest_import_id(&self, client_id: &str) -> DbResult<Option<String>> {
        self.conn
            .query_row(
                r#"
                SELECT id FROM lab_imports
                WHERE client_id = ?
                ORDER BY imported_at DESC, rowid DESC
                LIMIT 1
                "#,
                [client_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Find an earlier import of the same report text for this client.
    pub fn find_import_by_hash(
        &self,
        client_id: &str,
        content_hash: &str,
    ) -> DbResult<Option<LabImport>> {
        self.conn
            .query_row(
                &format!(
                    r#"
                    SELECT {IMPORT_COLUMNS}
                    FROM lab_imports
                    WHERE client_id = ?1 AND content_hash = ?2
                    ORDER BY imported_at ASC, rowid ASC
                    LIMIT 1
                    "#
                ),
                params![client_id, content_hash],
                map_import,
            )
            .optional()
            .map_err(Into::into)
    }

    /// All rows saved for an import, in insertion order.
    pub fn list_results_for_import(&self, import_id: &str) -> DbResult<Vec<StoredLabResult>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RESULT_COLUMNS} FROM lab_results WHERE import_id = ? ORDER BY id ASC"
        ))?;

        let rows = stmt.query_map([import_id], map_result)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete an import and its rows.
    pub fn delete_import(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM lab_imports WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

fn taken_at_or_now(taken_at: Option<&str>) -> String {
    taken_at
        .map(str::to_string)
        .unwrap_or_else(|| chrono::Utc::now().to_rfc3339())
}

fn write_import(conn: &Connection, import: &LabImport) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        INSERT INTO lab_imports (
            id, client_id, source_filename, source_path, imported_at, content_hash
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            import.id,
            import.client_id,
            import.source_filename,
            import.source_path,
            import.imported_at,
            import.content_hash,
        ],
    )?;
    Ok(())
}

fn write_rows(
    conn: &Connection,
    import_id: &str,
    client_id: &str,
    taken_at: &str,
    rows: &[LabRow],
) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare(
        r#"
        INSERT INTO lab_results (
            import_id, client_id, taken_at, test_name, result_text, result_value,
            unit, ref_text, ref_low, ref_high, ref_mode, status
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )?;
    for row in rows {
        stmt.execute(params![
            import_id,
            client_id,
            taken_at,
            row.test_name,
            row.result_text,
            row.result_value,
            row.unit,
            row.ref_text,
            row.reference.low(),
            row.reference.high(),
            row.reference.mode(),
            row.status.as_str(),
        ])?;
    }
    Ok(())
}

fn map_import(row: &Row<'_>) -> rusqlite::Result<LabImport> {
    Ok(LabImport {
        id: row.get(0)?,
        client_id: row.get(1)?,
        source_filename: row.get(2)?,
        source_path: row.get(3)?,
        imported_at: row.get(4)?,
        content_hash: row.get(5)?,
    })
}

/// Rebuild a stored row. Inconsistent reference columns degrade to `Unknown`.
fn map_result(row: &Row<'_>) -> rusqlite::Result<StoredLabResult> {
    let ref_text: String = row.get(8)?;
    let ref_mode: String = row.get(11)?;
    let status: String = row.get(12)?;
    let reference = RefRange::from_parts(&ref_mode, row.get(9)?, row.get(10)?, ref_text.clone());

    Ok(StoredLabResult {
        id: row.get(0)?,
        import_id: row.get(1)?,
        client_id: row.get(2)?,
        taken_at: row.get(3)?,
        row: LabRow {
            test_name: row.get(4)?,
            result_text: row.get(5)?,
            result_value: row.get(6)?,
            unit: row.get(7)?,
            ref_text,
            reference,
            status: ValueStatus::from_tag(&status),
        },
        created_at: row.get(13)?,
    })
}
