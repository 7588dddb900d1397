//! Report import pipeline: text → rows → storage.
//!
//! Text extraction from PDFs happens in the host; this module receives the
//! extracted text.

use sha2::{Digest, Sha256};

use crate::db::{Database, DbResult};
use crate::models::{LabImport, LabRow};
use crate::parser::ReportParser;

/// SHA-256 hex digest of a report's text.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Result of importing one report.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutcome {
    pub import: LabImport,
    /// Rows belonging to the import
    pub rows: Vec<LabRow>,
    /// The same text was already imported for this client; nothing was written
    pub duplicate: bool,
}

/// Parses report text and persists the result.
pub struct LabImporter<'a> {
    db: &'a mut Database,
    parser: ReportParser,
}

impl<'a> LabImporter<'a> {
    /// Create an importer with the default parser settings.
    pub fn new(db: &'a mut Database) -> Self {
        Self {
            db,
            parser: ReportParser::default(),
        }
    }

    /// Use a custom parser.
    pub fn with_parser(mut self, parser: ReportParser) -> Self {
        self.parser = parser;
        self
    }

    /// Import a report's text for a client.
    ///
    /// An import is recorded even when no rows are found.
    pub fn import_text(
        &mut self,
        client_id: &str,
        source_path: &str,
        text: &str,
        taken_at: Option<&str>,
    ) -> DbResult<ImportOutcome> {
        let hash = content_hash(text);

        if let Some(existing) = self.db.find_import_by_hash(client_id, &hash)? {
            tracing::info!(import_id = %existing.id, "Report already imported");
            let rows = self
                .db
                .list_results_for_import(&existing.id)?
                .into_iter()
                .map(|stored| stored.row)
                .collect();
            return Ok(ImportOutcome {
                import: existing,
                rows,
                duplicate: true,
            });
        }

        let rows = self.parser.parse(text);
        let import = LabImport::new(client_id.to_string(), source_path, Some(hash));
        self.db.save_import_with_rows(&import, &rows, taken_at)?;

        Ok(ImportOutcome {
            import,
            rows,
            duplicate: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValueStatus;
    use crate::parser::ParserConfig;

    const REPORT: &str = "\
Glukoz 148 mg/dL 70 - 100
HDL Kolesterol 28 mg/dL >40
";

    #[test]
    fn test_content_hash() {
        assert_eq!(
            content_hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_ne!(content_hash("a"), content_hash("b"));
        assert_eq!(content_hash(REPORT).len(), 64);
    }

    #[test]
    fn test_import_text_persists_rows() {
        let mut db = Database::open_in_memory().unwrap();
        let outcome = LabImporter::new(&mut db)
            .import_text("c1", "/in/report.pdf", REPORT, Some("2024-05-01"))
            .unwrap();

        assert!(!outcome.duplicate);
        assert_eq!(outcome.rows.len(), 2);
        assert_eq!(outcome.import.content_hash.as_deref(), Some(content_hash(REPORT).as_str()));

        let stored = db.list_results_for_import(&outcome.import.id).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].row.status, ValueStatus::High);
        assert_eq!(stored[0].taken_at, "2024-05-01");
    }

    #[test]
    fn test_duplicate_import_not_saved_twice() {
        let mut db = Database::open_in_memory().unwrap();
        let first = LabImporter::new(&mut db)
            .import_text("c1", "a.pdf", REPORT, None)
            .unwrap();
        let second = LabImporter::new(&mut db)
            .import_text("c1", "copy-of-a.pdf", REPORT, None)
            .unwrap();

        assert!(second.duplicate);
        assert_eq!(second.import.id, first.import.id);
        assert_eq!(second.rows, first.rows);
        assert_eq!(db.list_imports("c1", 10).unwrap().len(), 1);

        // another client importing the same text is not a duplicate
        let other = LabImporter::new(&mut db)
            .import_text("c2", "a.pdf", REPORT, None)
            .unwrap();
        assert!(!other.duplicate);
    }

    #[test]
    fn test_failed_import_can_be_retried() {
        let mut db = Database::open_in_memory().unwrap();
        db.conn()
            .execute_batch(
                "CREATE TRIGGER reject_rows BEFORE INSERT ON lab_results \
                 BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
            )
            .unwrap();

        let failed = LabImporter::new(&mut db).import_text("c1", "a.pdf", REPORT, None);
        assert!(failed.is_err());
        assert!(db.list_imports("c1", 10).unwrap().is_empty());

        db.conn().execute_batch("DROP TRIGGER reject_rows;").unwrap();
        let retry = LabImporter::new(&mut db)
            .import_text("c1", "a.pdf", REPORT, None)
            .unwrap();
        assert!(!retry.duplicate);
        assert_eq!(retry.rows.len(), 2);
        assert_eq!(db.list_results_for_import(&retry.import.id).unwrap().len(), 2);
    }

    #[test]
    fn test_empty_parse_still_recorded() {
        let mut db = Database::open_in_memory().unwrap();
        let outcome = LabImporter::new(&mut db)
            .import_text("c1", "scan.pdf", "Sayfa 1 / 1", None)
            .unwrap();

        assert!(outcome.rows.is_empty());
        assert!(db.get_import(&outcome.import.id).unwrap().is_some());
    }

    #[test]
    fn test_custom_parser() {
        let mut db = Database::open_in_memory().unwrap();
        let parser = ReportParser::new(ParserConfig {
            min_line_chars: 200,
            ..Default::default()
        });
        let outcome = LabImporter::new(&mut db)
            .with_parser(parser)
            .import_text("c1", "a.pdf", REPORT, None)
            .unwrap();
        assert!(outcome.rows.is_empty());
    }
}
