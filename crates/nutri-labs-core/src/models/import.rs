//! Lab import models.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::LabRow;

/// One imported lab report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabImport {
    /// Local UUID
    pub id: String,
    /// Owning client
    pub client_id: String,
    /// File name of the source document
    pub source_filename: String,
    /// Full path of the source document
    pub source_path: String,
    /// Import timestamp (RFC 3339)
    pub imported_at: String,
    /// SHA-256 of the extracted report text, used to spot re-imports
    pub content_hash: Option<String>,
}

impl LabImport {
    /// Create a new import record for a source document.
    pub fn new(client_id: String, source_path: &str, content_hash: Option<String>) -> Self {
        let source_filename = Path::new(source_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| source_path.to_string());
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            client_id,
            source_filename,
            source_path: source_path.to_string(),
            imported_at: chrono::Utc::now().to_rfc3339(),
            content_hash,
        }
    }
}

/// A lab row as persisted, with its storage context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredLabResult {
    /// Row ID (insertion order)
    pub id: i64,
    pub import_id: String,
    pub client_id: String,
    /// When the sample was taken; defaults to the save time
    pub taken_at: String,
    pub row: LabRow,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_import_takes_file_name() {
        let import = LabImport::new("c1".into(), "/reports/2024/enabiz.pdf", None);
        assert_eq!(import.source_filename, "enabiz.pdf");
        assert_eq!(import.source_path, "/reports/2024/enabiz.pdf");
        assert_eq!(import.id.len(), 36);
    }

    #[test]
    fn test_new_import_bare_name() {
        let import = LabImport::new("c1".into(), "report.pdf", Some("abc".into()));
        assert_eq!(import.source_filename, "report.pdf");
        assert_eq!(import.content_hash.as_deref(), Some("abc"));
    }
}
