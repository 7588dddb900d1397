//! Lab report text parser.
//!
//! Pipeline: raw text → lines → [`extract_row`] → ordered `LabRow`s.
//!
//! Extraction is best-effort: lines that do not look like a result row are
//! skipped silently. The same test may appear more than once; rows are
//! returned in input order and deduplication is left to the caller.

mod extractor;
mod reference;

pub use extractor::*;
pub use reference::*;

use serde::{Deserialize, Serialize};

use crate::models::LabRow;

/// Extractor and classifier settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ParserConfig {
    /// Lines shorter than this (in characters, after whitespace collapse) are skipped
    pub min_line_chars: usize,
    /// Borderline band width used when classifying values
    pub borderline_ratio: f64,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            min_line_chars: 8,
            borderline_ratio: DEFAULT_BORDERLINE_RATIO,
        }
    }
}

/// Drives row extraction over a full report.
#[derive(Debug, Clone, Default)]
pub struct ReportParser {
    config: ParserConfig,
}

impl ReportParser {
    /// Create a parser with the given settings.
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse every result row out of a report's text.
    pub fn parse(&self, text: &str) -> Vec<LabRow> {
        let mut line_count = 0usize;
        let rows: Vec<LabRow> = text
            .lines()
            .inspect(|_| line_count += 1)
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| extract_row(line, &self.config))
            .collect();

        tracing::debug!(lines = line_count, rows = rows.len(), "Parsed lab report text");
        rows
    }
}

/// Parse a report with the default settings.
pub fn parse_report(text: &str) -> Vec<LabRow> {
    ReportParser::default().parse(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValueStatus;

    const SAMPLE: &str = "\
T.C. SAĞLIK BAKANLIĞI e-Nabız
Tetkik Adı Sonuç Birim Referans Aralığı

Glukoz 148 mg/dL 70 - 100
HDL Kolesterol 28 mg/dL >40
LDL Kolesterol 172 mg/dL <130
Sayfa 1 / 2
Glukoz 96 mg/dL 70 - 100
";

    #[test]
    fn test_parse_sample_report() {
        let rows = parse_report(SAMPLE);
        let names: Vec<&str> = rows.iter().map(|r| r.test_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Glukoz", "HDL Kolesterol", "LDL Kolesterol", "Glukoz"]
        );
        assert_eq!(rows[0].status, ValueStatus::High);
        assert_eq!(rows[2].status, ValueStatus::High);
        assert_eq!(rows[3].status, ValueStatus::Normal);
    }

    #[test]
    fn test_empty_report() {
        assert!(parse_report("").is_empty());
        assert!(parse_report("\n\n   \n").is_empty());
    }

    #[test]
    fn test_crlf_lines() {
        let rows = parse_report("Glukoz 148 mg/dL 70 - 100\r\nTSH 2,1 uIU/mL 0,27 - 4,2\r\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].ref_text, "0,27 - 4,2");
    }

    #[test]
    fn test_custom_ratio() {
        let parser = ReportParser::new(ParserConfig {
            borderline_ratio: 0.0,
            ..Default::default()
        });
        let rows = parser.parse("Hemoglobin A1c 5,9 <6");
        assert_eq!(rows[0].status, ValueStatus::Normal);
    }
}
