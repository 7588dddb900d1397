//! Heuristic extraction of one lab row from one line of report text.
//!
//! Expected line shape: `<test name> <result> [unit...] <reference>`, e.g.
//! `"Glukoz 148 mg/dL 70 - 100"`. The reference sits at the end of the line;
//! the result is the right-most plain number to its left.

use regex::Match;

use super::reference::{
    classify_value, is_number_token, parse_decimal, parse_ref, GREATER_THAN_PATTERN,
    LESS_THAN_PATTERN, RANGE_PATTERN,
};
use super::ParserConfig;
use crate::models::LabRow;

/// Collapse whitespace runs to single spaces and trim.
pub fn collapse_whitespace(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Locate the reference fragment in a collapsed line.
///
/// Patterns are scanned in the order range, `<`, `>`, and the last match of
/// the last pattern that matched at all is taken. A `>` bound anywhere in the
/// line therefore beats a range further right.
fn find_reference(line: &str) -> Option<Match<'_>> {
    let mut found = None;
    for pattern in [&*RANGE_PATTERN, &*LESS_THAN_PATTERN, &*GREATER_THAN_PATTERN] {
        if let Some(m) = pattern.find_iter(line).last() {
            found = Some(m);
        }
    }
    found
}

/// Extract a lab row from a single line. Returns `None` for non-result lines.
pub fn extract_row(line: &str, config: &ParserConfig) -> Option<LabRow> {
    let raw = collapse_whitespace(line);
    if raw.chars().count() < config.min_line_chars {
        return None;
    }

    let reference_match = find_reference(&raw)?;
    let ref_text = raw[reference_match.start()..].trim();
    let left = raw[..reference_match.start()].trim();

    let tokens: Vec<&str> = left.split(' ').collect();
    let value_idx = tokens.iter().rposition(|t| is_number_token(t))?;

    let result_text = tokens[value_idx];
    let result_value = parse_decimal(result_text);
    let unit = tokens[value_idx + 1..].join(" ");
    let test_name = tokens[..value_idx].join(" ");
    if test_name.chars().count() < 2 {
        return None;
    }

    let reference = parse_ref(ref_text);
    let status = classify_value(result_value, &reference, config.borderline_ratio);

    Some(LabRow {
        test_name,
        result_text: result_text.to_string(),
        result_value,
        unit,
        ref_text: ref_text.to_string(),
        reference,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RefBounds, ValueStatus};
    use proptest::prelude::*;

    fn extract(line: &str) -> Option<LabRow> {
        extract_row(line, &ParserConfig::default())
    }

    #[test]
    fn test_glucose_line() {
        let row = extract("Glukoz 148 mg/dL 70 - 100").unwrap();
        assert_eq!(row.test_name, "Glukoz");
        assert_eq!(row.result_text, "148");
        assert_eq!(row.result_value, Some(148.0));
        assert_eq!(row.unit, "mg/dL");
        assert_eq!(row.ref_text, "70 - 100");
        assert_eq!(row.reference.bounds, RefBounds::Range { low: 70.0, high: 100.0 });
        assert_eq!(row.status, ValueStatus::High);
    }

    #[test]
    fn test_greater_than_line() {
        let row = extract("HDL Kolesterol 28 mg/dL >40").unwrap();
        assert_eq!(row.test_name, "HDL Kolesterol");
        assert_eq!(row.reference.bounds, RefBounds::GreaterThan { low: 40.0 });
        assert_eq!(row.status, ValueStatus::Low);
    }

    #[test]
    fn test_collapses_whitespace() {
        let row = extract("  TSH \t 2,15   uIU/mL   0,27 -  4,2 ").unwrap();
        assert_eq!(row.test_name, "TSH");
        assert_eq!(row.result_value, Some(2.15));
        assert_eq!(row.unit, "uIU/mL");
        assert_eq!(row.ref_text, "0,27 - 4,2");
        assert_eq!(row.status, ValueStatus::Normal);
    }

    #[test]
    fn test_no_unit() {
        let row = extract("Hemoglobin A1c 5,9 <6").unwrap();
        assert_eq!(row.test_name, "Hemoglobin A1c");
        assert_eq!(row.result_value, Some(5.9));
        assert_eq!(row.unit, "");
        assert_eq!(row.status, ValueStatus::Borderline);
    }

    #[test]
    fn test_multi_token_unit() {
        let row = extract("eGFR 95 mL/dk/1.73 m2 >60").unwrap();
        assert_eq!(row.test_name, "eGFR");
        assert_eq!(row.result_value, Some(95.0));
        assert_eq!(row.unit, "mL/dk/1.73 m2");
    }

    #[test]
    fn test_rejects_short_lines() {
        assert!(extract("A 1 0-5").is_none());
        assert!(extract("").is_none());
    }

    #[test]
    fn test_rejects_lines_without_reference() {
        assert!(extract("Hasta Adı: Ayşe Yılmaz").is_none());
        assert!(extract("Tetkik Sonuç Birim Referans").is_none());
    }

    #[test]
    fn test_rejects_missing_value() {
        assert!(extract("Kolesterol yüksek 0 - 200").is_none());
    }

    #[test]
    fn test_rejects_short_name() {
        assert!(extract("K 4,1 mmol/L 3,5 - 5,1").is_none());
        assert!(extract("148 mg/dL 70 - 100").is_none());
    }

    #[test]
    fn test_greater_than_beats_later_range() {
        // inherited precedence: a `>` fragment wins even when a range follows it
        let row = extract("Vitamin D 25 ng/mL >30 yetişkin 30 - 100").unwrap();
        assert_eq!(row.ref_text, ">30 yetişkin 30 - 100");
        assert_eq!(row.test_name, "Vitamin D");
        // the reference text still parses as its range
        assert_eq!(row.reference.bounds, RefBounds::Range { low: 30.0, high: 100.0 });
    }

    #[test]
    fn test_last_range_wins() {
        let row = extract("Lökosit 3 - 4 kez 6,5 10^3/uL 4 - 10").unwrap();
        assert_eq!(row.ref_text, "4 - 10");
        assert_eq!(row.result_value, Some(6.5));
        assert_eq!(row.test_name, "Lökosit 3 - 4 kez");
    }

    proptest! {
        #[test]
        fn prop_extract_never_panics(line in "\\PC*") {
            let _ = extract(&line);
        }

        #[test]
        fn prop_extract_structured_noise(line in "[A-Za-zçğıöşüÇĞİÖŞÜ0-9<>.,/ –-]{0,60}") {
            if let Some(row) = extract(&line) {
                prop_assert!(row.test_name.chars().count() >= 2);
                prop_assert!(row.result_value.is_some());
            }
        }
    }
}
