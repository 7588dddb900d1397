//! Reference-range parsing and value classification.
//!
//! Accepted shapes: `"0 - 5"` (also with en/em dash), `"<126"`, `">50"`.
//! Both `,` and `.` are decimal separators.

use std::sync::LazyLock;

use regex::{Match, Regex};

use crate::models::{RefBounds, RefRange, ValueStatus};

/// Default width of the borderline band, as a fraction of the range.
pub const DEFAULT_BORDERLINE_RATIO: f64 = 0.05;

/// Smallest span used for degenerate ranges (`low == high`).
const MIN_SPAN: f64 = 1e-6;

/// `NUM - NUM`
pub(crate) static RANGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<low>-?[0-9]+(?:[.,][0-9]+)?)\s*[-–—]\s*(?P<high>-?[0-9]+(?:[.,][0-9]+)?)")
        .expect("Invalid range regex")
});

/// `< NUM`
pub(crate) static LESS_THAN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<\s*(?P<lim>-?[0-9]+(?:[.,][0-9]+)?)").expect("Invalid less-than regex")
});

/// `> NUM`
pub(crate) static GREATER_THAN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r">\s*(?P<lim>-?[0-9]+(?:[.,][0-9]+)?)").expect("Invalid greater-than regex")
});

/// A whole token that is a plain number.
static NUMBER_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+]?[0-9]+(?:[.,][0-9]+)?$").expect("Invalid number regex")
});

/// Parse a decimal with either `,` or `.` as separator.
pub fn parse_decimal(text: &str) -> Option<f64> {
    text.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Whether a whitespace-free token is a plain number.
pub fn is_number_token(token: &str) -> bool {
    NUMBER_TOKEN.is_match(token)
}

fn group_value(m: Option<Match<'_>>) -> Option<f64> {
    m.and_then(|m| parse_decimal(m.as_str()))
}

/// Parse a reference fragment. Never fails: unparseable text is `Unknown`.
///
/// Patterns are tried in order range, `<`, `>`; the first that matches wins.
pub fn parse_ref(ref_text: &str) -> RefRange {
    let text = ref_text.trim();

    if let Some(caps) = RANGE_PATTERN.captures(text) {
        let bounds = match (group_value(caps.name("low")), group_value(caps.name("high"))) {
            (Some(a), Some(b)) => RefBounds::Range {
                low: a.min(b),
                high: a.max(b),
            },
            _ => RefBounds::Unknown,
        };
        return RefRange {
            bounds,
            raw_text: text.to_string(),
        };
    }

    if let Some(caps) = LESS_THAN_PATTERN.captures(text) {
        let bounds = group_value(caps.name("lim"))
            .map(|high| RefBounds::LessThan { high })
            .unwrap_or(RefBounds::Unknown);
        return RefRange {
            bounds,
            raw_text: text.to_string(),
        };
    }

    if let Some(caps) = GREATER_THAN_PATTERN.captures(text) {
        let bounds = group_value(caps.name("lim"))
            .map(|low| RefBounds::GreaterThan { low })
            .unwrap_or(RefBounds::Unknown);
        return RefRange {
            bounds,
            raw_text: text.to_string(),
        };
    }

    RefRange::unknown(text)
}

/// Classify a value against a reference range.
///
/// `borderline_ratio` is the width of the borderline band: a fraction of the
/// span for two-sided ranges, a fraction of the limit for one-sided ones.
pub fn classify_value(value: Option<f64>, reference: &RefRange, borderline_ratio: f64) -> ValueStatus {
    let Some(value) = value.filter(|v| v.is_finite()) else {
        return ValueStatus::Unknown;
    };

    match reference.bounds {
        RefBounds::Range { low, high } => {
            if value < low {
                return ValueStatus::Low;
            }
            if value > high {
                return ValueStatus::High;
            }
            let band = (high - low).max(MIN_SPAN) * borderline_ratio;
            if value <= low + band || value >= high - band {
                ValueStatus::Borderline
            } else {
                ValueStatus::Normal
            }
        }
        RefBounds::LessThan { high } => {
            if value > high {
                ValueStatus::High
            } else if value >= high * (1.0 - borderline_ratio) {
                ValueStatus::Borderline
            } else {
                ValueStatus::Normal
            }
        }
        RefBounds::GreaterThan { low } => {
            if value < low {
                ValueStatus::Low
            } else if value <= low * (1.0 + borderline_ratio) {
                ValueStatus::Borderline
            } else {
                ValueStatus::Normal
            }
        }
        RefBounds::Unknown => ValueStatus::Unknown,
    }
}
