//! Lab result models produced by the report parser.

use serde::{Deserialize, Serialize};

/// Bounds of a laboratory reference range.
///
/// Each variant carries exactly the bounds it needs, so a "range" without
/// an upper bound cannot be represented.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RefBounds {
    /// Two-sided interval, `low <= high`.
    Range { low: f64, high: f64 },
    /// Upper limit only (`<126`).
    LessThan { high: f64 },
    /// Lower limit only (`>40`).
    GreaterThan { low: f64 },
    /// No parseable bound.
    Unknown,
}

/// A parsed reference range together with the text it came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefRange {
    /// Parsed bounds
    pub bounds: RefBounds,
    /// Reference text as it appeared in the report (trimmed)
    pub raw_text: String,
}

impl RefRange {
    /// A range with no usable bounds.
    pub fn unknown(raw_text: impl Into<String>) -> Self {
        Self {
            bounds: RefBounds::Unknown,
            raw_text: raw_text.into(),
        }
    }

    /// Rebuild a range from its stored columns.
    ///
    /// Combinations that violate the bound invariants degrade to `Unknown`.
    pub fn from_parts(mode: &str, low: Option<f64>, high: Option<f64>, raw_text: String) -> Self {
        let finite = |v: Option<f64>| v.filter(|x| x.is_finite());
        let bounds = match (mode, finite(low), finite(high)) {
            ("range", Some(low), Some(high)) if low <= high => RefBounds::Range { low, high },
            ("lt", _, Some(high)) => RefBounds::LessThan { high },
            ("gt", Some(low), _) => RefBounds::GreaterThan { low },
            _ => RefBounds::Unknown,
        };
        Self { bounds, raw_text }
    }

    /// Storage tag for the range mode.
    pub fn mode(&self) -> &'static str {
        match self.bounds {
            RefBounds::Range { .. } => "range",
            RefBounds::LessThan { .. } => "lt",
            RefBounds::GreaterThan { .. } => "gt",
            RefBounds::Unknown => "unknown",
        }
    }

    /// Lower bound, if the mode has one.
    pub fn low(&self) -> Option<f64> {
        match self.bounds {
            RefBounds::Range { low, .. } | RefBounds::GreaterThan { low } => Some(low),
            _ => None,
        }
    }

    /// Upper bound, if the mode has one.
    pub fn high(&self) -> Option<f64> {
        match self.bounds {
            RefBounds::Range { high, .. } | RefBounds::LessThan { high } => Some(high),
            _ => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self.bounds, RefBounds::Unknown)
    }
}

/// Classification of a result against its reference range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ValueStatus {
    Low,
    High,
    Borderline,
    Normal,
    Unknown,
}

impl ValueStatus {
    /// Lowercase storage / display tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueStatus::Low => "low",
            ValueStatus::High => "high",
            ValueStatus::Borderline => "borderline",
            ValueStatus::Normal => "normal",
            ValueStatus::Unknown => "unknown",
        }
    }

    /// Parse a stored tag. Anything unrecognised is `Unknown`.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "low" => ValueStatus::Low,
            "high" => ValueStatus::High,
            "borderline" => ValueStatus::Borderline,
            "normal" => ValueStatus::Normal,
            _ => ValueStatus::Unknown,
        }
    }

    /// Whether the value falls outside the reference range.
    pub fn is_abnormal(&self) -> bool {
        matches!(self, ValueStatus::Low | ValueStatus::High)
    }
}

/// One extracted lab result line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabRow {
    /// Test name as printed in the report
    pub test_name: String,
    /// Result token as printed (e.g. "1,5")
    pub result_text: String,
    /// Numeric result, if the token parsed
    pub result_value: Option<f64>,
    /// Unit text between result and reference (may be empty)
    pub unit: String,
    /// Reference fragment text
    pub ref_text: String,
    /// Parsed reference range
    #[serde(rename = "ref")]
    pub reference: RefRange,
    /// Classification of `result_value` against `reference`
    pub status: ValueStatus,
}

impl LabRow {
    pub fn has_value(&self) -> bool {
        self.result_value.is_some()
    }
}
