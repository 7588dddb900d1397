//! Clinical insight models.

use serde::{Deserialize, Serialize};

/// Severity tier of an insight. Declaration order is display order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warn,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Warn => "warn",
            Severity::Info => "info",
        }
    }
}

/// A single human-readable observation produced by the rule engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Insight {
    pub severity: Severity,
    pub title: String,
    pub detail: String,
}

impl Insight {
    pub fn new(severity: Severity, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.into(),
            detail: detail.into(),
        }
    }

    pub fn critical(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(Severity::Critical, title, detail)
    }

    pub fn warn(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(Severity::Warn, title, detail)
    }

    pub fn info(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(Severity::Info, title, detail)
    }
}

/// Stable sort by severity only; ties keep their generation order.
pub fn sort_by_severity(insights: &mut [Insight]) {
    insights.sort_by_key(|i| i.severity);
}
