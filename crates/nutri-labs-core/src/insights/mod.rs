//! Rule-based clinical insight engine.
//!
//! Two independent passes, both returning severity-sorted lists:
//! - [`InsightEngine::lab_insights`]: classified lab rows → insights
//! - [`InsightEngine::measurement_alerts`]: measurement history → trend insights
//!
//! Not a medical device. Output is a set of suggestions for the clinician to
//! validate.

mod lab_rules;
mod trend;

pub use lab_rules::*;
pub use trend::*;

use crate::models::{
    sort_by_severity, ClinicalThresholds, Insight, LabRow, MeasurementPoint, ThresholdResult,
};
use crate::normalizer::TestNameNormalizer;

/// Insight engine holding validated thresholds and the name normalizer.
#[derive(Debug, Clone, Default)]
pub struct InsightEngine {
    thresholds: ClinicalThresholds,
    normalizer: TestNameNormalizer,
}

impl InsightEngine {
    /// Create an engine. Fails fast on invalid thresholds.
    pub fn new(thresholds: ClinicalThresholds) -> ThresholdResult<Self> {
        thresholds.validate()?;
        Ok(Self {
            thresholds,
            normalizer: TestNameNormalizer::new(),
        })
    }

    /// Replace the test name normalizer.
    pub fn with_normalizer(mut self, normalizer: TestNameNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn thresholds(&self) -> &ClinicalThresholds {
        &self.thresholds
    }

    pub fn normalizer(&self) -> &TestNameNormalizer {
        &self.normalizer
    }

    /// Generate insights from lab rows, which may contain duplicates.
    ///
    /// When rows exist but no rule fires, a single neutral info insight is
    /// returned. No rows → no insights.
    pub fn lab_insights(&self, rows: &[LabRow]) -> Vec<Insight> {
        if rows.is_empty() {
            return Vec::new();
        }

        let labs = LabLookup::build(rows, &self.normalizer);
        let mut out = evaluate_rules(&labs, &self.thresholds);
        tracing::debug!(
            rows = rows.len(),
            keys = labs.len(),
            insights = out.len(),
            "Evaluated lab rules"
        );

        if out.is_empty() {
            out.push(Insight::info(
                "No notable automatic warning found.",
                "Interpret the values together with the clinical context and client history.",
            ));
        }

        sort_by_severity(&mut out);
        out
    }

    /// Generate trend alerts from a measurement history in any order.
    pub fn measurement_alerts(&self, history: &[MeasurementPoint]) -> Vec<Insight> {
        TrendAnalyzer::new(&self.thresholds).analyze(history)
    }
}
