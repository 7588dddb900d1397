//! Clinical threshold configuration.
//!
//! Thresholds are plain values supplied by the host. Partial overrides are
//! merged over the defaults and validated before any rule sees them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Threshold configuration errors.
#[derive(Error, Debug, PartialEq)]
pub enum ThresholdError {
    #[error("Threshold {name} must be a finite number, got {value}")]
    NotFinite { name: &'static str, value: f64 },

    #[error("Threshold {name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f64 },

    #[error("Threshold {lower} ({lower_value}) must not exceed {upper} ({upper_value})")]
    Inverted {
        lower: &'static str,
        lower_value: f64,
        upper: &'static str,
        upper_value: f64,
    },

    #[error("Invalid threshold overrides: {0}")]
    Json(String),
}

pub type ThresholdResult<T> = Result<T, ThresholdError>;

/// Cut-offs used by the lab and measurement rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClinicalThresholds {
    /// Weekly weight change (absolute, kg/week) reported as info
    pub weight_rate_info: f64,
    /// Weekly weight change (absolute, kg/week) reported as warning
    pub weight_rate_warn: f64,
    /// Waist circumference (cm) reported as info
    pub waist_info: f64,
    /// Waist circumference (cm) reported as warning
    pub waist_warn: f64,
    /// CRP (mg/L) above which inflammation is flagged
    pub crp_warn: f64,
    /// HbA1c (%) prediabetes band
    pub hba1c_warn: f64,
    /// HbA1c (%) diabetes band
    pub hba1c_critical: f64,
    /// LDL (mg/dL) high band
    pub ldl_warn: f64,
    /// LDL (mg/dL) very high band
    pub ldl_critical: f64,
}

impl Default for ClinicalThresholds {
    fn default() -> Self {
        Self {
            weight_rate_info: 1.0,
            weight_rate_warn: 2.0,
            waist_info: 95.0,
            waist_warn: 110.0,
            crp_warn: 10.0,
            hba1c_warn: 5.7,
            hba1c_critical: 6.5,
            ldl_warn: 160.0,
            ldl_critical: 190.0,
        }
    }
}

impl ClinicalThresholds {
    /// Merge a partial JSON object over the defaults and validate.
    ///
    /// Unknown keys and `null` values are ignored.
    pub fn from_overrides_json(json: &str) -> ThresholdResult<Self> {
        let overrides: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(json).map_err(|e| ThresholdError::Json(e.to_string()))?;

        let mut merged = serde_json::to_value(Self::default())
            .map_err(|e| ThresholdError::Json(e.to_string()))?;
        if let serde_json::Value::Object(fields) = &mut merged {
            for (key, value) in overrides {
                if value.is_null() || !fields.contains_key(&key) {
                    continue;
                }
                fields.insert(key, value);
            }
        }

        let thresholds: Self =
            serde_json::from_value(merged).map_err(|e| ThresholdError::Json(e.to_string()))?;
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Named values, in declaration order.
    pub fn fields(&self) -> [(&'static str, f64); 9] {
        [
            ("weight_rate_info", self.weight_rate_info),
            ("weight_rate_warn", self.weight_rate_warn),
            ("waist_info", self.waist_info),
            ("waist_warn", self.waist_warn),
            ("crp_warn", self.crp_warn),
            ("hba1c_warn", self.hba1c_warn),
            ("hba1c_critical", self.hba1c_critical),
            ("ldl_warn", self.ldl_warn),
            ("ldl_critical", self.ldl_critical),
        ]
    }

    /// Check every value is finite and non-negative and tiers are ordered.
    pub fn validate(&self) -> ThresholdResult<()> {
        for (name, value) in self.fields() {
            if !value.is_finite() {
                return Err(ThresholdError::NotFinite { name, value });
            }
            if value < 0.0 {
                return Err(ThresholdError::Negative { name, value });
            }
        }

        let tiers = [
            ("weight_rate_info", self.weight_rate_info, "weight_rate_warn", self.weight_rate_warn),
            ("waist_info", self.waist_info, "waist_warn", self.waist_warn),
            ("hba1c_warn", self.hba1c_warn, "hba1c_critical", self.hba1c_critical),
            ("ldl_warn", self.ldl_warn, "ldl_critical", self.ldl_critical),
        ];
        for (lower, lower_value, upper, upper_value) in tiers {
            if lower_value > upper_value {
                return Err(ThresholdError::Inverted {
                    lower,
                    lower_value,
                    upper,
                    upper_value,
                });
            }
        }

        Ok(())
    }
}
