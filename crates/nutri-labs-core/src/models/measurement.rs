//! Anthropometric measurement models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One point of a client's measurement history, as consumed by trend analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeasurementPoint {
    pub date: NaiveDate,
    pub weight_kg: Option<f64>,
    pub waist_cm: Option<f64>,
    pub height_cm: Option<f64>,
}

impl MeasurementPoint {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            weight_kg: None,
            waist_cm: None,
            height_cm: None,
        }
    }

    pub fn with_weight(mut self, weight_kg: f64) -> Self {
        self.weight_kg = Some(weight_kg);
        self
    }

    pub fn with_waist(mut self, waist_cm: f64) -> Self {
        self.waist_cm = Some(waist_cm);
        self
    }

    pub fn with_height(mut self, height_cm: f64) -> Self {
        self.height_cm = Some(height_cm);
        self
    }

    /// Weight if recorded and positive.
    pub fn positive_weight(&self) -> Option<f64> {
        self.weight_kg.filter(|w| *w > 0.0)
    }

    /// Body mass index, when both height and weight are usable.
    pub fn bmi(&self) -> Option<f64> {
        let weight = self.positive_weight()?;
        let height_m = self.height_cm.filter(|h| *h > 0.0)? / 100.0;
        Some(weight / (height_m * height_m))
    }
}

/// A stored measurement belonging to a client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeasurementRecord {
    /// Local UUID
    pub id: String,
    /// Owning client
    pub client_id: String,
    /// The measured values
    pub point: MeasurementPoint,
    /// Free-text notes
    pub notes: String,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
}

impl MeasurementRecord {
    /// Create a new record for a client.
    pub fn new(client_id: String, point: MeasurementPoint) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            client_id,
            point,
            notes: String::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
