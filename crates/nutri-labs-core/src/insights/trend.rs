//! Measurement trend alerts (weight rate, BMI band, waist, direction).

use crate::models::{sort_by_severity, ClinicalThresholds, Insight, MeasurementPoint};

/// Computes trend insights from a measurement history.
pub struct TrendAnalyzer<'a> {
    thresholds: &'a ClinicalThresholds,
}

impl<'a> TrendAnalyzer<'a> {
    pub fn new(thresholds: &'a ClinicalThresholds) -> Self {
        Self { thresholds }
    }

    /// Analyze a history in any order. Points without a positive weight are ignored.
    ///
    /// Fewer than two usable points yield a single "needs more data" insight;
    /// otherwise the result is never empty.
    pub fn analyze(&self, history: &[MeasurementPoint]) -> Vec<Insight> {
        let mut points: Vec<&MeasurementPoint> = history
            .iter()
            .filter(|p| p.positive_weight().is_some())
            .collect();
        if points.len() < 2 {
            return vec![Insight::info(
                "At least 2 measurements are needed for trend analysis.",
                "Trend alerts appear automatically as new measurements are entered.",
            )];
        }
        points.sort_by_key(|p| p.date);

        let latest = points[points.len() - 1];
        let previous = points[points.len() - 2];

        let mut out: Vec<Insight> = [
            self.weight_rate(previous, latest),
            bmi_band(latest),
            self.waist(latest),
            weight_direction(&points),
        ]
        .into_iter()
        .flatten()
        .collect();

        if out.is_empty() {
            out.push(Insight::info(
                "No notable risk or warning in the measurement trend.",
                "Regular measurements and notes keep follow-up sustainable.",
            ));
        }

        sort_by_severity(&mut out);
        out
    }

    /// Weekly weight change between the two most recent points.
    pub fn weight_rate(&self, previous: &MeasurementPoint, latest: &MeasurementPoint) -> Option<Insight> {
        let change = latest.positive_weight()? - previous.positive_weight()?;
        let days = (latest.date - previous.date).num_days().max(1);
        let weekly = change / days as f64 * 7.0;
        let span = if days == 1 {
            "1 day".to_string()
        } else {
            format!("{days} days")
        };

        if weekly.abs() >= self.thresholds.weight_rate_warn {
            Some(Insight::warn(
                format!("Rapid weight change ({change:+.1} kg / {span})."),
                "Fast changes may come from fluid/oedema, adherence or measurement conditions; review the plan and follow-up frequency.",
            ))
        } else if weekly.abs() >= self.thresholds.weight_rate_info {
            Some(Insight::info(
                format!("Notable weight change ({change:+.1} kg / {span})."),
                "Check that the pace is sustainable for the goal.",
            ))
        } else {
            None
        }
    }

    /// Waist circumference of the latest point.
    pub fn waist(&self, latest: &MeasurementPoint) -> Option<Insight> {
        let waist = latest.waist_cm.filter(|w| *w > 0.0)?;
        if waist >= self.thresholds.waist_warn {
            Some(Insight::warn(
                format!("Waist circumference high ({waist:.0} cm)."),
                "Central obesity risk may be raised; a diet and activity plan with follow-up is recommended.",
            ))
        } else if waist >= self.thresholds.waist_info {
            Some(Insight::info(
                format!("Waist circumference to monitor ({waist:.0} cm)."),
                "Track alongside weight and fat distribution goals.",
            ))
        } else {
            None
        }
    }
}

/// BMI band of the latest point, when height is known.
pub fn bmi_band(latest: &MeasurementPoint) -> Option<Insight> {
    let bmi = latest.bmi()?;
    if bmi >= 35.0 {
        Some(Insight::warn(
            format!("BMI high ({bmi:.1})."),
            "Planning by cardiometabolic risk profile and physician collaboration may be needed.",
        ))
    } else if bmi >= 30.0 {
        Some(Insight::warn(
            format!("BMI in the obesity range ({bmi:.1})."),
            "A sustainable weight plan covering lifestyle, sleep, stress and activity is recommended.",
        ))
    } else if bmi >= 25.0 {
        Some(Insight::info(
            format!("BMI in the overweight range ({bmi:.1})."),
            "Clarify goals with the client's expectations and clinical situation.",
        ))
    } else {
        None
    }
}

/// Strict monotonic rise or fall over the last three points (sorted ascending).
pub fn weight_direction(points: &[&MeasurementPoint]) -> Option<Insight> {
    let [a, b, c] = points.get(points.len().checked_sub(3)?..)? else {
        return None;
    };
    let (w0, w1, w2) = (a.positive_weight()?, b.positive_weight()?, c.positive_weight()?);

    if w2 > w1 && w1 > w0 {
        Some(Insight::warn(
            "Weight has risen over the last 3 measurements.",
            "Review adherence, total energy balance and the activity plan.",
        ))
    } else if w2 < w1 && w1 < w0 {
        Some(Insight::info(
            "Weight has fallen over the last 3 measurements.",
            "Assess pace and sustainability against the goal.",
        ))
    } else {
        None
    }
}
