//! Lab-based insight rules.
//!
//! Each rule looks up zero or more normalized keys and yields at most one
//! insight. Numeric guards (e.g. glucose only in `60..=200`) keep values
//! reported in an unexpected unit from raising alarms.

use std::collections::HashMap;

use crate::models::{ClinicalThresholds, Insight, LabRow, ValueStatus};
use crate::normalizer::{NormalizedKey, TestNameNormalizer};

/// Rows indexed by normalized test name.
pub struct LabLookup<'a> {
    by_key: HashMap<NormalizedKey, &'a LabRow>,
}

impl<'a> LabLookup<'a> {
    /// Index rows by key. On collision the first row wins, unless it has no
    /// numeric value and a later one does.
    pub fn build(rows: &'a [LabRow], normalizer: &TestNameNormalizer) -> Self {
        let mut by_key: HashMap<NormalizedKey, &'a LabRow> = HashMap::new();
        for row in rows {
            let key = normalizer.normalize(&row.test_name);
            let replace = match by_key.get(&key) {
                Some(current) => !current.has_value() && row.has_value(),
                None => true,
            };
            if replace {
                by_key.insert(key, row);
            }
        }
        Self { by_key }
    }

    pub fn row(&self, key: &str) -> Option<&'a LabRow> {
        self.by_key.get(key).copied()
    }

    pub fn value(&self, key: &str) -> Option<f64> {
        self.row(key).and_then(|r| r.result_value)
    }

    pub fn status(&self, key: &str) -> ValueStatus {
        self.row(key).map_or(ValueStatus::Unknown, |r| r.status)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// A self-contained rule.
pub type LabRule = fn(&LabLookup<'_>, &ClinicalThresholds) -> Option<Insight>;

/// Rules in evaluation order. Ties in severity keep this order.
pub const LAB_RULES: &[(&str, LabRule)] = &[
    ("glycemic", glycemic),
    ("ldl", ldl),
    ("hdl", hdl),
    ("triglycerides", triglycerides),
    ("total_cholesterol", total_cholesterol),
    ("alt", alt),
    ("ast", ast),
    ("ggt", ggt),
    ("tsh", tsh),
    ("ferritin", ferritin),
    ("vitamin_d", vitamin_d),
    ("vitamin_b12", vitamin_b12),
    ("crp", crp),
    ("egfr", egfr),
    ("creatinine", creatinine),
];

/// HbA1c when present, otherwise fasting glucose in mg/dL.
pub fn glycemic(labs: &LabLookup<'_>, t: &ClinicalThresholds) -> Option<Insight> {
    if let Some(a1c) = labs.value("hba1c") {
        return Some(if a1c >= t.hba1c_critical {
            Insight::critical(
                format!("HbA1c high ({a1c:.2})."),
                "May be in the diabetic range. Clinical confirmation and physician review recommended.",
            )
        } else if a1c >= t.hba1c_warn {
            Insight::warn(
                format!("HbA1c borderline/high ({a1c:.2})."),
                "Review lifestyle for prediabetes and insulin resistance: fibre, protein balance, activity, sleep.",
            )
        } else {
            Insight::info(
                format!("HbA1c normal ({a1c:.2})."),
                "Glycaemic control looks good; continue with sustainable eating habits.",
            )
        });
    }

    let glucose = labs.value("glukoz aclik").or_else(|| labs.value("glukoz"))?;
    if !(60.0..=200.0).contains(&glucose) {
        return None;
    }
    Some(if glucose >= 126.0 {
        Insight::critical(
            format!("Fasting glucose high ({glucose:.0})."),
            "May be in the diabetic range. Clinical confirmation and physician review recommended.",
        )
    } else if glucose >= 100.0 {
        Insight::warn(
            format!("Fasting glucose borderline/high ({glucose:.0})."),
            "Plan diet and activity with prediabetes and insulin resistance in mind.",
        )
    } else {
        Insight::info(
            format!("Fasting glucose normal ({glucose:.0})."),
            "Glycaemic control looks good.",
        )
    })
}

pub fn ldl(labs: &LabLookup<'_>, t: &ClinicalThresholds) -> Option<Insight> {
    let ldl = labs.value("ldl").filter(|v| (40.0..=250.0).contains(v))?;
    if ldl >= t.ldl_critical {
        Some(Insight::critical(
            format!("LDL very high ({ldl:.0})."),
            "Physician review needed, including for familial hypercholesterolaemia.",
        ))
    } else if ldl >= t.ldl_warn {
        Some(Insight::warn(
            format!("LDL high ({ldl:.0})."),
            "Consider cutting saturated fat and ultra-processed food, more fibre, and a weight/activity plan.",
        ))
    } else if ldl >= 130.0 {
        Some(Insight::warn(
            format!("LDL borderline ({ldl:.0})."),
            "Set targets according to the cardiovascular risk profile.",
        ))
    } else {
        None
    }
}

pub fn hdl(labs: &LabLookup<'_>, _t: &ClinicalThresholds) -> Option<Insight> {
    let hdl = labs.value("hdl").filter(|v| (10.0..=120.0).contains(v))?;
    (hdl < 40.0).then(|| {
        Insight::warn(
            format!("HDL low ({hdl:.0})."),
            "Regular aerobic activity, weight management and smoking cessation support may help.",
        )
    })
}

pub fn triglycerides(labs: &LabLookup<'_>, _t: &ClinicalThresholds) -> Option<Insight> {
    let tg = labs.value("trigliserid").filter(|v| (30.0..=800.0).contains(v))?;
    if tg >= 500.0 {
        Some(Insight::critical(
            format!("Triglycerides very high ({tg:.0})."),
            "Urgent physician review may be needed because of pancreatitis risk.",
        ))
    } else if tg >= 200.0 {
        Some(Insight::warn(
            format!("Triglycerides high ({tg:.0})."),
            "Consider less sugar and refined carbohydrate, limiting alcohol, omega-3 sources and an activity plan.",
        ))
    } else if tg >= 150.0 {
        Some(Insight::warn(
            format!("Triglycerides borderline ({tg:.0})."),
            "Review carbohydrate quality and overall energy balance.",
        ))
    } else {
        None
    }
}

pub fn total_cholesterol(labs: &LabLookup<'_>, _t: &ClinicalThresholds) -> Option<Insight> {
    let total = labs
        .value("kolesterol total")
        .filter(|v| (80.0..=400.0).contains(v))?;
    (total >= 240.0).then(|| {
        Insight::warn(
            format!("Total cholesterol high ({total:.0})."),
            "Interpret together with LDL, HDL and triglycerides.",
        )
    })
}

/// Liver enzymes: reference ranges vary by lab, so only the row status is used.
fn liver_enzyme(labs: &LabLookup<'_>, key: &str, label: &str) -> Option<Insight> {
    if labs.status(key) != ValueStatus::High {
        return None;
    }
    let title = match labs.value(key) {
        Some(v) => format!("{label} high ({v:.0})."),
        None => format!("{label} high."),
    };
    Some(Insight::warn(
        title,
        "Clinical review needed for causes such as fatty liver, alcohol or medication effects.",
    ))
}

pub fn alt(labs: &LabLookup<'_>, _t: &ClinicalThresholds) -> Option<Insight> {
    liver_enzyme(labs, "alt", "ALT")
}

pub fn ast(labs: &LabLookup<'_>, _t: &ClinicalThresholds) -> Option<Insight> {
    liver_enzyme(labs, "ast", "AST")
}

pub fn ggt(labs: &LabLookup<'_>, _t: &ClinicalThresholds) -> Option<Insight> {
    liver_enzyme(labs, "ggt", "GGT")
}

/// TSH with both hypothyroid (high) and hyperthyroid (low) bands.
pub fn tsh(labs: &LabLookup<'_>, _t: &ClinicalThresholds) -> Option<Insight> {
    let tsh = labs.value("tsh")?;
    if tsh >= 10.0 {
        Some(Insight::critical(
            format!("TSH high ({tsh:.2})."),
            "Physician review recommended for possible hypothyroidism.",
        ))
    } else if tsh > 4.5 {
        Some(Insight::warn(
            format!("TSH high ({tsh:.2})."),
            "Clinical confirmation of thyroid function recommended.",
        ))
    } else if tsh < 0.1 {
        Some(Insight::critical(
            format!("TSH very low ({tsh:.2})."),
            "Physician review recommended for possible hyperthyroidism.",
        ))
    } else if tsh < 0.4 {
        Some(Insight::warn(
            format!("TSH low ({tsh:.2})."),
            "Clinical confirmation of thyroid function recommended.",
        ))
    } else {
        None
    }
}

pub fn ferritin(labs: &LabLookup<'_>, _t: &ClinicalThresholds) -> Option<Insight> {
    let ferritin = labs.value("ferritin")?;
    (ferritin < 15.0).then(|| {
        Insight::warn(
            format!("Ferritin low ({ferritin:.1})."),
            "Iron stores may be low. Consider heme/non-heme iron intake, pairing with vitamin C, and physician review.",
        )
    })
}

pub fn vitamin_d(labs: &LabLookup<'_>, _t: &ClinicalThresholds) -> Option<Insight> {
    let vitd = labs.value("25 oh vitamin d")?;
    if vitd < 10.0 {
        Some(Insight::warn(
            format!("Vitamin D very low ({vitd:.1})."),
            "Sun exposure and a supplementation plan under physician supervision can be considered.",
        ))
    } else if vitd < 20.0 {
        Some(Insight::warn(
            format!("Vitamin D low ({vitd:.1})."),
            "Adequate sun exposure and supplementation under physician supervision can be considered.",
        ))
    } else if vitd < 30.0 {
        Some(Insight::info(
            format!("Vitamin D borderline ({vitd:.1})."),
            "Plan lifestyle support to keep a sustainable level.",
        ))
    } else {
        None
    }
}

pub fn vitamin_b12(labs: &LabLookup<'_>, _t: &ClinicalThresholds) -> Option<Insight> {
    let b12 = labs.value("vitamin b12")?;
    (b12 < 200.0).then(|| {
        Insight::warn(
            format!("B12 low ({b12:.0})."),
            "Review animal-source intake and absorption; consider supplementation under physician supervision.",
        )
    })
}

/// CRP (or hs-CRP when plain CRP is missing).
pub fn crp(labs: &LabLookup<'_>, t: &ClinicalThresholds) -> Option<Insight> {
    let crp = labs.value("crp").or_else(|| labs.value("hs crp"))?;
    (labs.status("crp") == ValueStatus::High || crp > t.crp_warn).then(|| {
        Insight::warn(
            format!("CRP high ({crp:.1})."),
            "May indicate acute infection or inflammation. Interpret with the clinical picture.",
        )
    })
}

pub fn egfr(labs: &LabLookup<'_>, _t: &ClinicalThresholds) -> Option<Insight> {
    let egfr = labs.value("egfr")?;
    (egfr < 60.0).then(|| {
        Insight::warn(
            format!("eGFR low ({egfr:.0})."),
            "Physician review of kidney function needed (protein intake, medication, hypertension).",
        )
    })
}

pub fn creatinine(labs: &LabLookup<'_>, _t: &ClinicalThresholds) -> Option<Insight> {
    let kreat = labs.value("kreatinin")?;
    (labs.status("kreatinin") == ValueStatus::High).then(|| {
        Insight::warn(
            format!("Creatinine high ({kreat:.2})."),
            "Evaluate together with kidney function, hydration and medications.",
        )
    })
}

/// Run every rule over the lookup, in order.
pub fn evaluate_rules(labs: &LabLookup<'_>, thresholds: &ClinicalThresholds) -> Vec<Insight> {
    LAB_RULES
        .iter()
        .filter_map(|(_, rule)| rule(labs, thresholds))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;
    use crate::parser::parse_ref;

    fn row(name: &str, value: Option<f64>, status: ValueStatus) -> LabRow {
        LabRow {
            test_name: name.into(),
            result_text: value.map(|v| v.to_string()).unwrap_or_default(),
            result_value: value,
            unit: String::new(),
            ref_text: String::new(),
            reference: parse_ref(""),
            status,
        }
    }

    fn lookup(rows: &[LabRow]) -> LabLookup<'_> {
        LabLookup::build(rows, &TestNameNormalizer::new())
    }

    fn single(name: &str, value: f64, rule: LabRule) -> Option<Insight> {
        let rows = vec![row(name, Some(value), ValueStatus::Unknown)];
        rule(&lookup(&rows), &ClinicalThresholds::default())
    }

    #[test]
    fn test_lookup_prefers_numeric() {
        let rows = vec![
            row("CRP", None, ValueStatus::Unknown),
            row("C-Reaktif Protein (CRP)", Some(12.0), ValueStatus::High),
            row("crp turbidimetrik", Some(3.0), ValueStatus::Normal),
        ];
        let labs = lookup(&rows);
        assert_eq!(labs.len(), 1);
        assert_eq!(labs.value("crp"), Some(12.0));
        assert_eq!(labs.status("crp"), ValueStatus::High);
        assert_eq!(labs.status("missing"), ValueStatus::Unknown);
    }

    #[test]
    fn test_glycemic_hba1c_tiers() {
        assert_eq!(single("HbA1c", 7.1, glycemic).unwrap().severity, Severity::Critical);
        assert_eq!(single("HbA1c", 5.9, glycemic).unwrap().severity, Severity::Warn);
        assert_eq!(single("HbA1c", 5.2, glycemic).unwrap().severity, Severity::Info);
    }

    #[test]
    fn test_glycemic_prefers_hba1c() {
        let rows = vec![
            row("Glukoz", Some(150.0), ValueStatus::High),
            row("HbA1c", Some(5.2), ValueStatus::Normal),
        ];
        let insight = glycemic(&lookup(&rows), &ClinicalThresholds::default()).unwrap();
        assert!(insight.title.contains("HbA1c"));
        assert_eq!(insight.severity, Severity::Info);
    }

    #[test]
    fn test_glucose_guard_and_tiers() {
        assert_eq!(single("Glukoz", 130.0, glycemic).unwrap().severity, Severity::Critical);
        assert_eq!(
            single("Açlık Kan Şekeri", 110.0, glycemic).unwrap().severity,
            Severity::Warn
        );
        assert_eq!(single("Glukoz", 85.0, glycemic).unwrap().severity, Severity::Info);
        // mmol/L value, outside the mg/dL plausibility window
        assert!(single("Glukoz", 7.2, glycemic).is_none());
        assert!(single("Glukoz", 250.0, glycemic).is_none());
    }

    #[test]
    fn test_lipids() {
        assert_eq!(single("LDL Kolesterol", 195.0, ldl).unwrap().severity, Severity::Critical);
        assert_eq!(single("LDL Kolesterol", 165.0, ldl).unwrap().severity, Severity::Warn);
        assert!(single("LDL Kolesterol", 135.0, ldl).unwrap().title.contains("borderline"));
        assert!(single("LDL Kolesterol", 100.0, ldl).is_none());
        assert!(single("LDL Kolesterol", 3.4, ldl).is_none());

        assert!(single("HDL Kolesterol", 28.0, hdl).is_some());
        assert!(single("HDL Kolesterol", 55.0, hdl).is_none());

        assert_eq!(single("Trigliserit", 520.0, triglycerides).unwrap().severity, Severity::Critical);
        assert_eq!(single("Trigliserid", 220.0, triglycerides).unwrap().severity, Severity::Warn);
        assert!(single("Trigliserid", 120.0, triglycerides).is_none());

        assert!(single("Total Kolesterol", 250.0, total_cholesterol).is_some());
        assert!(single("Kolesterol", 180.0, total_cholesterol).is_none());
    }

    #[test]
    fn test_liver_uses_status() {
        let rows = vec![
            row("ALT", Some(80.0), ValueStatus::High),
            row("AST", Some(80.0), ValueStatus::Normal),
        ];
        let labs = lookup(&rows);
        let t = ClinicalThresholds::default();
        assert_eq!(alt(&labs, &t).unwrap().title, "ALT high (80).");
        assert!(ast(&labs, &t).is_none());
        assert!(ggt(&labs, &t).is_none());
    }

    #[test]
    fn test_tsh_bands() {
        assert_eq!(single("TSH", 12.0, tsh).unwrap().severity, Severity::Critical);
        assert_eq!(single("TSH", 6.0, tsh).unwrap().severity, Severity::Warn);
        assert!(single("TSH", 2.0, tsh).is_none());
        assert_eq!(single("TSH", 0.3, tsh).unwrap().severity, Severity::Warn);
        let low = single("TSH", 0.05, tsh).unwrap();
        assert_eq!(low.severity, Severity::Critical);
        assert!(low.title.contains("very low"));
    }

    #[test]
    fn test_vitamins_and_iron() {
        assert!(single("Ferritin", 9.0, ferritin).is_some());
        assert!(single("Ferritin", 40.0, ferritin).is_none());
        assert!(single("Vitamin D", 8.0, vitamin_d).unwrap().title.contains("very low"));
        assert_eq!(single("25-OH Vitamin D", 25.0, vitamin_d).unwrap().severity, Severity::Info);
        assert!(single("Vitamin D", 45.0, vitamin_d).is_none());
        assert!(single("B12", 150.0, vitamin_b12).is_some());
        assert!(single("Vitamin B12", 400.0, vitamin_b12).is_none());
    }

    #[test]
    fn test_crp_threshold_and_status() {
        assert!(single("CRP", 12.0, crp).is_some());
        assert!(single("CRP", 4.0, crp).is_none());
        assert!(single("hs-CRP", 11.0, crp).is_some());

        let rows = vec![row("CRP", Some(6.0), ValueStatus::High)];
        assert!(crp(&lookup(&rows), &ClinicalThresholds::default()).is_some());

        let strict = ClinicalThresholds {
            crp_warn: 3.0,
            ..Default::default()
        };
        let rows = vec![row("CRP", Some(4.0), ValueStatus::Normal)];
        assert!(crp(&lookup(&rows), &strict).is_some());
    }

    #[test]
    fn test_kidney() {
        assert!(single("eGFR", 45.0, egfr).is_some());
        assert!(single("eGFR", 95.0, egfr).is_none());

        let rows = vec![row("Kreatinin", Some(1.6), ValueStatus::High)];
        let insight = creatinine(&lookup(&rows), &ClinicalThresholds::default()).unwrap();
        assert_eq!(insight.title, "Creatinine high (1.60).");
    }

    #[test]
    fn test_rule_names_unique() {
        let mut names: Vec<&str> = LAB_RULES.iter().map(|(name, _)| *name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), LAB_RULES.len());
    }
}
