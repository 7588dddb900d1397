//! Lab test name normalizer.
//!
//! Handles:
//! - Case folding and Turkish diacritic transliteration (İ→i, ş→s, ğ→g, ...)
//! - Punctuation collapse ("C-Reaktif Protein (CRP)" → "c reaktif protein crp")
//! - Synonym resolution ("crp turbidimetrik" → "crp")
//!
//! Keys are lookup-only and never displayed.

use std::collections::HashMap;

/// Canonical lookup key for a test name.
pub type NormalizedKey = String;

/// Normalizer for lab test names.
#[derive(Debug, Clone)]
pub struct TestNameNormalizer {
    /// Synonym map: cleaned variant → canonical key.
    /// Every canonical key is either absent from the map or maps to itself.
    synonyms: HashMap<String, String>,
}

impl Default for TestNameNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TestNameNormalizer {
    /// Create a normalizer with the built-in synonym table.
    pub fn new() -> Self {
        Self {
            synonyms: Self::default_synonyms(),
        }
    }

    /// Create a normalizer with no synonyms (cleaning only).
    pub fn without_synonyms() -> Self {
        Self {
            synonyms: HashMap::new(),
        }
    }

    /// Normalize a test name to its canonical key.
    pub fn normalize(&self, name: &str) -> NormalizedKey {
        let cleaned = clean_name(name);
        match self.synonyms.get(&cleaned) {
            Some(canonical) => canonical.clone(),
            None => cleaned,
        }
    }

    /// Whether a cleaned name has an entry in the synonym table.
    pub fn is_known(&self, name: &str) -> bool {
        self.synonyms.contains_key(&clean_name(name))
    }

    /// Add a synonym mapping. Both sides are cleaned first.
    ///
    /// The canonical side is resolved through the existing table, and entries
    /// that pointed at `alias` are re-pointed, so `normalize` stays idempotent.
    pub fn add_synonym(&mut self, alias: &str, canonical: &str) {
        let alias = clean_name(alias);
        let canonical = self.normalize(canonical);
        if alias.is_empty() || canonical.is_empty() {
            return;
        }

        for target in self.synonyms.values_mut() {
            if *target == alias {
                *target = canonical.clone();
            }
        }
        self.synonyms.insert(alias, canonical);
    }

    /// Number of synonym entries.
    pub fn len(&self) -> usize {
        self.synonyms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.synonyms.is_empty()
    }

    /// Default synonym table (Turkish lab report vocabulary).
    fn default_synonyms() -> HashMap<String, String> {
        let mut map = HashMap::new();

        // Inflammation
        map.insert("c reaktif protein".into(), "crp".into());
        map.insert("c reaktif protein crp".into(), "crp".into());
        map.insert("crp turbidimetrik".into(), "crp".into());
        map.insert("hs crp".into(), "hs crp".into());

        // Glycemic
        map.insert("aclik kan sekeri".into(), "glukoz aclik".into());
        map.insert("glukoz aclik kan sekeri".into(), "glukoz aclik".into());
        map.insert("glukoz".into(), "glukoz".into());
        map.insert("hba1c".into(), "hba1c".into());
        map.insert("hb a1c".into(), "hba1c".into());

        // Vitamins
        map.insert("vitamin d".into(), "25 oh vitamin d".into());
        map.insert("25 oh vitamin d".into(), "25 oh vitamin d".into());
        map.insert("b12".into(), "vitamin b12".into());
        map.insert("vitamin b12".into(), "vitamin b12".into());

        // Lipids
        map.insert("total kolesterol".into(), "kolesterol total".into());
        map.insert("kolesterol".into(), "kolesterol total".into());
        map.insert("ldl kolesterol".into(), "ldl".into());
        map.insert("hdl kolesterol".into(), "hdl".into());
        map.insert("trigliserid".into(), "trigliserid".into());
        map.insert("trigliserit".into(), "trigliserid".into());

        // Liver
        map.insert("alt".into(), "alt".into());
        map.insert("ast".into(), "ast".into());
        map.insert("ggt".into(), "ggt".into());

        // Thyroid
        map.insert("tsh".into(), "tsh".into());

        // Iron
        map.insert("ferritin".into(), "ferritin".into());
        map.insert("demir".into(), "demir".into());

        // Kidney
        map.insert("ure".into(), "ure".into());
        map.insert("kreatinin".into(), "kreatinin".into());
        map.insert("egfr".into(), "egfr".into());
        map.insert("uric acid".into(), "urik asit".into());
        map.insert("urik asit".into(), "urik asit".into());

        // Blood count
        map.insert("hemoglobin".into(), "hemoglobin".into());
        map.insert("hb".into(), "hemoglobin".into());

        map
    }
}

/// Map Turkish letters to their ASCII base letter.
fn transliterate(c: char) -> Option<char> {
    match c {
        'ı' | 'İ' => Some('i'),
        'ş' | 'Ş' => Some('s'),
        'ğ' | 'Ğ' => Some('g'),
        'ü' | 'Ü' => Some('u'),
        'ö' | 'Ö' => Some('o'),
        'ç' | 'Ç' => Some('c'),
        _ => None,
    }
}

/// Case folds that expand to more than one character.
fn full_fold(c: char) -> Option<&'static str> {
    match c {
        'ß' | 'ẞ' => Some("ss"),
        'ﬀ' => Some("ff"),
        'ﬁ' => Some("fi"),
        'ﬂ' => Some("fl"),
        'ﬃ' => Some("ffi"),
        'ﬄ' => Some("ffl"),
        'ﬅ' | 'ﬆ' => Some("st"),
        _ => None,
    }
}

/// Case-fold, transliterate, and collapse every non-`[a-z0-9]` run to one space.
pub fn clean_name(name: &str) -> String {
    let mut folded = String::with_capacity(name.len());
    for c in name.chars() {
        match (transliterate(c), full_fold(c)) {
            (Some(ascii), _) => folded.push(ascii),
            (None, Some(expanded)) => folded.push_str(expanded),
            (None, None) => folded.extend(c.to_lowercase()),
        }
    }

    let mut out = String::with_capacity(folded.len());
    let mut pending_space = false;
    for c in folded.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        } else {
            pending_space = true;
        }
    }
    out
}
