//! Index to label mapping for the batik classifier output.

use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;

const BATIK_CODES: [&str; 20] = [
    "batik-bali",
    "batik-betawi",
    "batik-celup",
    "batik-cendrawasih",
    "batik-ceplok",
    "batik-ciamis",
    "batik-garutan",
    "batik-gentongan",
    "batik-kawung",
    "batik-keraton",
    "batik-lasem",
    "batik-megamendung",
    "batik-parang",
    "batik-pekalongan",
    "batik-priangan",
    "batik-sekar",
    "batik-sidoluhur",
    "batik-sidomukti",
    "batik-sogan",
    "batik-tambal",
];

const CODE_PREFIX: &str = "batik-";

/// Immutable list of label codes; the position of a code is its class index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    codes: Vec<String>,
}

impl Default for LabelSet {
    fn default() -> Self {
        Self {
            codes: BATIK_CODES.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl LabelSet {
    pub fn new(codes: Vec<String>) -> anyhow::Result<Self> {
        if codes.is_empty() {
            anyhow::bail!("label set is empty");
        }
        let mut seen = HashSet::new();
        for code in &codes {
            if code.trim().is_empty() {
                anyhow::bail!("label set contains an empty code");
            }
            if !seen.insert(code.as_str()) {
                anyhow::bail!("duplicate label code: {}", code);
            }
        }
        Ok(Self { codes })
    }

    /// Load a JSON array of codes, e.g. `["batik-bali", "batik-betawi"]`.
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read labels from {}", path.display()))?;
        let codes: Vec<String> = serde_json::from_str(&raw)
            .with_context(|| format!("labels file {} is not a JSON string array", path.display()))?;
        Self::new(codes)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.codes.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }
}

/// Human readable name for a label code: `"batik-sido-mukti"` -> `"Sido Mukti"`.
pub fn pattern_name(code: &str) -> String {
    title_case(&code.replace(CODE_PREFIX, "").replace('-', " "))
}

/// Upper-case the first letter of every run of letters and lower-case the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if prev_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(ch);
            prev_is_letter = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_labels() {
        let labels = LabelSet::default();
        assert_eq!(labels.len(), 20);
        assert_eq!(labels.get(0), Some("batik-bali"));
        assert_eq!(labels.get(11), Some("batik-megamendung"));
        assert_eq!(labels.get(19), Some("batik-tambal"));
        assert_eq!(labels.get(20), None);
    }

    #[test]
    fn test_pattern_name() {
        assert_eq!(pattern_name("batik-sidoluhur"), "Sidoluhur");
        assert_eq!(pattern_name("batik-megamendung"), "Megamendung");
        assert_eq!(pattern_name("batik-sido-mukti"), "Sido Mukti");
        assert_eq!(pattern_name("KAWUNG"), "Kawung");
        assert_eq!(pattern_name("batik-2x-parang"), "2X Parang");
    }

    #[test]
    fn test_rejects_bad_label_sets() {
        assert!(LabelSet::new(vec![]).is_err());
        assert!(LabelSet::new(vec!["a".into(), "a".into()]).is_err());
        assert!(LabelSet::new(vec!["a".into(), " ".into()]).is_err());
        assert!(LabelSet::new(vec!["a".into(), "b".into()]).is_ok());
    }

    #[test]
    fn test_from_json_file() {
        let path = std::env::temp_dir().join(format!("labels-{}.json", std::process::id()));
        std::fs::write(&path, r#"["batik-x", "batik-y"]"#).unwrap();
        let labels = LabelSet::from_json_file(&path).unwrap();
        assert_eq!(labels.codes(), &["batik-x".to_string(), "batik-y".to_string()]);
        std::fs::write(&path, r#"{"not": "a list"}"#).unwrap();
        assert!(LabelSet::from_json_file(&path).is_err());
        std::fs::remove_file(&path).unwrap();
    }
}
