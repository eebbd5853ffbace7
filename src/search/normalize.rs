//! Identifier normalization: case folding, diacritic stripping and
//! canonicalization of known spelling variants.

use std::collections::{HashMap, HashSet};

use super::Node;
use crate::error::{FrontierError, Result};

/// Default spelling variants collapsed onto one canonical form.
const DEFAULT_VARIANTS: &[(&str, &str)] = &[("RAFAŁ", "RAFAL"), ("RAFAEL", "RAFAL")];

/// Map an upper-case letter with a diacritic onto its plain ASCII letter.
fn strip_diacritic(c: char) -> char {
    match c {
        'Ą' | 'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Ă' | 'Ā' => 'A',
        'Ć' | 'Ç' | 'Č' => 'C',
        'Ď' => 'D',
        'Ę' | 'È' | 'É' | 'Ê' | 'Ë' | 'Ě' | 'Ē' => 'E',
        'Ì' | 'Í' | 'Î' | 'Ï' | 'Ī' => 'I',
        'Ł' => 'L',
        'Ń' | 'Ñ' | 'Ň' => 'N',
        'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' | 'Ø' | 'Ő' | 'Ō' => 'O',
        'Ř' => 'R',
        'Ś' | 'Š' | 'Ş' => 'S',
        'Ť' | 'Ţ' => 'T',
        'Ù' | 'Ú' | 'Û' | 'Ü' | 'Ů' | 'Ű' | 'Ū' => 'U',
        'Ý' | 'Ÿ' => 'Y',
        'Ź' | 'Ż' | 'Ž' => 'Z',
        other => other,
    }
}

/// Case-fold, strip diacritics and collapse separators.
///
/// Punctuation other than `-` is treated as whitespace, so `"Barbara,"` and
/// `"BARBARA"` fold to the same string. Leading and trailing separators are
/// dropped.
pub fn fold(raw: &str) -> String {
    let mapped: String = raw
        .to_uppercase()
        .chars()
        .map(strip_diacritic)
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { ' ' })
        .collect();

    mapped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == '-' || c == ' ')
        .to_string()
}

/// Normalizer with a table of known spelling variants.
///
/// Every key and value of the table is folded on construction and chains
/// (`A -> B`, `B -> C`) are resolved, so `normalize` is a fixed point.
/// Tables containing a cycle are rejected.
#[derive(Debug, Clone)]
pub struct Normalizer {
    variants: HashMap<String, String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        let pairs = DEFAULT_VARIANTS.iter().map(|(k, v)| (k.to_string(), v.to_string()));
        Self::with_variants(pairs).unwrap_or_else(|_| Self::plain())
    }
}

/// Fold `(variant, canonical)` pairs, dropping ones that fold to nothing.
fn fold_pairs<I>(pairs: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (String, String)>,
{
    pairs
        .into_iter()
        .map(|(variant, canonical)| (fold(&variant), fold(&canonical)))
        .filter(|(variant, canonical)| !variant.is_empty() && !canonical.is_empty())
        .collect()
}

/// Point every key at the end of its chain.
fn resolve(raw: &HashMap<String, String>) -> Result<HashMap<String, String>> {
    let mut variants = HashMap::with_capacity(raw.len());
    for key in raw.keys() {
        let mut seen = HashSet::from([key.as_str()]);
        let mut current = key.as_str();
        while let Some(next) = raw.get(current) {
            if next == current {
                break;
            }
            if !seen.insert(next.as_str()) {
                return Err(FrontierError::Config(format!(
                    "spelling variants form a cycle through {}",
                    key
                )));
            }
            current = next.as_str();
        }
        if current != key {
            variants.insert(key.clone(), current.to_string());
        }
    }
    Ok(variants)
}

impl Normalizer {
    /// Normalizer without any variant table (folding only).
    pub fn plain() -> Self {
        Self {
            variants: HashMap::new(),
        }
    }

    /// Build a normalizer from `(variant, canonical)` pairs.
    pub fn with_variants<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(Self {
            variants: resolve(&fold_pairs(pairs))?,
        })
    }

    /// Extend the table with extra `(variant, canonical)` pairs.
    ///
    /// New pairs win over existing ones: an existing mapping is dropped when
    /// its key is re-mapped or chosen as a new canonical form.
    pub fn extended<I>(&self, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let added = fold_pairs(pairs);
        let mut merged: HashMap<String, String> = self
            .variants
            .iter()
            .filter(|(key, _)| {
                !added.contains_key(*key) && !added.values().any(|canonical| canonical == *key)
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        merged.extend(added);
        Ok(Self {
            variants: resolve(&merged)?,
        })
    }

    /// Normalize a raw identifier into its canonical string form.
    pub fn normalize(&self, raw: &str) -> String {
        let folded = fold(raw);
        match self.variants.get(&folded) {
            Some(canonical) => canonical.clone(),
            None => folded,
        }
    }

    /// Normalize into a [`Node`], or `None` if nothing identifying is left.
    pub fn node(&self, raw: &str) -> Option<Node> {
        let normalized = self.normalize(raw);
        if normalized.is_empty() {
            None
        } else {
            Some(Node(normalized))
        }
    }
}
