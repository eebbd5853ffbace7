//! Seed extraction: find known people and places mentioned in a note.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

use crate::search::{Kind, Node, Normalizer};

/// Names the extractor looks for, already normalized.
#[derive(Debug, Clone, Default)]
pub struct SeedHints {
    pub people: BTreeSet<Node>,
    pub places: BTreeSet<Node>,
}

impl SeedHints {
    pub fn new<P, Q>(normalizer: &Normalizer, people: P, places: Q) -> Self
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        Q: IntoIterator,
        Q::Item: AsRef<str>,
    {
        Self {
            people: people
                .into_iter()
                .filter_map(|p| normalizer.node(p.as_ref()))
                .collect(),
            places: places
                .into_iter()
                .filter_map(|p| normalizer.node(p.as_ref()))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty() && self.places.is_empty()
    }

    fn classify(&self, node: &Node) -> Option<Kind> {
        if self.people.contains(node) {
            Some(Kind::Person)
        } else if self.places.contains(node) {
            Some(Kind::Place)
        } else {
            None
        }
    }
}

fn word_pattern() -> &'static Regex {
    static WORD: OnceLock<Regex> = OnceLock::new();
    WORD.get_or_init(|| Regex::new(r"\p{L}[\p{L}\-]*").expect("word pattern is valid"))
}

/// Known people and places mentioned in `note`, in order of first mention.
///
/// Two-word names (e.g. `Nowy Sącz`) are matched before single words.
pub fn extract_seeds(note: &str, hints: &SeedHints, normalizer: &Normalizer) -> Vec<(Kind, Node)> {
    let words: Vec<&str> = word_pattern().find_iter(note).map(|m| m.as_str()).collect();

    let mut seen = BTreeSet::new();
    let mut seeds = Vec::new();
    let mut i = 0;
    while i < words.len() {
        let pair = words
            .get(i + 1)
            .and_then(|next| normalizer.node(&format!("{} {}", words[i], next)))
            .and_then(|node| hints.classify(&node).map(|kind| (kind, node)));

        let (hit, width) = match pair {
            Some(hit) => (Some(hit), 2),
            None => (
                normalizer
                    .node(words[i])
                    .and_then(|node| hints.classify(&node).map(|kind| (kind, node))),
                1,
            ),
        };

        if let Some((kind, node)) = hit {
            if seen.insert((kind, node.clone())) {
                log::debug!("Note mentions {} {}", kind, node);
                seeds.push((kind, node));
            }
        }
        i += width;
    }
    seeds
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOTE: &str = "Barbara Zawadzka spotkała się z Aleksandrem? Nie. \
        Rafał Bomba pracował w Krakowie, potem w Warszawie. Andrzej i Rafael \
        byli w Krakow. Potem Nowy Sącz.";

    fn hints() -> SeedHints {
        SeedHints::new(
            &Normalizer::default(),
            ["Barbara", "Aleksander", "Andrzej", "Rafał"],
            ["Kraków", "Warszawa", "Nowy Sącz"],
        )
    }

    #[test]
    fn test_extracts_known_names_in_order() {
        let n = Normalizer::default();
        let seeds = extract_seeds(NOTE, &hints(), &n);
        let names: Vec<_> = seeds.iter().map(|(k, node)| (*k, node.as_str())).collect();
        assert_eq!(
            names,
            vec![
                (Kind::Person, "BARBARA"),
                (Kind::Person, "RAFAL"),
                (Kind::Person, "ANDRZEJ"),
                (Kind::Place, "KRAKOW"),
                (Kind::Place, "NOWY SACZ"),
            ]
        );
    }

    #[test]
    fn test_inflected_forms_are_not_matched() {
        // "Krakowie" / "Warszawie" are inflections, not the hinted forms.
        let seeds = extract_seeds("w Krakowie i Warszawie", &hints(), &Normalizer::default());
        assert!(seeds.is_empty());
    }

    #[test]
    fn test_empty_hints_find_nothing() {
        let seeds = extract_seeds(NOTE, &SeedHints::default(), &Normalizer::default());
        assert!(seeds.is_empty());
    }
}
