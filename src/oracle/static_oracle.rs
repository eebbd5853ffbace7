//! In-memory oracle backed by a fixed relation table.
//!
//! Used for offline runs from a JSON fixture and throughout the tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

use super::{OracleError, RelationOracle};
use crate::error::Result;
use crate::search::{Kind, Normalizer};

/// On-disk fixture: `{"people": {"RAFAL": ["LUBLIN"]}, "places": {...}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OracleFixture {
    #[serde(default)]
    pub people: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub places: BTreeMap<String, Vec<String>>,
}

/// Relation table answering from memory, recording every call.
///
/// Unknown queries answer with an empty list, like the live API does for
/// names it has no records of.
#[derive(Debug, Default)]
pub struct StaticOracle {
    relations: HashMap<(Kind, String), Vec<String>>,
    failing: HashSet<(Kind, String)>,
    calls: Mutex<Vec<(Kind, String)>>,
}

impl StaticOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an answer for `(kind, query)`.
    pub fn with(mut self, kind: Kind, query: &str, neighbors: &[&str]) -> Self {
        self.relations.insert(
            (kind, query.to_string()),
            neighbors.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    /// Make `(kind, query)` fail instead of answering.
    pub fn failing(mut self, kind: Kind, query: &str) -> Self {
        self.failing.insert((kind, query.to_string()));
        self
    }

    /// Build from a fixture, normalizing its keys so they match engine queries.
    pub fn from_fixture(fixture: OracleFixture, normalizer: &Normalizer) -> Self {
        let mut relations = HashMap::new();
        for (kind, table) in [(Kind::Person, fixture.people), (Kind::Place, fixture.places)] {
            for (query, neighbors) in table {
                relations
                    .entry((kind, normalizer.normalize(&query)))
                    .or_insert_with(Vec::new)
                    .extend(neighbors);
            }
        }
        Self {
            relations,
            ..Self::default()
        }
    }

    /// Load a JSON fixture file.
    pub fn load(path: &Path, normalizer: &Normalizer) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let fixture: OracleFixture = serde_json::from_str(&text)?;
        Ok(Self::from_fixture(fixture, normalizer))
    }

    /// Every query issued so far, in order.
    pub fn calls(&self) -> Vec<(Kind, String)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// How often `(kind, query)` was asked.
    pub fn call_count(&self, kind: Kind, query: &str) -> usize {
        self.calls()
            .iter()
            .filter(|(k, q)| *k == kind && q == query)
            .count()
    }
}

#[async_trait]
impl RelationOracle for StaticOracle {
    async fn query(&self, kind: Kind, query: &str) -> std::result::Result<Vec<String>, OracleError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((kind, query.to_string()));
        }
        let key = (kind, query.to_string());
        if self.failing.contains(&key) {
            return Err(OracleError::Unavailable {
                kind,
                query: query.to_string(),
            });
        }
        Ok(self.relations.get(&key).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_answers_and_records_calls() {
        let oracle = StaticOracle::new().with(Kind::Place, "LUBLIN", &["RAFAL", "BARBARA"]);
        let people = oracle.query(Kind::Place, "LUBLIN").await.unwrap();
        assert_eq!(people, vec!["RAFAL", "BARBARA"]);
        assert!(oracle.query(Kind::Person, "NOBODY").await.unwrap().is_empty());
        assert_eq!(oracle.call_count(Kind::Place, "LUBLIN"), 1);
        assert_eq!(oracle.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_failing_query() {
        let oracle = StaticOracle::new().failing(Kind::Person, "ADAM");
        let err = oracle.query(Kind::Person, "ADAM").await.unwrap_err();
        assert!(matches!(err, OracleError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_load_fixture_normalizes_keys() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("relations.json");
        std::fs::write(
            &path,
            r#"{"people": {"Rafał": ["Lublin"]}, "places": {"Kraków": ["Barbara"]}}"#,
        )
        .unwrap();

        let oracle = StaticOracle::load(&path, &Normalizer::default()).unwrap();
        assert_eq!(oracle.query(Kind::Person, "RAFAL").await.unwrap(), vec!["Lublin"]);
        assert_eq!(oracle.query(Kind::Place, "KRAKOW").await.unwrap(), vec!["Barbara"]);
    }

    #[tokio::test]
    async fn test_bundled_fixture_finds_new_location() {
        use crate::search::{EngineConfig, Goal, SearchEngine};

        let normalizer = Normalizer::default();
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/barbara.json");
        let oracle = StaticOracle::load(&path, &normalizer).unwrap();
        let barbara = normalizer.node("Barbara").unwrap();
        let config = EngineConfig {
            exclude_from_query: [barbara.clone()].into_iter().collect(),
            ..EngineConfig::default()
        };
        let engine = SearchEngine::new(oracle, normalizer, config);
        let mut state = engine.seed(vec![
            (Kind::Person, "Rafał"),
            (Kind::Place, "Lublin"),
            (Kind::Person, "Barbara"),
            (Kind::Person, "Aleksander"),
            (Kind::Person, "Andrzej"),
            (Kind::Place, "Kraków"),
            (Kind::Place, "Warszawa"),
        ]);
        let known: Vec<_> = state.seeds(Kind::Place).iter().cloned().collect();
        let goal = Goal::new(barbara, Kind::Person).ignoring(known);

        let outcome = engine.run(&mut state, &goal).await.unwrap();
        assert_eq!(outcome.discovery().unwrap().via.as_str(), "ELBLAG");
        assert_eq!(engine.oracle().call_count(Kind::Person, "BARBARA"), 0);
    }
}
