//! Bidirectional frontier search over a people/places relation oracle.
//!
//! Nodes of two kinds are explored alternately: querying a person yields
//! places, querying a place yields people. Every node is queried at most once
//! and discovered neighbors are queued FIFO on the opposite kind's frontier.

mod engine;
mod normalize;
mod state;

pub use engine::{
    is_goal_reached, Discovery, EngineConfig, Goal, SearchEngine, SearchOutcome, StepReport,
};
pub use normalize::{fold, Normalizer};
pub use state::{AdjacencyRecord, FailedQuery, Frontier, Partition, SearchState};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bipartite category of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Kind {
    #[serde(alias = "person", alias = "Person")]
    Person,
    #[serde(alias = "place", alias = "Place")]
    Place,
}

impl Kind {
    /// Scheduling order used by the run loop.
    pub const ALL: [Kind; 2] = [Kind::Person, Kind::Place];

    /// The kind returned by the oracle when querying this kind.
    pub fn opposite(self) -> Kind {
        match self {
            Kind::Person => Kind::Place,
            Kind::Place => Kind::Person,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Person => "PERSON",
            Kind::Place => "PLACE",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "person" | "people" => Ok(Kind::Person),
            "place" | "places" | "city" => Ok(Kind::Place),
            other => Err(format!("unknown kind '{}': expected person or place", other)),
        }
    }
}

/// A normalized identifier (person name or place name).
///
/// Only produced by [`Normalizer::node`], so every `Node` is already in
/// canonical form and can be compared directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Node(String);

impl Node {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Node {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_opposite_is_involution() {
        for kind in Kind::ALL {
            assert_ne!(kind.opposite(), kind);
            assert_eq!(kind.opposite().opposite(), kind);
        }
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("person".parse::<Kind>().unwrap(), Kind::Person);
        assert_eq!("PLACES".parse::<Kind>().unwrap(), Kind::Place);
        assert!("thing".parse::<Kind>().is_err());
    }

    #[test]
    fn test_kind_serde_uppercase() {
        assert_eq!(serde_json::to_string(&Kind::Person).unwrap(), "\"PERSON\"");
        let k: Kind = serde_json::from_str("\"place\"").unwrap();
        assert_eq!(k, Kind::Place);
    }

    #[test]
    fn test_node_serializes_as_plain_string() {
        let node = Normalizer::default().node("Kraków").unwrap();
        assert_eq!(serde_json::to_string(&node).unwrap(), "\"KRAKOW\"");
    }
}
