//! Explicit search state: per-kind visited sets and FIFO frontiers plus the
//! adjacency record of everything queried so far.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use super::{Kind, Node};

/// FIFO queue of discovered-but-unqueried nodes with O(log n) membership.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Node>", into = "Vec<Node>")]
pub struct Frontier {
    queue: VecDeque<Node>,
    members: BTreeSet<Node>,
}

impl From<Vec<Node>> for Frontier {
    fn from(nodes: Vec<Node>) -> Self {
        let mut frontier = Frontier::default();
        for node in nodes {
            frontier.push(node);
        }
        frontier
    }
}

impl From<Frontier> for Vec<Node> {
    fn from(frontier: Frontier) -> Self {
        frontier.queue.into_iter().collect()
    }
}

impl Frontier {
    /// Append a node; returns false if it is already queued.
    pub fn push(&mut self, node: Node) -> bool {
        if self.members.insert(node.clone()) {
            self.queue.push_back(node);
            true
        } else {
            false
        }
    }

    pub fn pop(&mut self) -> Option<Node> {
        let node = self.queue.pop_front()?;
        self.members.remove(&node);
        Some(node)
    }

    pub fn contains(&self, node: &Node) -> bool {
        self.members.contains(node)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queued nodes in scheduling order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.queue.iter()
    }
}

/// Everything the search knows about one kind of node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    /// Nodes placed here by `seed`; never grows afterwards.
    pub seeds: BTreeSet<Node>,
    /// Nodes already sent to the oracle.
    pub visited: BTreeSet<Node>,
    /// Nodes discovered but not yet queried.
    pub frontier: Frontier,
}

impl Partition {
    /// Whether the node has been queued or queried already.
    pub fn is_known(&self, node: &Node) -> bool {
        self.visited.contains(node) || self.frontier.contains(node)
    }
}

/// Neighbor sets recorded for every queried node, per kind of the queried node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjacencyRecord {
    pub people: BTreeMap<Node, BTreeSet<Node>>,
    pub places: BTreeMap<Node, BTreeSet<Node>>,
}

impl AdjacencyRecord {
    pub fn of(&self, kind: Kind) -> &BTreeMap<Node, BTreeSet<Node>> {
        match kind {
            Kind::Person => &self.people,
            Kind::Place => &self.places,
        }
    }

    fn of_mut(&mut self, kind: Kind) -> &mut BTreeMap<Node, BTreeSet<Node>> {
        match kind {
            Kind::Person => &mut self.people,
            Kind::Place => &mut self.places,
        }
    }

    /// Neighbors recorded for a queried node.
    pub fn neighbors(&self, kind: Kind, node: &Node) -> Option<&BTreeSet<Node>> {
        self.of(kind).get(node)
    }

    /// Queried nodes of `kind` whose neighbor set contains `neighbor`.
    pub fn sources_of<'a>(&'a self, kind: Kind, neighbor: &'a Node) -> impl Iterator<Item = &'a Node> + 'a {
        self.of(kind)
            .iter()
            .filter(move |(_, set)| set.contains(neighbor))
            .map(|(node, _)| node)
    }
}

/// An oracle call that failed and was treated as "no neighbors".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedQuery {
    pub kind: Kind,
    pub node: Node,
    pub reason: String,
}

/// State of one search invocation, exclusively owned by the run loop.
///
/// Invariant: for each kind, `visited ∩ frontier = ∅`, and a visited node is
/// never queued again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchState {
    people: Partition,
    places: Partition,
    adjacency: AdjacencyRecord,
    failures: Vec<FailedQuery>,
    steps: usize,
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn partition(&self, kind: Kind) -> &Partition {
        match kind {
            Kind::Person => &self.people,
            Kind::Place => &self.places,
        }
    }

    fn partition_mut(&mut self, kind: Kind) -> &mut Partition {
        match kind {
            Kind::Person => &mut self.people,
            Kind::Place => &mut self.places,
        }
    }

    pub fn visited(&self, kind: Kind) -> &BTreeSet<Node> {
        &self.partition(kind).visited
    }

    pub fn frontier(&self, kind: Kind) -> &Frontier {
        &self.partition(kind).frontier
    }

    pub fn seeds(&self, kind: Kind) -> &BTreeSet<Node> {
        &self.partition(kind).seeds
    }

    pub fn adjacency(&self) -> &AdjacencyRecord {
        &self.adjacency
    }

    pub fn failures(&self) -> &[FailedQuery] {
        &self.failures
    }

    /// Total steps taken on this state.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Whether either frontier still has work.
    pub fn has_pending(&self) -> bool {
        Kind::ALL.iter().any(|k| !self.frontier(*k).is_empty())
    }

    pub fn pending(&self) -> usize {
        Kind::ALL.iter().map(|k| self.frontier(*k).len()).sum()
    }

    /// Record a seed node and queue it. Returns false for duplicates.
    pub(crate) fn insert_seed(&mut self, kind: Kind, node: Node) -> bool {
        let partition = self.partition_mut(kind);
        if partition.is_known(&node) {
            return false;
        }
        partition.seeds.insert(node.clone());
        partition.frontier.push(node)
    }

    /// Queue a discovered node unless it is already visited or queued.
    pub(crate) fn enqueue(&mut self, kind: Kind, node: Node) -> bool {
        let partition = self.partition_mut(kind);
        if partition.visited.contains(&node) {
            return false;
        }
        partition.frontier.push(node)
    }

    pub(crate) fn pop_frontier(&mut self, kind: Kind) -> Option<Node> {
        self.partition_mut(kind).frontier.pop()
    }

    /// Move a popped node into `visited` and record what the oracle said about it.
    pub(crate) fn complete(
        &mut self,
        kind: Kind,
        node: Node,
        neighbors: BTreeSet<Node>,
        failure: Option<String>,
    ) {
        if let Some(reason) = failure {
            self.failures.push(FailedQuery {
                kind,
                node: node.clone(),
                reason,
            });
        }
        self.adjacency.of_mut(kind).insert(node.clone(), neighbors);
        self.partition_mut(kind).visited.insert(node);
        self.steps += 1;
    }
}
