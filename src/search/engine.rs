//! Frontier expansion loop: seed, step, goal check and run.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::Serialize;

use super::{Kind, Node, Normalizer, SearchState};
use crate::error::{FrontierError, Result};
use crate::oracle::{OracleError, RelationOracle};

/// Engine tuning, independent of any particular search target.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Safety bound on oracle queries per `run`.
    pub max_steps: usize,
    /// Per-call bound on the oracle; a timeout counts as a failed step.
    pub oracle_timeout: Option<Duration>,
    /// Nodes that must never be sent to the oracle.
    pub exclude_from_query: BTreeSet<Node>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_steps: 500,
            oracle_timeout: None,
            exclude_from_query: BTreeSet::new(),
        }
    }
}

/// What the search is looking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Goal {
    pub target: Node,
    pub kind: Kind,
    /// Opposite-kind nodes whose sightings of the target do not count.
    pub ignore_via: BTreeSet<Node>,
}

impl Goal {
    pub fn new(target: Node, kind: Kind) -> Self {
        Self {
            target,
            kind,
            ignore_via: BTreeSet::new(),
        }
    }

    /// Do not accept sightings reported by these nodes.
    pub fn ignoring<I: IntoIterator<Item = Node>>(mut self, via: I) -> Self {
        self.ignore_via.extend(via);
        self
    }
}

/// Result of one `step`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// 1-based step number within the state's lifetime.
    pub step: usize,
    pub kind: Kind,
    pub node: Node,
    /// Distinct normalized neighbors the oracle returned.
    pub neighbors: usize,
    /// Neighbors newly queued on the opposite frontier.
    pub discovered: Vec<Node>,
    /// Set when the oracle call failed and was treated as empty.
    pub failure: Option<String>,
}

/// Where the target was seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discovery {
    pub target: Node,
    /// Queried node whose neighbor set revealed the target.
    pub via: Node,
    pub via_kind: Kind,
    /// Step at which the goal first held.
    pub step: usize,
}

/// Terminal outcome of `run`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SearchOutcome {
    Found(Discovery),
    /// Both frontiers drained without reaching the goal.
    Exhausted { steps: usize },
    /// Step bound reached while work remained; the negative result is not proven.
    Aborted { steps: usize, pending: usize },
}

impl SearchOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, SearchOutcome::Found(_))
    }

    pub fn discovery(&self) -> Option<&Discovery> {
        match self {
            SearchOutcome::Found(d) => Some(d),
            _ => None,
        }
    }
}

impl SearchState {
    /// First accepted sighting of the goal target, if any.
    ///
    /// A sighting is the target appearing in the neighbor set of a queried
    /// opposite-kind node not listed in `ignore_via`. Targets that were
    /// seeded for their own kind are already known and never count.
    pub fn sighting(&self, goal: &Goal) -> Option<Discovery> {
        if self.seeds(goal.kind).contains(&goal.target) {
            return None;
        }
        let via_kind = goal.kind.opposite();
        let via = self
            .adjacency()
            .sources_of(via_kind, &goal.target)
            .find(|via| !goal.ignore_via.contains(*via))?;
        Some(Discovery {
            target: goal.target.clone(),
            via: via.clone(),
            via_kind,
            step: self.steps(),
        })
    }
}

/// Whether `target` has been newly discovered for `kind`.
///
/// True iff the target was queried as a `kind` node or appears in the
/// neighbors of a queried opposite-kind node, and was not a seed of `kind`.
pub fn is_goal_reached(state: &SearchState, target: &Node, kind: Kind) -> bool {
    if state.seeds(kind).contains(target) {
        return false;
    }
    state.visited(kind).contains(target)
        || state
            .adjacency()
            .sources_of(kind.opposite(), target)
            .next()
            .is_some()
}

/// Frontier search over a relation oracle.
pub struct SearchEngine<O> {
    oracle: O,
    normalizer: Normalizer,
    config: EngineConfig,
}

impl<O: RelationOracle> SearchEngine<O> {
    pub fn new(oracle: O, normalizer: Normalizer, config: EngineConfig) -> Self {
        Self {
            oracle,
            normalizer,
            config,
        }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    fn is_excluded(&self, node: &Node) -> bool {
        self.config.exclude_from_query.contains(node)
    }

    /// Build a fresh state from raw seed identifiers.
    ///
    /// Seeds are normalized and queued in the given order. Empty identifiers,
    /// duplicates and nodes excluded from querying are dropped.
    ///
    /// Excluded nodes are dropped before they are recorded as seeds, so an
    /// excluded target stays discoverable: seed exclusion in
    /// [`SearchState::sighting`] does not apply to it.
    pub fn seed<I, S>(&self, initial: I) -> SearchState
    where
        I: IntoIterator<Item = (Kind, S)>,
        S: AsRef<str>,
    {
        let mut state = SearchState::new();
        for (kind, raw) in initial {
            let Some(node) = self.normalizer.node(raw.as_ref()) else {
                log::debug!("Skipping empty {} seed {:?}", kind, raw.as_ref());
                continue;
            };
            if self.is_excluded(&node) {
                log::info!("Not seeding {} {}: excluded from querying", kind, node);
                continue;
            }
            if state.insert_seed(kind, node.clone()) {
                log::debug!("Seeded {} {}", kind, node);
            }
        }
        log::info!(
            "Seeded {} people and {} places",
            state.frontier(Kind::Person).len(),
            state.frontier(Kind::Place).len()
        );
        state
    }

    async fn ask(&self, kind: Kind, node: &Node) -> std::result::Result<Vec<String>, OracleError> {
        let call = self.oracle.query(kind, node.as_str());
        match self.config.oracle_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| OracleError::Timeout(limit))?,
            None => call.await,
        }
    }

    /// Query the oldest frontier node of `kind` and merge its neighbors.
    ///
    /// Oracle failures are logged and treated as zero neighbors; the node is
    /// still marked visited.
    pub async fn step(&self, state: &mut SearchState, kind: Kind) -> Result<StepReport> {
        let node = state
            .pop_frontier(kind)
            .ok_or(FrontierError::EmptyFrontier(kind))?;

        let (raw, failure) = match self.ask(kind, &node).await {
            Ok(raw) => (raw, None),
            Err(e) => {
                log::warn!("Oracle query for {} {} failed: {}", kind, node, e);
                (Vec::new(), Some(e.to_string()))
            }
        };

        let mut ordered: Vec<Node> = Vec::new();
        let mut neighbors = BTreeSet::new();
        for value in &raw {
            if let Some(neighbor) = self.normalizer.node(value) {
                if neighbors.insert(neighbor.clone()) {
                    ordered.push(neighbor);
                }
            }
        }

        let other = kind.opposite();
        let count = neighbors.len();
        state.complete(kind, node.clone(), neighbors, failure.clone());

        let mut discovered = Vec::new();
        for neighbor in ordered {
            if self.is_excluded(&neighbor) {
                log::debug!("{} {} is excluded from querying, not queued", other, neighbor);
                continue;
            }
            if state.enqueue(other, neighbor.clone()) {
                discovered.push(neighbor);
            }
        }

        log::info!(
            "Step {}: {} {} -> {} neighbors, {} new",
            state.steps(),
            kind,
            node,
            count,
            discovered.len()
        );

        Ok(StepReport {
            step: state.steps(),
            kind,
            node,
            neighbors: count,
            discovered,
            failure,
        })
    }

    /// Run until the goal is found, both frontiers drain, or the step bound hits.
    pub async fn run(&self, state: &mut SearchState, goal: &Goal) -> Result<SearchOutcome> {
        self.run_with(state, goal, |_, _| {}).await
    }

    /// Like [`run`](Self::run), calling `on_step` after every step.
    pub async fn run_with<F>(
        &self,
        state: &mut SearchState,
        goal: &Goal,
        mut on_step: F,
    ) -> Result<SearchOutcome>
    where
        F: FnMut(&SearchState, &StepReport),
    {
        let mut taken = 0usize;
        loop {
            let mut progressed = false;
            for kind in Kind::ALL {
                if state.frontier(kind).is_empty() {
                    continue;
                }
                if taken >= self.config.max_steps {
                    log::warn!(
                        "Aborting after {} steps with {} nodes still queued",
                        taken,
                        state.pending()
                    );
                    return Ok(SearchOutcome::Aborted {
                        steps: taken,
                        pending: state.pending(),
                    });
                }

                let report = self.step(state, kind).await?;
                taken += 1;
                progressed = true;
                on_step(&*state, &report);

                if let Some(discovery) = state.sighting(goal) {
                    log::info!(
                        "Found {} via {} {} at step {}",
                        discovery.target,
                        discovery.via_kind,
                        discovery.via,
                        discovery.step
                    );
                    return Ok(SearchOutcome::Found(discovery));
                }
            }
            if !progressed {
                log::info!("Frontiers exhausted after {} steps", taken);
                return Ok(SearchOutcome::Exhausted { steps: taken });
            }
        }
    }
}
