mod astar;

pub use astar::a_star_search;

use std::collections::HashMap;

use crate::common::{CoinSet, State};

/// Index of a node in the search arena.
pub type NodeId = usize;

#[derive(Debug, Clone)]
pub struct SearchNode {
    pub state: State,
    pub h: usize,
    pub g: usize,
    pub parent: Option<NodeId>,
}

impl SearchNode {
    pub fn f(&self) -> usize {
        self.g + self.h
    }
}

/// Per-coin-set bookkeeping: the cached heuristic of every visited cell and
/// the expanded flag. Each coin set gets its own dense layer over the grid,
/// allocated the first time a state with that set is seen.
#[derive(Debug)]
pub struct SearchTables {
    width: usize,
    height: usize,
    visited: HashMap<CoinSet, Vec<Option<usize>>>,
    expanded: HashMap<CoinSet, Vec<bool>>,
}

impl SearchTables {
    pub(crate) fn new(width: usize, height: usize) -> Self {
        SearchTables {
            width,
            height,
            visited: HashMap::new(),
            expanded: HashMap::new(),
        }
    }

    fn index(&self, x: usize, y: usize) -> usize {
        assert!(x < self.width && y < self.height);
        y * self.width + x
    }

    /// Heuristic value cached when `(coins, x, y)` was first reached.
    pub fn visited_h(&self, coins: &CoinSet, x: usize, y: usize) -> Option<usize> {
        let index = self.index(x, y);
        self.visited.get(coins).and_then(|layer| layer[index])
    }

    pub fn is_expanded(&self, coins: &CoinSet, x: usize, y: usize) -> bool {
        let index = self.index(x, y);
        self.expanded.get(coins).is_some_and(|layer| layer[index])
    }

    pub(crate) fn mark_visited(&mut self, state: &State, h: usize) {
        let index = self.index(state.x, state.y);
        let size = self.width * self.height;
        self.visited
            .entry(state.coins.clone())
            .or_insert_with(|| vec![None; size])[index] = Some(h);
    }

    pub(crate) fn mark_expanded(&mut self, state: &State) {
        debug_assert!(self.visited_h(&state.coins, state.x, state.y).is_some());
        let index = self.index(state.x, state.y);
        let size = self.width * self.height;
        self.expanded
            .entry(state.coins.clone())
            .or_insert_with(|| vec![false; size])[index] = true;
    }

    /// Number of coin sets that have at least one visited cell.
    pub fn layers(&self) -> usize {
        self.visited.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResult {
    pub expansions: usize,
    pub visited: usize,
    /// States from start to goal, both included; `None` when every reachable
    /// state was expanded without collecting all coins.
    pub plan: Option<Vec<State>>,
}

impl SearchResult {
    /// Number of moves in the plan.
    pub fn plan_length(&self) -> Option<usize> {
        self.plan.as_ref().map(|plan| plan.len() - 1)
    }
}

fn construct_plan(nodes: &[SearchNode], mut current: NodeId) -> Vec<State> {
    let mut plan = vec![nodes[current].state.clone()];
    while let Some(parent) = nodes[current].parent {
        plan.push(nodes[parent].state.clone());
        current = parent;
    }
    plan.reverse();
    plan
}
