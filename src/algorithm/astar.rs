use super::{construct_plan, NodeId, SearchNode, SearchResult, SearchTables};
use crate::common::State;
use crate::heuristic::Heuristic;
use crate::map::{ConfigurationError, Grid};
use crate::render::ProgressReporter;

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::{debug, instrument, trace};

#[derive(Debug, PartialEq, Eq)]
struct OpenEntry {
    f: usize,
    g: usize,
    state: State,
    node: NodeId,
}

// BinaryHeap pops the greatest entry, so every comparison is reversed except g.
impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .cmp(&self.f)
            // Higher g cost has higher priority
            .then_with(|| self.g.cmp(&other.g))
            .then_with(|| other.state.cmp(&self.state))
            // Same key: older node first
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn push_node(nodes: &mut Vec<SearchNode>, open: &mut BinaryHeap<OpenEntry>, node: SearchNode) {
    let id = nodes.len();
    open.push(OpenEntry {
        f: node.f(),
        g: node.g,
        state: node.state.clone(),
        node: id,
    });
    nodes.push(node);
}

/// A* over `(x, y, collected coins)` until every coin is held.
///
/// Duplicate open entries are allowed; an entry whose state was expanded in
/// the meantime is dropped when popped.
#[instrument(skip_all, name = "a_star", fields(heuristic = heuristic.name(), width = grid.width, height = grid.height, coins = grid.num_coins()), level = "debug")]
pub fn a_star_search(
    grid: &Grid,
    heuristic: &dyn Heuristic,
    reporter: &mut dyn ProgressReporter,
) -> Result<SearchResult, ConfigurationError> {
    let initial_state = grid.initial_state()?;
    let num_coins = grid.num_coins();

    let mut nodes = Vec::new();
    let mut open_list = BinaryHeap::new();
    let mut tables = SearchTables::new(grid.width, grid.height);
    let mut result = SearchResult::default();

    let start_h = heuristic.estimate(&initial_state);
    tables.mark_visited(&initial_state, start_h);
    push_node(
        &mut nodes,
        &mut open_list,
        SearchNode {
            state: initial_state,
            h: start_h,
            g: 0,
            parent: None,
        },
    );
    reporter.on_start(grid, &nodes[0], &tables);

    while let Some(entry) = open_list.pop() {
        let current = entry.node;
        let state = &nodes[current].state;
        if tables.is_expanded(&state.coins, state.x, state.y) {
            trace!("skip stale entry {state:?}");
            continue;
        }

        result.expansions += 1;
        trace!("expand node: {:?}", nodes[current]);

        if state.coins.len() == num_coins {
            let plan = construct_plan(&nodes, current);
            debug!(
                "found plan of length {} after {} expansions",
                plan.len() - 1,
                result.expansions
            );
            reporter.on_solution(grid, &plan);
            result.plan = Some(plan);
            return Ok(result);
        }

        // Assuming uniform cost.
        let tentative_g_cost = nodes[current].g + 1;
        for successor in grid.successors(state) {
            if tables.is_expanded(&successor.coins, successor.x, successor.y) {
                continue;
            }

            let h = match tables.visited_h(&successor.coins, successor.x, successor.y) {
                Some(h) => h,
                None => {
                    let h = heuristic.estimate(&successor);
                    tables.mark_visited(&successor, h);
                    result.visited += 1;
                    h
                }
            };

            push_node(
                &mut nodes,
                &mut open_list,
                SearchNode {
                    state: successor,
                    h,
                    g: tentative_g_cost,
                    parent: Some(current),
                },
            );
        }

        reporter.on_expansion(grid, &nodes[current], &tables);
        tables.mark_expanded(&nodes[current].state);
    }

    debug!(
        "cannot find solution, {} coin sets explored",
        tables.layers()
    );
    Ok(result)
}
