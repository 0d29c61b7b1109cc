use clap::ValueEnum;
use serde::Deserialize;

use crate::common::State;
use crate::map::Grid;

/// Estimates the remaining number of moves needed to collect every coin.
pub trait Heuristic {
    fn estimate(&self, state: &State) -> usize;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum HeuristicKind {
    Blind,
    ManhattanMax,
    ManhattanSum,
    ManhattanOrderedSum,
    EuclideanSum,
}

impl HeuristicKind {
    pub fn build(self, grid: &Grid) -> Box<dyn Heuristic> {
        let coins = CoinLocations::new(grid);
        match self {
            HeuristicKind::Blind => Box::new(BlindHeuristic { coins }),
            HeuristicKind::ManhattanMax => Box::new(ManhattanMaxHeuristic { coins }),
            HeuristicKind::ManhattanSum => Box::new(ManhattanSumHeuristic { coins }),
            HeuristicKind::ManhattanOrderedSum => {
                Box::new(ManhattanOrderedSumHeuristic { coins })
            }
            HeuristicKind::EuclideanSum => Box::new(EuclideanSumHeuristic { coins }),
        }
    }
}

/// Coin positions captured from the grid once, plus its bounds for the
/// precondition check.
#[derive(Debug, Clone)]
pub struct CoinLocations {
    locations: Vec<(usize, usize)>,
    width: usize,
    height: usize,
}

impl CoinLocations {
    pub fn new(grid: &Grid) -> Self {
        CoinLocations {
            locations: grid.coin_locations().to_vec(),
            width: grid.width,
            height: grid.height,
        }
    }

    fn check_bounds(&self, state: &State) {
        assert!(
            state.x < self.width && state.y < self.height,
            "heuristic called on out-of-bounds state ({}, {})",
            state.x,
            state.y
        );
    }

    /// Positions of the coins `state` still has to collect, by ascending id.
    fn uncollected<'a>(&'a self, state: &'a State) -> impl Iterator<Item = (usize, usize)> + 'a {
        self.check_bounds(state);
        self.locations
            .iter()
            .enumerate()
            .filter(move |(id, _)| !state.has_collected(*id))
            .map(|(_, &location)| location)
    }
}

fn manhattan(a: (usize, usize), b: (usize, usize)) -> usize {
    a.0.abs_diff(b.0) + a.1.abs_diff(b.1)
}

/// Always 0; turns A* into breadth-first search on unit costs.
pub struct BlindHeuristic {
    coins: CoinLocations,
}

impl Heuristic for BlindHeuristic {
    fn estimate(&self, state: &State) -> usize {
        self.coins.check_bounds(state);
        0
    }

    fn name(&self) -> &'static str {
        "Blind"
    }
}

/// Distance to the farthest uncollected coin.
pub struct ManhattanMaxHeuristic {
    coins: CoinLocations,
}

impl Heuristic for ManhattanMaxHeuristic {
    fn estimate(&self, state: &State) -> usize {
        self.coins
            .uncollected(state)
            .map(|coin| manhattan(state.position(), coin))
            .max()
            .unwrap_or(0)
    }

    fn name(&self) -> &'static str {
        "ManhattanMax"
    }
}

/// Sum of distances to all uncollected coins. Overestimates whenever coins
/// share a route, so plans found with it may be longer than necessary.
pub struct ManhattanSumHeuristic {
    coins: CoinLocations,
}

impl Heuristic for ManhattanSumHeuristic {
    fn estimate(&self, state: &State) -> usize {
        self.coins
            .uncollected(state)
            .map(|coin| manhattan(state.position(), coin))
            .sum()
    }

    fn name(&self) -> &'static str {
        "ManhattanSum"
    }
}

/// Distance to the nearest uncollected coin plus the length of the chain
/// through the remaining coins taken in `(x, y)` order.
///
/// The chain order is the plain coordinate sort, not a shortest tour. With
/// nothing left to collect the estimate is the distance to the origin, so
/// goal states away from `(0, 0)` are not scored 0.
pub struct ManhattanOrderedSumHeuristic {
    coins: CoinLocations,
}

impl Heuristic for ManhattanOrderedSumHeuristic {
    fn estimate(&self, state: &State) -> usize {
        let mut remaining: Vec<_> = self.coins.uncollected(state).collect();
        let Some(nearest) = remaining
            .iter()
            .map(|&coin| manhattan(state.position(), coin))
            .min()
        else {
            return manhattan(state.position(), (0, 0));
        };

        remaining.sort_unstable();
        let chain: usize = remaining
            .windows(2)
            .map(|pair| manhattan(pair[0], pair[1]))
            .sum();
        nearest + chain
    }

    fn name(&self) -> &'static str {
        "ManhattanOrderedSum"
    }
}

/// Sum of straight-line distances to uncollected coins, rounded down.
pub struct EuclideanSumHeuristic {
    coins: CoinLocations,
}

impl Heuristic for EuclideanSumHeuristic {
    fn estimate(&self, state: &State) -> usize {
        let total: f64 = self
            .coins
            .uncollected(state)
            .map(|(x, y)| {
                let dx = state.x as f64 - x as f64;
                let dy = state.y as f64 - y as f64;
                dx.hypot(dy)
            })
            .sum();
        total.floor() as usize
    }

    fn name(&self) -> &'static str {
        "EuclideanSum"
    }
}
