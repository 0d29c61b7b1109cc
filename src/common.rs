use std::cmp::Ordering;
use std::fmt;

use serde::{Serialize, Serializer};

/// Largest coin count that still fits the bitmask representation.
pub const MASK_CAPACITY: usize = 64;

/// The set of coin ids an agent has collected so far.
///
/// Grids with at most 64 coins use a `u64` bitmask; larger grids fall back to
/// a sorted id list. One search never mixes both forms: the representation is
/// picked once from the grid's coin count through [`CoinSet::empty`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CoinSet {
    Mask(u64),
    Sorted(Vec<usize>),
}

impl CoinSet {
    pub fn empty(num_coins: usize) -> Self {
        if num_coins <= MASK_CAPACITY {
            CoinSet::Mask(0)
        } else {
            CoinSet::Sorted(Vec::new())
        }
    }

    pub fn contains(&self, coin_id: usize) -> bool {
        match self {
            CoinSet::Mask(bits) => coin_id < MASK_CAPACITY && bits & (1u64 << coin_id) != 0,
            CoinSet::Sorted(ids) => ids.binary_search(&coin_id).is_ok(),
        }
    }

    /// Returns a copy of the set with `coin_id` added.
    pub fn with(&self, coin_id: usize) -> Self {
        match self {
            CoinSet::Mask(bits) => {
                assert!(coin_id < MASK_CAPACITY, "coin id {coin_id} exceeds bitmask");
                CoinSet::Mask(bits | (1u64 << coin_id))
            }
            CoinSet::Sorted(ids) => {
                let mut ids = ids.clone();
                if let Err(index) = ids.binary_search(&coin_id) {
                    ids.insert(index, coin_id);
                }
                CoinSet::Sorted(ids)
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CoinSet::Mask(bits) => bits.count_ones() as usize,
            CoinSet::Sorted(ids) => ids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Coin ids in ascending order.
    pub fn iter(&self) -> CoinIter<'_> {
        match self {
            CoinSet::Mask(bits) => CoinIter::Mask(*bits),
            CoinSet::Sorted(ids) => CoinIter::Sorted(ids.iter()),
        }
    }

    pub fn is_subset(&self, other: &CoinSet) -> bool {
        self.iter().all(|id| other.contains(id))
    }
}

pub enum CoinIter<'a> {
    Mask(u64),
    Sorted(std::slice::Iter<'a, usize>),
}

impl Iterator for CoinIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        match self {
            CoinIter::Mask(bits) => {
                if *bits == 0 {
                    return None;
                }
                let id = bits.trailing_zeros() as usize;
                *bits &= *bits - 1;
                Some(id)
            }
            CoinIter::Sorted(ids) => ids.next().copied(),
        }
    }
}

// Lexicographic on the ascending id sequence, whatever the representation.
impl Ord for CoinSet {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

impl PartialOrd for CoinSet {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for CoinSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl fmt::Display for CoinSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "--");
        }
        let ids: Vec<String> = self.iter().map(|id| id.to_string()).collect();
        write!(f, "{}", ids.join(", "))
    }
}

/// A vertex of the augmented search space: where the agent stands and which
/// coins it already holds.
///
/// The derived ordering (x, then y, then coins) only exists to make the open
/// list deterministic when costs tie.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct State {
    pub x: usize,
    pub y: usize,
    pub coins: CoinSet,
}

impl State {
    pub fn new(x: usize, y: usize, coins: CoinSet) -> Self {
        State { x, y, coins }
    }

    pub fn position(&self) -> (usize, usize) {
        (self.x, self.y)
    }

    pub fn has_collected(&self, coin_id: usize) -> bool {
        self.coins.contains(coin_id)
    }
}
