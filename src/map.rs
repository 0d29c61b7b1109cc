use std::fs;
use std::io;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::common::{CoinSet, State};

/// Characters of the octile format that describe a traversable cell.
const PASSABLE_SYMBOLS: [char; 4] = ['.', ' ', 'G', 'S'];
/// Characters of the octile format that describe a wall.
const WALL_SYMBOLS: [char; 5] = ['@', 'O', 'T', 'W', '#'];

/// Fixed neighbour order. Changing it changes which of several equal-cost
/// plans is reported.
const DIRECTIONS: [(isize, isize); 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];

/// Problems with a map, start or coin specification, all detected before a
/// search starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("failed to read map file: {0}")]
    Io(#[from] io::Error),
    #[error("unexpected file format: {0}")]
    Format(String),
    #[error("unexpected end of file after {rows} map rows")]
    UnexpectedEof { rows: usize },
    #[error("invalid line length in row {row}: expected {expected}, got {found}")]
    InvalidLineLength {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown cell symbol '{0}'")]
    UnknownSymbol(char),
    #[error("invalid start position '{0}'")]
    InvalidStart(String),
    #[error("invalid coin position '{0}'")]
    InvalidCoin(String),
    #[error("grid has no start position")]
    MissingStart,
    #[error("grid has more than one start position")]
    DuplicateStart,
    #[error("coin ids must be 0..{count} without gaps or duplicates")]
    InvalidCoinIds { count: usize },
    #[error("cannot place {count} coins on {free} free cells")]
    NotEnoughFreeCells { count: usize, free: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Wall,
    Coin(usize),
}

/// Input symbols for building a grid in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Empty,
    Wall,
    Start,
    Coin(usize),
}

#[derive(Debug, Clone)]
pub struct Grid {
    pub width: usize,
    pub height: usize,
    cells: Vec<Cell>, // row-major
    start: Option<(usize, usize)>,
    coin_locations: Vec<(usize, usize)>, // indexed by coin id
}

impl Grid {
    /// Builds a grid from rows of symbols, `rows[y][x]`.
    pub fn from_symbols(rows: &[Vec<Symbol>]) -> Result<Self, ConfigurationError> {
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.len());

        let mut cells = Vec::with_capacity(width * height);
        let mut start = None;
        let mut coins = Vec::new();
        for (y, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(ConfigurationError::InvalidLineLength {
                    row: y,
                    expected: width,
                    found: row.len(),
                });
            }
            for (x, symbol) in row.iter().enumerate() {
                let cell = match *symbol {
                    Symbol::Empty => Cell::Empty,
                    Symbol::Wall => Cell::Wall,
                    Symbol::Start => {
                        if start.replace((x, y)).is_some() {
                            return Err(ConfigurationError::DuplicateStart);
                        }
                        Cell::Empty
                    }
                    Symbol::Coin(id) => {
                        coins.push((id, (x, y)));
                        Cell::Coin(id)
                    }
                };
                cells.push(cell);
            }
        }

        coins.sort_unstable();
        let count = coins.len();
        if coins.iter().enumerate().any(|(index, (id, _))| index != *id) {
            return Err(ConfigurationError::InvalidCoinIds { count });
        }

        Ok(Grid {
            width,
            height,
            cells,
            start,
            coin_locations: coins.into_iter().map(|(_, location)| location).collect(),
        })
    }

    /// Builds a grid from text rows: `#` wall, space empty, `A` start and a
    /// decimal digit for a coin id.
    pub fn from_rows(rows: &[&str]) -> Result<Self, ConfigurationError> {
        let symbols = rows
            .iter()
            .map(|row| {
                row.chars()
                    .map(|ch| match ch {
                        '#' => Ok(Symbol::Wall),
                        ' ' => Ok(Symbol::Empty),
                        'A' => Ok(Symbol::Start),
                        _ => ch
                            .to_digit(10)
                            .map(|id| Symbol::Coin(id as usize))
                            .ok_or(ConfigurationError::UnknownSymbol(ch)),
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_symbols(&symbols)
    }

    /// The 9x9 demo grid used when no map file is given.
    pub fn sample() -> Self {
        Self::from_rows(&[
            "#########",
            "#  A    #",
            "# # # ###",
            "# ### # #",
            "# # #  0#",
            "#   # ###",
            "# # #   #",
            "# # ### #",
            "#########",
        ])
        .unwrap_or_else(|err| unreachable!("sample grid is valid: {err}"))
    }

    /// Reads an octile map file and places the start and coins on it.
    pub fn from_file(
        path: &str,
        start: &str,
        coins: &[String],
    ) -> Result<Self, ConfigurationError> {
        let content = fs::read_to_string(path)?;
        Self::from_octile_str(&content, start, coins)
    }

    /// Parses octile map text. `start` and every entry of `coins` are `x,y`
    /// strings; coins get ids in the order they are listed.
    pub fn from_octile_str(
        content: &str,
        start: &str,
        coins: &[String],
    ) -> Result<Self, ConfigurationError> {
        let mut grid = Self::parse_octile(content)?;
        let (x, y) = grid
            .parse_free_position(start)
            .ok_or_else(|| ConfigurationError::InvalidStart(start.to_string()))?;
        grid.start = Some((x, y));
        for coin in coins {
            let (x, y) = grid
                .parse_free_position(coin)
                .ok_or_else(|| ConfigurationError::InvalidCoin(coin.to_string()))?;
            grid.place_coin(x, y);
        }
        debug!(
            "loaded {}x{} grid with {} coins",
            grid.width,
            grid.height,
            grid.coin_locations.len()
        );
        Ok(grid)
    }

    fn parse_octile(content: &str) -> Result<Self, ConfigurationError> {
        let mut lines = content.lines().map(|line| line.trim_end_matches('\r'));
        let mut header = || {
            lines
                .next()
                .map(str::trim)
                .ok_or_else(|| ConfigurationError::Format("missing header".to_string()))
        };

        let kind = header()?;
        let height_line = header()?;
        let width_line = header()?;
        let map_line = header()?;
        if kind != "type octile" || map_line != "map" {
            return Err(ConfigurationError::Format(format!(
                "bad header '{kind}' / '{map_line}'"
            )));
        }
        let height = parse_dimension(height_line, "height")?;
        let width = parse_dimension(width_line, "width")?;
        if width.checked_mul(height).is_none() {
            return Err(ConfigurationError::Format(format!(
                "map size {width}x{height} is too large"
            )));
        }

        let mut cells = Vec::new();
        for row in 0..height {
            let line = lines
                .next()
                .ok_or(ConfigurationError::UnexpectedEof { rows: row })?;
            let symbols: Vec<char> = line.chars().collect();
            if symbols.len() != width {
                return Err(ConfigurationError::InvalidLineLength {
                    row,
                    expected: width,
                    found: symbols.len(),
                });
            }
            for ch in symbols {
                let cell = if PASSABLE_SYMBOLS.contains(&ch) {
                    Cell::Empty
                } else if WALL_SYMBOLS.contains(&ch) {
                    Cell::Wall
                } else {
                    return Err(ConfigurationError::UnknownSymbol(ch));
                };
                cells.push(cell);
            }
        }

        Ok(Grid {
            width,
            height,
            cells,
            start: None,
            coin_locations: Vec::new(),
        })
    }

    // `x,y` inside the grid, on a cell that is neither wall, coin nor start.
    fn parse_free_position(&self, text: &str) -> Option<(usize, usize)> {
        let (x, y) = text.split_once(',')?;
        let x: usize = x.trim().parse().ok()?;
        let y: usize = y.trim().parse().ok()?;
        let free = self.is_within_bounds(x as isize, y as isize)
            && self.cell(x, y) == Cell::Empty
            && self.start != Some((x, y));
        free.then_some((x, y))
    }

    fn place_coin(&mut self, x: usize, y: usize) {
        let id = self.coin_locations.len();
        let index = self.index(x, y);
        self.cells[index] = Cell::Coin(id);
        self.coin_locations.push((x, y));
    }

    /// Scatters `count` additional coins over free cells.
    pub fn scatter_coins<R: Rng + ?Sized>(
        &mut self,
        count: usize,
        rng: &mut R,
    ) -> Result<(), ConfigurationError> {
        let mut free: Vec<(usize, usize)> = (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| (x, y)))
            .filter(|&(x, y)| self.cell(x, y) == Cell::Empty && self.start != Some((x, y)))
            .collect();
        if free.len() < count {
            return Err(ConfigurationError::NotEnoughFreeCells {
                count,
                free: free.len(),
            });
        }
        free.shuffle(rng);
        for &(x, y) in free.iter().take(count) {
            self.place_coin(x, y);
        }
        Ok(())
    }

    fn index(&self, x: usize, y: usize) -> usize {
        assert!(
            x < self.width && y < self.height,
            "({x}, {y}) is outside the {}x{} grid",
            self.width,
            self.height
        );
        y * self.width + x
    }

    fn cell(&self, x: usize, y: usize) -> Cell {
        self.cells[self.index(x, y)]
    }

    pub fn is_within_bounds(&self, x: isize, y: isize) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    pub fn is_wall(&self, x: usize, y: usize) -> bool {
        self.cell(x, y) == Cell::Wall
    }

    pub fn is_coin(&self, x: usize, y: usize) -> bool {
        matches!(self.cell(x, y), Cell::Coin(_))
    }

    pub fn coin_id(&self, x: usize, y: usize) -> Option<usize> {
        match self.cell(x, y) {
            Cell::Coin(id) => Some(id),
            _ => None,
        }
    }

    pub fn num_coins(&self) -> usize {
        self.coin_locations.len()
    }

    /// Coin coordinates indexed by coin id.
    pub fn coin_locations(&self) -> &[(usize, usize)] {
        &self.coin_locations
    }

    pub fn start(&self) -> Option<(usize, usize)> {
        self.start
    }

    pub fn initial_state(&self) -> Result<State, ConfigurationError> {
        let (x, y) = self.start.ok_or(ConfigurationError::MissingStart)?;
        Ok(State::new(x, y, CoinSet::empty(self.num_coins())))
    }

    pub fn successors(&self, state: &State) -> Vec<State> {
        let mut successors = Vec::with_capacity(DIRECTIONS.len());
        for &(dx, dy) in &DIRECTIONS {
            let new_x = state.x as isize + dx;
            let new_y = state.y as isize + dy;
            if !self.is_within_bounds(new_x, new_y) {
                continue;
            }
            let (new_x, new_y) = (new_x as usize, new_y as usize);
            let coins = match self.cell(new_x, new_y) {
                Cell::Wall => continue,
                Cell::Coin(id) if !state.has_collected(id) => state.coins.with(id),
                _ => state.coins.clone(),
            };
            successors.push(State::new(new_x, new_y, coins));
        }
        successors
    }
}

fn parse_dimension(line: &str, key: &str) -> Result<usize, ConfigurationError> {
    line.strip_prefix(key)
        .filter(|rest| rest.starts_with(' '))
        .and_then(|rest| rest.trim().parse().ok())
        .ok_or_else(|| ConfigurationError::Format(format!("bad {key} line '{line}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn coins(list: &[&str]) -> Vec<String> {
        list.iter().map(|coin| coin.to_string()).collect()
    }

    #[test]
    fn test_read_map() {
        let grid =
            Grid::from_file("map_file/test/sample.map", "3,1", &coins(&["7,4"])).unwrap();

        assert_eq!(grid.height, 9);
        assert_eq!(grid.width, 9);

        assert!(grid.is_wall(0, 0));
        assert!(!grid.is_wall(1, 1));
        assert!(grid.is_wall(2, 2));
        assert_eq!(grid.coin_id(7, 4), Some(0));
        assert_eq!(grid.coin_id(6, 4), None);
        assert_eq!(grid.start(), Some((3, 1)));
        assert_eq!(grid.coin_locations(), Grid::sample().coin_locations());
    }

    #[test]
    fn test_octile_symbols() {
        let text = "type octile\nheight 2\nwidth 5\nmap\n.GS @\nOTW#.\n";
        let grid = Grid::from_octile_str(text, "0,0", &coins(&["4,1", "1,0"])).unwrap();
        for x in 0..4 {
            assert!(!grid.is_wall(x, 0));
            assert!(grid.is_wall(x, 1));
        }
        assert!(grid.is_wall(4, 0));
        assert_eq!(grid.coin_locations(), &[(4, 1), (1, 0)]);
        assert_eq!(grid.coin_id(1, 0), Some(1));
    }

    #[test]
    fn test_octile_errors() {
        let start = "0,0";
        let none = coins(&[]);
        let cases = [
            "type grid\nheight 1\nwidth 1\nmap\n.\n",
            "type octile\nheight x\nwidth 1\nmap\n.\n",
            "type octile\nheigh 1\nwidth 1\nmap\n.\n",
            "type octile\nheight 1\nwidth 1\n",
        ];
        for text in cases {
            assert!(matches!(
                Grid::from_octile_str(text, start, &none),
                Err(ConfigurationError::Format(_))
            ));
        }
        assert!(matches!(
            Grid::from_octile_str("type octile\nheight 2\nwidth 1\nmap\n.\n", start, &none),
            Err(ConfigurationError::UnexpectedEof { rows: 1 })
        ));
        // Oversized headers are rejected without allocating for them.
        let huge = format!(
            "type octile\nheight {0}\nwidth {0}\nmap\n.\n",
            u32::MAX as u64 + 1
        );
        assert!(matches!(
            Grid::from_octile_str(&huge, start, &none),
            Err(ConfigurationError::Format(_))
        ));
        let large = "type octile\nheight 100000\nwidth 100000\nmap\n.\n";
        assert!(matches!(
            Grid::from_octile_str(large, start, &none),
            Err(ConfigurationError::InvalidLineLength { row: 0, .. })
        ));
        assert!(matches!(
            Grid::from_octile_str("type octile\nheight 1\nwidth 2\nmap\n.\n", start, &none),
            Err(ConfigurationError::InvalidLineLength { .. })
        ));
        assert!(matches!(
            Grid::from_octile_str("type octile\nheight 1\nwidth 1\nmap\nx\n", start, &none),
            Err(ConfigurationError::UnknownSymbol('x'))
        ));
    }

    #[test]
    fn test_invalid_positions() {
        let text = "type octile\nheight 2\nwidth 2\nmap\n.@\n..\n";
        for start in ["1,0", "2,0", "a,1", "1", "-1,0"] {
            assert!(matches!(
                Grid::from_octile_str(text, start, &[]),
                Err(ConfigurationError::InvalidStart(_))
            ));
        }
        for coin in ["0,0", "1,0", "0,5", "0;1"] {
            assert!(matches!(
                Grid::from_octile_str(text, "0,0", &coins(&[coin])),
                Err(ConfigurationError::InvalidCoin(_))
            ));
        }
        assert!(matches!(
            Grid::from_octile_str(text, "0,0", &coins(&["0,1", "0,1"])),
            Err(ConfigurationError::InvalidCoin(_))
        ));
    }

    #[test]
    fn test_from_symbols() {
        use Symbol::*;
        let grid = Grid::from_symbols(&[
            vec![Wall, Coin(1), Empty],
            vec![Start, Empty, Coin(0)],
        ])
        .unwrap();
        assert_eq!(grid.width, 3);
        assert_eq!(grid.height, 2);
        assert_eq!(grid.coin_locations(), &[(2, 1), (1, 0)]);
        assert_eq!(grid.initial_state().unwrap(), State::new(0, 1, CoinSet::Mask(0)));

        assert!(matches!(
            Grid::from_symbols(&[vec![Start, Start]]),
            Err(ConfigurationError::DuplicateStart)
        ));
        assert!(matches!(
            Grid::from_symbols(&[vec![Start, Coin(1)]]),
            Err(ConfigurationError::InvalidCoinIds { count: 1 })
        ));
        assert!(matches!(
            Grid::from_symbols(&[vec![Start, Coin(0), Coin(0)]]),
            Err(ConfigurationError::InvalidCoinIds { count: 2 })
        ));
        assert!(matches!(
            Grid::from_symbols(&[vec![Start], vec![Empty, Empty]]),
            Err(ConfigurationError::InvalidLineLength { row: 1, .. })
        ));
    }

    #[test]
    fn test_missing_start() {
        let grid = Grid::from_rows(&["  0"]).unwrap();
        assert!(matches!(
            grid.initial_state(),
            Err(ConfigurationError::MissingStart)
        ));
    }

    #[test]
    fn test_successor_order_and_collection() {
        let grid = Grid::sample();
        let start = grid.initial_state().unwrap();
        let positions: Vec<_> = grid
            .successors(&start)
            .iter()
            .map(State::position)
            .collect();
        assert_eq!(positions, vec![(2, 1), (3, 2), (4, 1)]);

        let next_to_coin = State::new(6, 4, start.coins.clone());
        let successors = grid.successors(&next_to_coin);
        assert_eq!(successors.len(), 2);
        assert_eq!(successors[0], State::new(5, 4, start.coins.clone()));
        assert_eq!(successors[1].position(), (7, 4));
        assert!(successors[1].has_collected(0));
        // The parent's set is untouched.
        assert!(next_to_coin.coins.is_empty());
    }

    #[test]
    fn test_successors_stay_valid() {
        let grid = Grid::from_rows(&["A1 ", "# #", "0  "]).unwrap();
        let empty = CoinSet::empty(grid.num_coins());
        for y in 0..grid.height {
            for x in 0..grid.width {
                if grid.is_wall(x, y) {
                    continue;
                }
                for coins in [empty.clone(), empty.with(1)] {
                    let state = State::new(x, y, coins);
                    for next in grid.successors(&state) {
                        assert!(grid.is_within_bounds(next.x as isize, next.y as isize));
                        assert!(!grid.is_wall(next.x, next.y));
                        assert!(state.coins.is_subset(&next.coins));
                        let moved = next.x.abs_diff(x) + next.y.abs_diff(y);
                        assert_eq!(moved, 1);
                    }
                }
            }
        }
    }

    #[test]
    fn test_scatter_coins() {
        let text = "type octile\nheight 3\nwidth 3\nmap\n...\n.@.\n...\n";
        let mut grid = Grid::from_octile_str(text, "0,0", &coins(&["2,2"])).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        grid.scatter_coins(3, &mut rng).unwrap();
        assert_eq!(grid.num_coins(), 4);
        for (id, &(x, y)) in grid.coin_locations().iter().enumerate() {
            assert_eq!(grid.coin_id(x, y), Some(id));
            assert_ne!((x, y), (0, 0));
        }
        assert!(matches!(
            grid.scatter_coins(10, &mut rng),
            Err(ConfigurationError::NotEnoughFreeCells { count: 10, free: 3 })
        ));
    }

    #[test]
    #[should_panic]
    fn test_out_of_bounds_query_panics() {
        Grid::sample().is_wall(9, 0);
    }
}
