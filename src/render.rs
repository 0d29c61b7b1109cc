use std::collections::HashSet;
use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use tracing::warn;

use crate::algorithm::{SearchNode, SearchTables};
use crate::common::State;
use crate::map::Grid;

/// Grids larger than this in either dimension are never drawn.
pub const MAX_DRAW_SIZE: usize = 100;

const CLEAR_SCREEN: &str = "\x1b[H\x1b[2J\x1b[3J";
const WALL: char = '\u{25A8}';
const MARK: char = '\u{25CF}';

const COLOR_DEFAULT: &str = "1;30";
const COLOR_COIN: &str = "1;28";
const COLOR_EXPANDED: &str = "1;31";
const COLOR_VISITED: &str = "1;33";
const COLOR_PATH: &str = "1;34";

/// Observer of a running search. Implementations get read-only access and are
/// called at most once per expansion.
pub trait ProgressReporter {
    fn on_start(&mut self, _grid: &Grid, _root: &SearchNode, _tables: &SearchTables) {}

    fn on_expansion(&mut self, grid: &Grid, node: &SearchNode, tables: &SearchTables);

    fn on_solution(&mut self, _grid: &Grid, _plan: &[State]) {}
}

/// Reporter for benchmarking runs.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn on_expansion(&mut self, _grid: &Grid, _node: &SearchNode, _tables: &SearchTables) {}
}

/// Animates the search in an ANSI terminal: expanded cells of the current
/// coin set in red, visited ones in yellow, and the final path in blue.
pub struct TerminalRenderer<W: Write> {
    out: W,
    delay: Duration,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, delay: Duration) -> Self {
        TerminalRenderer { out, delay }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn draw_progress(
        &mut self,
        grid: &Grid,
        state: &State,
        tables: &SearchTables,
    ) -> io::Result<()> {
        if grid.width.max(grid.height) > MAX_DRAW_SIZE {
            return Ok(());
        }

        let mut frame = String::from(CLEAR_SCREEN);
        for y in 0..grid.height {
            for x in 0..grid.width {
                let visited = tables.visited_h(&state.coins, x, y).is_some();
                let expanded = tables.is_expanded(&state.coins, x, y);
                let mut color = COLOR_DEFAULT;
                let symbol = match grid.coin_id(x, y) {
                    _ if grid.is_wall(x, y) => WALL.to_string(),
                    _ if state.position() == (x, y) => "A".to_string(),
                    Some(id) if !state.has_collected(id) => {
                        color = COLOR_COIN;
                        id.to_string()
                    }
                    _ if visited || expanded => MARK.to_string(),
                    _ => " ".to_string(),
                };
                if expanded {
                    color = COLOR_EXPANDED;
                } else if visited {
                    color = COLOR_VISITED;
                }
                frame.push_str(&format!("\x1b[{color}m {symbol}\x1b[0m"));
            }
            frame.push('\n');
        }
        frame.push_str(&format!(" Collected coin ids: {}\n", state.coins));

        self.out.write_all(frame.as_bytes())?;
        self.out.flush()
    }

    fn draw_plan(&mut self, grid: &Grid, plan: &[State]) -> io::Result<()> {
        let Some(last) = plan.last() else {
            return Ok(());
        };
        if grid.width.max(grid.height) > MAX_DRAW_SIZE {
            return Ok(());
        }

        let path: HashSet<(usize, usize)> = plan.iter().map(State::position).collect();
        let mut frame = String::from(CLEAR_SCREEN);
        for y in 0..grid.height {
            for x in 0..grid.width {
                let on_path = path.contains(&(x, y));
                let mut color = COLOR_DEFAULT;
                let symbol = match grid.coin_id(x, y) {
                    _ if grid.is_wall(x, y) => WALL.to_string(),
                    _ if last.position() == (x, y) => "A".to_string(),
                    Some(id) => {
                        color = COLOR_COIN;
                        id.to_string()
                    }
                    None if on_path => MARK.to_string(),
                    None => " ".to_string(),
                };
                if on_path {
                    color = COLOR_PATH;
                }
                frame.push_str(&format!("\x1b[{color}m {symbol}\x1b[0m"));
            }
            frame.push('\n');
        }
        frame.push_str(&format!(" Collected coin ids: {}\n", last.coins));

        self.out.write_all(frame.as_bytes())?;
        self.out.flush()
    }
}

impl<W: Write> ProgressReporter for TerminalRenderer<W> {
    fn on_start(&mut self, grid: &Grid, root: &SearchNode, tables: &SearchTables) {
        if let Err(err) = self.draw_progress(grid, &root.state, tables) {
            warn!("failed to draw search progress: {err}");
        }
    }

    fn on_expansion(&mut self, grid: &Grid, node: &SearchNode, tables: &SearchTables) {
        if let Err(err) = self.draw_progress(grid, &node.state, tables) {
            warn!("failed to draw search progress: {err}");
        }
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
    }

    fn on_solution(&mut self, grid: &Grid, plan: &[State]) {
        if let Err(err) = self.draw_plan(grid, plan) {
            warn!("failed to draw plan: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::a_star_search;
    use crate::heuristic::HeuristicKind;

    fn render(grid: &Grid) -> String {
        let heuristic = HeuristicKind::Blind.build(grid);
        let mut renderer = TerminalRenderer::new(Vec::new(), Duration::ZERO);
        a_star_search(grid, heuristic.as_ref(), &mut renderer).unwrap();
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn test_frames_per_expansion() {
        let grid = Grid::from_rows(&["A 0"]).unwrap();
        let output = render(&grid);
        // Start frame, one frame per non-goal expansion, final plan.
        assert_eq!(output.matches(CLEAR_SCREEN).count(), 1 + 2 + 1);

        let frames: Vec<&str> = output.split(CLEAR_SCREEN).skip(1).collect();
        assert!(frames[0].contains("\x1b[1;33m A"));
        assert!(frames[0].contains("\x1b[1;28m 0"));
        assert!(frames[0].ends_with(" Collected coin ids: --\n"));
        // After expanding the start, its neighbour is visited.
        assert!(frames[1].contains(&format!("\x1b[{COLOR_VISITED}m {MARK}")));
        // The final frame draws the whole path.
        assert_eq!(frames[3].matches(COLOR_PATH).count(), 3);
        assert!(frames[3].ends_with(" Collected coin ids: 0\n"));
    }

    #[test]
    fn test_walls_are_drawn() {
        let grid = Grid::from_rows(&["A#0", "   "]).unwrap();
        let output = render(&grid);
        let first = output.split(CLEAR_SCREEN).nth(1).unwrap();
        assert_eq!(first.matches(WALL).count(), 1);
        assert_eq!(first.lines().count(), 3);
    }

    #[test]
    fn test_large_grid_is_skipped() {
        let row = format!("A{}", " ".repeat(MAX_DRAW_SIZE));
        let grid = Grid::from_rows(&[row.as_str()]).unwrap();
        assert!(render(&grid).is_empty());
    }
}
