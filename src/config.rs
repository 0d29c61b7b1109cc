use std::time::Duration;

use anyhow::{anyhow, Context};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use tracing::info;

use crate::heuristic::HeuristicKind;
use crate::map::Grid;

#[derive(Parser, Debug)]
#[command(
    name = "Coin A*",
    about = "A* search for an agent collecting every coin on a grid map.",
    version = "1.0"
)]
pub struct Cli {
    #[arg(help = "Path to grid file (https://www.movingai.com/benchmarks/formats.html)")]
    pub map_path: Option<String>,

    #[arg(help = "Agent's initial position as x,y")]
    pub start: Option<String>,

    #[arg(help = "Coin positions as x,y")]
    pub coins: Vec<String>,

    #[arg(long, help = "Path to a YAML config file")]
    pub config: Option<String>,

    #[arg(
        long,
        value_enum,
        help = "Heuristic to use; blind turns A* into breadth-first search"
    )]
    pub heuristic: Option<HeuristicKind>,

    #[arg(long, help = "States printed per second")]
    pub rate: Option<f64>,

    #[arg(long, help = "Do not print search progress", default_value_t = false)]
    pub benchmarking: bool,

    #[arg(long, help = "Write run statistics as JSON to this path")]
    pub output_path: Option<String>,

    #[arg(long, help = "Scatter this many extra coins over free cells")]
    pub random_coins: Option<usize>,

    #[arg(long, help = "Seed for the random number generator")]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub map_path: Option<String>,
    pub start: Option<String>,
    pub coins: Vec<String>,
    pub heuristic: HeuristicKind,
    pub rate: f64,
    pub benchmarking: bool,
    pub output_path: Option<String>,
    pub random_coins: usize,
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            map_path: None,
            start: None,
            coins: Vec::new(),
            heuristic: HeuristicKind::Blind,
            rate: 1.5,
            benchmarking: false,
            output_path: None,
            random_coins: 0,
            seed: 0,
        }
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Command-line values win over the config file; the merged result is
    /// validated.
    pub fn override_from_command_line(mut self, cli: &Cli) -> anyhow::Result<Self> {
        if cli.map_path.is_some() {
            self.map_path = cli.map_path.clone();
        }
        if cli.start.is_some() {
            self.start = cli.start.clone();
        }
        if !cli.coins.is_empty() {
            self.coins = cli.coins.clone();
        }
        if let Some(heuristic) = cli.heuristic {
            self.heuristic = heuristic;
        }
        if let Some(rate) = cli.rate {
            self.rate = rate;
        }
        self.benchmarking |= cli.benchmarking;
        if cli.output_path.is_some() {
            self.output_path = cli.output_path.clone();
        }
        if let Some(random_coins) = cli.random_coins {
            self.random_coins = random_coins;
        }
        if let Some(seed) = cli.seed {
            self.seed = seed;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let has_coins = !self.coins.is_empty() || self.random_coins > 0;
        let given = [self.map_path.is_some(), self.start.is_some(), has_coins];
        if given.iter().any(|&set| set) && !given.iter().all(|&set| set) {
            return Err(anyhow!("grid, start, and coin must be defined together"));
        }

        if !(self.rate.is_finite() && self.rate > 0.0) {
            return Err(anyhow!("Rate must be a positive number, got {}", self.rate));
        }
        Ok(())
    }

    /// Pause between two progress frames.
    pub fn frame_delay(&self) -> Duration {
        Duration::from_secs_f64(0.001 / self.rate)
    }

    /// The configured map with its coins, or the built-in sample grid.
    pub fn load_grid(&self) -> anyhow::Result<Grid> {
        let (Some(map_path), Some(start)) = (&self.map_path, &self.start) else {
            info!("No map specified, using the sample grid");
            return Ok(Grid::sample());
        };

        let mut grid = Grid::from_file(map_path, start, &self.coins)
            .with_context(|| format!("error loading map: {map_path}"))?;
        if self.random_coins > 0 {
            let mut rng = StdRng::seed_from_u64(self.seed);
            grid.scatter_coins(self.random_coins, &mut rng)
                .with_context(|| format!("error placing random coins on {map_path}"))?;
        }
        Ok(grid)
    }
}
