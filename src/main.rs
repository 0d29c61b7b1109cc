use coin_astar::algorithm::a_star_search;
use coin_astar::config::{Cli, Config};
use coin_astar::render::{NoProgress, TerminalRenderer, MAX_DRAW_SIZE};
use coin_astar::stat::Stats;

use anyhow::Context;
use clap::Parser;
use std::io;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();
    let cli = Cli::parse();

    let mut config = if let Some(config_file) = cli.config.as_ref() {
        let config_str = std::fs::read_to_string(config_file)
            .with_context(|| format!("cannot read config file: {config_file}"))?;
        Config::from_yaml_str(&config_str)
            .with_context(|| format!("error with config file: {config_file}"))?
    } else {
        info!("No config file specified, using default config");
        Config::default()
    }
    .override_from_command_line(&cli)?;

    let grid = config.load_grid()?;
    if !config.benchmarking && grid.width.max(grid.height) > MAX_DRAW_SIZE {
        warn!("The grid is too large to be drawn. Switching to benchmarking mode.");
        config.benchmarking = true;
    }

    let start_time = Instant::now();
    let heuristic = config.heuristic.build(&grid);
    let result = if config.benchmarking {
        a_star_search(&grid, heuristic.as_ref(), &mut NoProgress)?
    } else {
        let mut renderer = TerminalRenderer::new(io::stdout(), config.frame_delay());
        a_star_search(&grid, heuristic.as_ref(), &mut renderer)?
    };

    let stats = Stats::new(heuristic.name(), &result, start_time.elapsed());
    println!();
    println!("{}", stats.summary());
    stats.print();

    if let Some(output_path) = &config.output_path {
        stats.write_json(output_path)?;
        info!("Stats written to {output_path}");
    }

    Ok(())
}
