use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::Serialize;
use tracing::info;

use crate::algorithm::SearchResult;
use crate::common::State;

#[derive(Debug, Clone, Default, Serialize)]
pub struct Stats {
    pub heuristic: String,
    pub solved: bool,
    pub plan_length: Option<usize>,
    pub expansions: usize,
    pub visited: usize,
    pub time_ms: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<Vec<State>>,
}

impl Stats {
    pub fn new(heuristic: &str, result: &SearchResult, elapsed: Duration) -> Self {
        Stats {
            heuristic: heuristic.to_string(),
            solved: result.plan.is_some(),
            plan_length: result.plan_length(),
            expansions: result.expansions,
            visited: result.visited,
            time_ms: elapsed.as_millis() as usize,
            plan: result.plan.clone(),
        }
    }

    pub fn print(&self) {
        info!(
            "Heuristic {} Plan length {:?} Expanded {} Visited {} Time(milliseconds) {}",
            self.heuristic, self.plan_length, self.expansions, self.visited, self.time_ms
        );
    }

    /// Console report shown at the end of a run.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        match self.plan_length {
            Some(length) => {
                lines.push("Solution found!".to_string());
                lines.push(format!("Plan length:     {length}"));
            }
            None => lines.push("Search terminated without finding a solution!".to_string()),
        }
        lines.push(format!("States expanded: {}", self.expansions));
        lines.push(format!("States visited:  {}", self.visited));
        lines.push(format!("Total time:      {:.3}s", self.time_ms as f64 / 1000.0));
        lines.join("\n")
    }

    pub fn write_json(&self, path: &str) -> anyhow::Result<()> {
        if let Some(parent) = Path::new(path).parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("cannot create output directory for {path}"))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("cannot write stats to {path}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{CoinSet, State};

    fn result(plan: Option<usize>) -> SearchResult {
        SearchResult {
            expansions: 21,
            visited: 23,
            plan: plan.map(|moves| {
                (0..=moves)
                    .map(|x| State::new(x, 0, CoinSet::empty(0)))
                    .collect()
            }),
        }
    }

    #[test]
    fn test_summary_solved() {
        let stats = Stats::new("Blind", &result(Some(7)), Duration::from_millis(1250));
        assert_eq!(
            stats.summary(),
            "Solution found!\n\
             Plan length:     7\n\
             States expanded: 21\n\
             States visited:  23\n\
             Total time:      1.250s"
        );
    }

    #[test]
    fn test_summary_unsolved() {
        let stats = Stats::new("Blind", &result(None), Duration::ZERO);
        assert!(!stats.solved);
        assert!(!serde_json::to_string(&stats).unwrap().contains("plan\":["));
        assert!(stats
            .summary()
            .starts_with("Search terminated without finding a solution!\nStates expanded: 21"));
    }

    #[test]
    fn test_write_json() {
        let dir = std::env::temp_dir().join(format!("coin_astar_stats_{}", std::process::id()));
        let path = dir.join("nested").join("stats.json");
        let path = path.to_str().unwrap();
        let stats = Stats::new("ManhattanMax", &result(Some(3)), Duration::from_millis(4));
        stats.write_json(path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value["heuristic"], "ManhattanMax");
        assert_eq!(value["plan_length"], 3);
        assert_eq!(value["expansions"], 21);
        assert_eq!(value["time_ms"], 4);
        assert_eq!(value["plan"][2]["x"], 2);
        assert_eq!(value["plan"][2]["coins"], serde_json::json!([]));
        fs::remove_dir_all(dir).unwrap();
    }
}
