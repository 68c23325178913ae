//! Benchmark result types and recording.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use u_cutstock_core::OptimizationResult;

/// Result of a single benchmark run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Catalog name
    pub catalog: String,
    /// Strategy used
    pub strategy: String,
    /// Volume efficiency in percent
    pub efficiency: f64,
    /// Waste in percent
    pub total_waste: f64,
    /// Stock instances used
    pub layouts_used: usize,
    /// Pieces placed
    pub placed: usize,
    /// Pieces left unplaced
    pub unplaced: usize,
    /// Guillotine cuts, when counted
    pub total_cuts: usize,
    /// Price of the used stock
    pub total_cost: f64,
    /// Computation time in milliseconds
    pub time_ms: u64,
    /// Run was cancelled or timed out
    pub partial: bool,
}

impl RunResult {
    /// Records a finished optimization.
    pub fn from_result(
        catalog: impl Into<String>,
        strategy: impl Into<String>,
        result: &OptimizationResult,
        time_ms: u64,
    ) -> Self {
        Self {
            catalog: catalog.into(),
            strategy: strategy.into(),
            efficiency: result.efficiency,
            total_waste: result.total_waste,
            layouts_used: result.layouts_used(),
            placed: result.placed_count(),
            unplaced: result.unplaced_count(),
            total_cuts: result.total_cuts(),
            total_cost: result.total_cost,
            time_ms,
            partial: result.partial,
        }
    }
}

/// Collection of benchmark results.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Individual run results
    pub runs: Vec<RunResult>,
    /// Unix timestamp in seconds when the benchmark was started
    pub timestamp: u64,
    /// Crate version that produced the results
    pub version: String,
}

impl BenchmarkResult {
    /// Creates a new benchmark result.
    pub fn new() -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self {
            runs: Vec::new(),
            timestamp,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Adds a run result.
    pub fn add_run(&mut self, result: RunResult) {
        self.runs.push(result);
    }

    /// Moves all runs of `other` into this result.
    pub fn merge(&mut self, other: BenchmarkResult) {
        self.runs.extend(other.runs);
    }

    /// Saves results to a JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
    }

    /// Saves results to a CSV file.
    pub fn save_csv(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let mut file = File::create(path)?;

        writeln!(
            file,
            "catalog,strategy,efficiency,total_waste,layouts_used,placed,unplaced,total_cuts,total_cost,time_ms,partial"
        )?;

        for run in &self.runs {
            writeln!(
                file,
                "{},{},{:.4},{:.4},{},{},{},{},{:.2},{},{}",
                run.catalog,
                run.strategy,
                run.efficiency,
                run.total_waste,
                run.layouts_used,
                run.placed,
                run.unplaced,
                run.total_cuts,
                run.total_cost,
                run.time_ms,
                run.partial,
            )?;
        }

        Ok(())
    }

    /// Prints a summary table to stdout.
    pub fn print_summary(&self) {
        println!("\n{:=<100}", "");
        println!("BENCHMARK RESULTS");
        println!("{:=<100}", "");
        println!(
            "{:<20} {:<12} {:>10} {:>8} {:>10} {:>8} {:>10} {:>10}",
            "Catalog", "Strategy", "Eff%", "Stocks", "Placed", "Cuts", "Cost", "Time(ms)"
        );
        println!("{:-<100}", "");

        for run in &self.runs {
            println!(
                "{:<20} {:<12} {:>10.2} {:>8} {:>10} {:>8} {:>10.2} {:>10}",
                run.catalog,
                run.strategy,
                run.efficiency,
                run.layouts_used,
                format!("{}/{}", run.placed, run.placed + run.unplaced),
                run.total_cuts,
                run.total_cost,
                run.time_ms
            );
        }

        println!("{:=<100}\n", "");
    }

    /// Computes summary statistics grouped by strategy, sorted by name.
    pub fn summary_by_strategy(&self) -> Vec<StrategySummary> {
        let mut by_strategy: BTreeMap<&str, Vec<&RunResult>> = BTreeMap::new();
        for run in &self.runs {
            by_strategy.entry(&run.strategy).or_default().push(run);
        }

        by_strategy
            .into_iter()
            .map(|(strategy, runs)| {
                let n = runs.len() as f64;
                StrategySummary {
                    strategy: strategy.to_string(),
                    run_count: runs.len(),
                    avg_efficiency: runs.iter().map(|r| r.efficiency).sum::<f64>() / n,
                    best_efficiency: runs
                        .iter()
                        .map(|r| r.efficiency)
                        .fold(f64::NEG_INFINITY, f64::max),
                    avg_time_ms: (runs.iter().map(|r| r.time_ms).sum::<u64>() as f64 / n) as u64,
                    fully_placed: runs.iter().filter(|r| r.unplaced == 0).count(),
                }
            })
            .collect()
    }
}

/// Summary statistics for a strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategySummary {
    pub strategy: String,
    pub run_count: usize,
    pub avg_efficiency: f64,
    pub best_efficiency: f64,
    pub avg_time_ms: u64,
    /// Runs that placed every requested piece.
    pub fully_placed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(strategy: &str, efficiency: f64, unplaced: usize, time_ms: u64) -> RunResult {
        RunResult {
            catalog: "c".into(),
            strategy: strategy.into(),
            efficiency,
            total_waste: 100.0 - efficiency,
            layouts_used: 1,
            placed: 4,
            unplaced,
            total_cuts: 0,
            total_cost: 10.0,
            time_ms,
            partial: false,
        }
    }

    #[test]
    fn test_summary_by_strategy() {
        let mut results = BenchmarkResult::new();
        results.add_run(run("genetic", 80.0, 0, 100));
        results.add_run(run("basic", 70.0, 1, 2));
        results.add_run(run("genetic", 90.0, 1, 300));

        let summary = results.summary_by_strategy();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].strategy, "basic");

        let genetic = &summary[1];
        assert_eq!(genetic.run_count, 2);
        assert!((genetic.avg_efficiency - 85.0).abs() < 1e-9);
        assert!((genetic.best_efficiency - 90.0).abs() < 1e-9);
        assert_eq!(genetic.avg_time_ms, 200);
        assert_eq!(genetic.fully_placed, 1);
    }

    #[test]
    fn test_save_csv_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let mut results = BenchmarkResult::new();
        results.add_run(run("basic", 75.0, 0, 5));

        let csv = dir.path().join("runs.csv");
        results.save_csv(&csv).unwrap();
        let text = std::fs::read_to_string(&csv).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("catalog,strategy,efficiency"));
        assert!(lines[1].starts_with("c,basic,75.0000"));

        let json = dir.path().join("runs.json");
        results.save_json(&json).unwrap();
        let loaded: BenchmarkResult =
            serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
        assert_eq!(loaded.runs.len(), 1);
        assert_eq!(loaded.version, results.version);
    }
}
