//! Benchmark runner over piece and stock catalogs.

use crate::dataset::Catalog;
use crate::result::{BenchmarkResult, RunResult};
use std::time::Instant;
use u_cutstock::CutStockEngine;
use u_cutstock_core::{Config, Strategy};

/// Configuration for benchmark runs.
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Strategies to benchmark.
    pub strategies: Vec<Strategy>,
    /// Number of runs per strategy.
    pub runs_per_config: usize,
    /// Whether to print progress.
    pub show_progress: bool,
    /// Solver settings shared by every run. A seed is offset by the run index.
    pub solver: Config,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            strategies: vec![Strategy::Basic, Strategy::Guillotine, Strategy::Genetic],
            runs_per_config: 1,
            show_progress: true,
            solver: Config::default(),
        }
    }
}

impl BenchmarkConfig {
    /// Creates a new benchmark configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the strategies to benchmark.
    pub fn with_strategies(mut self, strategies: Vec<Strategy>) -> Self {
        self.strategies = strategies;
        self
    }

    /// Sets the number of runs per strategy.
    pub fn with_runs_per_config(mut self, n: usize) -> Self {
        self.runs_per_config = n.max(1);
        self
    }

    /// Sets the solver configuration.
    pub fn with_solver(mut self, solver: Config) -> Self {
        self.solver = solver;
        self
    }

    /// Enables or disables progress output.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Quick preset: the constructive strategies on a short time limit.
    pub fn quick() -> Self {
        Self {
            strategies: vec![Strategy::Basic, Strategy::Guillotine],
            runs_per_config: 1,
            show_progress: true,
            solver: Config::default().with_time_limit(5_000),
        }
    }

    /// Standard preset: every strategy, three runs each.
    pub fn standard() -> Self {
        Self {
            strategies: Strategy::ALL.to_vec(),
            runs_per_config: 3,
            show_progress: true,
            solver: Config::default().with_time_limit(60_000),
        }
    }
}

/// Runs strategies over catalogs and records the outcomes.
pub struct BenchmarkRunner {
    config: BenchmarkConfig,
}

impl BenchmarkRunner {
    /// Creates a new benchmark runner.
    pub fn new(config: BenchmarkConfig) -> Self {
        Self { config }
    }

    /// Runs every configured strategy on one catalog.
    pub fn run_catalog(&self, catalog: &Catalog) -> BenchmarkResult {
        let mut results = BenchmarkResult::new();

        if self.config.show_progress {
            let info = catalog.info();
            println!("\nBenchmarking catalog: {}", info.name);
            println!(
                "  Pieces: {} types, {} units",
                info.piece_types, info.total_pieces
            );
            println!(
                "  Stocks: {} types, {} blocks",
                info.stock_types, info.stock_instances
            );
            if info.stock_volume > 0.0 {
                println!(
                    "  Required volume: {:.0} ({:.1}% of stock)",
                    info.required_volume,
                    info.required_volume / info.stock_volume * 100.0
                );
            }
        }

        for &strategy in &self.config.strategies {
            if self.config.show_progress {
                println!("  Running {}...", strategy);
            }

            for run_idx in 0..self.config.runs_per_config {
                let mut solver = self.config.solver.clone();
                if let Some(seed) = solver.seed {
                    solver.seed = Some(seed.wrapping_add(run_idx as u64));
                }
                let engine = CutStockEngine::new(solver);

                let start = Instant::now();
                let outcome = engine.run(strategy, &catalog.pieces, &catalog.stocks);
                let elapsed = start.elapsed().as_millis() as u64;

                match outcome {
                    Ok(result) => {
                        let run = RunResult::from_result(
                            &catalog.name,
                            strategy.name(),
                            &result,
                            elapsed,
                        );
                        if self.config.show_progress {
                            println!(
                                "    Run {}: efficiency={:.2}%, stocks={}, placed={}/{}, time={}ms",
                                run_idx + 1,
                                run.efficiency,
                                run.layouts_used,
                                run.placed,
                                run.placed + run.unplaced,
                                elapsed
                            );
                        }
                        results.add_run(run);
                    }
                    Err(e) => {
                        log::warn!(
                            "{} run {} on {} failed: {}",
                            strategy,
                            run_idx + 1,
                            catalog.name,
                            e
                        );
                    }
                }
            }
        }

        results
    }

    /// Runs benchmarks on several catalogs.
    pub fn run_catalogs(&self, catalogs: &[Catalog]) -> BenchmarkResult {
        let mut combined = BenchmarkResult::new();
        for catalog in catalogs {
            combined.merge(self.run_catalog(catalog));
        }
        combined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use u_cutstock_core::{Piece, StockBlock};

    fn catalog() -> Catalog {
        Catalog::new(
            "small",
            vec![Piece::new("A", 50.0, 50.0, 50.0).with_quantity(4)],
            vec![StockBlock::new("S", 100.0, 100.0, 100.0).with_quantity(2)],
        )
    }

    #[test]
    fn test_run_catalog_records_each_run() {
        let config = BenchmarkConfig::quick()
            .with_runs_per_config(2)
            .with_progress(false);
        let results = BenchmarkRunner::new(config).run_catalog(&catalog());

        assert_eq!(results.runs.len(), 4);
        assert!(results
            .runs
            .iter()
            .all(|r| r.unplaced == 0 && r.layouts_used == 1));
        assert!(results.runs.iter().any(|r| r.strategy == "guillotine"));
    }

    #[test]
    fn test_failed_runs_are_skipped() {
        let mut bad = catalog();
        bad.stocks.clear();
        let config = BenchmarkConfig::quick().with_progress(false);
        let results = BenchmarkRunner::new(config).run_catalogs(&[bad, catalog()]);

        assert_eq!(results.runs.len(), 2);
        assert!(results.runs.iter().all(|r| r.catalog == "small"));
    }
}
