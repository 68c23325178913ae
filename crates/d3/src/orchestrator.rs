//! Runs several strategies on the same catalogs and keeps the best result.

use crate::packer::Packer3D;
use rayon::prelude::*;
use u_cutstock_core::geometry::{validate_catalogs, Piece, StockBlock};
use u_cutstock_core::result::{AlgorithmComparison, AlgorithmRun, OptimizationResult};
use u_cutstock_core::solver::{CancellationToken, Config, ProgressReporter, Solver, Strategy};
use u_cutstock_core::{Error, Result};

const EFFICIENCY_TOLERANCE: f64 = 1e-9;

/// Concurrent multi-strategy runner.
pub struct Orchestrator {
    config: Config,
    strategies: Vec<Strategy>,
    cancelled: CancellationToken,
}

impl Orchestrator {
    /// Creates an orchestrator for the given strategies, in run order.
    pub fn new(config: Config, strategies: Vec<Strategy>) -> Self {
        Self {
            config,
            strategies,
            cancelled: CancellationToken::new(),
        }
    }

    /// Shares a cancellation token with every run.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancelled = token;
        self
    }

    /// Returns a handle to cancel all runs.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancelled.clone()
    }

    /// Strategies in run order.
    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    /// Runs every strategy and returns the winner with the comparison attached.
    pub fn run(
        &self,
        pieces: &[Piece],
        stocks: &[StockBlock],
        reporter: &ProgressReporter,
    ) -> Result<OptimizationResult> {
        if self.strategies.is_empty() {
            return Err(Error::Configuration(
                "At least one algorithm must be specified".into(),
            ));
        }
        validate_catalogs(pieces, stocks)?;

        let results: Vec<OptimizationResult> = self
            .strategies
            .par_iter()
            .map(|&strategy| {
                let solver = Packer3D::new(self.config.clone().with_strategy(strategy))
                    .with_cancellation(self.cancelled.clone());
                solver.solve_with_progress(pieces, stocks, reporter)
            })
            .collect::<Result<_>>()?;

        let runs: Vec<AlgorithmRun> = self
            .strategies
            .iter()
            .zip(&results)
            .map(|(strategy, result)| algorithm_run(*strategy, result))
            .collect();

        let best = rank_runs(&runs).unwrap_or(0);
        let best_algorithm = runs[best].algorithm.clone();
        log::info!(
            "orchestrator: {} wins with efficiency={:.2}% over {} runs",
            best_algorithm,
            runs[best].efficiency,
            runs.len()
        );

        let mut winner = results.into_iter().nth(best).unwrap_or_default();
        winner.algorithm_comparison = Some(AlgorithmComparison {
            best_algorithm,
            results: runs,
        });
        reporter.report("comparison", 100.0, "Complete");
        Ok(winner)
    }
}

fn algorithm_run(strategy: Strategy, result: &OptimizationResult) -> AlgorithmRun {
    AlgorithmRun {
        algorithm: strategy.name().to_string(),
        efficiency: result.efficiency,
        total_waste: result.total_waste,
        layouts_used: result.layouts_used(),
        placed_count: result.placed_count(),
        unplaced_count: result.unplaced_count(),
        total_cuts: result.total_cuts(),
        elapsed_ms: result.algorithm_data.as_ref().map_or(0, |d| d.elapsed_ms),
    }
}

/// Index of the winning run.
///
/// Highest efficiency wins; within tolerance, fewer cuts win, then the
/// earlier run.
pub fn rank_runs(runs: &[AlgorithmRun]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (idx, run) in runs.iter().enumerate() {
        let Some(current) = best else {
            best = Some(idx);
            continue;
        };
        let leader = &runs[current];
        let better = if run.efficiency > leader.efficiency + EFFICIENCY_TOLERANCE {
            true
        } else if (run.efficiency - leader.efficiency).abs() <= EFFICIENCY_TOLERANCE {
            run.total_cuts < leader.total_cuts
        } else {
            false
        };
        if better {
            best = Some(idx);
        }
    }
    best
}
