//! 3D cutting-stock solver.

use crate::adaptive::run_adaptive;
use crate::ga_packing::run_ga_packing;
use crate::hybrid::run_hybrid;
use crate::packing_utils::{PackingContext, PlacerKind};
use crate::sa_packing::run_sa_packing;
use u_cutstock_core::geometry::{validate_catalogs, Piece, StockBlock};
use u_cutstock_core::result::{AlgorithmData, OptimizationResult};
use u_cutstock_core::solver::{CancellationToken, Config, ProgressReporter, Solver, Strategy};
use u_cutstock_core::Result;

use std::time::Instant;

/// 3D cutting-stock solver dispatching on [`Config::strategy`].
pub struct Packer3D {
    config: Config,
    cancelled: CancellationToken,
}

impl Packer3D {
    /// Creates a new packer with the given configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cancelled: CancellationToken::new(),
        }
    }

    /// Creates a packer with default configuration.
    pub fn default_config() -> Self {
        Self::new(Config::default())
    }

    /// Observes an externally owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancelled = token;
        self
    }

    /// Returns a handle to cancel running solves.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancelled.clone()
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Greedy extreme point packing in volume-descending order.
    fn basic(&self, ctx: PackingContext, reporter: &ProgressReporter) -> OptimizationResult {
        reporter.report("basic", 0.0, "Packing in volume-descending order");
        let ctx = ctx.with_placer(PlacerKind::Greedy);
        let result = ctx
            .to_result(ctx.decode_seed())
            .with_algorithm_data(AlgorithmData::new("basic"));
        reporter.report("basic", 100.0, "Complete");
        result
    }

    /// Guillotine-constrained packing in volume-descending order.
    fn guillotine(&self, ctx: PackingContext, reporter: &ProgressReporter) -> OptimizationResult {
        reporter.report("guillotine", 0.0, "Building cut trees");
        let ctx = ctx.with_placer(PlacerKind::Guillotine);
        let mut result = ctx.to_result(ctx.decode_seed());

        let mut data = AlgorithmData::new("guillotine");
        data.total_cuts = Some(result.total_cuts());
        result.algorithm_data = Some(data);

        reporter.report("guillotine", 100.0, "Complete");
        result
    }

    fn dispatch(
        &self,
        pieces: &[Piece],
        stocks: &[StockBlock],
        reporter: &ProgressReporter,
    ) -> Result<OptimizationResult> {
        let ctx = PackingContext::new(pieces, stocks, &self.config);

        match self.config.strategy {
            Strategy::Basic => Ok(self.basic(ctx, reporter)),
            Strategy::Guillotine => Ok(self.guillotine(ctx, reporter)),
            Strategy::Genetic => run_ga_packing(&ctx, &self.config, reporter, &self.cancelled),
            Strategy::Annealing => run_sa_packing(&ctx, &self.config, reporter, &self.cancelled),
            Strategy::Hybrid => run_hybrid(&ctx, &self.config, reporter, &self.cancelled),
            Strategy::Adaptive => run_adaptive(pieces, stocks, &self.config, reporter, &self.cancelled),
        }
    }
}

impl Solver for Packer3D {
    fn solve(&self, pieces: &[Piece], stocks: &[StockBlock]) -> Result<OptimizationResult> {
        self.solve_with_progress(pieces, stocks, &ProgressReporter::silent())
    }

    fn solve_with_progress(
        &self,
        pieces: &[Piece],
        stocks: &[StockBlock],
        reporter: &ProgressReporter,
    ) -> Result<OptimizationResult> {
        validate_catalogs(pieces, stocks)?;
        self.config.validate()?;

        let start = Instant::now();
        let strategy = self.config.strategy;

        let mut result = if pieces.is_empty() {
            OptimizationResult::new().with_algorithm_data(AlgorithmData::new(strategy.name()))
        } else {
            self.dispatch(pieces, stocks, reporter)?
        };

        let data = result
            .algorithm_data
            .get_or_insert_with(|| AlgorithmData::new(strategy.name()));
        data.elapsed_ms = start.elapsed().as_millis() as u64;

        log::info!(
            "{} packing: efficiency={:.2}%, layouts={}, placed={}, unplaced={}{}",
            strategy,
            result.efficiency,
            result.layouts_used(),
            result.placed_count(),
            result.unplaced_count(),
            if result.partial { " (partial)" } else { "" }
        );

        Ok(result)
    }

    fn cancel(&self) {
        self.cancelled.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use u_cutstock_core::Error;

    fn quick(strategy: Strategy) -> Config {
        Config::default()
            .with_strategy(strategy)
            .with_seed(17)
            .with_population_size(12)
            .with_max_generations(8)
            .with_max_iterations(300)
    }

    #[test]
    fn test_simple_packing() {
        let pieces = vec![
            Piece::new("B1", 20.0, 20.0, 20.0).with_quantity(3),
            Piece::new("B2", 15.0, 15.0, 15.0).with_quantity(2),
        ];
        let stocks = vec![StockBlock::new("S", 100.0, 80.0, 50.0)];

        let result = Packer3D::default_config().solve(&pieces, &stocks).unwrap();

        assert_eq!(result.placed_count(), 5);
        assert_eq!(result.layouts_used(), 1);
        assert_eq!(result.strategy(), Some("basic"));
        assert!(result.efficiency > 0.0);
    }

    #[test]
    fn test_empty_pieces_give_empty_result() {
        let stocks = vec![StockBlock::new("S", 10.0, 10.0, 10.0)];
        let result = Packer3D::default_config().solve(&[], &stocks).unwrap();

        assert!(result.layouts.is_empty());
        assert_relative_eq!(result.efficiency, 0.0);
        assert_relative_eq!(result.total_waste, 0.0);
    }

    #[test]
    fn test_empty_stocks_is_configuration_error() {
        let pieces = vec![Piece::new("P", 1.0, 1.0, 1.0)];
        let err = Packer3D::default_config().solve(&pieces, &[]).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_invalid_piece_rejected_before_packing() {
        let pieces = vec![Piece::new("P", 1.0, 0.0, 1.0)];
        let stocks = vec![StockBlock::new("S", 10.0, 10.0, 10.0)];
        let err = Packer3D::default_config().solve(&pieces, &stocks).unwrap_err();
        assert!(matches!(err, Error::InvalidPiece(_)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let pieces = vec![Piece::new("P", 1.0, 1.0, 1.0)];
        let stocks = vec![StockBlock::new("S", 10.0, 10.0, 10.0)];
        let mut config = Config::default();
        config.cooling_rate = 1.5;
        assert!(Packer3D::new(config).solve(&pieces, &stocks).is_err());
    }

    #[test]
    fn test_guillotine_strategy_reports_cuts() {
        let pieces = vec![Piece::new("P", 50.0, 40.0, 30.0).with_quantity(2)];
        let stocks = vec![StockBlock::new("S", 100.0, 100.0, 100.0)];

        let result = Packer3D::new(quick(Strategy::Guillotine))
            .solve(&pieces, &stocks)
            .unwrap();

        assert_eq!(result.placed_count(), 2);
        let data = result.algorithm_data.as_ref().unwrap();
        assert_eq!(data.total_cuts, Some(result.total_cuts()));
        assert!(result.total_cuts() >= 3);
        assert!(result.layouts[0].cutting_pattern.is_some());
    }

    #[test]
    fn test_every_strategy_places_easy_problem() {
        let pieces = vec![Piece::new("B1", 10.0, 10.0, 10.0).with_quantity(4)];
        let stocks = vec![StockBlock::new("S", 100.0, 100.0, 100.0)];

        for strategy in Strategy::ALL {
            let result = Packer3D::new(quick(strategy)).solve(&pieces, &stocks).unwrap();
            assert_eq!(result.placed_count(), 4, "strategy {}", strategy);
            assert!(result.unplaced.is_empty(), "strategy {}", strategy);
        }
    }

    #[test]
    fn test_cancel_marks_metaheuristics_partial() {
        let pieces = vec![Piece::new("B1", 10.0, 10.0, 10.0).with_quantity(4)];
        let stocks = vec![StockBlock::new("S", 100.0, 100.0, 100.0)];

        for strategy in [Strategy::Genetic, Strategy::Annealing] {
            let packer = Packer3D::new(quick(strategy));
            packer.cancel();
            let result = packer.solve(&pieces, &stocks).unwrap();
            assert!(result.partial, "strategy {}", strategy);
            assert_eq!(result.placed_count(), 4);
        }
    }
}
