//! Simulated Annealing-based 3D cutting-stock optimization.
//!
//! SA walks the (order, rotation genes) space with neighborhood operators and
//! accepts worse candidates with a probability that decreases as the
//! temperature cools.
//!
//! # Neighborhood Operators
//!
//! - **Swap**: Exchange positions of two instances in the sequence
//! - **Relocate**: Move an instance to a different position
//! - **Inversion**: Reverse a segment of the sequence
//! - **Rotation**: Change the rotation gene of an instance

use crate::packing_utils::{make_rng, PackingContext};
use u_cutstock_core::result::{AlgorithmData, OptimizationResult};
use u_cutstock_core::sa::{
    NeighborhoodOperator, SaConfig, SaProblem, SaProgress, SaResult, SaRunner, SaSolution,
    SequenceSolution,
};
use u_cutstock_core::solver::{CancellationToken, Config, ProgressReporter};
use u_cutstock_core::Result;

/// SA problem definition for cutting-stock packing.
pub struct SaPackingProblem<'a> {
    ctx: &'a PackingContext,
    /// Order of the initial solution; the volume-descending order when `None`.
    seed: Option<Vec<usize>>,
}

impl<'a> SaPackingProblem<'a> {
    /// Creates a new SA packing problem over a shared context.
    pub fn new(ctx: &'a PackingContext) -> Self {
        Self { ctx, seed: None }
    }

    /// Starts the walk from the given order with every gene 0.
    pub fn with_seed(mut self, order: Vec<usize>) -> Self {
        self.seed = Some(order);
        self
    }

    /// Returns the total number of instances.
    pub fn num_instances(&self) -> usize {
        self.ctx.instance_count()
    }

    /// Decodes a solution into a result.
    pub fn decode(&self, solution: &SequenceSolution) -> OptimizationResult {
        self.ctx
            .to_result(self.ctx.decode(&solution.sequence, &solution.genes))
    }
}

impl SaProblem for SaPackingProblem<'_> {
    type Solution = SequenceSolution;

    fn initial_solution<R: rand::Rng>(&self, _rng: &mut R) -> Self::Solution {
        let order = self
            .seed
            .clone()
            .unwrap_or_else(|| self.ctx.seed_order());
        SequenceSolution::from_sequence(order, self.ctx.rotation_choices())
    }

    fn neighbor<R: rand::Rng>(
        &self,
        solution: &Self::Solution,
        operator: NeighborhoodOperator,
        rng: &mut R,
    ) -> Self::Solution {
        solution.neighbor(operator, rng)
    }

    fn evaluate(&self, solution: &mut Self::Solution) {
        let outcome = self.ctx.decode(&solution.sequence, &solution.genes);
        solution.set_objective(self.ctx.fitness(&outcome));
    }

    fn available_operators(&self) -> Vec<NeighborhoodOperator> {
        let mut operators = vec![
            NeighborhoodOperator::Swap,
            NeighborhoodOperator::Relocate,
            NeighborhoodOperator::Inversion,
        ];
        if self.ctx.rotation_choices() > 1 {
            operators.push(NeighborhoodOperator::Rotation);
        }
        operators
    }
}

/// Builds the SA configuration from the solver configuration.
pub fn sa_config(config: &Config) -> SaConfig {
    let mut sa = SaConfig::default()
        .with_initial_temp(config.initial_temp)
        .with_final_temp(config.final_temp)
        .with_cooling_rate(config.cooling_rate)
        .with_iterations_per_temp(config.iterations_per_temp)
        .with_max_iterations(config.max_iterations);

    if let Some(limit) = config.time_limit() {
        sa = sa.with_time_limit(limit);
    }
    if let Some(target) = config.target_efficiency {
        sa = sa.with_target_fitness(target);
    }
    sa
}

/// Runs one annealing walk and returns the raw SA result.
///
/// `on_level` receives the completed fraction (0.0 - 1.0) after every
/// temperature level.
pub fn anneal<F>(
    ctx: &PackingContext,
    sa: SaConfig,
    seed: Option<Vec<usize>>,
    config: &Config,
    cancelled: &CancellationToken,
    on_level: F,
) -> SaResult<SequenceSolution>
where
    F: Fn(f64),
{
    let expected_levels = sa.expected_levels() as f64;
    let mut problem = SaPackingProblem::new(ctx);
    if let Some(order) = seed {
        problem = problem.with_seed(order);
    }

    let runner = SaRunner::new(sa, problem).with_cancellation(cancelled.clone());
    let mut rng = make_rng(config);
    runner.run_with_rng_and_progress(
        &mut rng,
        Some(|p: SaProgress| {
            if p.running {
                on_level((p.level as f64 / expected_levels).min(1.0));
            }
        }),
    )
}

/// Runs SA-based cutting-stock optimization.
///
/// Cancellation is observed between temperature levels; a cancelled or
/// timed-out run returns the best candidate found so far, tagged as partial.
pub fn run_sa_packing(
    ctx: &PackingContext,
    config: &Config,
    reporter: &ProgressReporter,
    cancelled: &CancellationToken,
) -> Result<OptimizationResult> {
    reporter.report("annealing", 0.0, "Starting from volume-descending order");

    let sa_result = anneal(ctx, sa_config(config), None, config, cancelled, |fraction| {
        reporter.report(
            "annealing",
            fraction * 100.0,
            format!("Cooling {:.0}%", fraction * 100.0),
        )
    });

    if sa_result.cancelled {
        log::warn!(
            "SA packing cancelled after {} iterations, returning best so far",
            sa_result.iterations
        );
    }

    let mut result = SaPackingProblem::new(ctx).decode(&sa_result.best);
    result.partial = sa_result.is_partial();

    let mut data = AlgorithmData::new("annealing");
    data.iterations = Some(sa_result.iterations);
    data.best_fitness = Some(sa_result.best.objective());
    data.fitness_history = Some(sa_result.history);
    result.algorithm_data = Some(data);

    reporter.report("annealing", 100.0, "Complete");
    Ok(result)
}
