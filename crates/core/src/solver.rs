//! Solver trait, configuration, progress reporting and cancellation.

use crate::ga::SelectionMethod;
use crate::geometry::{Piece, StockBlock};
use crate::result::OptimizationResult;
use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Optimization strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Strategy {
    /// Greedy anchor packing in volume-descending order (fast, deterministic).
    #[default]
    Basic,
    /// Greedy packing restricted to guillotine-feasible layouts.
    Guillotine,
    /// Genetic algorithm over placement order and rotations.
    Genetic,
    /// Simulated annealing over placement order and rotations.
    Annealing,
    /// Greedy, then annealing refinement, then residual fill.
    Hybrid,
    /// Picks one of the above from instance signals.
    Adaptive,
}

impl Strategy {
    /// All strategies.
    pub const ALL: [Strategy; 6] = [
        Strategy::Basic,
        Strategy::Guillotine,
        Strategy::Genetic,
        Strategy::Annealing,
        Strategy::Hybrid,
        Strategy::Adaptive,
    ];

    /// Returns the wire name of the strategy.
    pub fn name(self) -> &'static str {
        match self {
            Strategy::Basic => "basic",
            Strategy::Guillotine => "guillotine",
            Strategy::Genetic => "genetic",
            Strategy::Annealing => "annealing",
            Strategy::Hybrid => "hybrid",
            Strategy::Adaptive => "adaptive",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Strategy::ALL
            .iter()
            .copied()
            .find(|strategy| strategy.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::Configuration(format!("Unknown strategy '{}'", s)))
    }
}

/// Thresholds used by the adaptive strategy selector.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AdaptiveThresholds {
    /// At or below this many instances a problem counts as small.
    pub small_instance_limit: usize,
    /// At or below this many stock instances the stock set counts as few.
    pub small_stock_limit: usize,
    /// Dimension variation at or below which pieces count as uniform.
    pub uniform_variation: f64,
    /// Above this many instances the GA is preferred.
    pub large_instance_limit: usize,
    /// Dimension variation above which the GA is preferred.
    pub high_variation: f64,
    /// At or below this many instances annealing may be chosen.
    pub medium_instance_limit: usize,
    /// Efficiency target in percent that favours annealing for medium problems.
    pub target_efficiency: Option<f64>,
}

impl Default for AdaptiveThresholds {
    fn default() -> Self {
        Self {
            small_instance_limit: 20,
            small_stock_limit: 3,
            uniform_variation: 0.25,
            large_instance_limit: 150,
            high_variation: 0.75,
            medium_instance_limit: 80,
            target_efficiency: None,
        }
    }
}

/// Common configuration for solvers.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Optimization strategy.
    pub strategy: Strategy,

    /// Whether pieces may be rotated (per-piece `rotatable` still applies).
    pub allow_rotation: bool,

    /// Decode metaheuristic candidates with the guillotine planner.
    pub guillotine: bool,

    /// RNG seed for reproducible metaheuristic runs (None = entropy).
    pub seed: Option<u64>,

    /// Maximum computation time in milliseconds (0 = unlimited).
    pub time_limit_ms: u64,

    /// Target efficiency in percent. Metaheuristics stop once reached.
    pub target_efficiency: Option<f64>,

    /// Weight of the unplaced-volume percentage subtracted from efficiency.
    pub unplaced_penalty: f64,

    // GA-specific parameters
    /// Population size for GA.
    pub population_size: usize,

    /// Number of generations for GA.
    pub max_generations: u32,

    /// Crossover rate for GA (0.0 - 1.0).
    pub crossover_rate: f64,

    /// Mutation rate for GA (0.0 - 1.0).
    pub mutation_rate: f64,

    /// Elite count for GA.
    pub elite_count: usize,

    /// Parent selection method for GA.
    pub selection: SelectionMethod,

    /// Tournament size when tournament selection is used.
    pub tournament_size: usize,

    /// Generations without improvement before the GA stops (None = never).
    pub stagnation_limit: Option<u32>,

    // SA-specific parameters
    /// Initial temperature for SA.
    pub initial_temp: f64,

    /// Final temperature for SA.
    pub final_temp: f64,

    /// Geometric cooling factor for SA.
    pub cooling_rate: f64,

    /// Iterations per temperature level for SA.
    pub iterations_per_temp: usize,

    /// Iteration budget for SA.
    pub max_iterations: u64,

    // Hybrid parameters
    /// Fraction of the SA iteration budget spent in hybrid stage 2.
    pub hybrid_refine_fraction: f64,

    /// Fill residual space with extra units of the smallest piece type.
    pub fill_residual_with_surplus: bool,

    /// Maximum number of surplus units added per run.
    pub residual_fill_limit: usize,

    /// Thresholds for the adaptive selector.
    pub adaptive: AdaptiveThresholds,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            allow_rotation: true,
            guillotine: false,
            seed: None,
            time_limit_ms: 30000,
            target_efficiency: None,
            unplaced_penalty: 1.0,
            population_size: 50,
            max_generations: 100,
            crossover_rate: 0.85,
            mutation_rate: 0.15,
            elite_count: 2,
            selection: SelectionMethod::default(),
            tournament_size: 3,
            stagnation_limit: Some(30),
            initial_temp: 10.0,
            final_temp: 0.01,
            cooling_rate: 0.95,
            iterations_per_temp: 50,
            max_iterations: 5000,
            hybrid_refine_fraction: 0.25,
            fill_residual_with_surplus: true,
            residual_fill_limit: 1000,
            adaptive: AdaptiveThresholds::default(),
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the optimization strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Enables or disables rotation.
    pub fn with_rotation(mut self, allow: bool) -> Self {
        self.allow_rotation = allow;
        self
    }

    /// Decodes metaheuristic candidates with the guillotine planner.
    pub fn with_guillotine(mut self, guillotine: bool) -> Self {
        self.guillotine = guillotine;
        self
    }

    /// Sets the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the time limit in milliseconds.
    pub fn with_time_limit(mut self, ms: u64) -> Self {
        self.time_limit_ms = ms;
        self
    }

    /// Sets the target efficiency in percent.
    pub fn with_target_efficiency(mut self, efficiency: f64) -> Self {
        self.target_efficiency = Some(efficiency.clamp(0.0, 100.0));
        self
    }

    /// Sets the unplaced-volume penalty weight.
    pub fn with_unplaced_penalty(mut self, penalty: f64) -> Self {
        self.unplaced_penalty = penalty.max(0.0);
        self
    }

    /// Sets the GA population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size.max(2);
        self
    }

    /// Sets the GA generation budget.
    pub fn with_max_generations(mut self, generations: u32) -> Self {
        self.max_generations = generations;
        self
    }

    /// Sets the GA selection method.
    pub fn with_selection(mut self, selection: SelectionMethod) -> Self {
        self.selection = selection;
        self
    }

    /// Sets the GA stagnation limit.
    pub fn with_stagnation_limit(mut self, limit: Option<u32>) -> Self {
        self.stagnation_limit = limit;
        self
    }

    /// Sets the SA iteration budget.
    pub fn with_max_iterations(mut self, iterations: u64) -> Self {
        self.max_iterations = iterations;
        self
    }

    /// Sets the SA temperature range.
    pub fn with_temperatures(mut self, initial: f64, final_temp: f64) -> Self {
        self.initial_temp = initial;
        self.final_temp = final_temp;
        self
    }

    /// Enables or disables the surplus residual fill.
    pub fn with_residual_fill(mut self, enabled: bool, limit: usize) -> Self {
        self.fill_residual_with_surplus = enabled;
        self.residual_fill_limit = limit;
        self
    }

    /// Sets the adaptive thresholds.
    pub fn with_adaptive_thresholds(mut self, thresholds: AdaptiveThresholds) -> Self {
        self.adaptive = thresholds;
        self
    }

    /// Returns the time limit, if any.
    pub fn time_limit(&self) -> Option<Duration> {
        (self.time_limit_ms > 0).then(|| Duration::from_millis(self.time_limit_ms))
    }

    /// Checks numeric parameters.
    pub fn validate(&self) -> Result<()> {
        let rate_ok = |r: f64| (0.0..=1.0).contains(&r);

        if self.population_size < 2 {
            return Err(Error::Configuration(
                "population_size must be at least 2".into(),
            ));
        }
        if !rate_ok(self.crossover_rate) || !rate_ok(self.mutation_rate) {
            return Err(Error::Configuration(
                "crossover_rate and mutation_rate must be within [0, 1]".into(),
            ));
        }
        if self.tournament_size == 0 || self.iterations_per_temp == 0 {
            return Err(Error::Configuration(
                "tournament_size and iterations_per_temp must be positive".into(),
            ));
        }
        if !(self.cooling_rate > 0.0 && self.cooling_rate < 1.0) {
            return Err(Error::Configuration(
                "cooling_rate must be within (0, 1)".into(),
            ));
        }
        if !(self.initial_temp > self.final_temp && self.final_temp > 0.0) {
            return Err(Error::Configuration(
                "initial_temp must exceed final_temp, and both must be positive".into(),
            ));
        }
        if !(self.hybrid_refine_fraction > 0.0 && self.hybrid_refine_fraction <= 1.0) {
            return Err(Error::Configuration(
                "hybrid_refine_fraction must be within (0, 1]".into(),
            ));
        }
        if !self.unplaced_penalty.is_finite() || self.unplaced_penalty < 0.0 {
            return Err(Error::Configuration(
                "unplaced_penalty cannot be negative".into(),
            ));
        }

        Ok(())
    }
}

/// Progress information during solving.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProgressInfo {
    /// Strategy reporting progress.
    pub algorithm: String,
    /// Completion in percent (0 - 100).
    pub progress: f64,
    /// Human-readable stage description.
    pub stage: String,
}

/// Progress callback for long-running operations.
pub type ProgressCallback = Arc<dyn Fn(ProgressInfo) + Send + Sync>;

#[derive(Clone, Default)]
enum Sink {
    #[default]
    Silent,
    Channel(Sender<ProgressInfo>),
    Callback(ProgressCallback),
}

/// Delivers [`ProgressInfo`] to a channel or an observer callback.
///
/// Reporting never blocks and never fails; a disconnected receiver is ignored.
#[derive(Clone, Default)]
pub struct ProgressReporter {
    sink: Sink,
}

impl ProgressReporter {
    /// A reporter that discards all updates.
    pub fn silent() -> Self {
        Self::default()
    }

    /// Sends updates into a channel.
    pub fn channel(sender: Sender<ProgressInfo>) -> Self {
        Self {
            sink: Sink::Channel(sender),
        }
    }

    /// Calls `f` with every update.
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(ProgressInfo) + Send + Sync + 'static,
    {
        Self {
            sink: Sink::Callback(Arc::new(f)),
        }
    }

    /// Returns true if updates are discarded.
    pub fn is_silent(&self) -> bool {
        matches!(self.sink, Sink::Silent)
    }

    /// Reports an update.
    pub fn report(&self, algorithm: &str, progress: f64, stage: impl Into<String>) {
        if self.is_silent() {
            return;
        }

        let info = ProgressInfo {
            algorithm: algorithm.to_string(),
            progress: progress.clamp(0.0, 100.0),
            stage: stage.into(),
        };

        match &self.sink {
            Sink::Silent => {}
            Sink::Channel(tx) => {
                // The receiver may be dropped before the run ends.
                if tx.send(info).is_err() {
                    log::trace!("progress receiver gone, dropping {} update", algorithm);
                }
            }
            Sink::Callback(f) => f(info),
        }
    }
}

impl fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.sink {
            Sink::Silent => "silent",
            Sink::Channel(_) => "channel",
            Sink::Callback(_) => "callback",
        };
        f.debug_struct("ProgressReporter").field("sink", &kind).finish()
    }
}

/// Shared cancellation flag, observed at loop boundaries.
///
/// Once cancelled a token stays cancelled; create a new one per run.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns true once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Trait for cutting-stock solvers.
pub trait Solver {
    /// Solves the cutting-stock problem.
    fn solve(&self, pieces: &[Piece], stocks: &[StockBlock]) -> Result<OptimizationResult>;

    /// Solves while reporting progress.
    fn solve_with_progress(
        &self,
        pieces: &[Piece],
        stocks: &[StockBlock],
        reporter: &ProgressReporter,
    ) -> Result<OptimizationResult>;

    /// Cancels an ongoing solve operation.
    fn cancel(&self);
}
