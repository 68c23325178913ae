//! Simulated annealing over sequence-plus-gene solutions.
//!
//! The runner walks one candidate through a neighborhood, always taking
//! improving moves and taking a worsening move of size `Δ` with probability
//! `exp(Δ / T)`. The temperature falls geometrically after every level of
//! `iterations_per_temp` moves. The best candidate ever seen is returned.

use crate::solver::CancellationToken;
use rand::prelude::*;
use std::time::{Duration, Instant};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Annealing schedule and stopping rules.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SaConfig {
    /// Starting temperature.
    pub initial_temp: f64,
    /// The walk ends once the temperature is at or below this value.
    pub final_temp: f64,
    /// Geometric factor applied after each level.
    pub cooling_rate: f64,
    /// Moves tried per temperature level.
    pub iterations_per_temp: usize,
    /// Total move budget (None = until cooled).
    pub max_iterations: Option<u64>,
    /// Wall-clock budget (None = unlimited).
    pub time_limit: Option<Duration>,
    /// Objective at which the walk stops early.
    pub target_fitness: Option<f64>,
}

impl Default for SaConfig {
    fn default() -> Self {
        Self {
            initial_temp: 10.0,
            final_temp: 0.01,
            cooling_rate: 0.95,
            iterations_per_temp: 50,
            max_iterations: Some(5000),
            time_limit: None,
            target_fitness: None,
        }
    }
}

impl SaConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the starting temperature (at least 1e-3).
    pub fn with_initial_temp(mut self, temp: f64) -> Self {
        self.initial_temp = temp.max(1e-3);
        self
    }

    /// Sets the stopping temperature (at least 1e-4).
    pub fn with_final_temp(mut self, temp: f64) -> Self {
        self.final_temp = temp.max(1e-4);
        self
    }

    /// Sets the cooling factor, kept strictly inside (0, 1).
    pub fn with_cooling_rate(mut self, rate: f64) -> Self {
        self.cooling_rate = rate.clamp(1e-3, 0.9999);
        self
    }

    /// Sets the moves per level (at least 1).
    pub fn with_iterations_per_temp(mut self, iterations: usize) -> Self {
        self.iterations_per_temp = iterations.max(1);
        self
    }

    /// Sets the total move budget.
    pub fn with_max_iterations(mut self, iterations: u64) -> Self {
        self.max_iterations = Some(iterations);
        self
    }

    /// Sets the wall-clock budget.
    pub fn with_time_limit(mut self, duration: Duration) -> Self {
        self.time_limit = Some(duration);
        self
    }

    /// Sets the objective at which the walk stops.
    pub fn with_target_fitness(mut self, fitness: f64) -> Self {
        self.target_fitness = Some(fitness);
        self
    }

    /// Number of temperature levels the walk runs unless stopped early.
    ///
    /// The smaller of the level count allowed by the move budget and the
    /// count needed to cool from `initial_temp` to `final_temp`.
    pub fn expected_levels(&self) -> u64 {
        let per_level = self.iterations_per_temp.max(1) as u64;
        let cooling_levels = if self.initial_temp <= self.final_temp {
            0
        } else {
            ((self.final_temp / self.initial_temp).ln() / self.cooling_rate.ln()).ceil() as u64
        };

        let levels = match self.max_iterations {
            Some(max) => cooling_levels.min(max.div_ceil(per_level)),
            None => cooling_levels,
        };
        levels.max(1)
    }
}

/// A candidate with a cached objective (higher is better).
pub trait SaSolution: Clone + Send + Sync {
    /// Cached objective, higher is better.
    fn objective(&self) -> f64;

    /// Stores the objective computed by [`SaProblem::evaluate`].
    fn set_objective(&mut self, value: f64);
}

/// Moves available to the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborhoodOperator {
    /// Exchange two sequence positions.
    Swap,
    /// Take one element out and reinsert it elsewhere.
    Relocate,
    /// Reverse a sequence segment.
    Inversion,
    /// Redraw the gene of one element.
    Rotation,
}

/// Problem-specific pieces of an annealing walk.
pub trait SaProblem: Send + Sync {
    type Solution: SaSolution;

    /// Starting point of the walk.
    fn initial_solution<R: Rng>(&self, rng: &mut R) -> Self::Solution;

    /// Applies `operator` to a copy of `solution`.
    fn neighbor<R: Rng>(
        &self,
        solution: &Self::Solution,
        operator: NeighborhoodOperator,
        rng: &mut R,
    ) -> Self::Solution;

    /// Computes and stores the objective of `solution`.
    fn evaluate(&self, solution: &mut Self::Solution);

    /// Operators drawn uniformly at every move.
    fn available_operators(&self) -> Vec<NeighborhoodOperator> {
        vec![
            NeighborhoodOperator::Swap,
            NeighborhoodOperator::Relocate,
            NeighborhoodOperator::Inversion,
        ]
    }
}

/// Snapshot sent after every temperature level and once at the end.
#[derive(Debug, Clone)]
pub struct SaProgress {
    /// Temperature the finished level ran at.
    pub temperature: f64,
    /// Levels completed so far.
    pub level: u64,
    /// Moves tried so far.
    pub iteration: u64,
    /// Best objective seen so far.
    pub best_fitness: f64,
    /// Objective of the walk's current candidate.
    pub current_fitness: f64,
    /// Share of accepted moves in the finished level.
    pub acceptance_rate: f64,
    /// Time since the walk started.
    pub elapsed: Duration,
    /// False for the final snapshot.
    pub running: bool,
}

/// Outcome of an annealing walk.
#[derive(Debug, Clone)]
pub struct SaResult<S: SaSolution> {
    /// Best candidate ever seen.
    pub best: S,
    /// Temperature when the walk ended.
    pub final_temperature: f64,
    /// Moves tried.
    pub iterations: u64,
    /// Total run time.
    pub elapsed: Duration,
    /// Best objective reached `target_fitness`.
    pub target_reached: bool,
    /// Stopped by the cancellation token.
    pub cancelled: bool,
    /// Stopped by the time limit.
    pub timed_out: bool,
    /// Best objective after each level, then once more at the end.
    pub history: Vec<f64>,
}

impl<S: SaSolution> SaResult<S> {
    /// True when the walk ended on cancellation or the time limit.
    pub fn is_partial(&self) -> bool {
        self.cancelled || self.timed_out
    }
}

/// Why a walk ended before cooling down.
enum Halt {
    Cancelled,
    TimedOut,
    Budget,
    Target,
}

/// Mutable state of one walk.
struct Walk<S> {
    current: S,
    best: S,
    iteration: u64,
}

impl<S: SaSolution> Walk<S> {
    fn offer(&mut self, candidate: S, temperature: f64, roll: f64) -> bool {
        let delta = candidate.objective() - self.current.objective();
        if delta < 0.0 && roll >= (delta / temperature).exp() {
            return false;
        }

        if candidate.objective() > self.best.objective() {
            self.best = candidate.clone();
        }
        self.current = candidate;
        true
    }
}

/// Runs annealing walks for one problem.
pub struct SaRunner<P: SaProblem> {
    config: SaConfig,
    problem: P,
    cancelled: CancellationToken,
}

impl<P: SaProblem> SaRunner<P> {
    /// Creates a runner with its own cancellation token.
    pub fn new(config: SaConfig, problem: P) -> Self {
        Self {
            config,
            problem,
            cancelled: CancellationToken::new(),
        }
    }

    /// Observes an externally owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancelled = token;
        self
    }

    /// Token that stops the walk at the next level boundary.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancelled.clone()
    }

    /// The problem being annealed.
    pub fn problem(&self) -> &P {
        &self.problem
    }

    /// Runs with an entropy-seeded RNG.
    pub fn run(&self) -> SaResult<P::Solution> {
        self.run_with_rng(&mut thread_rng())
    }

    /// Runs with the given RNG and no progress callback.
    pub fn run_with_rng<R: Rng>(&self, rng: &mut R) -> SaResult<P::Solution> {
        self.run_with_rng_and_progress::<R, fn(SaProgress)>(rng, None)
    }

    /// Runs with an optional per-level progress callback.
    ///
    /// Stop conditions are checked between levels only, so a level that
    /// has started always completes unless the move budget runs out.
    pub fn run_with_rng_and_progress<R: Rng, F>(
        &self,
        rng: &mut R,
        on_level: Option<F>,
    ) -> SaResult<P::Solution>
    where
        F: Fn(SaProgress),
    {
        let start = Instant::now();
        let operators = self.problem.available_operators();

        let mut first = self.problem.initial_solution(rng);
        self.problem.evaluate(&mut first);
        let mut walk = Walk {
            best: first.clone(),
            current: first,
            iteration: 0,
        };

        let mut temperature = self.config.initial_temp;
        let mut level = 0u64;
        let mut history = Vec::new();
        let mut halt = None;

        while temperature > self.config.final_temp && !operators.is_empty() {
            halt = self.halt_reason(&walk, start);
            if halt.is_some() {
                break;
            }

            let accepted = self.run_level(&mut walk, &operators, temperature, rng);
            level += 1;
            history.push(walk.best.objective());
            log::debug!(
                "SA level {}: temp={:.4}, best={:.4}, accepted={}",
                level,
                temperature,
                walk.best.objective(),
                accepted
            );

            if let Some(callback) = &on_level {
                callback(SaProgress {
                    temperature,
                    level,
                    iteration: walk.iteration,
                    best_fitness: walk.best.objective(),
                    current_fitness: walk.current.objective(),
                    acceptance_rate: accepted as f64 / self.config.iterations_per_temp as f64,
                    elapsed: start.elapsed(),
                    running: true,
                });
            }

            temperature *= self.config.cooling_rate;
        }
        let target_reached = matches!(halt, Some(Halt::Target))
            || self
                .config
                .target_fitness
                .is_some_and(|target| walk.best.objective() >= target);

        history.push(walk.best.objective());
        if let Some(callback) = &on_level {
            callback(SaProgress {
                temperature,
                level,
                iteration: walk.iteration,
                best_fitness: walk.best.objective(),
                current_fitness: walk.current.objective(),
                acceptance_rate: 0.0,
                elapsed: start.elapsed(),
                running: false,
            });
        }

        SaResult {
            best: walk.best,
            final_temperature: temperature,
            iterations: walk.iteration,
            elapsed: start.elapsed(),
            target_reached,
            cancelled: matches!(halt, Some(Halt::Cancelled)),
            timed_out: matches!(halt, Some(Halt::TimedOut)),
            history,
        }
    }

    fn halt_reason(&self, walk: &Walk<P::Solution>, start: Instant) -> Option<Halt> {
        if self.cancelled.is_cancelled() {
            return Some(Halt::Cancelled);
        }
        if self.config.time_limit.is_some_and(|limit| start.elapsed() > limit) {
            return Some(Halt::TimedOut);
        }
        if self
            .config
            .max_iterations
            .is_some_and(|max| walk.iteration >= max)
        {
            return Some(Halt::Budget);
        }
        if self
            .config
            .target_fitness
            .is_some_and(|target| walk.best.objective() >= target)
        {
            return Some(Halt::Target);
        }
        None
    }

    /// Tries up to `iterations_per_temp` moves and returns how many were accepted.
    fn run_level<R: Rng>(
        &self,
        walk: &mut Walk<P::Solution>,
        operators: &[NeighborhoodOperator],
        temperature: f64,
        rng: &mut R,
    ) -> usize {
        let budget = self.config.max_iterations.unwrap_or(u64::MAX);
        let mut accepted = 0;

        for _ in 0..self.config.iterations_per_temp {
            if walk.iteration >= budget {
                break;
            }
            walk.iteration += 1;

            let operator = operators[rng.gen_range(0..operators.len())];
            let mut candidate = self.problem.neighbor(&walk.current, operator, rng);
            self.problem.evaluate(&mut candidate);

            if walk.offer(candidate, temperature, rng.gen::<f64>()) {
                accepted += 1;
            }
        }
        accepted
    }
}

/// An element order plus one gene per element.
///
/// `genes` is indexed by element id, not by sequence position, so moving an
/// element keeps its gene.
#[derive(Debug, Clone)]
pub struct SequenceSolution {
    /// Element ids in visiting order.
    pub sequence: Vec<usize>,
    /// Gene of each element id.
    pub genes: Vec<usize>,
    /// Genes are drawn from `0..gene_options`.
    pub gene_options: usize,
    objective: f64,
}

impl SequenceSolution {
    /// The given order with every gene 0.
    pub fn from_sequence(sequence: Vec<usize>, gene_options: usize) -> Self {
        Self {
            genes: vec![0; sequence.len()],
            sequence,
            gene_options,
            objective: f64::NEG_INFINITY,
        }
    }

    /// A shuffled order with random genes.
    pub fn random<R: Rng>(size: usize, gene_options: usize, rng: &mut R) -> Self {
        let mut solution = Self::from_sequence((0..size).collect(), gene_options);
        solution.sequence.shuffle(rng);
        for gene in &mut solution.genes {
            *gene = rng.gen_range(0..gene_options.max(1));
        }
        solution
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// True when there are no elements.
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Returns a copy moved by `operator`, with the objective cleared.
    ///
    /// Sequences shorter than two and single-option genes are left as they are.
    pub fn neighbor<R: Rng>(&self, operator: NeighborhoodOperator, rng: &mut R) -> Self {
        let mut next = self.clone();
        next.objective = f64::NEG_INFINITY;
        let n = next.sequence.len();

        match operator {
            NeighborhoodOperator::Swap if n >= 2 => {
                next.sequence.swap(rng.gen_range(0..n), rng.gen_range(0..n));
            }
            NeighborhoodOperator::Relocate if n >= 2 => {
                let element = next.sequence.remove(rng.gen_range(0..n));
                next.sequence.insert(rng.gen_range(0..n), element);
            }
            NeighborhoodOperator::Inversion if n >= 2 => {
                let (a, b) = (rng.gen_range(0..n), rng.gen_range(0..n));
                next.sequence[a.min(b)..=a.max(b)].reverse();
            }
            NeighborhoodOperator::Rotation if n > 0 && next.gene_options > 1 => {
                let element = rng.gen_range(0..next.genes.len());
                next.genes[element] = rng.gen_range(0..next.gene_options);
            }
            _ => {}
        }
        next
    }
}

impl SaSolution for SequenceSolution {
    fn objective(&self) -> f64 {
        self.objective
    }

    fn set_objective(&mut self, value: f64) {
        self.objective = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;

    /// Maximizes sortedness: objective is minus the number of inversions.
    struct Sorting {
        size: usize,
    }

    impl SaProblem for Sorting {
        type Solution = SequenceSolution;

        fn initial_solution<R: Rng>(&self, rng: &mut R) -> SequenceSolution {
            SequenceSolution::random(self.size, 1, rng)
        }

        fn neighbor<R: Rng>(
            &self,
            solution: &SequenceSolution,
            operator: NeighborhoodOperator,
            rng: &mut R,
        ) -> SequenceSolution {
            solution.neighbor(operator, rng)
        }

        fn evaluate(&self, solution: &mut SequenceSolution) {
            let s = &solution.sequence;
            let inversions = (0..s.len())
                .flat_map(|i| (i + 1..s.len()).map(move |j| (i, j)))
                .filter(|&(i, j)| s[i] > s[j])
                .count();
            solution.set_objective(-(inversions as f64));
        }
    }

    #[test]
    fn test_walk_improves_sortedness() {
        let config = SaConfig::default()
            .with_initial_temp(100.0)
            .with_final_temp(0.1)
            .with_cooling_rate(0.9)
            .with_max_iterations(5000);

        let result =
            SaRunner::new(config, Sorting { size: 10 }).run_with_rng(&mut StdRng::seed_from_u64(11));

        assert!(result.best.objective() > -20.0);
        assert!(result.iterations > 0);
        assert!(!result.is_partial());
    }

    #[test]
    fn test_max_iterations_respected() {
        let config = SaConfig::default()
            .with_iterations_per_temp(30)
            .with_max_iterations(100);
        let result =
            SaRunner::new(config, Sorting { size: 6 }).run_with_rng(&mut StdRng::seed_from_u64(2));
        assert_eq!(result.iterations, 100);
    }

    #[test]
    fn test_history_is_non_decreasing() {
        let result = SaRunner::new(SaConfig::default(), Sorting { size: 8 })
            .run_with_rng(&mut StdRng::seed_from_u64(4));
        assert!(result.history.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn test_target_stops_walk() {
        let config = SaConfig::default().with_target_fitness(f64::NEG_INFINITY);
        let result =
            SaRunner::new(config, Sorting { size: 8 }).run_with_rng(&mut StdRng::seed_from_u64(4));
        assert!(result.target_reached);
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn test_cancelled_before_start() {
        let runner = SaRunner::new(SaConfig::default(), Sorting { size: 8 });
        runner.cancel_handle().cancel();

        let result = runner.run_with_rng(&mut StdRng::seed_from_u64(4));
        assert!(result.cancelled);
        assert!(result.is_partial());
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn test_progress_once_per_level() {
        use std::cell::Cell;

        let config = SaConfig::default()
            .with_iterations_per_temp(10)
            .with_max_iterations(35);
        let calls = Cell::new(0u64);
        let result = SaRunner::new(config, Sorting { size: 5 }).run_with_rng_and_progress(
            &mut StdRng::seed_from_u64(1),
            Some(|p: SaProgress| {
                if p.running {
                    calls.set(calls.get() + 1);
                }
            }),
        );

        assert_eq!(calls.get(), 4);
        assert_eq!(result.iterations, 35);
    }

    #[test]
    fn test_expected_levels() {
        let config = SaConfig::default()
            .with_iterations_per_temp(50)
            .with_max_iterations(1000);
        assert_eq!(config.expected_levels(), 20);

        let config = SaConfig::default()
            .with_initial_temp(1.0)
            .with_final_temp(0.5)
            .with_cooling_rate(0.5)
            .with_max_iterations(1_000_000);
        assert_eq!(config.expected_levels(), 1);
    }

    #[test]
    fn test_neighbors_keep_permutation() {
        let mut rng = StdRng::seed_from_u64(8);
        let solution = SequenceSolution::random(10, 6, &mut rng);

        for operator in [
            NeighborhoodOperator::Swap,
            NeighborhoodOperator::Relocate,
            NeighborhoodOperator::Inversion,
            NeighborhoodOperator::Rotation,
        ] {
            let next = solution.neighbor(operator, &mut rng);
            let mut sorted = next.sequence.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, (0..10).collect::<Vec<_>>());
            assert!(next.genes.iter().all(|&g| g < 6));
            assert_eq!(next.objective(), f64::NEG_INFINITY);
        }
    }

    #[test]
    fn test_rotation_moves_gene_with_element() {
        let mut rng = StdRng::seed_from_u64(3);
        let solution = SequenceSolution::from_sequence(vec![2, 0, 1], 1);
        let next = solution.neighbor(NeighborhoodOperator::Rotation, &mut rng);
        assert_eq!(next.genes, vec![0, 0, 0]);
        assert_eq!(next.sequence, vec![2, 0, 1]);
    }
}
