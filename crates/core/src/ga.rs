//! Genetic Algorithm framework for optimization.
//!
//! Problem-specific code implements [`Individual`] (crossover and mutation live
//! on the individual) and [`GaProblem`] (evaluation and seeding). [`GaRunner`]
//! drives the generational loop with elitism, rank or tournament selection and
//! stagnation-based early stopping.

use crate::solver::CancellationToken;
use rand::prelude::*;
use rayon::prelude::*;
use std::time::{Duration, Instant};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parent selection method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SelectionMethod {
    /// Linear rank selection: the i-th best of n is drawn with weight n - i.
    #[default]
    Rank,
    /// Tournament selection over `tournament_size` random contestants.
    Tournament,
}

/// Configuration for the genetic algorithm.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GaConfig {
    /// Population size.
    pub population_size: usize,
    /// Maximum number of generations.
    pub max_generations: u32,
    /// Crossover rate (0.0 - 1.0).
    pub crossover_rate: f64,
    /// Mutation rate (0.0 - 1.0).
    pub mutation_rate: f64,
    /// Number of elite individuals to preserve each generation.
    pub elite_count: usize,
    /// Parent selection method.
    pub selection: SelectionMethod,
    /// Tournament size for tournament selection.
    pub tournament_size: usize,
    /// Maximum time limit (None = unlimited).
    pub time_limit: Option<Duration>,
    /// Target fitness to stop early (None = run all generations).
    pub target_fitness: Option<f64>,
    /// Stagnation generations before early stop.
    pub stagnation_limit: Option<u32>,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            max_generations: 100,
            crossover_rate: 0.85,
            mutation_rate: 0.15,
            elite_count: 2,
            selection: SelectionMethod::Rank,
            tournament_size: 3,
            time_limit: None,
            target_fitness: None,
            stagnation_limit: Some(30),
        }
    }
}

impl GaConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size.max(2);
        self
    }

    /// Sets the maximum generations.
    pub fn with_max_generations(mut self, gen: u32) -> Self {
        self.max_generations = gen;
        self
    }

    /// Sets the crossover rate.
    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the mutation rate.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the elite count.
    pub fn with_elite_count(mut self, count: usize) -> Self {
        self.elite_count = count;
        self
    }

    /// Sets the selection method.
    pub fn with_selection(mut self, selection: SelectionMethod, tournament_size: usize) -> Self {
        self.selection = selection;
        self.tournament_size = tournament_size.max(1);
        self
    }

    /// Sets the time limit.
    pub fn with_time_limit(mut self, duration: Duration) -> Self {
        self.time_limit = Some(duration);
        self
    }

    /// Sets the target fitness.
    pub fn with_target_fitness(mut self, fitness: f64) -> Self {
        self.target_fitness = Some(fitness);
        self
    }

    /// Sets the stagnation limit.
    pub fn with_stagnation_limit(mut self, limit: Option<u32>) -> Self {
        self.stagnation_limit = limit;
        self
    }
}

/// Trait for individuals in the genetic algorithm.
pub trait Individual: Clone + Send + Sync {
    /// Returns the fitness of this individual (higher is better).
    fn fitness(&self) -> f64;

    /// Performs crossover with another individual.
    fn crossover<R: Rng>(&self, other: &Self, rng: &mut R) -> Self;

    /// Mutates this individual in place.
    fn mutate<R: Rng>(&mut self, rng: &mut R);
}

/// Trait for problem-specific GA operations.
pub trait GaProblem: Send + Sync {
    /// The individual type for this problem.
    type Individual: Individual;

    /// Evaluates the fitness of an individual.
    fn evaluate(&self, individual: &mut Self::Individual);

    /// Evaluates multiple individuals in parallel.
    /// Default implementation uses rayon for parallel evaluation.
    fn evaluate_parallel(&self, individuals: &mut [Self::Individual]) {
        individuals.par_iter_mut().for_each(|ind| {
            self.evaluate(ind);
        });
    }

    /// Creates the initial population.
    fn initialize_population<R: Rng>(&self, size: usize, rng: &mut R) -> Vec<Self::Individual>;

    /// Called after each generation (for progress reporting).
    fn on_generation(
        &self,
        _generation: u32,
        _best: &Self::Individual,
        _population: &[Self::Individual],
    ) {
    }
}

/// Progress information during GA execution.
#[derive(Debug, Clone)]
pub struct GaProgress {
    /// Current generation number.
    pub generation: u32,
    /// Maximum generations configured.
    pub max_generations: u32,
    /// Best fitness so far.
    pub best_fitness: f64,
    /// Average fitness of current population.
    pub avg_fitness: f64,
    /// Elapsed time since start.
    pub elapsed: Duration,
    /// Whether the algorithm is still running.
    pub running: bool,
}

/// Result of a GA run.
#[derive(Debug, Clone)]
pub struct GaResult<I: Individual> {
    /// The best individual found.
    pub best: I,
    /// Final generation reached.
    pub generations: u32,
    /// Total elapsed time.
    pub elapsed: Duration,
    /// Whether the target fitness was reached.
    pub target_reached: bool,
    /// Whether the run stopped on cancellation.
    pub cancelled: bool,
    /// Whether the run stopped on the time limit.
    pub timed_out: bool,
    /// Fitness history (best fitness per generation).
    pub history: Vec<f64>,
}

/// Genetic algorithm runner.
pub struct GaRunner<P: GaProblem> {
    config: GaConfig,
    problem: P,
    cancelled: CancellationToken,
}

fn sort_descending<I: Individual>(population: &mut [I]) {
    population.sort_by(|a, b| {
        b.fitness()
            .partial_cmp(&a.fitness())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

fn average_fitness<I: Individual>(population: &[I]) -> f64 {
    population.iter().map(Individual::fitness).sum::<f64>() / population.len().max(1) as f64
}

impl<P: GaProblem> GaRunner<P> {
    /// Creates a new GA runner.
    pub fn new(config: GaConfig, problem: P) -> Self {
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

    /// Returns a handle to cancel the algorithm.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancelled.clone()
    }

    /// Returns the problem definition.
    pub fn problem(&self) -> &P {
        &self.problem
    }

    /// Runs the genetic algorithm.
    pub fn run(&self) -> Option<GaResult<P::Individual>> {
        self.run_with_rng(&mut thread_rng())
    }

    /// Runs the genetic algorithm with a specific RNG.
    pub fn run_with_rng<R: Rng>(&self, rng: &mut R) -> Option<GaResult<P::Individual>> {
        self.run_with_rng_and_progress::<R, fn(GaProgress)>(rng, None)
    }

    /// Runs the genetic algorithm with a specific RNG and optional progress callback.
    ///
    /// Returns `None` only when the problem produces an empty initial population.
    pub fn run_with_rng_and_progress<R: Rng, F>(
        &self,
        rng: &mut R,
        progress_callback: Option<F>,
    ) -> Option<GaResult<P::Individual>>
    where
        F: Fn(GaProgress),
    {
        let start = Instant::now();
        let mut history = Vec::new();
        let population_size = self.config.population_size.max(1);

        let mut population = self.problem.initialize_population(population_size, rng);
        self.problem.evaluate_parallel(&mut population);
        sort_descending(&mut population);

        let mut best = population.first()?.clone();
        let mut best_fitness = best.fitness();
        let mut stagnation_count = 0u32;
        let mut generation = 0u32;
        let mut target_reached = false;
        let mut cancelled = false;
        let mut timed_out = false;

        while generation < self.config.max_generations {
            if self.cancelled.is_cancelled() {
                cancelled = true;
                break;
            }

            if let Some(limit) = self.config.time_limit {
                if start.elapsed() > limit {
                    timed_out = true;
                    break;
                }
            }

            if let Some(target) = self.config.target_fitness {
                if best_fitness >= target {
                    target_reached = true;
                    break;
                }
            }

            history.push(best_fitness);

            let elite = self.config.elite_count.min(population.len());
            let mut new_population: Vec<P::Individual> =
                population.iter().take(elite).cloned().collect();

            let child_count = population_size.saturating_sub(new_population.len());
            let mut children: Vec<P::Individual> = Vec::with_capacity(child_count);

            while children.len() < child_count {
                let parent1 = self.select(&population, rng);
                let parent2 = self.select(&population, rng);

                let mut child = if rng.gen::<f64>() < self.config.crossover_rate {
                    parent1.crossover(parent2, rng)
                } else {
                    parent1.clone()
                };

                if rng.gen::<f64>() < self.config.mutation_rate {
                    child.mutate(rng);
                }

                children.push(child);
            }

            self.problem.evaluate_parallel(&mut children);
            new_population.extend(children);
            sort_descending(&mut new_population);

            if let Some(leader) = new_population.first() {
                if leader.fitness() > best_fitness {
                    best = leader.clone();
                    best_fitness = leader.fitness();
                    stagnation_count = 0;
                } else {
                    stagnation_count += 1;
                }
            }

            self.problem.on_generation(generation, &best, &new_population);

            if let Some(ref callback) = progress_callback {
                callback(GaProgress {
                    generation,
                    max_generations: self.config.max_generations,
                    best_fitness,
                    avg_fitness: average_fitness(&new_population),
                    elapsed: start.elapsed(),
                    running: true,
                });
            }

            population = new_population;
            generation += 1;

            if let Some(limit) = self.config.stagnation_limit {
                if stagnation_count >= limit {
                    break;
                }
            }
        }

        history.push(best_fitness);

        if let Some(ref callback) = progress_callback {
            callback(GaProgress {
                generation,
                max_generations: self.config.max_generations,
                best_fitness,
                avg_fitness: average_fitness(&population),
                elapsed: start.elapsed(),
                running: false,
            });
        }

        Some(GaResult {
            best,
            generations: generation,
            elapsed: start.elapsed(),
            target_reached,
            cancelled,
            timed_out,
            history,
        })
    }

    fn select<'a, R: Rng>(&self, population: &'a [P::Individual], rng: &mut R) -> &'a P::Individual {
        match self.config.selection {
            SelectionMethod::Rank => Self::rank_select(population, rng),
            SelectionMethod::Tournament => self.tournament_select(population, rng),
        }
    }

    /// Linear rank selection on a population sorted best-first.
    fn rank_select<'a, R: Rng>(population: &'a [P::Individual], rng: &mut R) -> &'a P::Individual {
        let n = population.len();
        let total = n * (n + 1) / 2;
        let mut ticket = rng.gen_range(0..total.max(1));

        for (i, individual) in population.iter().enumerate() {
            let weight = n - i;
            if ticket < weight {
                return individual;
            }
            ticket -= weight;
        }

        &population[n - 1]
    }

    fn tournament_select<'a, R: Rng>(
        &self,
        population: &'a [P::Individual],
        rng: &mut R,
    ) -> &'a P::Individual {
        let mut best_idx = rng.gen_range(0..population.len());

        for _ in 1..self.config.tournament_size {
            let idx = rng.gen_range(0..population.len());
            if population[idx].fitness() > population[best_idx].fitness() {
                best_idx = idx;
            }
        }

        &population[best_idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;

    #[derive(Clone)]
    struct SimpleIndividual {
        value: f64,
    }

    impl Individual for SimpleIndividual {
        fn fitness(&self) -> f64 {
            // Maximize: -(x^2), optimal at x=0
            -self.value * self.value
        }

        fn crossover<R: Rng>(&self, other: &Self, rng: &mut R) -> Self {
            Self {
                value: if rng.gen() { self.value } else { other.value },
            }
        }

        fn mutate<R: Rng>(&mut self, rng: &mut R) {
            self.value += rng.gen_range(-10.0..10.0);
        }
    }

    struct SimpleProblem;

    impl GaProblem for SimpleProblem {
        type Individual = SimpleIndividual;

        fn evaluate(&self, _individual: &mut Self::Individual) {}

        fn initialize_population<R: Rng>(&self, size: usize, rng: &mut R) -> Vec<SimpleIndividual> {
            (0..size)
                .map(|_| SimpleIndividual {
                    value: rng.gen_range(-100.0..100.0),
                })
                .collect()
        }
    }

    struct EmptyProblem;

    impl GaProblem for EmptyProblem {
        type Individual = SimpleIndividual;

        fn evaluate(&self, _individual: &mut Self::Individual) {}

        fn initialize_population<R: Rng>(&self, _size: usize, _rng: &mut R) -> Vec<SimpleIndividual> {
            Vec::new()
        }
    }

    #[test]
    fn test_ga_basic() {
        let config = GaConfig::default()
            .with_population_size(50)
            .with_max_generations(100)
            .with_target_fitness(-0.01);

        let runner = GaRunner::new(config, SimpleProblem);
        let result = runner.run().unwrap();

        assert!(result.best.value.abs() < 5.0);
    }

    #[test]
    fn test_tournament_selection() {
        let config = GaConfig::default()
            .with_population_size(30)
            .with_max_generations(50)
            .with_selection(SelectionMethod::Tournament, 3);

        let runner = GaRunner::new(config, SimpleProblem);
        let result = runner.run_with_rng(&mut StdRng::seed_from_u64(7)).unwrap();
        assert!(result.best.value.abs() < 20.0);
    }

    #[test]
    fn test_history_is_non_decreasing() {
        let config = GaConfig::default().with_max_generations(40);
        let runner = GaRunner::new(config, SimpleProblem);
        let result = runner.run_with_rng(&mut StdRng::seed_from_u64(1)).unwrap();

        assert!(result.history.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn test_same_seed_same_result() {
        let run = || {
            GaRunner::new(GaConfig::default().with_max_generations(20), SimpleProblem)
                .run_with_rng(&mut StdRng::seed_from_u64(42))
                .unwrap()
                .best
                .value
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_cancelled_before_start() {
        let runner = GaRunner::new(GaConfig::default(), SimpleProblem);
        runner.cancel_handle().cancel();

        let result = runner.run_with_rng(&mut StdRng::seed_from_u64(3)).unwrap();
        assert!(result.cancelled);
        assert_eq!(result.generations, 0);
    }

    #[test]
    fn test_stagnation_stops_early() {
        let config = GaConfig::default()
            .with_max_generations(1000)
            .with_mutation_rate(0.0)
            .with_crossover_rate(0.0)
            .with_stagnation_limit(Some(5));

        let runner = GaRunner::new(config, SimpleProblem);
        let result = runner.run_with_rng(&mut StdRng::seed_from_u64(9)).unwrap();
        assert!(result.generations <= 5);
    }

    #[test]
    fn test_progress_callback() {
        let calls = std::cell::Cell::new(0);
        let runner = GaRunner::new(
            GaConfig::default()
                .with_max_generations(5)
                .with_stagnation_limit(None),
            SimpleProblem,
        );
        runner.run_with_rng_and_progress(
            &mut StdRng::seed_from_u64(5),
            Some(|_p: GaProgress| calls.set(calls.get() + 1)),
        );
        // One per generation plus the final report.
        assert_eq!(calls.get(), 6);
    }

    #[test]
    fn test_empty_population() {
        let runner = GaRunner::new(GaConfig::default(), EmptyProblem);
        assert!(runner.run().is_none());
    }
}
