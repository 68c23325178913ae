//! Genetic Algorithm based 3D cutting-stock optimization.
//!
//! This module provides GA-based optimization over a permutation + rotation
//! chromosome. Each chromosome is decoded by feeding its order through the
//! greedy packer or guillotine planner across the available stock instances.

use crate::packing_utils::PackingContext;
use rand::prelude::*;
use u_cutstock_core::ga::{GaConfig, GaProblem, GaProgress, GaRunner, Individual};
use u_cutstock_core::result::{AlgorithmData, OptimizationResult};
use u_cutstock_core::solver::{CancellationToken, Config, ProgressReporter};
use u_cutstock_core::{Error, Result};

/// Probability split between the mutation operators: swap, then inversion,
/// the remainder is a rotation change.
const SWAP_SHARE: f64 = 0.4;
const INVERSION_SHARE: f64 = 0.3;

/// Packing chromosome representing placement order and rotation genes.
#[derive(Debug, Clone)]
pub struct PackingChromosome {
    /// Permutation of instance indices (placement order).
    pub order: Vec<usize>,
    /// Rotation gene for each instance, indexed by instance.
    pub rotations: Vec<usize>,
    /// Number of rotation options a gene ranges over.
    rotation_options: usize,
    /// Cached fitness value.
    fitness: f64,
    /// Number of placed instances.
    placed_count: usize,
}

impl PackingChromosome {
    /// Creates a chromosome from an order with every gene 0.
    pub fn from_order(order: Vec<usize>, rotation_options: usize) -> Self {
        let n = order.len();
        Self {
            order,
            rotations: vec![0; n],
            rotation_options: rotation_options.max(1),
            fitness: f64::NEG_INFINITY,
            placed_count: 0,
        }
    }

    /// Creates a random chromosome.
    pub fn random<R: Rng>(num_instances: usize, rotation_options: usize, rng: &mut R) -> Self {
        let mut order: Vec<usize> = (0..num_instances).collect();
        order.shuffle(rng);
        let options = rotation_options.max(1);

        Self {
            order,
            rotations: (0..num_instances).map(|_| rng.gen_range(0..options)).collect(),
            rotation_options: options,
            fitness: f64::NEG_INFINITY,
            placed_count: 0,
        }
    }

    /// Sets the fitness value.
    pub fn set_fitness(&mut self, fitness: f64, placed_count: usize) {
        self.fitness = fitness;
        self.placed_count = placed_count;
    }

    /// Number of instances placed by the last evaluation.
    pub fn placed_count(&self) -> usize {
        self.placed_count
    }

    /// Order crossover (OX1) on the permutation, uniform crossover on rotation genes.
    pub fn order_crossover<R: Rng>(&self, other: &Self, rng: &mut R) -> Self {
        let n = self.order.len();
        if n < 2 {
            return self.clone();
        }

        let (mut p1, mut p2) = (rng.gen_range(0..n), rng.gen_range(0..n));
        if p1 > p2 {
            std::mem::swap(&mut p1, &mut p2);
        }

        // Copy segment from parent1
        let mut child_order = vec![usize::MAX; n];
        let mut used = vec![false; n];
        for i in p1..=p2 {
            child_order[i] = self.order[i];
            used[self.order[i]] = true;
        }

        // Fill remaining positions from parent2, starting after the segment
        let mut j = (p2 + 1) % n;
        for i in 0..n {
            let idx = (p2 + 1 + i) % n;
            if child_order[idx] == usize::MAX {
                while used[other.order[j]] {
                    j = (j + 1) % n;
                }
                child_order[idx] = other.order[j];
                used[other.order[j]] = true;
                j = (j + 1) % n;
            }
        }

        let rotations = self
            .rotations
            .iter()
            .zip(&other.rotations)
            .map(|(a, b)| if rng.gen() { *a } else { *b })
            .collect();

        Self {
            order: child_order,
            rotations,
            rotation_options: self.rotation_options,
            fitness: f64::NEG_INFINITY,
            placed_count: 0,
        }
    }

    /// Swap mutation for order genes.
    pub fn swap_mutate<R: Rng>(&mut self, rng: &mut R) {
        if self.order.len() < 2 {
            return;
        }

        let i = rng.gen_range(0..self.order.len());
        let j = rng.gen_range(0..self.order.len());
        self.order.swap(i, j);
        self.fitness = f64::NEG_INFINITY;
    }

    /// Inversion mutation (reverses a segment of the order).
    pub fn inversion_mutate<R: Rng>(&mut self, rng: &mut R) {
        let n = self.order.len();
        if n < 2 {
            return;
        }

        let (mut p1, mut p2) = (rng.gen_range(0..n), rng.gen_range(0..n));
        if p1 > p2 {
            std::mem::swap(&mut p1, &mut p2);
        }

        self.order[p1..=p2].reverse();
        self.fitness = f64::NEG_INFINITY;
    }

    /// Rotation mutation: redraws the gene of one instance.
    pub fn rotation_mutate<R: Rng>(&mut self, rng: &mut R) {
        if self.rotations.is_empty() || self.rotation_options <= 1 {
            return;
        }

        let idx = rng.gen_range(0..self.rotations.len());
        self.rotations[idx] = rng.gen_range(0..self.rotation_options);
        self.fitness = f64::NEG_INFINITY;
    }
}

impl Individual for PackingChromosome {
    fn fitness(&self) -> f64 {
        self.fitness
    }

    fn crossover<R: Rng>(&self, other: &Self, rng: &mut R) -> Self {
        self.order_crossover(other, rng)
    }

    fn mutate<R: Rng>(&mut self, rng: &mut R) {
        let r: f64 = rng.gen();
        if r < SWAP_SHARE {
            self.swap_mutate(rng);
        } else if r < SWAP_SHARE + INVERSION_SHARE {
            self.inversion_mutate(rng);
        } else {
            self.rotation_mutate(rng);
        }
    }
}

/// Problem definition for GA-based cutting-stock packing.
pub struct PackingProblem<'a> {
    ctx: &'a PackingContext,
}

impl<'a> PackingProblem<'a> {
    /// Creates a new packing problem over a shared context.
    pub fn new(ctx: &'a PackingContext) -> Self {
        Self { ctx }
    }

    /// Returns the total number of instances.
    pub fn num_instances(&self) -> usize {
        self.ctx.instance_count()
    }

    /// Decodes a chromosome into a result.
    pub fn decode(&self, chromosome: &PackingChromosome) -> OptimizationResult {
        self.ctx
            .to_result(self.ctx.decode(&chromosome.order, &chromosome.rotations))
    }
}

impl GaProblem for PackingProblem<'_> {
    type Individual = PackingChromosome;

    fn evaluate(&self, individual: &mut Self::Individual) {
        let outcome = self.ctx.decode(&individual.order, &individual.rotations);
        let fitness = self.ctx.fitness(&outcome);
        individual.set_fitness(fitness, outcome.placed_count());
    }

    fn initialize_population<R: Rng>(&self, size: usize, rng: &mut R) -> Vec<Self::Individual> {
        let n = self.num_instances();
        let options = self.ctx.rotation_choices();

        let mut population = Vec::with_capacity(size);
        if size > 0 {
            population.push(PackingChromosome::from_order(self.ctx.seed_order(), options));
        }
        while population.len() < size {
            population.push(PackingChromosome::random(n, options, rng));
        }
        population
    }

    fn on_generation(
        &self,
        generation: u32,
        best: &Self::Individual,
        _population: &[Self::Individual],
    ) {
        log::debug!(
            "GA packing gen {}: fitness={:.4}, placed={}/{}",
            generation,
            best.fitness(),
            best.placed_count,
            self.num_instances()
        );
    }
}

/// Builds the GA configuration from the solver configuration.
pub fn ga_config(config: &Config) -> GaConfig {
    let mut ga = GaConfig::default()
        .with_population_size(config.population_size)
        .with_max_generations(config.max_generations)
        .with_crossover_rate(config.crossover_rate)
        .with_mutation_rate(config.mutation_rate)
        .with_elite_count(config.elite_count)
        .with_selection(config.selection, config.tournament_size)
        .with_stagnation_limit(config.stagnation_limit);

    if let Some(limit) = config.time_limit() {
        ga = ga.with_time_limit(limit);
    }
    if let Some(target) = config.target_efficiency {
        ga = ga.with_target_fitness(target);
    }
    ga
}

/// Runs GA-based cutting-stock optimization.
///
/// Cancellation is observed between generations; a cancelled or timed-out
/// run returns the best chromosome found so far, tagged as partial.
pub fn run_ga_packing(
    ctx: &PackingContext,
    config: &Config,
    reporter: &ProgressReporter,
    cancelled: &CancellationToken,
) -> Result<OptimizationResult> {
    let runner =
        GaRunner::new(ga_config(config), PackingProblem::new(ctx)).with_cancellation(cancelled.clone());
    let mut rng = crate::packing_utils::make_rng(config);

    reporter.report("genetic", 0.0, "Initializing population");
    let max_generations = config.max_generations.max(1);
    let ga_result = runner
        .run_with_rng_and_progress(
            &mut rng,
            Some(|p: GaProgress| {
                if p.running {
                    let done = p.generation + 1;
                    reporter.report(
                        "genetic",
                        f64::from(done) / f64::from(max_generations) * 100.0,
                        format!("Generation {}/{}", done, max_generations),
                    );
                }
            }),
        )
        .ok_or_else(|| Error::Internal("GA produced an empty population".into()))?;

    if ga_result.cancelled {
        log::warn!(
            "GA packing cancelled after {} generations, returning best so far",
            ga_result.generations
        );
    }

    let mut result = runner.problem().decode(&ga_result.best);
    result.partial = ga_result.cancelled || ga_result.timed_out;

    let mut data = AlgorithmData::new("genetic");
    data.generations = Some(ga_result.generations);
    data.best_fitness = Some(ga_result.best.fitness());
    data.fitness_history = Some(ga_result.history);
    result.algorithm_data = Some(data);

    reporter.report("genetic", 100.0, "Complete");
    Ok(result)
}
