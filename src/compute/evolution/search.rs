//! Generational genetic algorithm over grid world genomes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

use crate::compute::simulator::GridSimulation;
use crate::compute::world::{WorldError, WorldTemplate};
use crate::schema::{
    AgentSnapshot, ConfigError, EvolutionConfig, EvolutionHistory, EvolutionPhase,
    EvolutionResult, EvolutionStats, GenerationReport, StopReason,
};

use super::agent::{Agent, rank_population};
use super::genome::GenomeRng;
use super::selection::Selector;

/// Errors that abort a run before or during construction.
#[derive(Debug, thiserror::Error)]
pub enum EvolutionError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("World template error: {0}")]
    World(#[from] WorldError),
}

/// Mutation-rate state owned by the engine.
///
/// Decays every generation and spikes once stagnation reaches the threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationSchedule {
    rate: f64,
    min_rate: f64,
    decay: f64,
    boost: f64,
    threshold: usize,
}

impl MutationSchedule {
    pub fn new(config: &EvolutionConfig) -> Self {
        Self {
            rate: config.initial_mutation_rate,
            min_rate: config.min_mutation_rate,
            decay: config.mutation_decay,
            boost: config.stagnation_boost,
            threshold: config.stagnation_threshold,
        }
    }

    /// Current swap-mutation probability.
    #[inline]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Boost the rate if `stagnation_count` reached the threshold.
    ///
    /// Returns true when the boost fired; the caller resets its counter.
    pub fn respond_to_stagnation(&mut self, stagnation_count: usize) -> bool {
        if stagnation_count >= self.threshold {
            self.rate = (self.rate * self.boost).min(1.0);
            true
        } else {
            false
        }
    }

    /// Per-generation multiplicative decay, floored at the minimum rate.
    pub fn decay(&mut self) {
        self.rate = self.min_rate.max(self.rate * self.decay);
    }
}

/// Evolution engine that runs the search.
pub struct EvolutionEngine {
    config: EvolutionConfig,
    rng: GenomeRng,
    template: WorldTemplate,
    population: Vec<Agent>,
    history: EvolutionHistory,
    generation: usize,
    best_fitness: f64,
    stagnation_count: usize,
    mutation: MutationSchedule,
    phase: EvolutionPhase,
    evaluations: u64,
    cancelled: Arc<AtomicBool>,
}

impl EvolutionEngine {
    /// Create a new evolution engine.
    ///
    /// Validates the configuration and builds the world template shared by
    /// every generation.
    pub fn new(config: EvolutionConfig) -> Result<Self, EvolutionError> {
        config.world.validate()?;
        let template = WorldTemplate::generate(&config.world)?;
        Self::with_template(config, template)
    }

    /// Create an engine around an existing template.
    ///
    /// The template's layout takes precedence over `config.world`.
    pub fn with_template(
        config: EvolutionConfig,
        template: WorldTemplate,
    ) -> Result<Self, EvolutionError> {
        config.validate()?;
        let rng = match config.random_seed {
            Some(seed) => GenomeRng::new(seed),
            None => GenomeRng::random(),
        };
        let mutation = MutationSchedule::new(&config);

        Ok(Self {
            config,
            rng,
            template,
            population: Vec::new(),
            history: EvolutionHistory::default(),
            generation: 0,
            best_fitness: f64::NEG_INFINITY,
            stagnation_count: 0,
            mutation,
            phase: EvolutionPhase::Initializing,
            evaluations: 0,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Get cancellation handle.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Shared world template.
    pub fn template(&self) -> &WorldTemplate {
        &self.template
    }

    /// Current population, ranked after each evaluation pass.
    pub fn population(&self) -> &[Agent] {
        &self.population
    }

    pub fn phase(&self) -> EvolutionPhase {
        self.phase
    }

    pub fn mutation_rate(&self) -> f64 {
        self.mutation.rate()
    }

    pub fn history(&self) -> &EvolutionHistory {
        &self.history
    }

    /// Initialize the population.
    pub fn initialize(&mut self) {
        self.population.clear();
        self.history = EvolutionHistory::default();
        self.generation = 0;
        self.best_fitness = f64::NEG_INFINITY;
        self.stagnation_count = 0;
        self.mutation = MutationSchedule::new(&self.config);
        self.evaluations = 0;
        self.phase = EvolutionPhase::Initializing;

        for _ in 0..self.config.population_size {
            let genome = self.rng.random_genome(self.config.genome_length);
            self.population.push(Agent::new(genome));
        }
    }

    /// Evaluate all agents in the population.
    #[cfg(not(target_arch = "wasm32"))]
    fn evaluate_population(&mut self) {
        self.phase = EvolutionPhase::Evaluating;
        let template = &self.template;

        // Parallel evaluation; each worker reuses one simulation.
        self.population.par_iter_mut().for_each_init(
            || GridSimulation::new(template),
            |sim, agent| {
                let evaluation = sim.run(&agent.genome);
                agent.apply(evaluation);
            },
        );
        self.evaluations += self.population.len() as u64;
    }

    #[cfg(target_arch = "wasm32")]
    fn evaluate_population(&mut self) {
        self.phase = EvolutionPhase::Evaluating;

        // Sequential evaluation for WASM
        let mut sim = GridSimulation::new(&self.template);
        for agent in &mut self.population {
            let evaluation = sim.run(&agent.genome);
            agent.apply(evaluation);
        }
        self.evaluations += self.population.len() as u64;
    }

    /// Sort the population and summarize it.
    fn rank(&mut self) -> GenerationReport {
        rank_population(&mut self.population);
        self.phase = EvolutionPhase::Ranked;

        let best = &self.population[0];
        let worst = &self.population[self.population.len() - 1];
        let avg_fitness = self
            .population
            .iter()
            .map(Agent::fitness_or_min)
            .sum::<f64>()
            / self.population.len() as f64;

        GenerationReport {
            generation: self.generation,
            best_fitness: best.fitness_or_min(),
            avg_fitness,
            worst_fitness: worst.fitness_or_min(),
            items_collected: best.items_collected,
            total_movement_cost: best.total_movement_cost,
            unique_visited: best.unique_visited(),
            revisits: best.revisits(),
            mutation_rate: self.mutation.rate(),
            stagnation_count: self.stagnation_count,
        }
    }

    /// Update best-ever fitness and the stagnation counter.
    fn track_improvement(&mut self, gen_best: f64) {
        if gen_best > self.best_fitness {
            self.best_fitness = gen_best;
            self.stagnation_count = 0;
        } else {
            self.stagnation_count += 1;
        }
    }

    /// Produce the next generation from the ranked population.
    fn breed(&mut self) {
        self.phase = EvolutionPhase::Breeding;
        let size = self.config.population_size;
        let mut next_gen = Vec::with_capacity(size + self.immigrant_count());

        // Elitism: keep best individuals
        next_gen.extend(
            self.population
                .iter()
                .take(self.config.elite_size)
                .cloned(),
        );

        if let Some(selector) = Selector::prepare(&self.config, &self.population, self.generation)
        {
            let rate = self.mutation.rate();
            while next_gen.len() < size {
                let idx1 = selector.select(&self.population, &mut self.rng);
                let idx2 = selector.select(&self.population, &mut self.rng);

                let child = self.rng.crossover(
                    &self.population[idx1].genome,
                    &self.population[idx2].genome,
                );
                let child = self.rng.mutate(&child, rate);
                next_gen.push(Agent::new(child));
            }
        }

        // Immigrants land after the bred children and may be cut below.
        for _ in 0..self.immigrant_count() {
            let genome = self.rng.random_genome(self.config.genome_length);
            next_gen.push(Agent::new(genome));
        }
        next_gen.truncate(size);

        self.population = next_gen;
    }

    fn immigrant_count(&self) -> usize {
        (self.config.immigration_rate * self.config.population_size as f64) as usize
    }

    /// Run one full generation: evaluate, rank, adapt, breed.
    ///
    /// Initializes the population first if it has not been built yet.
    pub fn step_generation(&mut self) -> GenerationReport {
        if self.population.is_empty() {
            self.initialize();
        }
        self.evaluate_population();
        let mut report = self.rank();

        self.track_improvement(report.best_fitness);
        report.stagnation_count = self.stagnation_count;
        self.history.record(&report);

        log::info!(
            "Generation {}, Best fitness: {:.2}, Average fitness: {:.2}, Items Collected: {}, \
             Movement Cost: {}, Unique Positions: {}, Revisits: {}",
            report.generation,
            report.best_fitness,
            report.avg_fitness,
            report.items_collected,
            report.total_movement_cost,
            report.unique_visited,
            report.revisits
        );

        if self.mutation.respond_to_stagnation(self.stagnation_count) {
            log::warn!(
                "Stagnation detected at generation {}. Mutation rate raised to {:.4}",
                self.generation,
                self.mutation.rate()
            );
            self.stagnation_count = 0;
        }

        self.breed();
        self.mutation.decay();
        self.generation += 1;

        report
    }

    /// Evaluate and rank the final population and return its best agent.
    fn finish(&mut self) -> Option<AgentSnapshot> {
        if self.population.is_empty() {
            return None;
        }
        self.evaluate_population();
        rank_population(&mut self.population);
        self.population.first().map(Agent::to_snapshot)
    }

    /// Run evolution with progress callback.
    pub fn run_with_callback<F>(&mut self, callback: F) -> EvolutionResult
    where
        F: Fn(&GenerationReport),
    {
        let start_time = std::time::Instant::now();

        self.initialize();

        let stop_reason = loop {
            if self.cancelled.load(Ordering::Relaxed) {
                break StopReason::Cancelled;
            }
            if self.generation >= self.config.generations {
                break StopReason::MaxGenerations;
            }

            let report = self.step_generation();
            callback(&report);
        };

        let best = self.finish().unwrap_or_else(|| AgentSnapshot {
            genome: Default::default(),
            fitness: f64::NEG_INFINITY,
            items_collected: 0,
            total_movement_cost: 0,
            unique_visited: 0,
            revisits: 0,
            actions_taken: 0,
            won: false,
        });
        self.phase = match stop_reason {
            StopReason::Cancelled => EvolutionPhase::Stopped,
            StopReason::MaxGenerations => EvolutionPhase::Complete,
        };

        let elapsed = start_time.elapsed().as_secs_f64();
        let final_avg_fitness = if self.population.is_empty() {
            0.0
        } else {
            self.population
                .iter()
                .map(Agent::fitness_or_min)
                .sum::<f64>()
                / self.population.len() as f64
        };

        log::info!(
            "Best agent: fitness {:.2}, items {}, movement cost {}, unique positions {}, revisits {}",
            best.fitness,
            best.items_collected,
            best.total_movement_cost,
            best.unique_visited,
            best.revisits
        );

        EvolutionResult {
            best,
            stats: EvolutionStats {
                generations: self.generation,
                total_evaluations: self.evaluations,
                best_fitness: self.best_fitness,
                final_avg_fitness,
                final_mutation_rate: self.mutation.rate(),
                elapsed_seconds: elapsed,
                evaluations_per_second: self.evaluations as f64 / elapsed.max(1e-9),
                stop_reason,
            },
            history: self.history.clone(),
        }
    }

    /// Run evolution (blocking).
    pub fn run(&mut self) -> EvolutionResult {
        self.run_with_callback(|_| {})
    }
}
