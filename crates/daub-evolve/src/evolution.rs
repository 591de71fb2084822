//! The generational control loop as an externally steppable state machine.

use crate::individual::Individual;
use crate::selection::{select, SelectionConfig};
use daub_core::fitness::{ErrorStats, MISSING_OUTPUT_PENALTY};
use daub_core::{Error, Result};
use daub_lang::{
    random_program, two_point_crossover, uniform_addition, uniform_crossover, uniform_deletion,
    Catalog, OperatorWeights, Program, VariationConfig, VariationOp,
};
use daub_runtime::{Interpreter, Registry, RunConfig, State};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Everything that parameterizes a run. Plain data, no hidden globals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Number of individuals per generation.
    pub population_size: usize,
    /// Generations bred before the search gives up.
    pub max_generations: u32,
    /// Upper bound on the length of randomly synthesized programs.
    pub max_initial_size: usize,
    /// Seed for the run's random source; `None` draws from entropy.
    pub seed: Option<u64>,
    pub selection: SelectionConfig,
    pub variation: VariationConfig,
    pub operators: OperatorWeights,
    pub run: RunConfig,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            max_generations: 100,
            max_initial_size: 50,
            seed: None,
            selection: SelectionConfig::default(),
            variation: VariationConfig::default(),
            operators: OperatorWeights::default(),
            run: RunConfig::default(),
        }
    }
}

/// Where the loop stands. `Success` and `Exhausted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Running,
    Success,
    Exhausted,
}

impl Status {
    pub fn is_terminal(&self) -> bool {
        *self != Status::Running
    }
}

/// The fitness collaborator: turns a program's final state into per-case
/// penalties.
pub trait Evaluator: Send + Sync {
    /// Number of test cases; every error vector must have this length.
    fn case_count(&self) -> usize;

    /// Non-negative penalties, one per case. A final state with no output
    /// on the expected stack must score `MISSING_OUTPUT_PENALTY` on every
    /// case rather than fail.
    fn score(&self, final_state: &State) -> Vec<f64>;
}

/// Per-generation observer, called exactly once per loop iteration with
/// the evaluated population, including the terminal iteration.
pub trait Reporter {
    fn report(&mut self, generation: u32, population: &[Individual]);
}

/// Reporter that logs aggregate population statistics via `tracing`.
#[derive(Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&mut self, generation: u32, population: &[Individual]) {
        if let Some(stats) = ErrorStats::from_totals(population.iter().map(|i| i.total_error)) {
            info!(
                generation,
                best = stats.best,
                mean = stats.mean,
                worst = stats.worst,
                "generation evaluated"
            );
        }
    }
}

/// The evolutionary engine.
///
/// `new` synthesizes and evaluates generation zero; each `step` reports
/// the current population, checks the terminal conditions, and otherwise
/// breeds and evaluates the next generation. The population is only ever
/// replaced wholesale between generations.
pub struct Evolution {
    config: EvolutionConfig,
    catalog: Catalog,
    interpreter: Interpreter,
    initial_state: State,
    evaluator: Box<dyn Evaluator>,
    reporter: Box<dyn Reporter>,
    population: Vec<Individual>,
    generation: u32,
    status: Status,
    rng: ChaCha8Rng,
}

impl Evolution {
    pub fn new(
        config: EvolutionConfig,
        catalog: Catalog,
        registry: Registry,
        initial_state: State,
        evaluator: Box<dyn Evaluator>,
        reporter: Box<dyn Reporter>,
    ) -> Result<Self> {
        if config.population_size == 0 {
            return Err(Error::Validation(
                "population size must be positive".to_string(),
            ));
        }
        if catalog.is_empty() {
            return Err(Error::Validation("catalog must not be empty".to_string()));
        }
        config.operators.validate()?;
        for id in catalog.instruction_ids() {
            if !registry.contains(id) {
                return Err(Error::Validation(format!(
                    "catalog instruction '{}' is not registered",
                    id
                )));
            }
        }

        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let mut engine = Self {
            interpreter: Interpreter::new(registry, config.run.clone()),
            config,
            catalog,
            initial_state,
            evaluator,
            reporter,
            population: Vec::new(),
            generation: 0,
            status: Status::Running,
            rng,
        };

        let mut seeds = Vec::with_capacity(engine.config.population_size);
        for _ in 0..engine.config.population_size {
            let program =
                random_program(&engine.catalog, engine.config.max_initial_size, &mut engine.rng);
            seeds.push(Individual::new(program));
        }
        let evaluated: Result<Vec<Individual>> =
            seeds.into_iter().map(|ind| engine.evaluate(ind)).collect();
        engine.population = evaluated?;

        info!(
            population = engine.population.len(),
            "initial population evaluated"
        );
        Ok(engine)
    }

    pub fn population(&self) -> &[Individual] {
        &self.population
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// The best individual of the current population.
    pub fn best(&self) -> Option<&Individual> {
        self.population.iter().min_by(|a, b| {
            a.total_error
                .partial_cmp(&b.total_error)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// One loop iteration: report, check terminal conditions, breed.
    /// Calling `step` on a finished engine returns the terminal status
    /// without side effects.
    #[instrument(skip(self), fields(generation = self.generation))]
    pub fn step(&mut self) -> Result<Status> {
        if self.status.is_terminal() {
            return Ok(self.status);
        }

        self.reporter.report(self.generation, &self.population);

        if self.population.iter().any(Individual::is_solution) {
            info!(generation = self.generation, "solution found");
            self.status = Status::Success;
            return Ok(self.status);
        }
        if self.generation >= self.config.max_generations {
            info!(
                generation = self.generation,
                "generation budget spent without a solution"
            );
            self.status = Status::Exhausted;
            return Ok(self.status);
        }

        let offspring = self.breed();
        let evaluated: Result<Vec<Individual>> =
            offspring.into_iter().map(|ind| self.evaluate(ind)).collect();
        self.population = evaluated?;
        self.generation += 1;
        debug!(generation = self.generation, "population replaced");

        Ok(self.status)
    }

    /// Step until a terminal state is reached.
    pub fn run(&mut self) -> Result<Status> {
        while !self.step()?.is_terminal() {}
        Ok(self.status)
    }

    /// Assemble the next generation, one independently bred child at a
    /// time.
    fn breed(&mut self) -> Vec<Individual> {
        let mut offspring = Vec::with_capacity(self.config.population_size);
        while offspring.len() < self.config.population_size {
            let child = self.breed_one();
            offspring.push(Individual::new(child));
        }
        offspring
    }

    /// Select two parents and apply one operator.
    ///
    /// The exact first parent is removed from the second parent's pool, so
    /// a crossover never pairs an individual with itself (a population of
    /// one falls back to self-pairing). The addition and deletion
    /// operators transform the first parent only.
    fn breed_one(&mut self) -> Program {
        let pool: Vec<&Individual> = self.population.iter().collect();
        let parent1 = select(&pool, &self.config.selection, &mut self.rng);

        let reduced: Vec<&Individual> = self
            .population
            .iter()
            .filter(|ind| ind.id != parent1.id)
            .collect();
        let parent2 = if reduced.is_empty() {
            parent1
        } else {
            select(&reduced, &self.config.selection, &mut self.rng)
        };

        match self.config.operators.pick(&mut self.rng) {
            VariationOp::UniformCrossover => {
                uniform_crossover(&parent1.program, &parent2.program, &mut self.rng)
            }
            VariationOp::TwoPointCrossover => {
                two_point_crossover(&parent1.program, &parent2.program, &mut self.rng)
            }
            VariationOp::UniformAddition => uniform_addition(
                &parent1.program,
                &self.catalog,
                &self.config.variation,
                &mut self.rng,
            ),
            VariationOp::UniformDeletion => {
                uniform_deletion(&parent1.program, &self.config.variation, &mut self.rng)
            }
        }
    }

    /// Run one individual against a fresh copy of the initial state and
    /// attach its penalties.
    ///
    /// A program that exceeds the step budget scores the sentinel penalty
    /// on every case instead of aborting the run; an unresolvable
    /// instruction has no recovery path and propagates.
    fn evaluate(&self, individual: Individual) -> Result<Individual> {
        let state = self.initial_state.clone();
        match self.interpreter.run(&individual.program, state) {
            Ok(final_state) => {
                let errors = self.evaluator.score(&final_state);
                Ok(individual.with_errors(errors))
            }
            Err(Error::StepLimit { limit }) => {
                warn!(
                    individual = %individual.id,
                    limit,
                    "step budget exceeded, assigning sentinel penalties"
                );
                let penalties = vec![MISSING_OUTPUT_PENALTY; self.evaluator.case_count()];
                Ok(individual.with_errors(penalties))
            }
            Err(err) => Err(err),
        }
    }
}
