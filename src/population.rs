//! The generational loop: render, evaluate, select, breed, replace.
//!
//! A [`Population`] owns its individuals, its RNG and the run's
//! [`InnovationCounter`]. The outside world is reached only through the
//! [`ImageRenderer`], [`FitnessEvaluator`] and [`ArtifactStore`] seams, so a
//! run can be driven against real files or in-memory doubles.
//!
//! Selection is stochastic acceptance: individuals are visited in order and
//! kept with probability equal to their fitness until half the population is
//! kept. If the pass falls short the rest is drawn uniformly at random. Every
//! winner then contributes one mutated offspring plus an unmodified copy of
//! itself to the next generation.

use std::path::PathBuf;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::codec;
use crate::config::EvolutionConfig;
use crate::error::{ConfigError, EvolutionError};
use crate::fitness::FitnessEvaluator;
use crate::genome::{Layout, Network};
use crate::innovation::InnovationCounter;
use crate::operators;
use crate::render::ImageRenderer;
use crate::storage::ArtifactStore;

/// One member of a generation.
#[derive(Debug, Clone)]
pub struct Individual {
    /// `<generation>_<n>`, unique within a run.
    pub label: String,
    pub network: Network,
    /// Where the rendered image was written.
    pub artifact: Option<PathBuf>,
    /// Goal-class score, once evaluated.
    pub fitness: Option<f32>,
}

impl Individual {
    fn new(generation: u32, n: usize, network: Network) -> Self {
        Self {
            label: format!("{generation}_{n}"),
            network,
            artifact: None,
            fitness: None,
        }
    }
}

/// Summary of one completed generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    /// The generation that was evaluated.
    pub generation: u32,
    pub best_label: String,
    pub best_fitness: f32,
    /// Winners drawn uniformly after stochastic acceptance fell short.
    pub topped_up: usize,
}

/// Best individual of the final generation of a run.
#[derive(Debug, Clone)]
pub struct Champion {
    pub generation: u32,
    pub label: String,
    pub fitness: f32,
    pub network: Network,
    /// Text encoding of `network`.
    pub genome: String,
}

/// Select `fitnesses.len() / 2` winner indices by stochastic acceptance.
///
/// Returns the winners and how many of them were drawn uniformly to fill the
/// quota. Uniform draws may repeat an index.
pub fn select_winners<R: Rng>(fitnesses: &[f32], rng: &mut R) -> (Vec<usize>, usize) {
    let quota = fitnesses.len() / 2;
    let mut winners = Vec::with_capacity(quota);

    for (i, &fitness) in fitnesses.iter().enumerate() {
        if winners.len() >= quota {
            break;
        }
        if rng.random::<f32>() < fitness {
            winners.push(i);
        }
    }

    let accepted = winners.len();
    while winners.len() < quota {
        winners.push(rng.random_range(0..fitnesses.len()));
    }

    (winners, quota - accepted)
}

/// Pick a mate position for the winner at `position`.
///
/// Positions holding a different individual are preferred. When every winner
/// is the same individual, any other position is taken, and a lone winner
/// mates with itself.
fn mate_position<R: Rng>(position: usize, winners: &[usize], rng: &mut R) -> usize {
    let others: Vec<usize> = (0..winners.len())
        .filter(|&p| winners[p] != winners[position])
        .collect();
    if !others.is_empty() {
        return others[rng.random_range(0..others.len())];
    }
    if winners.len() <= 1 {
        return position;
    }
    let other = rng.random_range(0..winners.len() - 1);
    if other >= position {
        other + 1
    } else {
        other
    }
}

/// Index of the first individual with the highest fitness.
fn best_index(fitnesses: &[f32]) -> usize {
    let mut best = 0;
    for (i, &fitness) in fitnesses.iter().enumerate().skip(1) {
        if fitness > fitnesses[best] || fitnesses[best].is_nan() {
            best = i;
        }
    }
    best
}

/// A generational CPPN population evolving toward one classifier label.
#[derive(Debug, Clone)]
pub struct Population {
    config: EvolutionConfig,
    layout: Layout,
    generation: u32,
    individuals: Vec<Individual>,
    innovations: InnovationCounter,
    rng: ChaCha8Rng,
}

impl Population {
    /// Seed generation 1 with fully connected networks.
    ///
    /// The RNG is seeded from `config.seed` when present, otherwise from the
    /// thread RNG.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the configuration is invalid.
    pub fn new(config: EvolutionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_rng(&mut rand::rng()),
        };

        let layout = config.layout();
        let generation = 1;
        let individuals = (1..=config.population_size)
            .map(|n| {
                let network = Network::fully_connected(layout, &mut rng);
                Individual::new(generation, n, network)
            })
            .collect();

        Ok(Self {
            innovations: InnovationCounter::after_seed(&layout),
            config,
            layout,
            generation,
            individuals,
            rng,
        })
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    pub const fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Current generation, starting at 1.
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    pub const fn innovations(&self) -> &InnovationCounter {
        &self.innovations
    }

    /// Render every individual of the current generation.
    ///
    /// # Errors
    ///
    /// Returns [`EvolutionError::Render`] with the renderer's error.
    pub fn render<I: ImageRenderer>(&mut self, renderer: &mut I) -> Result<(), EvolutionError> {
        for individual in &mut self.individuals {
            let path = renderer
                .render(&mut individual.network, &individual.label)
                .map_err(|source| EvolutionError::Render {
                    label: individual.label.clone(),
                    source,
                })?;
            individual.artifact = Some(path);
        }
        Ok(())
    }

    /// Score every rendered individual by its goal-class confidence.
    ///
    /// # Errors
    ///
    /// Returns [`EvolutionError::NotRendered`] for an individual without an
    /// artifact, [`EvolutionError::Classify`] with the evaluator's error, and
    /// [`EvolutionError::MissingGoal`] if the goal class is absent.
    pub fn evaluate<F: FitnessEvaluator>(
        &mut self,
        evaluator: &mut F,
    ) -> Result<(), EvolutionError> {
        for individual in &mut self.individuals {
            let path = individual
                .artifact
                .as_deref()
                .ok_or_else(|| EvolutionError::NotRendered(individual.label.clone()))?;
            let scores = evaluator
                .classify(path)
                .map_err(|source| EvolutionError::Classify {
                    path: path.to_path_buf(),
                    source,
                })?;
            let fitness = scores.get(&self.config.goal).copied().ok_or_else(|| {
                EvolutionError::MissingGoal {
                    goal: self.config.goal.clone(),
                    label: individual.label.clone(),
                }
            })?;
            log::trace!("{}: {fitness}", individual.label);
            individual.fitness = Some(fitness);
        }
        Ok(())
    }

    fn fitnesses(&self) -> Result<Vec<f32>, EvolutionError> {
        self.individuals
            .iter()
            .map(|i| {
                i.fitness
                    .ok_or_else(|| EvolutionError::NotEvaluated(i.label.clone()))
            })
            .collect()
    }

    /// Breed the next generation's networks from the evaluated winners.
    fn breed(&mut self, winners: &[usize]) -> Result<Vec<Network>, EvolutionError> {
        let mut next = Vec::with_capacity(winners.len() * 2);

        for (position, &winner) in winners.iter().enumerate() {
            let mate = winners[mate_position(position, winners, &mut self.rng)];
            let parent = &self.individuals[winner];
            let other = &self.individuals[mate];

            let mut offspring = operators::breed(
                &parent.network,
                parent.fitness,
                &other.network,
                other.fitness,
                &mut self.rng,
            )?;
            operators::mutate(
                &mut offspring,
                &mut self.innovations,
                &self.config.mutation,
                &mut self.rng,
            );

            next.push(offspring);
            next.push(parent.network.clone());
        }

        Ok(next)
    }

    /// Run one full generation against the given collaborators.
    ///
    /// The best individual's artifact is archived, the generation's remaining
    /// artifacts are purged and the next generation is installed.
    ///
    /// # Errors
    ///
    /// Propagates collaborator failures and offspring decode failures. On
    /// error the current generation is left in place.
    pub fn step<I, F, S>(
        &mut self,
        renderer: &mut I,
        evaluator: &mut F,
        store: &mut S,
    ) -> Result<GenerationReport, EvolutionError>
    where
        I: ImageRenderer,
        F: FitnessEvaluator,
        S: ArtifactStore,
    {
        self.render(renderer)?;
        self.evaluate(evaluator)?;
        self.advance(store)
    }

    /// Select, breed and replace an evaluated generation.
    fn advance<S: ArtifactStore>(
        &mut self,
        store: &mut S,
    ) -> Result<GenerationReport, EvolutionError> {
        let fitnesses = self.fitnesses()?;
        let (winners, topped_up) = select_winners(&fitnesses, &mut self.rng);
        if topped_up > 0 {
            log::debug!(
                "generation {}: topped up {topped_up} of {} winners at random",
                self.generation,
                winners.len()
            );
        }
        let next = self.breed(&winners)?;

        let best_at = best_index(&fitnesses);
        let best = &self.individuals[best_at];
        let report = GenerationReport {
            generation: self.generation,
            best_label: best.label.clone(),
            best_fitness: fitnesses[best_at],
            topped_up,
        };
        log::info!(
            "generation {}: best {} fitness {:.4}",
            report.generation,
            report.best_label,
            report.best_fitness
        );
        if let Some(artifact) = &best.artifact {
            store.archive(artifact).map_err(EvolutionError::Storage)?;
        }
        store
            .purge_generation(self.generation)
            .map_err(EvolutionError::Storage)?;

        self.generation += 1;
        self.individuals = next
            .into_iter()
            .enumerate()
            .map(|(i, network)| Individual::new(self.generation, i + 1, network))
            .collect();

        Ok(report)
    }

    /// Step until a generation's best fitness reaches the target or the
    /// generation limit is hit. Returns the best individual of the last
    /// evaluated generation.
    ///
    /// # Errors
    ///
    /// As [`step`](Self::step).
    pub fn evolve<I, F, S>(
        &mut self,
        renderer: &mut I,
        evaluator: &mut F,
        store: &mut S,
    ) -> Result<Champion, EvolutionError>
    where
        I: ImageRenderer,
        F: FitnessEvaluator,
        S: ArtifactStore,
    {
        let mut run = 0;
        loop {
            self.render(renderer)?;
            self.evaluate(evaluator)?;
            let champion = self.champion()?;
            self.advance(store)?;
            run += 1;

            let exhausted = self.config.max_generations.is_some_and(|max| run >= max);
            if champion.fitness >= self.config.target_fitness || exhausted {
                log::info!(
                    "finished after {run} generations: {} fitness {:.4}",
                    champion.label,
                    champion.fitness
                );
                return Ok(champion);
            }
        }
    }

    /// Best individual of the evaluated current generation.
    ///
    /// # Errors
    ///
    /// Returns [`EvolutionError::NotEvaluated`] if any individual lacks a
    /// fitness.
    pub fn champion(&self) -> Result<Champion, EvolutionError> {
        let fitnesses = self.fitnesses()?;
        let best_at = best_index(&fitnesses);
        let best = &self.individuals[best_at];
        Ok(Champion {
            generation: self.generation,
            label: best.label.clone(),
            fitness: fitnesses[best_at],
            genome: codec::encode(&best.network),
            network: best.network.clone(),
        })
    }
}
