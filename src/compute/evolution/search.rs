//! Generational layout search.
//!
//! Each generation keeps the top-ranked layouts unchanged, refills the rest
//! with blend-crossover offspring of tournament winners, then displaces
//! turbines of every candidate except the protected best ones.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::compute::{AepError, WindModelContext};
use crate::schema::{
    CandidateSnapshot, ConfigError, EvolutionConfig, EvolutionHistory, EvolutionProgress,
    EvolutionResult, EvolutionStats, StopReason, TurbineLayout,
};

use super::archive::LayoutArchive;
use super::fitness::FitnessEvaluator;
use super::genome::{LayoutRng, PlacementError};

/// A candidate layout in the population.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Unique identifier.
    pub id: u64,
    /// Turbine positions.
    pub layout: TurbineLayout,
    /// Annual energy production (GWh).
    pub aep: f64,
    /// Generation created.
    pub generation: usize,
    /// Parent IDs.
    pub parents: Vec<u64>,
}

impl Candidate {
    /// Convert to snapshot for serialization.
    pub fn to_snapshot(&self) -> CandidateSnapshot {
        CandidateSnapshot {
            id: self.id,
            aep: self.aep,
            layout: self.layout.clone(),
            generation: self.generation,
            parents: self.parents.clone(),
        }
    }
}

/// Errors that stop a search.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Could not place turbines: {0}")]
    Placement(#[from] PlacementError),
    #[error("AEP evaluation failed: {0}")]
    Aep(#[from] AepError),
    #[error("Search has not been initialized")]
    NotInitialized,
}

/// Sort candidates by descending AEP.
fn rank(population: &mut [Candidate]) {
    population.sort_by(|a, b| b.aep.total_cmp(&a.aep));
}

/// Evolution engine that runs the search.
pub struct EvolutionEngine {
    config: EvolutionConfig,
    rng: LayoutRng,
    evaluator: FitnessEvaluator,
    population: Vec<Candidate>,
    archive: LayoutArchive,
    history: EvolutionHistory,
    generation: usize,
    best: Option<Candidate>,
    regressed: bool,
    generation_fallbacks: usize,
    total_fallbacks: usize,
    evaluations: u64,
    next_id: u64,
    cancelled: Arc<AtomicBool>,
    seed_layouts: Vec<TurbineLayout>,
}

impl EvolutionEngine {
    /// Create a new evolution engine.
    pub fn new(config: EvolutionConfig, context: Arc<WindModelContext>) -> Result<Self, SearchError> {
        config.validate()?;
        let rng = match config.random_seed {
            Some(seed) => LayoutRng::new(seed),
            None => LayoutRng::random(),
        };

        Ok(Self {
            config,
            rng,
            evaluator: FitnessEvaluator::new(context),
            population: Vec::new(),
            archive: LayoutArchive::default(),
            history: EvolutionHistory::default(),
            generation: 0,
            best: None,
            regressed: false,
            generation_fallbacks: 0,
            total_fallbacks: 0,
            evaluations: 0,
            next_id: 0,
            cancelled: Arc::new(AtomicBool::new(false)),
            seed_layouts: Vec::new(),
        })
    }

    /// Seed the initial population with saved layouts; remaining slots are random.
    pub fn with_seed_layouts(mut self, layouts: Vec<TurbineLayout>) -> Self {
        self.seed_layouts = layouts;
        self
    }

    /// Get cancellation handle.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Current population, best first.
    pub fn population(&self) -> &[Candidate] {
        &self.population
    }

    /// Best candidate of every generation so far.
    pub fn archive(&self) -> &LayoutArchive {
        &self.archive
    }

    /// Per-generation history so far.
    pub fn history(&self) -> &EvolutionHistory {
        &self.history
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn evaluate(&mut self, population: &mut [Candidate]) -> Result<(), SearchError> {
        self.evaluator.evaluate_population(population)?;
        self.evaluations += population.len() as u64;
        Ok(())
    }

    /// Build and score the initial population.
    ///
    /// Failing to place a random layout here is fatal.
    pub fn initialize(&mut self) -> Result<(), SearchError> {
        self.population.clear();
        self.archive.clear();
        self.history = EvolutionHistory::default();
        self.generation = 0;
        self.best = None;

        let size = self.config.population.size;
        let seeded = std::mem::take(&mut self.seed_layouts);
        if seeded.len() > size {
            log::info!("using {} of {} seed layouts", size, seeded.len());
        }

        let mut population = Vec::with_capacity(size);
        for layout in seeded.into_iter().take(size) {
            let id = self.next_id();
            population.push(Candidate {
                id,
                layout,
                aep: 0.0,
                generation: 0,
                parents: Vec::new(),
            });
        }
        while population.len() < size {
            let layout = self.rng.random_layout(&self.config.farm)?;
            let id = self.next_id();
            population.push(Candidate {
                id,
                layout,
                aep: 0.0,
                generation: 0,
                parents: Vec::new(),
            });
        }

        self.evaluate(&mut population)?;
        self.population = population;
        self.record();
        Ok(())
    }

    /// Index of the best of `tournament_size` distinct random candidates.
    fn tournament(&mut self) -> usize {
        let picks = self
            .rng
            .sample_indices(self.population.len(), self.config.selection.tournament_size);
        picks
            .into_iter()
            .max_by(|&a, &b| self.population[a].aep.total_cmp(&self.population[b].aep))
            .unwrap_or(0)
    }

    /// Run a single generation step.
    pub fn step_generation(&mut self) -> Result<(), SearchError> {
        if self.population.is_empty() {
            return Err(SearchError::NotInitialized);
        }
        let next_generation = self.generation + 1;
        let elites = self.config.elite_count();
        let offspring_count = self.config.offspring_count();

        // Elitism: population is ranked, copy the best forward.
        let mut next: Vec<Candidate> = self.population[..elites]
            .iter()
            .cloned()
            .collect();

        // Mating pool of tournament winners from the full previous population.
        let pool_indices: Vec<usize> = (0..offspring_count).map(|_| self.tournament()).collect();

        let mut offspring = Vec::with_capacity(offspring_count);
        self.generation_fallbacks = 0;
        if !pool_indices.is_empty() {
            let pool: Vec<&TurbineLayout> = pool_indices
                .iter()
                .map(|&i| &self.population[i].layout)
                .collect();

            for _ in 0..offspring_count {
                let child = self
                    .rng
                    .crossover(&pool, &self.config.crossover, &self.config.farm)?;
                if child.fallback {
                    self.generation_fallbacks += 1;
                }
                let parents = child
                    .parents
                    .iter()
                    .map(|&slot| self.population[pool_indices[slot]].id)
                    .collect();
                offspring.push((child.layout, parents));
            }
        }

        for (layout, parents) in offspring {
            let id = self.next_id();
            next.push(Candidate {
                id,
                layout,
                aep: 0.0,
                generation: next_generation,
                parents,
            });
        }

        // Score offspring so the merged generation can be ranked.
        self.evaluate(&mut next[elites..])?;
        rank(&mut next);

        self.mutate(&mut next)?;
        self.evaluate(&mut next)?;

        self.total_fallbacks += self.generation_fallbacks;
        if self.generation_fallbacks > 0 {
            log::debug!(
                "generation {}: {} offspring fell back to random layouts",
                next_generation,
                self.generation_fallbacks
            );
        }

        self.population = next;
        self.generation = next_generation;
        self.record();
        Ok(())
    }

    /// Displace turbines of the ranked generation `next`.
    fn mutate(&mut self, next: &mut [Candidate]) -> Result<(), SearchError> {
        let mutation = self.config.mutation.clone();
        let plan = self.rng.mutation_plan(next.len(), &mutation);
        let retained = mutation.retained.min(next.len());
        let start = if mutation.greedy_elites { 0 } else { retained };

        for (i, candidate) in next.iter_mut().enumerate().skip(start) {
            if !plan.mutates(i) {
                continue;
            }
            let mut moved = false;
            for turbine in 0..candidate.layout.len() {
                if !plan.mutates_turbine(i, turbine) {
                    continue;
                }
                let Some((x, y)) = self
                    .rng
                    .displace(&candidate.layout, turbine, &mutation, &self.config.farm)
                else {
                    continue;
                };

                if i < retained {
                    // Protected candidates only take moves that keep their AEP.
                    let mut trial = candidate.layout.clone();
                    trial.set(turbine, x, y);
                    let aep = self.evaluator.evaluate(&trial)?;
                    self.evaluations += 1;
                    if aep >= candidate.aep {
                        candidate.layout = trial;
                        candidate.aep = aep;
                        moved = true;
                    }
                } else {
                    candidate.layout.set(turbine, x, y);
                    moved = true;
                }
            }
            if moved {
                candidate.parents = vec![candidate.id];
                candidate.id = self.next_id();
                candidate.generation = self.generation + 1;
            }
        }
        Ok(())
    }

    /// Rank the population and append this generation to the history.
    fn record(&mut self) {
        rank(&mut self.population);
        let Some(leader) = self.population.first() else {
            return;
        };

        let generation_best = leader.aep;
        let avg = self.population.iter().map(|c| c.aep).sum::<f64>() / self.population.len() as f64;

        self.regressed = self
            .history
            .best_aep
            .last()
            .is_some_and(|&previous| generation_best < previous);
        if self.regressed {
            log::warn!(
                "best AEP regressed in generation {}: {:.6} < {:.6} GWh",
                self.generation,
                generation_best,
                self.history.best_aep.last().copied().unwrap_or_default()
            );
            self.history.regressions.push(self.generation);
        }

        self.history.best_aep.push(generation_best);
        self.history.avg_aep.push(avg);
        self.archive.record(self.generation, leader.to_snapshot());

        if self.best.as_ref().is_none_or(|b| generation_best > b.aep) {
            self.best = Some(leader.clone());
        }

        log::info!(
            "generation {}: best AEP {:.6} GWh, mean {:.6} GWh",
            self.generation,
            generation_best,
            avg
        );
    }

    /// Get current progress.
    pub fn progress(&self) -> EvolutionProgress {
        EvolutionProgress {
            generation: self.generation,
            total_generations: self.config.population.max_generations,
            best_aep: self.best.as_ref().map_or(f64::NEG_INFINITY, |b| b.aep),
            generation_best: self.history.best_aep.last().copied().unwrap_or(f64::NEG_INFINITY),
            avg_aep: self.history.avg_aep.last().copied().unwrap_or(0.0),
            regressed: self.regressed,
            fallback_offspring: self.generation_fallbacks,
            best_candidate: self.population.first().map(Candidate::to_snapshot),
        }
    }

    /// Check if evolution should stop.
    fn should_stop(&self) -> Option<StopReason> {
        if self.cancelled.load(Ordering::Relaxed) {
            return Some(StopReason::Cancelled);
        }

        if self.generation >= self.config.population.max_generations {
            return Some(StopReason::MaxGenerations);
        }

        None
    }

    /// Run evolution with progress callback.
    pub fn run_with_callback<F>(&mut self, mut callback: F) -> Result<EvolutionResult, SearchError>
    where
        F: FnMut(&EvolutionProgress),
    {
        let start_time = std::time::Instant::now();

        self.initialize()?;
        callback(&self.progress());

        let stop_reason = loop {
            if let Some(reason) = self.should_stop() {
                break reason;
            }

            self.step_generation()?;
            callback(&self.progress());
        };

        let elapsed = start_time.elapsed().as_secs_f64();
        let best = self.best.as_ref().ok_or(SearchError::NotInitialized)?;

        Ok(EvolutionResult {
            best: best.to_snapshot(),
            stats: EvolutionStats {
                generations: self.generation,
                total_evaluations: self.evaluations,
                best_aep: best.aep,
                final_avg_aep: self.history.avg_aep.last().copied().unwrap_or(0.0),
                elapsed_seconds: elapsed,
                evaluations_per_second: self.evaluations as f64 / elapsed.max(f64::EPSILON),
                fallback_offspring: self.total_fallbacks,
                stop_reason,
            },
            history: self.history.clone(),
        })
    }

    /// Run evolution (blocking).
    pub fn run(&mut self) -> Result<EvolutionResult, SearchError> {
        self.run_with_callback(|_| {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::validate;
    use crate::compute::wake::fixtures::{grid_layout, small_context};
    use crate::schema::{MutationConfig, PopulationConfig, SelectionConfig, TURBINE_COUNT};

    fn small_config(size: usize, generations: usize) -> EvolutionConfig {
        EvolutionConfig {
            population: PopulationConfig {
                size,
                max_generations: generations,
            },
            selection: SelectionConfig {
                offspring_fraction: 0.8,
                tournament_size: 3,
            },
            random_seed: Some(42),
            ..Default::default()
        }
    }

    fn engine(config: EvolutionConfig) -> EvolutionEngine {
        EvolutionEngine::new(config, Arc::new(small_context())).unwrap()
    }

    #[test]
    fn test_evolution_engine_creation() {
        let mut engine = engine(small_config(10, 5));
        engine.initialize().unwrap();

        assert_eq!(engine.population().len(), 10);
        assert_eq!(engine.history().best_aep.len(), 1);
        assert!(engine.population().windows(2).all(|w| w[0].aep >= w[1].aep));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = small_config(10, 5);
        let config = EvolutionConfig {
            selection: SelectionConfig {
                tournament_size: 11,
                ..config.selection
            },
            ..config
        };
        let result = EvolutionEngine::new(config, Arc::new(small_context()));
        assert!(matches!(result, Err(SearchError::Config(_))));
    }

    #[test]
    fn test_step_before_initialize() {
        let mut engine = engine(small_config(10, 5));
        assert!(matches!(
            engine.step_generation(),
            Err(SearchError::NotInitialized)
        ));
    }

    #[test]
    fn test_evolution_run() {
        let mut engine = engine(small_config(10, 4));
        let mut reports = 0;
        let result = engine.run_with_callback(|_| reports += 1).unwrap();

        assert_eq!(result.stats.generations, 4);
        assert_eq!(result.stats.stop_reason, StopReason::MaxGenerations);
        assert_eq!(result.history.best_aep.len(), 5);
        assert_eq!(reports, 5);
        assert_eq!(engine.archive().len(), 5);
        assert_eq!(result.best.layout.len(), TURBINE_COUNT);
        assert!(result.stats.total_evaluations >= 10 * 5);
    }

    #[test]
    fn test_best_aep_never_regresses() {
        let mut engine = engine(small_config(12, 6));
        let result = engine.run().unwrap();

        assert!(result.history.regressions.is_empty());
        assert!(result.history.best_aep.windows(2).all(|w| w[1] >= w[0]));
        assert_eq!(result.stats.best_aep, *result.history.best_aep.last().unwrap());
    }

    #[test]
    fn test_population_stays_feasible() {
        let config = small_config(10, 3);
        let farm = config.farm.clone();
        let mut engine = engine(config);
        engine.run().unwrap();

        for candidate in engine.population() {
            assert_eq!(candidate.layout.len(), TURBINE_COUNT);
            assert!(
                validate(&candidate.layout, &farm.boundary, farm.turbine.diameter).is_satisfied()
            );
        }
    }

    #[test]
    fn test_seed_layouts_used() {
        let seed = grid_layout(420.0);
        let mut engine = engine(small_config(6, 0)).with_seed_layouts(vec![seed.clone()]);
        let result = engine.run().unwrap();

        assert_eq!(result.stats.generations, 0);
        assert_eq!(engine.population().len(), 6);
        assert!(engine.population().iter().any(|c| c.layout == seed));
    }

    #[test]
    fn test_greedy_elites_keep_monotonic() {
        let config = EvolutionConfig {
            mutation: MutationConfig {
                greedy_elites: true,
                retained: 2,
                ..Default::default()
            },
            ..small_config(10, 4)
        };
        let mut engine = engine(config);
        let result = engine.run().unwrap();
        assert!(result.history.best_aep.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn test_mutation_spares_best_and_moves_others() {
        let mut engine = engine(small_config(10, 5));
        engine.initialize().unwrap();
        let farm = engine.config.farm.clone();

        let mut changed = 0;
        for _ in 0..5 {
            let before = engine.population().to_vec();
            let mut next = before.clone();
            engine.mutate(&mut next).unwrap();

            assert_eq!(next[0].layout, before[0].layout);
            assert_eq!(next[0].id, before[0].id);

            for (after, prior) in next.iter().zip(&before).skip(1) {
                if after.layout != prior.layout {
                    changed += 1;
                    assert_ne!(after.id, prior.id);
                    assert_eq!(after.parents, vec![prior.id]);
                    assert!(
                        validate(&after.layout, &farm.boundary, farm.turbine.diameter)
                            .is_satisfied()
                    );
                }
            }
        }
        assert!(changed > 0);
    }

    #[test]
    fn test_greedy_elites_never_lose_aep() {
        let retained = 3;
        let config = EvolutionConfig {
            mutation: MutationConfig {
                greedy_elites: true,
                retained,
                ..Default::default()
            },
            ..small_config(10, 5)
        };
        let mut engine = engine(config);
        engine.initialize().unwrap();

        for _ in 0..5 {
            let before = engine.population().to_vec();
            let mut next = before.clone();
            engine.mutate(&mut next).unwrap();

            for (after, prior) in next.iter().zip(&before).take(retained) {
                assert!(after.aep >= prior.aep);
                assert_eq!(after.aep, engine.evaluator.evaluate(&after.layout).unwrap());
                if after.layout != prior.layout {
                    assert_ne!(after.id, prior.id);
                    assert_eq!(after.parents, vec![prior.id]);
                } else {
                    assert_eq!(after.id, prior.id);
                }
            }
        }
    }

    #[test]
    fn test_infeasible_farm_fails_initialization() {
        let mut config = small_config(6, 3);
        config.farm.min_separation = 3000.0;
        config.farm.max_placement_attempts = 50;

        let mut seeding = engine(config.clone());
        assert!(matches!(
            seeding.initialize(),
            Err(SearchError::Placement(PlacementError::CouldNotPlace { attempts: 50, .. }))
        ));

        let mut running = engine(config);
        assert!(matches!(running.run(), Err(SearchError::Placement(_))));
        assert!(running.population().is_empty());
    }

    #[test]
    fn test_cancellation() {
        let mut engine = engine(small_config(6, 100));
        let cancel = engine.cancel_handle();

        // Cancel immediately
        cancel.store(true, Ordering::Relaxed);

        let result = engine.run().unwrap();
        assert_eq!(result.stats.stop_reason, StopReason::Cancelled);
        assert_eq!(result.stats.generations, 0);
    }
}
