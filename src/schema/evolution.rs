//! Evolution configuration types for turbine layout search.
//!
//! Defaults reproduce the reference search: a population of 50 layouts,
//! 90 % of each generation replaced by crossover offspring, tournaments of
//! 40, and 2000 generations.

use serde::{Deserialize, Serialize};

use super::{ConfigError, FarmConfig, TurbineLayout};

/// Top-level configuration for evolutionary layout search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Farm geometry and turbine model.
    #[serde(default)]
    pub farm: FarmConfig,
    /// Population and generation settings.
    #[serde(default)]
    pub population: PopulationConfig,
    /// Elitism and tournament settings.
    #[serde(default)]
    pub selection: SelectionConfig,
    /// Blend crossover settings.
    #[serde(default)]
    pub crossover: CrossoverConfig,
    /// Turbine displacement settings.
    #[serde(default)]
    pub mutation: MutationConfig,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl EvolutionConfig {
    /// Number of crossover offspring per generation (`floor(size * fraction)`).
    pub fn offspring_count(&self) -> usize {
        let raw = self.population.size as f64 * self.selection.offspring_fraction;
        // Guard against 50 * 0.9 landing just under 45.
        ((raw + 1e-9).floor() as usize).min(self.population.size)
    }

    /// Number of elites copied forward unchanged.
    pub fn elite_count(&self) -> usize {
        self.population.size - self.offspring_count()
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.farm.validate()?;

        let size = self.population.size;
        if size < 2 {
            return Err(ConfigError::PopulationTooSmall(size));
        }
        let fraction = self.selection.offspring_fraction;
        if !(0.0..1.0).contains(&fraction) {
            return Err(ConfigError::InvalidOffspringFraction(fraction));
        }
        let tournament = self.selection.tournament_size;
        if tournament == 0 || tournament > size {
            return Err(ConfigError::InvalidTournament {
                tournament,
                population: size,
            });
        }

        let (lo, hi) = self.crossover.blend_bounds;
        if !(lo < hi) {
            return Err(ConfigError::InvalidBounds(lo, hi));
        }
        if self.crossover.tries_retaining_parents == 0 {
            return Err(ConfigError::ZeroAttempts("tries_retaining_parents"));
        }

        let m = &self.mutation;
        if !(m.step > 0.0) {
            return Err(ConfigError::InvalidMutationStep(m.step));
        }
        if m.max_tries == 0 {
            return Err(ConfigError::ZeroAttempts("mutation.max_tries"));
        }
        if m.retained > size {
            return Err(ConfigError::InvalidRetained {
                retained: m.retained,
                population: size,
            });
        }
        for (lo, hi) in [m.individual_trigger_bounds, m.turbine_trigger_bounds] {
            if !(lo < hi) {
                return Err(ConfigError::InvalidBounds(lo, hi));
            }
        }
        Ok(())
    }
}

/// Population configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Population size (mu).
    #[serde(default = "default_population_size")]
    pub size: usize,
    /// Number of generations to run.
    #[serde(default = "default_max_generations")]
    pub max_generations: usize,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: default_population_size(),
            max_generations: default_max_generations(),
        }
    }
}

fn default_population_size() -> usize {
    50
}
fn default_max_generations() -> usize {
    2000
}

/// Selection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Fraction of the population replaced by offspring each generation (x).
    #[serde(default = "default_offspring_fraction")]
    pub offspring_fraction: f64,
    /// Candidates sampled per tournament (c).
    #[serde(default = "default_tournament_size")]
    pub tournament_size: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            offspring_fraction: default_offspring_fraction(),
            tournament_size: default_tournament_size(),
        }
    }
}

fn default_offspring_fraction() -> f64 {
    0.9
}
fn default_tournament_size() -> usize {
    40
}

/// Crossover configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossoverConfig {
    /// Range of the affine blend coefficient `a` in `a*p0 + (1-a)*p1`.
    #[serde(default = "default_blend_bounds")]
    pub blend_bounds: (f64, f64),
    /// Attempts per turbine before the parents are redrawn.
    #[serde(default = "default_tries_retaining_parents")]
    pub tries_retaining_parents: usize,
    /// Parent redraws before falling back to a random layout.
    #[serde(default = "default_tries_changing_parents")]
    pub tries_changing_parents: usize,
}

impl Default for CrossoverConfig {
    fn default() -> Self {
        Self {
            blend_bounds: default_blend_bounds(),
            tries_retaining_parents: default_tries_retaining_parents(),
            tries_changing_parents: default_tries_changing_parents(),
        }
    }
}

fn default_blend_bounds() -> (f64, f64) {
    (-5.0, 5.0)
}
fn default_tries_retaining_parents() -> usize {
    50
}
fn default_tries_changing_parents() -> usize {
    20
}

/// Mutation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationConfig {
    /// Displacement scale Dm (m); each axis moves by `Dm * (r1 - r2)`.
    #[serde(default = "default_mutation_step")]
    pub step: f64,
    /// Attempts to find a feasible displacement per turbine.
    #[serde(default = "default_mutation_tries")]
    pub max_tries: usize,
    /// Number of top-ranked candidates protected from mutation.
    #[serde(default = "default_retained")]
    pub retained: usize,
    /// Range of the per-candidate trigger `pm1`.
    #[serde(default = "default_trigger_bounds")]
    pub individual_trigger_bounds: (f64, f64),
    /// Range of the per-turbine trigger `pm2`.
    #[serde(default = "default_trigger_bounds")]
    pub turbine_trigger_bounds: (f64, f64),
    /// Also mutate protected candidates, keeping only moves that do not lower AEP.
    #[serde(default)]
    pub greedy_elites: bool,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            step: default_mutation_step(),
            max_tries: default_mutation_tries(),
            retained: default_retained(),
            individual_trigger_bounds: default_trigger_bounds(),
            turbine_trigger_bounds: default_trigger_bounds(),
            greedy_elites: false,
        }
    }
}

fn default_mutation_step() -> f64 {
    400.0
}
fn default_mutation_tries() -> usize {
    100
}
fn default_retained() -> usize {
    1
}
fn default_trigger_bounds() -> (f64, f64) {
    (0.0, 2.0)
}

/// Serializable view of a candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSnapshot {
    /// Unique identifier.
    pub id: u64,
    /// Annual energy production (GWh).
    pub aep: f64,
    /// Turbine positions.
    pub layout: TurbineLayout,
    /// Generation created.
    pub generation: usize,
    /// Parent IDs.
    pub parents: Vec<u64>,
}

/// Per-generation record of the search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvolutionHistory {
    /// Best AEP of each generation (index 0 is the initial population).
    pub best_aep: Vec<f64>,
    /// Mean AEP of each generation.
    pub avg_aep: Vec<f64>,
    /// Generations whose best AEP fell below the previous generation's.
    pub regressions: Vec<usize>,
}

/// Progress report passed to callbacks.
#[derive(Debug, Clone)]
pub struct EvolutionProgress {
    /// Current generation.
    pub generation: usize,
    /// Configured number of generations.
    pub total_generations: usize,
    /// Best AEP seen over the whole run.
    pub best_aep: f64,
    /// Best AEP of the current generation.
    pub generation_best: f64,
    /// Mean AEP of the current generation.
    pub avg_aep: f64,
    /// True when the generation best dropped below the previous one.
    pub regressed: bool,
    /// Offspring of this generation that fell back to random layouts.
    pub fallback_offspring: usize,
    /// Best candidate of the current generation.
    pub best_candidate: Option<CandidateSnapshot>,
}

/// Why the search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// Configured generation count reached.
    MaxGenerations,
    /// Cancellation flag raised.
    Cancelled,
}

/// Summary statistics of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionStats {
    pub generations: usize,
    pub total_evaluations: u64,
    pub best_aep: f64,
    pub final_avg_aep: f64,
    pub elapsed_seconds: f64,
    pub evaluations_per_second: f64,
    pub fallback_offspring: usize,
    pub stop_reason: StopReason,
}

/// Final result of a search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionResult {
    /// Best candidate found.
    pub best: CandidateSnapshot,
    /// Run statistics.
    pub stats: EvolutionStats,
    /// Per-generation history.
    pub history: EvolutionHistory,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_split() {
        let config = EvolutionConfig::default();
        assert_eq!(config.offspring_count(), 45);
        assert_eq!(config.elite_count(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_tournament_larger_than_population() {
        let config = EvolutionConfig {
            population: PopulationConfig {
                size: 10,
                max_generations: 1,
            },
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTournament { tournament: 40, .. })
        ));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "population": { "size": 20 }, "selection": { "tournament_size": 8 } }"#;
        let config: EvolutionConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.population.size, 20);
        assert_eq!(config.population.max_generations, 2000);
        assert_eq!(config.mutation.step, 400.0);
        assert_eq!(config.offspring_count(), 18);
        assert!(config.validate().is_ok());
    }
}
