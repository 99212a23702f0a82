//! Layout manipulation utilities for evolutionary search.
//!
//! Provides random generation, blend crossover, and turbine displacement.
//! Every retry loop is capped; exhausting a cap is reported as a
//! [`PlacementError`] or as a fallback the caller can observe.

use rand::prelude::*;
use rand::seq::index;
use rand_distr::Uniform;

use crate::schema::{CrossoverConfig, FarmConfig, MutationConfig, TURBINE_COUNT, TurbineLayout};

/// A turbine could not be placed within the attempt cap.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    #[error("Could not place turbine {turbine} after {attempts} attempts")]
    CouldNotPlace { turbine: usize, attempts: usize },
}

/// How a crossover offspring was produced.
#[derive(Debug, Clone)]
pub struct Offspring {
    /// The child layout.
    pub layout: TurbineLayout,
    /// Mating pool slots of the last parent pair used (empty on fallback).
    pub parents: Vec<usize>,
    /// True if crossover gave up and a random layout was generated instead.
    pub fallback: bool,
}

/// Per-pass mutation triggers.
///
/// One candidate mutates when `individual_threshold < individual_trigger[i]`,
/// one of its turbines when `turbine_threshold < turbine_trigger[i][t]`. The
/// thresholds are drawn once for the whole pass.
#[derive(Debug, Clone)]
pub struct MutationPlan {
    pub individual_threshold: f64,
    pub turbine_threshold: f64,
    pub individual_trigger: Vec<f64>,
    pub turbine_trigger: Vec<Vec<f64>>,
}

impl MutationPlan {
    /// True if candidate `idx` takes part in this pass.
    #[inline]
    pub fn mutates(&self, idx: usize) -> bool {
        self.individual_threshold < self.individual_trigger[idx]
    }

    /// True if turbine `turbine` of candidate `idx` is displaced.
    #[inline]
    pub fn mutates_turbine(&self, idx: usize, turbine: usize) -> bool {
        self.turbine_threshold < self.turbine_trigger[idx][turbine]
    }
}

/// Random number generator wrapper for layout operations.
pub struct LayoutRng {
    rng: StdRng,
}

impl LayoutRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create with random seed.
    pub fn random() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Uniform point in the farm's placement box.
    fn random_point(&mut self, farm: &FarmConfig) -> (f64, f64) {
        let ((x_min, x_max), (y_min, y_max)) = farm.boundary.placement_box();
        (self.rng.gen_range(x_min..x_max), self.rng.gen_range(y_min..y_max))
    }

    /// Generate a random layout by rejection sampling.
    ///
    /// Each turbine is drawn uniformly in the placement box until it clears
    /// every turbine already placed by `farm.min_separation`.
    pub fn random_layout(&mut self, farm: &FarmConfig) -> Result<TurbineLayout, PlacementError> {
        let mut layout = TurbineLayout::new(vec![[0.0, 0.0]; TURBINE_COUNT]);

        for turbine in 0..TURBINE_COUNT {
            let mut placed = false;
            for _ in 0..farm.max_placement_attempts {
                let (x, y) = self.random_point(farm);
                if farm.boundary.admits(x, y)
                    && layout.clear_of(x, y, turbine, None, farm.min_separation)
                {
                    layout.set(turbine, x, y);
                    placed = true;
                    break;
                }
            }
            if !placed {
                return Err(PlacementError::CouldNotPlace {
                    turbine,
                    attempts: farm.max_placement_attempts,
                });
            }
        }

        Ok(layout)
    }

    /// Draw two distinct slots of a mating pool.
    fn pick_parents(&mut self, pool_len: usize) -> (usize, usize) {
        if pool_len < 2 {
            return (0, 0);
        }
        let picked = index::sample(&mut self.rng, pool_len, 2);
        (picked.index(0), picked.index(1))
    }

    /// Blend one coordinate pair of turbine `turbine` from two parents.
    fn blend_turbine(
        &mut self,
        blend: &Uniform<f64>,
        p0: &TurbineLayout,
        p1: &TurbineLayout,
        turbine: usize,
    ) -> (f64, f64) {
        let [x0, y0] = p0.position(turbine);
        let [x1, y1] = p1.position(turbine);
        let a = self.rng.sample(blend);
        let x = a * x0 + (1.0 - a) * x1;
        let b = self.rng.sample(blend);
        let y = b * y0 + (1.0 - b) * y1;
        (x, y)
    }

    /// Produce an offspring by extrapolating blend crossover.
    ///
    /// `pool` must not be empty. When a turbine cannot be placed
    /// after all parent redraws, a random layout is returned instead.
    pub fn crossover(
        &mut self,
        pool: &[&TurbineLayout],
        crossover: &CrossoverConfig,
        farm: &FarmConfig,
    ) -> Result<Offspring, PlacementError> {
        let blend = Uniform::new(crossover.blend_bounds.0, crossover.blend_bounds.1);
        let (mut i0, mut i1) = self.pick_parents(pool.len());
        let mut layout = TurbineLayout::new(vec![[0.0, 0.0]; TURBINE_COUNT]);

        let redraws = crossover.tries_changing_parents;
        let tries = crossover.tries_retaining_parents;

        for turbine in 0..TURBINE_COUNT {
            let mut placed = false;

            'parents: for redraw in 0..=redraws {
                if redraw > 0 {
                    (i0, i1) = self.pick_parents(pool.len());
                }
                for _ in 0..tries {
                    let (x, y) = self.blend_turbine(&blend, pool[i0], pool[i1], turbine);
                    if farm.boundary.admits(x, y)
                        && layout.clear_of(x, y, turbine, None, farm.min_separation)
                    {
                        layout.set(turbine, x, y);
                        placed = true;
                        break 'parents;
                    }
                }
            }

            if !placed {
                log::debug!("crossover gave up on turbine {}, generating random layout", turbine);
                return Ok(Offspring {
                    layout: self.random_layout(farm)?,
                    parents: Vec::new(),
                    fallback: true,
                });
            }
        }

        Ok(Offspring {
            layout,
            parents: vec![i0, i1],
            fallback: false,
        })
    }

    /// Draw the triggers for one mutation pass over `population` candidates.
    pub fn mutation_plan(&mut self, population: usize, mutation: &MutationConfig) -> MutationPlan {
        let individual = Uniform::new(
            mutation.individual_trigger_bounds.0,
            mutation.individual_trigger_bounds.1,
        );
        let per_turbine = Uniform::new(
            mutation.turbine_trigger_bounds.0,
            mutation.turbine_trigger_bounds.1,
        );

        let individual_trigger = (0..population).map(|_| self.rng.sample(individual)).collect();
        let turbine_trigger = (0..population)
            .map(|_| (0..TURBINE_COUNT).map(|_| self.rng.sample(per_turbine)).collect())
            .collect();

        MutationPlan {
            individual_threshold: self.rng.r#gen::<f64>(),
            turbine_threshold: self.rng.r#gen::<f64>(),
            individual_trigger,
            turbine_trigger,
        }
    }

    /// Propose a feasible new position for `turbine`, or `None` after `max_tries`.
    pub fn displace(
        &mut self,
        layout: &TurbineLayout,
        turbine: usize,
        mutation: &MutationConfig,
        farm: &FarmConfig,
    ) -> Option<(f64, f64)> {
        let [x0, y0] = layout.position(turbine);
        for _ in 0..mutation.max_tries {
            let (r1, r2, r3, r4): (f64, f64, f64, f64) = self.rng.r#gen();
            let x = x0 + mutation.step * (r1 - r2);
            let y = y0 + mutation.step * (r3 - r4);
            if farm.boundary.admits(x, y)
                && layout.clear_of(x, y, layout.len(), Some(turbine), farm.min_separation)
            {
                return Some((x, y));
            }
        }
        None
    }

    /// Draw `amount` distinct indices below `len`.
    pub fn sample_indices(&mut self, len: usize, amount: usize) -> Vec<usize> {
        index::sample(&mut self.rng, len, amount.min(len)).into_vec()
    }
}
