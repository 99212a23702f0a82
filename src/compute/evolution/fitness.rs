//! AEP fitness evaluation for candidate layouts.
//!
//! Each evaluation is a pure function of the layout and the shared
//! [`WindModelContext`], so a whole population is scored in parallel.

use std::sync::Arc;

use rayon::prelude::*;

use crate::compute::{AepError, WindModelContext, compute_aep};
use crate::schema::TurbineLayout;

use super::search::Candidate;

/// Scores layouts against a shared wind model.
#[derive(Debug, Clone)]
pub struct FitnessEvaluator {
    context: Arc<WindModelContext>,
}

impl FitnessEvaluator {
    /// Create a new fitness evaluator.
    pub fn new(context: Arc<WindModelContext>) -> Self {
        Self { context }
    }

    /// Shared wind model.
    pub fn context(&self) -> &WindModelContext {
        &self.context
    }

    /// AEP (GWh) of a single layout.
    pub fn evaluate(&self, layout: &TurbineLayout) -> Result<f64, AepError> {
        compute_aep(layout, &self.context)
    }

    /// Recompute the AEP of every candidate in parallel.
    pub fn evaluate_population(&self, population: &mut [Candidate]) -> Result<(), AepError> {
        let context = &self.context;
        population.par_iter_mut().try_for_each(|candidate| {
            candidate.aep = compute_aep(&candidate.layout, context)?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::wake::fixtures::{grid_layout, small_context};

    fn candidate(id: u64, layout: TurbineLayout) -> Candidate {
        Candidate {
            id,
            layout,
            aep: 0.0,
            generation: 0,
            parents: Vec::new(),
        }
    }

    #[test]
    fn test_population_matches_single_evaluations() {
        let evaluator = FitnessEvaluator::new(Arc::new(small_context()));
        let layouts: Vec<TurbineLayout> = [400.0, 420.0, 900.0, 1.0e5]
            .iter()
            .map(|&s| grid_layout(s))
            .collect();
        let mut population: Vec<Candidate> = layouts
            .iter()
            .enumerate()
            .map(|(i, l)| candidate(i as u64, l.clone()))
            .collect();

        evaluator.evaluate_population(&mut population).unwrap();

        for (candidate, layout) in population.iter().zip(&layouts) {
            assert_eq!(candidate.aep, evaluator.evaluate(layout).unwrap());
            assert!(candidate.aep > 0.0);
        }
    }

    #[test]
    fn test_population_error_propagates() {
        let evaluator = FitnessEvaluator::new(Arc::new(small_context()));
        let mut population = vec![
            candidate(0, grid_layout(500.0)),
            candidate(1, TurbineLayout::new(vec![[0.0, 0.0]; 3])),
        ];
        assert!(evaluator.evaluate_population(&mut population).is_err());
    }
}
