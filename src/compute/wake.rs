//! Jensen wake model and annual energy production.
//!
//! For every wind instance the farm is rotated into a downwind/crosswind
//! frame, each turbine collects the wake deficits of all turbines upstream
//! of it (root-sum-square superposition), and the resulting effective speed
//! is mapped to power through the power curve.

use crate::schema::{PowerCurve, TURBINE_COUNT, TurbineLayout};

use super::{WindHistogram, WindInstance, bin_boundaries, nearest_index, nearest_index_with};

/// Wake decay constant (linear cone expansion per metre downwind).
pub const WAKE_DECAY: f64 = 0.05;

/// Hours in a (non-leap) year.
pub const HOURS_PER_YEAR: f64 = 8760.0;

/// Immutable wind and turbine data shared by all AEP evaluations.
///
/// Per-instance values are stored column-wise so the evaluation loops run
/// over flat slices.
#[derive(Debug, Clone)]
pub struct WindModelContext {
    radius: f64,
    curve: PowerCurve,
    boundaries: Vec<f64>,
    speeds: Vec<f64>,
    probabilities: Vec<f64>,
    cos_dir: Vec<f64>,
    sin_dir: Vec<f64>,
    /// `1 - sqrt(1 - Ct)` at each instance's freestream speed.
    wake_strength: Vec<f64>,
}

impl WindModelContext {
    /// Build the context from a binned wind resource.
    pub fn new(turbine_radius: f64, curve: PowerCurve, histogram: &WindHistogram) -> Self {
        Self::from_instances(turbine_radius, curve, &histogram.instances())
    }

    /// Build the context from explicit wind instances.
    pub fn from_instances(turbine_radius: f64, curve: PowerCurve, instances: &[WindInstance]) -> Self {
        let speeds: Vec<f64> = instances.iter().map(|w| w.speed).collect();
        let probabilities = instances.iter().map(|w| w.probability).collect();

        // Rotate so the wind flows along +x.
        let angles: Vec<f64> = instances
            .iter()
            .map(|w| (w.direction - 90.0).to_radians())
            .collect();
        let cos_dir = angles.iter().map(|a| a.cos()).collect();
        let sin_dir = angles.iter().map(|a| a.sin()).collect();

        let wake_strength = nearest_index(curve.speeds(), &speeds)
            .into_iter()
            .map(|idx| 1.0 - (1.0 - curve.thrust_at(idx)).sqrt())
            .collect();

        let boundaries = bin_boundaries(curve.speeds());

        Self {
            radius: turbine_radius,
            curve,
            boundaries,
            speeds,
            probabilities,
            cos_dir,
            sin_dir,
            wake_strength,
        }
    }

    /// Rotor radius (m).
    #[inline]
    pub fn turbine_radius(&self) -> f64 {
        self.radius
    }

    /// Power curve used for lookups.
    #[inline]
    pub fn power_curve(&self) -> &PowerCurve {
        &self.curve
    }

    /// Number of wind instances.
    #[inline]
    pub fn instance_count(&self) -> usize {
        self.speeds.len()
    }

    /// Power output (MW) at wind speed `speed`.
    #[inline]
    pub fn power_at_speed(&self, speed: f64) -> f64 {
        self.curve.power_at(nearest_index_with(&self.boundaries, speed))
    }

    /// AEP (GWh) of a single unwaked turbine.
    pub fn freestream_aep_per_turbine(&self) -> f64 {
        let energy: f64 = self
            .speeds
            .iter()
            .zip(&self.probabilities)
            .map(|(&s, &p)| self.power_at_speed(s) * p)
            .sum();
        HOURS_PER_YEAR * energy / 1e3
    }
}

/// Errors raised by the AEP evaluator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AepError {
    #[error("Layout has {found} turbines, expected {expected}")]
    TurbineCount { expected: usize, found: usize },
}

/// Jensen deficit of an upstream turbine on a turbine `x` m downwind and `y` m
/// crosswind of it.
#[inline]
pub fn wake_deficit(x: f64, y: f64, radius: f64, strength: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    let cone = radius + WAKE_DECAY * x;
    if y > cone {
        return 0.0;
    }
    let ratio = radius / cone;
    strength * ratio * ratio
}

/// Annual energy production (GWh) of `layout` under the wind resource in `context`.
pub fn compute_aep(layout: &TurbineLayout, context: &WindModelContext) -> Result<f64, AepError> {
    let n = layout.len();
    if n != TURBINE_COUNT {
        return Err(AepError::TurbineCount {
            expected: TURBINE_COUNT,
            found: n,
        });
    }

    let m = context.instance_count();
    let radius = context.radius;

    // Downwind and crosswind coordinates, [instance * n + turbine].
    let mut downwind = vec![0.0f64; m * n];
    let mut crosswind = vec![0.0f64; m * n];
    for (k, (&c, &s)) in context.cos_dir.iter().zip(&context.sin_dir).enumerate() {
        let row = k * n;
        for (t, &[x, y]) in layout.positions().iter().enumerate() {
            downwind[row + t] = c * x - s * y;
            crosswind[row + t] = s * x + c * y;
        }
    }

    let mut energy = 0.0f64;
    for k in 0..m {
        let down = &downwind[k * n..(k + 1) * n];
        let cross = &crosswind[k * n..(k + 1) * n];
        let strength = context.wake_strength[k];
        let speed = context.speeds[k];

        let farm_power: f64 = (0..n)
            .map(|i| {
                let deficit_sq: f64 = (0..n)
                    .map(|j| {
                        let d = wake_deficit(down[i] - down[j], (cross[i] - cross[j]).abs(), radius, strength);
                        d * d
                    })
                    .sum();
                context.power_at_speed(speed * (1.0 - deficit_sq.sqrt()))
            })
            .sum();

        energy += farm_power * context.probabilities[k];
    }

    // MWh to GWh.
    Ok(HOURS_PER_YEAR * energy / 1e3)
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::schema::WindSample;
    use proptest::prelude::*;

    #[test]
    fn test_wake_deficit_cone() {
        // Upstream or alongside: no deficit.
        assert_eq!(wake_deficit(-100.0, 0.0, 50.0, 0.5), 0.0);
        assert_eq!(wake_deficit(0.0, 0.0, 50.0, 0.5), 0.0);
        // 1000 m downwind the cone radius is 100 m.
        let inside = wake_deficit(1000.0, 100.0, 50.0, 0.5);
        assert!((inside - 0.125).abs() < 1e-12);
        assert_eq!(wake_deficit(1000.0, 100.1, 50.0, 0.5), 0.0);
    }

    #[test]
    fn test_rejects_wrong_turbine_count() {
        let context = small_context();
        let layout = TurbineLayout::new(vec![[100.0, 100.0]; 49]);
        assert_eq!(
            compute_aep(&layout, &context),
            Err(AepError::TurbineCount {
                expected: 50,
                found: 49
            })
        );
    }

    #[test]
    fn test_single_direction_crosswind_row() {
        let power = 2.5;
        let histogram = WindHistogram::from_samples(&[WindSample::new(0.0, 10.0)]);
        let context = WindModelContext::new(50.0, flat_curve(power), &histogram);
        assert_eq!(context.instance_count(), 1);

        // Wind from the north; the row runs east-west.
        let layout = TurbineLayout::new(
            (0..TURBINE_COUNT)
                .map(|i| [i as f64 * 1000.0, 2000.0])
                .collect(),
        );
        let aep = compute_aep(&layout, &context).unwrap();
        let expected = HOURS_PER_YEAR * TURBINE_COUNT as f64 * power / 1000.0;
        assert!((aep - expected).abs() < 1e-9 * expected);
    }

    #[test]
    fn test_far_apart_matches_freestream() {
        let context = small_context();
        let layout = grid_layout(1.0e6);
        let aep = compute_aep(&layout, &context).unwrap();
        let expected = TURBINE_COUNT as f64 * context.freestream_aep_per_turbine();
        assert!(expected > 0.0);
        assert!((aep - expected).abs() < 1e-9 * expected);
    }

    #[test]
    fn test_wakes_reduce_aep() {
        let context = small_context();
        let dense = compute_aep(&grid_layout(400.0), &context).unwrap();
        let sparse = compute_aep(&grid_layout(1.0e6), &context).unwrap();
        assert!(dense < sparse);
    }

    #[test]
    fn test_aligned_pair_downwind_is_waked() {
        // Wind along the x axis.
        let histogram = WindHistogram::from_samples(&[WindSample::new(270.0, 9.0)]);
        let context = WindModelContext::new(50.0, reference_curve(), &histogram);

        let mut positions: Vec<[f64; 2]> = (0..TURBINE_COUNT)
            .map(|i| [0.0, i as f64 * 10_000.0])
            .collect();
        let free = compute_aep(&TurbineLayout::new(positions.clone()), &context).unwrap();

        // Line turbine 1 up with turbine 0 along the wind, 500 m apart.
        positions[1] = [500.0, 0.0];
        let waked = compute_aep(&TurbineLayout::new(positions), &context).unwrap();
        assert!(waked < free);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_aep_invariant_under_relabeling(
            coords in prop::collection::vec((50.0f64..3950.0, 50.0f64..3950.0), TURBINE_COUNT),
            order in Just((0..TURBINE_COUNT).collect::<Vec<usize>>()).prop_shuffle(),
        ) {
            let context = small_context();
            let layout = TurbineLayout::new(coords.iter().map(|&(x, y)| [x, y]).collect());
            let permuted = TurbineLayout::new(order.iter().map(|&i| layout.position(i)).collect());

            let a = compute_aep(&layout, &context).unwrap();
            let b = compute_aep(&permuted, &context).unwrap();
            prop_assert!((a - b).abs() <= 1e-9 * a.abs().max(1.0));
        }
    }
}
