//! Benchmarks for AEP evaluation and the layout search.

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use wake_layout::{
    compute::{
        DIRECTION_BINS, SPEED_BINS, WindHistogram, WindModelContext, compute_aep,
        evolution::{EvolutionEngine, FitnessEvaluator, LayoutRng},
    },
    schema::{
        EvolutionConfig, FarmConfig, PopulationConfig, PowerCurve, PowerCurveRow, SelectionConfig,
        WindSample,
    },
};

fn power_curve() -> PowerCurve {
    let rows: Vec<PowerCurveRow> = (0..=60)
        .map(|i| {
            let v = i as f64 * 0.5;
            let power = if !(3.5..25.0).contains(&v) {
                0.0
            } else {
                (3.0 * ((v - 3.5) / 11.5).powi(3)).min(3.0)
            };
            PowerCurveRow {
                wind_speed: v,
                thrust_coefficient: if v < 3.5 { 0.0 } else { 0.75 },
                power,
            }
        })
        .collect();
    PowerCurve::new(&rows).expect("valid power curve")
}

/// Resource with every direction/speed cell populated.
fn full_context() -> WindModelContext {
    let samples: Vec<WindSample> = (0..DIRECTION_BINS)
        .flat_map(|d| {
            (0..SPEED_BINS).flat_map(move |s| {
                let weight = 1 + (d * 7 + s * 3) % 5;
                std::iter::repeat_n(WindSample::new(d as f64 * 10.0, s as f64 * 2.0 + 1.0), weight)
            })
        })
        .collect();
    let histogram = WindHistogram::from_samples(&samples);
    WindModelContext::new(50.0, power_curve(), &histogram)
}

fn bench_compute_aep(c: &mut Criterion) {
    let context = full_context();
    let layout = LayoutRng::new(7)
        .random_layout(&FarmConfig::default())
        .expect("feasible layout");

    c.bench_function("compute_aep_540_instances", |b| {
        b.iter(|| compute_aep(black_box(&layout), black_box(&context)))
    });
}

fn bench_population_evaluation(c: &mut Criterion) {
    let context = Arc::new(full_context());
    let evaluator = FitnessEvaluator::new(Arc::clone(&context));
    let mut rng = LayoutRng::new(11);
    let farm = FarmConfig::default();
    let layouts: Vec<_> = (0..50)
        .map(|_| rng.random_layout(&farm).expect("feasible layout"))
        .collect();

    c.bench_function("evaluate_50_layouts_sequential", |b| {
        b.iter(|| {
            layouts
                .iter()
                .map(|l| evaluator.evaluate(black_box(l)).unwrap_or(0.0))
                .sum::<f64>()
        })
    });
}

fn bench_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_generation");
    group.sample_size(10);
    let context = Arc::new(full_context());

    for size in [20, 50] {
        let config = EvolutionConfig {
            population: PopulationConfig {
                size,
                max_generations: 1,
            },
            selection: SelectionConfig {
                offspring_fraction: 0.9,
                tournament_size: size * 4 / 5,
            },
            random_seed: Some(42),
            ..Default::default()
        };

        let mut engine = EvolutionEngine::new(config, Arc::clone(&context)).expect("valid config");
        engine.initialize().expect("initial population");

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| engine.step_generation().expect("generation step"));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_compute_aep,
    bench_population_evaluation,
    bench_generation
);
criterion_main!(benches);
