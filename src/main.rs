//! Wake Layout CLI - Evaluate and optimize wind farm layouts from JSON configuration.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use wake_layout::{
    compute::{
        WindHistogram, WindModelContext, compute_aep,
        evolution::{EvolutionEngine, load_seed_layouts, save_result},
        validate,
    },
    schema::{RunConfig, TurbineLayout, WindSample, load_power_curve, load_wind_samples},
};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        std::process::exit(1);
    }

    match args[1].as_str() {
        "--example" => print_example_config(),
        "--evaluate" => {
            let (Some(config_path), Some(layout_path)) = (args.get(2), args.get(3)) else {
                print_usage(&args[0]);
                std::process::exit(1);
            };
            let config = load_config(Path::new(config_path));
            evaluate_layout(&config, Path::new(layout_path));
        }
        path => {
            let config = load_config(Path::new(path));
            run_search(&config);
        }
    }
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} <run.json>", program);
    eprintln!("       {} --evaluate <run.json> <layout.csv>", program);
    eprintln!("       {} --example", program);
    eprintln!();
    eprintln!("Optimize a 50-turbine wind farm layout for annual energy production.");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  run.json     Input paths, output paths and search parameters");
    eprintln!("  layout.csv   Saved layout (x,y columns, 50 rows) to evaluate");
    eprintln!();
    eprintln!("Example configuration is generated with --example flag.");
}

fn load_config(path: &Path) -> RunConfig {
    let config_str = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    let config: RunConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = config.evolution.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }
    config
}

fn build_context(config: &RunConfig) -> WindModelContext {
    let curve = load_power_curve(&config.power_curve).unwrap_or_else(|e| {
        eprintln!("Error loading power curve: {}", e);
        std::process::exit(1);
    });

    let mut samples: Vec<WindSample> = Vec::new();
    for path in &config.wind_data {
        let mut file_samples = load_wind_samples(path).unwrap_or_else(|e| {
            eprintln!("Error loading wind data: {}", e);
            std::process::exit(1);
        });
        samples.append(&mut file_samples);
    }

    let histogram = WindHistogram::from_samples(&samples);
    println!(
        "Wind data: {} samples from {} file(s), {} outside the bins",
        histogram.total() as usize + histogram.discarded(),
        config.wind_data.len(),
        histogram.discarded()
    );

    let context = WindModelContext::new(config.evolution.farm.turbine.radius(), curve, &histogram);
    println!("Wind instances: {}", context.instance_count());
    context
}

fn evaluate_layout(config: &RunConfig, layout_path: &Path) {
    let farm = &config.evolution.farm;
    let context = build_context(config);

    let layout = TurbineLayout::load_csv(layout_path).unwrap_or_else(|e| {
        eprintln!("Error loading layout: {}", e);
        std::process::exit(1);
    });

    println!("{}", validate(&layout, &farm.boundary, farm.turbine.diameter));
    match compute_aep(&layout, &context) {
        Ok(aep) => println!("Total power produced by the wind farm is: {:.6} GWh", aep),
        Err(e) => {
            eprintln!("Error computing AEP: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_search(config: &RunConfig) {
    let farm = config.evolution.farm.clone();
    let context = build_context(config);

    let mut engine = EvolutionEngine::new(config.evolution.clone(), Arc::new(context))
        .unwrap_or_else(|e| {
            eprintln!("Error creating search: {}", e);
            std::process::exit(1);
        });

    if let Some(dir) = &config.seed_layouts {
        let layouts = load_seed_layouts(dir).unwrap_or_else(|e| {
            eprintln!("Error loading seed layouts: {}", e);
            std::process::exit(1);
        });
        engine = engine.with_seed_layouts(layouts);
    }

    println!("Wind Farm Layout Search");
    println!("=======================");
    println!("Turbine: {} (D = {} m)", farm.turbine.name, farm.turbine.diameter);
    println!(
        "Population: {} ({} elites, {} offspring)",
        config.evolution.population.size,
        config.evolution.elite_count(),
        config.evolution.offspring_count()
    );
    println!("Generations: {}", config.evolution.population.max_generations);
    println!();

    let result = engine
        .run_with_callback(|progress| {
            if progress.regressed {
                eprint!("\x07");
            }
            println!(
                "  Generation {}/{}: best={:.6} GWh, mean={:.6} GWh",
                progress.generation,
                progress.total_generations,
                progress.generation_best,
                progress.avg_aep
            );
        })
        .unwrap_or_else(|e| {
            eprintln!("Search failed: {}", e);
            std::process::exit(1);
        });

    println!();
    println!("Best AEP per generation:");
    println!("{:?}", result.history.best_aep);
    if !result.history.regressions.is_empty() {
        println!("Regressions at generations: {:?}", result.history.regressions);
    }
    println!();

    let best = &result.best.layout;
    println!("{}", validate(best, &farm.boundary, farm.turbine.diameter));
    println!("Best AEP: {:.6} GWh (generation {})", result.best.aep, result.best.generation);
    println!(
        "Time: {:.2}s ({} evaluations, {:.1} evals/s, {} fallback offspring)",
        result.stats.elapsed_seconds,
        result.stats.total_evaluations,
        result.stats.evaluations_per_second,
        result.stats.fallback_offspring
    );

    if let Err(e) = best.save_csv(&config.output_layout) {
        eprintln!("Error saving layout: {}", e);
        std::process::exit(1);
    }
    println!("Layout written to {}", config.output_layout.display());

    if let Some(path) = &config.output_history {
        if let Err(e) = save_result(path, &result) {
            eprintln!("Error saving history: {}", e);
            std::process::exit(1);
        }
        println!("History written to {}", path.display());
    }

    if let Some(dir) = &config.archive_dir {
        match engine.archive().save_layouts(dir) {
            Ok(paths) => println!("Archived {} layouts in {}", paths.len(), dir.display()),
            Err(e) => {
                eprintln!("Error saving archive: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn print_example_config() {
    let config = RunConfig {
        seed_layouts: Some(PathBuf::from("layouts")),
        ..Default::default()
    };

    println!("Example configuration (run.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing config: {}", e);
            std::process::exit(1);
        }
    }
}
