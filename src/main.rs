//! Grid Evolve CLI - Run an evolutionary search from JSON configuration.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::PathBuf;

use grid_evolve::{
    compute::evolution::{AgentExport, EvolutionEngine, save_agent},
    schema::{EvolutionConfig, SelectionMethod},
};

const DEFAULT_OUTPUT: &str = "best_agent.json";

fn print_usage(program: &str) {
    eprintln!(
        "Usage: {} [config.json] [--selection NAME] [--output PATH]",
        program
    );
    eprintln!();
    eprintln!("Evolve action sequences for the grid world.");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  config.json       Path to evolution configuration (default: built-in defaults)");
    eprintln!("  --selection NAME  adaptive_tournament or rank_based");
    eprintln!(
        "  --output PATH     Where to write the best agent (default: {})",
        DEFAULT_OUTPUT
    );
    eprintln!("  --example         Print the default configuration and exit");
}

fn print_example_config() {
    match serde_json::to_string_pretty(&EvolutionConfig::default()) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing config: {}", e);
            std::process::exit(1);
        }
    }
}

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("grid-evolve");

    let mut config_path: Option<PathBuf> = None;
    let mut selection: Option<SelectionMethod> = None;
    let mut output = PathBuf::from(DEFAULT_OUTPUT);

    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--example" => {
                print_example_config();
                return;
            }
            "--help" | "-h" => {
                print_usage(program);
                return;
            }
            "--selection" => {
                let Some(name) = rest.next() else {
                    eprintln!("--selection requires a value");
                    std::process::exit(1);
                };
                selection = Some(name.parse().unwrap_or_else(|e| {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }));
            }
            "--output" => {
                let Some(path) = rest.next() else {
                    eprintln!("--output requires a value");
                    std::process::exit(1);
                };
                output = PathBuf::from(path);
            }
            other if other.starts_with("--") => {
                eprintln!("Unknown option: {}", other);
                print_usage(program);
                std::process::exit(1);
            }
            other => config_path = Some(PathBuf::from(other)),
        }
    }

    // Load configuration
    let mut config: EvolutionConfig = match &config_path {
        Some(path) => {
            let config_str = fs::read_to_string(path).unwrap_or_else(|e| {
                eprintln!("Error reading config file: {}", e);
                std::process::exit(1);
            });
            serde_json::from_str(&config_str).unwrap_or_else(|e| {
                eprintln!("Error parsing config: {}", e);
                std::process::exit(1);
            })
        }
        None => EvolutionConfig::default(),
    };
    if let Some(selection) = selection {
        config.selection = selection;
    }

    println!("Grid Evolve");
    println!("===========");
    println!(
        "World: {}x{} ({} items, seed {})",
        config.world.width, config.world.height, config.world.item_count, config.world.seed
    );
    println!(
        "Population: {}, Generations: {}, Genome length: {}",
        config.population_size, config.generations, config.genome_length
    );
    println!("Selection: {}", config.selection);
    println!();

    let world = config.world.clone();
    let mut engine = EvolutionEngine::new(config).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    println!("Running evolution...");
    let result = engine.run_with_callback(|report| {
        println!(
            "  Generation {}: best={:.2}, avg={:.2}, items={}, cost={}, unique={}, revisits={}",
            report.generation,
            report.best_fitness,
            report.avg_fitness,
            report.items_collected,
            report.total_movement_cost,
            report.unique_visited,
            report.revisits
        );
    });

    let stats = &result.stats;
    println!();
    println!("Best agent:");
    println!("  Fitness: {:.2}", result.best.fitness);
    println!("  Items collected: {}", result.best.items_collected);
    println!("  Movement cost: {}", result.best.total_movement_cost);
    println!("  Unique positions: {}", result.best.unique_visited);
    println!("  Revisits: {}", result.best.revisits);
    println!("  Actions taken: {}", result.best.actions_taken);
    if result.best.won {
        println!("  Won: cleared every item and explored the whole grid");
    }
    println!();
    println!(
        "Time: {:.2}s ({} evaluations, {:.1} evals/s)",
        stats.elapsed_seconds, stats.total_evaluations, stats.evaluations_per_second
    );

    let export = AgentExport::new(&result.best, &world, stats.generations);
    if let Err(e) = save_agent(&output, &export) {
        eprintln!("Error saving agent: {}", e);
        std::process::exit(1);
    }
    println!("Saved best agent to {}", output.display());
}
