//! Trains an RBF network on a recorded dataset and prints the fitted
//! parameter vector as JSON.
//!
//! ```text
//! rbfn-train <dataset.txt> [config.json]
//! ```
//!
//! Set `RUST_LOG=info` (or `debug` for per-iteration lines) to see the
//! library's log output.

use std::env;
use std::fs;
use std::process;

use log::{info, warn};
use rbfn_swarm::{SwarmError, SwarmOptimizer, TrainingConfig, TrainingDataset, TrainingEvent};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <dataset.txt> [config.json]", args[0]);
        process::exit(1);
    }

    if let Err(e) = run(&args[1], args.get(2).map(String::as_str)) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn load_config(path: Option<&str>) -> Result<TrainingConfig, SwarmError> {
    let Some(path) = path else {
        return Ok(TrainingConfig::default());
    };
    let text = fs::read_to_string(path)?;
    let config: TrainingConfig = serde_json::from_str(&text)
        .map_err(|e| SwarmError::parse(e.line(), e.to_string()))?;
    config.validate()?;
    Ok(config)
}

fn run(dataset_path: &str, config_path: Option<&str>) -> Result<(), SwarmError> {
    let dataset = TrainingDataset::from_path(dataset_path)?;
    let config = load_config(config_path)?;
    let iterations = config.iteration_count;
    info!(
        "loaded {} samples of dimension {} from {dataset_path}",
        dataset.len(),
        dataset.input_dim()
    );

    let optimizer = SwarmOptimizer::new(dataset, config)?;
    let (handle, events) = optimizer.start_with_channel()?;

    for event in events {
        match event {
            TrainingEvent::IterationStart(i) => {
                eprint!("\riteration {}/{iterations}", i + 1);
            }
            TrainingEvent::IterationSummary {
                mean_error,
                iteration_best_error,
                all_time_best_error,
            } => {
                eprint!(
                    "  mean {mean_error:.4}  best {iteration_best_error:.4}  all-time {all_time_best_error:.4}"
                );
            }
            TrainingEvent::Log(message) => eprintln!("\n{message}"),
            TrainingEvent::Busy => eprintln!(),
            TrainingEvent::CandidateError(_) | TrainingEvent::ModelReady(_) => {}
        }
    }

    let report = handle.join()?;
    if report.iterations_completed < iterations {
        warn!(
            "run stopped after {} of {iterations} iterations",
            report.iterations_completed
        );
    }

    let params = serde_json::to_string(report.model.params())
        .map_err(|e| SwarmError::invalid_state(e.to_string()))?;
    println!("{params}");
    Ok(())
}
