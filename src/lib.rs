//! # rbfn-swarm - RBF networks trained by particle swarm optimisation
//!
//! Fits a Gaussian radial basis function network to recorded
//! `(sensor readings, steering angle)` samples by running a particle swarm
//! over its flat parameter vector.
//!
//! ## Architecture
//! - [`Rbfn`]: stateless forward pass over a parameter vector
//! - [`Candidate`]: one swarm member with position, velocity and personal best
//! - [`SwarmOptimizer`]: iteration loop, parallel evaluation, progress events
//!
//! ## Usage
//! ```rust,ignore
//! use rbfn_swarm::{EventLog, SwarmOptimizer, TrainingConfig, TrainingDataset};
//!
//! let dataset = TrainingDataset::from_path("train4dAll.txt")?;
//! let config = TrainingConfig::builder().iteration_count(50).seed(7).build()?;
//!
//! let mut optimizer = SwarmOptimizer::new(dataset, config)?;
//! let mut events = EventLog::new();
//! let report = optimizer.run(&mut events)?;
//!
//! let angle = report.model.predict(&[22.0, 8.5, 8.5])?;
//! ```

pub mod candidate;
pub mod config;
pub mod dataset;
pub mod error;
pub mod evaluator;
pub mod observer;
pub mod rbfn;
pub mod swarm;

// Re-exports
pub use candidate::{Candidate, Evaluation};
pub use config::{
    ConfigError, TrainingConfig, TrainingConfigBuilder, DEGENERATE_FITNESS, SD_FLOOR,
    STEERING_RANGE,
};
pub use dataset::{TrainingDataset, TrainingSample};
pub use error::{SwarmError, SwarmResult};
pub use evaluator::{EvaluationBackend, SequentialBackend, WorkerPool};
pub use observer::{EventLog, NullObserver, ProgressObserver, TrainingEvent};
pub use rbfn::{FittedRbfn, ParamLayout, Rbfn};
pub use swarm::{BestSnapshot, RunReport, RunState, StopToken, SwarmOptimizer, TrainingHandle};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
