//! Fitness evaluation backends.
//!
//! An [`EvaluationBackend`] scores a batch of parameter vectors against the
//! shared dataset and returns one [`Evaluation`] per vector, in input order.
//! Backends never touch candidate state: the optimizer writes the results
//! back into the population slots itself.
//!
//! [`WorkerPool`] fans the batch out over a fixed-size rayon pool. Every task
//! owns a copy of its parameter vector and reads the dataset by shared
//! reference. Scoring is a pure function, so the pool returns exactly the
//! numbers [`SequentialBackend`] would.

use std::panic::{self, AssertUnwindSafe};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::candidate::Evaluation;
use crate::dataset::TrainingDataset;
use crate::error::{SwarmError, SwarmResult};
use crate::rbfn::Rbfn;

/// Scores batches of parameter vectors.
pub trait EvaluationBackend: Send {
    /// Short name used in log messages.
    fn name(&self) -> &'static str;

    /// Scores every vector in `positions`, preserving order.
    ///
    /// # Errors
    ///
    /// - [`SwarmError::ShapeMismatch`] if a vector does not fit `model`
    /// - [`SwarmError::WorkerFailure`] if the backend itself failed; the
    ///   caller may retry the batch elsewhere
    fn evaluate(
        &self,
        model: &Rbfn,
        positions: Vec<Vec<f64>>,
        dataset: &TrainingDataset,
    ) -> SwarmResult<Vec<Evaluation>>;
}

/// Scores vectors one after another on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialBackend;

impl EvaluationBackend for SequentialBackend {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn evaluate(
        &self,
        model: &Rbfn,
        positions: Vec<Vec<f64>>,
        dataset: &TrainingDataset,
    ) -> SwarmResult<Vec<Evaluation>> {
        positions
            .iter()
            .map(|p| score(model, p, dataset))
            .collect()
    }
}

/// Fixed-size pool of evaluation workers.
pub struct WorkerPool {
    pool: ThreadPool,
}

impl WorkerPool {
    /// Builds a pool with `threads` workers (None => one per core).
    ///
    /// # Errors
    ///
    /// [`SwarmError::WorkerFailure`] if the pool cannot be created.
    pub fn new(threads: Option<usize>) -> SwarmResult<Self> {
        let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("rbfn-eval-{i}"));
        if let Some(n) = threads {
            builder = builder.num_threads(n);
        }
        let pool = builder
            .build()
            .map_err(|e| SwarmError::worker_failure(format!("cannot build worker pool: {e}")))?;
        Ok(Self { pool })
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.threads())
            .finish()
    }
}

impl EvaluationBackend for WorkerPool {
    fn name(&self) -> &'static str {
        "worker-pool"
    }

    fn evaluate(
        &self,
        model: &Rbfn,
        positions: Vec<Vec<f64>>,
        dataset: &TrainingDataset,
    ) -> SwarmResult<Vec<Evaluation>> {
        let results = panic::catch_unwind(AssertUnwindSafe(|| {
            self.pool.install(|| {
                positions
                    .into_par_iter()
                    .map(|p| score(model, &p, dataset))
                    .collect::<Vec<_>>()
            })
        }))
        .map_err(|payload| SwarmError::worker_failure(panic_message(payload.as_ref())))?;

        results.into_iter().collect()
    }
}

fn score(model: &Rbfn, params: &[f64], dataset: &TrainingDataset) -> SwarmResult<Evaluation> {
    model
        .mean_absolute_error(params, dataset)
        .map(Evaluation::from_error)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("evaluation worker panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("evaluation worker panicked: {s}")
    } else {
        "evaluation worker panicked".to_owned()
    }
}
