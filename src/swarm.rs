//! Particle swarm optimizer over RBF parameter vectors.
//!
//! # Iteration
//!
//! Each iteration of [`SwarmOptimizer::run`]:
//! 1. checks the stop flag (only here, never mid-iteration)
//! 2. evaluates every candidate, on the worker pool or sequentially
//! 3. picks the iteration best (highest fitness, first index on ties)
//! 4. folds it into the all-time best if its error is strictly lower
//! 5. reports per-candidate errors and the iteration summary
//! 6. moves every candidate toward the iteration best
//!
//! After the loop, natural or stopped, one more evaluation and selection
//! pass runs and the fitted network is reported exactly once.
//!
//! # States
//!
//! `Idle → Running → Completed | Aborted`. Terminal states are final; a new
//! run needs a new optimizer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::candidate::{Candidate, Evaluation};
use crate::config::TrainingConfig;
use crate::dataset::TrainingDataset;
use crate::error::{SwarmError, SwarmResult};
use crate::evaluator::{EvaluationBackend, SequentialBackend, WorkerPool};
use crate::observer::{ProgressObserver, TrainingEvent};
use crate::rbfn::{FittedRbfn, Rbfn};

/// Lifecycle of one optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Built, not started.
    Idle,
    /// Iterating.
    Running,
    /// All iterations ran.
    Completed,
    /// Stopped by request or by a fatal error.
    Aborted,
}

impl RunState {
    /// True for `Completed` and `Aborted`.
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Completed | RunState::Aborted)
    }
}

/// Cooperative cancellation flag, sampled between iterations.
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    /// Creates an unset token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the run to stop at the next iteration boundary.
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop was requested.
    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Value copy of the best candidate seen, independent of the live swarm.
#[derive(Debug, Clone, PartialEq)]
pub struct BestSnapshot {
    /// Parameter vector.
    pub position: Vec<f64>,
    /// Fitness at capture time.
    pub fitness: f64,
    /// Error at capture time.
    pub error: f64,
}

impl BestSnapshot {
    fn of(candidate: &Candidate) -> Self {
        Self {
            position: candidate.position().to_vec(),
            fitness: candidate.fitness(),
            error: candidate.error(),
        }
    }
}

/// Outcome of a run that produced a model.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// `Completed`, or `Aborted` after a stop request.
    pub state: RunState,
    /// Iterations that ran to the end of their update pass.
    pub iterations_completed: usize,
    /// All-time best after the final selection pass.
    pub best: BestSnapshot,
    /// Network bound to `best.position`.
    pub model: FittedRbfn,
}

/// PSO trainer for one RBF network.
pub struct SwarmOptimizer {
    config: TrainingConfig,
    dataset: Arc<TrainingDataset>,
    model: Rbfn,
    population: Vec<Candidate>,
    backend: Option<Box<dyn EvaluationBackend>>,
    rng: StdRng,
    stop: StopToken,
    state: RunState,
    all_time_best: Option<BestSnapshot>,
    iterations_completed: usize,
}

impl SwarmOptimizer {
    /// Validates `config` and builds a randomly initialised swarm.
    ///
    /// When parallel evaluation is requested but the worker pool cannot be
    /// built, the optimizer logs the failure and evaluates sequentially.
    ///
    /// # Errors
    ///
    /// [`SwarmError::Config`] for an invalid configuration.
    pub fn new<D: Into<Arc<TrainingDataset>>>(dataset: D, config: TrainingConfig) -> SwarmResult<Self> {
        config.validate()?;
        let dataset = dataset.into();

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let model = Rbfn::for_dataset(&dataset, config.neuron_count, config.sd_max)
            .with_output_range(config.output_range);
        if let Some(warning) = unreachable_targets(dataset.output_range(), config.output_range) {
            log::warn!("{warning}");
        }
        let population = (0..config.population_size)
            .map(|_| Candidate::random(model, config.v_max, &mut rng))
            .collect();

        let backend: Option<Box<dyn EvaluationBackend>> = if config.use_parallel_evaluation {
            match WorkerPool::new(config.worker_threads) {
                Ok(pool) => Some(Box::new(pool)),
                Err(e) => {
                    log::warn!("{e}; evaluating sequentially");
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            config,
            dataset,
            model,
            population,
            backend,
            rng,
            stop: StopToken::new(),
            state: RunState::Idle,
            all_time_best: None,
            iterations_completed: 0,
        })
    }

    /// Replaces the evaluation backend (None => [`SequentialBackend`]).
    pub fn with_backend(mut self, backend: Option<Box<dyn EvaluationBackend>>) -> Self {
        self.backend = backend;
        self
    }

    /// Configuration of this run.
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Shared training data.
    pub fn dataset(&self) -> &TrainingDataset {
        &self.dataset
    }

    /// Network structure shared by all candidates.
    pub fn model(&self) -> &Rbfn {
        &self.model
    }

    /// Current population, in creation order.
    pub fn population(&self) -> &[Candidate] {
        &self.population
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Whether a run is in progress.
    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    /// Best candidate seen so far, if any iteration has been evaluated.
    pub fn all_time_best(&self) -> Option<&BestSnapshot> {
        self.all_time_best.as_ref()
    }

    /// Name of the active evaluation backend.
    pub fn backend_name(&self) -> &'static str {
        self.backend.as_ref().map_or(SequentialBackend.name(), |b| b.name())
    }

    /// Token that stops this optimizer at the next iteration boundary.
    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    /// Sets the stop flag.
    pub fn request_stop(&self) {
        self.stop.request_stop();
    }

    /// Runs the whole optimisation on the calling thread.
    ///
    /// # Errors
    ///
    /// - [`SwarmError::InvalidState`] if this optimizer already ran
    /// - [`SwarmError::ShapeMismatch`] if evaluation hits malformed data;
    ///   the run ends `Aborted` and no model is reported
    pub fn run(&mut self, observer: &mut dyn ProgressObserver) -> SwarmResult<RunReport> {
        if self.state != RunState::Idle {
            return Err(SwarmError::invalid_state(format!(
                "cannot start from {:?}",
                self.state
            )));
        }
        self.state = RunState::Running;
        log::info!(
            "Starting swarm run: {} iterations, {} candidates, {} neurons, {} evaluation",
            self.config.iteration_count,
            self.config.population_size,
            self.config.neuron_count,
            self.backend_name(),
        );

        let outcome = match self.iterate(observer) {
            Ok(stopped) => self.finish(stopped, observer),
            Err(e) => Err(e),
        };
        match outcome {
            Ok(report) => Ok(report),
            Err(e) => {
                self.state = RunState::Aborted;
                log::error!("Training aborted: {e}");
                observer.on_log(&format!("ERROR: training aborted: {e}"));
                Err(e)
            }
        }
    }

    /// Moves the optimizer onto a dedicated thread and starts it.
    pub fn start<O>(mut self, mut observer: O) -> SwarmResult<TrainingHandle>
    where
        O: ProgressObserver + Send + 'static,
    {
        let stop = self.stop_token();
        let join = thread::Builder::new()
            .name("rbfn-swarm".into())
            .spawn(move || self.run(&mut observer))?;
        Ok(TrainingHandle {
            stop,
            join: Some(join),
        })
    }

    /// Starts on a dedicated thread, reporting through a channel.
    pub fn start_with_channel(self) -> SwarmResult<(TrainingHandle, Receiver<TrainingEvent>)> {
        let (tx, rx) = mpsc::channel();
        let handle = self.start(tx)?;
        Ok((handle, rx))
    }

    /// Main loop. Returns whether it ended on a stop request.
    fn iterate(&mut self, observer: &mut dyn ProgressObserver) -> SwarmResult<bool> {
        for i in 0..self.config.iteration_count {
            if self.stop.is_stop_requested() {
                log::warn!("Stop requested; ending after {} iterations", self.iterations_completed);
                observer.on_log(&format!(
                    "WARNING: training stopped by request after {} iterations",
                    self.iterations_completed
                ));
                return Ok(true);
            }
            observer.on_iteration_start(i);

            self.evaluate_population(observer)?;
            let best = self.iteration_best_index();
            self.fold_all_time_best(best);
            self.report(observer, best);
            self.update_population(best)?;

            self.iterations_completed += 1;
        }
        Ok(false)
    }

    fn finish(&mut self, stopped: bool, observer: &mut dyn ProgressObserver) -> SwarmResult<RunReport> {
        observer.on_busy();
        observer.on_log("Selecting the best individual...");

        self.evaluate_population(observer)?;
        let best = self.iteration_best_index();
        self.fold_all_time_best(best);

        let best = self
            .all_time_best
            .clone()
            .ok_or_else(|| SwarmError::invalid_state("no candidate was evaluated"))?;
        let model = FittedRbfn::new(self.model, best.position.clone())?;

        observer.on_log(&format!("The least error: {:.6}", best.error));
        observer.on_log(&format!("The best individual:\n{:?}", best.position));
        log::info!(
            "Swarm run finished after {} iterations, best error {:.6}",
            self.iterations_completed,
            best.error
        );

        self.state = if stopped {
            RunState::Aborted
        } else {
            RunState::Completed
        };
        observer.on_model_ready(&model);

        Ok(RunReport {
            state: self.state,
            iterations_completed: self.iterations_completed,
            best,
            model,
        })
    }

    /// Scores every candidate and writes results back in population order.
    ///
    /// Without a worker pool the batch goes to [`SequentialBackend`]. A pool
    /// reporting [`SwarmError::WorkerFailure`] is retried on
    /// [`SequentialBackend`] for this pass.
    fn evaluate_population(&mut self, observer: &mut dyn ProgressObserver) -> SwarmResult<()> {
        let positions: Vec<Vec<f64>> =
            self.population.iter().map(|c| c.position().to_vec()).collect();

        let evals = match self.backend.as_deref() {
            Some(backend) => {
                match evaluate_batch(backend, &self.model, positions.clone(), &self.dataset) {
                    Ok(evals) => evals,
                    Err(e) if e.is_recoverable() => {
                        log::warn!("{e}; retrying this iteration sequentially");
                        observer.on_log(&format!("{e}; retrying this iteration sequentially"));
                        evaluate_batch(&SequentialBackend, &self.model, positions, &self.dataset)?
                    }
                    Err(e) => return Err(e),
                }
            }
            None => evaluate_batch(&SequentialBackend, &self.model, positions, &self.dataset)?,
        };

        for (candidate, eval) in self.population.iter_mut().zip(evals) {
            candidate.apply(eval);
        }
        Ok(())
    }

    /// Index of the fittest candidate; the first one wins ties.
    fn iteration_best_index(&self) -> usize {
        let mut best = 0;
        for (i, c) in self.population.iter().enumerate().skip(1) {
            if c.fitness() > self.population[best].fitness() {
                best = i;
            }
        }
        best
    }

    fn fold_all_time_best(&mut self, index: usize) {
        let candidate = &self.population[index];
        let improved = self
            .all_time_best
            .as_ref()
            .map_or(true, |best| candidate.error() < best.error);
        if improved {
            self.all_time_best = Some(BestSnapshot::of(candidate));
        }
    }

    fn report(&self, observer: &mut dyn ProgressObserver, best: usize) {
        let mut total = 0.0;
        for c in &self.population {
            observer.on_candidate_error(c.error());
            total += c.error();
        }
        let mean = total / self.population.len() as f64;
        let iteration_best = self.population[best].error();
        let all_time_best = self.all_time_best.as_ref().map_or(iteration_best, |b| b.error);

        log::debug!(
            "iteration {}: mean {:.6}, best {:.6}, all-time {:.6}",
            self.iterations_completed,
            mean,
            iteration_best,
            all_time_best
        );
        observer.on_iteration_summary(mean, iteration_best, all_time_best);
    }

    /// Moves every candidate toward this iteration's best position.
    fn update_population(&mut self, best: usize) -> SwarmResult<()> {
        let global = self.population[best].position().to_vec();
        let w = self.config.inertia_weight;
        let c1 = self.config.cognitive_const_upper;
        let c2 = self.config.social_const_upper;

        for candidate in &mut self.population {
            let cognitive = self.rng.gen_range(0.0..=c1);
            let social = self.rng.gen_range(0.0..=c2);
            candidate.update_position(w, cognitive, social, &global)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for SwarmOptimizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwarmOptimizer")
            .field("config", &self.config)
            .field("model", &self.model)
            .field("population", &self.population.len())
            .field("backend", &self.backend_name())
            .field("state", &self.state)
            .field("iterations_completed", &self.iterations_completed)
            .finish()
    }
}

/// Describes targets the network cannot reach, if any.
///
/// The network output is confined to `output_range`, so samples outside it
/// put a floor under the achievable error.
fn unreachable_targets(targets: (f64, f64), output_range: (f64, f64)) -> Option<String> {
    let (lo, hi) = output_range;
    if targets.0 < lo || targets.1 > hi {
        Some(format!(
            "training outputs span [{}, {}] but the network output is limited to [{lo}, {hi}]",
            targets.0, targets.1
        ))
    } else {
        None
    }
}

/// Runs one batch, checking the backend returned a result per position.
fn evaluate_batch(
    backend: &dyn EvaluationBackend,
    model: &Rbfn,
    positions: Vec<Vec<f64>>,
    dataset: &TrainingDataset,
) -> SwarmResult<Vec<Evaluation>> {
    let expected = positions.len();
    let evals = backend.evaluate(model, positions, dataset)?;
    if evals.len() != expected {
        return Err(SwarmError::worker_failure(format!(
            "{} returned {} results for {expected} candidates",
            backend.name(),
            evals.len()
        )));
    }
    Ok(evals)
}

/// Control surface of a run on its own thread.
#[derive(Debug)]
pub struct TrainingHandle {
    stop: StopToken,
    join: Option<JoinHandle<SwarmResult<RunReport>>>,
}

impl TrainingHandle {
    /// Asks the run to stop at the next iteration boundary.
    pub fn request_stop(&self) {
        self.stop.request_stop();
    }

    /// Whether the training thread is still working.
    pub fn is_running(&self) -> bool {
        self.join.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop token shared with the run.
    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    /// Waits for the run to end.
    pub fn join(mut self) -> SwarmResult<RunReport> {
        let handle = self
            .join
            .take()
            .ok_or_else(|| SwarmError::invalid_state("training thread already joined"))?;
        handle
            .join()
            .map_err(|_| SwarmError::worker_failure("training thread panicked"))?
    }
}
