//! Progress notifications emitted by the optimizer.
//!
//! The optimizer reports through the [`ProgressObserver`] trait and never
//! waits for an answer. Implement the trait directly, or pass a
//! `std::sync::mpsc::Sender<TrainingEvent>` to receive every notification
//! as a [`TrainingEvent`] on another thread.

use std::sync::mpsc::Sender;

use crate::rbfn::FittedRbfn;

/// One progress notification.
#[derive(Debug, Clone, PartialEq)]
pub enum TrainingEvent {
    /// An iteration is starting (0-based).
    IterationStart(usize),
    /// Error of one candidate, once per candidate per iteration.
    CandidateError(f64),
    /// Aggregate errors at the end of an iteration's selection step.
    IterationSummary {
        /// Mean error over the population.
        mean_error: f64,
        /// Error of this iteration's best candidate.
        iteration_best_error: f64,
        /// Lowest error seen so far in the run.
        all_time_best_error: f64,
    },
    /// Human-readable status text.
    Log(String),
    /// A finalisation step of unbounded length has begun.
    Busy,
    /// The fitted network, sent exactly once per run.
    ModelReady(FittedRbfn),
}

/// Receiver of one-way progress notifications.
///
/// Every method has an empty default, so implementors only override what
/// they care about.
pub trait ProgressObserver {
    /// An iteration is starting.
    fn on_iteration_start(&mut self, _index: usize) {}

    /// Current error of one candidate.
    fn on_candidate_error(&mut self, _error: f64) {}

    /// End-of-selection statistics.
    fn on_iteration_summary(&mut self, _mean_error: f64, _iteration_best: f64, _all_time_best: f64) {}

    /// Status text.
    fn on_log(&mut self, _message: &str) {}

    /// Finalisation has begun.
    fn on_busy(&mut self) {}

    /// The run has produced its model.
    fn on_model_ready(&mut self, _model: &FittedRbfn) {}
}

/// Observer that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl ProgressObserver for NullObserver {}

/// Forwards notifications as [`TrainingEvent`]s. A disconnected receiver is
/// ignored: progress reporting never stops training.
impl ProgressObserver for Sender<TrainingEvent> {
    fn on_iteration_start(&mut self, index: usize) {
        let _ = self.send(TrainingEvent::IterationStart(index));
    }

    fn on_candidate_error(&mut self, error: f64) {
        let _ = self.send(TrainingEvent::CandidateError(error));
    }

    fn on_iteration_summary(&mut self, mean_error: f64, iteration_best: f64, all_time_best: f64) {
        let _ = self.send(TrainingEvent::IterationSummary {
            mean_error,
            iteration_best_error: iteration_best,
            all_time_best_error: all_time_best,
        });
    }

    fn on_log(&mut self, message: &str) {
        let _ = self.send(TrainingEvent::Log(message.to_owned()));
    }

    fn on_busy(&mut self) {
        let _ = self.send(TrainingEvent::Busy);
    }

    fn on_model_ready(&mut self, model: &FittedRbfn) {
        let _ = self.send(TrainingEvent::ModelReady(model.clone()));
    }
}

/// Collects every event in memory.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    /// Events in emission order.
    pub events: Vec<TrainingEvent>,
}

impl EventLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `IterationSummary` events.
    pub fn summary_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, TrainingEvent::IterationSummary { .. }))
            .count()
    }

    /// Number of `ModelReady` events.
    pub fn model_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, TrainingEvent::ModelReady(_)))
            .count()
    }

    /// `all_time_best_error` of every summary, in order.
    pub fn all_time_best_errors(&self) -> Vec<f64> {
        self.events
            .iter()
            .filter_map(|e| match e {
                TrainingEvent::IterationSummary {
                    all_time_best_error,
                    ..
                } => Some(*all_time_best_error),
                _ => None,
            })
            .collect()
    }
}

impl ProgressObserver for EventLog {
    fn on_iteration_start(&mut self, index: usize) {
        self.events.push(TrainingEvent::IterationStart(index));
    }

    fn on_candidate_error(&mut self, error: f64) {
        self.events.push(TrainingEvent::CandidateError(error));
    }

    fn on_iteration_summary(&mut self, mean_error: f64, iteration_best: f64, all_time_best: f64) {
        self.events.push(TrainingEvent::IterationSummary {
            mean_error,
            iteration_best_error: iteration_best,
            all_time_best_error: all_time_best,
        });
    }

    fn on_log(&mut self, message: &str) {
        self.events.push(TrainingEvent::Log(message.to_owned()));
    }

    fn on_busy(&mut self) {
        self.events.push(TrainingEvent::Busy);
    }

    fn on_model_ready(&mut self, model: &FittedRbfn) {
        self.events.push(TrainingEvent::ModelReady(model.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_channel_forwards_events() {
        let (mut tx, rx) = mpsc::channel();
        tx.on_iteration_start(2);
        tx.on_candidate_error(0.5);
        tx.on_iteration_summary(1.0, 0.5, 0.25);
        tx.on_busy();
        drop(tx);

        let events: Vec<_> = rx.iter().collect();
        assert_eq!(
            events,
            vec![
                TrainingEvent::IterationStart(2),
                TrainingEvent::CandidateError(0.5),
                TrainingEvent::IterationSummary {
                    mean_error: 1.0,
                    iteration_best_error: 0.5,
                    all_time_best_error: 0.25,
                },
                TrainingEvent::Busy,
            ]
        );
    }

    #[test]
    fn test_closed_channel_is_ignored() {
        let (mut tx, rx) = mpsc::channel::<TrainingEvent>();
        drop(rx);
        tx.on_log("nobody listening");
    }

    #[test]
    fn test_event_log_counts() {
        let mut log = EventLog::new();
        log.on_iteration_summary(3.0, 2.0, 2.0);
        log.on_iteration_summary(2.5, 1.5, 1.5);
        assert_eq!(log.summary_count(), 2);
        assert_eq!(log.model_count(), 0);
        assert_eq!(log.all_time_best_errors(), vec![2.0, 1.5]);
    }
}
