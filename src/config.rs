//! Training configuration and hyperparameters.
//!
//! This module provides [`TrainingConfig`] for configuring a swarm run,
//! covering the swarm itself (population, inertia, acceleration bounds),
//! the network shape (neuron count, standard deviation bound) and the
//! evaluation strategy.
//!
//! # Example
//!
//! ```rust
//! use rbfn_swarm::TrainingConfig;
//!
//! // Defaults mirror the values the training panel starts with
//! let config = TrainingConfig::default();
//! assert_eq!(config.population_size, 100);
//!
//! // Or customize
//! let config = TrainingConfig {
//!     iteration_count: 50,
//!     population_size: 30,
//!     neuron_count: 4,
//!     seed: Some(7),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```
//!
//! # Swarm Parameters
//!
//! | Parameter | Typical Values | Effect |
//! |-----------|---------------|--------|
//! | `inertia_weight` | 0.4-1.0 | Higher = particles keep their heading longer |
//! | `cognitive_const_upper` | 1.5-2.5 | Pull toward a particle's own best |
//! | `social_const_upper` | 1.5-3.0 | Pull toward the iteration best |
//! | `v_max` | 1-10 | Per-component velocity clamp |

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Denormalisation range for the network output, in degrees of steering.
///
/// The raw weighted sum of the network is nominally in `[-1, 1]` and is
/// mapped affinely onto this range, both while training and when the
/// fitted model drives the vehicle.
pub const STEERING_RANGE: (f64, f64) = (-40.0, 40.0);

/// Fitness assigned to a candidate whose training error is exactly zero.
///
/// `1 / 0` would be infinite; a finite maximum keeps comparisons and means
/// well defined.
pub const DEGENERATE_FITNESS: f64 = f64::MAX;

/// Lower bound applied to every neuron standard deviation after a move.
pub const SD_FLOOR: f64 = 0.001;

/// Lower bound of the standard deviation initialiser.
pub const SD_INIT_FLOOR: f64 = 0.01;

/// Swarm training configuration.
///
/// # Creating a Configuration
///
/// ```rust
/// use rbfn_swarm::TrainingConfig;
///
/// let config = TrainingConfig::builder()
///     .iteration_count(20)
///     .population_size(10)
///     .neuron_count(3)
///     .seed(42)
///     .build()
///     .expect("valid configuration");
/// assert_eq!(config.neuron_count, 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TrainingConfig {
    /// Number of swarm iterations (>= 1).
    pub iteration_count: usize,

    /// Number of candidates in the swarm (>= 1).
    pub population_size: usize,

    /// Scale of a candidate's previous velocity.
    pub inertia_weight: f64,

    /// Upper bound of the per-candidate cognitive constant draw.
    pub cognitive_const_upper: f64,

    /// Upper bound of the per-candidate social constant draw.
    pub social_const_upper: f64,

    /// Velocity clamp, applied per component.
    pub v_max: f64,

    /// Number of RBF neurons, excluding the bias term (>= 1).
    pub neuron_count: usize,

    /// Upper bound for the standard deviation initialiser (> 0).
    /// Not enforced after initialisation.
    pub sd_max: f64,

    /// Evaluate fitness on a worker pool instead of in place.
    pub use_parallel_evaluation: bool,

    /// Worker pool size (None => rayon default).
    pub worker_threads: Option<usize>,

    /// Optional seed for a reproducible run (None => entropy).
    pub seed: Option<u64>,

    /// Denormalisation range of the network output.
    pub output_range: (f64, f64),
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            iteration_count: 200,
            population_size: 100,
            inertia_weight: 1.0,
            cognitive_const_upper: 2.0,
            social_const_upper: 3.0,
            v_max: 10.0,
            neuron_count: 6,
            sd_max: 10.0,
            use_parallel_evaluation: true,
            worker_threads: None,
            seed: None,
            output_range: STEERING_RANGE,
        }
    }
}

impl TrainingConfig {
    /// Returns a builder starting from the defaults.
    pub fn builder() -> TrainingConfigBuilder {
        TrainingConfigBuilder::new()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if:
    /// - `iteration_count`, `population_size` or `neuron_count` is zero
    /// - `sd_max` is not finite or is below [`SD_INIT_FLOOR`]
    /// - `v_max` is not a positive finite number
    /// - an acceleration upper bound is negative or not finite
    /// - `inertia_weight` is not finite
    /// - `output_range.0 >= output_range.1`
    /// - `worker_threads` is `Some(0)`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iteration_count == 0 {
            return Err(ConfigError::InvalidCount("iteration_count"));
        }
        if self.population_size == 0 {
            return Err(ConfigError::InvalidCount("population_size"));
        }
        if self.neuron_count == 0 {
            return Err(ConfigError::InvalidCount("neuron_count"));
        }
        if self.worker_threads == Some(0) {
            return Err(ConfigError::InvalidCount("worker_threads"));
        }
        if !(self.sd_max.is_finite() && self.sd_max >= SD_INIT_FLOOR) {
            return Err(ConfigError::InvalidSdMax(self.sd_max));
        }
        if !(self.v_max.is_finite() && self.v_max > 0.0) {
            return Err(ConfigError::InvalidVelocityLimit(self.v_max));
        }
        if !self.inertia_weight.is_finite() {
            return Err(ConfigError::InvalidInertia(self.inertia_weight));
        }
        for (name, upper) in [
            ("cognitive_const_upper", self.cognitive_const_upper),
            ("social_const_upper", self.social_const_upper),
        ] {
            if !(upper.is_finite() && upper >= 0.0) {
                return Err(ConfigError::InvalidAcceleration { name, value: upper });
            }
        }
        let (lo, hi) = self.output_range;
        if !(lo.is_finite() && hi.is_finite() && lo < hi) {
            return Err(ConfigError::InvalidOutputRange(lo, hi));
        }
        Ok(())
    }
}

/// Fluent builder for [`TrainingConfig`].
#[derive(Debug, Clone, Default)]
pub struct TrainingConfigBuilder {
    config: TrainingConfig,
}

impl TrainingConfigBuilder {
    /// Creates a builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of iterations.
    pub fn iteration_count(mut self, n: usize) -> Self {
        self.config.iteration_count = n;
        self
    }

    /// Sets the swarm size.
    pub fn population_size(mut self, n: usize) -> Self {
        self.config.population_size = n;
        self
    }

    /// Sets the inertia weight.
    pub fn inertia_weight(mut self, w: f64) -> Self {
        self.config.inertia_weight = w;
        self
    }

    /// Sets both acceleration upper bounds.
    pub fn acceleration(mut self, cognitive_upper: f64, social_upper: f64) -> Self {
        self.config.cognitive_const_upper = cognitive_upper;
        self.config.social_const_upper = social_upper;
        self
    }

    /// Sets the velocity clamp.
    pub fn v_max(mut self, v: f64) -> Self {
        self.config.v_max = v;
        self
    }

    /// Sets the number of RBF neurons.
    pub fn neuron_count(mut self, n: usize) -> Self {
        self.config.neuron_count = n;
        self
    }

    /// Sets the standard deviation initialiser bound.
    pub fn sd_max(mut self, sd: f64) -> Self {
        self.config.sd_max = sd;
        self
    }

    /// Enables or disables the worker pool.
    pub fn parallel(mut self, enabled: bool) -> Self {
        self.config.use_parallel_evaluation = enabled;
        self
    }

    /// Fixes the worker pool size.
    pub fn worker_threads(mut self, n: usize) -> Self {
        self.config.worker_threads = Some(n);
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Sets the denormalisation range.
    pub fn output_range(mut self, lo: f64, hi: f64) -> Self {
        self.config.output_range = (lo, hi);
        self
    }

    /// Validates and returns the configuration.
    pub fn build(self) -> Result<TrainingConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Errors returned by [`TrainingConfig::validate`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A count parameter is zero.
    #[error("{0} must be > 0")]
    InvalidCount(&'static str),

    /// Standard deviation bound is below the initialiser floor.
    #[error("sd_max must be >= 0.01, got {0}")]
    InvalidSdMax(f64),

    /// Velocity clamp is not positive.
    #[error("v_max must be > 0, got {0}")]
    InvalidVelocityLimit(f64),

    /// Inertia weight is NaN or infinite.
    #[error("inertia_weight must be finite, got {0}")]
    InvalidInertia(f64),

    /// An acceleration bound is negative or not finite.
    #[error("{name} must be >= 0, got {value}")]
    InvalidAcceleration {
        /// Field name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// Output range is empty or inverted.
    #[error("Invalid output range ({0}, {1})")]
    InvalidOutputRange(f64, f64),
}
