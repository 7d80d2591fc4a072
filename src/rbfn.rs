//! Radial basis function network evaluated over a flat parameter vector.
//!
//! # Mathematical Foundation
//!
//! For `K` neurons over `D`-dimensional inputs the network computes
//!
//! ```text
//! φ_k(x) = exp(-‖x - c_k‖² / (2 σ_k²))
//! y(x)   = w_0 + Σ_k w_k φ_k(x)
//! ```
//!
//! and maps the raw `y`, nominally in `[-1, 1]`, affinely onto the output
//! range (steering degrees by default).
//!
//! # Parameter Layout (Critical!)
//!
//! A parameter vector has length `K * (D + 2) + 1`:
//! - `[0, K]`            bias `w_0` then weights `w_1..w_K`, kept in `[-1, 1]`
//! - `[K+1, K+1+K*D)`    centers, `D` values per neuron, kept in the input range
//! - `[K+1+K*D, end)`    standard deviations, kept `>= 0.001`
//!
//! [`Rbfn`] owns no parameters. It interprets whichever vector is passed
//! to [`Rbfn::output`], which lets one model serve a whole swarm.

use std::ops::Range;

use crate::config::{SD_FLOOR, STEERING_RANGE};
use crate::dataset::TrainingDataset;
use crate::error::{SwarmError, SwarmResult};

/// Segment offsets of a parameter vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamLayout {
    /// Number of neurons `K`.
    pub neuron_count: usize,
    /// Input dimensionality `D`.
    pub input_dim: usize,
}

impl ParamLayout {
    /// Creates a layout for `K` neurons over `D` inputs.
    pub const fn new(neuron_count: usize, input_dim: usize) -> Self {
        Self {
            neuron_count,
            input_dim,
        }
    }

    /// Total vector length, `K * (D + 2) + 1`.
    #[inline]
    pub const fn len(&self) -> usize {
        self.neuron_count * (self.input_dim + 2) + 1
    }

    /// Never true: the bias is always present.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Bias followed by per-neuron output weights.
    #[inline]
    pub fn weights(&self) -> Range<usize> {
        0..self.neuron_count + 1
    }

    /// All neuron centers, flattened row-major `[K][D]`.
    #[inline]
    pub fn centers(&self) -> Range<usize> {
        let start = self.neuron_count + 1;
        start..start + self.neuron_count * self.input_dim
    }

    /// Center of neuron `k`.
    #[inline]
    pub fn center(&self, k: usize) -> Range<usize> {
        let start = self.centers().start + k * self.input_dim;
        start..start + self.input_dim
    }

    /// Neuron standard deviations.
    #[inline]
    pub fn deviations(&self) -> Range<usize> {
        self.centers().end..self.len()
    }

    /// Returns a [`SwarmError::ShapeMismatch`] unless `params` fits this layout.
    pub fn check(&self, params: &[f64]) -> SwarmResult<()> {
        if params.len() != self.len() {
            return Err(SwarmError::shape_mismatch(
                "parameters",
                self.len(),
                params.len(),
            ));
        }
        Ok(())
    }
}

/// RBF network structure: shape, center domain and output scaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rbfn {
    layout: ParamLayout,
    /// Domain of neuron centers, from the dataset inputs.
    pub mean_range: (f64, f64),
    /// Upper bound of the standard deviation initialiser.
    pub sd_max: f64,
    /// Range the raw output in `[-1, 1]` is mapped onto.
    pub output_range: (f64, f64),
}

impl Rbfn {
    /// Creates a network with the default steering output range.
    pub fn new(neuron_count: usize, input_dim: usize, mean_range: (f64, f64), sd_max: f64) -> Self {
        Self {
            layout: ParamLayout::new(neuron_count, input_dim),
            mean_range,
            sd_max,
            output_range: STEERING_RANGE,
        }
    }

    /// Creates a network shaped for `dataset`.
    pub fn for_dataset(dataset: &TrainingDataset, neuron_count: usize, sd_max: f64) -> Self {
        Self::new(neuron_count, dataset.input_dim(), dataset.mean_range(), sd_max)
    }

    /// Overrides the denormalisation range.
    pub fn with_output_range(mut self, range: (f64, f64)) -> Self {
        self.output_range = range;
        self
    }

    /// Parameter layout.
    #[inline]
    pub fn layout(&self) -> ParamLayout {
        self.layout
    }

    /// Number of neurons `K`.
    #[inline]
    pub fn neuron_count(&self) -> usize {
        self.layout.neuron_count
    }

    /// Input dimensionality `D`.
    #[inline]
    pub fn input_dim(&self) -> usize {
        self.layout.input_dim
    }

    /// Length every parameter vector must have.
    #[inline]
    pub fn param_count(&self) -> usize {
        self.layout.len()
    }

    /// Weighted basis sum before denormalisation.
    pub fn raw_output(&self, input: &[f64], params: &[f64]) -> SwarmResult<f64> {
        self.layout.check(params)?;
        if input.len() != self.input_dim() {
            return Err(SwarmError::shape_mismatch(
                "input",
                self.input_dim(),
                input.len(),
            ));
        }

        let weights = &params[self.layout.weights()];
        let deviations = &params[self.layout.deviations()];

        let mut sum = weights[0];
        for k in 0..self.neuron_count() {
            let center = &params[self.layout.center(k)];
            let dist_sq: f64 = input
                .iter()
                .zip(center)
                .map(|(x, c)| (x - c) * (x - c))
                .sum();
            let sd = deviations[k];
            sum += weights[k + 1] * (-dist_sq / (2.0 * sd * sd)).exp();
        }
        Ok(sum)
    }

    /// Maps a raw output from `[-1, 1]` onto `output_range`.
    #[inline]
    pub fn denormalize(&self, raw: f64) -> f64 {
        let (lo, hi) = self.output_range;
        lo + (raw + 1.0) * 0.5 * (hi - lo)
    }

    /// Network output in real control units.
    ///
    /// # Errors
    ///
    /// [`SwarmError::ShapeMismatch`] if `params` does not have
    /// [`param_count`](Self::param_count) values or `input` does not have
    /// [`input_dim`](Self::input_dim) values.
    pub fn output(&self, input: &[f64], params: &[f64]) -> SwarmResult<f64> {
        self.raw_output(input, params).map(|raw| self.denormalize(raw))
    }

    /// Clamps each segment of `params` into its domain, in place.
    pub fn clamp_params(&self, params: &mut [f64]) {
        let (lo, hi) = self.mean_range;
        for w in &mut params[self.layout.weights()] {
            *w = w.clamp(-1.0, 1.0);
        }
        for c in &mut params[self.layout.centers()] {
            *c = c.clamp(lo, hi);
        }
        for sd in &mut params[self.layout.deviations()] {
            *sd = sd.max(SD_FLOOR);
        }
    }

    /// Mean absolute error of `params` over `dataset`.
    pub fn mean_absolute_error(&self, params: &[f64], dataset: &TrainingDataset) -> SwarmResult<f64> {
        let mut total = 0.0;
        for sample in dataset {
            total += (sample.output - self.output(&sample.input, params)?).abs();
        }
        Ok(total / dataset.len() as f64)
    }
}

/// A network bound to its trained parameters, delivered at the end of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedRbfn {
    model: Rbfn,
    params: Vec<f64>,
}

impl FittedRbfn {
    /// Binds `params` to `model`, checking the vector length.
    pub fn new(model: Rbfn, params: Vec<f64>) -> SwarmResult<Self> {
        model.layout().check(&params)?;
        Ok(Self { model, params })
    }

    /// Network structure.
    pub fn model(&self) -> &Rbfn {
        &self.model
    }

    /// Trained parameter vector.
    pub fn params(&self) -> &[f64] {
        &self.params
    }

    /// Consumes self, returning the parameter vector.
    pub fn into_params(self) -> Vec<f64> {
        self.params
    }

    /// Denormalised output for one input vector.
    pub fn predict(&self, input: &[f64]) -> SwarmResult<f64> {
        self.model.output(input, &self.params)
    }

    /// Mean absolute error over `dataset`.
    pub fn evaluate(&self, dataset: &TrainingDataset) -> SwarmResult<f64> {
        self.model.mean_absolute_error(&self.params, dataset)
    }
}
