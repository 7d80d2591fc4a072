//! Training samples and datasets.
//!
//! A dataset is an ordered, non-empty list of `(input, output)` pairs whose
//! inputs all share one dimensionality. The text format accepted by
//! [`TrainingDataset::parse`] is one sample per line, whitespace-separated,
//! with the output as the last value:
//!
//! ```text
//! 22.0000000 8.4852814 8.4852814 -16.0709664
//! 21.1292288 9.3920089 8.4527662 -14.7971418
//! ```

use std::path::Path;

use crate::error::{SwarmError, SwarmResult};

/// One immutable training pair.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSample {
    /// Input features.
    pub input: Vec<f64>,
    /// Expected output, in real control units.
    pub output: f64,
}

impl TrainingSample {
    /// Creates a sample.
    pub fn new(input: Vec<f64>, output: f64) -> Self {
        Self { input, output }
    }
}

/// Ordered, non-empty sequence of samples with a uniform input dimension.
///
/// Read-only once built; the optimizer shares it by reference with every
/// evaluation worker.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingDataset {
    samples: Vec<TrainingSample>,
    input_dim: usize,
}

impl TrainingDataset {
    /// Builds a dataset, checking it is non-empty and uniformly shaped.
    ///
    /// # Errors
    ///
    /// - [`SwarmError::EmptyDataset`] for zero samples or zero-length inputs
    /// - [`SwarmError::InconsistentDimension`] if any input length differs
    ///   from the first one
    /// - [`SwarmError::NonFiniteSample`] if any input or output is NaN or infinite
    pub fn new(samples: Vec<TrainingSample>) -> SwarmResult<Self> {
        let input_dim = samples.first().ok_or(SwarmError::EmptyDataset)?.input.len();
        if input_dim == 0 {
            return Err(SwarmError::EmptyDataset);
        }
        if let Some((index, bad)) = samples
            .iter()
            .enumerate()
            .find(|(_, s)| s.input.len() != input_dim)
        {
            return Err(SwarmError::InconsistentDimension {
                index,
                expected: input_dim,
                got: bad.input.len(),
            });
        }
        if let Some(index) = samples
            .iter()
            .position(|s| !s.output.is_finite() || s.input.iter().any(|x| !x.is_finite()))
        {
            return Err(SwarmError::NonFiniteSample { index });
        }
        Ok(Self { samples, input_dim })
    }

    /// Parses the whitespace-separated training file format.
    pub fn parse(text: &str) -> SwarmResult<Self> {
        let mut samples = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            if line.trim().is_empty() {
                continue;
            }
            let values = line
                .split_whitespace()
                .map(|tok| {
                    tok.parse::<f64>()
                        .map_err(|e| SwarmError::parse(line_no, format!("'{tok}': {e}")))
                })
                .collect::<SwarmResult<Vec<f64>>>()?;
            let Some((&output, input)) = values.split_last() else {
                continue;
            };
            if input.is_empty() {
                return Err(SwarmError::parse(
                    line_no,
                    "expected at least one input and one output",
                ));
            }
            samples.push(TrainingSample::new(input.to_vec(), output));
        }
        Self::new(samples)
    }

    /// Reads and parses a training data file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> SwarmResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Input dimensionality `D`.
    #[inline]
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    /// Number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false for a constructed dataset.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples in order.
    #[inline]
    pub fn samples(&self) -> &[TrainingSample] {
        &self.samples
    }

    /// Iterator over samples.
    pub fn iter(&self) -> std::slice::Iter<'_, TrainingSample> {
        self.samples.iter()
    }

    /// `(min, max)` over every input component of every sample.
    ///
    /// Neuron centers are initialised and clamped inside this range.
    pub fn mean_range(&self) -> (f64, f64) {
        self.samples
            .iter()
            .flat_map(|s| s.input.iter().copied())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
                (lo.min(x), hi.max(x))
            })
    }

    /// `(min, max)` of the expected outputs.
    pub fn output_range(&self) -> (f64, f64) {
        self.samples
            .iter()
            .map(|s| s.output)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
                (lo.min(x), hi.max(x))
            })
    }
}

impl<'a> IntoIterator for &'a TrainingDataset {
    type Item = &'a TrainingSample;
    type IntoIter = std::slice::Iter<'a, TrainingSample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_dataset_rejected() {
        assert!(matches!(
            TrainingDataset::new(vec![]),
            Err(SwarmError::EmptyDataset)
        ));
    }

    #[test]
    fn test_inconsistent_dimension() {
        let err = TrainingDataset::new(vec![
            TrainingSample::new(vec![1.0, 2.0], 0.0),
            TrainingSample::new(vec![1.0], 0.0),
        ])
        .unwrap_err();
        match err {
            SwarmError::InconsistentDimension { index, expected, got } => {
                assert_eq!((index, expected, got), (1, 2, 1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_training_file() {
        let text = "22.0 8.48 8.48 -16.07\n\n21.12 9.39 8.45 -14.79\n";
        let ds = TrainingDataset::parse(text).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.input_dim(), 3);
        assert_eq!(ds.samples()[1].output, -14.79);
        assert_eq!(ds.mean_range(), (8.45, 22.0));
        assert_eq!(ds.output_range(), (-16.07, -14.79));
    }

    #[test]
    fn test_parse_reports_line() {
        let err = TrainingDataset::parse("1.0 2.0\n1.0 abc\n").unwrap_err();
        assert!(matches!(err, SwarmError::Parse { line: 2, .. }));

        let err = TrainingDataset::parse("1.0\n").unwrap_err();
        assert!(matches!(err, SwarmError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_infinite_input_rejected() {
        let err = TrainingDataset::parse("0.0 0.0\ninf 1.0\n").unwrap_err();
        assert!(matches!(err, SwarmError::NonFiniteSample { index: 1 }));

        let err = TrainingDataset::new(vec![TrainingSample::new(vec![f64::NEG_INFINITY], 0.0)])
            .unwrap_err();
        assert!(matches!(err, SwarmError::NonFiniteSample { index: 0 }));
    }

    #[test]
    fn test_nan_output_rejected() {
        let err = TrainingDataset::parse("0.0 NaN\n1.0 1.0\n").unwrap_err();
        assert!(matches!(err, SwarmError::NonFiniteSample { index: 0 }));

        let err = TrainingDataset::new(vec![
            TrainingSample::new(vec![0.0], 0.0),
            TrainingSample::new(vec![f64::NAN], 1.0),
        ])
        .unwrap_err();
        assert!(matches!(err, SwarmError::NonFiniteSample { index: 1 }));
    }
}
