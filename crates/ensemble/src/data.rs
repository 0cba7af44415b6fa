use crate::error::EnsembleError;
use ml::Tensor;

/// Row-aligned training data: `inputs: [N, input_dim]`, `labels: [N, output_dim]`.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub inputs: Tensor,
    pub labels: Tensor,
}

impl Dataset {
    pub fn new(inputs: Tensor, labels: Tensor) -> Result<Self, EnsembleError> {
        if inputs.rows() != labels.rows() {
            return Err(EnsembleError::RowMismatch { inputs: inputs.rows(), labels: labels.rows() });
        }
        Ok(Self { inputs, labels })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inputs.rows()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rows `start..end`, clamped to the dataset.
    pub fn slice(&self, start: usize, end: usize) -> Result<Dataset, EnsembleError> {
        Ok(Self { inputs: self.inputs.slice_rows(start, end)?, labels: self.labels.slice_rows(start, end)? })
    }
}

/// Source of training data for an ensemble.
pub trait DataProvider {
    fn provide(&mut self) -> Result<Dataset, EnsembleError>;
}

/// Deterministic smooth regression targets for demos, tests and benchmarks.
///
/// Inputs are uniform in `[-1, 1)`. Label column `j` is
/// `sin(Σ_i x_i · c_ij) + noise · u` with fixed random coefficients `c` and
/// `u` uniform in `[-1, 1)`. Each call to `provide` draws fresh rows.
pub struct SyntheticProvider {
    pub samples: usize,
    pub input_dim: usize,
    pub output_dim: usize,
    pub noise: f32,
    rng: fastrand::Rng,
    coefficients: Vec<f32>,
}

impl SyntheticProvider {
    #[must_use]
    pub fn new(samples: usize, input_dim: usize, output_dim: usize, noise: f32, seed: u64) -> Self {
        let mut rng = fastrand::Rng::with_seed(seed);
        let scale = 1.0 / (input_dim.max(1) as f32).sqrt();
        let coefficients = (0..input_dim * output_dim).map(|_| (rng.f32() * 2.0 - 1.0) * scale * 2.0).collect();
        Self { samples, input_dim, output_dim, noise, rng, coefficients }
    }

    fn uniform(&mut self) -> f32 {
        self.rng.f32() * 2.0 - 1.0
    }

    /// The noiseless target `sin(row · c)` for one input row.
    #[must_use]
    pub fn target(&self, row: &[f32]) -> Vec<f32> {
        let dout = self.output_dim;
        (0..dout)
            .map(|j| row.iter().enumerate().map(|(i, x)| x * self.coefficients[i * dout + j]).sum::<f32>().sin())
            .collect()
    }

    /// `samples` fresh noiseless rows from the same target function.
    pub fn held_out(&mut self, samples: usize) -> Result<Dataset, EnsembleError> {
        let (train_samples, train_noise) = (self.samples, self.noise);
        self.samples = samples;
        self.noise = 0.0;
        let rows = self.provide();
        self.samples = train_samples;
        self.noise = train_noise;
        rows
    }
}

impl DataProvider for SyntheticProvider {
    fn provide(&mut self) -> Result<Dataset, EnsembleError> {
        let (n, din, dout) = (self.samples, self.input_dim, self.output_dim);
        let inputs: Vec<f32> = (0..n * din).map(|_| self.uniform()).collect();
        let mut labels = Vec::with_capacity(n * dout);
        for row in inputs.chunks_exact(din.max(1)).take(n) {
            for y in self.target(row) {
                let noise = self.noise * self.uniform();
                labels.push(y + noise);
            }
        }
        if din == 0 {
            labels.resize(n * dout, 0.0);
        }
        tracing::debug!(samples = n, input_dim = din, output_dim = dout, "synthetic batch generated");
        Dataset::new(
            Tensor::try_from_vec(vec![n, din], inputs)?,
            Tensor::try_from_vec(vec![n, dout], labels)?,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shapes_and_determinism() {
        let a = SyntheticProvider::new(7, 3, 2, 0.0, 42).provide().unwrap();
        let b = SyntheticProvider::new(7, 3, 2, 0.0, 42).provide().unwrap();
        assert_eq!(a.inputs.shape, vec![7, 3]);
        assert_eq!(a.labels.shape, vec![7, 2]);
        assert_eq!(a.inputs.data, b.inputs.data);
        assert_eq!(a.labels.data, b.labels.data);
        assert!(a.labels.data.iter().all(|v| v.abs() <= 1.0));
    }

    #[test]
    fn successive_calls_draw_new_rows() {
        let mut p = SyntheticProvider::new(4, 2, 1, 0.1, 1);
        let first = p.provide().unwrap();
        let second = p.provide().unwrap();
        assert_ne!(first.inputs.data, second.inputs.data);
    }

    #[test]
    fn held_out_rows_follow_the_training_target() {
        let mut p = SyntheticProvider::new(6, 3, 2, 0.05, 0);
        let train = p.provide().unwrap();
        let held = p.held_out(5).unwrap();
        assert_eq!(held.len(), 5);
        assert_eq!(p.samples, 6);
        assert_ne!(train.inputs.data, held.inputs.data);

        // A provider built from the same seed describes the same function.
        let twin = SyntheticProvider::new(1, 3, 2, 0.0, 0);
        for (row, labels) in held.inputs.data.chunks_exact(3).zip(held.labels.data.chunks_exact(2)) {
            assert_eq!(p.target(row), labels);
            assert_eq!(twin.target(row), labels);
        }
        for (row, labels) in train.inputs.data.chunks_exact(3).zip(train.labels.data.chunks_exact(2)) {
            for (t, y) in p.target(row).iter().zip(labels) {
                assert!((t - y).abs() <= 0.05 + 1e-6);
            }
        }
    }

    #[test]
    fn dataset_rejects_misaligned_rows() {
        let err = Dataset::new(Tensor::zeros(vec![3, 1]), Tensor::zeros(vec![2, 1])).unwrap_err();
        assert!(matches!(err, EnsembleError::RowMismatch { inputs: 3, labels: 2 }));
    }

    #[test]
    fn slice_clamps() {
        let d = SyntheticProvider::new(5, 2, 1, 0.0, 3).provide().unwrap();
        let s = d.slice(3, 99).unwrap();
        assert_eq!(s.len(), 2);
        assert!(!s.is_empty());
    }
}
