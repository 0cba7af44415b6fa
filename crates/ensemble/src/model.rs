use crate::config::{EnsembleConfig, LossTracking};
use crate::error::EnsembleError;
use crate::member::MemberNetwork;
use crate::prediction::EnsemblePrediction;
use compute::ComputeBackend;
use ml::Tensor;
use std::sync::Arc;

/// A fixed-size ensemble of [`MemberNetwork`]s trained on shared mini-batches,
/// with an elite subset ranked by loss after every `train` call.
pub struct EnsembleModel {
    config: EnsembleConfig,
    backend: Arc<dyn ComputeBackend>,
    members: Vec<MemberNetwork>,
    elite_indices: Vec<usize>,
    last_losses: Vec<f32>,
}

impl EnsembleModel {
    /// Builds the ensemble on the backend for `config.device`.
    pub fn new(config: EnsembleConfig) -> Result<Self, EnsembleError> {
        config.validate()?;
        let backend = compute::backend_for(config.device)?;
        Self::with_backend(config, backend)
    }

    pub fn with_backend(config: EnsembleConfig, backend: Arc<dyn ComputeBackend>) -> Result<Self, EnsembleError> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        let settings = config.member_settings();
        let members = (0..config.network_size)
            .map(|_| MemberNetwork::new(config.input_dim(), config.output_dim(), &settings, &mut rng))
            .collect();
        tracing::info!(
            network_size = config.network_size,
            elite_size = config.elite_size,
            input_dim = config.input_dim(),
            output_dim = config.output_dim(),
            hidden_size = config.hidden_size,
            "ensemble initialised"
        );
        Ok(Self { config, backend, members, elite_indices: Vec::new(), last_losses: Vec::new() })
    }

    #[must_use]
    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    #[must_use]
    pub fn members(&self) -> &[MemberNetwork] {
        &self.members
    }

    #[must_use]
    pub fn network_size(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn input_dim(&self) -> usize {
        self.config.input_dim()
    }

    #[must_use]
    pub fn output_dim(&self) -> usize {
        self.config.output_dim()
    }

    /// Members ranked best first by the most recent `train` call. Empty before
    /// the first call.
    #[must_use]
    pub fn elite_indices(&self) -> &[usize] {
        &self.elite_indices
    }

    /// The per-member values the current elite set was ranked by.
    #[must_use]
    pub fn last_losses(&self) -> &[f32] {
        &self.last_losses
    }

    fn check_columns(what: &'static str, t: &Tensor, expected: usize) -> Result<usize, EnsembleError> {
        match t.shape.as_slice() {
            &[rows, cols] if cols == expected => Ok(rows),
            _ => Err(EnsembleError::InputShape { what, expected, shape: t.shape.clone() }),
        }
    }

    /// Trains every member on each contiguous mini-batch of `(inputs, labels)`
    /// and replaces the elite set.
    pub fn train(&mut self, inputs: &Tensor, labels: &Tensor, batch_size: usize) -> Result<(), EnsembleError> {
        let n = Self::check_columns("inputs", inputs, self.input_dim())?;
        let label_rows = Self::check_columns("labels", labels, self.output_dim())?;
        if n != label_rows {
            return Err(EnsembleError::RowMismatch { inputs: n, labels: label_rows });
        }
        if batch_size == 0 {
            return Err(EnsembleError::BatchSize);
        }
        if n == 0 {
            return Err(EnsembleError::EmptyDataset);
        }

        let mut weighted = vec![0.0f64; self.members.len()];
        let mut last = Vec::new();
        for (batch, start) in (0..n).step_by(batch_size).enumerate() {
            let end = (start + batch_size).min(n);
            let x = inputs.slice_rows(start, end)?;
            let y = labels.slice_rows(start, end)?;
            let losses = self.step_members(&x, &y)?;
            tracing::debug!(batch, rows = end - start, ?losses, "mini-batch done");
            for (w, &l) in weighted.iter_mut().zip(&losses) {
                *w += f64::from(l) * (end - start) as f64;
            }
            last = losses;
        }

        let ranked = match self.config.loss_tracking {
            LossTracking::LastBatch => last,
            LossTracking::EpochMean => weighted.iter().map(|w| (w / n as f64) as f32).collect(),
        };
        self.elite_indices = rank_elites(&ranked, self.config.elite_size);
        self.last_losses = ranked;
        tracing::info!(elites = ?self.elite_indices, losses = ?self.last_losses, "elite set updated");
        Ok(())
    }

    fn step_members(&mut self, x: &Tensor, y: &Tensor) -> Result<Vec<f32>, EnsembleError> {
        let inc_var_loss = self.config.inc_var_loss;
        let check_finite = self.config.check_finite;
        let backend = &self.backend;
        let step = |(member, net): (usize, &mut MemberNetwork)| -> Result<f32, EnsembleError> {
            let loss = net.fit_batch(x, y, inc_var_loss, backend)?;
            if check_finite {
                if !loss.is_finite() {
                    tracing::warn!(member, loss, "non-finite loss");
                    return Err(EnsembleError::NonFinite { member, what: "loss" });
                }
                if !net.is_finite() {
                    tracing::warn!(member, "non-finite parameters");
                    return Err(EnsembleError::NonFinite { member, what: "parameters" });
                }
            }
            Ok(loss)
        };

        #[cfg(feature = "parallel")]
        let losses: Result<Vec<f32>, EnsembleError> = {
            use rayon::prelude::*;
            self.members.par_iter_mut().enumerate().map(step).collect()
        };
        #[cfg(not(feature = "parallel"))]
        let losses: Result<Vec<f32>, EnsembleError> = self.members.iter_mut().enumerate().map(step).collect();
        losses
    }

    /// Runs every member over `inputs` in chunks of `batch_size` rows.
    pub fn predict(&self, inputs: &Tensor, batch_size: usize) -> Result<EnsemblePrediction, EnsembleError> {
        let rows = Self::check_columns("inputs", inputs, self.input_dim())?;
        if batch_size == 0 {
            return Err(EnsembleError::BatchSize);
        }
        let dim = self.output_dim();
        let members = self.members.len();
        let mut mean = vec![0.0f32; members * rows * dim];
        let mut variance = vec![0.0f32; members * rows * dim];

        for start in (0..rows).step_by(batch_size) {
            let end = (start + batch_size).min(rows);
            let x = inputs.slice_rows(start, end)?;
            for (i, member) in self.members.iter().enumerate() {
                let (mu, var) = member.predict(&x, &self.backend)?;
                let offset = (i * rows + start) * dim;
                mean[offset..offset + mu.len()].copy_from_slice(&mu.data);
                variance[offset..offset + var.len()].copy_from_slice(&var.data);
            }
        }

        let shape = vec![members, rows, dim];
        Ok(EnsemblePrediction {
            mean: Tensor::try_from_vec(shape.clone(), mean)?,
            variance: Tensor::try_from_vec(shape, variance)?,
        })
    }
}

/// Indices of the `k` smallest losses, ascending under IEEE total order.
/// Ties keep the lower index first.
#[must_use]
pub fn rank_elites(losses: &[f32], k: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..losses.len()).collect();
    order.sort_by(|&a, &b| losses[a].total_cmp(&losses[b]));
    order.truncate(k);
    order
}
