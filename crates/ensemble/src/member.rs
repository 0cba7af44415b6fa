use crate::error::EnsembleError;
use compute::ComputeBackend;
use ml::{Adam, Dense, Inference, Layer, MlError, Recorder, Sequential, Swish, Tape, Tensor};
use std::sync::Arc;

/// Hidden blocks before the mean/logvar head.
pub const HIDDEN_LAYERS: usize = 4;

/// Per-member hyperparameters shared by every network of an ensemble.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemberSettings {
    pub hidden_size: usize,
    pub learning_rate: f32,
    pub logvar_reg_coef: f32,
    pub max_logvar_init: f32,
    pub min_logvar_init: f32,
}

/// Raw forward result of a member, still in log-variance form.
#[derive(Debug, Clone)]
pub struct MemberOutput {
    pub mean: Tensor,
    pub logvar: Tensor,
}

/// One probabilistic regression network of the ensemble.
///
/// Owns its parameters, including the learned log-variance bounds, and its own
/// optimizer state.
pub struct MemberNetwork {
    body: Sequential,
    head: Dense,
    max_logvar: Tensor,
    min_logvar: Tensor,
    optimizer: Adam,
    output_dim: usize,
    reg_coef: f32,
}

impl MemberNetwork {
    pub fn new(input_dim: usize, output_dim: usize, settings: &MemberSettings, rng: &mut fastrand::Rng) -> Self {
        let mut body = Sequential::default();
        let mut width = input_dim;
        for _ in 0..HIDDEN_LAYERS {
            body.push(Dense::random(width, settings.hidden_size, rng));
            body.push(Swish);
            width = settings.hidden_size;
        }
        let head = Dense::random(width, 2 * output_dim, rng);
        let max_logvar = Tensor::full(vec![1, output_dim], settings.max_logvar_init).with_grad();
        let min_logvar = Tensor::full(vec![1, output_dim], settings.min_logvar_init).with_grad();

        let mut params = body.params();
        params.extend(head.params());
        params.push(&max_logvar);
        params.push(&min_logvar);
        let optimizer = Adam::new(&params, settings.learning_rate);

        Self { body, head, max_logvar, min_logvar, optimizer, output_dim, reg_coef: settings.logvar_reg_coef }
    }

    #[must_use]
    pub fn output_dim(&self) -> usize {
        self.output_dim
    }

    #[must_use]
    pub fn max_logvar(&self) -> &Tensor {
        &self.max_logvar
    }

    #[must_use]
    pub fn min_logvar(&self) -> &Tensor {
        &self.min_logvar
    }

    /// Every trainable tensor, in optimizer order.
    #[must_use]
    pub fn params(&self) -> Vec<&Tensor> {
        let mut params = self.body.params();
        params.extend(self.head.params());
        params.push(&self.max_logvar);
        params.push(&self.min_logvar);
        params
    }

    #[must_use]
    pub fn parameter_shapes(&self) -> Vec<Vec<usize>> {
        self.params().into_iter().map(|p| p.shape.clone()).collect()
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.params().iter().all(|p| p.is_finite())
    }

    /// Mean and soft-clamped log-variance for `x: [batch, input_dim]`.
    ///
    /// The clamp is `max - softplus(max - raw)` followed by
    /// `min + softplus(logvar - min)`, which keeps the result inside the learned
    /// bounds while staying differentiable.
    pub fn forward(&self, x: &Tensor, rec: &mut dyn Recorder) -> Result<MemberOutput, EnsembleError> {
        let h = self.body.forward(x, rec)?;
        let out = self.head.forward(&h, rec)?;
        let mean = out.narrow(0, self.output_dim, rec)?;
        let raw = out.narrow(self.output_dim, self.output_dim, rec)?;

        let upper_gap = raw.neg(rec)?.add_broadcast(&self.max_logvar, rec)?;
        let logvar = upper_gap.softplus(rec)?.neg(rec)?.add_broadcast(&self.max_logvar, rec)?;
        let lower_gap = logvar.neg(rec)?.add_broadcast(&self.min_logvar, rec)?.neg(rec)?;
        let logvar = lower_gap.softplus(rec)?.add_broadcast(&self.min_logvar, rec)?;

        Ok(MemberOutput { mean, logvar })
    }

    /// `(mean, variance)` without recording gradients.
    pub fn predict(&self, x: &Tensor, backend: &Arc<dyn ComputeBackend>) -> Result<(Tensor, Tensor), EnsembleError> {
        let mut rec = Inference::new(Arc::clone(backend));
        let MemberOutput { mean, logvar } = self.forward(x, &mut rec)?;
        let variance = logvar.exp(&mut rec)?;
        Ok((mean, variance))
    }

    /// Heteroscedastic Gaussian NLL, `mean((μ - y)² · e^{-logvar}) + mean(logvar)`,
    /// or plain MSE of the mean when `inc_var_loss` is off.
    pub fn loss(
        output: &MemberOutput,
        labels: &Tensor,
        inc_var_loss: bool,
        rec: &mut dyn Recorder,
    ) -> Result<Tensor, EnsembleError> {
        let diff = output.mean.sub(labels, rec)?;
        let sq = diff.mul(&diff, rec)?;
        if !inc_var_loss {
            return Ok(sq.reduce_mean(rec)?);
        }
        let inv_var = output.logvar.neg(rec)?.exp(rec)?;
        let mse = sq.mul(&inv_var, rec)?.reduce_mean(rec)?;
        let var = output.logvar.reduce_mean(rec)?;
        Ok(mse.add(&var, rec)?)
    }

    /// Adds the bound regulariser to `loss`, backpropagates through `tape` and
    /// applies one Adam update. Returns the regularised objective.
    pub fn train_step(&mut self, tape: &mut Tape, loss: &Tensor) -> Result<f32, EnsembleError> {
        let upper = self.max_logvar.reduce_sum(tape)?.scale(self.reg_coef, tape)?;
        let lower = self.min_logvar.reduce_sum(tape)?.scale(self.reg_coef, tape)?;
        let total = loss.add(&upper, tape)?.sub(&lower, tape)?;
        let value = total.item().ok_or_else(|| MlError::NonScalarLoss(total.shape.clone()))?;

        let grads = tape.backward(&total)?;
        let Self { body, head, max_logvar, min_logvar, optimizer, .. } = self;
        let mut params = body.params_mut();
        params.extend(head.params_mut());
        params.push(max_logvar);
        params.push(min_logvar);
        optimizer.step(&mut params, &grads)?;
        Ok(value)
    }

    /// Forward, loss and one update on a single mini-batch.
    pub fn fit_batch(
        &mut self,
        inputs: &Tensor,
        labels: &Tensor,
        inc_var_loss: bool,
        backend: &Arc<dyn ComputeBackend>,
    ) -> Result<f32, EnsembleError> {
        let mut tape = Tape::new(Arc::clone(backend));
        let output = self.forward(inputs, &mut tape)?;
        let loss = Self::loss(&output, labels, inc_var_loss, &mut tape)?;
        self.train_step(&mut tape, &loss)
    }
}
