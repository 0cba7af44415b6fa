use crate::error::EnsembleError;
use crate::member::MemberSettings;
use compute::Device;
use serde::{Deserialize, Serialize};

/// Which per-member loss the elite ranking is based on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossTracking {
    /// Loss of the final mini-batch of a `train` call.
    #[default]
    LastBatch,
    /// Sample-weighted mean of every mini-batch loss of a `train` call.
    EpochMean,
}

/// Hyperparameters of an [`crate::EnsembleModel`].
///
/// Only the four sizing fields are required when deserialising; everything
/// else falls back to the values of [`EnsembleConfig::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleConfig {
    pub network_size: usize,
    pub elite_size: usize,
    pub state_size: usize,
    pub action_size: usize,
    #[serde(default = "default_reward_size")]
    pub reward_size: usize,
    #[serde(default = "default_hidden_size")]
    pub hidden_size: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f32,
    /// Train on the heteroscedastic NLL rather than plain MSE.
    #[serde(default = "default_true")]
    pub inc_var_loss: bool,
    #[serde(default = "default_logvar_reg_coef")]
    pub logvar_reg_coef: f32,
    #[serde(default = "default_max_logvar")]
    pub max_logvar_init: f32,
    #[serde(default = "default_min_logvar")]
    pub min_logvar_init: f32,
    #[serde(default)]
    pub loss_tracking: LossTracking,
    /// Fail `train` on the first NaN/Inf loss or parameter.
    #[serde(default = "default_true")]
    pub check_finite: bool,
    /// Seeds member initialisation. `None` draws from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub device: Device,
}

fn default_reward_size() -> usize {
    1
}

fn default_hidden_size() -> usize {
    200
}

fn default_learning_rate() -> f32 {
    1e-2
}

fn default_true() -> bool {
    true
}

fn default_logvar_reg_coef() -> f32 {
    0.01
}

fn default_max_logvar() -> f32 {
    0.5
}

fn default_min_logvar() -> f32 {
    -10.0
}

impl EnsembleConfig {
    #[must_use]
    pub fn new(network_size: usize, elite_size: usize, state_size: usize, action_size: usize) -> Self {
        Self {
            network_size,
            elite_size,
            state_size,
            action_size,
            reward_size: default_reward_size(),
            hidden_size: default_hidden_size(),
            learning_rate: default_learning_rate(),
            inc_var_loss: true,
            logvar_reg_coef: default_logvar_reg_coef(),
            max_logvar_init: default_max_logvar(),
            min_logvar_init: default_min_logvar(),
            loss_tracking: LossTracking::default(),
            check_finite: true,
            seed: None,
            device: Device::default(),
        }
    }

    #[must_use]
    pub fn with_reward_size(mut self, reward_size: usize) -> Self {
        self.reward_size = reward_size;
        self
    }

    #[must_use]
    pub fn with_hidden_size(mut self, hidden_size: usize) -> Self {
        self.hidden_size = hidden_size;
        self
    }

    #[must_use]
    pub fn with_learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    #[must_use]
    pub fn with_inc_var_loss(mut self, inc_var_loss: bool) -> Self {
        self.inc_var_loss = inc_var_loss;
        self
    }

    #[must_use]
    pub fn with_logvar_reg_coef(mut self, coef: f32) -> Self {
        self.logvar_reg_coef = coef;
        self
    }

    #[must_use]
    pub fn with_logvar_bounds(mut self, max_logvar: f32, min_logvar: f32) -> Self {
        self.max_logvar_init = max_logvar;
        self.min_logvar_init = min_logvar;
        self
    }

    #[must_use]
    pub fn with_loss_tracking(mut self, loss_tracking: LossTracking) -> Self {
        self.loss_tracking = loss_tracking;
        self
    }

    #[must_use]
    pub fn with_check_finite(mut self, check_finite: bool) -> Self {
        self.check_finite = check_finite;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// Columns of an input row: `state_size + action_size`.
    #[must_use]
    pub fn input_dim(&self) -> usize {
        self.state_size + self.action_size
    }

    /// Columns of a label row: `state_size + reward_size`.
    #[must_use]
    pub fn output_dim(&self) -> usize {
        self.state_size + self.reward_size
    }

    pub fn validate(&self) -> Result<(), EnsembleError> {
        if self.network_size == 0 {
            return Err(EnsembleError::EmptyEnsemble);
        }
        if self.elite_size == 0 || self.elite_size > self.network_size {
            return Err(EnsembleError::EliteSize { elite_size: self.elite_size, network_size: self.network_size });
        }
        if self.hidden_size == 0 {
            return Err(EnsembleError::HiddenSize);
        }
        if self.input_dim() == 0 {
            return Err(EnsembleError::InputDim);
        }
        if self.output_dim() == 0 {
            return Err(EnsembleError::OutputDim);
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(EnsembleError::LearningRate(self.learning_rate));
        }
        Ok(())
    }

    pub(crate) fn member_settings(&self) -> MemberSettings {
        MemberSettings {
            hidden_size: self.hidden_size,
            learning_rate: self.learning_rate,
            logvar_reg_coef: self.logvar_reg_coef,
            max_logvar_init: self.max_logvar_init,
            min_logvar_init: self.min_logvar_init,
        }
    }
}
