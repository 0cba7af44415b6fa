use compute::ComputeError;
use ml::MlError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnsembleError {
    #[error("ensemble needs at least one member")]
    EmptyEnsemble,
    #[error("elite size {elite_size} must be in 1..={network_size}")]
    EliteSize { elite_size: usize, network_size: usize },
    #[error("hidden size must be at least 1")]
    HiddenSize,
    #[error("state_size + action_size must be at least 1")]
    InputDim,
    #[error("state_size + reward_size must be at least 1")]
    OutputDim,
    #[error("learning rate must be positive and finite, got {0}")]
    LearningRate(f32),
    #[error("{what} must be shaped [rows, {expected}], got {shape:?}")]
    InputShape {
        what: &'static str,
        expected: usize,
        shape: Vec<usize>,
    },
    #[error("inputs have {inputs} rows but labels have {labels}")]
    RowMismatch { inputs: usize, labels: usize },
    #[error("batch size must be at least 1")]
    BatchSize,
    #[error("training data is empty")]
    EmptyDataset,
    #[error("member {index} out of range for an ensemble of {network_size}")]
    MemberIndex { index: usize, network_size: usize },
    #[error("member {member} produced a non-finite {what}")]
    NonFinite { member: usize, what: &'static str },
    #[error(transparent)]
    Ml(#[from] MlError),
    #[error(transparent)]
    Compute(#[from] ComputeError),
}
