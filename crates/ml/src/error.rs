use compute::ComputeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MlError {
    #[error("shape mismatch in {op}: {lhs:?} vs {rhs:?}")]
    ShapeMismatch {
        op: &'static str,
        lhs: Vec<usize>,
        rhs: Vec<usize>,
    },
    #[error("{op} expects a rank-{expected} tensor, got shape {shape:?}")]
    Rank {
        op: &'static str,
        expected: usize,
        shape: Vec<usize>,
    },
    #[error("data length {len} does not match shape {shape:?}")]
    DataLength { len: usize, shape: Vec<usize> },
    #[error("loss must be a scalar, got shape {0:?}")]
    NonScalarLoss(Vec<usize>),
    #[error("tape has no value recorded for tensor {0}")]
    MissingValue(usize),
    #[error("optimizer tracks {expected} parameters, got {actual}")]
    ParamCount { expected: usize, actual: usize },
    #[error(transparent)]
    Compute(#[from] ComputeError),
}
