//! Probabilistic ensemble of feed-forward regressors.
//!
//! Each [`MemberNetwork`] predicts a Gaussian over the label space (mean plus
//! a log-variance kept inside learned bounds). [`EnsembleModel`] trains all
//! members on the same mini-batches, each with its own Adam state, and ranks
//! them into an elite subset after every `train` call.

pub mod config;
pub mod data;
pub mod error;
pub mod member;
pub mod model;
pub mod prediction;

pub use config::{EnsembleConfig, LossTracking};
pub use data::{DataProvider, Dataset, SyntheticProvider};
pub use error::EnsembleError;
pub use member::{MemberNetwork, MemberOutput, MemberSettings};
pub use model::{rank_elites, EnsembleModel};
pub use prediction::EnsemblePrediction;

pub const DEFAULT_TRAIN_BATCH_SIZE: usize = 256;
pub const DEFAULT_PREDICT_BATCH_SIZE: usize = 1024;
