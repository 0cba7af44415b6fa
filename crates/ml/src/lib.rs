//! Tensors with tape-based reverse-mode differentiation.
//!
//! Forward values are computed by dispatching [`compute::Kernel`]s on the
//! backend owned by the active [`Recorder`]. A [`Tape`] additionally keeps the
//! operation graph so [`Tape::backward`] can produce [`Gradients`];
//! [`Inference`] keeps nothing and is used when no gradients are needed.

pub mod error;
pub mod graph;
pub mod nn;
pub mod optim;
pub mod recorder;
pub mod tape;
pub mod tensor;

pub use error::MlError;
pub use graph::{EOp, Node};
pub use nn::{Dense, Layer, Sequential, Swish};
pub use optim::Adam;
pub use recorder::{Inference, Recorder};
pub use tape::{Gradients, Tape};
pub use tensor::Tensor;
