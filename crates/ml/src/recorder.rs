use crate::graph::Node;
use crate::tensor::Tensor;
use compute::ComputeBackend;
use std::sync::Arc;

/// Execution context for tensor operations.
///
/// Every operation computes its forward value on [`Recorder::backend`] and then
/// reports itself through [`Recorder::record`].
pub trait Recorder {
    fn backend(&self) -> &dyn ComputeBackend;
    fn record(&mut self, node: Node, inputs: &[&Tensor], out: &Tensor);
}

/// Forward-only recorder. Nothing is kept, so no gradients can be computed.
pub struct Inference {
    backend: Arc<dyn ComputeBackend>,
}

impl Inference {
    #[must_use]
    pub fn new(backend: Arc<dyn ComputeBackend>) -> Self {
        Self { backend }
    }
}

impl Recorder for Inference {
    fn backend(&self) -> &dyn ComputeBackend {
        self.backend.as_ref()
    }

    fn record(&mut self, _node: Node, _inputs: &[&Tensor], _out: &Tensor) {}
}
