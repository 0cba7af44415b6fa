#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss
)]

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

pub mod backend;
pub mod cpu_backend;
pub mod kernels;
pub mod layout;

pub use backend::ComputeBackend;
pub use cpu_backend::CpuBackend;

#[derive(Error, Debug)]
pub enum ComputeError {
    #[error("buffer shape mismatch: {0}")]
    ShapeMismatch(&'static str),
    #[error("backend not available")]
    BackendUnavailable,
    #[error("kernel {0:?} produced no output buffer")]
    EmptyOutput(Kernel),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kernel {
    // Element-wise
    Add, Sub, Mul, Neg, Scale,
    Exp, Swish, Softplus,
    AddBroadcast,

    // Reductions
    ReduceSum, ReduceMean,

    // Linear algebra
    MatMul,
}

impl Kernel {
    #[must_use]
    pub const fn binding_count(&self) -> u32 {
        layout::binding_count(self)
    }
}

/// Shape parameters for [`Kernel::MatMul`].
///
/// `A` is always `[m, k]`. `B` is `[k, n]`, or `[n, k]` when `transpose_b` is
/// non-zero, in which case the kernel computes `A · Bᵀ`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MatMulConfig {
    pub m: u32,
    pub k: u32,
    pub n: u32,
    pub transpose_b: u32,
}

#[derive(Clone)]
pub struct BufferView {
    pub data: Arc<[u8]>,
    pub shape: Vec<usize>, // Number of elements per dimension
    pub element_size_in_bytes: usize, // Size of a single element described by the innermost dimension of shape
}

impl BufferView {
    #[must_use]
    pub fn new(data: Arc<[u8]>, shape: Vec<usize>, element_size_in_bytes: usize) -> Self {
        Self { data, shape, element_size_in_bytes }
    }

    /// Wraps a slice of `f32` values.
    #[must_use]
    pub fn from_f32s(values: &[f32], shape: Vec<usize>) -> Self {
        Self::new(bytemuck::cast_slice(values).to_vec().into(), shape, std::mem::size_of::<f32>())
    }

    /// A zero-filled `f32` output placeholder of the given shape.
    #[must_use]
    pub fn placeholder(shape: Vec<usize>) -> Self {
        let len = shape.iter().product::<usize>() * std::mem::size_of::<f32>();
        Self::new(vec![0u8; len].into(), shape, std::mem::size_of::<f32>())
    }

    /// Wraps a single `Pod` configuration value.
    #[must_use]
    pub fn config<T: bytemuck::Pod>(value: &T) -> Self {
        Self::new(bytemuck::bytes_of(value).to_vec().into(), vec![1], std::mem::size_of::<T>())
    }

    /// Number of elements described by `shape`.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.shape.iter().product()
    }
}

/// Decodes native-endian `f32` values from a byte buffer of any alignment.
#[must_use]
pub fn read_f32s(bytes: &[u8]) -> Vec<f32> {
    match bytemuck::try_cast_slice::<u8, f32>(bytes) {
        Ok(values) => values.to_vec(),
        Err(_) => bytes
            .chunks_exact(std::mem::size_of::<f32>())
            .map(bytemuck::pod_read_unaligned::<f32>)
            .collect(),
    }
}

/// The compute device a model runs on.
///
/// Passed explicitly to whoever needs a backend; nothing in the workspace keeps
/// a process-global device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum Device {
    #[default]
    Cpu,
}

/// Creates the backend for `device`.
///
/// # Errors
///
/// Returns [`ComputeError::BackendUnavailable`] if the device cannot be
/// initialised in this build.
pub fn backend_for(device: Device) -> Result<Arc<dyn ComputeBackend>, ComputeError> {
    match device {
        Device::Cpu => {
            tracing::debug!("Using CpuBackend.");
            Ok(Arc::new(CpuBackend::new()))
        }
    }
}

/// Returns the CPU compute backend.
#[must_use]
pub fn default_backend() -> Arc<dyn ComputeBackend> {
    tracing::info!("Using CpuBackend.");
    Arc::new(CpuBackend::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_f32s_handles_unaligned_bytes() {
        let values = [1.5f32, -2.0, 3.25];
        let mut bytes = vec![0u8];
        bytes.extend_from_slice(bytemuck::cast_slice(&values));
        assert_eq!(read_f32s(&bytes[1..]), values.to_vec());
    }

    #[test]
    fn placeholder_matches_shape() {
        let view = BufferView::placeholder(vec![3, 2]);
        assert_eq!(view.data.len(), 24);
        assert_eq!(view.element_count(), 6);
    }

    #[test]
    fn kernel_binding_counts() {
        use crate::layout::binding_count;

        // Element-wise
        assert_eq!(binding_count(&Kernel::Add), 4);
        assert_eq!(binding_count(&Kernel::Sub), 4);
        assert_eq!(binding_count(&Kernel::Mul), 4);

        assert_eq!(binding_count(&Kernel::Neg), 3);
        assert_eq!(binding_count(&Kernel::Scale), 3);
        assert_eq!(binding_count(&Kernel::Exp), 3);
        assert_eq!(binding_count(&Kernel::Swish), 3);
        assert_eq!(binding_count(&Kernel::Softplus), 3);
        assert_eq!(binding_count(&Kernel::AddBroadcast), 3);

        // Reductions
        assert_eq!(binding_count(&Kernel::ReduceSum), 3);
        assert_eq!(binding_count(&Kernel::ReduceMean), 3);

        // Linear algebra
        assert_eq!(binding_count(&Kernel::MatMul), 4);
    }

    #[test]
    fn cpu_device_resolves_to_a_backend() {
        let backend = backend_for(Device::Cpu).expect("cpu backend");
        let a = BufferView::from_f32s(&[1.0, 2.0], vec![2]);
        let out = BufferView::placeholder(vec![2]);
        let cfg = BufferView::config(&0u32);
        let result = backend.dispatch(&Kernel::Neg, &[a, out, cfg], [1, 1, 1]).unwrap();
        assert_eq!(read_f32s(&result[0]), vec![-1.0, -2.0]);
    }
}
