use crate::{kernels, BufferView, ComputeBackend, ComputeError, Kernel};

#[derive(Default, Debug, Clone)]
pub struct CpuBackend;

impl CpuBackend {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ComputeBackend for CpuBackend {
    fn dispatch(
        &self,
        shader: &Kernel,
        binds: &[BufferView],
        _workgroups: [u32; 3],
    ) -> Result<Vec<Vec<u8>>, ComputeError> {
        for buffer_view in binds {
            let expected_bytes = buffer_view.element_count() * buffer_view.element_size_in_bytes;

            if buffer_view.data.len() != expected_bytes {
                return Err(ComputeError::ShapeMismatch(
                    "Buffer data length does not match product of shape dimensions and element size",
                ));
            }
        }
        if binds.len() < shader.binding_count() as usize {
            return Err(ComputeError::ShapeMismatch("too few buffers bound for kernel"));
        }
        match shader {
            Kernel::Add => kernels::handle_add(binds),
            Kernel::Sub => kernels::handle_sub(binds),
            Kernel::Mul => kernels::handle_mul(binds),
            Kernel::Neg => kernels::handle_neg(binds),
            Kernel::Scale => kernels::handle_scale(binds),
            Kernel::Exp => kernels::handle_exp(binds),
            Kernel::Swish => kernels::handle_swish(binds),
            Kernel::Softplus => kernels::handle_softplus(binds),
            Kernel::AddBroadcast => kernels::handle_add_broadcast(binds),
            Kernel::ReduceSum => kernels::handle_reduce_sum(binds),
            Kernel::ReduceMean => kernels::handle_reduce_mean(binds),
            Kernel::MatMul => kernels::handle_matmul(binds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_shape_fails() {
        let cpu = CpuBackend::new();
        let bad_buf = BufferView::new(vec![0u8; 12].into(), vec![4], 4);
        let good_buf = BufferView::new(vec![0u8; 16].into(), vec![4], 4);
        let out_buf = BufferView::new(vec![0u8; 16].into(), vec![4], 4);
        let cfg = BufferView::new(vec![0u8; 4].into(), vec![1], 4);
        let result = cpu.dispatch(&Kernel::Add, &[bad_buf, good_buf, out_buf, cfg], [1, 1, 1]);
        assert!(
            matches!(result, Err(ComputeError::ShapeMismatch(_))),
            "Expected ShapeMismatch error, got {result:?}"
        );
    }

    #[test]
    fn empty_binds_fail() {
        let cpu = CpuBackend::new();
        let result = cpu.dispatch(&Kernel::Add, &[], [1, 1, 1]);
        assert!(matches!(result, Err(ComputeError::ShapeMismatch(_))));
    }

    #[test]
    fn too_few_buffers_fail() {
        let cpu = CpuBackend::new();
        let a = BufferView::from_f32s(&[1.0, 2.0], vec![2]);
        let out = BufferView::placeholder(vec![2]);
        let result = cpu.dispatch(&Kernel::Mul, &[a.clone(), a, out], [1, 1, 1]);
        assert!(matches!(result, Err(ComputeError::ShapeMismatch(_))));
    }

    #[test]
    fn shape_product_is_zero() {
        let cpu = CpuBackend::new();
        let empty = BufferView::new(vec![0u8; 0].into(), vec![0, 4], 4);
        let out = BufferView::placeholder(vec![0, 4]);
        let cfg = BufferView::config(&0u32);
        let result = cpu.dispatch(&Kernel::Add, &[empty.clone(), empty.clone(), out, cfg.clone()], [1, 1, 1]);
        assert!(result.is_ok(), "Expected Ok for zero-product shape with zero data, got {result:?}");

        let nonzero = BufferView::new(vec![0u8; 1].into(), vec![0, 4], 1);
        let result2 = cpu.dispatch(&Kernel::Add, &[nonzero, empty.clone(), empty, cfg], [1, 1, 1]);
        assert!(
            matches!(result2, Err(ComputeError::ShapeMismatch(_))),
            "Expected ShapeMismatch for zero-product shape with non-zero data, got {result2:?}"
        );
    }
}
