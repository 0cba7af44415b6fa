use crate::{BufferView, ComputeError, MatMulConfig};

pub fn handle_matmul(binds: &[BufferView]) -> Result<Vec<Vec<u8>>, ComputeError> {
    if binds.len() < 4 {
        return Err(ComputeError::ShapeMismatch(
            "MatMul kernel expects 4 buffers",
        ));
    }
    let a_view = &binds[0];
    let b_view = &binds[1];
    let config_view = &binds[3];

    if config_view.data.len() != std::mem::size_of::<MatMulConfig>() {
        return Err(ComputeError::ShapeMismatch(
            "MatMul config buffer has incorrect size",
        ));
    }
    let config: MatMulConfig = bytemuck::pod_read_unaligned(&config_view.data);
    let m = config.m as usize;
    let k = config.k as usize;
    let n = config.n as usize;
    let transpose_b = config.transpose_b != 0;

    let err = "MatMul kernel currently only supports f32 data for matrices A and B";
    let a_data = super::f32_values(a_view, err)?;
    let b_data = super::f32_values(b_view, err)?;

    if a_view.shape != [m, k] {
        return Err(ComputeError::ShapeMismatch(
            "Matrix A shape in BufferView does not match M,K from config",
        ));
    }
    let expected_b = if transpose_b { [n, k] } else { [k, n] };
    if b_view.shape != expected_b {
        return Err(ComputeError::ShapeMismatch(
            "Matrix B shape in BufferView does not match K,N from config",
        ));
    }

    let mut output_data = vec![0.0f32; m * n];
    for i in 0..m {
        let a_row = &a_data[i * k..(i + 1) * k];
        for j in 0..n {
            let mut sum = 0.0f32;
            if transpose_b {
                let b_row = &b_data[j * k..(j + 1) * k];
                for (x, w) in a_row.iter().zip(b_row) {
                    sum += x * w;
                }
            } else {
                for (l, x) in a_row.iter().enumerate() {
                    sum += x * b_data[l * n + j];
                }
            }
            output_data[i * n + j] = sum;
        }
    }

    Ok(vec![bytemuck::cast_slice(&output_data).to_vec()])
}

#[cfg(test)]
mod tests {
    use crate::{read_f32s, BufferView, ComputeBackend, ComputeError, CpuBackend, Kernel, MatMulConfig};

    fn dispatch(a: &[f32], a_shape: Vec<usize>, b: &[f32], b_shape: Vec<usize>, config: MatMulConfig) -> Result<Vec<f32>, ComputeError> {
        let cpu = CpuBackend::new();
        let dispatch_binds = [
            BufferView::from_f32s(a, a_shape),
            BufferView::from_f32s(b, b_shape),
            BufferView::placeholder(vec![config.m as usize, config.n as usize]),
            BufferView::config(&config),
        ];
        let result_buffers = cpu.dispatch(&Kernel::MatMul, &dispatch_binds, [1, 1, 1])?;
        assert_eq!(result_buffers.len(), 1);
        Ok(read_f32s(&result_buffers[0]))
    }

    #[test]
    fn matmul_multiplies_matrices() {
        let a_data = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
        let b_data = [7.0f32, 8.0, 9.0, 10.0, 11.0, 12.0];
        let config = MatMulConfig { m: 2, k: 3, n: 2, transpose_b: 0 };
        let result = dispatch(&a_data, vec![2, 3], &b_data, vec![3, 2], config).unwrap();
        assert_eq!(result, vec![58.0, 64.0, 139.0, 154.0]);
    }

    #[test]
    fn matmul_with_transposed_rhs() {
        // A[2,3] · W[2,3]ᵀ, the layout of a dense layer applied to a batch.
        let x = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
        let w = [1.0f32, 0.0, -1.0, 0.5, 0.5, 0.5];
        let config = MatMulConfig { m: 2, k: 3, n: 2, transpose_b: 1 };
        let result = dispatch(&x, vec![2, 3], &w, vec![2, 3], config).unwrap();
        assert_eq!(result, vec![-2.0, 3.0, -2.0, 7.5]);
    }

    #[test]
    fn matmul_rejects_inner_dimension_mismatch() {
        let config = MatMulConfig { m: 1, k: 3, n: 1, transpose_b: 1 };
        let result = dispatch(&[1.0; 3], vec![1, 3], &[1.0; 2], vec![1, 2], config);
        assert!(matches!(result, Err(ComputeError::ShapeMismatch(_))));
    }
}
