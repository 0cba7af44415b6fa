// This module re-exports handlers for each kernel operation.

use crate::{read_f32s, BufferView, ComputeError};

// Element-wise operations
pub mod add_op;
pub use add_op::handle_add;
pub mod sub_op;
pub use sub_op::handle_sub;
pub mod mul_op;
pub use mul_op::handle_mul;
pub mod neg_op;
pub use neg_op::handle_neg;
pub mod scale_op;
pub use scale_op::handle_scale;
pub mod exp_op;
pub use exp_op::handle_exp;
pub mod swish_op;
pub use swish_op::handle_swish;
pub mod softplus_op;
pub use softplus_op::handle_softplus;
pub mod add_broadcast_op;
pub use add_broadcast_op::handle_add_broadcast;

// Reductions
pub mod reduce_sum_op;
pub use reduce_sum_op::handle_reduce_sum;
pub mod reduce_mean_op;
pub use reduce_mean_op::handle_reduce_mean;

// Linear algebra
pub mod matmul_op;
pub use matmul_op::handle_matmul;

/// Logistic function, evaluated so that `exp` never sees a positive argument.
#[must_use]
pub fn sigmoid(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + e^x)` without overflow for large `x`.
#[must_use]
pub fn softplus(x: f32) -> f32 {
    x.max(0.0) + (-x.abs()).exp().ln_1p()
}

/// Reads an `f32` binding, rejecting any other element size.
pub(crate) fn f32_values(view: &BufferView, err: &'static str) -> Result<Vec<f32>, ComputeError> {
    if view.element_size_in_bytes != std::mem::size_of::<f32>() {
        return Err(ComputeError::ShapeMismatch(err));
    }
    Ok(read_f32s(&view.data))
}

/// Shared body of the one-input element-wise kernels.
pub(crate) fn unary(
    binds: &[BufferView],
    err: &'static str,
    f: impl Fn(f32) -> f32,
) -> Result<Vec<Vec<u8>>, ComputeError> {
    // IN, OUT_placeholder, CONFIG per layout.rs
    if binds.len() < 2 {
        return Err(ComputeError::ShapeMismatch("unary kernels expect an input and an output buffer"));
    }
    let input_values = f32_values(&binds[0], err)?;
    let output_values: Vec<f32> = input_values.into_iter().map(f).collect();
    Ok(vec![bytemuck::cast_slice(&output_values).to_vec()])
}

/// Shared body of the two-input element-wise kernels.
pub(crate) fn binary(
    binds: &[BufferView],
    err: &'static str,
    f: impl Fn(f32, f32) -> f32,
) -> Result<Vec<Vec<u8>>, ComputeError> {
    // IN1, IN2, OUT, CONFIG per layout.rs
    if binds.len() < 3 {
        return Err(ComputeError::ShapeMismatch("binary kernels expect two inputs and an output buffer"));
    }
    let input_a_view = &binds[0];
    let input_b_view = &binds[1];
    if input_a_view.shape != input_b_view.shape {
        return Err(ComputeError::ShapeMismatch(
            "Input buffers for element-wise kernels must have the same shape",
        ));
    }
    let a = f32_values(input_a_view, err)?;
    let b = f32_values(input_b_view, err)?;
    let output_values: Vec<f32> = a.iter().zip(b.iter()).map(|(&x, &y)| f(x, y)).collect();
    Ok(vec![bytemuck::cast_slice(&output_values).to_vec()])
}
