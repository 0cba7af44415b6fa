use crate::{BufferView, ComputeError};

/// Adds a row vector to each row of a matrix.
///
/// Bindings `[a, b, output_placeholder]` expect `a` shaped `[batch, dim]` and
/// `b` holding `dim` values (`[dim]` or `[1, dim]`). The broadcasted sum is
/// returned in a single buffer.
pub fn handle_add_broadcast(binds: &[BufferView]) -> Result<Vec<Vec<u8>>, ComputeError> {
    if binds.len() < 3 {
        return Err(ComputeError::ShapeMismatch(
            "AddBroadcast kernel expects 3 buffers (a, b, output_placeholder)",
        ));
    }
    let a_view = &binds[0];
    let b_view = &binds[1];

    if a_view.shape.len() != 2 {
        return Err(ComputeError::ShapeMismatch(
            "AddBroadcast expects a rank-2 left operand",
        ));
    }
    let batch = a_view.shape[0];
    let dim = a_view.shape[1];
    if b_view.element_count() != dim {
        return Err(ComputeError::ShapeMismatch(
            "AddBroadcast row vector length must equal the matrix width",
        ));
    }

    let err = "AddBroadcast kernel currently only supports f32";
    let a_data = super::f32_values(a_view, err)?;
    let b_data = super::f32_values(b_view, err)?;
    let mut out_data = vec![0.0f32; batch * dim];

    for b_idx in 0..batch {
        for i in 0..dim {
            out_data[b_idx * dim + i] = a_data[b_idx * dim + i] + b_data[i];
        }
    }

    Ok(vec![bytemuck::cast_slice(&out_data).to_vec()])
}
