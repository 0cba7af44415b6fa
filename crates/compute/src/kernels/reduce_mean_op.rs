use crate::{BufferView, ComputeError};

/// Calculates the mean of all elements in the input buffer.
///
/// Bindings `[input, output_placeholder, config]` must use `f32` values. The
/// resulting mean is written to a single buffer which is returned. An empty
/// input has mean `0.0`.
pub fn handle_reduce_mean(binds: &[BufferView]) -> Result<Vec<Vec<u8>>, ComputeError> {
    if binds.len() < 3 {
        return Err(ComputeError::ShapeMismatch(
            "ReduceMean kernel expects 3 buffers",
        ));
    }
    let input_values = super::f32_values(
        &binds[0],
        "ReduceMean kernel currently only supports f32 input data",
    )?;
    let count = input_values.len();
    let mean_value: f32 = if count == 0 {
        0.0
    } else {
        input_values.iter().sum::<f32>() / count as f32
    };
    Ok(vec![bytemuck::bytes_of(&mean_value).to_vec()])
}
