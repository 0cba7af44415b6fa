use crate::{BufferView, ComputeError};

pub fn handle_reduce_sum(binds: &[BufferView]) -> Result<Vec<Vec<u8>>, ComputeError> {
    if binds.len() < 3 {
        return Err(ComputeError::ShapeMismatch(
            "ReduceSum kernel expects 3 buffers",
        ));
    }
    let input_values = super::f32_values(
        &binds[0],
        "ReduceSum kernel currently only supports f32 input data",
    )?;
    let sum_value: f32 = input_values.iter().sum();
    Ok(vec![bytemuck::bytes_of(&sum_value).to_vec()])
}
