use crate::{BufferView, ComputeError};

pub fn handle_mul(binds: &[BufferView]) -> Result<Vec<Vec<u8>>, ComputeError> {
    super::binary(binds, "Mul kernel currently only supports f32 data for both inputs", |a, b| a * b)
}
