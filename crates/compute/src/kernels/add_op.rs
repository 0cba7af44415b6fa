use crate::{BufferView, ComputeError};

pub fn handle_add(binds: &[BufferView]) -> Result<Vec<Vec<u8>>, ComputeError> {
    super::binary(binds, "Add kernel currently only supports f32 data for both inputs", |a, b| a + b)
}
