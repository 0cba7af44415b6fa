use crate::{BufferView, ComputeError};

pub fn handle_exp(binds: &[BufferView]) -> Result<Vec<Vec<u8>>, ComputeError> {
    super::unary(binds, "Exp kernel currently only supports f32 data", f32::exp)
}
