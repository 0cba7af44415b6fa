use super::softplus;
use crate::{BufferView, ComputeError};

pub fn handle_softplus(binds: &[BufferView]) -> Result<Vec<Vec<u8>>, ComputeError> {
    super::unary(binds, "Softplus kernel currently only supports f32 data", softplus)
}
