use super::sigmoid;
use crate::{BufferView, ComputeError};

/// `x * sigmoid(x)`, element-wise.
pub fn handle_swish(binds: &[BufferView]) -> Result<Vec<Vec<u8>>, ComputeError> {
    super::unary(binds, "Swish kernel currently only supports f32 data", |x| x * sigmoid(x))
}
