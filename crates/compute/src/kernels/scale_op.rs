use crate::{BufferView, ComputeError};

/// Multiplies every element by a scalar.
///
/// Bindings `[input, output_placeholder, config]`, where `config` holds a
/// single `f32` factor.
pub fn handle_scale(binds: &[BufferView]) -> Result<Vec<Vec<u8>>, ComputeError> {
    if binds.len() < 3 {
        return Err(ComputeError::ShapeMismatch(
            "Scale kernel expects 3 buffers (input, output_placeholder, config)",
        ));
    }
    let config_view = &binds[2];
    if config_view.data.len() != std::mem::size_of::<f32>() {
        return Err(ComputeError::ShapeMismatch(
            "Scale config buffer must hold exactly one f32",
        ));
    }
    let factor: f32 = bytemuck::pod_read_unaligned(&config_view.data);
    super::unary(binds, "Scale kernel currently only supports f32 data", |x| x * factor)
}
