use crate::{BufferView, ComputeError};

pub fn handle_sub(binds: &[BufferView]) -> Result<Vec<Vec<u8>>, ComputeError> {
    super::binary(binds, "Sub kernel currently only supports f32 data for both inputs", |a, b| a - b)
}

#[cfg(test)]
mod tests {
    use crate::kernels::test_support::run_binary;
    use crate::Kernel;

    #[test]
    fn test_sub() {
        let result = run_binary(Kernel::Sub, &[1.0, 2.0, 3.0, 4.0], &[5.0, 6.0, 7.0, 8.0]);
        assert_eq!(result, vec![-4.0, -4.0, -4.0, -4.0]);
    }
}
