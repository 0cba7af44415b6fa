use crate::{BufferView, ComputeError};

pub fn handle_neg(binds: &[BufferView]) -> Result<Vec<Vec<u8>>, ComputeError> {
    super::unary(binds, "Neg kernel currently only supports f32 data", |x| -x)
}

#[cfg(test)]
mod tests {
    use crate::kernels::test_support::run_unary;
    use crate::Kernel;

    #[test]
    fn test_neg() {
        let result = run_unary(Kernel::Neg, &[1.0, -1.0, 0.0, 5.0, -5.0]);
        assert_eq!(result, vec![-1.0, 1.0, 0.0, -5.0, 5.0]);
    }
}
