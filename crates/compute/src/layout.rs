/// Return expected number of bindings for each kernel.
#[must_use]
pub const fn binding_count(kernel: &crate::Kernel) -> u32 {
    match kernel {
        crate::Kernel::Add | crate::Kernel::Sub | crate::Kernel::Mul | crate::Kernel::MatMul => 4,
        crate::Kernel::Neg
        | crate::Kernel::Scale
        | crate::Kernel::Exp
        | crate::Kernel::Swish
        | crate::Kernel::Softplus
        | crate::Kernel::AddBroadcast
        | crate::Kernel::ReduceSum
        | crate::Kernel::ReduceMean => 3,
    }
}
