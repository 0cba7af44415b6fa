/// Differentiable operations that can appear on a tape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EOp {
    Add,
    Sub,
    Mul,
    Neg,
    Scale(f32),
    Exp,
    Swish,
    Softplus,
    /// Matrix plus a row vector broadcast over its rows.
    AddBroadcast,
    /// `a · bᵀ` with `a: [batch, in]` and `b: [out, in]`.
    MatMulT,
    /// Column slice of a rank-2 tensor starting at `start`.
    Narrow { start: usize },
    ReduceSum,
    ReduceMean,
}

/// One recorded operation: `out = op(a, b)`. Unary operations leave `b` empty.
#[derive(Clone, Debug)]
pub struct Node {
    pub op: EOp,
    pub a: usize,
    pub b: Option<usize>,
    pub out: usize,
}
