use crate::error::MlError;
use crate::graph::{EOp, Node};
use crate::recorder::Recorder;
use compute::{read_f32s, BufferView, ComputeBackend, ComputeError, Kernel, MatMulConfig};
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

fn next_id() -> usize {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// A dense row-major `f32` array.
///
/// Every tensor carries an `id` used by the tape to find it again. Clones keep
/// the id, so a parameter updated in place is still the same tensor.
#[derive(Clone, Debug)]
pub struct Tensor {
    pub id: usize,
    pub data: Vec<f32>,
    pub shape: Vec<usize>,
    pub requires_grad: bool,
}

impl Tensor {
    /// # Panics
    ///
    /// Panics if `data.len()` differs from the product of `shape`.
    #[must_use]
    pub fn from_vec(shape: Vec<usize>, data: Vec<f32>) -> Self {
        assert_eq!(shape.iter().product::<usize>(), data.len());
        Self { id: next_id(), data, shape, requires_grad: false }
    }

    /// Fallible [`Tensor::from_vec`] for data coming from outside the crate.
    pub fn try_from_vec(shape: Vec<usize>, data: Vec<f32>) -> Result<Self, MlError> {
        if shape.iter().product::<usize>() != data.len() {
            return Err(MlError::DataLength { len: data.len(), shape });
        }
        Ok(Self::from_vec(shape, data))
    }

    /// Builds a tensor from any element type losslessly convertible to `f32`,
    /// e.g. byte-encoded labels.
    pub fn from_converted<T: Copy + Into<f32>>(shape: Vec<usize>, values: &[T]) -> Result<Self, MlError> {
        Self::try_from_vec(shape, values.iter().map(|&v| v.into()).collect())
    }

    #[must_use]
    pub fn zeros(shape: Vec<usize>) -> Self {
        Self::full(shape, 0.0)
    }

    #[must_use]
    pub fn full(shape: Vec<usize>, value: f32) -> Self {
        let len = shape.iter().product();
        Self::from_vec(shape, vec![value; len])
    }

    /// Marks the tensor as a leaf whose gradient [`crate::Tape::backward`] reports.
    #[must_use]
    pub fn with_grad(mut self) -> Self {
        self.requires_grad = true;
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Extent of the first axis.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.shape.first().copied().unwrap_or(0)
    }

    /// Number of values per row, i.e. the product of all axes after the first.
    #[must_use]
    pub fn cols(&self) -> usize {
        self.shape.iter().skip(1).product()
    }

    /// `(rows, cols)` of a rank-2 tensor.
    pub fn dims2(&self) -> Result<(usize, usize), MlError> {
        match self.shape.as_slice() {
            &[rows, cols] => Ok((rows, cols)),
            _ => Err(MlError::Rank { op: "dims2", expected: 2, shape: self.shape.clone() }),
        }
    }

    /// Rows `start..end` along the first axis, clamped to the tensor's extent.
    /// The result is a new tensor with its own id.
    pub fn slice_rows(&self, start: usize, end: usize) -> Result<Tensor, MlError> {
        let Some((&rows, rest)) = self.shape.split_first() else {
            return Err(MlError::Rank { op: "slice_rows", expected: 1, shape: self.shape.clone() });
        };
        let width: usize = rest.iter().product();
        let end = end.min(rows);
        let start = start.min(end);
        let mut shape = self.shape.clone();
        shape[0] = end - start;
        Ok(Tensor::from_vec(shape, self.data[start * width..end * width].to_vec()))
    }

    /// The single value of a one-element tensor.
    #[must_use]
    pub fn item(&self) -> Option<f32> {
        match self.data.as_slice() {
            &[v] => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }

    fn view(&self) -> BufferView {
        BufferView::from_f32s(&self.data, self.shape.clone())
    }

    fn expect_same_shape(&self, other: &Tensor, op: &'static str) -> Result<(), MlError> {
        if self.shape != other.shape {
            return Err(MlError::ShapeMismatch { op, lhs: self.shape.clone(), rhs: other.shape.clone() });
        }
        Ok(())
    }

    fn unary_op<R: Recorder + ?Sized>(
        &self,
        kernel: Kernel,
        op: EOp,
        config: BufferView,
        rec: &mut R,
    ) -> Result<Tensor, MlError> {
        let binds = [self.view(), BufferView::placeholder(self.shape.clone()), config];
        let data = run_kernel(rec.backend(), kernel, &binds, self.len())?;
        let out = Tensor::from_vec(self.shape.clone(), data);
        rec.record(Node { op, a: self.id, b: None, out: out.id }, &[self], &out);
        Ok(out)
    }

    fn binary_op<R: Recorder + ?Sized>(
        &self,
        other: &Tensor,
        kernel: Kernel,
        op: EOp,
        name: &'static str,
        rec: &mut R,
    ) -> Result<Tensor, MlError> {
        self.expect_same_shape(other, name)?;
        let binds = [
            self.view(),
            other.view(),
            BufferView::placeholder(self.shape.clone()),
            BufferView::config(&0u32),
        ];
        let data = run_kernel(rec.backend(), kernel, &binds, self.len())?;
        let out = Tensor::from_vec(self.shape.clone(), data);
        rec.record(Node { op, a: self.id, b: Some(other.id), out: out.id }, &[self, other], &out);
        Ok(out)
    }

    pub fn add<R: Recorder + ?Sized>(&self, other: &Tensor, rec: &mut R) -> Result<Tensor, MlError> {
        self.binary_op(other, Kernel::Add, EOp::Add, "add", rec)
    }

    pub fn sub<R: Recorder + ?Sized>(&self, other: &Tensor, rec: &mut R) -> Result<Tensor, MlError> {
        self.binary_op(other, Kernel::Sub, EOp::Sub, "sub", rec)
    }

    pub fn mul<R: Recorder + ?Sized>(&self, other: &Tensor, rec: &mut R) -> Result<Tensor, MlError> {
        self.binary_op(other, Kernel::Mul, EOp::Mul, "mul", rec)
    }

    pub fn neg<R: Recorder + ?Sized>(&self, rec: &mut R) -> Result<Tensor, MlError> {
        self.unary_op(Kernel::Neg, EOp::Neg, BufferView::config(&0u32), rec)
    }

    pub fn scale<R: Recorder + ?Sized>(&self, factor: f32, rec: &mut R) -> Result<Tensor, MlError> {
        self.unary_op(Kernel::Scale, EOp::Scale(factor), BufferView::config(&factor), rec)
    }

    pub fn exp<R: Recorder + ?Sized>(&self, rec: &mut R) -> Result<Tensor, MlError> {
        self.unary_op(Kernel::Exp, EOp::Exp, BufferView::config(&0u32), rec)
    }

    /// `x * sigmoid(x)`.
    pub fn swish<R: Recorder + ?Sized>(&self, rec: &mut R) -> Result<Tensor, MlError> {
        self.unary_op(Kernel::Swish, EOp::Swish, BufferView::config(&0u32), rec)
    }

    /// `ln(1 + exp(x))`.
    pub fn softplus<R: Recorder + ?Sized>(&self, rec: &mut R) -> Result<Tensor, MlError> {
        self.unary_op(Kernel::Softplus, EOp::Softplus, BufferView::config(&0u32), rec)
    }

    /// Adds `row` (holding `cols` values) to every row of this `[rows, cols]` tensor.
    pub fn add_broadcast<R: Recorder + ?Sized>(&self, row: &Tensor, rec: &mut R) -> Result<Tensor, MlError> {
        let (_, cols) = self.dims2()?;
        if row.len() != cols {
            return Err(MlError::ShapeMismatch { op: "add_broadcast", lhs: self.shape.clone(), rhs: row.shape.clone() });
        }
        let binds = [self.view(), row.view(), BufferView::placeholder(self.shape.clone())];
        let data = run_kernel(rec.backend(), Kernel::AddBroadcast, &binds, self.len())?;
        let out = Tensor::from_vec(self.shape.clone(), data);
        rec.record(Node { op: EOp::AddBroadcast, a: self.id, b: Some(row.id), out: out.id }, &[self, row], &out);
        Ok(out)
    }

    /// `self · wᵀ` for `self: [batch, in]` and `w: [out, in]`, giving `[batch, out]`.
    pub fn matmul_t<R: Recorder + ?Sized>(&self, w: &Tensor, rec: &mut R) -> Result<Tensor, MlError> {
        let (m, k) = self.dims2()?;
        let (n, w_k) = w.dims2()?;
        if k != w_k {
            return Err(MlError::ShapeMismatch { op: "matmul_t", lhs: self.shape.clone(), rhs: w.shape.clone() });
        }
        let config = MatMulConfig { m: dim_u32(m)?, k: dim_u32(k)?, n: dim_u32(n)?, transpose_b: 1 };
        let binds = [
            self.view(),
            w.view(),
            BufferView::placeholder(vec![m, n]),
            BufferView::config(&config),
        ];
        let data = run_kernel(rec.backend(), Kernel::MatMul, &binds, m * n)?;
        let out = Tensor::from_vec(vec![m, n], data);
        rec.record(Node { op: EOp::MatMulT, a: self.id, b: Some(w.id), out: out.id }, &[self, w], &out);
        Ok(out)
    }

    /// Columns `start..start + len` of a rank-2 tensor.
    pub fn narrow<R: Recorder + ?Sized>(&self, start: usize, len: usize, rec: &mut R) -> Result<Tensor, MlError> {
        let (rows, cols) = self.dims2()?;
        if start + len > cols {
            return Err(MlError::ShapeMismatch { op: "narrow", lhs: self.shape.clone(), rhs: vec![rows, start + len] });
        }
        let mut data = Vec::with_capacity(rows * len);
        for r in 0..rows {
            data.extend_from_slice(&self.data[r * cols + start..r * cols + start + len]);
        }
        let out = Tensor::from_vec(vec![rows, len], data);
        rec.record(Node { op: EOp::Narrow { start }, a: self.id, b: None, out: out.id }, &[self], &out);
        Ok(out)
    }

    pub fn reduce_sum<R: Recorder + ?Sized>(&self, rec: &mut R) -> Result<Tensor, MlError> {
        self.reduce(Kernel::ReduceSum, EOp::ReduceSum, rec)
    }

    pub fn reduce_mean<R: Recorder + ?Sized>(&self, rec: &mut R) -> Result<Tensor, MlError> {
        self.reduce(Kernel::ReduceMean, EOp::ReduceMean, rec)
    }

    fn reduce<R: Recorder + ?Sized>(&self, kernel: Kernel, op: EOp, rec: &mut R) -> Result<Tensor, MlError> {
        let binds = [self.view(), BufferView::placeholder(vec![1]), BufferView::config(&0u32)];
        let data = run_kernel(rec.backend(), kernel, &binds, 1)?;
        let out = Tensor::from_vec(vec![1], data);
        rec.record(Node { op, a: self.id, b: None, out: out.id }, &[self], &out);
        Ok(out)
    }
}

fn dim_u32(dim: usize) -> Result<u32, MlError> {
    u32::try_from(dim).map_err(|_| MlError::from(ComputeError::ShapeMismatch("dimension exceeds u32")))
}

fn run_kernel(
    backend: &dyn ComputeBackend,
    kernel: Kernel,
    binds: &[BufferView],
    expected_len: usize,
) -> Result<Vec<f32>, MlError> {
    let groups = u32::try_from(expected_len.div_ceil(256)).unwrap_or(u32::MAX);
    let buffers = backend.dispatch(&kernel, binds, [groups.max(1), 1, 1])?;
    let bytes = buffers.first().ok_or(ComputeError::EmptyOutput(kernel))?;
    let values = read_f32s(bytes);
    if values.len() != expected_len {
        return Err(MlError::DataLength { len: values.len(), shape: vec![expected_len] });
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_ids_and_new_tensors_do_not() {
        let a = Tensor::zeros(vec![2]);
        let b = a.clone();
        let c = Tensor::zeros(vec![2]);
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn try_from_vec_rejects_bad_length() {
        assert!(matches!(
            Tensor::try_from_vec(vec![2, 2], vec![1.0; 3]),
            Err(MlError::DataLength { len: 3, .. })
        ));
    }

    #[test]
    fn from_converted_widens_bytes() {
        let t = Tensor::from_converted(vec![3], &[0u8, 7, 255]).unwrap();
        assert_eq!(t.data, vec![0.0, 7.0, 255.0]);
    }

    #[test]
    fn slice_rows_clamps_to_extent() {
        let t = Tensor::from_vec(vec![3, 2], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let s = t.slice_rows(2, 10).unwrap();
        assert_eq!(s.shape, vec![1, 2]);
        assert_eq!(s.data, vec![5.0, 6.0]);
        assert_ne!(s.id, t.id);
        assert_eq!(t.slice_rows(3, 5).unwrap().shape, vec![0, 2]);
    }

    #[test]
    fn item_requires_a_single_value() {
        assert_eq!(Tensor::full(vec![1], 2.5).item(), Some(2.5));
        assert_eq!(Tensor::zeros(vec![2]).item(), None);
    }
}
