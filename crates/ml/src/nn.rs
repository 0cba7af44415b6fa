use crate::error::MlError;
use crate::recorder::Recorder;
use crate::tensor::Tensor;

/// A differentiable building block with optional trainable parameters.
pub trait Layer: Send + Sync {
    fn forward(&self, x: &Tensor, rec: &mut dyn Recorder) -> Result<Tensor, MlError>;

    fn params(&self) -> Vec<&Tensor> {
        Vec::new()
    }

    fn params_mut(&mut self) -> Vec<&mut Tensor> {
        Vec::new()
    }
}

/// A fully connected neural network layer.
#[derive(Clone, Debug)]
pub struct Dense {
    /// The weight matrix, shaped `[out_dim, in_dim]`.
    pub w: Tensor,
    /// The bias vector, shaped `[out_dim]`.
    pub b: Tensor,
    pub in_dim: usize,
    pub out_dim: usize,
}

impl Dense {
    /// Creates a new `Dense` layer with the given weights and biases.
    ///
    /// # Panics
    ///
    /// Panics if `weights` does not hold `in_d * out_d` values or `bias` does
    /// not hold `out_d` values.
    #[must_use]
    pub fn new(weights: Vec<f32>, bias: Vec<f32>, in_d: usize, out_d: usize) -> Self {
        assert_eq!(weights.len(), in_d * out_d);
        assert_eq!(bias.len(), out_d);
        Self {
            w: Tensor::from_vec(vec![out_d, in_d], weights).with_grad(),
            b: Tensor::from_vec(vec![out_d], bias).with_grad(),
            in_dim: in_d,
            out_dim: out_d,
        }
    }

    /// Weights and bias drawn from `U(-1/√in, 1/√in)`.
    pub fn random(in_d: usize, out_d: usize, rng: &mut fastrand::Rng) -> Self {
        let bound = 1.0 / (in_d.max(1) as f32).sqrt();
        let mut draw = |n: usize| -> Vec<f32> { (0..n).map(|_| (rng.f32() * 2.0 - 1.0) * bound).collect() };
        let weights = draw(in_d * out_d);
        let bias = draw(out_d);
        Self::new(weights, bias, in_d, out_d)
    }
}

impl Layer for Dense {
    /// `x · Wᵀ + b` for `x` shaped `[batch, in_dim]`.
    fn forward(&self, x: &Tensor, rec: &mut dyn Recorder) -> Result<Tensor, MlError> {
        let wx = x.matmul_t(&self.w, rec)?;
        wx.add_broadcast(&self.b, rec)
    }

    fn params(&self) -> Vec<&Tensor> {
        vec![&self.w, &self.b]
    }

    fn params_mut(&mut self) -> Vec<&mut Tensor> {
        vec![&mut self.w, &mut self.b]
    }
}

/// Element-wise `x * sigmoid(x)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Swish;

impl Layer for Swish {
    fn forward(&self, x: &Tensor, rec: &mut dyn Recorder) -> Result<Tensor, MlError> {
        x.swish(rec)
    }
}

/// Layers applied in order.
#[derive(Default)]
pub struct Sequential {
    layers: Vec<Box<dyn Layer>>,
}

impl Sequential {
    pub fn push(&mut self, layer: impl Layer + 'static) {
        self.layers.push(Box::new(layer));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl Layer for Sequential {
    fn forward(&self, x: &Tensor, rec: &mut dyn Recorder) -> Result<Tensor, MlError> {
        let mut h = x.clone();
        for layer in &self.layers {
            h = layer.forward(&h, rec)?;
        }
        Ok(h)
    }

    fn params(&self) -> Vec<&Tensor> {
        self.layers.iter().flat_map(|l| l.params()).collect()
    }

    fn params_mut(&mut self) -> Vec<&mut Tensor> {
        self.layers.iter_mut().flat_map(|l| l.params_mut()).collect()
    }
}
