use crate::error::MlError;
use crate::tape::Gradients;
use crate::Tensor;

/// Adam with bias-corrected moments.
///
/// Moment buffers are laid out in the order the parameters were passed to
/// [`Adam::new`]; [`Adam::step`] must receive them in the same order.
#[derive(Clone, Debug)]
pub struct Adam {
    lr: f32,
    beta1: f32,
    beta2: f32,
    eps: f32,
    t: i32,
    m: Vec<Vec<f32>>,
    v: Vec<Vec<f32>>,
}

impl Adam {
    #[must_use]
    pub fn new(params: &[&Tensor], lr: f32) -> Self {
        Self {
            lr,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
            t: 0,
            m: params.iter().map(|p| vec![0.0; p.len()]).collect(),
            v: params.iter().map(|p| vec![0.0; p.len()]).collect(),
        }
    }

    #[must_use]
    pub fn learning_rate(&self) -> f32 {
        self.lr
    }

    /// Number of steps taken so far.
    #[must_use]
    pub fn steps(&self) -> i32 {
        self.t
    }

    /// Applies one update. Parameters without an entry in `grads` are left
    /// untouched.
    pub fn step(&mut self, params: &mut [&mut Tensor], grads: &Gradients) -> Result<(), MlError> {
        if params.len() != self.m.len() {
            return Err(MlError::ParamCount { expected: self.m.len(), actual: params.len() });
        }
        self.t = self.t.saturating_add(1);
        let bc1 = 1.0 - self.beta1.powi(self.t);
        let bc2_sqrt = (1.0 - self.beta2.powi(self.t)).sqrt();
        let step_size = self.lr / bc1;

        for ((p, m), v) in params.iter_mut().zip(&mut self.m).zip(&mut self.v) {
            let Some(grad) = grads.get(p) else {
                continue;
            };
            if grad.len() != p.len() || m.len() != p.len() {
                return Err(MlError::DataLength { len: grad.len(), shape: p.shape.clone() });
            }
            for (j, &g) in grad.iter().enumerate() {
                m[j] = self.beta1 * m[j] + (1.0 - self.beta1) * g;
                v[j] = self.beta2 * v[j] + (1.0 - self.beta2) * g * g;
                let denom = v[j].sqrt() / bc2_sqrt + self.eps;
                p.data[j] -= step_size * m[j] / denom;
            }
        }
        Ok(())
    }
}
