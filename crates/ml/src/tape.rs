use crate::error::MlError;
use crate::graph::{EOp, Node};
use crate::recorder::Recorder;
use crate::tensor::Tensor;
use compute::kernels::sigmoid;
use compute::ComputeBackend;
use std::collections::HashMap;
use std::sync::Arc;

/// A tape that records operations for automatic differentiation.
///
/// Inputs and outputs of every recorded node are cloned onto the tape, so the
/// caller may drop or mutate its own tensors before calling [`Tape::backward`].
pub struct Tape {
    backend: Arc<dyn ComputeBackend>,
    nodes: Vec<Node>,
    values: HashMap<usize, Tensor>,
}

impl Recorder for Tape {
    fn backend(&self) -> &dyn ComputeBackend {
        self.backend.as_ref()
    }

    fn record(&mut self, node: Node, inputs: &[&Tensor], out: &Tensor) {
        for t in inputs.iter().copied().chain(std::iter::once(out)) {
            self.values.entry(t.id).or_insert_with(|| t.clone());
        }
        self.nodes.push(node);
    }
}

/// Gradients of a scalar loss with respect to every `requires_grad` tensor
/// that took part in the recorded computation.
#[derive(Debug, Default, Clone)]
pub struct Gradients {
    by_id: HashMap<usize, Vec<f32>>,
}

impl Gradients {
    #[must_use]
    pub fn get(&self, tensor: &Tensor) -> Option<&[f32]> {
        self.by_id.get(&tensor.id).map(Vec::as_slice)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl Tape {
    /// Creates a new, empty tape.
    #[must_use]
    pub fn new(backend: Arc<dyn ComputeBackend>) -> Self {
        Self { backend, nodes: Vec::new(), values: HashMap::new() }
    }

    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    fn value(&self, id: usize) -> Result<&Tensor, MlError> {
        self.values.get(&id).ok_or(MlError::MissingValue(id))
    }

    /// Computes the gradients of the recorded computation with respect to `loss`.
    ///
    /// The recorded operations are traversed in reverse order. Nodes whose
    /// output never reaches `loss` are skipped.
    pub fn backward(&self, loss: &Tensor) -> Result<Gradients, MlError> {
        if loss.len() != 1 {
            return Err(MlError::NonScalarLoss(loss.shape.clone()));
        }
        let mut grads: HashMap<usize, Vec<f32>> = HashMap::new();
        grads.insert(loss.id, vec![1.0]);

        for node in self.nodes.iter().rev() {
            let Some(out_grad) = grads.get(&node.out).cloned() else {
                continue;
            };
            let a = self.value(node.a)?;

            match node.op {
                EOp::Add | EOp::Sub | EOp::Mul => {
                    let b = self.value(node.b.ok_or(MlError::MissingValue(node.out))?)?;
                    let (da, db): (Vec<f32>, Vec<f32>) = match node.op {
                        EOp::Add => (out_grad.clone(), out_grad),
                        EOp::Sub => (out_grad.clone(), out_grad.iter().map(|g| -g).collect()),
                        _ => (
                            out_grad.iter().zip(&b.data).map(|(g, bv)| g * bv).collect(),
                            out_grad.iter().zip(&a.data).map(|(g, av)| g * av).collect(),
                        ),
                    };
                    accumulate(&mut grads, a, &da);
                    accumulate(&mut grads, b, &db);
                }
                EOp::Neg => {
                    let da: Vec<f32> = out_grad.iter().map(|g| -g).collect();
                    accumulate(&mut grads, a, &da);
                }
                EOp::Scale(s) => {
                    let da: Vec<f32> = out_grad.iter().map(|g| g * s).collect();
                    accumulate(&mut grads, a, &da);
                }
                EOp::Exp => {
                    let out = self.value(node.out)?;
                    let da: Vec<f32> = out_grad.iter().zip(&out.data).map(|(g, y)| g * y).collect();
                    accumulate(&mut grads, a, &da);
                }
                EOp::Swish => {
                    let da: Vec<f32> = out_grad
                        .iter()
                        .zip(&a.data)
                        .map(|(g, &x)| {
                            let s = sigmoid(x);
                            g * (s + x * s * (1.0 - s))
                        })
                        .collect();
                    accumulate(&mut grads, a, &da);
                }
                EOp::Softplus => {
                    let da: Vec<f32> = out_grad.iter().zip(&a.data).map(|(g, &x)| g * sigmoid(x)).collect();
                    accumulate(&mut grads, a, &da);
                }
                EOp::AddBroadcast => {
                    let row = self.value(node.b.ok_or(MlError::MissingValue(node.out))?)?;
                    let dim = row.len();
                    let mut drow = vec![0.0; dim];
                    if dim > 0 {
                        for chunk in out_grad.chunks_exact(dim) {
                            for (d, g) in drow.iter_mut().zip(chunk) {
                                *d += g;
                            }
                        }
                    }
                    accumulate(&mut grads, a, &out_grad);
                    accumulate(&mut grads, row, &drow);
                }
                EOp::MatMulT => {
                    // out[m, n] = a[m, k] · w[n, k]ᵀ
                    let w = self.value(node.b.ok_or(MlError::MissingValue(node.out))?)?;
                    let (m, k) = a.dims2()?;
                    let (n, _) = w.dims2()?;
                    let mut da = vec![0.0; m * k];
                    let mut dw = vec![0.0; n * k];
                    for r in 0..m {
                        for c in 0..n {
                            let g = out_grad[r * n + c];
                            if g == 0.0 {
                                continue;
                            }
                            for j in 0..k {
                                da[r * k + j] += g * w.data[c * k + j];
                                dw[c * k + j] += g * a.data[r * k + j];
                            }
                        }
                    }
                    accumulate(&mut grads, a, &da);
                    accumulate(&mut grads, w, &dw);
                }
                EOp::Narrow { start } => {
                    let (rows, cols) = a.dims2()?;
                    let len = if rows == 0 { 0 } else { out_grad.len() / rows };
                    let mut da = vec![0.0; rows * cols];
                    for r in 0..rows {
                        da[r * cols + start..r * cols + start + len]
                            .copy_from_slice(&out_grad[r * len..(r + 1) * len]);
                    }
                    accumulate(&mut grads, a, &da);
                }
                EOp::ReduceSum => {
                    accumulate(&mut grads, a, &vec![out_grad[0]; a.len()]);
                }
                EOp::ReduceMean => {
                    let n = a.len().max(1) as f32;
                    accumulate(&mut grads, a, &vec![out_grad[0] / n; a.len()]);
                }
            }
        }

        tracing::trace!(nodes = self.nodes.len(), grads = grads.len(), "backward pass complete");
        let by_id = grads
            .into_iter()
            .filter(|(id, _)| self.values.get(id).is_some_and(|t| t.requires_grad))
            .collect();
        Ok(Gradients { by_id })
    }
}

fn accumulate(grads: &mut HashMap<usize, Vec<f32>>, target: &Tensor, delta: &[f32]) {
    let g = grads.entry(target.id).or_insert_with(|| vec![0.0; target.len()]);
    for (g, d) in g.iter_mut().zip(delta) {
        *g += d;
    }
}
