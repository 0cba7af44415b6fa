use crate::error::EnsembleError;
use ml::Tensor;

/// Per-member predictions, both tensors shaped `[members, rows, output_dim]`.
///
/// Nothing is aggregated; [`EnsemblePrediction::select`] and
/// [`EnsemblePrediction::mixture`] are the caller-side tools for that.
#[derive(Debug, Clone)]
pub struct EnsemblePrediction {
    pub mean: Tensor,
    pub variance: Tensor,
}

impl EnsemblePrediction {
    #[must_use]
    pub fn network_size(&self) -> usize {
        self.mean.shape.first().copied().unwrap_or(0)
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.mean.shape.get(1).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn output_dim(&self) -> usize {
        self.mean.shape.get(2).copied().unwrap_or(0)
    }

    fn member_slice(&self, source: &Tensor, index: usize) -> Result<Tensor, EnsembleError> {
        let network_size = self.network_size();
        if index >= network_size {
            return Err(EnsembleError::MemberIndex { index, network_size });
        }
        let width = self.rows() * self.output_dim();
        let data = source.data[index * width..(index + 1) * width].to_vec();
        Ok(Tensor::try_from_vec(vec![self.rows(), self.output_dim()], data)?)
    }

    /// Mean of member `index`, shaped `[rows, output_dim]`.
    pub fn member_mean(&self, index: usize) -> Result<Tensor, EnsembleError> {
        self.member_slice(&self.mean, index)
    }

    pub fn member_variance(&self, index: usize) -> Result<Tensor, EnsembleError> {
        self.member_slice(&self.variance, index)
    }

    /// Keeps only the listed members, in the given order.
    pub fn select(&self, indices: &[usize]) -> Result<EnsemblePrediction, EnsembleError> {
        if indices.is_empty() {
            return Err(EnsembleError::EmptyEnsemble);
        }
        let width = self.rows() * self.output_dim();
        let mut mean = Vec::with_capacity(indices.len() * width);
        let mut variance = Vec::with_capacity(indices.len() * width);
        for &index in indices {
            mean.extend(self.member_mean(index)?.data);
            variance.extend(self.member_variance(index)?.data);
        }
        let shape = vec![indices.len(), self.rows(), self.output_dim()];
        Ok(EnsemblePrediction {
            mean: Tensor::try_from_vec(shape.clone(), mean)?,
            variance: Tensor::try_from_vec(shape, variance)?,
        })
    }

    /// Moment-matched Gaussian of the equally weighted mixture of members.
    ///
    /// Returns `(mean, variance)` shaped `[rows, output_dim]` with
    /// `μ = mean_i μ_i` and `σ² = mean_i(σ_i² + μ_i²) − μ²`.
    pub fn mixture(&self) -> Result<(Tensor, Tensor), EnsembleError> {
        let members = self.network_size();
        if members == 0 {
            return Err(EnsembleError::EmptyEnsemble);
        }
        let width = self.rows() * self.output_dim();
        let mut mu = vec![0.0f32; width];
        let mut second = vec![0.0f32; width];
        for (m, v) in self.mean.data.chunks_exact(width.max(1)).zip(self.variance.data.chunks_exact(width.max(1))) {
            for j in 0..width {
                mu[j] += m[j];
                second[j] += v[j] + m[j] * m[j];
            }
        }
        let n = members as f32;
        let var = mu
            .iter_mut()
            .zip(&second)
            .map(|(mu, s)| {
                *mu /= n;
                (s / n - *mu * *mu).max(0.0)
            })
            .collect();
        let shape = vec![self.rows(), self.output_dim()];
        Ok((Tensor::try_from_vec(shape.clone(), mu)?, Tensor::try_from_vec(shape, var)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_members() -> EnsemblePrediction {
        // 2 members, 1 row, 2 dims
        EnsemblePrediction {
            mean: Tensor::from_vec(vec![2, 1, 2], vec![1.0, 2.0, 3.0, 2.0]),
            variance: Tensor::from_vec(vec![2, 1, 2], vec![0.5, 1.0, 0.5, 3.0]),
        }
    }

    #[test]
    fn member_views() {
        let p = two_members();
        assert_eq!(p.member_mean(1).unwrap().data, vec![3.0, 2.0]);
        assert_eq!(p.member_variance(0).unwrap().shape, vec![1, 2]);
        assert!(matches!(p.member_mean(2), Err(EnsembleError::MemberIndex { index: 2, network_size: 2 })));
    }

    #[test]
    fn select_reorders_members() {
        let p = two_members().select(&[1, 0, 1]).unwrap();
        assert_eq!(p.network_size(), 3);
        assert_eq!(p.mean.data, vec![3.0, 2.0, 1.0, 2.0, 3.0, 2.0]);
        assert!(two_members().select(&[]).is_err());
    }

    #[test]
    fn mixture_moments() {
        let (mu, var) = two_members().mixture().unwrap();
        assert_eq!(mu.data, vec![2.0, 2.0]);
        // dim 0: mean(0.5 + 1, 0.5 + 9) - 4 = 1.5; dim 1: mean(1 + 4, 3 + 4) - 4 = 2
        assert!((var.data[0] - 1.5).abs() < 1e-6);
        assert!((var.data[1] - 2.0).abs() < 1e-6);
    }
}
