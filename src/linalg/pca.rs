//! # PCA
//!
//! $$
//! \Sigma = V \Lambda V^\top, \qquad F = R V_k, \qquad B = V_k^\top
//! $$
//!
//! Principal component factor model of a `T x n` return matrix. The `k`
//! leading eigenvectors give the exposure `B`, projecting the returns on
//! them gives the factor returns `F`.

use nalgebra::DMatrix;
use ndarray::s;
use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView2;
use ndarray::Axis;
use ndarray_stats::CorrelationExt;

use crate::error::MarkowitzError;
use crate::error::Result;

#[derive(Clone, Debug)]
pub struct Pca {
  returns: Array2<f64>,
  /// All eigenvalues of the sample covariance, descending.
  pub eigenvalues: Array1<f64>,
  /// Factor returns, `T x k`.
  pub factors: Array2<f64>,
  /// Factor exposure, `k x n`.
  pub exposure: Array2<f64>,
}

impl Pca {
  pub fn new(returns: ArrayView2<f64>, n_components: usize) -> Result<Self> {
    let (rows, assets) = returns.dim();
    if n_components > assets {
      return Err(MarkowitzError::Dimension(format!(
        "{n_components} components cannot exceed {assets} assets"
      )));
    }
    if rows < 2 {
      return Err(MarkowitzError::Dimension(format!(
        "need at least two observations, got {rows}"
      )));
    }

    let cov = returns
      .t()
      .cov(1.0)
      .map_err(|e| MarkowitzError::Linalg(e.to_string()))?;
    let cov_na = DMatrix::from_fn(assets, assets, |i, j| cov[[i, j]]);
    let eigen = cov_na.symmetric_eigen();

    let mut order = (0..assets).collect::<Vec<_>>();
    order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));

    let eigenvalues = order.iter().map(|&i| eigen.eigenvalues[i]).collect::<Array1<_>>();
    let exposure = Array2::from_shape_fn((n_components, assets), |(k, j)| {
      eigen.eigenvectors[(j, order[k])]
    });
    let factors = returns.dot(&exposure.t());

    Ok(Self {
      returns: returns.to_owned(),
      eigenvalues,
      factors,
      exposure,
    })
  }

  pub fn n_components(&self) -> usize {
    self.exposure.nrows()
  }

  /// Share of total variance carried by each retained component.
  pub fn explained_variance(&self) -> Array1<f64> {
    let total = self.eigenvalues.sum();
    self
      .eigenvalues
      .slice(s![..self.n_components()])
      .mapv(|v| v / total)
  }

  /// Sample covariance of the factor returns.
  pub fn cov(&self) -> Result<Array2<f64>> {
    self
      .factors
      .t()
      .cov(1.0)
      .map_err(|e| MarkowitzError::Linalg(e.to_string()))
  }

  pub fn systematic_returns(&self) -> Array2<f64> {
    self.factors.dot(&self.exposure)
  }

  pub fn idiosyncratic_returns(&self) -> Array2<f64> {
    &self.returns - &self.systematic_returns()
  }

  /// Population standard deviation of the residual returns per asset.
  pub fn idiosyncratic_vola(&self) -> Array1<f64> {
    self.idiosyncratic_returns().std_axis(Axis(0), 0.0)
  }
}
