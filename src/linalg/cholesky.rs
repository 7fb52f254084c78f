use nalgebra::DMatrix;
use ndarray::Array2;
use ndarray::ArrayView2;

use crate::error::MarkowitzError;
use crate::error::Result;

/// Upper triangular `U` with `U^T U = cov`.
pub fn cholesky(cov: ArrayView2<f64>) -> Result<Array2<f64>> {
  let (n, m) = cov.dim();
  if n != m {
    return Err(MarkowitzError::Dimension(format!(
      "covariance must be square, got {n}x{m}"
    )));
  }

  let cov_na = DMatrix::from_row_slice(n, n, &cov.iter().copied().collect::<Vec<_>>());
  let chol = cov_na
    .cholesky()
    .ok_or_else(|| MarkowitzError::Linalg("covariance is not positive definite".to_string()))?;
  let lower = chol.l();

  Ok(Array2::from_shape_fn((n, n), |(i, j)| lower[(j, i)]))
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::array;

  use super::*;

  #[test]
  fn factor_reconstructs_the_covariance() {
    let cov = array![[1.0, 0.5], [0.5, 2.0]];
    let u = cholesky(cov.view()).unwrap();
    assert_eq!(u[[1, 0]], 0.0);
    assert_abs_diff_eq!(u.t().dot(&u), cov, epsilon = 1e-12);
  }

  #[test]
  fn indefinite_matrices_fail() {
    let cov = array![[1.0, 2.0], [2.0, 1.0]];
    assert!(matches!(
      cholesky(cov.view()),
      Err(MarkowitzError::Linalg(_))
    ));
  }

  #[test]
  fn non_square_matrices_fail() {
    let cov = Array2::<f64>::zeros((2, 3));
    assert!(matches!(
      cholesky(cov.view()),
      Err(MarkowitzError::Dimension(_))
    ));
  }
}
