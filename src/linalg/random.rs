use ndarray::Array2;
use ndarray_rand::RandomExt;
use rand::Rng;
use rand_distr::StandardNormal;

/// Random positive semi-definite matrix `A^T A` with standard normal `A`.
pub fn rand_cov<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Array2<f64> {
  let a = Array2::<f64>::random_using((n, n), StandardNormal, rng);
  a.t().dot(&a)
}

#[cfg(test)]
mod tests {
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  use super::*;
  use crate::linalg::cholesky;

  #[test]
  fn is_symmetric_and_factorizable() {
    let mut rng = StdRng::seed_from_u64(42);
    let cov = rand_cov(5, &mut rng);
    assert_eq!(cov.dim(), (5, 5));
    assert_eq!(cov, cov.t());
    assert!(cholesky(cov.view()).is_ok());
  }
}
