//! # Padding
//!
//! $$
//! \operatorname{fill}(x, n) = (x_1,\dots,x_k,\underbrace{0,\dots,0}_{n-k})
//! $$
//!
//! Embed variable-length market data into the fixed-shape buffers of a
//! compiled problem. Shorter inputs are zero-extended; longer inputs are
//! rejected, never truncated.

use ndarray::s;
use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView1;
use ndarray::ArrayView2;

use crate::error::MarkowitzError;
use crate::error::Result;

/// Zero-padded vector of length `num` with `x` in the head.
pub fn fill_vector(x: ArrayView1<f64>, num: usize) -> Result<Array1<f64>> {
  if x.len() > num {
    return Err(MarkowitzError::ShapeOverflow {
      key: None,
      declared: (num, 1),
      supplied: (x.len(), 1),
    });
  }

  let mut z = Array1::zeros(num);
  z.slice_mut(s![..x.len()]).assign(&x);
  Ok(z)
}

/// Zero-padded `rows x cols` matrix with `x` in the top-left corner.
pub fn fill_matrix(x: ArrayView2<f64>, rows: usize, cols: usize) -> Result<Array2<f64>> {
  let (n, m) = x.dim();
  if n > rows || m > cols {
    return Err(MarkowitzError::ShapeOverflow {
      key: None,
      declared: (rows, cols),
      supplied: (n, m),
    });
  }

  let mut z = Array2::zeros((rows, cols));
  z.slice_mut(s![..n, ..m]).assign(&x);
  Ok(z)
}

#[cfg(test)]
mod tests {
  use ndarray::array;

  use super::*;

  #[test]
  fn vectors_are_zero_extended_for_every_shorter_length() {
    let x = array![0.3, -1.2, 4.0, 0.5];
    for k in 0..=x.len() {
      let head = x.slice(s![..k]);
      let z = fill_vector(head, 6).unwrap();
      assert_eq!(z.len(), 6);
      assert_eq!(z.slice(s![..k]), head);
      assert!(z.slice(s![k..]).iter().all(|&v| v == 0.0));
    }
  }

  #[test]
  fn longer_vectors_overflow() {
    let err = fill_vector(array![1.0, 2.0, 3.0].view(), 2).unwrap_err();
    assert!(matches!(
      err,
      MarkowitzError::ShapeOverflow {
        declared: (2, 1),
        supplied: (3, 1),
        ..
      }
    ));
  }

  #[test]
  fn matrices_land_in_the_top_left_corner() {
    let x = array![[1.0, 2.0], [3.0, 4.0]];
    let z = fill_matrix(x.view(), 3, 4).unwrap();
    assert_eq!(z.dim(), (3, 4));
    assert_eq!(z.slice(s![..2, ..2]), x);
    assert_eq!(z.sum(), 10.0);
  }

  #[test]
  fn matrices_overflow_in_either_direction() {
    let x = Array2::<f64>::ones((2, 5));
    assert!(fill_matrix(x.view(), 3, 4).is_err());
    assert!(fill_matrix(x.t(), 1, 5).is_err());
  }
}
