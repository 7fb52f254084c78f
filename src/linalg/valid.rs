use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView2;

use crate::error::MarkowitzError;
use crate::error::Result;

/// Mask of rows/columns with a finite diagonal entry and the block they span.
pub fn valid(matrix: ArrayView2<f64>) -> Result<(Array1<bool>, Array2<f64>)> {
  let (n, m) = matrix.dim();
  if n != m {
    return Err(MarkowitzError::Dimension(format!(
      "matrix must be square, got {n}x{m}"
    )));
  }

  let mask = matrix.diag().mapv(f64::is_finite);
  let index = mask
    .iter()
    .enumerate()
    .filter_map(|(i, &ok)| ok.then_some(i))
    .collect::<Vec<_>>();
  let block = Array2::from_shape_fn((index.len(), index.len()), |(i, j)| {
    matrix[[index[i], index[j]]]
  });

  Ok((mask, block))
}

#[cfg(test)]
mod tests {
  use ndarray::array;

  use super::*;

  #[test]
  fn drops_rows_and_columns_with_missing_variance() {
    let matrix = array![
      [1.0, 0.1, 0.2],
      [0.1, f64::NAN, 0.3],
      [0.2, 0.3, 3.0],
    ];
    let (mask, block) = valid(matrix.view()).unwrap();
    assert_eq!(mask, array![true, false, true]);
    assert_eq!(block, array![[1.0, 0.2], [0.2, 3.0]]);
  }

  #[test]
  fn non_square_matrices_fail() {
    assert!(valid(Array2::<f64>::zeros((2, 3)).view()).is_err());
  }
}
