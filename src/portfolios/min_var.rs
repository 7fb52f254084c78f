//! # Minimum Variance
//!
//! $$
//! \min_w\ \sigma(w) \quad \text{s.t.}\quad w \ge 0,\ \mathbf{1}^\top w = 1
//! $$

use super::Portfolio;
use crate::builder::Builder;
use crate::error::Result;
use crate::expr::sum;
use crate::expr::Expr;
use crate::expr::Objective;
use crate::model::ModelExt;
use crate::names::ConstraintName;

#[derive(Clone, Debug)]
pub struct MinVar {
  builder: Builder,
}

impl MinVar {
  pub fn new(assets: usize, factors: Option<usize>) -> Self {
    Self::from_builder(Builder::new(assets, factors))
  }

  /// Long-only fully invested strategy on top of an existing builder.
  pub fn from_builder(mut builder: Builder) -> Self {
    let w = builder.weights().clone();
    builder.add_constraint(ConstraintName::LongOnly, Expr::from(&w).geq(0.0));
    builder.add_constraint(ConstraintName::Budget, sum(&w).equals(1.0));
    Self { builder }
  }
}

impl Portfolio for MinVar {
  fn builder(&self) -> &Builder {
    &self.builder
  }

  fn into_builder(self) -> Builder {
    self.builder
  }

  fn objective(&self) -> Result<Objective> {
    let risk = self.builder.risk()?.estimate(self.builder.variables())?;
    Ok(Objective::Minimize(risk))
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::array;
  use ndarray::Array1;

  use super::*;
  use crate::expr::SolverSettings;
  use crate::linalg::cholesky;
  use crate::model::UpdateData;
  use crate::names::BoundName;
  use crate::names::ConstraintKey;
  use crate::names::DataKey;
  use crate::names::ModelName;
  use crate::names::VariableName;

  fn data(cov: ndarray::Array2<f64>, vola_uncertainty: Array1<f64>) -> UpdateData {
    UpdateData::new()
      .with(DataKey::Cholesky, cholesky(cov.view()).unwrap())
      .with(DataKey::Lower(BoundName::Assets), Array1::<f64>::zeros(2))
      .with(DataKey::Upper(BoundName::Assets), Array1::<f64>::ones(2))
      .with(DataKey::VolaUncertainty, vola_uncertainty)
  }

  #[test]
  fn wiring() {
    let portfolio = MinVar::new(4, None);
    let builder = portfolio.builder();
    assert_eq!(
      builder.models().keys().copied().collect::<Vec<_>>(),
      vec![ModelName::Risk, ModelName::BoundAssets]
    );
    assert_eq!(
      builder.constraints().keys().copied().collect::<Vec<_>>(),
      vec![
        ConstraintKey::builder(ConstraintName::Budget),
        ConstraintKey::builder(ConstraintName::LongOnly)
      ]
    );
    assert!(builder.factor_weights().is_err());
    assert_eq!(builder.weights().len(), 4);

    let problem = portfolio.build().unwrap();
    assert!(problem.is_dpp());
    assert_eq!(
      problem.variables().keys().copied().collect::<Vec<_>>(),
      vec![VariableName::Weights, VariableName::Abs]
    );
    assert_eq!(
      problem.data().map(|((_, key), _)| key).collect::<Vec<_>>(),
      vec![
        DataKey::Cholesky,
        DataKey::VolaUncertainty,
        DataKey::Lower(BoundName::Assets),
        DataKey::Upper(BoundName::Assets),
      ]
    );
  }

  #[test]
  fn min_var() {
    let mut problem = MinVar::new(4, None).build().unwrap();
    let value = problem
      .update(&data(array![[1.0, 0.5], [0.5, 2.0]], Array1::zeros(2)))
      .unwrap()
      .solve(&SolverSettings::default())
      .unwrap();

    assert_abs_diff_eq!(value, 0.9354143466222262, epsilon = 1e-6);
    assert_abs_diff_eq!(problem.value().unwrap(), value);
    assert_abs_diff_eq!(
      problem.weights().unwrap(),
      array![0.75, 0.25, 0.0, 0.0],
      epsilon = 1e-3
    );
  }

  #[test]
  fn robust_min_var() {
    let mut problem = MinVar::new(4, None).build().unwrap();
    let cov = array![[2.0, 0.4], [0.4, 3.0]];
    let value = problem
      .update(&data(cov.clone(), array![0.15, 0.3]))
      .unwrap()
      .solve(&SolverSettings::default())
      .unwrap();

    assert_abs_diff_eq!(
      problem.weights().unwrap(),
      array![0.626406, 0.373594, 0.0, 0.0],
      epsilon = 1e-4
    );
    assert_abs_diff_eq!(value, 1.1971448, epsilon = 1e-5);

    let wider = problem
      .update(&data(cov, array![0.3, 0.6]))
      .unwrap()
      .solve(&SolverSettings::default())
      .unwrap();
    assert!(wider > value);
  }

  #[test]
  fn factor_min_var_links_factor_weights() {
    let mut problem = MinVar::new(3, Some(2)).build().unwrap();
    assert!(problem.is_dpp());

    let exposure = array![[1.0, 0.0, 1.0], [1.0, 0.5, 1.0]];
    let data = UpdateData::new()
      .with(DataKey::Cholesky, ndarray::Array2::<f64>::eye(2))
      .with(DataKey::Exposure, exposure.clone())
      .with(DataKey::IdiosyncraticVola, array![0.1, 0.1, 0.1])
      .with(DataKey::IdiosyncraticVolaUncertainty, array![0.0, 0.0, 0.0])
      .with(DataKey::SystematicVolaUncertainty, array![0.0, 0.0])
      .with(DataKey::Lower(BoundName::Assets), Array1::<f64>::zeros(3))
      .with(DataKey::Upper(BoundName::Assets), Array1::<f64>::ones(3))
      .with(DataKey::Lower(BoundName::Factors), array![-2.0, -2.0])
      .with(DataKey::Upper(BoundName::Factors), array![2.0, 2.0]);
    problem
      .update(&data)
      .unwrap()
      .solve(&SolverSettings::default())
      .unwrap();

    let w = problem.weights().unwrap();
    let y = problem.factor_weights().unwrap();
    assert_abs_diff_eq!(w.sum(), 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(exposure.dot(&w), y, epsilon = 1e-6);
  }
}
