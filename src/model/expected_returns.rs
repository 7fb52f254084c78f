//! # Expected Returns
//!
//! $$
//! r(w) = \mu^\top w - u^\top |w|
//! $$
//!
//! Robust linear return: the point estimate net of a worst-case penalty on
//! each asset's absolute position.

use std::collections::BTreeMap;

use super::stage_vector;
use super::variable;
use super::ModelExt;
use super::Staged;
use super::UpdateData;
use super::Variables;
use crate::error::MarkowitzError;
use crate::error::Result;
use crate::expr::abs;
use crate::expr::matmul;
use crate::expr::Expr;
use crate::expr::Parameter;
use crate::names::DataKey;
use crate::names::VariableName;

#[derive(Clone, Debug)]
pub struct ExpectedReturns {
  assets: usize,
  data: BTreeMap<DataKey, Parameter>,
}

impl ExpectedReturns {
  pub fn new(assets: usize) -> Self {
    let data = BTreeMap::from([
      (
        DataKey::Mu,
        Parameter::vector(DataKey::Mu.to_string(), assets, false),
      ),
      (
        DataKey::MuUncertainty,
        Parameter::vector(DataKey::MuUncertainty.to_string(), assets, true),
      ),
    ]);
    Self { assets, data }
  }
}

impl ModelExt for ExpectedReturns {
  fn assets(&self) -> usize {
    self.assets
  }

  fn data(&self) -> &BTreeMap<DataKey, Parameter> {
    &self.data
  }

  fn estimate(&self, variables: &Variables) -> Result<Expr> {
    let w = variable(variables, VariableName::Weights)?;
    let mu = &self.data[&DataKey::Mu];
    let uncertainty = &self.data[&DataKey::MuUncertainty];
    Ok(matmul(mu, w) - matmul(uncertainty, abs(w)))
  }

  fn stage(&self, data: &UpdateData) -> Result<Vec<Staged>> {
    let (mu, uncertainty) = (
      data.vector(DataKey::Mu)?,
      data.vector(DataKey::MuUncertainty)?,
    );
    if mu.len() != uncertainty.len() {
      return Err(MarkowitzError::DataMismatch(format!(
        "mu has length {} but mu_uncertainty has length {}",
        mu.len(),
        uncertainty.len()
      )));
    }

    Ok(vec![
      stage_vector(&self.data, data, DataKey::Mu)?,
      stage_vector(&self.data, data, DataKey::MuUncertainty)?,
    ])
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::array;
  use ndarray::Array1;

  use super::*;
  use crate::expr::Assignment;
  use crate::expr::Variable;

  fn setup(assets: usize) -> (ExpectedReturns, Variable, Variables) {
    let w = Variable::new(assets, "weights");
    let variables = BTreeMap::from([(VariableName::Weights, w.clone())]);
    (ExpectedReturns::new(assets), w, variables)
  }

  fn update(model: &ExpectedReturns, mu: Array1<f64>, uncertainty: Array1<f64>) -> Result<()> {
    model.update(
      &UpdateData::new()
        .with(DataKey::Mu, mu)
        .with(DataKey::MuUncertainty, uncertainty),
    )
  }

  #[test]
  fn point_estimate() {
    let (model, w, variables) = setup(3);
    update(&model, array![0.1, 0.2], array![0.0, 0.0]).unwrap();
    let at = Assignment::new().with(&w, array![1.0, 1.0, 2.0]);
    let value = model.estimate(&variables).unwrap().evaluate_scalar(&at).unwrap();
    assert_abs_diff_eq!(value, 0.3, epsilon = 1e-12);
  }

  #[test]
  fn robust_estimate_penalizes_absolute_positions() {
    let (model, w, variables) = setup(3);
    update(&model, array![0.1, 0.2], array![0.01, 0.03]).unwrap();
    let at = Assignment::new().with(&w, array![1.0, 1.0, 2.0]);
    let value = model.estimate(&variables).unwrap().evaluate_scalar(&at).unwrap();
    assert_abs_diff_eq!(value, 0.26, epsilon = 1e-12);

    update(&model, array![0.1], array![0.5]).unwrap();
    let value = model.estimate(&variables).unwrap().evaluate_scalar(&at).unwrap();
    assert_abs_diff_eq!(value, -0.4, epsilon = 1e-12);
  }

  #[test]
  fn mismatched_lengths_fail_before_writing() {
    let (model, _, _) = setup(3);
    let err = update(&model, array![0.1, 0.2], array![0.01]).unwrap_err();
    assert!(matches!(err, MarkowitzError::DataMismatch(_)));
    assert_eq!(model.data()[&DataKey::Mu].flat_value(), Array1::<f64>::zeros(3));
  }

  #[test]
  fn negative_uncertainty_is_rejected() {
    let (model, _, _) = setup(2);
    assert!(update(&model, array![0.1, 0.2], array![0.01, -0.01]).is_err());
    assert_eq!(model.data()[&DataKey::Mu].flat_value(), Array1::<f64>::zeros(2));
  }
}
