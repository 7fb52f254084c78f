//! # Trading Costs
//!
//! $$
//! c(w) = \textstyle\sum_i |w_i - w^{\text{prev}}_i|^p, \qquad p \ge 1
//! $$
//!
//! Turnover cost relative to the holdings before rebalancing. The exponent
//! is part of the program's structure and therefore fixed at construction.

use std::collections::BTreeMap;

use super::stage_vector;
use super::variable;
use super::ModelExt;
use super::Staged;
use super::UpdateData;
use super::Variables;
use crate::error::MarkowitzError;
use crate::error::Result;
use crate::expr::power;
use crate::expr::sum;
use crate::expr::Expr;
use crate::expr::Parameter;
use crate::names::DataKey;
use crate::names::VariableName;

#[derive(Clone, Debug)]
pub struct TradingCosts {
  assets: usize,
  power: f64,
  data: BTreeMap<DataKey, Parameter>,
}

impl TradingCosts {
  /// Linear turnover cost.
  pub fn new(assets: usize) -> Self {
    let data = BTreeMap::from([(
      DataKey::InitialWeights,
      Parameter::vector(DataKey::InitialWeights.to_string(), assets, false),
    )]);
    Self {
      assets,
      power: 1.0,
      data,
    }
  }

  pub fn with_power(assets: usize, power: f64) -> Result<Self> {
    if !(power >= 1.0 && power.is_finite()) {
      return Err(MarkowitzError::Dimension(format!(
        "trading cost exponent must be at least 1, got {power}"
      )));
    }
    Ok(Self {
      power,
      ..Self::new(assets)
    })
  }

  pub fn power(&self) -> f64 {
    self.power
  }
}

impl ModelExt for TradingCosts {
  fn assets(&self) -> usize {
    self.assets
  }

  fn data(&self) -> &BTreeMap<DataKey, Parameter> {
    &self.data
  }

  fn estimate(&self, variables: &Variables) -> Result<Expr> {
    let w = variable(variables, VariableName::Weights)?;
    let previous = &self.data[&DataKey::InitialWeights];
    Ok(sum(power(Expr::from(w) - previous, self.power)))
  }

  fn stage(&self, data: &UpdateData) -> Result<Vec<Staged>> {
    Ok(vec![stage_vector(&self.data, data, DataKey::InitialWeights)?])
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::array;

  use super::*;
  use crate::expr::Assignment;
  use crate::expr::Curvature;
  use crate::expr::Variable;

  fn estimate(model: &TradingCosts, weights: ndarray::Array1<f64>) -> f64 {
    let w = Variable::new(3, "weights");
    let variables = BTreeMap::from([(VariableName::Weights, w.clone())]);
    let expr = model.estimate(&variables).unwrap();
    assert_eq!(expr.curvature(), Curvature::Convex);
    expr
      .evaluate_scalar(&Assignment::new().with(&w, weights))
      .unwrap()
  }

  #[test]
  fn linear_turnover() {
    let model = TradingCosts::new(3);
    model
      .update(&UpdateData::new().with(DataKey::InitialWeights, array![0.1, 0.2]))
      .unwrap();
    assert_abs_diff_eq!(estimate(&model, array![0.4, 0.7, 0.0]), 0.8, epsilon = 1e-12);
  }

  #[test]
  fn quadratic_turnover() {
    let model = TradingCosts::with_power(3, 2.0).unwrap();
    model
      .update(&UpdateData::new().with(DataKey::InitialWeights, array![0.1, 0.2]))
      .unwrap();
    assert_abs_diff_eq!(estimate(&model, array![0.4, 0.7, 0.0]), 0.34, epsilon = 1e-12);
  }

  #[test]
  fn concave_exponents_are_rejected() {
    assert!(TradingCosts::with_power(3, 0.5).is_err());
    assert!(TradingCosts::with_power(3, f64::NAN).is_err());
  }
}
