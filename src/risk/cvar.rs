//! # CVaR
//!
//! $$
//! \operatorname{CVaR}_\alpha(w) = -\frac{1}{k}\sum_{\text{k smallest}} (R w)_t, \qquad k = \lfloor T(1-\alpha) \rfloor
//! $$
//!
//! Expected shortfall over the worst `k` of `T` return scenarios.

use std::collections::BTreeMap;

use crate::error::MarkowitzError;
use crate::error::Result;
use crate::expr::matmul;
use crate::expr::sum_smallest;
use crate::expr::Expr;
use crate::expr::Parameter;
use crate::model::stage_matrix;
use crate::model::variable;
use crate::model::ModelExt;
use crate::model::Staged;
use crate::model::UpdateData;
use crate::model::Variables;
use crate::names::DataKey;
use crate::names::VariableName;

const TAIL_EPS: f64 = 1e-9;

#[derive(Clone, Debug)]
pub struct CVar {
  assets: usize,
  rows: usize,
  alpha: f64,
  k: usize,
  data: BTreeMap<DataKey, Parameter>,
}

impl CVar {
  pub fn new(assets: usize, rows: usize, alpha: f64) -> Result<Self> {
    if !(alpha > 0.0 && alpha < 1.0) {
      return Err(MarkowitzError::Dimension(format!(
        "alpha must lie in (0, 1), got {alpha}"
      )));
    }
    // rounding in `1 - alpha` must not drop a whole scenario
    let k = (rows as f64 * (1.0 - alpha) + TAIL_EPS).floor() as usize;
    if k == 0 {
      return Err(MarkowitzError::Dimension(format!(
        "{rows} scenarios leave an empty tail at alpha {alpha}"
      )));
    }

    let data = BTreeMap::from([(
      DataKey::Returns,
      Parameter::matrix(DataKey::Returns.to_string(), rows, assets, false),
    )]);
    Ok(Self {
      assets,
      rows,
      alpha,
      k,
      data,
    })
  }

  pub fn rows(&self) -> usize {
    self.rows
  }

  pub fn alpha(&self) -> f64 {
    self.alpha
  }

  /// Number of scenarios in the tail.
  pub fn k(&self) -> usize {
    self.k
  }
}

impl ModelExt for CVar {
  fn assets(&self) -> usize {
    self.assets
  }

  fn data(&self) -> &BTreeMap<DataKey, Parameter> {
    &self.data
  }

  fn estimate(&self, variables: &Variables) -> Result<Expr> {
    let w = variable(variables, VariableName::Weights)?;
    let returns = &self.data[&DataKey::Returns];
    Ok(-(1.0 / self.k as f64) * sum_smallest(matmul(returns, w), self.k))
  }

  fn stage(&self, data: &UpdateData) -> Result<Vec<Staged>> {
    Ok(vec![stage_matrix(&self.data, data, DataKey::Returns)?])
  }
}
