//! # Sample Covariance
//!
//! $$
//! \sigma(w) = \big\lVert \big(U w,\ \nu^\top a\big) \big\rVert_2, \qquad a \ge |w|
//! $$
//!
//! Volatility from the upper Cholesky factor `U` of the sample covariance,
//! inflated by a worst-case term on the absolute weights.

use std::collections::BTreeMap;

use crate::error::MarkowitzError;
use crate::error::Result;
use crate::expr::abs;
use crate::expr::hstack;
use crate::expr::matmul;
use crate::expr::norm2;
use crate::expr::Constraint;
use crate::expr::Expr;
use crate::expr::Parameter;
use crate::model::stage_matrix;
use crate::model::stage_vector;
use crate::model::variable;
use crate::model::ModelExt;
use crate::model::Staged;
use crate::model::UpdateData;
use crate::model::Variables;
use crate::names::ConstraintName;
use crate::names::DataKey;
use crate::names::VariableName;

#[derive(Clone, Debug)]
pub struct SampleCovariance {
  assets: usize,
  data: BTreeMap<DataKey, Parameter>,
}

impl SampleCovariance {
  pub fn new(assets: usize) -> Self {
    let data = BTreeMap::from([
      (
        DataKey::Cholesky,
        Parameter::matrix(DataKey::Cholesky.to_string(), assets, assets, false),
      ),
      (
        DataKey::VolaUncertainty,
        Parameter::vector(DataKey::VolaUncertainty.to_string(), assets, true),
      ),
    ]);
    Self { assets, data }
  }
}

impl ModelExt for SampleCovariance {
  fn assets(&self) -> usize {
    self.assets
  }

  fn data(&self) -> &BTreeMap<DataKey, Parameter> {
    &self.data
  }

  fn estimate(&self, variables: &Variables) -> Result<Expr> {
    let w = variable(variables, VariableName::Weights)?;
    let a = variable(variables, VariableName::Abs)?;
    Ok(norm2(hstack(vec![
      matmul(&self.data[&DataKey::Cholesky], w),
      matmul(&self.data[&DataKey::VolaUncertainty], a),
    ])))
  }

  fn constraints(&self, variables: &Variables) -> Result<BTreeMap<ConstraintName, Constraint>> {
    let w = variable(variables, VariableName::Weights)?;
    let a = variable(variables, VariableName::Abs)?;
    Ok(BTreeMap::from([(
      ConstraintName::Abs,
      Expr::from(a).geq(abs(w)),
    )]))
  }

  fn stage(&self, data: &UpdateData) -> Result<Vec<Staged>> {
    let chol = data.matrix(DataKey::Cholesky)?;
    let uncertainty = data.vector(DataKey::VolaUncertainty)?;
    let (rows, cols) = chol.dim();
    if rows != cols {
      return Err(MarkowitzError::DataMismatch(format!(
        "chol must be square, got {rows}x{cols}"
      )));
    }
    if rows != uncertainty.len() {
      return Err(MarkowitzError::DataMismatch(format!(
        "chol has {rows} rows but vola_uncertainty has length {}",
        uncertainty.len()
      )));
    }

    Ok(vec![
      stage_matrix(&self.data, data, DataKey::Cholesky)?,
      stage_vector(&self.data, data, DataKey::VolaUncertainty)?,
    ])
  }
}
