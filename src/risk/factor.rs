//! # Factor Model
//!
//! $$
//! \sigma(w) = \Big\lVert \big( \lVert (U y,\ \nu_s^\top a) \rVert_2,\ \lVert (d \circ w,\ \nu_d \circ w) \rVert_2 \big) \Big\rVert_2,\qquad y = B w,\ a \ge |y|
//! $$
//!
//! Volatility split into a systematic part driven by factor weights `y` and
//! a residual part from idiosyncratic volatilities `d`.

use std::collections::BTreeMap;

use crate::error::MarkowitzError;
use crate::error::Result;
use crate::expr::abs;
use crate::expr::hstack;
use crate::expr::matmul;
use crate::expr::multiply;
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
pub struct FactorModel {
  assets: usize,
  factors: usize,
  data: BTreeMap<DataKey, Parameter>,
}

impl FactorModel {
  pub fn new(assets: usize, factors: usize) -> Self {
    let name = |key: DataKey| key.to_string();
    let data = BTreeMap::from([
      (
        DataKey::Exposure,
        Parameter::matrix(name(DataKey::Exposure), factors, assets, false),
      ),
      (
        DataKey::IdiosyncraticVola,
        Parameter::vector(name(DataKey::IdiosyncraticVola), assets, false),
      ),
      (
        DataKey::Cholesky,
        Parameter::matrix(name(DataKey::Cholesky), factors, factors, false),
      ),
      (
        DataKey::SystematicVolaUncertainty,
        Parameter::vector(name(DataKey::SystematicVolaUncertainty), factors, true),
      ),
      (
        DataKey::IdiosyncraticVolaUncertainty,
        Parameter::vector(name(DataKey::IdiosyncraticVolaUncertainty), assets, true),
      ),
    ]);

    Self {
      assets,
      factors,
      data,
    }
  }

  pub fn factors(&self) -> usize {
    self.factors
  }

  /// Volatility explained by the factors.
  pub fn systematic_risk(&self, variables: &Variables) -> Result<Expr> {
    let y = variable(variables, VariableName::FactorWeights)?;
    let a = variable(variables, VariableName::Abs)?;
    Ok(norm2(hstack(vec![
      matmul(&self.data[&DataKey::Cholesky], y),
      matmul(&self.data[&DataKey::SystematicVolaUncertainty], a),
    ])))
  }

  /// Asset-specific volatility left after the factors.
  pub fn residual_risk(&self, variables: &Variables) -> Result<Expr> {
    let w = variable(variables, VariableName::Weights)?;
    Ok(norm2(hstack(vec![
      multiply(&self.data[&DataKey::IdiosyncraticVola], w),
      multiply(&self.data[&DataKey::IdiosyncraticVolaUncertainty], w),
    ])))
  }
}

impl ModelExt for FactorModel {
  fn assets(&self) -> usize {
    self.assets
  }

  fn data(&self) -> &BTreeMap<DataKey, Parameter> {
    &self.data
  }

  fn estimate(&self, variables: &Variables) -> Result<Expr> {
    Ok(norm2(hstack(vec![
      self.systematic_risk(variables)?,
      self.residual_risk(variables)?,
    ])))
  }

  fn constraints(&self, variables: &Variables) -> Result<BTreeMap<ConstraintName, Constraint>> {
    let w = variable(variables, VariableName::Weights)?;
    let y = variable(variables, VariableName::FactorWeights)?;
    let a = variable(variables, VariableName::Abs)?;
    Ok(BTreeMap::from([
      (
        ConstraintName::FactorExposure,
        Expr::from(y).equals(matmul(&self.data[&DataKey::Exposure], w)),
      ),
      (ConstraintName::Abs, Expr::from(a).geq(abs(y))),
    ]))
  }

  fn stage(&self, data: &UpdateData) -> Result<Vec<Staged>> {
    let mismatch = |what: String| Err(MarkowitzError::DataMismatch(what));

    let exposure = data.matrix(DataKey::Exposure)?;
    let idiosyncratic = data.vector(DataKey::IdiosyncraticVola)?;
    let chol = data.matrix(DataKey::Cholesky)?;
    let systematic_uncertainty = data.vector(DataKey::SystematicVolaUncertainty)?;
    let idiosyncratic_uncertainty = data.vector(DataKey::IdiosyncraticVolaUncertainty)?;

    let (k, assets) = exposure.dim();
    if idiosyncratic.len() != idiosyncratic_uncertainty.len() {
      return mismatch(format!(
        "idiosyncratic_vola has length {} but idiosyncratic_vola_uncertainty has length {}",
        idiosyncratic.len(),
        idiosyncratic_uncertainty.len()
      ));
    }
    if idiosyncratic.len() != assets {
      return mismatch(format!(
        "idiosyncratic_vola has length {} but exposure covers {assets} assets",
        idiosyncratic.len()
      ));
    }
    if systematic_uncertainty.len() != k {
      return mismatch(format!(
        "systematic_vola_uncertainty has length {} but exposure has {k} factors",
        systematic_uncertainty.len()
      ));
    }
    if chol.dim() != (k, k) {
      return mismatch(format!(
        "chol has shape {:?} but exposure has {k} factors",
        chol.dim()
      ));
    }

    Ok(vec![
      stage_matrix(&self.data, data, DataKey::Exposure)?,
      stage_vector(&self.data, data, DataKey::IdiosyncraticVola)?,
      stage_matrix(&self.data, data, DataKey::Cholesky)?,
      stage_vector(&self.data, data, DataKey::SystematicVolaUncertainty)?,
      stage_vector(&self.data, data, DataKey::IdiosyncraticVolaUncertainty)?,
    ])
  }
}
