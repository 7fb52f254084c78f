//! # Bounds
//!
//! $$
//! \ell \le x \le u
//! $$
//!
//! Box constraint on one of the shared decision vectors.

use std::collections::BTreeMap;

use ndarray::Array1;

use super::stage_vector;
use super::variable;
use super::ModelExt;
use super::Staged;
use super::UpdateData;
use super::Variables;
use crate::error::MarkowitzError;
use crate::error::Result;
use crate::expr::Constraint;
use crate::expr::Expr;
use crate::expr::Parameter;
use crate::names::BoundName;
use crate::names::ConstraintName;
use crate::names::DataKey;
use crate::names::VariableName;

#[derive(Clone, Debug)]
pub struct Bounds {
  assets: usize,
  name: BoundName,
  acting_on: VariableName,
  data: BTreeMap<DataKey, Parameter>,
}

impl Bounds {
  /// Bounds named `name` on `acting_on`, initially `0 <= x <= 1`.
  pub fn new(assets: usize, name: BoundName, acting_on: VariableName) -> Self {
    let (lower, upper) = (DataKey::Lower(name), DataKey::Upper(name));
    let data = BTreeMap::from([
      (
        lower,
        Parameter::vector_from(lower.to_string(), Array1::zeros(assets), false),
      ),
      (
        upper,
        Parameter::vector_from(upper.to_string(), Array1::ones(assets), false),
      ),
    ]);

    Self {
      assets,
      name,
      acting_on,
      data,
    }
  }

  pub fn name(&self) -> BoundName {
    self.name
  }

  pub fn acting_on(&self) -> VariableName {
    self.acting_on
  }

  fn bound(&self, key: DataKey) -> Result<&Parameter> {
    self
      .data
      .get(&key)
      .ok_or_else(|| MarkowitzError::Structural(format!("bounds without {key}")))
  }
}

impl ModelExt for Bounds {
  fn assets(&self) -> usize {
    self.assets
  }

  fn data(&self) -> &BTreeMap<DataKey, Parameter> {
    &self.data
  }

  fn estimate(&self, _variables: &Variables) -> Result<Expr> {
    Err(MarkowitzError::EstimateNotSupported("Bounds"))
  }

  fn constraints(&self, variables: &Variables) -> Result<BTreeMap<ConstraintName, Constraint>> {
    let x = Expr::from(variable(variables, self.acting_on)?);
    let lower = self.bound(DataKey::Lower(self.name))?;
    let upper = self.bound(DataKey::Upper(self.name))?;

    Ok(BTreeMap::from([
      (ConstraintName::LowerBound, x.clone().geq(lower)),
      (ConstraintName::UpperBound, x.leq(upper)),
    ]))
  }

  fn stage(&self, data: &UpdateData) -> Result<Vec<Staged>> {
    Ok(vec![
      stage_vector(&self.data, data, DataKey::Lower(self.name))?,
      stage_vector(&self.data, data, DataKey::Upper(self.name))?,
    ])
  }
}
