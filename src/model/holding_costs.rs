//! # Holding Costs
//!
//! $$
//! c(w) = \textstyle\sum_i \big(-w_i h_i\big)_+
//! $$
//!
//! Carry cost charged on positions whose product with the rate is negative,
//! e.g. borrow fees on short positions.

use std::collections::BTreeMap;

use super::stage_vector;
use super::variable;
use super::ModelExt;
use super::Staged;
use super::UpdateData;
use super::Variables;
use crate::error::Result;
use crate::expr::multiply;
use crate::expr::neg;
use crate::expr::sum;
use crate::expr::Expr;
use crate::expr::Parameter;
use crate::names::DataKey;
use crate::names::VariableName;

#[derive(Clone, Debug)]
pub struct HoldingCosts {
  assets: usize,
  data: BTreeMap<DataKey, Parameter>,
}

impl HoldingCosts {
  pub fn new(assets: usize) -> Self {
    let data = BTreeMap::from([(
      DataKey::HoldingCosts,
      Parameter::vector(DataKey::HoldingCosts.to_string(), assets, false),
    )]);
    Self { assets, data }
  }
}

impl ModelExt for HoldingCosts {
  fn assets(&self) -> usize {
    self.assets
  }

  fn data(&self) -> &BTreeMap<DataKey, Parameter> {
    &self.data
  }

  fn estimate(&self, variables: &Variables) -> Result<Expr> {
    let w = variable(variables, VariableName::Weights)?;
    let rates = &self.data[&DataKey::HoldingCosts];
    Ok(sum(neg(multiply(w, rates))))
  }

  fn stage(&self, data: &UpdateData) -> Result<Vec<Staged>> {
    Ok(vec![stage_vector(&self.data, data, DataKey::HoldingCosts)?])
  }
}
