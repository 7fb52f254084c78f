//! # Model
//!
//! $$
//! \text{model} = \big(\theta \in \mathbb{R}^{d},\ \operatorname{estimate}(x;\theta),\ \mathcal{C}(x;\theta)\big)
//! $$
//!
//! A model owns named parameters of fixed shape, contributes a scalar
//! estimate over the shared decision variables and optionally constraints.
//! Updates are staged (validated and padded) before any value is written.

use std::collections::BTreeMap;

use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView1;
use ndarray::ArrayView2;
use ndarray::Axis;

use crate::error::MarkowitzError;
use crate::error::Result;
use crate::expr::Constraint;
use crate::expr::Expr;
use crate::expr::Parameter;
use crate::expr::Variable;
use crate::names::ConstraintName;
use crate::names::DataKey;
use crate::names::VariableName;
use crate::risk::CVar;
use crate::risk::FactorModel;
use crate::risk::SampleCovariance;
use crate::utils::fill_matrix;
use crate::utils::fill_vector;

pub mod bounds;
pub mod expected_returns;
pub mod holding_costs;
pub mod trading_costs;

pub use bounds::Bounds;
pub use expected_returns::ExpectedReturns;
pub use holding_costs::HoldingCosts;
pub use trading_costs::TradingCosts;

/// Shared decision variables handed to every model.
pub type Variables = BTreeMap<VariableName, Variable>;

pub(crate) fn variable(variables: &Variables, name: VariableName) -> Result<&Variable> {
  variables
    .get(&name)
    .ok_or(MarkowitzError::UnknownVariable(name))
}

/// One input of an update payload.
#[derive(Clone, Debug)]
pub enum Value {
  Vector(Array1<f64>),
  Matrix(Array2<f64>),
}

impl From<Array1<f64>> for Value {
  fn from(x: Array1<f64>) -> Self {
    Value::Vector(x)
  }
}

impl From<Array2<f64>> for Value {
  fn from(x: Array2<f64>) -> Self {
    Value::Matrix(x)
  }
}

/// Flat payload of an update; every model picks the keys it declared.
#[derive(Clone, Debug, Default)]
pub struct UpdateData {
  values: BTreeMap<DataKey, Value>,
}

impl UpdateData {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with(mut self, key: DataKey, value: impl Into<Value>) -> Self {
    self.insert(key, value);
    self
  }

  pub fn insert(&mut self, key: DataKey, value: impl Into<Value>) {
    self.values.insert(key, value.into());
  }

  pub fn remove(&mut self, key: DataKey) -> Option<Value> {
    self.values.remove(&key)
  }

  /// Payload from string keys; names that are not data keys are ignored.
  pub fn from_named<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
  where
    K: AsRef<str>,
    V: Into<Value>,
  {
    let mut data = Self::new();
    for (name, value) in entries {
      if let Ok(key) = name.as_ref().parse::<DataKey>() {
        data.insert(key, value);
      }
    }
    data
  }

  pub fn contains(&self, key: DataKey) -> bool {
    self.values.contains_key(&key)
  }

  pub fn keys(&self) -> impl Iterator<Item = DataKey> + '_ {
    self.values.keys().copied()
  }

  fn get(&self, key: DataKey) -> Result<&Value> {
    self
      .values
      .get(&key)
      .ok_or(MarkowitzError::DataIncomplete { key, model: None })
  }

  pub fn vector(&self, key: DataKey) -> Result<ArrayView1<'_, f64>> {
    match self.get(key)? {
      Value::Vector(x) => Ok(x.view()),
      Value::Matrix(x) => Err(MarkowitzError::DataMismatch(format!(
        "{key} must be a vector, got a matrix of shape {:?}",
        x.dim()
      ))),
    }
  }

  pub fn matrix(&self, key: DataKey) -> Result<ArrayView2<'_, f64>> {
    match self.get(key)? {
      Value::Matrix(x) => Ok(x.view()),
      Value::Vector(x) => Err(MarkowitzError::DataMismatch(format!(
        "{key} must be a matrix, got a vector of length {}",
        x.len()
      ))),
    }
  }
}

/// A validated value waiting to be written into its parameter.
#[derive(Clone, Debug)]
pub struct Staged {
  parameter: Parameter,
  value: Array2<f64>,
}

impl Staged {
  pub fn commit(self) {
    self.parameter.assign(self.value);
  }
}

fn parameter(data: &BTreeMap<DataKey, Parameter>, key: DataKey) -> Result<&Parameter> {
  data
    .get(&key)
    .ok_or_else(|| MarkowitzError::Structural(format!("model declares no parameter {key}")))
}

/// Pad the vector under `key` to the declared length of its parameter.
pub(crate) fn stage_vector(
  data: &BTreeMap<DataKey, Parameter>,
  update: &UpdateData,
  key: DataKey,
) -> Result<Staged> {
  let parameter = parameter(data, key)?;
  let (num, _) = parameter.shape().dim();
  let value = fill_vector(update.vector(key)?, num)
    .map_err(|e| e.with_key(key))?
    .insert_axis(Axis(1));
  parameter.validate(&value)?;
  Ok(Staged {
    parameter: parameter.clone(),
    value,
  })
}

/// Pad the matrix under `key` into the top-left corner of its parameter.
pub(crate) fn stage_matrix(
  data: &BTreeMap<DataKey, Parameter>,
  update: &UpdateData,
  key: DataKey,
) -> Result<Staged> {
  let parameter = parameter(data, key)?;
  let (rows, cols) = parameter.shape().dim();
  let value = fill_matrix(update.matrix(key)?, rows, cols).map_err(|e| e.with_key(key))?;
  parameter.validate(&value)?;
  Ok(Staged {
    parameter: parameter.clone(),
    value,
  })
}

pub trait ModelExt {
  /// Length of the decision vector the model acts on.
  fn assets(&self) -> usize;

  /// Parameters refreshed by [`ModelExt::update`], all required on every update.
  fn data(&self) -> &BTreeMap<DataKey, Parameter>;

  /// Scalar risk, cost or return expression over the shared variables.
  fn estimate(&self, variables: &Variables) -> Result<Expr>;

  fn constraints(&self, _variables: &Variables) -> Result<BTreeMap<ConstraintName, Constraint>> {
    Ok(BTreeMap::new())
  }

  /// Validate and pad every input without writing anything.
  fn stage(&self, data: &UpdateData) -> Result<Vec<Staged>>;

  fn update(&self, data: &UpdateData) -> Result<()> {
    for staged in self.stage(data)? {
      staged.commit();
    }
    Ok(())
  }

  fn parameter(&self, key: DataKey) -> Option<&Parameter> {
    self.data().get(&key)
  }
}

/// Closed set of models a builder can register.
#[derive(Clone, Debug)]
pub enum Model {
  Bounds(Bounds),
  ExpectedReturns(ExpectedReturns),
  HoldingCosts(HoldingCosts),
  TradingCosts(TradingCosts),
  SampleCovariance(SampleCovariance),
  FactorModel(FactorModel),
  CVar(CVar),
}

macro_rules! dispatch {
  ($self:ident, $model:ident => $body:expr) => {
    match $self {
      Model::Bounds($model) => $body,
      Model::ExpectedReturns($model) => $body,
      Model::HoldingCosts($model) => $body,
      Model::TradingCosts($model) => $body,
      Model::SampleCovariance($model) => $body,
      Model::FactorModel($model) => $body,
      Model::CVar($model) => $body,
    }
  };
}

impl ModelExt for Model {
  fn assets(&self) -> usize {
    dispatch!(self, m => m.assets())
  }

  fn data(&self) -> &BTreeMap<DataKey, Parameter> {
    dispatch!(self, m => m.data())
  }

  fn estimate(&self, variables: &Variables) -> Result<Expr> {
    dispatch!(self, m => m.estimate(variables))
  }

  fn constraints(&self, variables: &Variables) -> Result<BTreeMap<ConstraintName, Constraint>> {
    dispatch!(self, m => m.constraints(variables))
  }

  fn stage(&self, data: &UpdateData) -> Result<Vec<Staged>> {
    dispatch!(self, m => m.stage(data))
  }
}

macro_rules! impl_from_model {
  ($($variant:ident),*) => {
    $(
      impl From<$variant> for Model {
        fn from(model: $variant) -> Self {
          Model::$variant(model)
        }
      }
    )*
  };
}

impl_from_model!(
  Bounds,
  ExpectedReturns,
  HoldingCosts,
  TradingCosts,
  SampleCovariance,
  FactorModel,
  CVar
);
