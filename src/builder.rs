//! # Builder
//!
//! $$
//! \mathcal{P} = \Big(\text{objective},\ \mathcal{C}_{\text{builder}} \cup \bigcup_{m} \mathcal{C}_m\Big), \qquad \mathcal{P}\ \text{DPP}
//! $$
//!
//! Wires the decision variables and default models for a problem size.
//! Strategies add their own models, parameters and constraints, then
//! [`Builder::build`] merges everything into a compiled [`Problem`].

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use tracing::debug;

use crate::error::MarkowitzError;
use crate::error::Result;
use crate::expr::Constraint;
use crate::expr::Objective;
use crate::expr::Parameter;
use crate::expr::Program;
use crate::expr::Variable;
use crate::model::variable;
use crate::model::Bounds;
use crate::model::Model;
use crate::model::ModelExt;
use crate::model::Variables;
use crate::names::BoundName;
use crate::names::ConstraintKey;
use crate::names::ModelName;
use crate::names::ParameterName;
use crate::names::VariableName;
use crate::risk::FactorModel;
use crate::risk::SampleCovariance;

pub mod problem;

pub use problem::Problem;

#[derive(Clone, Debug)]
pub struct Builder {
  assets: usize,
  factors: Option<usize>,
  models: BTreeMap<ModelName, Model>,
  constraints: BTreeMap<ConstraintKey, Constraint>,
  variables: Variables,
  parameters: BTreeMap<ParameterName, Parameter>,
  weights: Variable,
}

impl Builder {
  /// Builder for `assets` assets, with a factor model when `factors` is set
  /// and a sample covariance model otherwise.
  pub fn new(assets: usize, factors: Option<usize>) -> Self {
    let mut models = BTreeMap::new();
    let mut variables = Variables::new();

    match factors {
      Some(factors) => {
        models.insert(
          ModelName::Risk,
          Model::from(FactorModel::new(assets, factors)),
        );
        variables.insert(
          VariableName::FactorWeights,
          Variable::new(factors, VariableName::FactorWeights.to_string()),
        );
        models.insert(
          ModelName::BoundFactors,
          Model::from(Bounds::new(
            factors,
            BoundName::Factors,
            VariableName::FactorWeights,
          )),
        );
        variables.insert(
          VariableName::Abs,
          Variable::nonneg(factors, VariableName::Abs.to_string()),
        );
      }
      None => {
        models.insert(ModelName::Risk, Model::from(SampleCovariance::new(assets)));
        variables.insert(
          VariableName::Abs,
          Variable::nonneg(assets, VariableName::Abs.to_string()),
        );
      }
    }

    let weights = Variable::new(assets, VariableName::Weights.to_string());
    variables.insert(VariableName::Weights, weights.clone());
    models.insert(
      ModelName::BoundAssets,
      Model::from(Bounds::new(assets, BoundName::Assets, VariableName::Weights)),
    );

    Self {
      assets,
      factors,
      models,
      constraints: BTreeMap::new(),
      variables,
      parameters: BTreeMap::new(),
      weights,
    }
  }

  pub fn assets(&self) -> usize {
    self.assets
  }

  pub fn factors(&self) -> Option<usize> {
    self.factors
  }

  pub fn variables(&self) -> &Variables {
    &self.variables
  }

  pub fn variable(&self, name: VariableName) -> Result<&Variable> {
    variable(&self.variables, name)
  }

  pub fn weights(&self) -> &Variable {
    &self.weights
  }

  /// Fails with `UnknownVariable` unless the builder uses a factor model.
  pub fn factor_weights(&self) -> Result<&Variable> {
    self.variable(VariableName::FactorWeights)
  }

  pub fn models(&self) -> &BTreeMap<ModelName, Model> {
    &self.models
  }

  pub fn model(&self, name: ModelName) -> Option<&Model> {
    self.models.get(&name)
  }

  /// Model in slot `name`, a `Structural` error when the slot is empty.
  pub fn required_model(&self, name: ModelName) -> Result<&Model> {
    self
      .model(name)
      .ok_or_else(|| MarkowitzError::Structural(format!("builder has no {name} model")))
  }

  pub fn risk(&self) -> Result<&Model> {
    self.required_model(ModelName::Risk)
  }

  /// Register `model` in slot `name`, returning the model it replaces.
  pub fn insert_model(&mut self, name: ModelName, model: impl Into<Model>) -> Option<Model> {
    self.models.insert(name, model.into())
  }

  pub fn constraints(&self) -> &BTreeMap<ConstraintKey, Constraint> {
    &self.constraints
  }

  /// Register a builder-level constraint, replacing one under the same key.
  pub fn add_constraint(&mut self, key: impl Into<ConstraintKey>, constraint: Constraint) {
    self.constraints.insert(key.into(), constraint);
  }

  /// Register an additional decision variable; names are never reused.
  pub fn add_variable(&mut self, name: VariableName, variable: Variable) -> Result<()> {
    match self.variables.entry(name) {
      Entry::Vacant(slot) => {
        slot.insert(variable);
        Ok(())
      }
      Entry::Occupied(_) => Err(MarkowitzError::Structural(format!(
        "variable {name} is already registered"
      ))),
    }
  }

  pub fn parameters(&self) -> &BTreeMap<ParameterName, Parameter> {
    &self.parameters
  }

  pub fn parameter(&self, name: ParameterName) -> Result<&Parameter> {
    self
      .parameters
      .get(&name)
      .ok_or(MarkowitzError::UnknownParameter(name))
  }

  pub fn add_parameter(&mut self, name: ParameterName, parameter: Parameter) {
    self.parameters.insert(name, parameter);
  }

  /// Merge model constraints under `"{model}_{constraint}"` keys, compile the
  /// program and reject it unless it is DCP and DPP.
  pub fn build(self, objective: Objective) -> Result<Problem> {
    let Self {
      models,
      mut constraints,
      variables,
      parameters,
      ..
    } = self;

    for (name, model) in &models {
      for (constraint_name, constraint) in model.constraints(&variables)? {
        let key = ConstraintKey::model(*name, constraint_name);
        match constraints.entry(key) {
          Entry::Vacant(slot) => {
            slot.insert(constraint);
          }
          Entry::Occupied(_) => {
            return Err(MarkowitzError::Structural(format!(
              "duplicate constraint {key}"
            )));
          }
        }
      }
    }

    let program = Program::new(objective, constraints)?;
    if let Some(report) = program.dpp_report() {
      return Err(MarkowitzError::Structural(format!(
        "problem is not DPP: {report}"
      )));
    }

    debug!(
      models = models.len(),
      constraints = program.constraints().len(),
      parameters = parameters.len(),
      "built problem"
    );
    Ok(Problem::new(program, models, variables, parameters))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::expr::sum;
  use crate::expr::Expr;
  use crate::names::ConstraintName;
  use crate::names::DataKey;

  #[test]
  fn sample_covariance_by_default() {
    let builder = Builder::new(4, None);
    assert!(matches!(builder.risk().unwrap(), Model::SampleCovariance(_)));
    assert_eq!(
      builder.models().keys().copied().collect::<Vec<_>>(),
      vec![ModelName::Risk, ModelName::BoundAssets]
    );
    assert_eq!(builder.weights().len(), 4);
    assert_eq!(builder.variable(VariableName::Abs).unwrap().len(), 4);
    assert!(matches!(
      builder.factor_weights(),
      Err(MarkowitzError::UnknownVariable(VariableName::FactorWeights))
    ));

    let risk = builder.risk().unwrap();
    assert!(risk.parameter(DataKey::Cholesky).is_some());
    assert!(risk.parameter(DataKey::VolaUncertainty).is_some());
  }

  #[test]
  fn factor_model_adds_factor_variables_and_bounds() {
    let builder = Builder::new(10, Some(3));
    assert!(matches!(builder.risk().unwrap(), Model::FactorModel(_)));
    assert!(builder.model(ModelName::BoundFactors).is_some());
    assert_eq!(builder.factor_weights().unwrap().len(), 3);
    assert_eq!(builder.variable(VariableName::Abs).unwrap().len(), 3);
    assert!(builder.variable(VariableName::Abs).unwrap().is_nonneg());
  }

  #[test]
  fn unknown_parameters_are_reported() {
    let builder = Builder::new(2, None);
    assert!(matches!(
      builder.parameter(ParameterName::SigmaMax),
      Err(MarkowitzError::UnknownParameter(ParameterName::SigmaMax))
    ));
  }

  #[test]
  fn model_constraints_are_namespaced() {
    let mut builder = Builder::new(3, None);
    let w = builder.weights().clone();
    builder.add_constraint(ConstraintName::Budget, sum(&w).equals(1.0));
    let objective = Objective::Minimize(builder.risk().unwrap().estimate(builder.variables()).unwrap());

    let problem = builder.build(objective).unwrap();
    let keys = problem.constraint_keys().map(ToString::to_string).collect::<Vec<_>>();
    assert!(keys.contains(&"budget".to_string()));
    assert!(keys.contains(&"risk_abs".to_string()));
    assert!(keys.contains(&"bound_assets_lower_bound".to_string()));
    assert!(keys.contains(&"bound_assets_upper_bound".to_string()));
  }

  #[test]
  fn colliding_constraint_keys_fail() {
    let mut builder = Builder::new(3, None);
    let w = builder.weights().clone();
    builder.add_constraint(
      ConstraintKey::model(ModelName::Risk, ConstraintName::Abs),
      Expr::from(&w).geq(0.0),
    );
    let objective = Objective::Minimize(sum(&w));
    assert!(matches!(
      builder.build(objective),
      Err(MarkowitzError::Structural(_))
    ));
  }

  #[test]
  fn non_convex_objectives_fail_to_build() {
    let builder = Builder::new(2, None);
    let risk = builder.risk().unwrap().estimate(builder.variables()).unwrap();
    assert!(matches!(
      builder.build(Objective::Maximize(risk)),
      Err(MarkowitzError::Structural(_))
    ));
  }
}
