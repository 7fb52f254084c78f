//! # Problem
//!
//! $$
//! \theta_t \xrightarrow{\ \text{update}\ } \mathcal{P}(\theta_t) \xrightarrow{\ \text{solve}\ } \mathbf{w}^\*_t
//! $$
//!
//! Compiled, DPP-validated program together with the models whose
//! parameters feed it. Only parameter values change between solves.

use std::collections::BTreeMap;

use ndarray::Array1;
use tracing::debug;
use tracing::warn;

use crate::error::MarkowitzError;
use crate::error::Result;
use crate::expr::Parameter;
use crate::expr::Program;
use crate::expr::Solution;
use crate::expr::SolverSettings;
use crate::model::variable;
use crate::model::Model;
use crate::model::ModelExt;
use crate::model::UpdateData;
use crate::model::Variables;
use crate::names::ConstraintKey;
use crate::names::DataKey;
use crate::names::ModelName;
use crate::names::ParameterName;
use crate::names::VariableName;

#[derive(Debug)]
pub struct Problem {
  program: Program,
  models: BTreeMap<ModelName, Model>,
  variables: Variables,
  parameters: BTreeMap<ParameterName, Parameter>,
  solution: Option<Solution>,
}

impl Problem {
  pub(crate) fn new(
    program: Program,
    models: BTreeMap<ModelName, Model>,
    variables: Variables,
    parameters: BTreeMap<ParameterName, Parameter>,
  ) -> Self {
    Self {
      program,
      models,
      variables,
      parameters,
      solution: None,
    }
  }

  /// Refresh every model from `data`.
  ///
  /// All keys of all models are checked and all inputs are validated before
  /// the first value is written, so a failed update leaves the problem as it
  /// was. Keys no model declares are ignored.
  pub fn update(&mut self, data: &UpdateData) -> Result<&mut Self> {
    for (name, model) in &self.models {
      if let Some(key) = model.data().keys().find(|key| !data.contains(**key)) {
        return Err(MarkowitzError::DataIncomplete {
          key: *key,
          model: Some(*name),
        });
      }
    }

    let mut staged = Vec::new();
    for (name, model) in &self.models {
      staged.extend(model.stage(data).map_err(|e| e.in_model(*name))?);
    }

    let writes = staged.len();
    for pending in staged {
      pending.commit();
    }
    debug!(models = self.models.len(), writes, "updated problem data");
    Ok(self)
  }

  /// Solve with the current parameter values and return the optimal value.
  ///
  /// Any non-optimal status discards the previous solution.
  pub fn solve(&mut self, settings: &SolverSettings) -> Result<f64> {
    match self.program.solve(settings) {
      Ok(solution) => {
        let value = solution.value;
        debug!(
          value,
          iterations = solution.iterations,
          solve_time = solution.solve_time,
          "solved problem"
        );
        self.solution = Some(solution);
        Ok(value)
      }
      Err(err) => {
        warn!(%err, "solve failed");
        self.solution = None;
        Err(err)
      }
    }
  }

  /// Optimal value of the last successful solve.
  pub fn value(&self) -> Option<f64> {
    self.solution.as_ref().map(|s| s.value)
  }

  pub fn solution(&self) -> Option<&Solution> {
    self.solution.as_ref()
  }

  pub fn is_dpp(&self) -> bool {
    self.program.is_dpp()
  }

  pub fn program(&self) -> &Program {
    &self.program
  }

  pub fn models(&self) -> &BTreeMap<ModelName, Model> {
    &self.models
  }

  pub fn model(&self, name: ModelName) -> Option<&Model> {
    self.models.get(&name)
  }

  /// Every model parameter keyed by its model slot and data key.
  pub fn data(&self) -> impl Iterator<Item = ((ModelName, DataKey), &Parameter)> {
    self.models.iter().flat_map(|(name, model)| {
      model
        .data()
        .iter()
        .map(move |(key, parameter)| ((*name, *key), parameter))
    })
  }

  /// Builder-level parameter such as `sigma_max`, set outside [`Problem::update`].
  pub fn parameter(&self, name: ParameterName) -> Result<&Parameter> {
    self
      .parameters
      .get(&name)
      .ok_or(MarkowitzError::UnknownParameter(name))
  }

  pub fn parameters(&self) -> &BTreeMap<ParameterName, Parameter> {
    &self.parameters
  }

  pub fn variables(&self) -> &Variables {
    &self.variables
  }

  pub fn constraint_keys(&self) -> impl Iterator<Item = &ConstraintKey> {
    self.program.constraints().keys()
  }

  /// Value of a registered variable after the last successful solve.
  pub fn variable_value(&self, name: VariableName) -> Result<Option<Array1<f64>>> {
    let variable = variable(&self.variables, name)?;
    Ok(
      self
        .solution
        .as_ref()
        .and_then(|solution| solution.value_of(variable)),
    )
  }

  pub fn weights(&self) -> Option<Array1<f64>> {
    self.variable_value(VariableName::Weights).ok().flatten()
  }

  /// `None` without a factor model or before the first solve.
  pub fn factor_weights(&self) -> Option<Array1<f64>> {
    self.variable_value(VariableName::FactorWeights).ok().flatten()
  }
}
