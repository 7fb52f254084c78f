use std::collections::BTreeMap;

use ndarray::Array1;
use tracing::debug;

use super::atoms::Assignment;
use super::backend;
use super::backend::SolverSettings;
use super::canon::Canonicalizer;
use super::canon::ConeSignature;
use super::canon::ConicForm;
use super::canon::Layout;
use super::constraint::Constraint;
use super::constraint::Objective;
use super::variable::Variable;
use crate::error::MarkowitzError;
use crate::error::Result;
use crate::names::ConstraintKey;

/// Optimal point of a [`Program`].
#[derive(Clone, Debug)]
pub struct Solution {
  pub value: f64,
  pub iterations: u32,
  pub solve_time: f64,
  assignment: Assignment,
}

impl Solution {
  pub fn value_of(&self, variable: &Variable) -> Option<Array1<f64>> {
    self.assignment.get(variable).cloned()
  }

  pub fn assignment(&self) -> &Assignment {
    &self.assignment
  }
}

/// Objective and named constraints compiled once into a fixed conic layout.
///
/// Parameter values are read at every [`Program::solve`]; the cone structure
/// fixed at construction must not change.
#[derive(Debug)]
pub struct Program {
  objective: Objective,
  constraints: BTreeMap<ConstraintKey, Constraint>,
  variables: BTreeMap<usize, Variable>,
  layout: Layout,
  signature: ConeSignature,
}

impl Program {
  pub fn new(objective: Objective, constraints: BTreeMap<ConstraintKey, Constraint>) -> Result<Self> {
    let len = objective.expr().check_shape()?;
    if len != 1 {
      return Err(MarkowitzError::Structural(format!(
        "objective must be scalar, got length {len}"
      )));
    }
    for (key, constraint) in &constraints {
      constraint
        .expr()
        .check_shape()
        .map_err(|e| MarkowitzError::Structural(format!("constraint {key}: {e}")))?;
    }

    let mut variables = BTreeMap::new();
    objective.expr().collect_variables(&mut variables);
    for constraint in constraints.values() {
      constraint.expr().collect_variables(&mut variables);
    }
    let layout = Layout::new(variables.values());

    let mut program = Self {
      objective,
      constraints,
      variables,
      layout,
      signature: ConeSignature {
        columns: 0,
        zero: 0,
        nonneg: 0,
        soc: vec![],
        power: vec![],
      },
    };
    let form = program.canonicalize()?;
    program.signature = form.signature();
    debug!(
      variables = program.layout.size(),
      columns = form.columns,
      rows = form.rows(),
      constraints = program.constraints.len(),
      "compiled program"
    );
    Ok(program)
  }

  fn canonicalize(&self) -> Result<ConicForm> {
    let mut canon = Canonicalizer::new(&self.layout);
    canon.objective(&self.objective)?;
    for constraint in self.constraints.values() {
      canon.constraint(constraint)?;
    }
    Ok(canon.finish())
  }

  pub fn objective(&self) -> &Objective {
    &self.objective
  }

  pub fn constraints(&self) -> &BTreeMap<ConstraintKey, Constraint> {
    &self.constraints
  }

  /// Variables referenced by the objective or any constraint.
  pub fn variables(&self) -> impl Iterator<Item = &Variable> {
    self.variables.values()
  }

  pub fn is_dcp(&self) -> bool {
    self.objective.is_dcp() && self.constraints.values().all(Constraint::is_dcp)
  }

  pub fn is_dpp(&self) -> bool {
    self.dpp_report().is_none()
  }

  /// Describes the first part of the program breaking DCP or DPP rules.
  pub fn dpp_report(&self) -> Option<String> {
    if !self.objective.is_dcp() {
      return Some(format!(
        "objective has curvature {:?}",
        self.objective.expr().curvature()
      ));
    }
    if let Some(violation) = self.objective.expr().dpp_violation() {
      return Some(format!("objective: {violation}"));
    }
    for (key, constraint) in &self.constraints {
      if !constraint.is_dcp() {
        return Some(format!(
          "constraint {key} has curvature {:?}",
          constraint.expr().curvature()
        ));
      }
      if let Some(violation) = constraint.expr().dpp_violation() {
        return Some(format!("constraint {key}: {violation}"));
      }
    }
    None
  }

  /// Solve with the current parameter values.
  pub fn solve(&self, settings: &SolverSettings) -> Result<Solution> {
    let form = self.canonicalize()?;
    if form.signature() != self.signature {
      return Err(MarkowitzError::Structural(
        "cone structure changed since compilation".to_string(),
      ));
    }

    let raw = backend::solve(&form, settings)?;
    let mut assignment = Assignment::new();
    for variable in self.variables.values() {
      if let Some(slot) = self.layout.slot(variable) {
        let value = Array1::from(raw.x[slot.offset..slot.offset + slot.len].to_vec());
        assignment.insert(variable, value);
      }
    }

    // maximization is solved negated
    let value = match self.objective {
      Objective::Minimize(_) => raw.objective,
      Objective::Maximize(_) => -raw.objective,
    };
    Ok(Solution {
      value,
      iterations: raw.iterations,
      solve_time: raw.solve_time,
      assignment,
    })
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::array;

  use super::*;
  use crate::expr::matmul;
  use crate::expr::multiply;
  use crate::expr::norm2;
  use crate::expr::sum;
  use crate::expr::Expr;
  use crate::expr::Parameter;
  use crate::names::ConstraintName;

  fn key(name: ConstraintName) -> ConstraintKey {
    ConstraintKey::builder(name)
  }

  #[test]
  fn re_solves_with_new_parameter_values() {
    let w = Variable::new(2, "w");
    let mu = Parameter::vector("mu", 2, false);
    let constraints = BTreeMap::from([
      (key(ConstraintName::Budget), sum(&w).equals(1.0)),
      (key(ConstraintName::LongOnly), Expr::from(&w).geq(0.0)),
    ]);
    let program = Program::new(Objective::Maximize(matmul(&mu, &w)), constraints).unwrap();
    assert!(program.is_dpp());

    mu.set_vector(array![0.1, 0.3]).unwrap();
    let first = program.solve(&SolverSettings::default()).unwrap();
    assert_abs_diff_eq!(first.value, 0.3, epsilon = 1e-6);
    assert_abs_diff_eq!(first.value_of(&w).unwrap()[1], 1.0, epsilon = 1e-6);

    mu.set_vector(array![0.4, 0.3]).unwrap();
    let second = program.solve(&SolverSettings::default()).unwrap();
    assert_abs_diff_eq!(second.value, 0.4, epsilon = 1e-6);
    assert_abs_diff_eq!(second.value_of(&w).unwrap()[0], 1.0, epsilon = 1e-6);
  }

  #[test]
  fn minimizes_a_norm() {
    let w = Variable::new(2, "w");
    let scale = Parameter::vector("scale", 2, true);
    scale.set_vector(array![1.0, 2.0]).unwrap();
    let constraints = BTreeMap::from([(key(ConstraintName::Budget), sum(&w).equals(1.0))]);
    let program =
      Program::new(Objective::Minimize(norm2(multiply(&scale, &w))), constraints).unwrap();

    let solution = program.solve(&SolverSettings::default()).unwrap();
    let w = solution.value_of(&w).unwrap();
    // w proportional to 1 / scale^2
    assert_abs_diff_eq!(w[0], 0.8, epsilon = 1e-5);
    assert_abs_diff_eq!(w[1], 0.2, epsilon = 1e-5);
    assert_abs_diff_eq!(solution.value, 0.8f64.sqrt(), epsilon = 1e-5);
  }

  #[test]
  fn non_dcp_programs_are_reported() {
    let w = Variable::new(2, "w");
    let constraints = BTreeMap::from([(key(ConstraintName::Risk), norm2(&w).geq(1.0))]);
    let program = Program::new(Objective::Minimize(sum(&w)), constraints).unwrap();
    assert!(!program.is_dpp());
    assert!(program.dpp_report().unwrap().contains("risk"));
  }

  #[test]
  fn vector_objectives_are_rejected() {
    let w = Variable::new(2, "w");
    assert!(Program::new(Objective::Minimize(Expr::from(&w)), BTreeMap::new()).is_err());
  }
}
