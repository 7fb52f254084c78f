use super::atoms::Assignment;
use super::atoms::Expr;
use crate::error::Result;

/// `expr == 0` or `expr <= 0`, elementwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relation {
  Zero,
  NonPos,
}

#[derive(Clone, Debug)]
pub struct Constraint {
  expr: Expr,
  relation: Relation,
}

impl Constraint {
  pub fn new(expr: Expr, relation: Relation) -> Self {
    Self { expr, relation }
  }

  pub fn expr(&self) -> &Expr {
    &self.expr
  }

  pub fn relation(&self) -> Relation {
    self.relation
  }

  pub fn is_dcp(&self) -> bool {
    let curvature = self.expr.curvature();
    match self.relation {
      Relation::Zero => curvature.is_affine(),
      Relation::NonPos => curvature.is_convex(),
    }
  }

  pub fn is_dpp(&self) -> bool {
    self.is_dcp() && self.expr.dpp_violation().is_none()
  }

  /// Largest violation under `assignment`; zero when satisfied.
  pub fn violation(&self, assignment: &Assignment) -> Result<f64> {
    let value = self.expr.evaluate(assignment)?;
    let worst = match self.relation {
      Relation::Zero => value.iter().fold(0.0_f64, |acc, v| acc.max(v.abs())),
      Relation::NonPos => value.iter().fold(0.0_f64, |acc, &v| acc.max(v)),
    };
    Ok(worst)
  }
}

#[derive(Clone, Debug)]
pub enum Objective {
  Minimize(Expr),
  Maximize(Expr),
}

impl Objective {
  pub fn expr(&self) -> &Expr {
    match self {
      Objective::Minimize(expr) | Objective::Maximize(expr) => expr,
    }
  }

  pub fn is_dcp(&self) -> bool {
    let curvature = self.expr().curvature();
    match self {
      Objective::Minimize(_) => curvature.is_convex(),
      Objective::Maximize(_) => curvature.is_concave(),
    }
  }

  pub fn is_dpp(&self) -> bool {
    self.is_dcp() && self.expr().dpp_violation().is_none()
  }
}

#[cfg(test)]
mod tests {
  use ndarray::array;

  use super::*;
  use crate::expr::norm2;
  use crate::expr::sum;
  use crate::expr::Variable;

  #[test]
  fn convex_expressions_only_bound_from_above() {
    let x = Variable::new(2, "x");
    assert!(norm2(&x).leq(1.0).is_dcp());
    assert!(!norm2(&x).geq(1.0).is_dcp());
    assert!(!norm2(&x).equals(1.0).is_dcp());
    assert!(sum(&x).equals(1.0).is_dcp());
  }

  #[test]
  fn objectives_follow_their_sense() {
    let x = Variable::new(2, "x");
    assert!(Objective::Minimize(norm2(&x)).is_dcp());
    assert!(!Objective::Maximize(norm2(&x)).is_dcp());
    assert!(Objective::Maximize(-norm2(&x)).is_dcp());
  }

  #[test]
  fn violations_are_measured() {
    let x = Variable::new(2, "x");
    let at = Assignment::new().with(&x, array![0.7, 0.6]);
    assert!((sum(&x).equals(1.0).violation(&at).unwrap() - 0.3).abs() < 1e-12);
    assert_eq!(Expr::from(&x).leq(1.0).violation(&at).unwrap(), 0.0);
    assert!((Expr::from(&x).geq(0.65).violation(&at).unwrap() - 0.05).abs() < 1e-12);
  }
}
