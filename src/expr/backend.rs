//! # Backend
//!
//! $$
//! \min_x\ \tfrac12 x^\top P x + q^\top x \quad \text{s.t.}\quad Ax + s = b,\ s \in \mathcal{K}
//! $$
//!
//! Hands a [`ConicForm`] to the Clarabel interior point solver. A row
//! `e(x) = c + a^T x` constrained to a cone becomes `A = -a`, `b = c`.

use clarabel::algebra::CscMatrix;
use clarabel::solver::DefaultSettings;
use clarabel::solver::DefaultSolver;
use clarabel::solver::IPSolver;
use clarabel::solver::SolverStatus;
use clarabel::solver::SupportedConeT;
use tracing::debug;

use super::canon::ConicForm;
use super::canon::LinExpr;
use crate::error::MarkowitzError;
use crate::error::Result;

/// Runtime configuration for the conic solver.
#[derive(Clone, Debug)]
pub struct SolverSettings {
  /// Print the solver's iteration log.
  pub verbose: bool,
  /// Maximum number of interior point iterations.
  pub max_iter: u32,
  /// Wall clock limit in seconds.
  pub time_limit: Option<f64>,
  /// Absolute duality gap tolerance.
  pub tol_gap_abs: f64,
  /// Relative duality gap tolerance.
  pub tol_gap_rel: f64,
  /// Primal and dual feasibility tolerance.
  pub tol_feas: f64,
}

impl Default for SolverSettings {
  fn default() -> Self {
    Self {
      verbose: false,
      max_iter: 200,
      time_limit: None,
      tol_gap_abs: 1e-8,
      tol_gap_rel: 1e-8,
      tol_feas: 1e-8,
    }
  }
}

impl SolverSettings {
  fn to_clarabel(&self) -> DefaultSettings<f64> {
    DefaultSettings {
      verbose: self.verbose,
      max_iter: self.max_iter,
      time_limit: self.time_limit.unwrap_or(f64::INFINITY),
      tol_gap_abs: self.tol_gap_abs,
      tol_gap_rel: self.tol_gap_rel,
      tol_feas: self.tol_feas,
      ..DefaultSettings::default()
    }
  }
}

/// Primal point and objective of a successful solve.
#[derive(Clone, Debug)]
pub(crate) struct RawSolution {
  pub x: Vec<f64>,
  pub objective: f64,
  pub iterations: u32,
  pub solve_time: f64,
}

fn csc(rows: &[&LinExpr], columns: usize) -> CscMatrix<f64> {
  let mut per_column = vec![vec![]; columns];
  for (r, row) in rows.iter().enumerate() {
    for &(col, c) in &row.terms {
      per_column[col].push((r, -c));
    }
  }

  let mut colptr = Vec::with_capacity(columns + 1);
  let mut rowval = vec![];
  let mut nzval = vec![];
  colptr.push(0);
  for entries in per_column {
    for (r, v) in entries {
      rowval.push(r);
      nzval.push(v);
    }
    colptr.push(rowval.len());
  }

  CscMatrix::new(rows.len(), columns, colptr, rowval, nzval)
}

pub(crate) fn solve(form: &ConicForm, settings: &SolverSettings) -> Result<RawSolution> {
  let n = form.columns;
  let mut rows: Vec<&LinExpr> = Vec::with_capacity(form.rows());
  let mut cones = vec![];

  if !form.zero.is_empty() {
    rows.extend(&form.zero);
    cones.push(SupportedConeT::ZeroConeT(form.zero.len()));
  }
  if !form.nonneg.is_empty() {
    rows.extend(&form.nonneg);
    cones.push(SupportedConeT::NonnegativeConeT(form.nonneg.len()));
  }
  for block in &form.soc {
    rows.extend(block);
    cones.push(SupportedConeT::SecondOrderConeT(block.len()));
  }
  for (block, alpha) in &form.power {
    rows.extend(block);
    cones.push(SupportedConeT::PowerConeT(*alpha));
  }

  let p = CscMatrix::new(n, n, vec![0; n + 1], vec![], vec![]);
  let mut q = vec![0.0; n];
  for &(col, c) in &form.objective.terms {
    q[col] += c;
  }
  let a = csc(&rows, n);
  let b = rows.iter().map(|row| row.constant).collect::<Vec<_>>();

  let mut solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings.to_clarabel());
  solver.solve();

  let status = solver.solution.status;
  debug!(
    columns = n,
    rows = rows.len(),
    iterations = solver.solution.iterations,
    status = ?status,
    "conic solve finished"
  );

  if status != SolverStatus::Solved {
    return Err(MarkowitzError::SolveFailure {
      status: format!("{status:?}"),
    });
  }

  let x = solver.solution.x.clone();
  Ok(RawSolution {
    objective: form.objective.evaluate(&x),
    x,
    iterations: solver.solution.iterations,
    solve_time: solver.solution.solve_time,
  })
}
