//! # Expressions
//!
//! $$
//! \min_x\ q^\top x \quad \text{s.t.}\quad Ax + s = b,\ s \in \mathcal{K}_0 \times \mathbb{R}_+^m \times \mathcal{Q}^{n_1}\times\cdots\times\mathcal{P}_\alpha
//! $$
//!
//! Small declarative modeling layer: variables, parameters with fixed shape
//! and mutable value, a convex expression algebra with curvature and DPP
//! analysis, and a canonicalization into the conic form solved by Clarabel.

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

pub mod atoms;
pub mod backend;
pub mod canon;
pub mod constraint;
pub mod curvature;
pub mod parameter;
pub mod program;
pub mod variable;

pub use atoms::abs;
pub use atoms::hstack;
pub use atoms::matmul;
pub use atoms::multiply;
pub use atoms::neg;
pub use atoms::norm2;
pub use atoms::pos;
pub use atoms::power;
pub use atoms::sum;
pub use atoms::sum_smallest;
pub use atoms::Assignment;
pub use atoms::Expr;
pub use backend::SolverSettings;
pub use constraint::Constraint;
pub use constraint::Objective;
pub use constraint::Relation;
pub use curvature::Curvature;
pub use curvature::Sign;
pub use parameter::Parameter;
pub use parameter::Shape;
pub use program::Program;
pub use program::Solution;
pub use variable::Variable;

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

/// Unique id shared by variables and parameters.
pub(crate) fn next_id() -> usize {
  NEXT_ID.fetch_add(1, Ordering::Relaxed)
}
