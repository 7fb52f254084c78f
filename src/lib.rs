//! # markowitz-rs
//!
//! $$
//! \min_{\mathbf{w}} \ \rho(\mathbf{w};\theta) \quad \text{s.t.} \quad \mathbf{w}\in\mathcal{C}(\theta)
//! $$
//!
//! Composable convex portfolio problems that are compiled once and re-solved
//! for every new parameter vector $\theta$.
//!
//! A [`builder::Builder`] wires decision variables and [`model::Model`]s,
//! a strategy from [`portfolios`] adds an objective, and `build()` returns a
//! [`builder::Problem`] whose structure never changes afterwards:
//!
//! ```ignore
//! let mut problem = MinVar::new(4, None).build()?;
//! problem.update(&data)?.solve(&SolverSettings::default())?;
//! let weights = problem.weights();
//! ```

pub mod builder;
pub mod error;
pub mod expr;
pub mod linalg;
pub mod model;
pub mod names;
pub mod portfolios;
pub mod risk;
pub mod utils;

pub use builder::Builder;
pub use builder::Problem;
pub use error::MarkowitzError;
pub use error::Result;
pub use expr::SolverSettings;
pub use model::Model;
pub use model::ModelExt;
pub use model::UpdateData;
pub use names::BoundName;
pub use names::ConstraintKey;
pub use names::ConstraintName;
pub use names::DataKey;
pub use names::ModelName;
pub use names::ParameterName;
pub use names::VariableName;
pub use portfolios::MaxSharpe;
pub use portfolios::MinCVar;
pub use portfolios::MinVar;
pub use portfolios::Portfolio;
pub use portfolios::SoftRisk;
