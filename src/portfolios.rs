//! # Portfolios
//!
//! $$
//! \text{strategy} = \text{builder} + \text{objective}
//! $$
//!
//! Portfolio strategies extend a [`Builder`] with their own models,
//! parameters and constraints and supply the objective.

use crate::builder::Builder;
use crate::builder::Problem;
use crate::error::Result;
use crate::expr::Objective;

pub mod max_sharpe;
pub mod min_cvar;
pub mod min_var;
pub mod soft_risk;

pub use max_sharpe::MaxSharpe;
pub use min_cvar::MinCVar;
pub use min_var::MinVar;
pub use soft_risk::SoftRisk;

pub trait Portfolio: Sized {
  fn builder(&self) -> &Builder;

  fn into_builder(self) -> Builder;

  fn objective(&self) -> Result<Objective>;

  /// Compile the strategy into a re-solvable [`Problem`].
  fn build(self) -> Result<Problem> {
    let objective = self.objective()?;
    self.into_builder().build(objective)
  }
}
