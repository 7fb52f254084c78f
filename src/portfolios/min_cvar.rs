//! # Minimum CVaR
//!
//! $$
//! \min_w\ \operatorname{CVaR}_\alpha(w) \quad \text{s.t.}\quad w \ge 0,\ \mathbf{1}^\top w = 1
//! $$
//!
//! Minimum variance with the volatility model swapped for the expected
//! shortfall over historical return scenarios.

use super::MinVar;
use super::Portfolio;
use crate::builder::Builder;
use crate::error::Result;
use crate::expr::Objective;
use crate::names::ModelName;
use crate::risk::CVar;

#[derive(Clone, Debug)]
pub struct MinCVar {
  inner: MinVar,
}

impl MinCVar {
  /// `rows` return scenarios, tail probability `1 - alpha`.
  pub fn new(assets: usize, rows: usize, alpha: f64) -> Result<Self> {
    let mut builder = Builder::new(assets, None);
    builder.insert_model(ModelName::Risk, CVar::new(assets, rows, alpha)?);
    Ok(Self {
      inner: MinVar::from_builder(builder),
    })
  }
}

impl Portfolio for MinCVar {
  fn builder(&self) -> &Builder {
    self.inner.builder()
  }

  fn into_builder(self) -> Builder {
    self.inner.into_builder()
  }

  fn objective(&self) -> Result<Objective> {
    self.inner.objective()
  }
}
