//! # Soft Risk
//!
//! $$
//! \max_{w,\sigma}\ \mu^\top w - \nu^\top |w| - \omega\,(\sigma - \sigma_{\text{target}})_+ \quad \text{s.t.}\quad \sigma(w) \le \sigma \le \sigma_{\max},\ w \ge 0,\ \mathbf{1}^\top w = 1
//! $$
//!
//! Volatility above the target is allowed but penalized with priority
//! `omega`, up to the hard limit `sigma_max`. The product
//! `omega * sigma_target` is a derived parameter, so no product of two
//! parameters enters the program.

use super::Portfolio;
use crate::builder::Builder;
use crate::error::Result;
use crate::expr::matmul;
use crate::expr::pos;
use crate::expr::sum;
use crate::expr::Expr;
use crate::expr::Objective;
use crate::expr::Parameter;
use crate::expr::Variable;
use crate::model::ExpectedReturns;
use crate::model::ModelExt;
use crate::names::ConstraintName;
use crate::names::ModelName;
use crate::names::ParameterName;
use crate::names::VariableName;

#[derive(Clone, Debug)]
pub struct SoftRisk {
  builder: Builder,
  sigma: Variable,
  sigma_target_times_omega: Parameter,
}

impl SoftRisk {
  pub fn new(assets: usize, factors: Option<usize>) -> Result<Self> {
    let mut builder = Builder::new(assets, factors);
    builder.insert_model(ModelName::Return, ExpectedReturns::new(assets));

    let sigma_max = Parameter::scalar("limit volatility", true);
    let sigma_target = Parameter::scalar("target volatility", true);
    let omega = Parameter::scalar("risk priority", true);
    builder.add_parameter(ParameterName::SigmaMax, sigma_max.clone());
    builder.add_parameter(ParameterName::SigmaTarget, sigma_target.clone());
    builder.add_parameter(ParameterName::Omega, omega.clone());

    let sigma_target_times_omega = {
      let (sigma_target, omega) = (sigma_target.clone(), omega.clone());
      Parameter::callback("sigma_target_times_omega", true, move || {
        sigma_target.scalar_value() * omega.scalar_value()
      })
    };

    let sigma = Variable::nonneg(1, VariableName::Sigma.to_string());
    builder.add_variable(VariableName::Sigma, sigma.clone())?;

    let w = builder.weights().clone();
    let risk = builder.risk()?.estimate(builder.variables())?;
    builder.add_constraint(ConstraintName::LongOnly, Expr::from(&w).geq(0.0));
    builder.add_constraint(ConstraintName::Budget, sum(&w).equals(1.0));
    builder.add_constraint(ConstraintName::Risk, risk.leq(&sigma));
    builder.add_constraint(ConstraintName::MaxRisk, Expr::from(&sigma).leq(&sigma_max));

    Ok(Self {
      builder,
      sigma,
      sigma_target_times_omega,
    })
  }

  /// Volatility slack bounded below by the risk estimate.
  pub fn sigma(&self) -> &Variable {
    &self.sigma
  }
}

impl Portfolio for SoftRisk {
  fn builder(&self) -> &Builder {
    &self.builder
  }

  fn into_builder(self) -> Builder {
    self.builder
  }

  fn objective(&self) -> Result<Objective> {
    let expected_return = self
      .builder
      .required_model(ModelName::Return)?
      .estimate(self.builder.variables())?;
    let omega = self.builder.parameter(ParameterName::Omega)?;
    let soft_risk = pos(matmul(omega, &self.sigma) - &self.sigma_target_times_omega);
    Ok(Objective::Maximize(expected_return - soft_risk))
  }
}
