//! # Maximum Return under a Volatility Cap
//!
//! $$
//! \max_w\ \mu^\top w - \nu^\top |w| \quad \text{s.t.}\quad \sigma(w) \le \sigma_{\max},\ w \ge 0,\ \mathbf{1}^\top w = 1
//! $$

use super::Portfolio;
use crate::builder::Builder;
use crate::error::Result;
use crate::expr::sum;
use crate::expr::Expr;
use crate::expr::Objective;
use crate::expr::Parameter;
use crate::model::ExpectedReturns;
use crate::model::ModelExt;
use crate::names::ConstraintName;
use crate::names::ModelName;
use crate::names::ParameterName;

#[derive(Clone, Debug)]
pub struct MaxSharpe {
  builder: Builder,
}

impl MaxSharpe {
  pub fn new(assets: usize, factors: Option<usize>) -> Result<Self> {
    let mut builder = Builder::new(assets, factors);
    builder.insert_model(ModelName::Return, ExpectedReturns::new(assets));

    let sigma_max = Parameter::scalar("maximal volatility", true);
    builder.add_parameter(ParameterName::SigmaMax, sigma_max.clone());

    let w = builder.weights().clone();
    let risk = builder.risk()?.estimate(builder.variables())?;
    builder.add_constraint(ConstraintName::LongOnly, Expr::from(&w).geq(0.0));
    builder.add_constraint(ConstraintName::Budget, sum(&w).equals(1.0));
    builder.add_constraint(ConstraintName::Risk, risk.leq(&sigma_max));

    Ok(Self { builder })
  }
}

impl Portfolio for MaxSharpe {
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
    Ok(Objective::Maximize(expected_return))
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::array;
  use ndarray::Array1;

  use super::*;
  use crate::expr::SolverSettings;
  use crate::linalg::cholesky;
  use crate::model::UpdateData;
  use crate::names::BoundName;
  use crate::names::ConstraintKey;
  use crate::names::DataKey;

  #[test]
  fn wiring() {
    let portfolio = MaxSharpe::new(4, None).unwrap();
    let builder = portfolio.builder();
    assert_eq!(
      builder.models().keys().copied().collect::<Vec<_>>(),
      vec![ModelName::Risk, ModelName::Return, ModelName::BoundAssets]
    );
    assert_eq!(
      builder.constraints().keys().copied().collect::<Vec<_>>(),
      vec![
        ConstraintKey::builder(ConstraintName::Budget),
        ConstraintKey::builder(ConstraintName::LongOnly),
        ConstraintKey::builder(ConstraintName::Risk),
      ]
    );
    assert!(builder.factor_weights().is_err());
    assert!(portfolio.build().unwrap().is_dpp());
  }

  #[test]
  fn max_sharpe() {
    let mut problem = MaxSharpe::new(4, None).unwrap().build().unwrap();
    problem
      .parameter(ParameterName::SigmaMax)
      .unwrap()
      .set_scalar(1.0)
      .unwrap();

    let data = UpdateData::new()
      .with(
        DataKey::Cholesky,
        cholesky(array![[1.0, 0.6], [0.6, 2.0]].view()).unwrap(),
      )
      .with(DataKey::Lower(BoundName::Assets), Array1::<f64>::zeros(2))
      .with(DataKey::Upper(BoundName::Assets), Array1::<f64>::ones(2))
      .with(DataKey::Mu, array![0.25, 0.30])
      .with(DataKey::MuUncertainty, Array1::<f64>::zeros(2))
      .with(DataKey::VolaUncertainty, Array1::<f64>::zeros(2));
    problem
      .update(&data)
      .unwrap()
      .solve(&SolverSettings::default())
      .unwrap();

    assert_abs_diff_eq!(
      problem.weights().unwrap(),
      array![0.5556, 0.4444, 0.0, 0.0],
      epsilon = 1e-4
    );
  }

  #[test]
  fn factor_max_sharpe_links_factor_weights() {
    let portfolio = MaxSharpe::new(4, Some(3)).unwrap();
    assert_eq!(portfolio.builder().factor_weights().unwrap().len(), 3);
    let mut problem = portfolio.build().unwrap();
    assert!(problem.is_dpp());
    problem
      .parameter(ParameterName::SigmaMax)
      .unwrap()
      .set_scalar(2.0)
      .unwrap();

    let data = UpdateData::new()
      .with(DataKey::Cholesky, ndarray::Array2::<f64>::eye(2))
      .with(DataKey::Exposure, array![[1.0, 0.0, 1.0], [1.0, 0.5, 1.0]])
      .with(DataKey::IdiosyncraticVola, array![0.1, 0.1, 0.1])
      .with(DataKey::IdiosyncraticVolaUncertainty, Array1::<f64>::zeros(3))
      .with(DataKey::SystematicVolaUncertainty, Array1::<f64>::zeros(2))
      .with(DataKey::Lower(BoundName::Assets), Array1::<f64>::zeros(3))
      .with(DataKey::Upper(BoundName::Assets), Array1::<f64>::ones(3))
      .with(DataKey::Lower(BoundName::Factors), array![-2.0, -2.0])
      .with(DataKey::Upper(BoundName::Factors), array![2.0, 2.0])
      .with(DataKey::Mu, array![0.1, 0.2, 0.15])
      .with(DataKey::MuUncertainty, Array1::<f64>::zeros(3));
    let value = problem
      .update(&data)
      .unwrap()
      .solve(&SolverSettings::default())
      .unwrap();

    // volatility of the second asset alone is 0.5 + 0.1, well inside the cap
    assert_abs_diff_eq!(value, 0.2, epsilon = 1e-5);
    let w = problem.weights().unwrap();
    assert_abs_diff_eq!(w, array![0.0, 1.0, 0.0, 0.0], epsilon = 1e-4);

    let exposure = problem
      .data()
      .find(|((model, key), _)| *model == ModelName::Risk && *key == DataKey::Exposure)
      .map(|(_, parameter)| parameter.value())
      .unwrap();
    assert_abs_diff_eq!(exposure.dot(&w), problem.factor_weights().unwrap(), epsilon = 1e-6);
  }
}
