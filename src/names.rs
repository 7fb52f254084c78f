//! # Names
//!
//! $$
//! \texttt{key} = \texttt{model} \,\Vert\, \texttt{\_} \,\Vert\, \texttt{constraint}
//! $$
//!
//! Closed sets of names for models, data, variables, constraints and
//! builder parameters. Registries are keyed by these enums, so two components
//! can never collide on a misspelled string.

use std::fmt::Display;
use std::str::FromStr;

use crate::error::MarkowitzError;

/// Slot of a model inside a builder or problem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModelName {
  Risk,
  Return,
  BoundAssets,
  BoundFactors,
  HoldingCosts,
  TradingCosts,
}

impl Display for ModelName {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ModelName::Risk => write!(f, "risk"),
      ModelName::Return => write!(f, "return"),
      ModelName::BoundAssets => write!(f, "bound_assets"),
      ModelName::BoundFactors => write!(f, "bound_factors"),
      ModelName::HoldingCosts => write!(f, "holding_costs"),
      ModelName::TradingCosts => write!(f, "trading_costs"),
    }
  }
}

/// Which decision vector a [`crate::model::bounds::Bounds`] model restricts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BoundName {
  Assets,
  Factors,
}

impl Display for BoundName {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      BoundName::Assets => write!(f, "assets"),
      BoundName::Factors => write!(f, "factors"),
    }
  }
}

/// Keys of the numeric inputs consumed by `update`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DataKey {
  Returns,
  Mu,
  MuUncertainty,
  Cholesky,
  VolaUncertainty,
  Lower(BoundName),
  Upper(BoundName),
  Exposure,
  HoldingCosts,
  IdiosyncraticVola,
  IdiosyncraticVolaUncertainty,
  SystematicVolaUncertainty,
  /// Holdings before rebalancing, used by trading costs.
  InitialWeights,
}

impl DataKey {
  pub const ALL: [DataKey; 15] = [
    DataKey::Returns,
    DataKey::Mu,
    DataKey::MuUncertainty,
    DataKey::Cholesky,
    DataKey::VolaUncertainty,
    DataKey::Lower(BoundName::Assets),
    DataKey::Lower(BoundName::Factors),
    DataKey::Upper(BoundName::Assets),
    DataKey::Upper(BoundName::Factors),
    DataKey::Exposure,
    DataKey::HoldingCosts,
    DataKey::IdiosyncraticVola,
    DataKey::IdiosyncraticVolaUncertainty,
    DataKey::SystematicVolaUncertainty,
    DataKey::InitialWeights,
  ];
}

impl Display for DataKey {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      DataKey::Returns => write!(f, "returns"),
      DataKey::Mu => write!(f, "mu"),
      DataKey::MuUncertainty => write!(f, "mu_uncertainty"),
      DataKey::Cholesky => write!(f, "chol"),
      DataKey::VolaUncertainty => write!(f, "vola_uncertainty"),
      DataKey::Lower(name) => write!(f, "lower_{name}"),
      DataKey::Upper(name) => write!(f, "upper_{name}"),
      DataKey::Exposure => write!(f, "exposure"),
      DataKey::HoldingCosts => write!(f, "holding_costs"),
      DataKey::IdiosyncraticVola => write!(f, "idiosyncratic_vola"),
      DataKey::IdiosyncraticVolaUncertainty => write!(f, "idiosyncratic_vola_uncertainty"),
      DataKey::SystematicVolaUncertainty => write!(f, "systematic_vola_uncertainty"),
      DataKey::InitialWeights => write!(f, "initial_weights"),
    }
  }
}

impl FromStr for DataKey {
  type Err = MarkowitzError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    DataKey::ALL
      .iter()
      .copied()
      .find(|key| key.to_string() == s)
      .ok_or_else(|| MarkowitzError::UnknownKey(s.to_string()))
  }
}

/// Decision variables shared between models.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VariableName {
  Weights,
  FactorWeights,
  /// Epigraph variable bounding the absolute weights seen by the risk model.
  Abs,
  /// Realized volatility slack of the soft-risk strategy.
  Sigma,
}

impl Display for VariableName {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      VariableName::Weights => write!(f, "weights"),
      VariableName::FactorWeights => write!(f, "factor_weights"),
      VariableName::Abs => write!(f, "_abs"),
      VariableName::Sigma => write!(f, "sigma"),
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConstraintName {
  Budget,
  LongOnly,
  Risk,
  MaxRisk,
  LowerBound,
  UpperBound,
  /// `abs >= |x|`
  Abs,
  /// `factor_weights == exposure @ weights`
  FactorExposure,
}

impl Display for ConstraintName {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ConstraintName::Budget => write!(f, "budget"),
      ConstraintName::LongOnly => write!(f, "long_only"),
      ConstraintName::Risk => write!(f, "risk"),
      ConstraintName::MaxRisk => write!(f, "max_risk"),
      ConstraintName::LowerBound => write!(f, "lower_bound"),
      ConstraintName::UpperBound => write!(f, "upper_bound"),
      ConstraintName::Abs => write!(f, "abs"),
      ConstraintName::FactorExposure => write!(f, "factors"),
    }
  }
}

/// Key of a constraint in a built problem.
///
/// Constraints registered by a model are namespaced by the model slot, so the
/// flat key `"{model}_{constraint}"` is unique as long as model slots are.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConstraintKey {
  pub model: Option<ModelName>,
  pub name: ConstraintName,
}

impl ConstraintKey {
  /// Key of a constraint added directly by a builder or strategy.
  pub fn builder(name: ConstraintName) -> Self {
    Self { model: None, name }
  }

  /// Key of a constraint contributed by the model in slot `model`.
  pub fn model(model: ModelName, name: ConstraintName) -> Self {
    Self {
      model: Some(model),
      name,
    }
  }
}

impl From<ConstraintName> for ConstraintKey {
  fn from(name: ConstraintName) -> Self {
    ConstraintKey::builder(name)
  }
}

impl Display for ConstraintKey {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self.model {
      Some(model) => write!(f, "{model}_{}", self.name),
      None => write!(f, "{}", self.name),
    }
  }
}

/// Builder-level scalar knobs, set outside the `update` contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParameterName {
  SigmaMax,
  SigmaTarget,
  Omega,
}

impl Display for ParameterName {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ParameterName::SigmaMax => write!(f, "sigma_max"),
      ParameterName::SigmaTarget => write!(f, "sigma_target"),
      ParameterName::Omega => write!(f, "omega"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn data_keys_round_trip_through_their_names() {
    for key in DataKey::ALL {
      assert_eq!(key.to_string().parse::<DataKey>().unwrap(), key);
    }
    assert!("cov".parse::<DataKey>().is_err());
  }

  #[test]
  fn constraint_keys_are_namespaced_by_model() {
    let key = ConstraintKey::model(ModelName::BoundAssets, ConstraintName::LowerBound);
    assert_eq!(key.to_string(), "bound_assets_lower_bound");
    assert_eq!(ConstraintKey::builder(ConstraintName::Budget).to_string(), "budget");
    assert_ne!(
      ConstraintKey::model(ModelName::Risk, ConstraintName::Risk),
      ConstraintKey::builder(ConstraintName::Risk)
    );
  }
}
