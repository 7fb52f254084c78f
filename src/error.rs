//! # Errors
//!
//! $$
//! \text{update}(\theta) \in \{\text{ok}\} \cup \mathcal{E}, \qquad \mathcal{E}\ \text{raised before any write}
//! $$
//!
//! Error taxonomy shared by models, builders and problems.

use thiserror::Error;

use crate::names::DataKey;
use crate::names::ModelName;
use crate::names::ParameterName;
use crate::names::VariableName;

pub type Result<T> = std::result::Result<T, MarkowitzError>;

fn owner(model: &Option<ModelName>) -> String {
  match model {
    Some(model) => format!(" in model {model}"),
    None => String::new(),
  }
}

fn key_label(key: &Option<DataKey>) -> String {
  match key {
    Some(key) => key.to_string(),
    None => "input".to_string(),
  }
}

#[derive(Debug, Error)]
pub enum MarkowitzError {
  /// A model's declared key was absent from the update payload.
  #[error("missing data for {key}{}", owner(.model))]
  DataIncomplete {
    key: DataKey,
    model: Option<ModelName>,
  },

  /// Supplied inputs are inconsistent with each other or with the parameter they target.
  #[error("data mismatch: {0}")]
  DataMismatch(String),

  /// An input is larger than the fixed buffer it is padded into.
  #[error(
    "{} of shape {supplied:?} does not fit into the declared shape {declared:?}",
    key_label(.key)
  )]
  ShapeOverflow {
    key: Option<DataKey>,
    declared: (usize, usize),
    supplied: (usize, usize),
  },

  /// The composed program is not DCP/DPP or its compiled structure drifted.
  #[error("structural error: {0}")]
  Structural(String),

  #[error("problem status is {status}")]
  SolveFailure { status: String },

  #[error("unknown variable {0}")]
  UnknownVariable(VariableName),

  #[error("unknown parameter {0}")]
  UnknownParameter(ParameterName),

  #[error("unknown data key {0}")]
  UnknownKey(String),

  #[error("{0} provides no estimate")]
  EstimateNotSupported(&'static str),

  #[error("dimension error: {0}")]
  Dimension(String),

  #[error("linear algebra failure: {0}")]
  Linalg(String),
}

impl MarkowitzError {
  /// Attach the data key to a padding failure raised by a key-agnostic helper.
  pub fn with_key(self, key: DataKey) -> Self {
    match self {
      MarkowitzError::ShapeOverflow {
        declared, supplied, ..
      } => MarkowitzError::ShapeOverflow {
        key: Some(key),
        declared,
        supplied,
      },
      other => other,
    }
  }

  /// Name the owning model slot on a missing-data error raised by the model itself.
  pub fn in_model(self, name: ModelName) -> Self {
    match self {
      MarkowitzError::DataIncomplete { key, model: None } => MarkowitzError::DataIncomplete {
        key,
        model: Some(name),
      },
      other => other,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::names::BoundName;

  #[test]
  fn messages_name_the_missing_key_and_model() {
    let err = MarkowitzError::DataIncomplete {
      key: DataKey::Lower(BoundName::Assets),
      model: Some(ModelName::BoundAssets),
    };
    assert_eq!(err.to_string(), "missing data for lower_assets in model bound_assets");
  }

  #[test]
  fn with_key_only_touches_shape_overflow() {
    let err = MarkowitzError::ShapeOverflow {
      key: None,
      declared: (3, 1),
      supplied: (4, 1),
    }
    .with_key(DataKey::Mu);
    assert!(matches!(
      err,
      MarkowitzError::ShapeOverflow {
        key: Some(DataKey::Mu),
        ..
      }
    ));

    let err = MarkowitzError::DataMismatch("x".into()).with_key(DataKey::Mu);
    assert!(matches!(err, MarkowitzError::DataMismatch(_)));
  }

  #[test]
  fn in_model_keeps_an_existing_owner() {
    let err = MarkowitzError::DataIncomplete {
      key: DataKey::Mu,
      model: None,
    }
    .in_model(ModelName::Return);
    assert_eq!(err.to_string(), "missing data for mu in model return");

    let err = MarkowitzError::DataIncomplete {
      key: DataKey::Mu,
      model: Some(ModelName::Risk),
    }
    .in_model(ModelName::Return);
    assert_eq!(err.to_string(), "missing data for mu in model risk");
  }
}
