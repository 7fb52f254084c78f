use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

use ndarray::Array1;
use ndarray::Array2;
use ndarray::Axis;

use super::next_id;
use crate::error::MarkowitzError;
use crate::error::Result;

/// Declared shape of a parameter. Never changes after construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
  Scalar,
  Vector(usize),
  Matrix(usize, usize),
}

impl Shape {
  /// Storage dimension; vectors are kept as single columns.
  pub fn dim(&self) -> (usize, usize) {
    match *self {
      Shape::Scalar => (1, 1),
      Shape::Vector(n) => (n, 1),
      Shape::Matrix(rows, cols) => (rows, cols),
    }
  }

  pub fn len(&self) -> usize {
    let (rows, cols) = self.dim();
    rows * cols
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

struct Inner {
  id: usize,
  name: String,
  shape: Shape,
  nonneg: bool,
  value: RefCell<Array2<f64>>,
  callback: Option<Box<dyn Fn() -> f64>>,
}

/// Named numeric placeholder with fixed shape and mutable value.
///
/// Clones share the same storage, so a model, its expressions and the
/// compiled problem all observe a single write.
#[derive(Clone)]
pub struct Parameter(Rc<Inner>);

impl Parameter {
  fn with_shape(name: impl Into<String>, shape: Shape, nonneg: bool, value: Array2<f64>) -> Self {
    Self(Rc::new(Inner {
      id: next_id(),
      name: name.into(),
      shape,
      nonneg,
      value: RefCell::new(value),
      callback: None,
    }))
  }

  pub fn scalar(name: impl Into<String>, nonneg: bool) -> Self {
    Self::with_shape(name, Shape::Scalar, nonneg, Array2::zeros((1, 1)))
  }

  pub fn vector(name: impl Into<String>, len: usize, nonneg: bool) -> Self {
    Self::with_shape(name, Shape::Vector(len), nonneg, Array2::zeros((len, 1)))
  }

  /// Vector parameter whose shape and initial value come from `value`.
  pub fn vector_from(name: impl Into<String>, value: Array1<f64>, nonneg: bool) -> Self {
    let len = value.len();
    Self::with_shape(name, Shape::Vector(len), nonneg, value.insert_axis(Axis(1)))
  }

  pub fn matrix(name: impl Into<String>, rows: usize, cols: usize, nonneg: bool) -> Self {
    Self::with_shape(
      name,
      Shape::Matrix(rows, cols),
      nonneg,
      Array2::zeros((rows, cols)),
    )
  }

  /// Scalar parameter whose value is recomputed from `f` at every read.
  pub fn callback(name: impl Into<String>, nonneg: bool, f: impl Fn() -> f64 + 'static) -> Self {
    Self(Rc::new(Inner {
      id: next_id(),
      name: name.into(),
      shape: Shape::Scalar,
      nonneg,
      value: RefCell::new(Array2::zeros((1, 1))),
      callback: Some(Box::new(f)),
    }))
  }

  pub fn id(&self) -> usize {
    self.0.id
  }

  pub fn name(&self) -> &str {
    &self.0.name
  }

  pub fn shape(&self) -> Shape {
    self.0.shape
  }

  pub fn is_nonneg(&self) -> bool {
    self.0.nonneg
  }

  pub fn is_callback(&self) -> bool {
    self.0.callback.is_some()
  }

  /// Current value in storage layout.
  pub fn value(&self) -> Array2<f64> {
    match &self.0.callback {
      Some(f) => Array2::from_elem((1, 1), f()),
      None => self.0.value.borrow().clone(),
    }
  }

  /// Current value flattened row-major.
  pub fn flat_value(&self) -> Array1<f64> {
    self.value().iter().copied().collect()
  }

  pub fn scalar_value(&self) -> f64 {
    self.value()[[0, 0]]
  }

  /// Check `value` against the declared shape and sign without writing it.
  pub fn validate(&self, value: &Array2<f64>) -> Result<()> {
    if self.is_callback() {
      return Err(MarkowitzError::DataMismatch(format!(
        "parameter {} is derived and cannot be assigned",
        self.name()
      )));
    }

    let declared = self.shape().dim();
    if value.dim() != declared {
      return Err(MarkowitzError::DataMismatch(format!(
        "parameter {} expects shape {:?}, got {:?}",
        self.name(),
        declared,
        value.dim()
      )));
    }

    if value.iter().any(|v| !v.is_finite()) {
      return Err(MarkowitzError::DataMismatch(format!(
        "parameter {} received non-finite values",
        self.name()
      )));
    }

    if self.is_nonneg() && value.iter().any(|&v| v < 0.0) {
      return Err(MarkowitzError::DataMismatch(format!(
        "parameter {} must be nonnegative",
        self.name()
      )));
    }

    Ok(())
  }

  pub fn set(&self, value: Array2<f64>) -> Result<()> {
    self.validate(&value)?;
    self.assign(value);
    Ok(())
  }

  pub fn set_vector(&self, value: Array1<f64>) -> Result<()> {
    self.set(value.insert_axis(Axis(1)))
  }

  pub fn set_scalar(&self, value: f64) -> Result<()> {
    self.set(Array2::from_elem((1, 1), value))
  }

  /// Write a value that already passed [`Parameter::validate`].
  pub(crate) fn assign(&self, value: Array2<f64>) {
    *self.0.value.borrow_mut() = value;
  }
}

impl Debug for Parameter {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Parameter")
      .field("id", &self.0.id)
      .field("name", &self.0.name)
      .field("shape", &self.0.shape)
      .field("nonneg", &self.0.nonneg)
      .field("callback", &self.is_callback())
      .finish()
  }
}

impl PartialEq for Parameter {
  fn eq(&self, other: &Self) -> bool {
    self.id() == other.id()
  }
}

impl Eq for Parameter {}

#[cfg(test)]
mod tests {
  use std::cell::Cell;

  use ndarray::array;

  use super::*;

  #[test]
  fn clones_share_storage() {
    let p = Parameter::vector("mu", 2, false);
    let q = p.clone();
    p.set_vector(array![0.1, 0.2]).unwrap();
    assert_eq!(q.flat_value(), array![0.1, 0.2]);
  }

  #[test]
  fn shape_is_fixed() {
    let p = Parameter::matrix("chol", 2, 2, false);
    assert!(p.set(Array2::zeros((3, 2))).is_err());
    assert!(p.set(Array2::<f64>::eye(2)).is_ok());
    assert_eq!(p.value(), Array2::<f64>::eye(2));
  }

  #[test]
  fn nonneg_parameters_reject_negative_values() {
    let p = Parameter::vector("vola_uncertainty", 2, true);
    assert!(p.set_vector(array![0.1, -0.1]).is_err());
    assert_eq!(p.flat_value(), array![0.0, 0.0]);
  }

  #[test]
  fn non_finite_values_are_rejected() {
    let p = Parameter::scalar("sigma_max", true);
    assert!(p.set_scalar(f64::NAN).is_err());
    assert!(p.set_scalar(f64::INFINITY).is_err());
  }

  #[test]
  fn callbacks_are_read_only_and_live() {
    let source = Rc::new(Cell::new(2.0));
    let inner = source.clone();
    let p = Parameter::callback("st_omega", true, move || inner.get() * 3.0);
    assert_eq!(p.scalar_value(), 6.0);
    source.set(1.0);
    assert_eq!(p.scalar_value(), 3.0);
    assert!(p.set_scalar(1.0).is_err());
  }
}
