//! # Atoms
//!
//! $$
//! e ::= x \mid c \mid \theta \mid \Theta e \mid e \circ e \mid e + e \mid -e \mid \textstyle\sum e \mid |e| \mid (e)_+ \mid (e)_- \mid |e|^p \mid \lVert e \rVert_2 \mid \operatorname{sum\_smallest}_k(e)
//! $$
//!
//! Expression tree over vectors. Operands of length one broadcast in sums and
//! elementwise products.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::ops::Add;
use std::ops::Mul;
use std::ops::Neg;
use std::ops::Sub;

use ndarray::Array1;
use ndarray::Axis;

use super::constraint::Constraint;
use super::constraint::Relation;
use super::parameter::Parameter;
use super::parameter::Shape;
use super::variable::Variable;
use crate::error::MarkowitzError;
use crate::error::Result;

#[derive(Clone, Debug)]
pub enum Expr {
  Variable(Variable),
  Constant(Array1<f64>),
  Parameter(Parameter),
  /// `theta @ e`; a vector parameter acts as a row, a scalar one scales.
  MatMul(Parameter, Box<Expr>),
  /// Elementwise product.
  Multiply(Box<Expr>, Box<Expr>),
  Add(Box<Expr>, Box<Expr>),
  Neg(Box<Expr>),
  Scale(f64, Box<Expr>),
  Sum(Box<Expr>),
  Stack(Vec<Expr>),
  Abs(Box<Expr>),
  Pos(Box<Expr>),
  NegPart(Box<Expr>),
  /// `|e|^p` for `p >= 1`.
  Power(Box<Expr>, f64),
  Norm2(Box<Expr>),
  SumSmallest(Box<Expr>, usize),
}

/// Numeric values of variables, used to evaluate expressions.
#[derive(Clone, Debug, Default)]
pub struct Assignment {
  values: HashMap<usize, Array1<f64>>,
}

impl Assignment {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with(mut self, variable: &Variable, value: Array1<f64>) -> Self {
    self.insert(variable, value);
    self
  }

  pub fn insert(&mut self, variable: &Variable, value: Array1<f64>) {
    self.values.insert(variable.id(), value);
  }

  pub fn get(&self, variable: &Variable) -> Option<&Array1<f64>> {
    self.values.get(&variable.id())
  }
}

fn broadcast(x: Array1<f64>, len: usize) -> Array1<f64> {
  if x.len() == 1 && len != 1 {
    Array1::from_elem(len, x[0])
  } else {
    x
  }
}

fn compatible(a: usize, b: usize) -> Option<usize> {
  match (a, b) {
    (a, b) if a == b => Some(a),
    (1, b) => Some(b),
    (a, 1) => Some(a),
    _ => None,
  }
}

impl Expr {
  fn children(&self) -> Vec<&Expr> {
    match self {
      Expr::Variable(_) | Expr::Constant(_) | Expr::Parameter(_) => vec![],
      Expr::MatMul(_, x) => vec![x.as_ref()],
      Expr::Multiply(a, b) | Expr::Add(a, b) => vec![a.as_ref(), b.as_ref()],
      Expr::Neg(x)
      | Expr::Scale(_, x)
      | Expr::Sum(x)
      | Expr::Abs(x)
      | Expr::Pos(x)
      | Expr::NegPart(x)
      | Expr::Power(x, _)
      | Expr::Norm2(x)
      | Expr::SumSmallest(x, _) => vec![x.as_ref()],
      Expr::Stack(items) => items.iter().collect(),
    }
  }

  /// Length of the vector this expression evaluates to.
  ///
  /// Assumes [`Expr::check_shape`] passed.
  pub fn len(&self) -> usize {
    match self {
      Expr::Variable(v) => v.len(),
      Expr::Constant(c) => c.len(),
      Expr::Parameter(p) => p.shape().len(),
      Expr::MatMul(p, x) => match p.shape() {
        Shape::Scalar => x.len(),
        Shape::Vector(_) => 1,
        Shape::Matrix(rows, _) => rows,
      },
      Expr::Multiply(a, b) | Expr::Add(a, b) => a.len().max(b.len()),
      Expr::Neg(x)
      | Expr::Scale(_, x)
      | Expr::Abs(x)
      | Expr::Pos(x)
      | Expr::NegPart(x)
      | Expr::Power(x, _) => x.len(),
      Expr::Sum(_) | Expr::Norm2(_) | Expr::SumSmallest(_, _) => 1,
      Expr::Stack(items) => items.iter().map(Expr::len).sum(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Validate operand shapes and return the resulting length.
  pub fn check_shape(&self) -> Result<usize> {
    let mismatch = |what: String| Err(MarkowitzError::Structural(what));
    match self {
      Expr::Variable(v) => Ok(v.len()),
      Expr::Constant(c) => Ok(c.len()),
      Expr::Parameter(p) => match p.shape() {
        Shape::Matrix(..) => mismatch(format!("matrix parameter {} used as a vector", p.name())),
        shape => Ok(shape.len()),
      },
      Expr::MatMul(p, x) => {
        let n = x.check_shape()?;
        match p.shape() {
          Shape::Scalar => Ok(n),
          Shape::Vector(m) if m == n => Ok(1),
          Shape::Matrix(rows, cols) if cols == n => Ok(rows),
          shape => mismatch(format!(
            "cannot multiply {} of shape {:?} with an expression of length {n}",
            p.name(),
            shape
          )),
        }
      }
      Expr::Multiply(a, b) | Expr::Add(a, b) => {
        let (n, m) = (a.check_shape()?, b.check_shape()?);
        match compatible(n, m) {
          Some(len) => Ok(len),
          None => mismatch(format!("operands of length {n} and {m} do not broadcast")),
        }
      }
      Expr::Power(x, p) => {
        let n = x.check_shape()?;
        if *p < 1.0 {
          return mismatch(format!("power {p} is not convex"));
        }
        Ok(n)
      }
      Expr::SumSmallest(x, k) => {
        let n = x.check_shape()?;
        if *k == 0 || *k > n {
          return mismatch(format!("sum_smallest of {k} entries out of {n}"));
        }
        Ok(1)
      }
      Expr::Neg(x) | Expr::Scale(_, x) | Expr::Abs(x) | Expr::Pos(x) | Expr::NegPart(x) => {
        x.check_shape()
      }
      Expr::Sum(x) | Expr::Norm2(x) => x.check_shape().map(|_| 1),
      Expr::Stack(items) => items
        .iter()
        .map(Expr::check_shape)
        .sum::<Result<usize>>(),
    }
  }

  pub fn has_variables(&self) -> bool {
    match self {
      Expr::Variable(_) => true,
      _ => self.children().into_iter().any(Expr::has_variables),
    }
  }

  pub fn has_parameters(&self) -> bool {
    match self {
      Expr::Parameter(_) | Expr::MatMul(..) => true,
      _ => self.children().into_iter().any(Expr::has_parameters),
    }
  }

  /// Variables referenced by this expression, keyed by id.
  pub fn variables(&self) -> BTreeMap<usize, Variable> {
    let mut found = BTreeMap::new();
    self.collect_variables(&mut found);
    found
  }

  pub(crate) fn collect_variables(&self, found: &mut BTreeMap<usize, Variable>) {
    match self {
      Expr::Variable(v) => {
        found.entry(v.id()).or_insert_with(|| v.clone());
      }
      _ => self
        .children()
        .into_iter()
        .for_each(|child| child.collect_variables(found)),
    }
  }

  /// Numeric value under `assignment` and the current parameter values.
  pub fn evaluate(&self, assignment: &Assignment) -> Result<Array1<f64>> {
    let value = match self {
      Expr::Variable(v) => assignment
        .get(v)
        .cloned()
        .ok_or_else(|| MarkowitzError::DataMismatch(format!("no value for variable {}", v.name())))?,
      Expr::Constant(c) => c.clone(),
      Expr::Parameter(p) => p.flat_value(),
      Expr::MatMul(p, x) => {
        let x = x.evaluate(assignment)?;
        let theta = p.value();
        match p.shape() {
          Shape::Scalar => x * theta[[0, 0]],
          Shape::Vector(_) => Array1::from_elem(1, theta.column(0).dot(&x)),
          Shape::Matrix(..) => theta.dot(&x),
        }
      }
      Expr::Multiply(a, b) => {
        let (a, b) = (a.evaluate(assignment)?, b.evaluate(assignment)?);
        let len = a.len().max(b.len());
        broadcast(a, len) * broadcast(b, len)
      }
      Expr::Add(a, b) => {
        let (a, b) = (a.evaluate(assignment)?, b.evaluate(assignment)?);
        let len = a.len().max(b.len());
        broadcast(a, len) + broadcast(b, len)
      }
      Expr::Neg(x) => -x.evaluate(assignment)?,
      Expr::Scale(k, x) => x.evaluate(assignment)? * *k,
      Expr::Sum(x) => Array1::from_elem(1, x.evaluate(assignment)?.sum()),
      Expr::Stack(items) => {
        let parts = items
          .iter()
          .map(|item| item.evaluate(assignment))
          .collect::<Result<Vec<_>>>()?;
        let views = parts.iter().map(|p| p.view()).collect::<Vec<_>>();
        ndarray::concatenate(Axis(0), &views)
          .map_err(|e| MarkowitzError::Structural(e.to_string()))?
      }
      Expr::Abs(x) => x.evaluate(assignment)?.mapv(f64::abs),
      Expr::Pos(x) => x.evaluate(assignment)?.mapv(|v| v.max(0.0)),
      Expr::NegPart(x) => x.evaluate(assignment)?.mapv(|v| (-v).max(0.0)),
      Expr::Power(x, p) => x.evaluate(assignment)?.mapv(|v| v.abs().powf(*p)),
      Expr::Norm2(x) => {
        let x = x.evaluate(assignment)?;
        Array1::from_elem(1, x.dot(&x).sqrt())
      }
      Expr::SumSmallest(x, k) => {
        let mut x = x.evaluate(assignment)?.to_vec();
        x.sort_by(f64::total_cmp);
        Array1::from_elem(1, x.iter().take(*k).sum())
      }
    };
    Ok(value)
  }

  /// Scalar value; fails on expressions of any other length.
  pub fn evaluate_scalar(&self, assignment: &Assignment) -> Result<f64> {
    let value = self.evaluate(assignment)?;
    match value.len() {
      1 => Ok(value[0]),
      n => Err(MarkowitzError::Structural(format!(
        "expected a scalar expression, got length {n}"
      ))),
    }
  }

  pub fn leq(self, rhs: impl Into<Expr>) -> Constraint {
    Constraint::new(self - rhs.into(), Relation::NonPos)
  }

  pub fn geq(self, rhs: impl Into<Expr>) -> Constraint {
    Constraint::new(rhs.into() - self, Relation::NonPos)
  }

  pub fn equals(self, rhs: impl Into<Expr>) -> Constraint {
    Constraint::new(self - rhs.into(), Relation::Zero)
  }
}

impl From<Variable> for Expr {
  fn from(v: Variable) -> Self {
    Expr::Variable(v)
  }
}

impl From<&Variable> for Expr {
  fn from(v: &Variable) -> Self {
    Expr::Variable(v.clone())
  }
}

impl From<Parameter> for Expr {
  fn from(p: Parameter) -> Self {
    Expr::Parameter(p)
  }
}

impl From<&Parameter> for Expr {
  fn from(p: &Parameter) -> Self {
    Expr::Parameter(p.clone())
  }
}

impl From<f64> for Expr {
  fn from(c: f64) -> Self {
    Expr::Constant(Array1::from_elem(1, c))
  }
}

impl From<Array1<f64>> for Expr {
  fn from(c: Array1<f64>) -> Self {
    Expr::Constant(c)
  }
}

impl<T: Into<Expr>> Add<T> for Expr {
  type Output = Expr;

  fn add(self, rhs: T) -> Expr {
    Expr::Add(Box::new(self), Box::new(rhs.into()))
  }
}

impl<T: Into<Expr>> Sub<T> for Expr {
  type Output = Expr;

  fn sub(self, rhs: T) -> Expr {
    Expr::Add(Box::new(self), Box::new(Expr::Neg(Box::new(rhs.into()))))
  }
}

impl Neg for Expr {
  type Output = Expr;

  fn neg(self) -> Expr {
    Expr::Neg(Box::new(self))
  }
}

impl Mul<f64> for Expr {
  type Output = Expr;

  fn mul(self, k: f64) -> Expr {
    Expr::Scale(k, Box::new(self))
  }
}

impl Mul<Expr> for f64 {
  type Output = Expr;

  fn mul(self, x: Expr) -> Expr {
    Expr::Scale(self, Box::new(x))
  }
}

pub fn abs(x: impl Into<Expr>) -> Expr {
  Expr::Abs(Box::new(x.into()))
}

/// Positive part `max(x, 0)`.
pub fn pos(x: impl Into<Expr>) -> Expr {
  Expr::Pos(Box::new(x.into()))
}

/// Negative part `max(-x, 0)`.
pub fn neg(x: impl Into<Expr>) -> Expr {
  Expr::NegPart(Box::new(x.into()))
}

/// Elementwise `|x|^p`.
pub fn power(x: impl Into<Expr>, p: f64) -> Expr {
  Expr::Power(Box::new(x.into()), p)
}

pub fn norm2(x: impl Into<Expr>) -> Expr {
  Expr::Norm2(Box::new(x.into()))
}

pub fn sum(x: impl Into<Expr>) -> Expr {
  Expr::Sum(Box::new(x.into()))
}

/// Sum of the `k` smallest entries.
pub fn sum_smallest(x: impl Into<Expr>, k: usize) -> Expr {
  Expr::SumSmallest(Box::new(x.into()), k)
}

pub fn hstack(items: Vec<Expr>) -> Expr {
  Expr::Stack(items)
}

pub fn multiply(a: impl Into<Expr>, b: impl Into<Expr>) -> Expr {
  Expr::Multiply(Box::new(a.into()), Box::new(b.into()))
}

pub fn matmul(theta: &Parameter, x: impl Into<Expr>) -> Expr {
  Expr::MatMul(theta.clone(), Box::new(x.into()))
}
