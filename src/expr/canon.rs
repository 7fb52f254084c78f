//! # Canonicalization
//!
//! $$
//! |x_i| \le t_i,\quad \lVert x \rVert_2 \le t,\quad |x_i|^p \le t_i \iff (t_i, 1, x_i) \in \mathcal{P}_{1/p},\quad \textstyle\sum_{k\text{ smallest}} x \ge kz - \sum_i u_i
//! $$
//!
//! Lowers an expression tree into affine rows grouped by cone. Every
//! nonlinear atom introduces fresh epigraph (or hypograph) columns.

use std::collections::BTreeMap;

use super::atoms::Assignment;
use super::atoms::Expr;
use super::constraint::Constraint;
use super::constraint::Objective;
use super::constraint::Relation;
use super::parameter::Shape;
use super::variable::Variable;
use crate::error::MarkowitzError;
use crate::error::Result;

/// `constant + sum(coef * x[col])`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinExpr {
  pub terms: Vec<(usize, f64)>,
  pub constant: f64,
}

impl LinExpr {
  pub fn constant(c: f64) -> Self {
    Self {
      terms: vec![],
      constant: c,
    }
  }

  pub fn column(col: usize) -> Self {
    Self {
      terms: vec![(col, 1.0)],
      constant: 0.0,
    }
  }

  fn scaled(&self, k: f64) -> Self {
    Self {
      terms: self.terms.iter().map(|&(col, c)| (col, c * k)).collect(),
      constant: self.constant * k,
    }
  }

  fn add_scaled(&mut self, other: &LinExpr, k: f64) {
    self
      .terms
      .extend(other.terms.iter().map(|&(col, c)| (col, c * k)));
    self.constant += other.constant * k;
  }

  fn plus(&self, other: &LinExpr, k: f64) -> Self {
    let mut out = self.clone();
    out.add_scaled(other, k);
    out
  }

  /// Merge duplicate columns and drop zero coefficients.
  pub fn compact(&self) -> Self {
    let mut merged = BTreeMap::new();
    for &(col, c) in &self.terms {
      *merged.entry(col).or_insert(0.0) += c;
    }
    Self {
      terms: merged.into_iter().filter(|&(_, c)| c != 0.0).collect(),
      constant: self.constant,
    }
  }

  pub fn evaluate(&self, x: &[f64]) -> f64 {
    self.constant + self.terms.iter().map(|&(col, c)| c * x[col]).sum::<f64>()
  }
}

type Affine = Vec<LinExpr>;

fn broadcast(x: Affine, len: usize) -> Affine {
  if x.len() == 1 && len != 1 {
    vec![x[0].clone(); len]
  } else {
    x
  }
}

/// Column range of a variable in the stacked solution vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slot {
  pub offset: usize,
  pub len: usize,
}

/// Assignment of user variables to solver columns.
#[derive(Clone, Debug, Default)]
pub struct Layout {
  slots: BTreeMap<usize, Slot>,
  nonneg: Vec<Slot>,
  size: usize,
}

impl Layout {
  pub fn new<'a>(variables: impl IntoIterator<Item = &'a Variable>) -> Self {
    let mut layout = Self::default();
    for v in variables {
      if layout.slots.contains_key(&v.id()) {
        continue;
      }
      let slot = Slot {
        offset: layout.size,
        len: v.len(),
      };
      layout.slots.insert(v.id(), slot);
      if v.is_nonneg() {
        layout.nonneg.push(slot);
      }
      layout.size += v.len();
    }
    layout
  }

  pub fn slot(&self, variable: &Variable) -> Option<Slot> {
    self.slots.get(&variable.id()).copied()
  }

  pub fn size(&self) -> usize {
    self.size
  }
}

/// Conic program `min objective` subject to each row group lying in its cone.
#[derive(Clone, Debug, Default)]
pub struct ConicForm {
  pub columns: usize,
  pub objective: LinExpr,
  pub zero: Vec<LinExpr>,
  pub nonneg: Vec<LinExpr>,
  pub soc: Vec<Vec<LinExpr>>,
  pub power: Vec<([LinExpr; 3], f64)>,
}

/// Shape of a conic form; identical for every parameter value of a DPP program.
#[derive(Clone, Debug, PartialEq)]
pub struct ConeSignature {
  pub columns: usize,
  pub zero: usize,
  pub nonneg: usize,
  pub soc: Vec<usize>,
  pub power: Vec<f64>,
}

impl ConicForm {
  pub fn signature(&self) -> ConeSignature {
    ConeSignature {
      columns: self.columns,
      zero: self.zero.len(),
      nonneg: self.nonneg.len(),
      soc: self.soc.iter().map(Vec::len).collect(),
      power: self.power.iter().map(|(_, alpha)| *alpha).collect(),
    }
  }

  pub fn rows(&self) -> usize {
    self.zero.len()
      + self.nonneg.len()
      + self.soc.iter().map(Vec::len).sum::<usize>()
      + 3 * self.power.len()
  }
}

pub struct Canonicalizer<'a> {
  layout: &'a Layout,
  form: ConicForm,
}

impl<'a> Canonicalizer<'a> {
  pub fn new(layout: &'a Layout) -> Self {
    let mut form = ConicForm {
      columns: layout.size(),
      ..ConicForm::default()
    };
    for slot in &layout.nonneg {
      form
        .nonneg
        .extend((slot.offset..slot.offset + slot.len).map(LinExpr::column));
    }
    Self { layout, form }
  }

  fn fresh(&mut self, n: usize) -> Vec<LinExpr> {
    let start = self.form.columns;
    self.form.columns += n;
    (start..start + n).map(LinExpr::column).collect()
  }

  pub fn objective(&mut self, objective: &Objective) -> Result<()> {
    let rows = self.affine(objective.expr())?;
    let [row] = rows.as_slice() else {
      return Err(MarkowitzError::Structural(format!(
        "objective must be scalar, got length {}",
        rows.len()
      )));
    };
    self.form.objective = match objective {
      Objective::Minimize(_) => row.clone(),
      Objective::Maximize(_) => row.scaled(-1.0),
    };
    Ok(())
  }

  pub fn constraint(&mut self, constraint: &Constraint) -> Result<()> {
    let rows = self.affine(constraint.expr())?;
    match constraint.relation() {
      Relation::Zero => self.form.zero.extend(rows),
      Relation::NonPos => self
        .form
        .nonneg
        .extend(rows.iter().map(|row| row.scaled(-1.0))),
    }
    Ok(())
  }

  pub fn finish(self) -> ConicForm {
    let compact = |rows: Vec<LinExpr>| rows.iter().map(LinExpr::compact).collect::<Vec<_>>();
    ConicForm {
      columns: self.form.columns,
      objective: self.form.objective.compact(),
      zero: compact(self.form.zero),
      nonneg: compact(self.form.nonneg),
      soc: self.form.soc.into_iter().map(compact).collect(),
      power: self
        .form
        .power
        .into_iter()
        .map(|(rows, alpha)| (rows.map(|row| row.compact()), alpha))
        .collect(),
    }
  }

  /// Affine rows whose value equals (convex atoms: bounds from above) `expr`.
  fn affine(&mut self, expr: &Expr) -> Result<Affine> {
    if !expr.has_variables() {
      return Self::constant(expr);
    }

    let rows = match expr {
      Expr::Variable(v) => {
        let slot = self.layout.slot(v).ok_or_else(|| {
          MarkowitzError::Structural(format!("variable {} is not part of the problem", v.name()))
        })?;
        (slot.offset..slot.offset + slot.len)
          .map(LinExpr::column)
          .collect()
      }
      Expr::Constant(_) | Expr::Parameter(_) => Self::constant(expr)?,
      Expr::MatMul(p, x) => {
        let x = self.affine(x)?;
        let theta = p.value();
        match p.shape() {
          Shape::Scalar => x.iter().map(|row| row.scaled(theta[[0, 0]])).collect(),
          Shape::Vector(_) => {
            let mut out = LinExpr::default();
            for (row, &c) in x.iter().zip(theta.column(0)) {
              out.add_scaled(row, c);
            }
            vec![out]
          }
          Shape::Matrix(..) => theta
            .rows()
            .into_iter()
            .map(|weights| {
              let mut out = LinExpr::default();
              for (row, &c) in x.iter().zip(weights) {
                out.add_scaled(row, c);
              }
              out
            })
            .collect(),
        }
      }
      Expr::Multiply(a, b) => {
        let (factor, x) = if a.has_variables() { (b, a) } else { (a, b) };
        let factor = factor.evaluate(&Assignment::new())?;
        let x = self.affine(x)?;
        let len = x.len().max(factor.len());
        let x = broadcast(x, len);
        (0..len)
          .map(|i| {
            let c = if factor.len() == 1 { factor[0] } else { factor[i] };
            x[i].scaled(c)
          })
          .collect()
      }
      Expr::Add(a, b) => {
        let (a, b) = (self.affine(a)?, self.affine(b)?);
        let len = a.len().max(b.len());
        let (a, b) = (broadcast(a, len), broadcast(b, len));
        a.iter().zip(&b).map(|(a, b)| a.plus(b, 1.0)).collect()
      }
      Expr::Neg(x) => self.affine(x)?.iter().map(|row| row.scaled(-1.0)).collect(),
      Expr::Scale(k, x) => self.affine(x)?.iter().map(|row| row.scaled(*k)).collect(),
      Expr::Sum(x) => {
        let mut out = LinExpr::default();
        for row in self.affine(x)? {
          out.add_scaled(&row, 1.0);
        }
        vec![out]
      }
      Expr::Stack(items) => {
        let mut out = vec![];
        for item in items {
          out.extend(self.affine(item)?);
        }
        out
      }
      Expr::Abs(x) => self.abs(x)?,
      Expr::Pos(x) => {
        let x = self.affine(x)?;
        let t = self.fresh(x.len());
        for (t, x) in t.iter().zip(&x) {
          self.form.nonneg.push(t.clone());
          self.form.nonneg.push(t.plus(x, -1.0));
        }
        t
      }
      Expr::NegPart(x) => {
        let x = self.affine(x)?;
        let t = self.fresh(x.len());
        for (t, x) in t.iter().zip(&x) {
          self.form.nonneg.push(t.clone());
          self.form.nonneg.push(t.plus(x, 1.0));
        }
        t
      }
      Expr::Power(x, p) if *p == 1.0 => self.abs(x)?,
      Expr::Power(x, p) => {
        if *p < 1.0 {
          return Err(MarkowitzError::Structural(format!("power {p} is not convex")));
        }
        let x = self.affine(x)?;
        let t = self.fresh(x.len());
        for (t, x) in t.iter().zip(&x) {
          self
            .form
            .power
            .push(([t.clone(), LinExpr::constant(1.0), x.clone()], 1.0 / p));
        }
        t
      }
      Expr::Norm2(x) => {
        let x = self.affine(x)?;
        let t = self.fresh(1);
        let mut cone = t.clone();
        cone.extend(x);
        self.form.soc.push(cone);
        t
      }
      Expr::SumSmallest(x, k) => {
        let x = self.affine(x)?;
        if *k == 0 || *k > x.len() {
          return Err(MarkowitzError::Structural(format!(
            "sum_smallest of {k} entries out of {}",
            x.len()
          )));
        }
        let z = self.fresh(1).remove(0);
        let u = self.fresh(x.len());
        let mut out = z.scaled(*k as f64);
        for (u, x) in u.iter().zip(&x) {
          // u >= z - x, u >= 0
          self.form.nonneg.push(u.clone());
          self.form.nonneg.push(u.plus(&z, -1.0).plus(x, 1.0));
          out.add_scaled(u, -1.0);
        }
        vec![out]
      }
    };
    Ok(rows)
  }

  fn constant(expr: &Expr) -> Result<Affine> {
    let value = expr.evaluate(&Assignment::new())?;
    Ok(value.iter().map(|&c| LinExpr::constant(c)).collect())
  }

  fn abs(&mut self, x: &Expr) -> Result<Affine> {
    let x = self.affine(x)?;
    let t = self.fresh(x.len());
    for (t, x) in t.iter().zip(&x) {
      self.form.nonneg.push(t.plus(x, -1.0));
      self.form.nonneg.push(t.plus(x, 1.0));
    }
    Ok(t)
  }
}

#[cfg(test)]
mod tests {
  use ndarray::array;

  use super::*;
  use crate::expr::abs;
  use crate::expr::matmul;
  use crate::expr::norm2;
  use crate::expr::power;
  use crate::expr::sum;
  use crate::expr::sum_smallest;
  use crate::expr::Parameter;

  #[test]
  fn affine_rows_follow_parameter_values() {
    let x = Variable::new(2, "x");
    let layout = Layout::new([&x]);
    let m = Parameter::matrix("m", 2, 2, false);
    m.set(array![[1.0, 2.0], [3.0, 4.0]]).unwrap();

    let mut canon = Canonicalizer::new(&layout);
    canon
      .constraint(&(matmul(&m, &x) + 1.0).equals(0.0))
      .unwrap();
    let form = canon.finish();

    assert_eq!(form.zero.len(), 2);
    assert_eq!(form.zero[0].terms, vec![(0, 1.0), (1, 2.0)]);
    assert_eq!(form.zero[1].terms, vec![(0, 3.0), (1, 4.0)]);
    assert_eq!(form.zero[1].constant, 1.0);
  }

  #[test]
  fn atoms_introduce_cones() {
    let x = Variable::nonneg(3, "x");
    let layout = Layout::new([&x]);
    let mut canon = Canonicalizer::new(&layout);
    canon
      .objective(&Objective::Minimize(
        norm2(&x) + sum(abs(&x)) + sum(power(&x, 2.0)),
      ))
      .unwrap();
    canon
      .constraint(&sum_smallest(&x, 2).geq(0.1))
      .unwrap();
    let form = canon.finish();
    let signature = form.signature();

    assert_eq!(signature.soc, vec![4]);
    assert_eq!(signature.power, vec![0.5; 3]);
    // 3 nonneg variable rows, 6 abs rows, 6 sum_smallest rows, 1 constraint row
    assert_eq!(signature.nonneg, 16);
    // x, norm epigraph, abs epigraphs, power epigraphs, z and u
    assert_eq!(signature.columns, 3 + 1 + 3 + 3 + 1 + 3);
  }

  #[test]
  fn signature_ignores_parameter_values() {
    let x = Variable::new(2, "x");
    let layout = Layout::new([&x]);
    let v = Parameter::vector("v", 2, true);
    let form = |value| {
      v.set_vector(value).unwrap();
      let mut canon = Canonicalizer::new(&layout);
      canon
        .objective(&Objective::Minimize(norm2(crate::expr::multiply(&v, &x))))
        .unwrap();
      canon.finish().signature()
    };
    assert_eq!(form(array![1.0, 2.0]), form(array![0.0, 5.0]));
  }

  #[test]
  fn unknown_variables_are_rejected() {
    let x = Variable::new(2, "x");
    let y = Variable::new(2, "y");
    let layout = Layout::new([&x]);
    let mut canon = Canonicalizer::new(&layout);
    assert!(canon.constraint(&Expr::from(&y).leq(1.0)).is_err());
  }
}
