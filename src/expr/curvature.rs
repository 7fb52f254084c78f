//! # Curvature
//!
//! $$
//! f(g(x))\ \text{convex} \iff f\ \text{convex},\ \big(g\ \text{affine}\big) \lor \big(f\uparrow,\ g\ \text{convex}\big) \lor \big(f\downarrow,\ g\ \text{concave}\big)
//! $$
//!
//! Disciplined convex programming analysis. Parameters count as constants
//! for curvature; the parametrized rule additionally requires every product
//! to pair a parameter-affine factor with a parameter-free one.

use super::atoms::Expr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Curvature {
  Constant,
  Affine,
  Convex,
  Concave,
  Unknown,
}

impl Curvature {
  pub fn is_affine(self) -> bool {
    matches!(self, Curvature::Constant | Curvature::Affine)
  }

  pub fn is_convex(self) -> bool {
    self.is_affine() || self == Curvature::Convex
  }

  pub fn is_concave(self) -> bool {
    self.is_affine() || self == Curvature::Concave
  }

  fn negate(self) -> Self {
    match self {
      Curvature::Convex => Curvature::Concave,
      Curvature::Concave => Curvature::Convex,
      other => other,
    }
  }

  fn add(self, other: Self) -> Self {
    if self == Curvature::Constant && other == Curvature::Constant {
      return Curvature::Constant;
    }

    match (
      self.is_convex() && other.is_convex(),
      self.is_concave() && other.is_concave(),
    ) {
      (true, true) => Curvature::Affine,
      (true, false) => Curvature::Convex,
      (false, true) => Curvature::Concave,
      (false, false) => Curvature::Unknown,
    }
  }

  fn scale(self, sign: Sign) -> Self {
    match (self, sign) {
      (Curvature::Constant | Curvature::Affine, _) => self,
      (_, Sign::Zero) => Curvature::Constant,
      (_, Sign::Nonneg) => self,
      (_, Sign::Nonpos) => self.negate(),
      (Curvature::Convex | Curvature::Concave | Curvature::Unknown, Sign::Unknown) => {
        Curvature::Unknown
      }
    }
  }

  fn convex_atom(arg: Self, increasing: bool, decreasing: bool) -> Self {
    if arg == Curvature::Constant {
      Curvature::Constant
    } else if arg.is_affine()
      || (increasing && arg.is_convex())
      || (decreasing && arg.is_concave())
    {
      Curvature::Convex
    } else {
      Curvature::Unknown
    }
  }

  fn concave_atom(arg: Self, increasing: bool, decreasing: bool) -> Self {
    if arg == Curvature::Constant {
      Curvature::Constant
    } else if arg.is_affine()
      || (increasing && arg.is_concave())
      || (decreasing && arg.is_convex())
    {
      Curvature::Concave
    } else {
      Curvature::Unknown
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sign {
  Zero,
  Nonneg,
  Nonpos,
  Unknown,
}

impl Sign {
  pub fn is_nonneg(self) -> bool {
    matches!(self, Sign::Zero | Sign::Nonneg)
  }

  pub fn is_nonpos(self) -> bool {
    matches!(self, Sign::Zero | Sign::Nonpos)
  }

  fn of_values<'a>(values: impl IntoIterator<Item = &'a f64>) -> Self {
    let (mut nonneg, mut nonpos) = (true, true);
    for &v in values {
      nonneg &= v >= 0.0;
      nonpos &= v <= 0.0;
    }
    match (nonneg, nonpos) {
      (true, true) => Sign::Zero,
      (true, false) => Sign::Nonneg,
      (false, true) => Sign::Nonpos,
      (false, false) => Sign::Unknown,
    }
  }

  fn negate(self) -> Self {
    match self {
      Sign::Nonneg => Sign::Nonpos,
      Sign::Nonpos => Sign::Nonneg,
      other => other,
    }
  }

  fn add(self, other: Self) -> Self {
    match (self, other) {
      (Sign::Zero, s) | (s, Sign::Zero) => s,
      (a, b) if a == b => a,
      _ => Sign::Unknown,
    }
  }

  fn mul(self, other: Self) -> Self {
    match (self, other) {
      (Sign::Zero, _) | (_, Sign::Zero) => Sign::Zero,
      (Sign::Unknown, _) | (_, Sign::Unknown) => Sign::Unknown,
      (a, b) if a == b => Sign::Nonneg,
      _ => Sign::Nonpos,
    }
  }

  fn scale(self, k: f64) -> Self {
    self.mul(Sign::of_values([k].iter()))
  }
}

impl Expr {
  pub fn sign(&self) -> Sign {
    match self {
      Expr::Variable(v) if v.is_nonneg() => Sign::Nonneg,
      Expr::Variable(_) => Sign::Unknown,
      Expr::Constant(c) => Sign::of_values(c.iter()),
      Expr::Parameter(p) if p.is_nonneg() => Sign::Nonneg,
      Expr::Parameter(_) => Sign::Unknown,
      Expr::MatMul(p, x) => {
        let theta = if p.is_nonneg() {
          Sign::Nonneg
        } else {
          Sign::Unknown
        };
        theta.mul(x.sign())
      }
      Expr::Multiply(a, b) => a.sign().mul(b.sign()),
      Expr::Add(a, b) => a.sign().add(b.sign()),
      Expr::Neg(x) => x.sign().negate(),
      Expr::Scale(k, x) => x.sign().scale(*k),
      Expr::Sum(x) => x.sign(),
      Expr::Stack(items) => items
        .iter()
        .map(Expr::sign)
        .fold(Sign::Zero, Sign::add),
      Expr::Abs(_) | Expr::Pos(_) | Expr::NegPart(_) | Expr::Power(..) | Expr::Norm2(_) => {
        Sign::Nonneg
      }
      Expr::SumSmallest(x, _) => x.sign(),
    }
  }

  pub fn curvature(&self) -> Curvature {
    if !self.has_variables() {
      return Curvature::Constant;
    }

    match self {
      Expr::Variable(_) => Curvature::Affine,
      Expr::Constant(_) | Expr::Parameter(_) => Curvature::Constant,
      Expr::MatMul(p, x) => {
        let theta = if p.is_nonneg() {
          Sign::Nonneg
        } else {
          Sign::Unknown
        };
        x.curvature().scale(theta)
      }
      Expr::Multiply(a, b) => match (a.has_variables(), b.has_variables()) {
        (true, true) => Curvature::Unknown,
        (false, _) => b.curvature().scale(a.sign()),
        (true, false) => a.curvature().scale(b.sign()),
      },
      Expr::Add(a, b) => a.curvature().add(b.curvature()),
      Expr::Neg(x) => x.curvature().negate(),
      Expr::Scale(k, x) => x.curvature().scale(Sign::of_values([*k].iter())),
      Expr::Sum(x) => x.curvature(),
      Expr::Stack(items) => items
        .iter()
        .map(Expr::curvature)
        .fold(Curvature::Constant, Curvature::add),
      Expr::Abs(x) | Expr::Power(x, _) | Expr::Norm2(x) => {
        let sign = x.sign();
        Curvature::convex_atom(x.curvature(), sign.is_nonneg(), sign.is_nonpos())
      }
      Expr::Pos(x) => Curvature::convex_atom(x.curvature(), true, false),
      Expr::NegPart(x) => Curvature::convex_atom(x.curvature(), false, true),
      Expr::SumSmallest(x, _) => Curvature::concave_atom(x.curvature(), true, false),
    }
  }

  /// Built only from parameters, constants and linear operations on them.
  pub fn is_parameter_affine(&self) -> bool {
    if self.has_variables() {
      return false;
    }
    if !self.has_parameters() {
      return true;
    }

    match self {
      Expr::Constant(_) | Expr::Parameter(_) => true,
      Expr::Add(a, b) => a.is_parameter_affine() && b.is_parameter_affine(),
      Expr::Neg(x) | Expr::Scale(_, x) | Expr::Sum(x) => x.is_parameter_affine(),
      Expr::Stack(items) => items.iter().all(Expr::is_parameter_affine),
      Expr::Multiply(a, b) => {
        !(a.has_parameters() && b.has_parameters())
          && a.is_parameter_affine()
          && b.is_parameter_affine()
      }
      Expr::MatMul(_, x) => !x.has_parameters(),
      _ => false,
    }
  }

  /// First violation of the parametrized product rule, if any.
  pub fn dpp_violation(&self) -> Option<String> {
    match self {
      Expr::MatMul(p, x) => {
        if x.has_parameters() {
          return Some(format!(
            "{} multiplies an expression that depends on parameters",
            p.name()
          ));
        }
        x.dpp_violation()
      }
      Expr::Multiply(a, b) => {
        if a.has_variables() && b.has_variables() {
          return Some("product of two expressions in variables".to_string());
        }
        if a.has_parameters() && b.has_parameters() {
          return Some("product of two expressions in parameters".to_string());
        }
        let factor = if a.has_variables() { b } else { a };
        if !factor.is_parameter_affine() {
          return Some("product with a factor that is not parameter-affine".to_string());
        }
        a.dpp_violation().or_else(|| b.dpp_violation())
      }
      Expr::Variable(_) | Expr::Constant(_) | Expr::Parameter(_) => None,
      Expr::Add(a, b) => a.dpp_violation().or_else(|| b.dpp_violation()),
      Expr::Neg(x)
      | Expr::Scale(_, x)
      | Expr::Sum(x)
      | Expr::Abs(x)
      | Expr::Pos(x)
      | Expr::NegPart(x)
      | Expr::Power(x, _)
      | Expr::Norm2(x)
      | Expr::SumSmallest(x, _) => x.dpp_violation(),
      Expr::Stack(items) => items.iter().find_map(Expr::dpp_violation),
    }
  }
}
