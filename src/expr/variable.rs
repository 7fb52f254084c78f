use super::next_id;

/// Decision vector of fixed length.
#[derive(Clone, Debug)]
pub struct Variable {
  id: usize,
  name: String,
  len: usize,
  nonneg: bool,
}

impl Variable {
  pub fn new(len: usize, name: impl Into<String>) -> Self {
    Self {
      id: next_id(),
      name: name.into(),
      len,
      nonneg: false,
    }
  }

  /// Variable restricted to the nonnegative orthant.
  pub fn nonneg(len: usize, name: impl Into<String>) -> Self {
    Self {
      nonneg: true,
      ..Self::new(len, name)
    }
  }

  pub fn id(&self) -> usize {
    self.id
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  pub fn is_nonneg(&self) -> bool {
    self.nonneg
  }
}

impl PartialEq for Variable {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id
  }
}

impl Eq for Variable {}
