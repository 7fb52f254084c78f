//! # Linear Algebra
//!
//! $$
//! \Sigma = U^\top U, \qquad \Sigma = V \Lambda V^\top
//! $$
//!
//! Helpers that turn market data into model inputs: Cholesky factors,
//! principal component factor models, random covariances and the valid
//! block of a matrix with missing entries.

pub mod cholesky;
pub mod pca;
pub mod random;
pub mod valid;

pub use cholesky::cholesky;
pub use pca::Pca;
pub use random::rand_cov;
pub use valid::valid;
