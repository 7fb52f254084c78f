//! # Risk
//!
//! $$
//! \sigma(w) = \lVert U w \rVert_2, \qquad U^\top U = \Sigma
//! $$
//!
//! Risk models: sample covariance, factor covariance and conditional value
//! at risk. The two covariance models carry a robust penalty through an
//! epigraph variable bounding absolute positions.

pub mod cvar;
pub mod factor;
pub mod sample;

pub use cvar::CVar;
pub use factor::FactorModel;
pub use sample::SampleCovariance;
