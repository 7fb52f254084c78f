pub mod fill;

pub use fill::fill_matrix;
pub use fill::fill_vector;
