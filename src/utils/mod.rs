//! Numeric utilities.

pub mod linalg;
pub mod stats;

pub use linalg::solve_symmetric;
pub use stats::{linear_fit, mean, population_std, slope};
