//! Configuration of the convergence criterion and the Newton driver.

pub mod options;
pub use options::NewtonOptions;
