//! Core abstractions shared by the evaluator, the communicators and the driver.

pub mod traits;
pub mod wrappers;

pub use traits::{BlockVector, DofModel, Scalar};
