//! pvconv: pore-volume weighted Newton convergence control
//!
//! This crate decides when a Newton iteration on a discretized system of conservation laws has
//! converged. Residuals are weighted by the pore volume of each degree of freedom, reduced over
//! all subdomains of a domain decomposition, and judged by a strict or an adaptively relaxed
//! criterion, with a hard ceiling that aborts runaway iterations.

pub mod parallel;

pub mod config;
pub mod context;
pub mod convergence;
pub mod core;
pub mod dof;
pub mod error;
pub mod utils;
pub mod vector;

// Re-exports for convenience
pub use config::*;
pub use context::*;
pub use convergence::*;
pub use crate::core::*;
pub use dof::*;
pub use error::*;
pub use parallel::{Comm, SerialComm, ThreadComm, UniverseComm};
pub use vector::*;

// Re-export NewtonStats at the crate root for convenience
pub use utils::convergence::NewtonStats;
