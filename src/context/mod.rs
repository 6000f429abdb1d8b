//! Context module for pvconv.
//!
//! This module provides the per-iteration context handed to convergence policies and the Newton
//! driver that owns a policy for the duration of a solve.
//!
//! Modules:
//! - [`iteration`]: Contains `IterationContext`, the iteration count, time-step size and tolerances of one Newton iteration.
//! - [`newton_context`]: Contains `NewtonContext` and the `NonlinearProblem` trait.
//!
//! # Example
//! ```rust
//! use pvconv::{EclConvergence, NewtonContext, NewtonOptions, SerialComm};
//! let opts = NewtonOptions::<f64>::default();
//! let policy = EclConvergence::new(SerialComm, &opts, 3).unwrap();
//! let newton = NewtonContext::new(policy, opts);
//! assert_eq!(newton.options.max_iterations, 20);
//! ```

pub mod iteration;
pub use iteration::IterationContext;
pub mod newton_context;
pub use newton_context::{NewtonContext, NonlinearProblem};
