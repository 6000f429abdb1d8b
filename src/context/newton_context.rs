//! Newton iteration driver.
//!
//! This module provides the `NewtonContext` struct, which runs the outer Newton loop of one time
//! step and delegates the convergence decision to a pluggable [`ConvergencePolicy`]. The physics
//! (residual assembly, linear solve, solution update) is supplied by a [`NonlinearProblem`].
//!
//! # Usage
//!
//! 1. Construct a `NewtonContext` with a policy (e.g. [`EclConvergence`](crate::EclConvergence)) and options.
//! 2. Call `solve` once per time step.
//! 3. On `Err(e)` with `e.is_divergence()`, discard the attempt and retry with a smaller time step.

use crate::config::NewtonOptions;
use crate::convergence::ConvergencePolicy;
use crate::core::traits::{BlockVector, DofModel, Scalar};
use crate::error::NewtonError;
use crate::utils::convergence::NewtonStats;
use log::{info, warn};

/// A discretized nonlinear system the Newton method can iterate on.
pub trait NonlinearProblem<T> {
    type Residual: BlockVector<T> + Sync;
    type Model: DofModel<T> + Sync;

    /// Per-DOF metadata of the discretization.
    fn model(&self) -> &Self::Model;
    /// Linearizes at the current solution and returns its residual.
    fn residual(&mut self) -> Result<Self::Residual, NewtonError>;
    /// Solves the linear system for `residual` and applies the Newton update.
    fn update(&mut self, residual: &Self::Residual) -> Result<(), NewtonError>;
}

/// Newton driver holding a convergence policy and its options.
pub struct NewtonContext<P, T> {
    /// Convergence criterion
    pub policy: P,
    /// Tolerances and iteration budget
    pub options: NewtonOptions<T>,
}

impl<P, T> NewtonContext<P, T>
where
    P: ConvergencePolicy<T>,
    T: Scalar,
{
    pub fn new(policy: P, options: NewtonOptions<T>) -> Self {
        Self { policy, options }
    }

    /// Iterates `problem` until the policy reports convergence.
    ///
    /// # Returns
    /// * `Ok(NewtonStats)` once converged
    /// * `Err(NewtonError::IterationLimit)` after `max_iterations` updates without convergence
    /// * any error of the policy or the problem, unchanged
    pub fn solve<Pb>(&mut self, problem: &mut Pb, time_step_size: T) -> Result<NewtonStats<T>, NewtonError>
    where
        Pb: NonlinearProblem<T>,
    {
        let max_iterations = self.options.max_iterations;
        for iteration in 0..=max_iterations {
            let residual = problem.residual()?;
            let ctx = self.options.context(iteration, time_step_size);
            self.policy.evaluate(&residual, problem.model(), &ctx)?;
            let state = self.policy.state();
            let verdict = self.policy.verdict(state, &ctx);
            if verdict.is_converged() {
                info!("Newton converged after {iteration} iterations ({verdict:?})");
                return Ok(NewtonStats {
                    iterations: iteration,
                    max_error: state.max_error(),
                    error_sum: state.error_sum(),
                    verdict,
                });
            }
            if iteration < max_iterations {
                problem.update(&residual)?;
            }
        }
        warn!("Newton did not converge within {max_iterations} iterations");
        Err(NewtonError::IterationLimit(max_iterations))
    }
}
