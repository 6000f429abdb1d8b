//! Newton convergence policies.
//!
//! A policy turns the residual of one Newton iteration into an [`ErrorState`] and answers whether
//! the iteration has converged. [`EclConvergence`] is the pore-volume weighted policy used for
//! porous-media conservation laws; its pipeline per iteration is:
//!
//! 1. [`evaluator::evaluate_local`] scans the subdomain's DOFs,
//! 2. [`aggregator::aggregate`] reduces the partial sums over all subdomains,
//! 3. [`tolerance::SumToleranceAdapter`] rescales the sum tolerance to the domain size,
//! 4. [`guard::SafetyGuard`] aborts on runaway errors,
//! 5. [`decider::RelaxationPolicy`] produces the [`Verdict`].

use crate::context::IterationContext;
use crate::core::traits::{BlockVector, DofModel, Scalar};
use crate::error::NewtonError;

/// Interface between a Newton driver and its convergence criterion.
pub trait ConvergencePolicy<T: Scalar> {
    /// Computes the error metrics of the residual of the current iteration.
    ///
    /// Collective when the policy is distributed: every subdomain must call it once per
    /// iteration. A runaway error is returned as [`NewtonError::NumericalDivergence`].
    fn evaluate<R, M>(
        &mut self,
        residual: &R,
        model: &M,
        ctx: &IterationContext<T>,
    ) -> Result<&ErrorState<T>, NewtonError>
    where
        R: BlockVector<T> + Sync + ?Sized,
        M: DofModel<T> + Sync;

    /// Metrics of the last evaluation.
    fn state(&self) -> &ErrorState<T>;

    fn verdict(&self, state: &ErrorState<T>, ctx: &IterationContext<T>) -> Verdict;

    fn is_converged(&self, ctx: &IterationContext<T>) -> bool {
        self.verdict(self.state(), ctx).is_converged()
    }
}

/// Maximum that propagates NaN from either side.
pub(crate) fn nan_max<T: Scalar>(a: T, b: T) -> T {
    if a.is_nan() || a > b { a } else { b }
}

pub mod aggregator;
pub mod decider;
pub mod ecl;
pub mod error_state;
pub mod evaluator;
pub mod guard;
pub mod tolerance;

pub use aggregator::{aggregate, GlobalErrors};
pub use decider::{RelaxationPolicy, Verdict};
pub use ecl::EclConvergence;
pub use error_state::ErrorState;
pub use evaluator::{evaluate_local, LocalPartials};
pub use guard::SafetyGuard;
pub use tolerance::SumToleranceAdapter;
