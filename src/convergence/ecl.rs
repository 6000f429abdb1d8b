//! Pore-volume weighted convergence policy.
//!
//! Combines a CNV criterion (every DOF's residual, normalized by its pore volume and scaled by the
//! time step, below a strict tolerance) with a mass-balance criterion (per-equation residual sums,
//! normalized by the total pore volume, below a tolerance that grows with the cube root of that
//! volume). When only a small pore-volume fraction of the domain violates the CNV bound, or the
//! Newton method has already iterated for a while, the CNV bound is relaxed and the mass balance
//! alone decides.

use crate::config::NewtonOptions;
use crate::context::IterationContext;
use crate::convergence::{
    aggregate, evaluate_local, ConvergencePolicy, ErrorState, RelaxationPolicy, SafetyGuard,
    SumToleranceAdapter, Verdict,
};
use crate::core::traits::{BlockVector, DofModel, Scalar};
use crate::error::{ContractViolation, NewtonError};
use crate::parallel::Comm;
use log::debug;

pub struct EclConvergence<T, C> {
    comm: C,
    num_eq: usize,
    state: ErrorState<T>,
    sum_tolerance: SumToleranceAdapter<T>,
    relaxation: RelaxationPolicy<T>,
}

impl<T: Scalar, C: Comm> EclConvergence<T, C> {
    /// Builds the policy for `num_eq` equations per DOF after validating `options`.
    pub fn new(comm: C, options: &NewtonOptions<T>, num_eq: usize) -> Result<Self, NewtonError> {
        options.validate()?;
        Ok(Self {
            comm,
            num_eq,
            state: ErrorState::new(num_eq, options.relaxed_tolerance),
            sum_tolerance: SumToleranceAdapter::new(options.sum_tolerance),
            relaxation: RelaxationPolicy {
                fraction: options.relaxed_fraction,
                iterations: options.relaxed_iterations,
                relaxed_tolerance: options.relaxed_tolerance,
            },
        })
    }

    pub fn comm(&self) -> &C { &self.comm }

    pub fn num_eq(&self) -> usize { self.num_eq }

    pub fn relaxation(&self) -> &RelaxationPolicy<T> { &self.relaxation }
}

impl<T: Scalar, C: Comm> ConvergencePolicy<T> for EclConvergence<T, C> {
    fn evaluate<R, M>(
        &mut self,
        residual: &R,
        model: &M,
        ctx: &IterationContext<T>,
    ) -> Result<&ErrorState<T>, NewtonError>
    where
        R: BlockVector<T> + Sync + ?Sized,
        M: DofModel<T> + Sync,
    {
        // local failures still go through the collective so no rank is left waiting
        let local = if model.num_eq() != self.num_eq {
            Err(ContractViolation::PolicyEquationCount { policy: self.num_eq, model: model.num_eq() }.into())
        } else {
            evaluate_local(residual, model, ctx)
        };
        let global = aggregate(&self.comm, local, self.num_eq, ctx.time_step_size())?;
        let sum_tolerance = self.sum_tolerance.adapt(global.sum_pv);
        self.state.record(global, sum_tolerance);
        debug!(
            "Newton iteration {}: error {:?}, error sum {:?} (tolerance {:?}), violating pv fraction {:?}",
            ctx.iteration(),
            self.state.max_error(),
            self.state.error_sum(),
            self.state.sum_tolerance(),
            self.state.error_pv_fraction()
        );
        SafetyGuard::new(ctx.max_error()).check(self.state.max_error(), self.state.error_sum())?;
        Ok(&self.state)
    }

    fn state(&self) -> &ErrorState<T> { &self.state }

    fn verdict(&self, state: &ErrorState<T>, ctx: &IterationContext<T>) -> Verdict {
        self.relaxation.decide(state, ctx.iteration(), ctx.tolerance())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dof::DofTable;
    use crate::parallel::SerialComm;
    use approx::assert_relative_eq;

    #[test]
    fn adapts_sum_tolerance_to_pore_volume() {
        let opts = NewtonOptions::<f64>::default();
        let mut policy = EclConvergence::new(SerialComm, &opts, 1).unwrap();
        // 100 dofs of 10 m³ at porosity 0.8: 800 m³ of pore volume
        let model = DofTable::uniform(100, 1, 10.0, 0.8);
        let residual: Vec<[f64; 1]> = vec![[0.0]; 100];
        let state = policy.evaluate(&residual, &model, &opts.context(0, 1.0)).unwrap();
        assert_relative_eq!(state.sum_pv(), 800.0, max_relative = 1e-12);
        assert_relative_eq!(state.sum_tolerance(), 1e-4 * 800.0_f64.cbrt(), max_relative = 1e-12);
    }

    #[test]
    fn invalid_options_are_rejected() {
        let opts = NewtonOptions::<f64>::default().with_max_error(-1.0);
        assert!(EclConvergence::new(SerialComm, &opts, 2).is_err());
    }

    #[test]
    fn state_is_kept_when_the_guard_fires() {
        let opts = NewtonOptions::<f64>::default().with_max_error(1.0);
        let mut policy = EclConvergence::new(SerialComm, &opts, 1).unwrap();
        let model = DofTable::uniform(2, 1, 1.0, 1.0);
        let residual: Vec<[f64; 1]> = vec![[5.0], [0.0]];
        let err = policy.evaluate(&residual, &model, &opts.context(0, 1.0)).unwrap_err();
        assert!(err.is_divergence());
        assert_eq!(policy.state().max_error(), 5.0);
        assert!(!policy.is_converged(&opts.context(0, 1.0)));
    }

    #[test]
    fn model_with_other_equation_count_is_rejected() {
        let opts = NewtonOptions::<f64>::default();
        let mut policy = EclConvergence::new(SerialComm, &opts, 2).unwrap();
        let model = DofTable::uniform(3, 1, 1.0, 0.5);
        let residual: Vec<[f64; 1]> = vec![[0.0]; 3];
        let err = policy.evaluate(&residual, &model, &opts.context(0, 1.0)).unwrap_err();
        assert!(matches!(
            err,
            NewtonError::ContractViolation(ContractViolation::PolicyEquationCount { policy: 2, model: 1 })
        ));
        assert_eq!(policy.state().component_sum_error().len(), 2);
    }
}
