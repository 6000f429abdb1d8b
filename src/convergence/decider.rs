//! Strict/relaxed convergence decision.

use crate::convergence::ErrorState;
use crate::core::traits::Scalar;

/// Outcome of one convergence query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Another Newton iteration is needed.
    NotYetConverged,
    /// Every eligible DOF meets the strict tolerance and the sum criterion holds.
    ConvergedStrict,
    /// Accepted on the sum criterion while some DOFs still violate the strict tolerance.
    ConvergedRelaxed,
}

impl Verdict {
    pub fn is_converged(self) -> bool {
        !matches!(self, Verdict::NotYetConverged)
    }
}

/// When the relaxed regime kicks in and how loose it is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelaxationPolicy<T> {
    /// Relaxed regime below this violating pore-volume fraction.
    pub fraction: T,
    /// Relaxed regime once the iteration count exceeds this.
    pub iterations: usize,
    /// Bound on the CNV error in the relaxed regime.
    pub relaxed_tolerance: T,
}

impl<T: Scalar> RelaxationPolicy<T> {
    pub fn is_relaxed(&self, error_pv_fraction: T, iteration: usize) -> bool {
        error_pv_fraction < self.fraction || iteration > self.iterations
    }

    pub fn decide(&self, state: &ErrorState<T>, iteration: usize, tolerance: T) -> Verdict {
        let strict = state.max_error() <= tolerance && state.error_sum() <= state.sum_tolerance();
        if self.is_relaxed(state.error_pv_fraction(), iteration) {
            let relaxed = state.max_error() < self.relaxed_tolerance
                && state.error_sum() < state.sum_tolerance();
            match (relaxed, strict) {
                (false, _) => Verdict::NotYetConverged,
                (true, true) => Verdict::ConvergedStrict,
                (true, false) => Verdict::ConvergedRelaxed,
            }
        } else if strict {
            Verdict::ConvergedStrict
        } else {
            Verdict::NotYetConverged
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RelaxationPolicy<f64> {
        RelaxationPolicy { fraction: 0.03, iterations: 8, relaxed_tolerance: 1e9 }
    }

    fn state(max_error: f64, error_sum: f64, fraction: f64) -> ErrorState<f64> {
        let mut s = ErrorState::new(1, 1e9);
        s.set_for_test(max_error, error_sum, fraction, 1e-3);
        s
    }

    #[test]
    fn fresh_state_never_converges() {
        let s = ErrorState::<f64>::new(2, 1e9);
        assert_eq!(policy().decide(&s, 0, 1e-2), Verdict::NotYetConverged);
        assert_eq!(policy().decide(&s, 20, 1e-2), Verdict::NotYetConverged);
    }

    #[test]
    fn strict_regime_uses_inclusive_bounds() {
        let s = state(1e-2, 1e-3, 0.5);
        assert_eq!(policy().decide(&s, 1, 1e-2), Verdict::ConvergedStrict);
    }

    #[test]
    fn relaxed_regime_uses_exclusive_sum_bound() {
        let s = state(5.0, 1e-3, 0.01);
        assert_eq!(policy().decide(&s, 1, 1e-2), Verdict::NotYetConverged);
        let s = state(5.0, 5e-4, 0.01);
        assert_eq!(policy().decide(&s, 1, 1e-2), Verdict::ConvergedRelaxed);
    }

    #[test]
    fn relaxed_regime_still_reports_strict_when_met() {
        let s = state(1e-3, 5e-4, 0.0);
        assert_eq!(policy().decide(&s, 0, 1e-2), Verdict::ConvergedStrict);
    }

    #[test]
    fn iteration_budget_switches_regime() {
        let s = state(5.0, 5e-4, 0.5);
        assert_eq!(policy().decide(&s, 8, 1e-2), Verdict::NotYetConverged);
        assert_eq!(policy().decide(&s, 9, 1e-2), Verdict::ConvergedRelaxed);
    }
}
