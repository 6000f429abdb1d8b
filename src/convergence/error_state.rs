//! Error metrics of the current Newton iteration.

use crate::convergence::aggregator::GlobalErrors;
use crate::core::traits::Scalar;

/// Aggregated error metrics, identical on every subdomain after an evaluation.
///
/// Only the convergence module writes to it; everyone else reads through the accessors. Until the
/// first evaluation both metrics are infinite and the violating fraction is one, so a fresh state
/// never reads as converged.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorState<T> {
    max_error: T,
    component_sum_error: Vec<T>,
    error_sum: T,
    error_pv_fraction: T,
    sum_pv: T,
    sum_tolerance: T,
    relaxed_tolerance: T,
    last_error: T,
}

impl<T: Scalar> ErrorState<T> {
    pub fn new(num_eq: usize, relaxed_tolerance: T) -> Self {
        Self {
            max_error: T::infinity(),
            component_sum_error: vec![T::zero(); num_eq],
            error_sum: T::infinity(),
            error_pv_fraction: T::one(),
            sum_pv: T::zero(),
            sum_tolerance: T::zero(),
            relaxed_tolerance,
            last_error: T::infinity(),
        }
    }

    /// Worst pore-volume normalized residual over all subdomains.
    pub fn max_error(&self) -> T { self.max_error }
    /// Per-equation mass-balance errors.
    pub fn component_sum_error(&self) -> &[T] { &self.component_sum_error }
    /// Largest per-equation mass-balance error.
    pub fn error_sum(&self) -> T { self.error_sum }
    pub fn error_pv_fraction(&self) -> T { self.error_pv_fraction }
    /// Total eligible pore volume over all subdomains.
    pub fn sum_pv(&self) -> T { self.sum_pv }
    pub fn sum_tolerance(&self) -> T { self.sum_tolerance }
    pub fn relaxed_tolerance(&self) -> T { self.relaxed_tolerance }
    /// `max_error` of the previous iteration.
    pub fn last_error(&self) -> T { self.last_error }

    pub(crate) fn record(&mut self, global: GlobalErrors<T>, sum_tolerance: T) {
        self.last_error = self.max_error;
        self.max_error = global.max_error;
        self.component_sum_error = global.component_sum_error;
        self.error_sum = global.error_sum;
        self.error_pv_fraction = global.error_pv_fraction;
        self.sum_pv = global.sum_pv;
        self.sum_tolerance = sum_tolerance;
    }

    #[cfg(test)]
    pub(crate) fn set_for_test(&mut self, max_error: T, error_sum: T, fraction: T, sum_tolerance: T) {
        self.max_error = max_error;
        self.error_sum = error_sum;
        self.error_pv_fraction = fraction;
        self.sum_tolerance = sum_tolerance;
    }
}
