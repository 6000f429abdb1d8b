//! Absolute ceiling on the aggregated error metrics.

use crate::core::traits::Scalar;
use crate::error::{ErrorMetric, NewtonError};
use log::warn;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafetyGuard<T> {
    max_allowed: T,
}

impl<T: Scalar> SafetyGuard<T> {
    pub fn new(max_allowed: T) -> Self { Self { max_allowed } }

    pub fn max_allowed(&self) -> T { self.max_allowed }

    /// Fails when either metric exceeds the ceiling or is not finite. The CNV error is checked first.
    pub fn check(&self, max_error: T, error_sum: T) -> Result<(), NewtonError> {
        self.check_metric(ErrorMetric::MaxError, max_error)?;
        self.check_metric(ErrorMetric::ErrorSum, error_sum)
    }

    fn check_metric(&self, metric: ErrorMetric, value: T) -> Result<(), NewtonError> {
        if value.is_finite() && value <= self.max_allowed {
            return Ok(());
        }
        let value = value.to_f64().unwrap_or(f64::NAN);
        let ceiling = self.max_allowed.to_f64().unwrap_or(f64::NAN);
        warn!("Newton: {metric} {value:e} exceeds maximum allowed error {ceiling:e}");
        Err(NewtonError::NumericalDivergence { metric, value, ceiling })
    }
}
