//! Run-time parameters of the Newton convergence criterion.
//!
//! This module provides the `NewtonOptions` struct, which collects the tolerances used by the
//! convergence policy and the iteration budget used by the Newton driver. The strict tolerance
//! bounds the pore-volume normalized (CNV) error of every DOF; the sum tolerance is the mass
//! lost per time step tolerated by a domain with 1 m³ of pore volume and is scaled with the cube
//! root of the actual pore volume; the maximum error is an absolute ceiling past which the
//! attempt is abandoned.

use crate::context::IterationContext;
use crate::core::traits::Scalar;
use crate::error::NewtonError;

/// Newton tolerances & relaxation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct NewtonOptions<T> {
    /// Strict bound on the pore-volume normalized error of each DOF.
    pub tolerance: T,

    /// Sum tolerance for a domain with unit pore volume.
    pub sum_tolerance: T,

    /// Absolute ceiling on both metrics; crossing it is fatal.
    pub max_error: T,

    /// Bound on the CNV error once the relaxed regime applies.
    pub relaxed_tolerance: T,

    /// Violating pore-volume fraction below which the relaxed regime applies.
    pub relaxed_fraction: T,

    /// Iteration count past which the relaxed regime applies.
    pub relaxed_iterations: usize,

    /// Newton updates the driver performs before giving up.
    pub max_iterations: usize,
}

impl Default for NewtonOptions<f64> {
    fn default() -> Self {
        NewtonOptions {
            tolerance: 1e-2,
            sum_tolerance: 1e-4,
            max_error: 1e10,
            relaxed_tolerance: 1e9,
            relaxed_fraction: 0.03,
            relaxed_iterations: 8,
            max_iterations: 20,
        }
    }
}

impl Default for NewtonOptions<f32> {
    fn default() -> Self {
        NewtonOptions {
            tolerance: 1e-2,
            sum_tolerance: 1e-4,
            max_error: 1e10,
            relaxed_tolerance: 1e9,
            relaxed_fraction: 0.03,
            relaxed_iterations: 8,
            max_iterations: 20,
        }
    }
}

impl<T: Scalar> NewtonOptions<T> {
    pub fn with_tolerance(mut self, tolerance: T) -> Self { self.tolerance = tolerance; self }
    pub fn with_sum_tolerance(mut self, sum_tolerance: T) -> Self { self.sum_tolerance = sum_tolerance; self }
    pub fn with_max_error(mut self, max_error: T) -> Self { self.max_error = max_error; self }
    pub fn with_relaxed_tolerance(mut self, relaxed_tolerance: T) -> Self { self.relaxed_tolerance = relaxed_tolerance; self }
    pub fn with_relaxed_fraction(mut self, relaxed_fraction: T) -> Self { self.relaxed_fraction = relaxed_fraction; self }
    pub fn with_relaxed_iterations(mut self, relaxed_iterations: usize) -> Self { self.relaxed_iterations = relaxed_iterations; self }
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self { self.max_iterations = max_iterations; self }

    /// Checks that every tolerance is positive and the relaxation fraction lies in [0, 1].
    pub fn validate(&self) -> Result<(), NewtonError> {
        positive("tolerance", self.tolerance)?;
        positive("sum_tolerance", self.sum_tolerance)?;
        positive("max_error", self.max_error)?;
        positive("relaxed_tolerance", self.relaxed_tolerance)?;
        if !(self.relaxed_fraction >= T::zero() && self.relaxed_fraction <= T::one()) {
            return Err(NewtonError::InvalidOption {
                name: "relaxed_fraction",
                reason: format!("{:?} is outside [0, 1]", self.relaxed_fraction),
            });
        }
        Ok(())
    }

    /// Iteration context for the given iteration count and time-step size.
    pub fn context(&self, iteration: usize, time_step_size: T) -> IterationContext<T> {
        IterationContext::new(iteration, time_step_size, self.tolerance, self.max_error)
    }
}

fn positive<T: Scalar>(name: &'static str, value: T) -> Result<(), NewtonError> {
    if value > T::zero() && !value.is_nan() {
        Ok(())
    } else {
        Err(NewtonError::InvalidOption { name, reason: format!("{value:?} must be positive") })
    }
}
