//! Per-iteration inputs handed to the convergence policy by the outer solve.

/// What the outer solve knows about the current Newton iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationContext<T> {
    iteration: usize,
    time_step_size: T,
    tolerance: T,
    max_error: T,
}

impl<T: Copy> IterationContext<T> {
    pub fn new(iteration: usize, time_step_size: T, tolerance: T, max_error: T) -> Self {
        Self { iteration, time_step_size, tolerance, max_error }
    }

    /// Number of Newton updates applied so far in this attempt.
    pub fn iteration(&self) -> usize { self.iteration }
    pub fn time_step_size(&self) -> T { self.time_step_size }
    /// Strict bound on the pore-volume normalized error.
    pub fn tolerance(&self) -> T { self.tolerance }
    /// Absolute ceiling on either metric.
    pub fn max_error(&self) -> T { self.max_error }

    pub fn set_iteration(&mut self, iteration: usize) { self.iteration = iteration; }
    pub fn set_time_step_size(&mut self, dt: T) { self.time_step_size = dt; }
}
