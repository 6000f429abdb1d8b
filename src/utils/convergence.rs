//! Statistics reported by the Newton driver.

use crate::convergence::Verdict;

#[derive(Clone, Debug)]
pub struct NewtonStats<T> {
    /// Newton updates applied before convergence.
    pub iterations: usize,
    pub max_error: T,
    pub error_sum: T,
    pub verdict: Verdict,
}

impl<T> NewtonStats<T> {
    pub fn converged(&self) -> bool {
        self.verdict.is_converged()
    }
}
