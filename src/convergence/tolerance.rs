//! Domain-size dependent sum tolerance.

use crate::core::traits::Scalar;

/// Scales the sum tolerance with the cube root of the total pore volume.
///
/// The configured parameter is the mass lost per time step tolerated by a domain with unit pore
/// volume; a domain with 1000 times the pore volume tolerates ten times as much.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SumToleranceAdapter<T> {
    base: T,
}

impl<T: Scalar> SumToleranceAdapter<T> {
    pub fn new(base: T) -> Self { Self { base } }

    pub fn base(&self) -> T { self.base }

    pub fn adapt(&self, sum_pv: T) -> T {
        self.base * sum_pv.cbrt()
    }
}
