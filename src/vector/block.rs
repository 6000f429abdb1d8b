//! Flat blocked residual with a run-time equation count.

use crate::core::traits::BlockVector;
use crate::error::ContractViolation;
use num_traits::Float;

/// Residual stored DOF-major: entry `(dof, eq)` lives at `dof * num_eq + eq`.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockResidual<T> {
    num_eq: usize,
    data: Vec<T>,
}

impl<T: Float> BlockResidual<T> {
    /// All-zero residual for `num_dof` DOFs.
    pub fn zeros(num_dof: usize, num_eq: usize) -> Self {
        Self { num_eq, data: vec![T::zero(); num_dof * num_eq] }
    }

    /// Wraps a flat DOF-major buffer.
    pub fn from_flat(num_eq: usize, data: Vec<T>) -> Result<Self, ContractViolation> {
        if num_eq == 0 || data.len() % num_eq != 0 {
            return Err(ContractViolation::BlockSize { len: data.len(), block_size: num_eq });
        }
        Ok(Self { num_eq, data })
    }

    pub fn num_eq(&self) -> usize { self.num_eq }

    pub fn num_dof(&self) -> usize {
        if self.num_eq == 0 { 0 } else { self.data.len() / self.num_eq }
    }

    pub fn block(&self, dof: usize) -> &[T] {
        &self.data[dof * self.num_eq..(dof + 1) * self.num_eq]
    }

    pub fn block_mut(&mut self, dof: usize) -> &mut [T] {
        &mut self.data[dof * self.num_eq..(dof + 1) * self.num_eq]
    }

    pub fn set(&mut self, dof: usize, eq: usize, value: T) {
        self.data[dof * self.num_eq + eq] = value;
    }

    pub fn as_slice(&self) -> &[T] { &self.data }
}

impl<T: Float> BlockVector<T> for BlockResidual<T> {
    fn num_blocks(&self) -> usize { self.num_dof() }
    fn block_size(&self) -> usize { self.num_eq }
    fn entry(&self, block: usize, eq: usize) -> T {
        self.data[block * self.num_eq + eq]
    }
}
