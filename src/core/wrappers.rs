//! `BlockVector` implementations for common residual containers.
//!
//! This module lets residuals produced by an assembler be handed to the evaluator without copying:
//! - `Vec<[T; N]>` and `[[T; N]]` fix the equation count at compile time.
//! - `faer::Mat` / `faer::MatRef` hold one DOF per row and one equation per column.
//!
//! The flat, runtime-sized container lives in [`crate::vector::BlockResidual`].
//!
//! # References
//! - [faer crate documentation](https://docs.rs/faer)

use crate::core::traits::BlockVector;
use faer::{Mat, MatRef};
use num_traits::Float;

impl<T: Copy, const N: usize> BlockVector<T> for [[T; N]] {
    fn num_blocks(&self) -> usize {
        self.len()
    }
    fn block_size(&self) -> usize {
        N
    }
    fn entry(&self, block: usize, eq: usize) -> T {
        self[block][eq]
    }
}

impl<T: Copy, const N: usize> BlockVector<T> for Vec<[T; N]> {
    fn num_blocks(&self) -> usize {
        self.len()
    }
    fn block_size(&self) -> usize {
        N
    }
    fn entry(&self, block: usize, eq: usize) -> T {
        self[block][eq]
    }
}

/// Row `i` is DOF `i`, column `j` is equation `j`.
impl<T: Float> BlockVector<T> for Mat<T> {
    fn num_blocks(&self) -> usize {
        self.nrows()
    }
    fn block_size(&self) -> usize {
        self.ncols()
    }
    fn entry(&self, block: usize, eq: usize) -> T {
        self[(block, eq)]
    }
}

impl<'a, T: Float> BlockVector<T> for MatRef<'a, T> {
    fn num_blocks(&self) -> usize {
        self.nrows()
    }
    fn block_size(&self) -> usize {
        self.ncols()
    }
    fn entry(&self, block: usize, eq: usize) -> T {
        self[(block, eq)]
    }
}
