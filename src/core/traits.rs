//! Core traits for pvconv: scalars, blocked residuals, and per-DOF metadata.

use crate::parallel::Equivalence;
use num_traits::Float;
use std::fmt::Debug;

/// Floating-point type the convergence metrics are computed in.
///
/// Implemented for `f32` and `f64`. Under the `mpi` feature the bound includes
/// `mpi::datatype::Equivalence` so values can go straight into collectives.
pub trait Scalar: Float + Equivalence + Send + Sync + Debug + 'static {}

impl Scalar for f32 {}
impl Scalar for f64 {}

/// A residual laid out as one block of `block_size()` equations per DOF.
pub trait BlockVector<T> {
    /// Number of DOF blocks, including auxiliary DOFs past the grid.
    fn num_blocks(&self) -> usize;
    /// Equations per block.
    fn block_size(&self) -> usize;
    /// Residual of equation `eq` at DOF `block`.
    fn entry(&self, block: usize, eq: usize) -> T;
}

/// Per-DOF metadata supplied by the discretization.
///
/// DOF indices at or past `num_grid_dof()` are auxiliary.
pub trait DofModel<T> {
    /// Number of DOFs backed by grid entities.
    fn num_grid_dof(&self) -> usize;
    /// Number of balance equations per DOF.
    fn num_eq(&self) -> usize;
    /// Geometric volume of the DOF's control volume.
    fn dof_total_volume(&self, dof: usize) -> T;
    /// Porosity at the DOF, from the physical problem.
    fn porosity(&self, dof: usize) -> T;
    /// Scaling weight of equation `eq` at `dof`.
    fn eq_weight(&self, dof: usize, eq: usize) -> T;
    /// Whether this subdomain owns the DOF (overlap DOFs return false).
    fn is_local_dof(&self, dof: usize) -> bool;
    /// Whether the DOF is eliminated by a constraint.
    fn is_constrained(&self, dof: usize) -> bool;

    /// Pore volume: porosity times geometric volume.
    fn pore_volume(&self, dof: usize) -> T
    where
        T: Float,
    {
        self.porosity(dof) * self.dof_total_volume(dof)
    }
}
