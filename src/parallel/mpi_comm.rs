//! MPI-based parallel communication module.
//!
//! This module provides an implementation of the `Comm` trait using the MPI (Message Passing Interface)
//! backend for distributed-memory parallelism. Each rank owns one subdomain of the mesh; the
//! convergence reductions (global max of the CNV error, global sums of the per-equation residual
//! sums and pore volumes) map onto `MPI_Allreduce`. The implementation is only available when the
//! `mpi` feature is enabled.
//!
//! # Usage
//!
//! - `MpiComm::new` initializes MPI and keeps the universe alive for the lifetime of the value.
//! - The `Comm` trait is implemented for `MpiComm`, allowing it to be used as a drop-in replacement
//!   for the serial or threaded backends.
//!
//! # References
//! - [MPI Standard](https://www.mpi-forum.org/)
//!
//! # Example
//! ```no_run
//! # #[cfg(feature = "mpi")]
//! # {
//! use pvconv::parallel::{Comm, MpiComm};
//! let comm = MpiComm::new().expect("MPI init");
//! println!("Rank: {} / {}", comm.rank(), comm.size());
//! comm.barrier();
//! # }
//! ```

use mpi::collective::SystemOperation;
use mpi::environment::Universe;
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;

use crate::core::traits::Scalar;
use crate::error::NewtonError;

/// MPI communicator wrapper for distributed parallelism.
///
/// Holds the MPI universe (finalized on drop), the world communicator, the rank of the current
/// process, and the total number of processes.
pub struct MpiComm {
    /// The MPI world communicator (all processes in the job).
    pub world: SimpleCommunicator,
    /// The rank (ID) of this process within the communicator.
    pub rank: usize,
    /// The total number of processes in the communicator.
    pub size: usize,
    _universe: Universe,
}

impl MpiComm {
    /// Initializes MPI and constructs a new `MpiComm` instance.
    ///
    /// Fails if MPI was already initialized in this process.
    pub fn new() -> Result<Self, NewtonError> {
        let universe = mpi::initialize()
            .ok_or_else(|| NewtonError::Mpi("MPI already initialized".to_string()))?;
        let world = universe.world();
        let rank = world.rank() as usize;
        let size = world.size() as usize;
        Ok(MpiComm { world, rank, size, _universe: universe })
    }
}

impl super::Comm for MpiComm {
    /// Returns the rank (ID) of this process.
    fn rank(&self) -> usize { self.rank }
    /// Returns the total number of processes in the communicator.
    fn size(&self) -> usize { self.size }
    /// Synchronizes all processes at a barrier.
    fn barrier(&self) { self.world.barrier(); }

    /// Performs an all-reduce max operation across all processes.
    fn all_reduce_max<T: Scalar>(&self, x: T) -> T {
        let mut y = x;
        self.world.all_reduce_into(&x, &mut y, SystemOperation::max());
        y
    }

    /// Performs an all-reduce sum operation across all processes.
    fn all_reduce_sum<T: Scalar>(&self, x: T) -> T {
        let mut y = x;
        self.world.all_reduce_into(&x, &mut y, SystemOperation::sum());
        y
    }

    /// Element-wise all-reduce sum of a fixed-length buffer.
    ///
    /// - `local`: this rank's contribution.
    /// - `out`: receives the global sums; must have the same length as `local`.
    fn all_reduce_sum_slice<T: Scalar>(&self, local: &[T], out: &mut [T]) {
        assert_eq!(local.len(), out.len());
        self.world.all_reduce_into(local, out, SystemOperation::sum());
    }
}
