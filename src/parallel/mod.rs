//! Collective reductions across subdomains.
//!
//! The convergence metrics of one Newton iteration are only meaningful once every subdomain has
//! contributed, so the evaluator reaches the outside world through the [`Comm`] trait. Backends:
//! - [`SerialComm`]: a single process, every reduction is the identity.
//! - [`ThreadComm`]: subdomains simulated by threads sharing a rendezvous.
//! - `MpiComm` (feature `mpi`): distributed memory via rsmpi.

use crate::core::traits::Scalar;

#[cfg(feature = "mpi")]
pub use mpi::datatype::Equivalence;

/// Stand-in for `mpi::datatype::Equivalence` when MPI is disabled.
#[cfg(not(feature = "mpi"))]
pub trait Equivalence {}
#[cfg(not(feature = "mpi"))]
impl Equivalence for f32 {}
#[cfg(not(feature = "mpi"))]
impl Equivalence for f64 {}

pub trait Comm {
    fn rank(&self) -> usize;
    fn size(&self) -> usize;
    fn barrier(&self);
    /// Global maximum of `x` over all ranks.
    fn all_reduce_max<T: Scalar>(&self, x: T) -> T;
    /// Global sum of `x` over all ranks.
    fn all_reduce_sum<T: Scalar>(&self, x: T) -> T;
    /// Element-wise global sum of `local` into `out`. Both slices have the same length on every rank.
    fn all_reduce_sum_slice<T: Scalar>(&self, local: &[T], out: &mut [T]);
}

/// Single-process communicator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialComm;

impl Comm for SerialComm {
    fn rank(&self) -> usize { 0 }
    fn size(&self) -> usize { 1 }
    fn barrier(&self) {}
    fn all_reduce_max<T: Scalar>(&self, x: T) -> T { x }
    fn all_reduce_sum<T: Scalar>(&self, x: T) -> T { x }
    fn all_reduce_sum_slice<T: Scalar>(&self, local: &[T], out: &mut [T]) {
        assert_eq!(local.len(), out.len());
        out.copy_from_slice(local);
    }
}

#[cfg(feature="mpi")]
pub mod mpi_comm;
#[cfg(feature="mpi")]
pub use mpi_comm::MpiComm;

pub mod thread_comm;
pub use thread_comm::ThreadComm;

pub enum UniverseComm {
    #[cfg(feature="mpi")]
    Mpi(MpiComm),
    Threaded(ThreadComm),
    Serial(SerialComm),
}

impl Comm for UniverseComm {
    fn rank(&self) -> usize {
        match self {
            #[cfg(feature="mpi")]
            UniverseComm::Mpi(comm) => comm.rank(),
            UniverseComm::Threaded(comm) => comm.rank(),
            UniverseComm::Serial(comm) => comm.rank(),
        }
    }
    fn size(&self) -> usize {
        match self {
            #[cfg(feature="mpi")]
            UniverseComm::Mpi(comm) => comm.size(),
            UniverseComm::Threaded(comm) => comm.size(),
            UniverseComm::Serial(comm) => comm.size(),
        }
    }
    fn barrier(&self) {
        match self {
            #[cfg(feature="mpi")]
            UniverseComm::Mpi(comm) => comm.barrier(),
            UniverseComm::Threaded(comm) => comm.barrier(),
            UniverseComm::Serial(comm) => comm.barrier(),
        }
    }
    fn all_reduce_max<T: Scalar>(&self, x: T) -> T {
        match self {
            #[cfg(feature="mpi")]
            UniverseComm::Mpi(comm) => comm.all_reduce_max(x),
            UniverseComm::Threaded(comm) => comm.all_reduce_max(x),
            UniverseComm::Serial(comm) => comm.all_reduce_max(x),
        }
    }
    fn all_reduce_sum<T: Scalar>(&self, x: T) -> T {
        match self {
            #[cfg(feature="mpi")]
            UniverseComm::Mpi(comm) => comm.all_reduce_sum(x),
            UniverseComm::Threaded(comm) => comm.all_reduce_sum(x),
            UniverseComm::Serial(comm) => comm.all_reduce_sum(x),
        }
    }
    fn all_reduce_sum_slice<T: Scalar>(&self, local: &[T], out: &mut [T]) {
        match self {
            #[cfg(feature="mpi")]
            UniverseComm::Mpi(comm) => comm.all_reduce_sum_slice(local, out),
            UniverseComm::Threaded(comm) => comm.all_reduce_sum_slice(local, out),
            UniverseComm::Serial(comm) => comm.all_reduce_sum_slice(local, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_reductions_are_identity() {
        let comm = UniverseComm::Serial(SerialComm);
        assert_eq!(comm.rank(), 0);
        assert_eq!(comm.size(), 1);
        assert_eq!(comm.all_reduce_max(3.5_f64), 3.5);
        assert_eq!(comm.all_reduce_sum(2.0_f32), 2.0);
        let mut out = [0.0; 3];
        comm.all_reduce_sum_slice(&[1.0, 2.0, 3.0], &mut out);
        assert_eq!(out, [1.0, 2.0, 3.0]);
    }
}
