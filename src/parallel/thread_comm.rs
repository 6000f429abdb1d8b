// Thread-backed communicator: one thread per simulated subdomain.

use crate::core::traits::Scalar;
use std::sync::{Arc, Barrier, Mutex};

/// Shared meeting point for a group of `ThreadComm` handles.
struct Rendezvous {
    barrier: Barrier,
    slots: Mutex<Vec<Vec<f64>>>,
}

/// Shared-memory communicator for a fixed group of threads.
///
/// Every collective publishes the caller's contribution into its rank slot, waits for the whole
/// group, and then reduces all slots in rank order. All ranks therefore compute the same result
/// from the same inputs in the same order. Values travel as `f64`, which is exact for `f32` and
/// `f64`.
///
/// # Example
/// ```
/// use pvconv::parallel::{Comm, ThreadComm};
/// let handles = ThreadComm::group(2);
/// let sums: Vec<f64> = std::thread::scope(|s| {
///     let jobs: Vec<_> = handles
///         .iter()
///         .map(|c| s.spawn(move || c.all_reduce_sum(1.0 + c.rank() as f64)))
///         .collect();
///     jobs.into_iter().map(|j| j.join().unwrap()).collect()
/// });
/// assert_eq!(sums, vec![3.0, 3.0]);
/// ```
#[derive(Clone)]
pub struct ThreadComm {
    rank: usize,
    size: usize,
    shared: Arc<Rendezvous>,
}

impl ThreadComm {
    /// Creates `size` connected handles; hand handle `i` to the thread playing rank `i`.
    ///
    /// # Panics
    /// Panics if `size` is zero.
    pub fn group(size: usize) -> Vec<ThreadComm> {
        assert!(size > 0, "communicator group needs at least one rank");
        let shared = Arc::new(Rendezvous {
            barrier: Barrier::new(size),
            slots: Mutex::new(vec![Vec::new(); size]),
        });
        (0..size)
            .map(|rank| ThreadComm { rank, size, shared: Arc::clone(&shared) })
            .collect()
    }

    /// Publishes `local`, waits for all ranks, and returns every rank's contribution.
    fn exchange(&self, local: Vec<f64>) -> Vec<Vec<f64>> {
        {
            let mut slots = self.shared.slots.lock().unwrap_or_else(|e| e.into_inner());
            slots[self.rank] = local;
        }
        self.shared.barrier.wait();
        let all = self.shared.slots.lock().unwrap_or_else(|e| e.into_inner()).clone();
        // nobody may overwrite a slot before every rank has read it
        self.shared.barrier.wait();
        all
    }
}

fn to_wire<T: Scalar>(x: T) -> f64 {
    x.to_f64().unwrap_or(f64::NAN)
}

fn from_wire<T: Scalar>(x: f64) -> T {
    <T as num_traits::NumCast>::from(x).unwrap_or_else(T::nan)
}

impl super::Comm for ThreadComm {
    fn rank(&self) -> usize { self.rank }
    fn size(&self) -> usize { self.size }
    fn barrier(&self) { self.shared.barrier.wait(); }

    fn all_reduce_max<T: Scalar>(&self, x: T) -> T {
        let all = self.exchange(vec![to_wire(x)]);
        let max = all
            .iter()
            .map(|v| v[0])
            .fold(f64::NEG_INFINITY, |acc, v| if v.is_nan() || v > acc { v } else { acc });
        from_wire(max)
    }

    fn all_reduce_sum<T: Scalar>(&self, x: T) -> T {
        let all = self.exchange(vec![to_wire(x)]);
        from_wire(all.iter().map(|v| v[0]).sum())
    }

    fn all_reduce_sum_slice<T: Scalar>(&self, local: &[T], out: &mut [T]) {
        assert_eq!(local.len(), out.len());
        let all = self.exchange(local.iter().map(|&x| to_wire(x)).collect());
        for (i, o) in out.iter_mut().enumerate() {
            *o = from_wire(all.iter().map(|v| v[i]).sum());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::Comm;
    use std::thread;

    fn run<R: Send>(size: usize, f: impl Fn(&ThreadComm) -> R + Sync) -> Vec<R> {
        let handles = ThreadComm::group(size);
        let f = &f;
        thread::scope(|s| {
            let jobs: Vec<_> = handles.iter().map(|c| s.spawn(move || f(c))).collect();
            jobs.into_iter().map(|j| j.join().unwrap()).collect()
        })
    }

    #[test]
    fn max_and_sum_agree_on_every_rank() {
        let out = run(4, |c| {
            let x = (c.rank() as f64 - 1.5).powi(2);
            (c.all_reduce_max(x), c.all_reduce_sum(x))
        });
        for (max, sum) in out {
            assert_eq!(max, 2.25);
            assert_eq!(sum, 2.25 + 0.25 + 0.25 + 2.25);
        }
    }

    #[test]
    fn slice_sum_is_elementwise() {
        let out = run(3, |c| {
            let r = c.rank() as f32;
            let mut y = [0.0_f32; 2];
            c.all_reduce_sum_slice(&[r, 10.0 * r], &mut y);
            y
        });
        assert!(out.iter().all(|y| *y == [3.0, 30.0]));
    }

    #[test]
    fn max_propagates_nan() {
        let out = run(2, |c| c.all_reduce_max(if c.rank() == 1 { f64::NAN } else { 1.0 }));
        assert!(out.iter().all(|m| m.is_nan()));
    }

    #[test]
    fn repeated_collectives_do_not_mix_rounds() {
        let out = run(3, |c| {
            (0..50).map(|k| c.all_reduce_sum((k * (c.rank() + 1)) as f64)).collect::<Vec<_>>()
        });
        for per_rank in out {
            for (k, s) in per_rank.iter().enumerate() {
                assert_eq!(*s, (6 * k) as f64);
            }
        }
    }
}
