//! Global reduction of the local partial sums.

use crate::convergence::evaluator::LocalPartials;
use crate::convergence::nan_max;
use crate::core::traits::Scalar;
use crate::error::{ContractViolation, NewtonError};
use crate::parallel::Comm;
use log::trace;

/// Error metrics agreed on by every subdomain.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalErrors<T> {
    pub max_error: T,
    /// Per-equation sums normalized by the global pore volume and scaled by `dt`.
    pub component_sum_error: Vec<T>,
    /// Largest magnitude in `component_sum_error`.
    pub error_sum: T,
    /// Pore-volume weighted fraction of DOFs violating the strict tolerance.
    pub error_pv_fraction: T,
    pub sum_pv: T,
}

/// Reduces `local` over all ranks of `comm`. Collective: every rank must call it, including ranks
/// whose local scan failed.
///
/// A failed rank contributes empty partials and raises a flag in the packed sum, so every rank
/// returns a contract violation instead of leaving the others waiting in the collective. The failed
/// rank keeps its own error; the others report how many subdomains rejected their inputs.
///
/// The component sums are divided by the global pore volume first and multiplied by `dt`
/// afterwards; swapping the two changes the rounding of the result.
pub fn aggregate<T: Scalar, C: Comm>(
    comm: &C,
    local: Result<LocalPartials<T>, NewtonError>,
    num_eq: usize,
    dt: T,
) -> Result<GlobalErrors<T>, NewtonError> {
    let (local, failure) = match local {
        Ok(p) if p.component_sum_error.len() == num_eq => (p, None),
        Ok(p) => {
            let err = ContractViolation::PolicyEquationCount {
                policy: num_eq,
                model: p.component_sum_error.len(),
            };
            (LocalPartials::new(num_eq), Some(err.into()))
        }
        Err(e) => (LocalPartials::new(num_eq), Some(e)),
    };
    let max_error = comm.all_reduce_max(local.max_error);

    // one collective for all sums: [components.., sum_pv, violating_pv, failed ranks]
    let mut send = local.component_sum_error;
    send.push(local.sum_pv);
    send.push(local.violating_pv);
    send.push(if failure.is_some() { T::one() } else { T::zero() });
    let mut recv = vec![T::zero(); send.len()];
    comm.all_reduce_sum_slice(&send, &mut recv);

    let failed = recv[num_eq + 2];
    if failed > T::zero() {
        return Err(failure.unwrap_or_else(|| {
            let failed = failed.to_usize().unwrap_or(1);
            ContractViolation::RemoteSubdomain { failed }.into()
        }));
    }

    let violating_pv = recv[num_eq + 1];
    let sum_pv = recv[num_eq];
    recv.truncate(num_eq);
    let mut component_sum_error = recv;
    trace!(
        "rank {}/{}: reduced max error {:?}, pore volume {:?}",
        comm.rank(),
        comm.size(),
        max_error,
        sum_pv
    );

    if !(sum_pv > T::zero()) {
        return Err(ContractViolation::ZeroPoreVolume.into());
    }

    let mut error_sum = T::zero();
    for c in component_sum_error.iter_mut() {
        *c = *c / sum_pv * dt;
        error_sum = nan_max(error_sum, c.abs());
    }

    Ok(GlobalErrors {
        max_error,
        component_sum_error,
        error_sum,
        error_pv_fraction: violating_pv / sum_pv,
        sum_pv,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::SerialComm;
    use approx::assert_abs_diff_eq;

    #[test]
    fn normalizes_sums_by_global_pore_volume() {
        let local = LocalPartials {
            max_error: 0.4,
            component_sum_error: vec![2.0, -0.0, 8.0],
            sum_pv: 4.0,
            violating_pv: 1.0,
        };
        let g = aggregate(&SerialComm, Ok(local), 3, 0.5).unwrap();
        assert_eq!(g.max_error, 0.4);
        assert_abs_diff_eq!(g.component_sum_error[0], 0.25, epsilon = 1e-15);
        assert_abs_diff_eq!(g.component_sum_error[2], 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(g.error_sum, 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(g.error_pv_fraction, 0.25, epsilon = 1e-15);
        assert_eq!(g.sum_pv, 4.0);
    }

    #[test]
    fn zero_pore_volume_is_fatal() {
        let local = LocalPartials::<f64>::new(2);
        let err = aggregate(&SerialComm, Ok(local), 2, 1.0).unwrap_err();
        assert!(matches!(err, NewtonError::ContractViolation(ContractViolation::ZeroPoreVolume)));
    }

    #[test]
    fn local_failure_is_reported_after_the_reduction() {
        let err = ContractViolation::ResidualSize { residual: 3, grid: 4 };
        let out = aggregate::<f64, _>(&SerialComm, Err(err.clone().into()), 2, 1.0).unwrap_err();
        assert!(matches!(out, NewtonError::ContractViolation(e) if e == err));
    }

    #[test]
    fn partials_of_the_wrong_width_are_rejected() {
        let local = LocalPartials::<f64>::new(3);
        let err = aggregate(&SerialComm, Ok(local), 2, 1.0).unwrap_err();
        assert!(matches!(
            err,
            NewtonError::ContractViolation(ContractViolation::PolicyEquationCount { policy: 2, model: 3 })
        ));
    }

    #[test]
    fn every_rank_fails_when_one_rank_fails() {
        use crate::parallel::{Comm, ThreadComm};
        use std::sync::mpsc;
        use std::thread;
        use std::time::Duration;

        let (tx, rx) = mpsc::channel();
        for comm in ThreadComm::group(3) {
            let tx = tx.clone();
            // detached so a rank stuck in the collective cannot hang the test itself
            thread::spawn(move || {
                let local = if comm.rank() == 1 {
                    Err(ContractViolation::ResidualSize { residual: 3, grid: 4 }.into())
                } else {
                    let mut p = LocalPartials::<f64>::new(1);
                    p.sum_pv = 1.0;
                    Ok(p)
                };
                let out = aggregate(&comm, local, 1, 1.0);
                let _ = tx.send((comm.rank(), out.map(|_| ()).map_err(|e| e.to_string())));
            });
        }
        drop(tx);
        let mut results = Vec::new();
        for _ in 0..3 {
            results.push(rx.recv_timeout(Duration::from_secs(10)).expect("a rank is stuck in the collective"));
        }
        results.sort_by_key(|r| r.0);
        assert!(results[1].1.as_ref().unwrap_err().contains("3 blocks"));
        for r in [&results[0], &results[2]] {
            assert_eq!(r.1, Err("contract violation: inputs rejected on 1 other subdomain(s)".to_string()));
        }
    }
}
