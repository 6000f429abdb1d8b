//! Local residual scan.
//!
//! Walks the DOFs owned by this subdomain and accumulates the two error metrics:
//! - the CNV error `|r * dt * w / pv|`, reduced by maximum, which also decides whether a DOF
//!   violates the strict tolerance;
//! - the component sums `|r * w|`, which stay un-normalized until the global pore volume is known.
//!
//! Auxiliary DOFs, overlap DOFs, constrained DOFs and DOFs without pore volume are skipped.

use crate::context::IterationContext;
use crate::convergence::nan_max;
use crate::core::traits::{BlockVector, DofModel, Scalar};
use crate::error::{ContractViolation, NewtonError};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Minimum number of DOFs a rayon task scans.
#[cfg(feature = "rayon")]
const PAR_MIN_LEN: usize = 4096;

/// Running accumulators of one subdomain, before any collective.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalPartials<T> {
    /// Largest CNV error seen.
    pub max_error: T,
    /// Per-equation sum of `|r * w|`.
    pub component_sum_error: Vec<T>,
    /// Pore volume of all eligible DOFs.
    pub sum_pv: T,
    /// Pore volume of the DOFs violating the strict tolerance.
    pub violating_pv: T,
}

impl<T: Scalar> LocalPartials<T> {
    pub fn new(num_eq: usize) -> Self {
        Self {
            max_error: T::zero(),
            component_sum_error: vec![T::zero(); num_eq],
            sum_pv: T::zero(),
            violating_pv: T::zero(),
        }
    }

    /// Adds DOF `dof` with pore volume `pv`.
    fn accumulate<R, M>(&mut self, residual: &R, model: &M, dof: usize, pv: T, dt: T, tolerance: T)
    where
        R: BlockVector<T> + ?Sized,
        M: DofModel<T>,
    {
        let mut violated = false;
        for (eq, sum) in self.component_sum_error.iter_mut().enumerate() {
            let r = residual.entry(dof, eq);
            let w = model.eq_weight(dof, eq);
            let cnv = (r * dt * w / pv).abs();
            self.max_error = nan_max(self.max_error, cnv);
            if cnv > tolerance {
                violated = true;
            }
            *sum = *sum + (r * w).abs();
        }
        self.sum_pv = self.sum_pv + pv;
        if violated {
            self.violating_pv = self.violating_pv + pv;
        }
    }

    /// Combines two disjoint sets of DOFs.
    pub fn merge(mut self, other: Self) -> Self {
        self.max_error = nan_max(self.max_error, other.max_error);
        for (a, b) in self.component_sum_error.iter_mut().zip(other.component_sum_error) {
            *a = *a + b;
        }
        self.sum_pv = self.sum_pv + other.sum_pv;
        self.violating_pv = self.violating_pv + other.violating_pv;
        self
    }
}

/// Pore volume of `dof` if it takes part in the error computation.
fn eligible_pore_volume<T: Scalar, M: DofModel<T>>(model: &M, dof: usize) -> Option<T> {
    if !model.is_local_dof(dof) || model.is_constrained(dof) {
        return None;
    }
    if !(model.dof_total_volume(dof) > T::zero()) {
        return None;
    }
    let pv = model.pore_volume(dof);
    if pv > T::zero() { Some(pv) } else { None }
}

/// Scans the local DOFs of `residual` and returns this subdomain's partial sums.
///
/// Fails if the residual has fewer blocks than the model has grid DOFs, or a different number of
/// equations per block.
pub fn evaluate_local<T, R, M>(
    residual: &R,
    model: &M,
    ctx: &IterationContext<T>,
) -> Result<LocalPartials<T>, NewtonError>
where
    T: Scalar,
    R: BlockVector<T> + Sync + ?Sized,
    M: DofModel<T> + Sync,
{
    let num_grid_dof = model.num_grid_dof();
    if residual.num_blocks() < num_grid_dof {
        return Err(ContractViolation::ResidualSize {
            residual: residual.num_blocks(),
            grid: num_grid_dof,
        }
        .into());
    }
    let num_eq = model.num_eq();
    if residual.block_size() != num_eq {
        return Err(ContractViolation::EquationCount {
            residual: residual.block_size(),
            model: num_eq,
        }
        .into());
    }

    let dt = ctx.time_step_size();
    let tol = ctx.tolerance();

    // blocks past the grid are auxiliary and never scanned
    #[cfg(feature = "rayon")]
    let partials = (0..num_grid_dof)
        .into_par_iter()
        .with_min_len(PAR_MIN_LEN)
        .fold(
            || LocalPartials::new(num_eq),
            |mut acc, dof| {
                if let Some(pv) = eligible_pore_volume(model, dof) {
                    acc.accumulate(residual, model, dof, pv, dt, tol);
                }
                acc
            },
        )
        .reduce(|| LocalPartials::new(num_eq), LocalPartials::merge);

    #[cfg(not(feature = "rayon"))]
    let partials = (0..num_grid_dof).fold(LocalPartials::new(num_eq), |mut acc, dof| {
        if let Some(pv) = eligible_pore_volume(model, dof) {
            acc.accumulate(residual, model, dof, pv, dt, tol);
        }
        acc
    });

    Ok(partials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dof::DofTable;
    use crate::vector::BlockResidual;
    use approx::assert_abs_diff_eq;

    fn ctx(dt: f64, tol: f64) -> IterationContext<f64> {
        IterationContext::new(0, dt, tol, 1e10)
    }

    #[test]
    fn cnv_and_sum_follow_their_own_normalization() {
        // pv = 0.5 * 4 = 2 for every dof
        let model = DofTable::uniform(2, 2, 4.0, 0.5).with_eq_weights(vec![1.0, 2.0, 1.0, 2.0]).unwrap();
        let residual: Vec<[f64; 2]> = vec![[0.1, -0.3], [0.0, 0.05]];
        let p = evaluate_local(&residual, &model, &ctx(10.0, 1.0)).unwrap();
        // cnv = |r * dt * w / pv|: dof 0 eq 1 gives 0.3 * 10 * 2 / 2 = 3
        assert_abs_diff_eq!(p.max_error, 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.component_sum_error[0], 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(p.component_sum_error[1], 0.6 + 0.1, epsilon = 1e-12);
        assert_eq!(p.sum_pv, 4.0);
        // only dof 0 crosses tol = 1 (dof 1: 0.05 * 10 * 2 / 2 = 0.5)
        assert_eq!(p.violating_pv, 2.0);
    }

    #[test]
    fn skips_ineligible_dofs() {
        let mut model = DofTable::uniform(5, 1, 1.0, 0.2);
        model.set_local(0, false);
        model.constrain(1);
        model.set_porosity(2, 0.0);
        model.set_total_volume(3, -1.0);
        // dof 5 is auxiliary: past the grid
        let residual: Vec<[f64; 1]> = vec![[1e6], [1e6], [1e6], [1e6], [0.0], [1e6]];
        let p = evaluate_local(&residual, &model, &ctx(1.0, 1e-2)).unwrap();
        assert_eq!(p.max_error, 0.0);
        assert_eq!(p.component_sum_error, vec![0.0]);
        assert_abs_diff_eq!(p.sum_pv, 0.2, epsilon = 1e-15);
        assert_eq!(p.violating_pv, 0.0);
    }

    #[test]
    fn nan_residual_poisons_max() {
        let model = DofTable::uniform(3, 1, 1.0, 1.0);
        let residual: Vec<[f64; 1]> = vec![[0.5], [f64::NAN], [0.1]];
        let p = evaluate_local(&residual, &model, &ctx(1.0, 1.0)).unwrap();
        assert!(p.max_error.is_nan());
        assert!(p.component_sum_error[0].is_nan());
    }

    #[test]
    fn short_residual_is_a_contract_violation() {
        let model = DofTable::uniform(4, 2, 1.0, 0.1);
        let residual = BlockResidual::<f64>::zeros(3, 2);
        let err = evaluate_local(&residual, &model, &ctx(1.0, 1.0)).unwrap_err();
        assert!(matches!(
            err,
            NewtonError::ContractViolation(ContractViolation::ResidualSize { residual: 3, grid: 4 })
        ));
    }

    #[test]
    fn equation_count_must_match() {
        let model = DofTable::uniform(2, 3, 1.0, 0.1);
        let residual: Vec<[f64; 2]> = vec![[0.0; 2]; 2];
        let err = evaluate_local(&residual, &model, &ctx(1.0, 1.0)).unwrap_err();
        assert!(err.is_contract_violation());
    }

    #[test]
    fn merge_is_order_free_for_max_and_additive_for_sums() {
        let mut a = LocalPartials::<f64>::new(2);
        a.max_error = 0.5;
        a.component_sum_error = vec![1.0, 2.0];
        a.sum_pv = 3.0;
        let mut b = LocalPartials::<f64>::new(2);
        b.max_error = 0.7;
        b.component_sum_error = vec![0.5, 0.25];
        b.violating_pv = 1.0;
        let m = a.clone().merge(b.clone());
        assert_eq!(m, b.merge(a));
        assert_eq!(m.max_error, 0.7);
        assert_eq!(m.component_sum_error, vec![1.5, 2.25]);
        assert_eq!(m.sum_pv, 3.0);
        assert_eq!(m.violating_pv, 1.0);
    }
}
