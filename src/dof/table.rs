//! In-memory per-DOF metadata.

use crate::core::traits::{DofModel, Scalar};
use crate::dof::constraints::ConstraintsMap;
use crate::error::ContractViolation;

/// Column storage of everything the evaluator needs to know about each grid DOF.
///
/// Equation weights are stored DOF-major (`dof * num_eq + eq`). A freshly built table marks every
/// DOF local and unconstrained with unit weights.
#[derive(Debug, Clone)]
pub struct DofTable<T> {
    num_eq: usize,
    total_volume: Vec<T>,
    porosity: Vec<T>,
    eq_weights: Vec<T>,
    local: Vec<bool>,
    constraints: ConstraintsMap,
}

impl<T: Scalar> DofTable<T> {
    /// `num_dof` DOFs sharing one volume and one porosity.
    pub fn uniform(num_dof: usize, num_eq: usize, volume: T, porosity: T) -> Self {
        Self {
            num_eq,
            total_volume: vec![volume; num_dof],
            porosity: vec![porosity; num_dof],
            eq_weights: vec![T::one(); num_dof * num_eq],
            local: vec![true; num_dof],
            constraints: ConstraintsMap::new(),
        }
    }

    /// Table from per-DOF volume and porosity columns.
    pub fn from_columns(
        num_eq: usize,
        total_volume: Vec<T>,
        porosity: Vec<T>,
    ) -> Result<Self, ContractViolation> {
        let n = total_volume.len();
        check_len("porosity", n, porosity.len())?;
        Ok(Self {
            num_eq,
            eq_weights: vec![T::one(); n * num_eq],
            local: vec![true; n],
            total_volume,
            porosity,
            constraints: ConstraintsMap::new(),
        })
    }

    /// Replaces all equation weights with a DOF-major buffer.
    pub fn with_eq_weights(mut self, eq_weights: Vec<T>) -> Result<Self, ContractViolation> {
        check_len("eq_weights", self.total_volume.len() * self.num_eq, eq_weights.len())?;
        self.eq_weights = eq_weights;
        Ok(self)
    }

    /// Replaces the ownership mask.
    pub fn with_local_mask(mut self, local: Vec<bool>) -> Result<Self, ContractViolation> {
        check_len("local", self.total_volume.len(), local.len())?;
        self.local = local;
        Ok(self)
    }

    pub fn with_constraints(mut self, constraints: ConstraintsMap) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn len(&self) -> usize { self.total_volume.len() }
    pub fn is_empty(&self) -> bool { self.total_volume.is_empty() }

    pub fn set_total_volume(&mut self, dof: usize, volume: T) { self.total_volume[dof] = volume; }
    pub fn set_porosity(&mut self, dof: usize, porosity: T) { self.porosity[dof] = porosity; }
    pub fn set_eq_weight(&mut self, dof: usize, eq: usize, w: T) { self.eq_weights[dof * self.num_eq + eq] = w; }
    pub fn set_local(&mut self, dof: usize, local: bool) { self.local[dof] = local; }
    pub fn constrain(&mut self, dof: usize) { self.constraints.insert(dof); }
    pub fn constraints(&self) -> &ConstraintsMap { &self.constraints }
}

fn check_len(field: &'static str, expected: usize, found: usize) -> Result<(), ContractViolation> {
    if expected == found {
        Ok(())
    } else {
        Err(ContractViolation::MetadataSize { field, expected, found })
    }
}

impl<T: Scalar> DofModel<T> for DofTable<T> {
    fn num_grid_dof(&self) -> usize { self.total_volume.len() }
    fn num_eq(&self) -> usize { self.num_eq }
    fn dof_total_volume(&self, dof: usize) -> T { self.total_volume[dof] }
    fn porosity(&self, dof: usize) -> T { self.porosity[dof] }
    fn eq_weight(&self, dof: usize, eq: usize) -> T { self.eq_weights[dof * self.num_eq + eq] }
    fn is_local_dof(&self, dof: usize) -> bool { self.local[dof] }
    fn is_constrained(&self, dof: usize) -> bool { self.constraints.contains(dof) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pore_volume_is_porosity_times_volume() {
        let t = DofTable::from_columns(2, vec![10.0, 4.0], vec![0.25, 0.5]).unwrap();
        assert_eq!(t.pore_volume(0), 2.5);
        assert_eq!(t.pore_volume(1), 2.0);
        assert_eq!(t.eq_weight(1, 1), 1.0);
        assert!(t.is_local_dof(1));
    }

    #[test]
    fn rejects_mismatched_columns() {
        let err = DofTable::from_columns(1, vec![1.0_f64; 3], vec![0.1; 2]).unwrap_err();
        assert_eq!(err, ContractViolation::MetadataSize { field: "porosity", expected: 3, found: 2 });
        let t = DofTable::uniform(3, 2, 1.0_f64, 0.2);
        assert!(t.clone().with_eq_weights(vec![1.0; 5]).is_err());
        assert!(t.with_local_mask(vec![true; 2]).is_err());
    }

    #[test]
    fn constrain_marks_dof() {
        let mut t = DofTable::uniform(4, 1, 1.0_f32, 0.3);
        t.constrain(2);
        assert!(t.is_constrained(2));
        assert!(!t.is_constrained(1));
        assert_eq!(t.constraints().len(), 1);
    }
}
