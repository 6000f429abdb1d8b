//! Constrained-DOF bookkeeping.
//!
//! Boundary DOFs whose values are prescribed (Dirichlet) are eliminated from the linear system and
//! must not contribute to the convergence metrics. The discretization reports the boundary
//! condition kinds it assigned per DOF; [`ConstraintsMap::from_boundary`] turns them into the
//! set the evaluator consults.

use bitflags::bitflags;
use std::collections::BTreeSet;

bitflags! {
    /// Boundary condition kinds present at a DOF, over all its equations.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
    pub struct BoundaryKind: u32 {
        const NEUMANN   = 0b0001;
        const DIRICHLET = 0b0010;
        const OUTFLOW   = 0b0100;
    }
}

/// Set of DOFs eliminated by constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintsMap {
    dofs: BTreeSet<usize>,
}

impl ConstraintsMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrains every DOF whose boundary kinds include `DIRICHLET`.
    pub fn from_boundary<I>(boundary: I) -> Self
    where
        I: IntoIterator<Item = (usize, BoundaryKind)>,
    {
        let dofs = boundary
            .into_iter()
            .filter(|(_, kind)| kind.contains(BoundaryKind::DIRICHLET))
            .map(|(dof, _)| dof)
            .collect();
        Self { dofs }
    }

    pub fn insert(&mut self, dof: usize) -> bool { self.dofs.insert(dof) }
    pub fn contains(&self, dof: usize) -> bool { self.dofs.contains(&dof) }
    pub fn len(&self) -> usize { self.dofs.len() }
    pub fn is_empty(&self) -> bool { self.dofs.is_empty() }
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ { self.dofs.iter().copied() }
}

impl FromIterator<usize> for ConstraintsMap {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self { dofs: iter.into_iter().collect() }
    }
}
