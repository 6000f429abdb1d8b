//! Degree-of-freedom metadata: pore volumes, equation weights, ownership, constraints.

pub mod constraints;
pub mod table;

pub use constraints::{BoundaryKind, ConstraintsMap};
pub use table::DofTable;
