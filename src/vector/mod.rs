//! Vector module: residual containers.

pub mod block;
pub use block::BlockResidual;
