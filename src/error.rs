use std::fmt;
use thiserror::Error;

// Unified error type for pvconv

/// Which aggregated metric crossed the absolute ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorMetric {
    /// Worst pore-volume normalized residual (CNV).
    MaxError,
    /// Globally normalized per-equation sum (mass balance).
    ErrorSum,
}

impl fmt::Display for ErrorMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorMetric::MaxError => write!(f, "Error"),
            ErrorMetric::ErrorSum => write!(f, "Sum of the error"),
        }
    }
}

/// Misuse of the evaluator: inconsistent inputs rather than a numerical condition.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContractViolation {
    #[error("total eligible pore volume is zero")]
    ZeroPoreVolume,
    #[error("residual has {residual} blocks but the model has {grid} grid dofs")]
    ResidualSize { residual: usize, grid: usize },
    #[error("residual carries {residual} equations per dof but the model carries {model}")]
    EquationCount { residual: usize, model: usize },
    #[error("policy was built for {policy} equations per dof but the model carries {model}")]
    PolicyEquationCount { policy: usize, model: usize },
    #[error("inputs rejected on {failed} other subdomain(s)")]
    RemoteSubdomain { failed: usize },
    #[error("{field} has length {found}, expected {expected}")]
    MetadataSize { field: &'static str, expected: usize, found: usize },
    #[error("flat residual of length {len} is not a multiple of block size {block_size}")]
    BlockSize { len: usize, block_size: usize },
}

#[derive(Error, Debug)]
pub enum NewtonError {
    #[error("Newton: {metric} {value:e} is larger than maximum allowed error of {ceiling:e}")]
    NumericalDivergence { metric: ErrorMetric, value: f64, ceiling: f64 },
    #[error("contract violation: {0}")]
    ContractViolation(#[from] ContractViolation),
    #[error("invalid option `{name}`: {reason}")]
    InvalidOption { name: &'static str, reason: String },
    #[error("Newton did not converge within {0} iterations")]
    IterationLimit(usize),
    #[error("nonlinear problem error: {0}")]
    Problem(String),
    #[error("MPI error: {0}")]
    Mpi(String),
}

impl NewtonError {
    /// The attempt blew up; drivers usually retry with a smaller time step.
    pub fn is_divergence(&self) -> bool {
        matches!(self, NewtonError::NumericalDivergence { .. })
    }

    pub fn is_contract_violation(&self) -> bool {
        matches!(self, NewtonError::ContractViolation(_))
    }
}
