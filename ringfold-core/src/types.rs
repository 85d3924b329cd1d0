use thiserror::Error;

/// Integer type used for circular position arithmetic.
///
/// Positions are signed so that expressions like `i - 1` or `j - offset`
/// can be formed freely; every table accessor wraps into `0..N` before use.
pub type Pos = isize;

/// Error types that can occur during a partition function calculation.
#[derive(Error, Debug)]
pub enum RingfoldError {
    /// Invalid input sequence format or content
    #[error("Invalid sequence: {0}")]
    InvalidSequence(String),
    /// Inconsistent strand/ligation description
    #[error("Invalid topology: {0}")]
    InvalidTopology(String),
    /// A structure constraint does not match the sequence it applies to
    #[error("Invalid constraint: {0}")]
    InvalidConstraint(String),
    /// A thermodynamic parameter is outside its physical range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// The calculation produced a numerically meaningless result
    /// (vanishing or non-finite partition function)
    #[error("Degenerate partition function: {0}")]
    DegenerateResult(String),
    /// The per-root totals disagree beyond tolerance, indicating an
    /// internal inconsistency in the filled tables
    #[error("Root invariance check failed: Z({root}) = {found:e}, expected {expected:e}")]
    RootInvariance {
        /// Root index whose total disagrees
        root: usize,
        /// Total computed from that root
        found: f64,
        /// Total computed from root 0
        expected: f64,
    },
    /// File I/O operation failed
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
