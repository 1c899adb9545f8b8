use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
/// Error type returned by settings validation
pub enum SettingsError {
    /// An error attributable to one of the fields
    #[error("Bad value for field \"{0}\"")]
    BadFieldValue(&'static str),
}

/// Broad classification of a [`SolverError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad input detected before any numeric work.
    Validation,
    /// Operation called in the wrong solver state.
    State,
    /// Numerical breakdown during factorization.
    Numeric,
    /// A worker failed for a reason other than a numeric error.
    Concurrency,
}

/// Error type returned by the direct solvers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Matrix has a zero dimension ({nrows} x {ncols})")]
    Dimension { nrows: usize, ncols: usize },

    #[error("Matrix is not square ({nrows} x {ncols})")]
    NotSquare { nrows: usize, ncols: usize },

    #[error("Entry ({row},{col}) is outside a matrix of dimension {n}")]
    EntryOutOfBounds { row: usize, col: usize, n: usize },

    #[error("Elimination ordering is not a permutation")]
    InvalidPermutation,

    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Entry ({row},{col}) is not part of the analyzed sparsity pattern")]
    PatternMismatch { row: usize, col: usize },

    #[error("Sparsity pattern has not been analyzed")]
    PatternNotAnalyzed,

    #[error("Matrix has not been factorized")]
    NotFactorized,

    #[error("Singular pivot {value:e} at variable {variable}")]
    SingularPivot { variable: usize, value: f64 },

    #[error("Worker processing front {front} aborted: {reason}")]
    ConcurrencyAbort { front: usize, reason: String },

    #[error("Invalid settings: {0}")]
    Settings(#[from] SettingsError),
}

impl SolverError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SolverError::Dimension { .. }
            | SolverError::NotSquare { .. }
            | SolverError::EntryOutOfBounds { .. }
            | SolverError::InvalidPermutation
            | SolverError::DimensionMismatch { .. }
            | SolverError::PatternMismatch { .. }
            | SolverError::Settings(_) => ErrorKind::Validation,
            SolverError::PatternNotAnalyzed | SolverError::NotFactorized => ErrorKind::State,
            SolverError::SingularPivot { .. } => ErrorKind::Numeric,
            SolverError::ConcurrencyAbort { .. } => ErrorKind::Concurrency,
        }
    }
}

#[test]
fn test_error_kinds() {
    let e = SolverError::SingularPivot {
        variable: 3,
        value: 0.0,
    };
    assert_eq!(e.kind(), ErrorKind::Numeric);
    assert_eq!(SolverError::NotFactorized.kind(), ErrorKind::State);
    assert_eq!(
        SolverError::from(SettingsError::BadFieldValue("ordering")).kind(),
        ErrorKind::Validation
    );
    assert!(e.to_string().contains("variable 3"));
}
