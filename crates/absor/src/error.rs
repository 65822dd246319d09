use std::fmt;

/// Reason a point configuration does not determine a unique transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegeneracyKind {
    /// All points of one frame lie on a line.
    Collinear,
    /// All points of one frame coincide with their centroid.
    Coincident,
    /// The two largest eigenvalues of the key matrix are tied.
    AmbiguousRotation,
}

impl fmt::Display for DegeneracyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegeneracyKind::Collinear => write!(f, "points are collinear"),
            DegeneracyKind::Coincident => write!(f, "points coincide with their centroid"),
            DegeneracyKind::AmbiguousRotation => {
                write!(f, "leading eigenvalues of the key matrix are tied")
            }
        }
    }
}

/// Error types for the absolute orientation solver.
#[derive(Debug, thiserror::Error)]
pub enum SolveError {
    /// Fewer correspondences than needed to fix a rotation.
    #[error("absolute orientation requires at least {required} correspondences, got {actual}")]
    InsufficientCorrespondences {
        /// Minimum number of correspondences.
        required: usize,
        /// Number of correspondences provided.
        actual: usize,
    },

    /// A coordinate is NaN or infinite.
    #[error("correspondence {index} has a non-finite coordinate")]
    NonFiniteInput {
        /// Position of the offending correspondence.
        index: usize,
    },

    /// Two inputs that must be parallel have different lengths.
    #[error("Mismatched input sizes: {left_name} ({left_len}) != {right_name} ({right_len})")]
    MismatchedInputSizes {
        /// Label of the left-hand input.
        left_name: &'static str,
        /// Length of the left-hand input.
        left_len: usize,
        /// Label of the right-hand input.
        right_name: &'static str,
        /// Length of the right-hand input.
        right_len: usize,
    },

    /// A flat interleaved array whose length is not a multiple of 6.
    #[error("interleaved input length ({0}) is not a multiple of 6")]
    InterleavedLength(usize),

    /// A per-correspondence weight is negative or not finite.
    #[error("correspondence {index} has an invalid weight ({weight})")]
    InvalidWeight {
        /// Position of the offending correspondence.
        index: usize,
        /// The rejected weight.
        weight: f64,
    },

    /// All weights are zero.
    #[error("the sum of the correspondence weights is zero")]
    ZeroTotalWeight,

    /// The point configuration does not determine a unique transform.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(DegeneracyKind),

    /// A pose without scale was requested from a similarity transform.
    #[error("transform has scale {0}, a rigid pose requires scale 1")]
    ScaleNotUnit(f64),

    /// An intermediate or final quantity left the finite range of `f64`.
    #[error("coordinates exceed the representable range: {0} is not finite")]
    OutOfRange(&'static str),
}

/// Coarse classification of a [`SolveError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`SolveError::InsufficientCorrespondences`].
    InsufficientCorrespondences,
    /// See [`SolveError::NonFiniteInput`].
    NonFiniteInput,
    /// Lengths of the inputs do not agree.
    MismatchedInputSizes,
    /// See [`SolveError::DegenerateGeometry`].
    DegenerateGeometry,
    /// Weights are negative, non-finite or sum to zero.
    InvalidWeight,
    /// See [`SolveError::ScaleNotUnit`].
    ScaleNotUnit,
    /// See [`SolveError::OutOfRange`].
    OutOfRange,
}

impl SolveError {
    /// Get the kind of the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SolveError::InsufficientCorrespondences { .. } => ErrorKind::InsufficientCorrespondences,
            SolveError::NonFiniteInput { .. } => ErrorKind::NonFiniteInput,
            SolveError::MismatchedInputSizes { .. } | SolveError::InterleavedLength(_) => {
                ErrorKind::MismatchedInputSizes
            }
            SolveError::InvalidWeight { .. } | SolveError::ZeroTotalWeight => {
                ErrorKind::InvalidWeight
            }
            SolveError::DegenerateGeometry(_) => ErrorKind::DegenerateGeometry,
            SolveError::ScaleNotUnit(_) => ErrorKind::ScaleNotUnit,
            SolveError::OutOfRange(_) => ErrorKind::OutOfRange,
        }
    }
}
