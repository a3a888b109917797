use thiserror::Error;

/// Errors raised when constructing or reconfiguring a kinematic chain.
///
/// These cover caller contract violations at the API boundary (lengths
/// must be positive, angle arrays must match the linkage count).
/// Hot-path dimension mismatches inside the solvers are programming errors
/// and fail fast with assertions instead.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ChainError {
    #[error("Chain has no linkages")]
    EmptyChain,

    #[error("Linkage {index} has non-positive length {value}")]
    NonPositiveLength { index: usize, value: f32 },

    #[error("Angle array length mismatch: expected {expected}, got {got}")]
    AngleCountMismatch { expected: usize, got: usize },
}
