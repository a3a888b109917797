// linkarm-core: shared error types for the linkarm kinematics workspace.

pub mod error;

pub use error::ChainError;
