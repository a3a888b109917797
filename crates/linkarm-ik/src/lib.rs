//! Serial-chain kinematics: forward kinematics and CCD inverse kinematics.
//!
//! Computes the geometry of an open chain of rigid linkages parameterized
//! by per-linkage bend (`pitch`) and twist (`rotate`) angles.
//!
//! # Architecture
//!
//! ```text
//! LinkChain ──► forward_kinematics ──► joint positions
//!     ▲                                      │
//!     └── extract_angles ◄── CcdSolver ◄─────┘ + target
//! ```
//!
//! The angle arrays are the canonical chain state; Cartesian joint positions
//! are a derived view, recomputed on demand. The CCD solver perturbs
//! positions geometrically (one backward sweep per pass), then re-derives
//! the angles with [`extract::extract_angles_into`] so the two
//! representations stay consistent.

pub mod aim;
pub mod chain;
pub mod extract;
pub mod frame;
pub mod solver;

pub use aim::Aim;
pub use chain::LinkChain;
pub use extract::extract_angles;
pub use frame::Frame;
pub use solver::{solve_step, CcdConfig, CcdSolver, IkResult};
