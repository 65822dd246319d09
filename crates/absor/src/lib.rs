#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Absolute orientation
//!
//! Given points observed in two reference frames A and B, [`solve`] returns the
//! [`Transform`] that maps frame A into frame B,
//!
//! ```text
//! p_B = s · R(q) · p_A + t
//! ```
//!
//! minimizing the sum of squared residuals. The rotation is the eigenvector of the
//! largest eigenvalue of Horn's 4×4 key matrix, so no iteration or initial guess is
//! involved.
//!
//! ## Example
//!
//! ```rust
//! use absor::{solve, CorrespondenceSet, SolveOptions};
//! use glam::{DQuat, DVec3};
//!
//! let rotation = DQuat::from_rotation_z(0.3);
//! let translation = DVec3::new(1.0, -2.0, 0.5);
//!
//! let points_a = [DVec3::ZERO, DVec3::X, DVec3::Y, DVec3::new(0.3, 0.2, 1.0)];
//! let pairs = points_a
//!     .iter()
//!     .map(|&a| (a, rotation * a + translation))
//!     .collect::<Vec<_>>();
//!
//! let set = CorrespondenceSet::from_pairs(&pairs)?;
//! let b_from_a = solve(&set, &SolveOptions::default())?;
//!
//! assert!(b_from_a.translation.abs_diff_eq(translation, 1e-9));
//! # Ok::<(), absor::SolveError>(())
//! ```

/// Centroid reduction of corresponding point clouds.
pub mod centroid;

/// Correspondence containers and input validation.
pub mod correspondence;

/// Cross-covariance accumulation and Horn's key matrix.
pub mod covariance;

/// Error types for the solver.
pub mod error;

/// Pose representations built from a solved transform.
pub mod pose;

/// Optimal rotation from the key matrix eigen-decomposition.
pub mod quaternion;

/// Isotropic scale estimation.
pub mod scale;

/// Solver entry points and options.
pub mod solver;

/// Similarity transform between the two frames.
pub mod transform;

#[doc(inline)]
pub use absor_linalg as linalg;

pub use correspondence::{Correspondence, CorrespondenceSet};
pub use error::{DegeneracyKind, ErrorKind, SolveError};
pub use pose::{Pose6D, PoseQuat};
pub use solver::{solve, solve_detailed, solve_interleaved, solve_pairs, Solution, SolveOptions};
pub use transform::Transform;
