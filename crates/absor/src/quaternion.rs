use absor_linalg::eigen::symmetric_eigen4;
use glam::{DMat4, DQuat, DVec4};

use crate::error::{DegeneracyKind, SolveError};

/// The rotation selected from the key matrix spectrum.
#[derive(Debug, Clone, Copy)]
pub struct OptimalRotation {
    /// Canonical unit quaternion, `w ≥ 0`.
    pub rotation: DQuat,
    /// Eigenvalues of the key matrix, largest first.
    pub eigenvalues: DVec4,
}

/// Flip a quaternion into the canonical half-space.
///
/// `q` and `-q` encode the same rotation; the canonical one has `w > 0`, or, for a
/// half-turn with `w == 0`, a positive first non-zero vector component.
pub fn canonicalize(q: DQuat) -> DQuat {
    let flip = if q.w != 0.0 {
        q.w < 0.0
    } else if q.x != 0.0 {
        q.x < 0.0
    } else if q.y != 0.0 {
        q.y < 0.0
    } else {
        q.z < 0.0
    };

    if flip {
        -q
    } else {
        q
    }
}

/// Select the optimal rotation from Horn's key matrix.
///
/// The eigenvector of the algebraically largest eigenvalue, read as `(w, x, y, z)`,
/// is the quaternion that best rotates frame A onto frame B. It is normalized and
/// returned with canonical sign.
///
/// # Arguments
///
/// * `key_matrix` - The symmetric 4×4 key matrix.
/// * `tie_tolerance` - Relative gap below which the two largest eigenvalues are
///   considered equal.
///
/// # Errors
///
/// [`SolveError::DegenerateGeometry`] with [`DegeneracyKind::AmbiguousRotation`] when
/// `λ₁ − λ₂ ≤ tie_tolerance · max|λ|`, including the all-zero matrix, and
/// [`SolveError::OutOfRange`] when the key matrix is not finite.
pub fn optimal_rotation(
    key_matrix: &DMat4,
    tie_tolerance: f64,
) -> Result<OptimalRotation, SolveError> {
    let eig = symmetric_eigen4(key_matrix);
    let eigenvalues = eig.values();
    log::trace!("key matrix eigenvalues: {eigenvalues}");

    if !eigenvalues.is_finite() {
        return Err(SolveError::OutOfRange("key matrix"));
    }
    if !eig.converged() {
        log::warn!(
            "jacobi did not converge after {} sweeps, using last iterate",
            eig.sweeps()
        );
    }

    let magnitude = eigenvalues.abs().max_element();
    let gap = eigenvalues.x - eigenvalues.y;
    if magnitude == 0.0 || gap <= tie_tolerance * magnitude {
        log::debug!("rejecting correspondences: eigenvalue gap {gap} for magnitude {magnitude}");
        return Err(SolveError::DegenerateGeometry(
            DegeneracyKind::AmbiguousRotation,
        ));
    }

    let [w, x, y, z] = *eig.eigenvector(0);
    let rotation = canonicalize(DQuat::from_xyzw(x, y, z, w).normalize());

    Ok(OptimalRotation {
        rotation,
        eigenvalues,
    })
}
