//! Cross-covariance of two centered clouds and the key matrix of Horn's method.
//!
//! With centered points `ãᵢ` (frame A) and `b̃ᵢ` (frame B) the cross-covariance is
//!
//! ```text
//! M = Σ wᵢ · b̃ᵢ ãᵢᵀ
//! ```
//!
//! and Horn's sums are its transposed entries, `S_uv = Σ wᵢ ã_u b̃_v = M[v][u]`. The
//! rotation maximizing `Σ wᵢ b̃ᵢ · R ãᵢ` is the unit eigenvector of the largest
//! eigenvalue of the symmetric, traceless key matrix `N` built from the `S_uv`.
//!
//! The clouds arrive divided by their extents (see [`CenteredClouds`]). That scales
//! `M` and `N` by a positive constant and leaves the eigenvectors unchanged, while
//! keeping every entry of order one.
//!
//! # References
//!
//! * B. K. P. Horn (1987). "Closed-form solution of absolute orientation using unit
//!   quaternions." Journal of the Optical Society of America A, 4(4), 629–642.

use absor_linalg::eigen::symmetric_eigen3;
use glam::{DMat3, DMat4, DVec4};

use crate::centroid::CenteredClouds;
use crate::error::{DegeneracyKind, SolveError};

/// Accumulate the cross-covariance `M = Σ wᵢ · b̃ᵢ ãᵢᵀ`.
///
/// Column `k` of the result is `Σ wᵢ b̃ᵢ ã_{i,k}`.
pub fn cross_covariance(clouds: &CenteredClouds) -> DMat3 {
    let mut m = DMat3::ZERO;
    for (w, a, b) in clouds.iter() {
        let wb = b * w;
        m += DMat3::from_cols(wb * a.x, wb * a.y, wb * a.z);
    }
    m
}

/// Build Horn's symmetric 4×4 key matrix from the cross-covariance.
///
/// Rows and columns are ordered `(w, x, y, z)`, matching the quaternion layout of
/// the eigenvectors.
pub fn key_matrix(m: &DMat3) -> DMat4 {
    // S_uv = M[v][u], and column u of a glam matrix holds M[..][u]
    let (sxx, sxy, sxz) = (m.x_axis.x, m.x_axis.y, m.x_axis.z);
    let (syx, syy, syz) = (m.y_axis.x, m.y_axis.y, m.y_axis.z);
    let (szx, szy, szz) = (m.z_axis.x, m.z_axis.y, m.z_axis.z);

    // symmetric, so columns equal rows
    DMat4::from_cols(
        DVec4::new(sxx + syy + szz, syz - szy, szx - sxz, sxy - syx),
        DVec4::new(syz - szy, sxx - syy - szz, sxy + syx, szx + sxz),
        DVec4::new(szx - sxz, sxy + syx, -sxx + syy - szz, syz + szy),
        DVec4::new(sxy - syx, szx + sxz, syz + szy, -sxx - syy + szz),
    )
}

/// Weighted scatter matrices `Σ wᵢ ãᵢ ãᵢᵀ` and `Σ wᵢ b̃ᵢ b̃ᵢᵀ` of the two clouds.
pub fn scatter_matrices(clouds: &CenteredClouds) -> (DMat3, DMat3) {
    let mut scatter_a = DMat3::ZERO;
    let mut scatter_b = DMat3::ZERO;
    for (w, a, b) in clouds.iter() {
        let wa = a * w;
        let wb = b * w;
        scatter_a += DMat3::from_cols(wa * a.x, wa * a.y, wa * a.z);
        scatter_b += DMat3::from_cols(wb * b.x, wb * b.y, wb * b.z);
    }
    (scatter_a, scatter_b)
}

/// Multiple of the coordinate rounding error below which a cloud counts as coincident.
const ROUNDING_FACTOR: f64 = 64.0;

/// Classify the spread of one centered, normalized cloud.
///
/// The cloud coincides with its centroid when its extent is within rounding of the
/// raw coordinates, `extent ≤ 64 ε · magnitude`. Otherwise it is collinear when the
/// second scatter eigenvalue is below `rank_tolerance` times the largest.
///
/// Returns `None` when the cloud spans at least a plane.
fn classify_scatter(
    scatter: &DMat3,
    extent: f64,
    magnitude: f64,
    rank_tolerance: f64,
) -> Option<DegeneracyKind> {
    if extent <= ROUNDING_FACTOR * f64::EPSILON * magnitude {
        return Some(DegeneracyKind::Coincident);
    }

    let eig = symmetric_eigen3(scatter);
    let [l0, l1, _] = *eig.eigenvalues();

    if l0 <= 0.0 {
        return Some(DegeneracyKind::Coincident);
    }
    if l1 <= rank_tolerance * l0 {
        return Some(DegeneracyKind::Collinear);
    }
    None
}

/// Check that both centered clouds have rank ≥ 2.
///
/// A cloud is coincident when its extent vanishes next to the magnitude of its raw
/// coordinates, and collinear when the second largest eigenvalue of its scatter is
/// below `rank_tolerance` times the largest. Both tests are relative, so the verdict
/// does not depend on the units or the origin of the input.
///
/// # Errors
///
/// [`SolveError::DegenerateGeometry`] with [`DegeneracyKind::Coincident`] or
/// [`DegeneracyKind::Collinear`].
pub fn check_rank(clouds: &CenteredClouds, rank_tolerance: f64) -> Result<(), SolveError> {
    let (scatter_a, scatter_b) = scatter_matrices(clouds);

    for (frame, scatter, extent, magnitude) in [
        ("A", &scatter_a, clouds.extent_a, clouds.magnitude_a),
        ("B", &scatter_b, clouds.extent_b, clouds.magnitude_b),
    ] {
        if let Some(kind) = classify_scatter(scatter, extent, magnitude, rank_tolerance) {
            log::debug!(
                "rejecting correspondences: frame {frame} {kind} (extent {extent}, magnitude {magnitude})"
            );
            return Err(SolveError::DegenerateGeometry(kind));
        }
    }

    Ok(())
}
