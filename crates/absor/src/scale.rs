use crate::centroid::CenteredClouds;
use crate::error::{DegeneracyKind, SolveError};

/// Estimate the isotropic scale from frame A to frame B.
///
/// `scale = sqrt(Σ wᵢ‖b̃ᵢ‖² / Σ wᵢ‖ãᵢ‖²)`, the symmetric least squares estimate,
/// which does not depend on the rotation. The sums run over the normalized clouds
/// and the ratio of the extents restores the units.
///
/// # Arguments
///
/// * `clouds` - The centered point clouds.
/// * `epsilon` - Normalized A-frame spread per unit weight below which the ratio
///   is undefined.
///
/// # Errors
///
/// [`SolveError::DegenerateGeometry`] with [`DegeneracyKind::Coincident`] if the
/// A-frame spread is not above `epsilon`.
pub fn estimate_scale(clouds: &CenteredClouds, epsilon: f64) -> Result<f64, SolveError> {
    let mut spread_a = 0.0;
    let mut spread_b = 0.0;
    for (w, a, b) in clouds.iter() {
        spread_a += w * a.length_squared();
        spread_b += w * b.length_squared();
    }

    if clouds.extent_a == 0.0 || spread_a <= epsilon * clouds.total_weight {
        log::debug!("rejecting correspondences: frame A spread {spread_a} for scale estimation");
        return Err(SolveError::DegenerateGeometry(DegeneracyKind::Coincident));
    }

    Ok(clouds.extent_b / clouds.extent_a * (spread_b / spread_a).sqrt())
}
