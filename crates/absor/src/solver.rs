use glam::{DVec3, DVec4};
use serde::{Deserialize, Serialize};

use crate::centroid::reduce;
use crate::correspondence::CorrespondenceSet;
use crate::covariance::{check_rank, cross_covariance, key_matrix};
use crate::error::SolveError;
use crate::quaternion::optimal_rotation;
use crate::scale::estimate_scale;
use crate::transform::{compose, Transform};

/// Options of the absolute orientation solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveOptions {
    /// Estimate an isotropic scale; when false the scale is exactly 1.
    pub estimate_scale: bool,
    /// A cloud whose second scatter eigenvalue is below this fraction of the first
    /// is rejected as collinear.
    pub rank_tolerance: f64,
    /// Relative gap under which the two leading key matrix eigenvalues are tied.
    pub tie_tolerance: f64,
    /// Weighted A-frame spread below which the scale is undefined.
    pub scale_epsilon: f64,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            estimate_scale: false,
            rank_tolerance: 1e-10,
            tie_tolerance: 1e-10,
            scale_epsilon: 1e-12,
        }
    }
}

impl SolveOptions {
    /// Enable or disable scale estimation.
    pub fn with_scale(mut self, estimate_scale: bool) -> Self {
        self.estimate_scale = estimate_scale;
        self
    }
}

/// A solved transform together with the quantities it was derived from.
#[derive(Debug, Clone)]
pub struct Solution {
    /// The transform mapping frame A into frame B.
    pub transform: Transform,
    /// Eigenvalues of the key matrix built from the extent-normalized clouds,
    /// largest first. Their ratios, not their magnitudes, carry the conditioning.
    pub eigenvalues: DVec4,
    /// Weighted centroid of the frame A points.
    pub centroid_a: DVec3,
    /// Weighted centroid of the frame B points.
    pub centroid_b: DVec3,
    /// Weighted RMS residual of the correspondences under `transform`.
    pub rms_error: f64,
}

fn check_finite(transform: &Transform) -> Result<(), SolveError> {
    if !transform.scale.is_finite() {
        return Err(SolveError::OutOfRange("scale"));
    }
    if !transform.rotation.is_finite() {
        return Err(SolveError::OutOfRange("rotation"));
    }
    if !transform.translation.is_finite() {
        return Err(SolveError::OutOfRange("translation"));
    }
    Ok(())
}

/// Solve for the transform from frame A to frame B, keeping intermediate results.
///
/// # Arguments
///
/// * `set` - Validated correspondences.
/// * `options` - Solver options.
///
/// # Errors
///
/// [`SolveError::DegenerateGeometry`] if either cloud is collinear or coincident,
/// if the rotation is ambiguous, or if the scale is undefined.
/// [`SolveError::OutOfRange`] if a result does not fit in `f64`, which only happens
/// for coordinates near `f64::MAX`.
pub fn solve_detailed(
    set: &CorrespondenceSet,
    options: &SolveOptions,
) -> Result<Solution, SolveError> {
    let clouds = reduce(set);

    check_rank(&clouds, options.rank_tolerance)?;

    let m = cross_covariance(&clouds);
    let n = key_matrix(&m);
    let best = optimal_rotation(&n, options.tie_tolerance)?;

    let scale = match options.estimate_scale {
        true => estimate_scale(&clouds, options.scale_epsilon)?,
        false => 1.0,
    };

    let transform = compose(best.rotation, scale, clouds.centroid_a, clouds.centroid_b);
    check_finite(&transform)?;

    let rms_error = transform.rms_error(set);
    if !rms_error.is_finite() {
        return Err(SolveError::OutOfRange("rms error"));
    }

    log::debug!(
        "absolute orientation over {} pairs: q = {}, t = {}, s = {}, rmse = {}",
        set.len(),
        transform.rotation,
        transform.translation,
        transform.scale,
        rms_error
    );

    Ok(Solution {
        transform,
        eigenvalues: best.eigenvalues,
        centroid_a: clouds.centroid_a,
        centroid_b: clouds.centroid_b,
        rms_error,
    })
}

/// Solve for the transform `p_B = s · R · p_A + t` from frame A to frame B.
///
/// The result minimizes `Σ wᵢ ‖bᵢ − (s · R · aᵢ + t)‖²` over rotations and
/// translations, and over the scale when [`SolveOptions::estimate_scale`] is set.
///
/// Example:
///
/// ```
/// use absor::{solve, CorrespondenceSet, SolveOptions};
/// use glam::DVec3;
///
/// let a = [DVec3::ZERO, DVec3::X, DVec3::Y, DVec3::Z];
/// let b = a.map(|p| p * 3.0 + DVec3::new(0.0, 0.0, 1.0));
///
/// let set = CorrespondenceSet::from_point_lists(&a, &b)?;
/// let b_from_a = solve(&set, &SolveOptions::default().with_scale(true))?;
///
/// assert!((b_from_a.scale - 3.0).abs() < 1e-9);
/// # Ok::<(), absor::SolveError>(())
/// ```
pub fn solve(set: &CorrespondenceSet, options: &SolveOptions) -> Result<Transform, SolveError> {
    solve_detailed(set, options).map(|solution| solution.transform)
}

/// Solve from a list of `(point_a, point_b)` pairs.
pub fn solve_pairs(
    pairs: &[(DVec3, DVec3)],
    options: &SolveOptions,
) -> Result<Transform, SolveError> {
    let set = CorrespondenceSet::from_pairs(pairs)?;
    solve(&set, options)
}

/// Solve from a flat array `[a1x, a1y, a1z, b1x, b1y, b1z, a2x, ...]`.
pub fn solve_interleaved(values: &[f64], options: &SolveOptions) -> Result<Transform, SolveError> {
    let set = CorrespondenceSet::from_interleaved(values)?;
    solve(&set, options)
}
