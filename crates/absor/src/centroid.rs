use glam::DVec3;

use crate::correspondence::CorrespondenceSet;

/// Two point clouds expressed relative to their own (weighted) centroids.
///
/// Each centered cloud is divided by its extent, the largest absolute centered
/// coordinate among the pairs with positive weight, so the second moments built
/// from it stay near one whatever the units of the input. The centered point in
/// input units is `extent_a * centered_a[i]`.
#[derive(Debug, Clone)]
pub struct CenteredClouds {
    /// Weighted mean of the frame A points.
    pub centroid_a: DVec3,
    /// Weighted mean of the frame B points.
    pub centroid_b: DVec3,
    /// Frame A points minus `centroid_a`, divided by `extent_a`, in correspondence order.
    pub centered_a: Vec<DVec3>,
    /// Frame B points minus `centroid_b`, divided by `extent_b`, in correspondence order.
    pub centered_b: Vec<DVec3>,
    /// Largest absolute centered coordinate of frame A, or zero when it coincides.
    pub extent_a: f64,
    /// Largest absolute centered coordinate of frame B, or zero when it coincides.
    pub extent_b: f64,
    /// Largest absolute raw coordinate of frame A.
    pub magnitude_a: f64,
    /// Largest absolute raw coordinate of frame B.
    pub magnitude_b: f64,
    /// Weight of each pair divided by the largest weight.
    pub weights: Vec<f64>,
    /// Sum of `weights`, between 1 and the number of pairs.
    pub total_weight: f64,
}

impl CenteredClouds {
    /// Get the number of centered pairs.
    #[inline]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Check if there are no centered pairs.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Iterate over `(weight, centered_a, centered_b)` triplets.
    pub fn iter(&self) -> impl Iterator<Item = (f64, DVec3, DVec3)> + '_ {
        self.weights
            .iter()
            .zip(self.centered_a.iter())
            .zip(self.centered_b.iter())
            .map(|((&w, &a), &b)| (w, a, b))
    }
}

/// Compute the weighted centroids of both frames.
///
/// `centroid = Σ (wᵢ / Σ wⱼ) pᵢ`, summed in correspondence order. The weights are
/// turned into fractions first so the sum cannot overflow before the division.
///
/// PRECONDITION: the total weight of `set` is positive, which a validated
/// [`CorrespondenceSet`] guarantees.
pub fn compute_centroids(set: &CorrespondenceSet) -> (DVec3, DVec3) {
    let largest_weight = set.iter().map(|c| c.weight).fold(0.0, f64::max);
    let relative_total: f64 = set.iter().map(|c| c.weight / largest_weight).sum();

    let mut centroid_a = DVec3::ZERO;
    let mut centroid_b = DVec3::ZERO;
    for c in set {
        let fraction = c.weight / largest_weight / relative_total;
        centroid_a += c.point_a * fraction;
        centroid_b += c.point_b * fraction;
    }

    (centroid_a, centroid_b)
}

fn max_abs(points: &[DVec3], weights: &[f64]) -> f64 {
    points
        .iter()
        .zip(weights.iter())
        .filter(|(_, &w)| w > 0.0)
        .map(|(p, _)| p.abs().max_element())
        .fold(0.0, f64::max)
}

fn normalize(points: &mut [DVec3], extent: f64) {
    if extent > 0.0 && extent.is_finite() {
        let inv = extent.recip();
        points.iter_mut().for_each(|p| *p *= inv);
    }
}

/// Center both point clouds on their centroids and normalize them by their extents.
pub fn reduce(set: &CorrespondenceSet) -> CenteredClouds {
    let (centroid_a, centroid_b) = compute_centroids(set);
    let largest_weight = set.iter().map(|c| c.weight).fold(0.0, f64::max);

    let n = set.len();
    let mut raw_a = Vec::with_capacity(n);
    let mut raw_b = Vec::with_capacity(n);
    let mut centered_a = Vec::with_capacity(n);
    let mut centered_b = Vec::with_capacity(n);
    let mut weights = Vec::with_capacity(n);

    for c in set {
        raw_a.push(c.point_a);
        raw_b.push(c.point_b);
        centered_a.push(c.point_a - centroid_a);
        centered_b.push(c.point_b - centroid_b);
        weights.push(c.weight / largest_weight);
    }

    let magnitude_a = max_abs(&raw_a, &weights);
    let magnitude_b = max_abs(&raw_b, &weights);
    let extent_a = max_abs(&centered_a, &weights);
    let extent_b = max_abs(&centered_b, &weights);
    normalize(&mut centered_a, extent_a);
    normalize(&mut centered_b, extent_b);

    let total_weight = weights.iter().sum();

    log::trace!(
        "centroid_a: {centroid_a}, centroid_b: {centroid_b}, extents: {extent_a}, {extent_b}"
    );

    CenteredClouds {
        centroid_a,
        centroid_b,
        centered_a,
        centered_b,
        extent_a,
        extent_b,
        magnitude_a,
        magnitude_b,
        weights,
        total_weight,
    }
}
