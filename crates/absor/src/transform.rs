use std::ops::Mul;

use glam::{DMat3, DMat4, DQuat, DVec3};
use serde::{Deserialize, Serialize};

use crate::correspondence::{Correspondence, CorrespondenceSet};
use crate::quaternion::canonicalize;

/// Similarity transform mapping points from frame A into frame B.
///
/// ```text
/// p_B = scale · R(rotation) · p_A + translation
/// ```
///
/// `scale` is exactly 1 for rigid solves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Unit quaternion with `w ≥ 0`.
    pub rotation: DQuat,
    /// Translation applied after rotation and scale.
    pub translation: DVec3,
    /// Positive isotropic scale.
    pub scale: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        rotation: DQuat::IDENTITY,
        translation: DVec3::ZERO,
        scale: 1.0,
    };

    /// Create a transform from its parts.
    ///
    /// PRECONDITION: `rotation` is a unit quaternion and `scale > 0`.
    pub fn new(rotation: DQuat, translation: DVec3, scale: f64) -> Self {
        Self {
            rotation,
            translation,
            scale,
        }
    }

    /// Create a rigid transform (scale 1).
    pub fn from_rotation_translation(rotation: DQuat, translation: DVec3) -> Self {
        Self::new(rotation, translation, 1.0)
    }

    /// Map a point from frame A into frame B.
    #[inline]
    pub fn transform_point(&self, point: DVec3) -> DVec3 {
        self.rotation * point * self.scale + self.translation
    }

    /// Map a set of points from frame A into frame B.
    ///
    /// PRECONDITION: `dst` has the same length as `src`.
    pub fn transform_points(&self, src: &[DVec3], dst: &mut [DVec3]) {
        assert_eq!(src.len(), dst.len());
        let m = self.rotation_matrix() * self.scale;
        for (d, s) in dst.iter_mut().zip(src.iter()) {
            *d = m * *s + self.translation;
        }
    }

    /// The inverse transform, mapping frame B into frame A.
    ///
    /// `p_A = (1 / s) · Rᵀ · (p_B − t)`
    pub fn inverse(&self) -> Self {
        let rotation = canonicalize(self.rotation.conjugate());
        let scale = 1.0 / self.scale;
        let translation = -(rotation * self.translation) * scale;
        Self {
            rotation,
            translation,
            scale,
        }
    }

    /// The 3×3 rotation matrix `R(q)`.
    pub fn rotation_matrix(&self) -> DMat3 {
        DMat3::from_quat(self.rotation)
    }

    /// The 4×4 homogeneous matrix `[s·R | t; 0 | 1]`.
    pub fn to_homogeneous(&self) -> DMat4 {
        DMat4::from_scale_rotation_translation(
            DVec3::splat(self.scale),
            self.rotation,
            self.translation,
        )
    }

    /// The `(rotation, translation, scale)` tuple.
    pub fn as_tuple(&self) -> (DQuat, DVec3, f64) {
        (self.rotation, self.translation, self.scale)
    }

    /// Weighted root-mean-square residual `‖T(aᵢ) − bᵢ‖` over a correspondence set.
    ///
    /// Residuals and weights are rescaled by their largest values before summing,
    /// so the result stays finite whenever every residual is.
    pub fn rms_error(&self, set: &CorrespondenceSet) -> f64 {
        let residual = |c: &Correspondence| {
            (self.transform_point(c.point_a) - c.point_b).length()
        };

        let largest = set
            .iter()
            .filter(|c| c.weight > 0.0)
            .map(residual)
            .fold(0.0, f64::max);
        if largest == 0.0 || !largest.is_finite() {
            return largest;
        }

        let largest_weight = set.iter().map(|c| c.weight).fold(0.0, f64::max);
        let mut sum = 0.0;
        let mut total_weight = 0.0;
        for c in set {
            let w = c.weight / largest_weight;
            let r = residual(c) / largest;
            sum += w * r * r;
            total_weight += w;
        }
        largest * (sum / total_weight).sqrt()
    }
}

/// Chain two transforms; `(lhs * rhs)(p) = lhs(rhs(p))`.
impl Mul for Transform {
    type Output = Transform;

    fn mul(self, rhs: Self) -> Self::Output {
        Self {
            rotation: canonicalize((self.rotation * rhs.rotation).normalize()),
            translation: self.transform_point(rhs.translation),
            scale: self.scale * rhs.scale,
        }
    }
}

/// Assemble the transform from the solved rotation, scale and centroids.
///
/// The translation moves the rotated and scaled A centroid onto the B centroid,
/// `t = centroid_b − s · R(q) · centroid_a`.
pub fn compose(rotation: DQuat, scale: f64, centroid_a: DVec3, centroid_b: DVec3) -> Transform {
    let translation = centroid_b - rotation * centroid_a * scale;
    Transform {
        rotation,
        translation,
        scale,
    }
}
