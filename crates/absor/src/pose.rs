use glam::{DMat3, DQuat, DVec3};
use serde::{Deserialize, Serialize};

use crate::error::SolveError;
use crate::quaternion::canonicalize;
use crate::transform::Transform;

/// Largest deviation from 1 accepted when converting a transform to a rigid pose.
pub const UNIT_SCALE_TOLERANCE: f64 = 1e-9;

/// A 6-DoF rigid pose as translation plus yaw, pitch and roll.
///
/// The rotation is `R = Rz(yaw) · Ry(pitch) · Rx(roll)`, angles in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose6D {
    /// Translation along x.
    pub x: f64,
    /// Translation along y.
    pub y: f64,
    /// Translation along z.
    pub z: f64,
    /// Rotation around z.
    pub yaw: f64,
    /// Rotation around the intermediate y axis.
    pub pitch: f64,
    /// Rotation around the final x axis.
    pub roll: f64,
}

impl Pose6D {
    /// Create a pose from a translation and yaw, pitch, roll angles.
    pub fn from_translation_ypr(translation: DVec3, yaw: f64, pitch: f64, roll: f64) -> Self {
        Self {
            x: translation.x,
            y: translation.y,
            z: translation.z,
            yaw,
            pitch,
            roll,
        }
    }

    /// Convert a rigid transform into a pose.
    ///
    /// # Errors
    ///
    /// [`SolveError::ScaleNotUnit`] if the transform scale differs from 1 by more
    /// than [`UNIT_SCALE_TOLERANCE`].
    pub fn from_transform(transform: &Transform) -> Result<Self, SolveError> {
        if (transform.scale - 1.0).abs() > UNIT_SCALE_TOLERANCE {
            return Err(SolveError::ScaleNotUnit(transform.scale));
        }

        let (yaw, pitch, roll) = ypr_from_matrix(&transform.rotation_matrix());
        Ok(Self::from_translation_ypr(
            transform.translation,
            yaw,
            pitch,
            roll,
        ))
    }

    /// The translation part of the pose.
    pub fn translation(&self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }

    /// The rotation of the pose as a canonical unit quaternion.
    pub fn rotation(&self) -> DQuat {
        canonicalize(
            DQuat::from_rotation_z(self.yaw)
                * DQuat::from_rotation_y(self.pitch)
                * DQuat::from_rotation_x(self.roll),
        )
    }

    /// Convert the pose into a rigid transform.
    pub fn to_transform(&self) -> Transform {
        Transform::from_rotation_translation(self.rotation(), self.translation())
    }
}

/// A 7-DoF pose as translation plus unit quaternion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseQuat {
    /// Translation part.
    pub translation: DVec3,
    /// Rotation part, unit norm.
    pub rotation: DQuat,
}

impl PoseQuat {
    /// Convert a rigid transform into a quaternion pose.
    ///
    /// # Errors
    ///
    /// [`SolveError::ScaleNotUnit`] if the transform is not rigid.
    pub fn from_transform(transform: &Transform) -> Result<Self, SolveError> {
        if (transform.scale - 1.0).abs() > UNIT_SCALE_TOLERANCE {
            return Err(SolveError::ScaleNotUnit(transform.scale));
        }
        Ok(Self {
            translation: transform.translation,
            rotation: transform.rotation,
        })
    }

    /// Convert the pose into a rigid transform.
    pub fn to_transform(&self) -> Transform {
        Transform::from_rotation_translation(self.rotation, self.translation)
    }
}

impl Transform {
    /// Convert to a yaw/pitch/roll pose. Requires scale 1.
    pub fn to_pose6d(&self) -> Result<Pose6D, SolveError> {
        Pose6D::from_transform(self)
    }

    /// Convert to a quaternion pose. Requires scale 1.
    pub fn to_pose_quat(&self) -> Result<PoseQuat, SolveError> {
        PoseQuat::from_transform(self)
    }
}

/// Extract `(yaw, pitch, roll)` from `R = Rz(yaw) · Ry(pitch) · Rx(roll)`.
///
/// At gimbal lock (`|pitch| = π/2`) roll is set to zero and the remaining rotation
/// is folded into yaw.
fn ypr_from_matrix(r: &DMat3) -> (f64, f64, f64) {
    // glam is column-major, r_ij is row i column j
    let r00 = r.x_axis.x;
    let r10 = r.x_axis.y;
    let r20 = r.x_axis.z;
    let r21 = r.y_axis.z;
    let r22 = r.z_axis.z;

    let cos_pitch = (r00 * r00 + r10 * r10).sqrt();
    let pitch = (-r20).atan2(cos_pitch);

    if cos_pitch > 1e-10 {
        (r10.atan2(r00), pitch, r21.atan2(r22))
    } else {
        let r01 = r.y_axis.x;
        let r11 = r.y_axis.y;
        let r02 = r.z_axis.x;
        let r12 = r.z_axis.y;
        let yaw = if pitch > 0.0 {
            // R = Rz(yaw - roll) · Ry(π/2)
            r12.atan2(r02)
        } else {
            // R = Rz(yaw + roll) · Ry(-π/2)
            (-r01).atan2(r11)
        };
        (yaw, pitch, 0.0)
    }
}
