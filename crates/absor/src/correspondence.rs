use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::SolveError;

/// Minimum number of correspondences that can fix a rotation in 3D.
pub const MIN_CORRESPONDENCES: usize = 3;

/// A pair of points known to be the same physical point seen from frames A and B.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Correspondence {
    /// The point expressed in frame A.
    pub point_a: DVec3,
    /// The point expressed in frame B.
    pub point_b: DVec3,
    /// Index of the point in the cloud it was taken from in frame A.
    pub idx_a: Option<usize>,
    /// Index of the point in the cloud it was taken from in frame B.
    pub idx_b: Option<usize>,
    /// Non-negative weight of the pair in the least squares cost.
    pub weight: f64,
}

impl Correspondence {
    /// Create a unit-weight correspondence without indices.
    pub fn new(point_a: DVec3, point_b: DVec3) -> Self {
        Self {
            point_a,
            point_b,
            idx_a: None,
            idx_b: None,
            weight: 1.0,
        }
    }

    /// Attach the indices of the two points in their source clouds.
    pub fn with_indices(mut self, idx_a: usize, idx_b: usize) -> Self {
        self.idx_a = Some(idx_a);
        self.idx_b = Some(idx_b);
        self
    }

    /// Set the weight of the pair.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Swap the roles of the two frames.
    pub fn reversed(&self) -> Self {
        Self {
            point_a: self.point_b,
            point_b: self.point_a,
            idx_a: self.idx_b,
            idx_b: self.idx_a,
            weight: self.weight,
        }
    }

    #[inline]
    fn is_finite(&self) -> bool {
        self.point_a.is_finite() && self.point_b.is_finite()
    }
}

/// A validated, ordered set of correspondences.
///
/// Holds at least [`MIN_CORRESPONDENCES`] pairs with finite coordinates and valid
/// weights. The set is read-only once built; iteration follows insertion order.
#[derive(Debug, Clone)]
pub struct CorrespondenceSet {
    correspondences: Vec<Correspondence>,
    weighted: bool,
}

impl CorrespondenceSet {
    /// Create a set from correspondences, carrying their indices and weights.
    ///
    /// # Errors
    ///
    /// * [`SolveError::InsufficientCorrespondences`] with fewer than three pairs.
    /// * [`SolveError::NonFiniteInput`] if a coordinate is NaN or infinite.
    /// * [`SolveError::InvalidWeight`] if a weight is negative or not finite.
    /// * [`SolveError::ZeroTotalWeight`] if all weights are zero.
    pub fn from_correspondences(correspondences: Vec<Correspondence>) -> Result<Self, SolveError> {
        if correspondences.len() < MIN_CORRESPONDENCES {
            return Err(SolveError::InsufficientCorrespondences {
                required: MIN_CORRESPONDENCES,
                actual: correspondences.len(),
            });
        }

        if let Some(index) = correspondences.iter().position(|c| !c.is_finite()) {
            return Err(SolveError::NonFiniteInput { index });
        }

        let mut total_weight = 0.0;
        for (index, c) in correspondences.iter().enumerate() {
            if !c.weight.is_finite() || c.weight < 0.0 {
                return Err(SolveError::InvalidWeight {
                    index,
                    weight: c.weight,
                });
            }
            total_weight += c.weight;
        }
        if total_weight <= 0.0 {
            return Err(SolveError::ZeroTotalWeight);
        }

        let weighted = correspondences.iter().any(|c| c.weight != 1.0);

        Ok(Self {
            correspondences,
            weighted,
        })
    }

    /// Create a set from `(point_a, point_b)` pairs with unit weights.
    pub fn from_pairs(pairs: &[(DVec3, DVec3)]) -> Result<Self, SolveError> {
        Self::from_correspondences(
            pairs
                .iter()
                .map(|&(a, b)| Correspondence::new(a, b))
                .collect(),
        )
    }

    /// Create a set from two parallel point lists, pairing them by position.
    ///
    /// # Errors
    ///
    /// [`SolveError::MismatchedInputSizes`] if the lists differ in length, plus the
    /// errors of [`Self::from_correspondences`].
    pub fn from_point_lists(points_a: &[DVec3], points_b: &[DVec3]) -> Result<Self, SolveError> {
        if points_a.len() != points_b.len() {
            return Err(SolveError::MismatchedInputSizes {
                left_name: "points_a",
                left_len: points_a.len(),
                right_name: "points_b",
                right_len: points_b.len(),
            });
        }

        Self::from_correspondences(
            points_a
                .iter()
                .zip(points_b.iter())
                .enumerate()
                .map(|(i, (&a, &b))| Correspondence::new(a, b).with_indices(i, i))
                .collect(),
        )
    }

    /// Create a set from a flat array `[a1x, a1y, a1z, b1x, b1y, b1z, a2x, ...]`.
    ///
    /// # Errors
    ///
    /// [`SolveError::InterleavedLength`] if the length is not a multiple of 6, plus the
    /// errors of [`Self::from_correspondences`].
    pub fn from_interleaved(values: &[f64]) -> Result<Self, SolveError> {
        if values.len() % 6 != 0 {
            return Err(SolveError::InterleavedLength(values.len()));
        }

        Self::from_correspondences(
            values
                .chunks_exact(6)
                .map(|v| {
                    Correspondence::new(
                        DVec3::new(v[0], v[1], v[2]),
                        DVec3::new(v[3], v[4], v[5]),
                    )
                })
                .collect(),
        )
    }

    /// Replace the weights of all pairs.
    ///
    /// # Errors
    ///
    /// [`SolveError::MismatchedInputSizes`] if `weights` does not have one entry per
    /// pair, plus the weight errors of [`Self::from_correspondences`].
    pub fn with_weights(self, weights: &[f64]) -> Result<Self, SolveError> {
        if weights.len() != self.correspondences.len() {
            return Err(SolveError::MismatchedInputSizes {
                left_name: "correspondences",
                left_len: self.correspondences.len(),
                right_name: "weights",
                right_len: weights.len(),
            });
        }

        Self::from_correspondences(
            self.correspondences
                .into_iter()
                .zip(weights.iter())
                .map(|(c, &w)| c.with_weight(w))
                .collect(),
        )
    }

    /// Swap the roles of frames A and B for every pair.
    pub fn reversed(&self) -> Self {
        Self {
            correspondences: self.correspondences.iter().map(|c| c.reversed()).collect(),
            weighted: self.weighted,
        }
    }

    /// Get the number of correspondences.
    #[inline]
    pub fn len(&self) -> usize {
        self.correspondences.len()
    }

    /// Check if the set is empty. Always false for a validated set.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.correspondences.is_empty()
    }

    /// Get the correspondence at `index`, if any.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Correspondence> {
        self.correspondences.get(index)
    }

    /// Iterate over the correspondences in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Correspondence> {
        self.correspondences.iter()
    }

    /// Get the correspondences as a slice.
    pub fn as_slice(&self) -> &[Correspondence] {
        &self.correspondences
    }

    /// Check whether any pair carries a weight other than 1.
    #[inline]
    pub fn is_weighted(&self) -> bool {
        self.weighted
    }

    /// Sum of the weights of all pairs.
    pub fn total_weight(&self) -> f64 {
        self.correspondences.iter().map(|c| c.weight).sum()
    }
}

impl<'a> IntoIterator for &'a CorrespondenceSet {
    type Item = &'a Correspondence;
    type IntoIter = std::slice::Iter<'a, Correspondence>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
