//! Eigen-decomposition of small, fixed-size symmetric matrices.
//!
//! The implementation is the classical cyclic Jacobi method: every sweep visits
//! each off-diagonal pair `(p, q)` once and applies the plane rotation that
//! annihilates `a[p][q]`. The off-diagonal mass decreases quadratically once the
//! matrix is close to diagonal, so a handful of sweeps is enough for the 3×3 and
//! 4×4 matrices used in absolute orientation.
//!
//! All work happens on stack arrays; nothing is allocated.
//!
//! # Example
//!
//! ```
//! use absor_linalg::eigen::symmetric_eigen;
//!
//! let m = [[2.0, 1.0], [1.0, 2.0]];
//! let eig = symmetric_eigen(&m);
//!
//! assert!((eig.eigenvalues()[0] - 3.0).abs() < 1e-12);
//! assert!((eig.eigenvalues()[1] - 1.0).abs() < 1e-12);
//! ```
//!
//! # References
//!
//! * Golub and Van Loan, "Matrix Computations", 4th ed., §8.5 (Jacobi methods).

use glam::{DMat3, DMat4, DVec3, DVec4};

/// Upper bound on the number of Jacobi sweeps.
pub const MAX_SWEEPS: usize = 32;

/// Eigenvalues and eigenvectors of a symmetric `N`×`N` matrix.
///
/// Eigenvalues are sorted in descending (algebraic) order and `eigenvector(i)`
/// belongs to `eigenvalues()[i]`. The eigenvectors are orthonormal.
#[derive(Debug, Clone, Copy)]
pub struct SymmetricEigen<const N: usize> {
    /// Eigenvalues, largest first.
    eigenvalues: [f64; N],

    /// `eigenvectors[i]` is the unit eigenvector of `eigenvalues[i]`.
    eigenvectors: [[f64; N]; N],

    /// Number of sweeps performed.
    sweeps: usize,

    /// Whether the off-diagonal norm dropped below tolerance within [`MAX_SWEEPS`].
    converged: bool,
}

impl<const N: usize> SymmetricEigen<N> {
    /// Get the eigenvalues, sorted in descending order.
    #[inline]
    pub fn eigenvalues(&self) -> &[f64; N] {
        &self.eigenvalues
    }

    /// Get the unit eigenvector associated with `eigenvalues()[i]`.
    ///
    /// PRECONDITION: `i < N`.
    #[inline]
    pub fn eigenvector(&self, i: usize) -> &[f64; N] {
        &self.eigenvectors[i]
    }

    /// Get all eigenvectors, one per row, in the order of the eigenvalues.
    #[inline]
    pub fn eigenvectors(&self) -> &[[f64; N]; N] {
        &self.eigenvectors
    }

    /// Get the number of Jacobi sweeps that were performed.
    #[inline]
    pub fn sweeps(&self) -> usize {
        self.sweeps
    }

    /// Check whether the iteration converged before hitting [`MAX_SWEEPS`].
    #[inline]
    pub fn converged(&self) -> bool {
        self.converged
    }
}

impl SymmetricEigen<3> {
    /// Eigenvalues as a vector, largest first.
    pub fn values(&self) -> DVec3 {
        DVec3::from_array(self.eigenvalues)
    }

    /// Eigenvectors as the columns of a matrix, in the order of [`Self::values`].
    pub fn vectors(&self) -> DMat3 {
        DMat3::from_cols_array_2d(&self.eigenvectors)
    }
}

impl SymmetricEigen<4> {
    /// Eigenvalues as a vector, largest first.
    pub fn values(&self) -> DVec4 {
        DVec4::from_array(self.eigenvalues)
    }

    /// Eigenvectors as the columns of a matrix, in the order of [`Self::values`].
    pub fn vectors(&self) -> DMat4 {
        DMat4::from_cols_array_2d(&self.eigenvectors)
    }
}

/// Compute the tangent of the Jacobi rotation angle that zeroes `a_pq`.
///
/// Picks the smaller of the two roots so that the rotation angle is at most π/4.
#[inline(always)]
fn jacobi_tangent(a_pp: f64, a_qq: f64, a_pq: f64) -> f64 {
    let theta = (a_qq - a_pp) / (2.0 * a_pq);
    if theta.abs() > 1e150 {
        // theta² would overflow
        return 0.5 / theta;
    }
    let t = 1.0 / (theta.abs() + (theta * theta + 1.0).sqrt());
    if theta < 0.0 {
        -t
    } else {
        t
    }
}

/// Frobenius norm of the entries of `a` selected by `keep`.
///
/// Entries are divided by the largest selected magnitude before squaring, so the
/// norm is finite for every finite matrix.
fn scaled_norm<const N: usize>(a: &[[f64; N]; N], keep: impl Fn(usize, usize) -> bool) -> f64 {
    let mut largest = 0.0f64;
    for (i, row) in a.iter().enumerate() {
        for (j, x) in row.iter().enumerate() {
            if keep(i, j) {
                largest = largest.max(x.abs());
            }
        }
    }
    if largest == 0.0 || !largest.is_finite() {
        return largest;
    }

    let mut sum = 0.0;
    for (i, row) in a.iter().enumerate() {
        for (j, x) in row.iter().enumerate() {
            if keep(i, j) {
                let r = x / largest;
                sum += r * r;
            }
        }
    }
    largest * sum.sqrt()
}

#[inline(always)]
fn off_diagonal_norm<const N: usize>(a: &[[f64; N]; N]) -> f64 {
    scaled_norm(a, |i, j| i != j)
}

/// Compute the eigen-decomposition of a symmetric matrix with the cyclic Jacobi method.
///
/// The input is symmetrized as `(A + Aᵀ) / 2` before iterating, so a matrix that is
/// symmetric up to rounding is accepted as is. A matrix with a non-finite entry is
/// not iterated and comes back with `converged() == false`.
///
/// # Arguments
///
/// * `matrix` - A symmetric matrix in row-major order.
///
/// # Returns
///
/// The eigenvalues sorted in descending order together with their orthonormal
/// eigenvectors. Ties are ordered by their position on the diagonal, so the
/// output is fully deterministic.
pub fn symmetric_eigen<const N: usize>(matrix: &[[f64; N]; N]) -> SymmetricEigen<N> {
    let mut a: [[f64; N]; N] =
        core::array::from_fn(|i| core::array::from_fn(|j| 0.5 * matrix[i][j] + 0.5 * matrix[j][i]));

    // v accumulates the rotations; its columns end up being the eigenvectors
    let mut v: [[f64; N]; N] =
        core::array::from_fn(|i| core::array::from_fn(|j| if i == j { 1.0 } else { 0.0 }));

    let norm = scaled_norm(&a, |_, _| true);
    let finite = norm.is_finite();
    let tolerance = f64::EPSILON * norm;

    let mut sweeps = 0;
    let mut converged = false;

    while finite && sweeps < MAX_SWEEPS {
        let off = off_diagonal_norm(&a);
        if off == 0.0 || off <= tolerance {
            converged = true;
            break;
        }

        for p in 0..N {
            for q in (p + 1)..N {
                let a_pq = a[p][q];
                if a_pq == 0.0 {
                    continue;
                }

                let t = jacobi_tangent(a[p][p], a[q][q], a_pq);
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                // A <- A J
                for row in a.iter_mut() {
                    let (akp, akq) = (row[p], row[q]);
                    row[p] = c * akp - s * akq;
                    row[q] = s * akp + c * akq;
                }

                // A <- Jᵀ A
                for k in 0..N {
                    let (apk, aqk) = (a[p][k], a[q][k]);
                    a[p][k] = c * apk - s * aqk;
                    a[q][k] = s * apk + c * aqk;
                }

                a[p][q] = 0.0;
                a[q][p] = 0.0;

                // V <- V J
                for row in v.iter_mut() {
                    let (vkp, vkq) = (row[p], row[q]);
                    row[p] = c * vkp - s * vkq;
                    row[q] = s * vkp + c * vkq;
                }
            }
        }

        sweeps += 1;
    }

    if finite && !converged {
        let off = off_diagonal_norm(&a);
        converged = off == 0.0 || off <= tolerance;
    }

    let mut order: [usize; N] = core::array::from_fn(|i| i);
    order.sort_unstable_by(|&i, &j| a[j][j].total_cmp(&a[i][i]).then(i.cmp(&j)));

    let eigenvalues = core::array::from_fn(|k| a[order[k]][order[k]]);
    let eigenvectors = core::array::from_fn(|k| core::array::from_fn(|row| v[row][order[k]]));

    SymmetricEigen {
        eigenvalues,
        eigenvectors,
        sweeps,
        converged,
    }
}

/// Compute the eigen-decomposition of a symmetric 3×3 matrix.
pub fn symmetric_eigen3(matrix: &DMat3) -> SymmetricEigen<3> {
    symmetric_eigen(&matrix.transpose().to_cols_array_2d())
}

/// Compute the eigen-decomposition of a symmetric 4×4 matrix.
pub fn symmetric_eigen4(matrix: &DMat4) -> SymmetricEigen<4> {
    symmetric_eigen(&matrix.transpose().to_cols_array_2d())
}
