#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Cyclic Jacobi eigen-decomposition of small symmetric matrices.
pub mod eigen;
