//! likelihood::covariance — measurement-noise whitening.
//!
//! Purpose
//! -------
//! Turn a Gaussian noise description into a whitening operator. A residual
//! `r` with covariance `Σ = L Lᵀ` is whitened to `r̃ = L⁻¹ r`, after which
//! `‖r̃‖² = rᵀ Σ⁻¹ r` and the least-squares machinery applies unchanged.
//! Diagonal covariances get a cheap per-entry scaling; full matrices are
//! factored once at construction and whitened by triangular solves.
//!
//! Key behaviors
//! -------------
//! - [`Covariance::diagonal`] validates per-point variances and stores
//!   their inverse standard deviations.
//! - [`Covariance::full`] validates shape and finiteness, then takes the
//!   Cholesky factor `L` once; an unfactorable matrix is rejected as not
//!   positive definite.
//! - [`Covariance::whiten`] maps residual vectors, and
//!   [`Covariance::whiten_columns`] maps Jacobian blocks column-consistently
//!   so whitened residuals and whitened Jacobians stay differentiable pairs.
//!
//! Invariants & assumptions
//! ------------------------
//! - Construction consumes the noise description; whitening never fails for
//!   inputs whose dimension matches [`Covariance::dim`].
//! - No explicit matrix inverse is formed; full-matrix whitening is a
//!   forward substitution against the stored factor.
//!
//! Conventions
//! -----------
//! - Variances are absolute (standard deviation squared), one per
//!   measurement point, in measurement order.
//! - Errors are reported via [`OptResult<T>`].
//!
//! Downstream usage
//! ----------------
//! - [`MaxLikelihood`](super::adapter::MaxLikelihood) whitens its raw
//!   residual and Jacobian through this type, turning a covariance-weighted
//!   fit into a plain least-squares problem.
//!
//! Testing notes
//! -------------
//! - Unit tests cover constructor validation, hand-solved diagonal and
//!   correlated whitening, the Jacobian column map, and the identity
//!   `‖whiten(r)‖² = rᵀ Σ⁻¹ r`.
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};

use crate::optimization::{
    errors::{OptError, OptResult},
    nlls_solver::kernel::fill_dmatrix,
};

/// Whitening operator for Gaussian measurement noise.
///
/// Construct with [`Covariance::diagonal`] for independent noise or
/// [`Covariance::full`] for correlated noise, then apply with
/// [`Covariance::whiten`] / [`Covariance::whiten_columns`].
#[derive(Debug, Clone)]
pub struct Covariance {
    form: CovarianceForm,
}

#[derive(Debug, Clone)]
enum CovarianceForm {
    /// Independent noise; holds `1 / σ_i` per measurement point.
    Diagonal { inv_std: Array1<f64> },
    /// Correlated noise; holds the lower Cholesky factor `L` of `Σ`.
    Full { cholesky_lower: DMatrix<f64> },
}

impl Covariance {
    /// Independent per-point noise from a vector of variances.
    ///
    /// # Errors
    /// - `OptError::InvalidVariance` for the first entry that is not finite
    ///   and strictly positive.
    pub fn diagonal(variances: Array1<f64>) -> OptResult<Self> {
        for (index, &value) in variances.iter().enumerate() {
            if !value.is_finite() || value <= 0.0 {
                return Err(OptError::InvalidVariance { index, value });
            }
        }
        let inv_std = variances.mapv(|v| 1.0 / v.sqrt());
        Ok(Self { form: CovarianceForm::Diagonal { inv_std } })
    }

    /// Correlated noise from a full covariance matrix.
    ///
    /// The matrix is factored once here; whitening afterwards is a
    /// triangular solve per application.
    ///
    /// # Errors
    /// - `OptError::CovarianceDimMismatch` if the matrix is not square.
    /// - `OptError::NonFiniteCovariance` for the first entry that is NaN or
    ///   infinite.
    /// - `OptError::CovarianceNotPositiveDefinite` if the Cholesky
    ///   factorization fails.
    pub fn full(matrix: Array2<f64>) -> OptResult<Self> {
        let (rows, cols) = matrix.dim();
        if rows != cols {
            return Err(OptError::CovarianceDimMismatch { expected: rows, found: (rows, cols) });
        }
        for ((row, col), &value) in matrix.indexed_iter() {
            if !value.is_finite() {
                return Err(OptError::NonFiniteCovariance { row, col, value });
            }
        }
        let mut matrix_nalg = DMatrix::<f64>::zeros(rows, cols);
        fill_dmatrix(&matrix, &mut matrix_nalg);
        let cholesky = matrix_nalg.cholesky().ok_or(OptError::CovarianceNotPositiveDefinite)?;
        Ok(Self { form: CovarianceForm::Full { cholesky_lower: cholesky.l() } })
    }

    /// Number of measurement points this covariance describes.
    pub fn dim(&self) -> usize {
        match &self.form {
            CovarianceForm::Diagonal { inv_std } => inv_std.len(),
            CovarianceForm::Full { cholesky_lower } => cholesky_lower.nrows(),
        }
    }

    /// Whiten a residual vector: `r ↦ L⁻¹ r`.
    ///
    /// # Errors
    /// - `OptError::CovarianceDimMismatch` if `vector` does not match
    ///   [`Covariance::dim`].
    pub fn whiten(&self, vector: &Array1<f64>) -> OptResult<Array1<f64>> {
        let dim = self.dim();
        if vector.len() != dim {
            return Err(OptError::CovarianceDimMismatch {
                expected: vector.len(),
                found: (dim, dim),
            });
        }
        match &self.form {
            CovarianceForm::Diagonal { inv_std } => Ok(vector * inv_std),
            CovarianceForm::Full { cholesky_lower } => {
                let rhs = DVector::<f64>::from_iterator(dim, vector.iter().copied());
                let solved = cholesky_lower
                    .solve_lower_triangular(&rhs)
                    .ok_or(OptError::CovarianceNotPositiveDefinite)?;
                Ok(Array1::from_iter(solved.iter().copied()))
            }
        }
    }

    /// Whiten a Jacobian block column by column: `J ↦ L⁻¹ J`.
    ///
    /// Matches [`Covariance::whiten`] exactly, so a whitened residual and a
    /// whitened Jacobian remain consistent derivatives of one another.
    ///
    /// # Errors
    /// - `OptError::CovarianceDimMismatch` if the row count does not match
    ///   [`Covariance::dim`].
    pub fn whiten_columns(&self, matrix: &Array2<f64>) -> OptResult<Array2<f64>> {
        let dim = self.dim();
        let (rows, cols) = matrix.dim();
        if rows != dim {
            return Err(OptError::CovarianceDimMismatch { expected: rows, found: (dim, dim) });
        }
        match &self.form {
            CovarianceForm::Diagonal { inv_std } => {
                let mut whitened = matrix.to_owned();
                for (i, mut row) in whitened.rows_mut().into_iter().enumerate() {
                    row *= inv_std[i];
                }
                Ok(whitened)
            }
            CovarianceForm::Full { cholesky_lower } => {
                let mut matrix_nalg = DMatrix::<f64>::zeros(rows, cols);
                fill_dmatrix(matrix, &mut matrix_nalg);
                let solved = cholesky_lower
                    .solve_lower_triangular(&matrix_nalg)
                    .ok_or(OptError::CovarianceNotPositiveDefinite)?;
                Ok(Array2::from_shape_fn((rows, cols), |(i, j)| solved[(i, j)]))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Constructor validation for both covariance forms.
    // - Hand-solved whitening for diagonal and correlated noise.
    // - The Jacobian column map and its consistency with vector whitening.
    // - The defining identity `‖whiten(r)‖² = rᵀ Σ⁻¹ r`.
    //
    // They intentionally DO NOT cover:
    // - Interaction with the solver (see the likelihood adapter tests).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Diagonal construction rejects non-positive and non-finite variances.
    //
    // Given
    // -----
    // Variance vectors holding a zero, a negative, and a NaN entry.
    //
    // Expect
    // ------
    // `InvalidVariance` pointing at the offending index each time.
    fn diagonal_rejects_bad_variances() {
        // Arrange / Act
        let zero = Covariance::diagonal(array![1.0, 0.0]);
        let negative = Covariance::diagonal(array![-2.0, 1.0]);
        let non_finite = Covariance::diagonal(array![1.0, 4.0, f64::NAN]);

        // Assert
        assert_eq!(zero.expect_err("zero"), OptError::InvalidVariance { index: 1, value: 0.0 });
        assert_eq!(
            negative.expect_err("negative"),
            OptError::InvalidVariance { index: 0, value: -2.0 }
        );
        assert!(matches!(
            non_finite.expect_err("NaN"),
            OptError::InvalidVariance { index: 2, .. }
        ));
    }

    #[test]
    // Purpose
    // -------
    // Full construction rejects non-square, non-finite, and indefinite
    // matrices.
    //
    // Given
    // -----
    // A 2x3 matrix, a matrix with an infinite entry, and the indefinite
    // matrix [[1, 2], [2, 1]] (eigenvalues 3 and -1).
    //
    // Expect
    // ------
    // The matching error for each.
    fn full_rejects_malformed_matrices() {
        // Arrange / Act
        let rect = Covariance::full(Array2::<f64>::ones((2, 3)));
        let non_finite = Covariance::full(array![[1.0, 0.0], [f64::INFINITY, 1.0]]);
        let indefinite = Covariance::full(array![[1.0, 2.0], [2.0, 1.0]]);

        // Assert
        assert_eq!(
            rect.expect_err("rectangular"),
            OptError::CovarianceDimMismatch { expected: 2, found: (2, 3) }
        );
        assert!(matches!(
            non_finite.expect_err("infinite"),
            OptError::NonFiniteCovariance { row: 1, col: 0, .. }
        ));
        assert_eq!(
            indefinite.expect_err("indefinite"),
            OptError::CovarianceNotPositiveDefinite
        );
    }

    #[test]
    // Purpose
    // -------
    // Diagonal whitening scales each entry by its inverse standard
    // deviation.
    //
    // Given
    // -----
    // Variances [4, 25] (standard deviations 2 and 5) and residual [2, 10].
    //
    // Expect
    // ------
    // Whitened residual [1, 2].
    fn diagonal_whitening_scales_by_inverse_std() {
        // Arrange
        let covariance = Covariance::diagonal(array![4.0, 25.0]).expect("ctor");

        // Act
        let whitened = covariance.whiten(&array![2.0, 10.0]).expect("whiten");

        // Assert
        assert_eq!(covariance.dim(), 2);
        assert!((whitened[0] - 1.0).abs() < 1e-12);
        assert!((whitened[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Full whitening solves the triangular system by hand correctly.
    //
    // Given
    // -----
    // Σ = [[4, 2], [2, 2]] with Cholesky factor L = [[2, 0], [1, 1]] and
    // residual [2, 3]; forward substitution gives [1, 2].
    //
    // Expect
    // ------
    // Whitened residual [1, 2], and agreement with the diagonal form on a
    // diagonal matrix.
    fn full_whitening_matches_hand_substitution() {
        // Arrange
        let correlated = Covariance::full(array![[4.0, 2.0], [2.0, 2.0]]).expect("ctor");
        let as_full = Covariance::full(array![[4.0, 0.0], [0.0, 25.0]]).expect("ctor");
        let as_diag = Covariance::diagonal(array![4.0, 25.0]).expect("ctor");

        // Act
        let whitened = correlated.whiten(&array![2.0, 3.0]).expect("whiten");
        let via_full = as_full.whiten(&array![2.0, 10.0]).expect("whiten");
        let via_diag = as_diag.whiten(&array![2.0, 10.0]).expect("whiten");

        // Assert
        assert!((whitened[0] - 1.0).abs() < 1e-12);
        assert!((whitened[1] - 2.0).abs() < 1e-12);
        for i in 0..2 {
            assert!((via_full[i] - via_diag[i]).abs() < 1e-12);
        }
    }

    #[test]
    // Purpose
    // -------
    // Whitening realizes the covariance-weighted norm.
    //
    // Given
    // -----
    // Σ = [[4, 2], [2, 2]], Σ⁻¹ = [[0.5, -0.5], [-0.5, 1.0]], r = [2, 3];
    // the quadratic form rᵀ Σ⁻¹ r evaluates to 5.
    //
    // Expect
    // ------
    // ‖whiten(r)‖² = 5.
    fn whitening_realizes_the_weighted_norm() {
        // Arrange
        let covariance = Covariance::full(array![[4.0, 2.0], [2.0, 2.0]]).expect("ctor");

        // Act
        let whitened = covariance.whiten(&array![2.0, 3.0]).expect("whiten");

        // Assert
        assert!((whitened.dot(&whitened) - 5.0).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // The column map agrees with whitening each column as a vector.
    //
    // Given
    // -----
    // Σ = [[4, 2], [2, 2]] and a 2x2 Jacobian block.
    //
    // Expect
    // ------
    // `whiten_columns` equals per-column `whiten`, and a dimension mismatch
    // is rejected.
    fn column_map_is_consistent_with_vector_whitening() {
        // Arrange
        let covariance = Covariance::full(array![[4.0, 2.0], [2.0, 2.0]]).expect("ctor");
        let jacobian = array![[2.0, 4.0], [3.0, -1.0]];

        // Act
        let whitened = covariance.whiten_columns(&jacobian).expect("columns");
        let col0 = covariance.whiten(&array![2.0, 3.0]).expect("col0");
        let col1 = covariance.whiten(&array![4.0, -1.0]).expect("col1");

        // Assert
        for i in 0..2 {
            assert!((whitened[[i, 0]] - col0[i]).abs() < 1e-12);
            assert!((whitened[[i, 1]] - col1[i]).abs() < 1e-12);
        }
        let mismatched = covariance.whiten_columns(&Array2::<f64>::zeros((3, 2)));
        assert!(matches!(mismatched, Err(OptError::CovarianceDimMismatch { .. })));
    }
}
