//! nlls_solver::validation — input checks shared across the solver stack.
//!
//! Small, order-sensitive validators: each reports the first offending
//! field, index, or entry through a dedicated [`OptError`] variant so the
//! caller can surface precise diagnostics. Constructors and the cached
//! problem call these before trusting any user-supplied value.
use ndarray::Array1;

use crate::optimization::errors::{OptError, OptResult};
use crate::optimization::nlls_solver::types::{Jacobian, Params, Residual};

/// Verifies that a convergence tolerance is usable.
///
/// # Rules
/// - Must be finite.
/// - Must be non-negative; zero disables the criterion it feeds.
///
/// # Errors
/// Returns `OptError::InvalidTolerance` naming the offending field, with
/// the finiteness check applied first.
pub fn verify_tolerance(name: &'static str, value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::InvalidTolerance { name, value, reason: "tolerance must be finite" });
    }
    if value < 0.0 {
        return Err(OptError::InvalidTolerance {
            name,
            value,
            reason: "tolerance must be non-negative",
        });
    }
    Ok(())
}

/// Validates a parameter vector entry by entry.
///
/// # Errors
/// Returns `OptError::NonFiniteParameters` for the first non-finite entry.
pub fn validate_params(params: &Params) -> OptResult<()> {
    for (index, &value) in params.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::NonFiniteParameters { index, value });
        }
    }
    Ok(())
}

/// Validates a residual vector's length against the model's declared count.
///
/// # Errors
/// Returns `OptError::ResidualDimMismatch` when the lengths differ.
pub fn validate_residual(residual: &Residual, expected: usize) -> OptResult<()> {
    if residual.len() != expected {
        return Err(OptError::ResidualDimMismatch { expected, found: residual.len() });
    }
    Ok(())
}

/// Validates a Jacobian's shape against the model's declared counts.
///
/// # Errors
/// Returns `OptError::JacobianDimMismatch` when the shapes differ.
pub fn validate_jacobian_shape(jacobian: &Jacobian, rows: usize, cols: usize) -> OptResult<()> {
    if jacobian.nrows() != rows || jacobian.ncols() != cols {
        return Err(OptError::JacobianDimMismatch {
            expected: (rows, cols),
            found: (jacobian.nrows(), jacobian.ncols()),
        });
    }
    Ok(())
}

/// Validates a Jacobian's shape and entries.
///
/// # Behavior
/// Checks the shape first, then scans for the first non-finite entry.
/// Used on finite-difference output, where a single failed probe shows up
/// as a poisoned entry rather than an error.
pub fn validate_jacobian(jacobian: &Jacobian, rows: usize, cols: usize) -> OptResult<()> {
    validate_jacobian_shape(jacobian, rows, cols)?;
    for ((row, col), &value) in jacobian.indexed_iter() {
        if !value.is_finite() {
            return Err(OptError::NonFiniteJacobian { row, col, value });
        }
    }
    Ok(())
}

/// Euclidean norm, the length measure behind every convergence criterion.
pub(crate) fn l2_norm(v: &Array1<f64>) -> f64 {
    v.dot(v).sqrt()
}
