//! nlls_solver::types — shared numeric aliases and solver constants.
//!
//! Purpose
//! -------
//! Centralize the core numeric types used by the nonlinear least-squares
//! solver. By defining these in one place, the rest of the optimization
//! code can stay agnostic to `ndarray` and can more easily evolve if the
//! backend changes.
//!
//! Key behaviors
//! -------------
//! - Define canonical aliases for parameter vectors, residual vectors,
//!   Jacobians, gradients, normal matrices, and scalar costs (`Params`,
//!   `Residual`, `Jacobian`, `Grad`, `Hessian`, `Cost`).
//! - Expose the default Levenberg-Marquardt damping schedule constants
//!   used by [`DampingOptions::default`](super::traits::DampingOptions).
//!
//! Invariants & assumptions
//! ------------------------
//! - All solver vectors and matrices are represented as `ndarray`
//!   containers over `f64`.
//! - `Cost` is always the scalar `0.5 * ||r||²` for a residual vector `r`;
//!   no sign flips happen anywhere in the solver stack.
//!
//! Conventions
//! -----------
//! - `Params` and `Grad` are treated conceptually as column vectors with
//!   length equal to the number of free parameters.
//! - `Residual` has one entry per residual component; `Jacobian` is dense
//!   with shape `residual.len() × params.len()`.
//! - `Hessian` names the dense square Gauss-Newton normal matrix
//!   `Jᵀ J` (possibly damped), with dimension `params.len() × params.len()`.
//!
//! Downstream usage
//! ----------------
//! - Other solver modules import these aliases instead of referring
//!   directly to `ndarray` generics.
//! - High-level APIs use [`Params`] and [`Grad`] as the standard parameter
//!   and gradient types when implementing residual models.
//!
//! Testing notes
//! -------------
//! - This module only defines type aliases and constants; there are no
//!   dedicated unit tests.
//! - Correctness is exercised indirectly by tests in the surrounding
//!   solver modules that operate on these aliases.
use ndarray::{Array1, Array2};

/// Parameter vector `x` for nonlinear least-squares problems.
///
/// Alias for `ndarray::Array1<f64>`, used as the canonical parameter type
/// throughout the solver.
pub type Params = Array1<f64>;

/// Residual vector `r(x)` of a least-squares problem.
///
/// Alias for `ndarray::Array1<f64>`; one entry per residual component.
pub type Residual = Array1<f64>;

/// Dense Jacobian matrix `∂r/∂x`.
///
/// Alias for `ndarray::Array2<f64>`; rows index residual components,
/// columns index parameters.
pub type Jacobian = Array2<f64>;

/// Gradient vector `∇c(x) = Jᵀ r` of the least-squares cost.
///
/// Alias for `ndarray::Array1<f64>`, matching the shape of `Params`.
pub type Grad = Array1<f64>;

/// Dense (possibly damped) Gauss-Newton normal matrix `Jᵀ J`.
///
/// Alias for `ndarray::Array2<f64>`; `n × n` for `n = Params.len()`.
pub type Hessian = Array2<f64>;

/// Scalar objective value `c(x) = 0.5 * ||r(x)||²`.
pub type Cost = f64;

/// Default initial Levenberg-Marquardt damping weight.
pub const DEFAULT_DAMPING: f64 = 1e-3;

/// Default multiplicative damping increase applied after a rejected step.
pub const DEFAULT_DAMPING_INCREASE: f64 = 10.0;

/// Default multiplicative damping decrease applied after an accepted step.
pub const DEFAULT_DAMPING_DECREASE: f64 = 0.1;

/// Default cap on consecutive rejected trial steps within one iteration.
pub const DEFAULT_MAX_REJECTIONS: usize = 20;

/// Lower bound kept on the damping weight so it can always recover by
/// multiplication after a long run of accepted steps.
pub const DAMPING_FLOOR: f64 = 1e-12;

/// Floor applied to the `Jᵀ J` diagonal when building the Marquardt
/// scaling, so parameters with a vanishing column still receive damping.
pub const DAMPING_SCALE_FLOOR: f64 = 1e-12;
