//! likelihood — Gaussian maximum-likelihood front-end for the solver.
//!
//! Purpose
//! -------
//! Fit deterministic forward models to noisy measurements. Under Gaussian
//! noise, maximizing the likelihood is equivalent to minimizing the
//! covariance-weighted misfit `½ (f(x) - y)ᵀ Σ⁻¹ (f(x) - y)`; this layer
//! reduces that problem to plain least squares by whitening, so the
//! `optimization` stack applies without weighted-solver special cases.
//!
//! Key behaviors
//! -------------
//! - Describe measurement noise with [`Covariance`]: independent per-point
//!   variances or a full correlated matrix, factored once at construction.
//! - Wrap a [`ForwardModel`] plus measurement into [`MaxLikelihood`], a
//!   [`ResidualModel`](crate::optimization::nlls_solver::ResidualModel)
//!   whose residual and Jacobian are whitened consistently.
//!
//! Invariants & assumptions
//! ------------------------
//! - Measurements, variances, and covariance matrices are validated on
//!   construction; downstream code assumes finite, dimension-consistent
//!   inputs.
//! - Whitening uses the lower Cholesky factor; residual and Jacobian go
//!   through the same factor so derivatives stay consistent.
//!
//! Conventions
//! -----------
//! - The misfit orientation is `prediction - measurement`.
//! - Errors bubble up as [`OptResult<T>`](crate::optimization::errors::OptResult).
//!
//! Downstream usage
//! ----------------
//! - Implement [`ForwardModel`] for the physics or curve family, build a
//!   [`MaxLikelihood`] with the data and noise description, wrap it in
//!   [`CachedProblem`](crate::optimization::nlls_solver::CachedProblem), and
//!   fit with [`Solver`](crate::optimization::nlls_solver::Solver).
//!
//! Testing notes
//! -------------
//! - Unit tests cover whitening arithmetic and adapter validation;
//!   integration tests check that unit-covariance fits match plain
//!   least-squares runs point for point.
pub mod adapter;
pub mod covariance;
// ---- Re-exports (primary public surface) ----------------------------------
pub use self::adapter::{ForwardModel, MaxLikelihood};
pub use self::covariance::Covariance;
// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_nlls::likelihood::prelude::*;
//
// to import the likelihood surface in a single line.
pub mod prelude {
    pub use super::adapter::{ForwardModel, MaxLikelihood};
    pub use super::covariance::Covariance;
}
