//! rust_nlls — resumable nonlinear least-squares fitting.
//!
//! Purpose
//! -------
//! Serve as the crate root for a Levenberg-Marquardt fitting stack: a
//! residual-model trait with caching and finite-difference fallbacks, a
//! damped-step solver with a status machine and per-step history, a dense
//! linear-algebra kernel with graceful rank-deficiency handling, and a
//! Gaussian maximum-likelihood front-end built on residual whitening.
//!
//! Key behaviors
//! -------------
//! - Re-export the core modules (`optimization` and `likelihood`) as the
//!   public crate surface.
//! - Keep fitting sessions resumable: a solver can run under a budget or
//!   loose tolerances, report, and continue later from the exact same
//!   state, accumulating one shared history.
//!
//! Invariants & assumptions
//! ------------------------
//! - All heavy numerical work lives in the inner modules; invariants are
//!   documented where the types are defined (`optimization::nlls_solver`,
//!   `likelihood`).
//! - Inputs are validated at construction boundaries; code past validation
//!   assumes finite, dimension-consistent data.
//!
//! Conventions
//! -----------
//! - Cost is `½ ‖r(x)‖²` throughout; gradients are `Jᵀ r`.
//! - Errors are reported via `OptResult<T>` / `OptError`; the crate never
//!   intentionally panics on data and uses no `unsafe`.
//!
//! Downstream usage
//! ----------------
//! - Plain curve fitting: implement
//!   [`ResidualModel`](optimization::nlls_solver::ResidualModel), wrap it in
//!   [`CachedProblem`](optimization::nlls_solver::CachedProblem), drive it
//!   with [`Solver`](optimization::nlls_solver::Solver).
//! - Measurement fitting under Gaussian noise: implement
//!   [`ForwardModel`](likelihood::ForwardModel) and fit a
//!   [`MaxLikelihood`](likelihood::MaxLikelihood) the same way.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each module; integration tests under `tests/`
//!   fit the classic optimization benchmarks and assert convergence
//!   targets, evaluation budgets, and continuation semantics.
pub mod likelihood;
pub mod optimization;
