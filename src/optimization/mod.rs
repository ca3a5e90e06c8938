//! optimization — nonlinear least-squares stack and unified error surface.
//!
//! Purpose
//! -------
//! Provide a cohesive optimization layer for curve fitting, combining a
//! resumable Levenberg-Marquardt solver with a single error/result surface.
//! Callers implement a residual model, choose tolerances, and obtain fitted
//! parameters, a status, and per-step diagnostics without touching the
//! linear-algebra backend.
//!
//! Key behaviors
//! -------------
//! - Expose a high-level API for **minimizing sums of squared residuals**
//!   `½ ‖r(x)‖²` (`nlls_solver`), including configuration of damping
//!   schedules and stopping criteria.
//! - Normalize configuration issues, model failures, and backend kernel
//!   errors into a single enum (`errors::OptError`) with a common result
//!   alias (`OptResult<T>`).
//!
//! Invariants & assumptions
//! ------------------------
//! - The solver operates on finite parameter vectors; invalid states are
//!   reported as `OptError`, not panics.
//! - Residual models are expected to treat domain violations (e.g. negative
//!   arguments to a log, out-of-range exponents) as recoverable errors
//!   surfaced through the optimization layer.
//! - Dimension and finiteness checks are enforced via shared validation, so
//!   downstream code can assume that accepted inputs satisfy basic
//!   constraints.
//!
//! Conventions
//! -----------
//! - All fitting minimizes the least-squares cost; maximum-likelihood
//!   front-ends reduce to it by whitening residuals (see
//!   `crate::likelihood`).
//! - Errors bubble up as `OptResult<T>`; this module and its children never
//!   intentionally panic or use `unsafe`.
//!
//! Downstream usage
//! ----------------
//! - Implement [`nlls_solver::ResidualModel`], wrap it in
//!   [`nlls_solver::CachedProblem`], and fit with [`nlls_solver::Solver`].
//! - Import the whole surface at once through [`prelude`].
//!
//! Testing notes
//! -------------
//! - Each submodule carries unit tests next to the code; crate-level
//!   integration tests exercise the public surface end to end.
pub mod errors;
pub mod nlls_solver;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_nlls::optimization::prelude::*;
//
// to import the optimization surface in a single line.
pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::nlls_solver::prelude::*;
}
