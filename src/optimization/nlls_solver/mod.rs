//! nlls_solver — resumable Levenberg-Marquardt for nonlinear least squares.
//!
//! Purpose
//! -------
//! Provide a high-level, damping-driven solver for **nonlinear least-squares
//! problems** `min ½ ‖r(x)‖²`. Callers implement a single trait,
//! [`ResidualModel`], wrap it in [`CachedProblem`], and drive a [`Solver`]
//! to a terminal [`Status`] with full access to the iterate history and
//! evaluation counters afterwards.
//!
//! Key behaviors
//! -------------
//! - Convert user-supplied residual models into cached, counted problems via
//!   [`problem::CachedProblem`], with a finite-difference Jacobian fallback
//!   when no analytic Jacobian is implemented.
//! - Expose a resumable driver [`solver::Solver`] that:
//!   - linearizes at the current iterate and records it in the history,
//!   - delegates step proposal and acceptance to [`step`],
//!   - solves the damped normal equations through [`kernel`], and
//!   - maps outcomes onto the [`Status`] machine.
//! - Check convergence in [`convergence`] with three independent criteria
//!   (absolute step, relative step, gradient), any one of which suffices.
//! - Centralize configuration ([`SolverConfig`], [`Tolerances`],
//!   [`DampingOptions`]) and validation logic ([`validation`]) so the solver
//!   layer can assume sane, finite inputs.
//!
//! Invariants & assumptions
//! ------------------------
//! - Cost is `½ ‖r(x)‖²` and the gradient is `Jᵀ r`; both are derived from
//!   the residual and Jacobian, never supplied independently.
//! - [`ResidualModel::residual`] must treat invalid inputs as recoverable
//!   [`OptError`](super::errors::OptError) values, not panics.
//! - Vectors and matrices use the canonical aliases [`Params`], [`Residual`],
//!   [`Jacobian`], [`Grad`] from [`types`].
//! - Configuration types are validated on construction and treated as
//!   internally consistent afterwards.
//! - History length always equals accepted steps plus one once a session has
//!   recorded its starting point; Jacobian evaluations never outnumber
//!   residual evaluations.
//!
//! Conventions
//! -----------
//! - A solve is a *session*; calling [`Solver::solve`] again resumes from
//!   the previous session's iterate, damping weight, and history.
//! - Errors bubble up as [`OptResult<T>`](super::errors::OptResult); this
//!   module and its children never intentionally panic or use `unsafe`.
//! - Trial-point failures are rejections handled by raising the damping;
//!   failures at linearization points are evaluation faults.
//!
//! Downstream usage
//! ----------------
//! - Model code implements [`ResidualModel`] for its types, then:
//!   - wraps the model and a starting point in [`CachedProblem::new`],
//!   - builds a [`Solver`] with a [`SolverConfig`], and
//!   - calls [`Solver::solve`], inspecting [`Status`] and the history.
//! - The likelihood layer (`crate::likelihood`) turns measurements with
//!   noise covariance into a [`ResidualModel`] via whitening and fits it
//!   with this solver.
//!
//! Testing notes
//! -------------
//! - Unit tests in submodules cover validation, configuration, convergence
//!   ordering, kernel fallbacks, caching and counters, damping behavior,
//!   and the status lifecycle.
//! - Integration tests drive the full stack over the classic optimization
//!   benchmarks (Rosenbrock, Powell, Meyer, ...) and assert convergence
//!   targets, evaluation budgets, and continuation semantics.
pub mod convergence;
pub mod kernel;
pub mod problem;
pub mod solver;
pub mod step;
pub mod traits;
pub mod types;
pub mod validation;
// ---- Re-exports (primary public surface) ----------------------------------
pub use self::kernel::{DenseKernel, StepKernel};
pub use self::problem::CachedProblem;
pub use self::solver::Solver;
pub use self::traits::{
    DampingOptions, NllsProblem, ResidualModel, SolverConfig, Status, Tolerances,
};
pub use self::types::{Cost, Grad, Jacobian, Params, Residual};
// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_nlls::optimization::nlls_solver::prelude::*;
//
// to import the main solver surface in a single line.
pub mod prelude {
    pub use super::kernel::{DenseKernel, StepKernel};
    pub use super::problem::CachedProblem;
    pub use super::solver::Solver;
    pub use super::traits::{
        DampingOptions, NllsProblem, ResidualModel, SolverConfig, Status, Tolerances,
    };
    pub use super::types::{Cost, Grad, Jacobian, Params, Residual};
}
