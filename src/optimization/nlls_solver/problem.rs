//! Caching adapter that exposes a user `ResidualModel` as an `NllsProblem`.
//!
//! The solver queries the residual and Jacobian at the current iterate many
//! times per iteration (cost, gradient, and normal-equations assembly all
//! start from the same two quantities). `CachedProblem` evaluates the
//! underlying model at most once per iterate and replays the cached values
//! until the parameters move, so evaluation counters reflect distinct
//! linearization points rather than internal query traffic. If the model
//! does not provide an analytic Jacobian, a finite-difference Jacobian of
//! the residual closure is substituted transparently.
use std::cell::RefCell;

use crate::optimization::{
    errors::{OptError, OptResult},
    nlls_solver::{
        traits::{NllsProblem, ResidualModel},
        types::{Jacobian, Params, Residual},
        validation::{validate_jacobian, validate_params, validate_residual},
    },
};
use finitediff::FiniteDiff;

/// Bridges a user `ResidualModel` to the solver's `NllsProblem` interface.
///
/// - `residual` and `jacobian` are evaluated lazily and cached per iterate;
///   `set_parameters` invalidates both caches.
/// - `num_residual_evaluations` / `num_jacobian_evaluations` count underlying
///   model evaluations, not queries. Finite-difference probe evaluations are
///   internal to the Jacobian routine and are not counted.
/// - If the model reports `JacobianNotImplemented`, the Jacobian is computed
///   by finite differences of the residual (central first, forward retry).
#[derive(Debug, Clone)]
pub struct CachedProblem<M: ResidualModel> {
    model: M,
    params: Params,
    residual: Option<Residual>,
    jacobian: Option<Jacobian>,
    n_residual_evals: usize,
    n_jacobian_evals: usize,
}

impl<M: ResidualModel> CachedProblem<M> {
    /// Construct a caching problem over `model`, positioned at `initial`.
    ///
    /// # Errors
    /// - `EmptyParameters` if `initial` has length zero.
    /// - `ParameterDimMismatch` if `initial` disagrees with
    ///   `model.parameter_count()`.
    /// - `NonFiniteParameters` if any entry of `initial` is NaN or infinite.
    pub fn new(model: M, initial: Params) -> OptResult<Self> {
        if initial.is_empty() {
            return Err(OptError::EmptyParameters);
        }
        if initial.len() != model.parameter_count() {
            return Err(OptError::ParameterDimMismatch {
                expected: model.parameter_count(),
                found: initial.len(),
            });
        }
        validate_params(&initial)?;
        Ok(Self {
            model,
            params: initial,
            residual: None,
            jacobian: None,
            n_residual_evals: 0,
            n_jacobian_evals: 0,
        })
    }

    /// Borrow the wrapped model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Compute a finite-difference Jacobian of the residual at the current
    /// iterate.
    ///
    /// Behavior:
    /// - Try *central* differences first.
    /// - If any evaluation of the residual closure failed (captured via
    ///   `closure_err`), retry with *forward* differences.
    /// - Validate the FD Jacobian; if it fails (e.g., non-finite), retry once
    ///   with *forward* differences and validate again.
    ///
    /// Implementation notes:
    /// - The FD closure must return a plain array, so we can't use `?` inside
    ///   it; we capture the first error in `closure_err` and return a
    ///   NaN-filled residual from the closure. After FD, we turn that captured
    ///   error back into a real error (or switch to forward differences).
    ///
    /// # Errors
    /// - Propagates any error raised by residual evaluations performed during
    ///   FD.
    /// - Returns validation errors if the Jacobian has wrong dimensions or
    ///   non-finite entries.
    fn finite_difference_jacobian(&self) -> OptResult<Jacobian> {
        let rows = self.model.residual_count();
        let closure_err: RefCell<Option<OptError>> = RefCell::new(None);
        let residual_func = |params: &Params| -> Residual {
            let evaluated = self.model.residual(params).and_then(|residual| {
                validate_residual(&residual, rows)?;
                Ok(residual)
            });
            match evaluated {
                Ok(residual) => residual,
                Err(e) => {
                    let mut slot = closure_err.borrow_mut();
                    if slot.is_none() {
                        *slot = Some(e);
                    }
                    Residual::from_elem(rows, f64::NAN)
                }
            }
        };
        // `finitediff` lays the Jacobian out as (parameters x residuals);
        // reverse the axes to the crate's (residuals x parameters) convention.
        let mut fd_jacobian = self.params.central_jacobian(&residual_func).reversed_axes();
        if closure_err.borrow().is_some() {
            fd_jacobian = run_fd_jacobian(&self.params, &residual_func, &closure_err, rows)?;
            return Ok(fd_jacobian);
        }
        match validate_jacobian(&fd_jacobian, rows, self.params.len()) {
            Ok(()) => Ok(fd_jacobian),
            Err(_) => {
                fd_jacobian = run_fd_jacobian(&self.params, &residual_func, &closure_err, rows)?;
                Ok(fd_jacobian)
            }
        }
    }
}

impl<M: ResidualModel> NllsProblem for CachedProblem<M> {
    fn parameters(&self) -> &Params {
        &self.params
    }

    /// Move the iterate and invalidate both caches.
    ///
    /// # Errors
    /// - `ParameterDimMismatch` if `params` disagrees with the model.
    /// - `NonFiniteParameters` if any entry is NaN or infinite.
    fn set_parameters(&mut self, params: Params) -> OptResult<()> {
        if params.len() != self.model.parameter_count() {
            return Err(OptError::ParameterDimMismatch {
                expected: self.model.parameter_count(),
                found: params.len(),
            });
        }
        validate_params(&params)?;
        self.params = params;
        self.residual = None;
        self.jacobian = None;
        Ok(())
    }

    /// Evaluate the residual at the current iterate, or replay the cache.
    ///
    /// The model is consulted at most once per iterate; the cached value is
    /// cloned on every subsequent query. Residual values are not required to
    /// be finite here, the caller decides how to react to a non-finite cost.
    ///
    /// # Errors
    /// - Propagates model errors via `?`.
    /// - `ResidualDimMismatch` if the model output disagrees with
    ///   `residual_count()`.
    fn residual(&mut self) -> OptResult<Residual> {
        if let Some(residual) = &self.residual {
            return Ok(residual.clone());
        }
        let residual = self.model.residual(&self.params)?;
        validate_residual(&residual, self.model.residual_count())?;
        self.n_residual_evals += 1;
        self.residual = Some(residual.clone());
        Ok(residual)
    }

    /// Evaluate the Jacobian at the current iterate, or replay the cache.
    ///
    /// Uses the model's analytic Jacobian when implemented; otherwise falls
    /// back to finite differences of the residual. Either way the result is
    /// validated for shape and finiteness before it is cached.
    ///
    /// # Errors
    /// - Propagates model errors other than `JacobianNotImplemented` via `?`.
    /// - `JacobianDimMismatch` / `NonFiniteJacobian` from validation.
    fn jacobian(&mut self) -> OptResult<Jacobian> {
        if let Some(jacobian) = &self.jacobian {
            return Ok(jacobian.clone());
        }
        let rows = self.model.residual_count();
        let cols = self.model.parameter_count();
        let jacobian = match self.model.jacobian(&self.params) {
            Ok(jacobian) => {
                validate_jacobian(&jacobian, rows, cols)?;
                jacobian
            }
            Err(OptError::JacobianNotImplemented) => self.finite_difference_jacobian()?,
            Err(e) => return Err(e),
        };
        self.n_jacobian_evals += 1;
        self.jacobian = Some(jacobian.clone());
        Ok(jacobian)
    }

    fn num_residual_evaluations(&self) -> usize {
        self.n_residual_evals
    }

    fn num_jacobian_evaluations(&self) -> usize {
        self.n_jacobian_evals
    }
}

/// Compute a forward-difference Jacobian of `func` at `params`, with error
/// capture.
///
/// The FD closure can't return `Result`, so any error raised by `func` is
/// stored into `closure_err` and the closure returns a NaN-filled residual.
/// This helper:
/// - clears `closure_err`,
/// - performs `forward_jacobian`,
/// - if an error was captured, returns it as `Err`,
/// - validates the resulting Jacobian,
/// - if validation succeeds, returns the Jacobian as `Ok(jacobian)`.
///
/// # Errors
/// Returns any error captured during evaluation of `func` inside the FD
/// routine or by validation of the resulting Jacobian.
fn run_fd_jacobian<G: Fn(&Params) -> Residual>(
    params: &Params, func: &G, closure_err: &RefCell<Option<OptError>>, rows: usize,
) -> OptResult<Jacobian> {
    closure_err.replace(None);
    // `finitediff` lays the Jacobian out as (parameters x residuals);
    // reverse the axes to the crate's (residuals x parameters) convention.
    let fd_jacobian = params.forward_jacobian(func).reversed_axes();
    if let Some(err) = closure_err.take() {
        return Err(err);
    }
    validate_jacobian(&fd_jacobian, rows, params.len())?;
    Ok(fd_jacobian)
}
