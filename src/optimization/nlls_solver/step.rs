//! nlls_solver::step — damped-step proposal and acceptance logic.
//!
//! Purpose
//! -------
//! Drive one outer iteration of the Levenberg-Marquardt method: assemble the
//! damped normal equations at the current iterate, propose a trial step
//! through the linear-algebra kernel, and accept or reject it by comparing
//! the realized cost reduction against the reduction predicted by the local
//! quadratic model. The damping weight is the engine's only persistent
//! state, and it carries across iterations and across solver sessions.
//!
//! Key behaviors
//! -------------
//! - Scale the damping per coordinate by the diagonal of `Jᵀ J` (Marquardt
//!   scaling), floored at [`DAMPING_SCALE_FLOOR`] so flat coordinates stay
//!   regularized.
//! - Accept a trial step exactly when the gain ratio
//!   `ρ = (realized reduction) / (predicted reduction)` is positive; the
//!   predicted reduction `½ δᵀ (λ D δ - g)` is strictly positive whenever
//!   the kernel returns a solution of the damped system.
//! - On acceptance, multiply the damping by the decrease factor and floor it
//!   at [`DAMPING_FLOOR`]; on rejection, multiply by the increase factor and
//!   retry from the same iterate.
//! - Treat a singular system, a non-finite step, a non-finite trial point,
//!   and a failed or non-finite trial cost all as rejections rather than
//!   faults; raising the damping shortens the step and usually restores
//!   solvability.
//! - Give up after `max_rejections` consecutive rejections and report the
//!   iterate as numerically stuck.
//! - Report a stall when a rejected step is already below the step
//!   tolerances; no admissible progress remains at this scale.
//!
//! Invariants & assumptions
//! ------------------------
//! - The problem's cached cost, gradient, and Jacobian at the current
//!   iterate are finite; the solver checks this before every call.
//! - On any outcome except acceptance, the problem is left positioned at the
//!   iterate it started from.
//! - On acceptance, the problem is left positioned at the trial point with
//!   its residual (hence cost) already cached there.
//!
//! Conventions
//! -----------
//! - The right-hand side of the damped system is `-g`, so the kernel's
//!   solution is the step itself, not its negation.
//! - Errors from trial-point evaluation are swallowed as rejections; errors
//!   from repositioning the iterate propagate via [`OptResult<T>`].
//!
//! Downstream usage
//! ----------------
//! - [`Solver`](super::solver::Solver) calls [`StepEngine::advance`] once
//!   per iteration and maps [`StepOutcome`] onto status transitions.
//!
//! Testing notes
//! -------------
//! - Unit tests cover acceptance on a well-behaved model, the damping floor,
//!   rejection exhaustion on a trial-hostile model, and stall detection on a
//!   model whose admissible steps are below tolerance.
//! - Benchmark-level behavior is exercised by the solver integration tests.
use ndarray::Array1;

use crate::optimization::{
    errors::{OptError, OptResult},
    nlls_solver::{
        convergence::ConvergenceCheck,
        kernel::StepKernel,
        traits::{DampingOptions, NllsProblem},
        types::{Grad, Params, DAMPING_FLOOR, DAMPING_SCALE_FLOOR},
        validation::l2_norm,
    },
};

/// Result of one call to [`StepEngine::advance`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// A trial step lowered the cost; the problem now sits at the new
    /// iterate and `step_norm` is the length of the move.
    Accepted { step_norm: f64 },
    /// The latest rejected step was already below the step tolerances; the
    /// iterate cannot move by an acceptable amount anymore.
    Stalled { step_norm: f64 },
    /// `max_rejections` consecutive trials failed to lower the cost.
    Exhausted,
}

/// Proposes damped steps and adapts the damping weight between calls.
#[derive(Debug, Clone)]
pub struct StepEngine {
    opts: DampingOptions,
    lambda: f64,
}

impl StepEngine {
    /// Construct an engine with the damping weight at `opts.initial`.
    pub fn new(opts: DampingOptions) -> Self {
        Self { opts, lambda: opts.initial }
    }

    /// Current damping weight.
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Swap the damping schedule; the current weight is kept so resumed
    /// sessions continue where they left off.
    pub fn set_options(&mut self, opts: DampingOptions) {
        self.opts = opts;
    }

    /// Attempt one accepted step from the problem's current iterate.
    ///
    /// Assembles `Jᵀ J` and the Marquardt scale once, then retries the
    /// damped solve with growing damping until a trial point lowers the
    /// cost, a rejected step falls below the step tolerances, or the
    /// rejection budget runs out.
    ///
    /// # Errors
    /// - Propagates evaluation errors raised at the current iterate.
    /// - Propagates errors from repositioning the problem; trial-point
    ///   evaluation failures are treated as rejections instead.
    pub fn advance<K: StepKernel, P: NllsProblem>(
        &mut self, kernel: &K, problem: &mut P, check: &ConvergenceCheck,
    ) -> OptResult<StepOutcome> {
        let current = problem.parameters().clone();
        let current_cost = problem.cost()?;
        let gradient = problem.gradient()?;
        let jacobian = problem.jacobian()?;
        let jtj = jacobian.t().dot(&jacobian);
        let n = current.len();
        let mut scale = Array1::<f64>::zeros(n);
        for j in 0..n {
            scale[j] = jtj[[j, j]].max(DAMPING_SCALE_FLOOR);
        }
        let rhs = gradient.mapv(|g| -g);
        for _ in 0..self.opts.max_rejections {
            let mut system = jtj.clone();
            for j in 0..n {
                system[[j, j]] += self.lambda * scale[j];
            }
            let step = match kernel.solve(&system, &rhs) {
                Ok(step) => {
                    if step.iter().all(|v| v.is_finite()) {
                        step
                    } else {
                        self.raise_damping();
                        continue;
                    }
                }
                Err(OptError::SingularNormalEquations) => {
                    self.raise_damping();
                    continue;
                }
                Err(e) => return Err(e),
            };
            let trial = &current + &step;
            if trial.iter().any(|v| !v.is_finite()) {
                self.raise_damping();
                continue;
            }
            problem.set_parameters(trial)?;
            let trial_cost = match problem.cost() {
                Ok(cost) if cost.is_finite() => Some(cost),
                _ => None,
            };
            match trial_cost {
                Some(cost) => {
                    let predicted = predicted_reduction(&step, &gradient, &scale, self.lambda);
                    let rho = (current_cost - cost) / predicted;
                    if rho > 0.0 {
                        self.lower_damping();
                        return Ok(StepOutcome::Accepted { step_norm: l2_norm(&step) });
                    }
                    problem.set_parameters(current.clone())?;
                    let step_norm = l2_norm(&step);
                    if check.step_within(step_norm, l2_norm(&current)).is_some() {
                        return Ok(StepOutcome::Stalled { step_norm });
                    }
                    self.raise_damping();
                }
                None => {
                    problem.set_parameters(current.clone())?;
                    self.raise_damping();
                }
            }
        }
        Ok(StepOutcome::Exhausted)
    }

    fn raise_damping(&mut self) {
        self.lambda *= self.opts.increase;
    }

    fn lower_damping(&mut self) {
        self.lambda = (self.lambda * self.opts.decrease).max(DAMPING_FLOOR);
    }
}

/// Reduction in cost promised by the local quadratic model for step `step`.
///
/// Evaluates `½ Σ_j step_j (λ scale_j step_j - gradient_j)`. Because the
/// step solves `(Jᵀ J + λ D) step = -gradient`, both summand groups are
/// non-negative and the total is strictly positive for a nonzero step, so
/// the gain ratio never divides by zero.
fn predicted_reduction(step: &Params, gradient: &Grad, scale: &Array1<f64>, lambda: f64) -> f64 {
    let mut total = 0.0;
    for j in 0..step.len() {
        total += step[j] * (lambda * scale[j] * step[j] - gradient[j]);
    }
    0.5 * total
}
