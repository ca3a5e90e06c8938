//! nlls_solver::solver — resumable Levenberg-Marquardt driver.
//!
//! Purpose
//! -------
//! Own a nonlinear least-squares problem and iterate it to a terminal
//! status, keeping a cumulative record of every accepted iterate. The
//! solver is resumable: calling [`Solver::solve`] again continues from the
//! exact iterate, damping weight, and history the previous session ended
//! with, so a fit can be tightened, budgeted, or inspected in stages.
//!
//! Key behaviors
//! -------------
//! - Linearize at the session-start iterate, record it as the first history
//!   entry if the history is empty, and succeed immediately when the
//!   gradient criterion already holds (so a fit that ended on the gradient
//!   criterion resumes as a cheap no-op).
//! - Run up to `max_iterations` accepted steps per session, recording
//!   parameters, cost, and gradient after each acceptance and checking the
//!   convergence criteria on the fresh linearization.
//! - Map step-engine outcomes onto statuses: a stalled step is a success
//!   (the iterate cannot move by a tolerable amount anymore), an exhausted
//!   rejection budget is a numerical degeneracy, and a session that uses up
//!   its iteration budget reports `ExceededIterations` and may be resumed.
//! - Convert evaluation failures and non-finite values at linearization
//!   points into `Status::EvaluationFault` instead of propagating them;
//!   history keeps everything recorded up to the fault.
//!
//! Invariants & assumptions
//! ------------------------
//! - `cost_history().len() == num_accepted_steps() + 1` whenever at least
//!   one session has recorded its starting point; the three history vectors
//!   always share one length.
//! - The number of Jacobian evaluations never exceeds the number of
//!   residual evaluations: Jacobians are only requested at iterates whose
//!   residual has already been evaluated, and rejected trials evaluate the
//!   residual alone.
//! - The history is append-only across sessions; no entry is ever revised.
//!
//! Conventions
//! -----------
//! - Cost is `½ ‖r(x)‖²`; gradient is `Jᵀ r`; all norms are Euclidean.
//! - Accessors are read-only and may be called in any state, including
//!   before the first solve and after a fault.
//! - With `verbose` set, per-iteration progress goes to stderr.
//!
//! Downstream usage
//! ----------------
//! - Wrap a [`ResidualModel`](super::traits::ResidualModel) in
//!   [`CachedProblem`](super::problem::CachedProblem) and hand it to
//!   [`Solver::new`]; use [`Solver::with_kernel`] to swap the
//!   linear-algebra backend.
//! - The likelihood layer builds its fits on this type; see the crate-level
//!   maximum-likelihood adapter.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the status lifecycle, history bookkeeping, resumable
//!   sessions, evaluation faults, and the empty-parameters precondition.
//! - Integration tests drive the solver across the classic optimization
//!   benchmarks and assert evaluation budgets and continuation behavior.
use crate::optimization::{
    errors::{OptError, OptResult},
    nlls_solver::{
        convergence::ConvergenceCheck,
        kernel::{DenseKernel, StepKernel},
        step::{StepEngine, StepOutcome},
        traits::{NllsProblem, SolverConfig, Status},
        types::{Cost, Grad, Params},
        validation::l2_norm,
    },
};

/// Resumable Levenberg-Marquardt solver over an [`NllsProblem`].
///
/// The solver owns the problem for its whole lifetime so that caches,
/// evaluation counters, damping state, and history stay consistent across
/// sessions. Extract the problem back with [`Solver::into_problem`] once
/// fitting is done.
#[derive(Debug, Clone)]
pub struct Solver<P: NllsProblem, K: StepKernel = DenseKernel> {
    problem: P,
    config: SolverConfig,
    kernel: K,
    engine: StepEngine,
    status: Status,
    history_params: Vec<Params>,
    history_cost: Vec<Cost>,
    history_grad: Vec<Grad>,
}

impl<P: NllsProblem> Solver<P, DenseKernel> {
    /// Construct a solver with the default dense linear-algebra backend.
    pub fn new(problem: P, config: SolverConfig) -> Self {
        Self::with_kernel(problem, config, DenseKernel)
    }
}

impl<P: NllsProblem, K: StepKernel> Solver<P, K> {
    /// Construct a solver with an explicit linear-algebra backend.
    pub fn with_kernel(problem: P, config: SolverConfig, kernel: K) -> Self {
        Self {
            engine: StepEngine::new(config.damping),
            problem,
            config,
            kernel,
            status: Status::Untried,
            history_params: Vec::new(),
            history_cost: Vec::new(),
            history_grad: Vec::new(),
        }
    }

    /// solve — run one solve session to a terminal status.
    ///
    /// Purpose
    /// -------
    /// Iterate damped steps from the current iterate until a convergence
    /// criterion fires, the iteration budget runs out, or the problem
    /// defeats the numerics. Calling `solve` again after it returns resumes
    /// from the exact state the previous session left behind: the same
    /// iterate, the same damping weight, and a history that keeps growing
    /// instead of restarting. No model evaluation is repeated at the seam
    /// between sessions.
    ///
    /// Returns
    /// -------
    /// `OptResult<Status>`
    ///   The terminal status of this session, also readable afterwards via
    ///   [`Solver::status`]:
    ///   - `Success`: a step or gradient criterion fired, or the latest
    ///     rejected step was already below the step tolerances.
    ///   - `ExceededIterations`: `max_iterations` steps were accepted
    ///     without convergence; resume by calling `solve` again.
    ///   - `NumericalDegeneracy`: `max_rejections` consecutive trial steps
    ///     failed to lower the cost.
    ///   - `EvaluationFault`: the model failed or produced a non-finite
    ///     value at a linearization point.
    ///
    /// Errors
    /// ------
    /// - `OptError::EmptyParameters` if the problem holds a zero-length
    ///   parameter vector; the session does not start and the status is
    ///   left untouched.
    ///
    /// Notes
    /// -----
    /// - Evaluation errors raised mid-session are converted into
    ///   `Status::EvaluationFault` rather than returned as `Err`, so the
    ///   history recorded up to the fault stays accessible.
    ///
    /// Examples
    /// --------
    /// ```rust
    /// # use ndarray::array;
    /// # use rust_nlls::optimization::errors::OptResult;
    /// # use rust_nlls::optimization::nlls_solver::problem::CachedProblem;
    /// # use rust_nlls::optimization::nlls_solver::solver::Solver;
    /// # use rust_nlls::optimization::nlls_solver::traits::{
    /// #     ResidualModel, SolverConfig, Status,
    /// # };
    /// # use rust_nlls::optimization::nlls_solver::types::{Jacobian, Params, Residual};
    /// struct Line;
    ///
    /// impl ResidualModel for Line {
    ///     fn parameter_count(&self) -> usize {
    ///         1
    ///     }
    ///     fn residual_count(&self) -> usize {
    ///         2
    ///     }
    ///     fn residual(&self, params: &Params) -> OptResult<Residual> {
    ///         Ok(array![params[0] - 1.0, 2.0 * (params[0] - 1.0)])
    ///     }
    ///     fn jacobian(&self, _params: &Params) -> OptResult<Jacobian> {
    ///         Ok(array![[1.0], [2.0]])
    ///     }
    /// }
    ///
    /// # fn main() -> OptResult<()> {
    /// let problem = CachedProblem::new(Line, array![5.0])?;
    /// let mut solver = Solver::new(problem, SolverConfig::default());
    /// let status = solver.solve()?;
    /// assert_eq!(status, Status::Success);
    /// assert!((solver.parameters()[0] - 1.0).abs() < 1e-6);
    /// # Ok(())
    /// # }
    /// ```
    pub fn solve(&mut self) -> OptResult<Status> {
        if self.problem.parameters().is_empty() {
            return Err(OptError::EmptyParameters);
        }
        self.status = Status::Continue;
        self.status = match self.run_session() {
            Ok(status) => status,
            Err(e) => {
                if self.config.verbose {
                    eprintln!("nlls: evaluation fault: {e}");
                }
                Status::EvaluationFault
            }
        };
        Ok(self.status)
    }

    /// Status reported by the most recent session, or `Untried`.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Human-readable label for the current status.
    pub fn status_str(&self) -> &'static str {
        self.status.as_str()
    }

    /// Current iterate.
    pub fn parameters(&self) -> &Params {
        self.problem.parameters()
    }

    /// Accepted iterates in order, starting with the initial point.
    pub fn parameter_history(&self) -> &[Params] {
        &self.history_params
    }

    /// Cost at each accepted iterate, aligned with `parameter_history`.
    pub fn cost_history(&self) -> &[Cost] {
        &self.history_cost
    }

    /// Gradient at each accepted iterate, aligned with `parameter_history`.
    pub fn gradient_history(&self) -> &[Grad] {
        &self.history_grad
    }

    /// Number of accepted steps across all sessions so far.
    ///
    /// The history holds one entry per accepted step plus the initial
    /// point, so this is `cost_history().len() - 1`, saturating at zero
    /// while the history is still empty.
    pub fn num_accepted_steps(&self) -> usize {
        self.history_cost.len().saturating_sub(1)
    }

    /// Residual evaluations performed by the underlying problem.
    pub fn num_residual_evaluations(&self) -> usize {
        self.problem.num_residual_evaluations()
    }

    /// Jacobian evaluations performed by the underlying problem.
    pub fn num_jacobian_evaluations(&self) -> usize {
        self.problem.num_jacobian_evaluations()
    }

    /// Current damping weight; persists across sessions.
    pub fn damping(&self) -> f64 {
        self.engine.lambda()
    }

    /// Configuration currently in force.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Replace the configuration for subsequent sessions.
    ///
    /// Continuation workflows solve once with loose tolerances or a small
    /// iteration budget, then tighten and resume. The damping weight carried
    /// over from earlier sessions is preserved; the damping schedule itself
    /// (increase, decrease, rejection budget) switches to the new options.
    pub fn set_config(&mut self, config: SolverConfig) {
        self.engine.set_options(config.damping);
        self.config = config;
    }

    /// Borrow the underlying problem.
    pub fn problem(&self) -> &P {
        &self.problem
    }

    /// Consume the solver and return the underlying problem.
    pub fn into_problem(self) -> P {
        self.problem
    }

    /// One solve session: from the current iterate to a terminal status.
    ///
    /// Evaluation errors propagate via `?` and are converted to
    /// `Status::EvaluationFault` by the caller; non-finite values at
    /// linearization points are converted here so the distinction stays in
    /// one place.
    fn run_session(&mut self) -> OptResult<Status> {
        let check = ConvergenceCheck::new(self.config.tols);
        let cost = self.problem.cost()?;
        let gradient = self.problem.gradient()?;
        if !cost.is_finite() || gradient.iter().any(|v| !v.is_finite()) {
            if self.config.verbose {
                eprintln!("nlls: non-finite cost or gradient at the starting iterate");
            }
            return Ok(Status::EvaluationFault);
        }
        if self.history_cost.is_empty() {
            self.record(cost, gradient.clone());
        }
        let grad_norm = l2_norm(&gradient);
        if self.config.verbose {
            eprintln!(
                "nlls: start: cost = {:.6e}, |grad| = {:.3e}, lambda = {:.3e}",
                cost,
                grad_norm,
                self.engine.lambda()
            );
        }
        if let Some(reason) = check.gradient_converged(grad_norm) {
            if self.config.verbose {
                eprintln!("nlls: converged at session start: {}", reason.as_str());
            }
            return Ok(Status::Success);
        }
        for _ in 0..self.config.max_iterations {
            match self.engine.advance(&self.kernel, &mut self.problem, &check)? {
                StepOutcome::Accepted { step_norm } => {
                    let cost = self.problem.cost()?;
                    let gradient = self.problem.gradient()?;
                    if !cost.is_finite() || gradient.iter().any(|v| !v.is_finite()) {
                        if self.config.verbose {
                            eprintln!("nlls: non-finite cost or gradient at the accepted iterate");
                        }
                        return Ok(Status::EvaluationFault);
                    }
                    let grad_norm = l2_norm(&gradient);
                    let param_norm = l2_norm(self.problem.parameters());
                    self.record(cost, gradient);
                    if self.config.verbose {
                        eprintln!(
                            "nlls: step {}: cost = {:.6e}, |step| = {:.3e}, |grad| = {:.3e}, lambda = {:.3e}",
                            self.num_accepted_steps(),
                            cost,
                            step_norm,
                            grad_norm,
                            self.engine.lambda()
                        );
                    }
                    if let Some(reason) = check.converged(step_norm, param_norm, grad_norm) {
                        if self.config.verbose {
                            eprintln!("nlls: converged: {}", reason.as_str());
                        }
                        return Ok(Status::Success);
                    }
                }
                StepOutcome::Stalled { step_norm } => {
                    if self.config.verbose {
                        eprintln!(
                            "nlls: converged: rejected step stalled below tolerance, |step| = {step_norm:.3e}"
                        );
                    }
                    return Ok(Status::Success);
                }
                StepOutcome::Exhausted => {
                    if self.config.verbose {
                        eprintln!(
                            "nlls: giving up after {} consecutive rejections",
                            self.config.damping.max_rejections
                        );
                    }
                    return Ok(Status::NumericalDegeneracy);
                }
            }
        }
        if self.config.verbose {
            eprintln!(
                "nlls: iteration budget exhausted at {} accepted steps",
                self.num_accepted_steps()
            );
        }
        Ok(Status::ExceededIterations)
    }

    /// Append the current iterate to the history.
    fn record(&mut self, cost: Cost, gradient: Grad) {
        self.history_params.push(self.problem.parameters().clone());
        self.history_cost.push(cost);
        self.history_grad.push(gradient);
    }
}
