//! Public API surface for nonlinear least-squares solving.
//!
//! - [`ResidualModel`]: trait users implement for their model.
//! - [`NllsProblem`]: the stateful, evaluation-counting problem interface the
//!   solver drives (see [`CachedProblem`](super::problem::CachedProblem) for
//!   the standard implementation).
//! - [`SolverConfig`], [`Tolerances`], and [`DampingOptions`]: configuration
//!   for the solver.
//! - [`Status`]: closed set of solver states, one of which is always current.
//!
//! Convention: we *minimize* the cost `c(x) = 0.5 * ||r(x)||²` for a residual
//! vector `r(x)`. If an analytic Jacobian is provided, it must be the Jacobian
//! of the residual (`∂r/∂x`, rows over residual components); the gradient
//! `Jᵀ r` is derived from it.
use crate::optimization::{
    errors::{OptError, OptResult},
    nlls_solver::{
        types::{
            Cost, Grad, Jacobian, Params, Residual, DEFAULT_DAMPING, DEFAULT_DAMPING_DECREASE,
            DEFAULT_DAMPING_INCREASE, DEFAULT_MAX_REJECTIONS,
        },
        validation::verify_tolerance,
    },
};

/// User-implemented residual model interface.
///
/// A model maps a parameter vector `x` to a residual vector `r(x)`; the
/// solver minimizes `0.5 * ||r(x)||²`.
///
/// Required:
/// - `parameter_count() -> usize`: number of free parameters `n`.
/// - `residual_count() -> usize`: number of residual components `m`.
/// - `residual(&Params) -> OptResult<Residual>`: evaluate `r(x)`, length `m`.
///   - Errors: return a descriptive `OptError` for invalid inputs or model
///     failures.
///
/// Optional:
/// - `jacobian(&Params) -> OptResult<Jacobian>`: analytic Jacobian `∂r/∂x`,
///   shape `m × n`. If not implemented, robust finite differences are used
///   automatically.
pub trait ResidualModel {
    // Required methods
    fn parameter_count(&self) -> usize;
    fn residual_count(&self) -> usize;
    fn residual(&self, params: &Params) -> OptResult<Residual>;

    // Optional methods
    fn jacobian(&self, _params: &Params) -> OptResult<Jacobian> {
        Err(OptError::JacobianNotImplemented)
    }
}

/// Stateful problem interface consumed by the solver.
///
/// A problem is the single source of truth for the current parameter vector
/// and everything derived from it. Implementations must:
/// - invalidate any cached residual/Jacobian when parameters are set;
/// - increment the evaluation counters only when a fresh evaluation is
///   performed (repeated queries at unchanged parameters are free);
/// - keep the counters monotonically non-decreasing for their lifetime.
///
/// `cost` and `gradient` are derived quantities with default implementations;
/// they always equal functions of the current parameter vector and are never
/// stored independently of it.
pub trait NllsProblem {
    // Required methods
    fn parameters(&self) -> &Params;
    fn set_parameters(&mut self, params: Params) -> OptResult<()>;
    fn residual(&mut self) -> OptResult<Residual>;
    fn jacobian(&mut self) -> OptResult<Jacobian>;
    fn num_residual_evaluations(&self) -> usize;
    fn num_jacobian_evaluations(&self) -> usize;

    // Derived methods
    /// Scalar cost `0.5 * ||r(x)||²` at the current parameters.
    ///
    /// # Errors
    /// Propagates any failure from `residual`.
    fn cost(&mut self) -> OptResult<Cost> {
        let residual = self.residual()?;
        Ok(0.5 * residual.dot(&residual))
    }

    /// Gradient `Jᵀ r` of the cost at the current parameters.
    ///
    /// # Errors
    /// Propagates any failure from `residual` or `jacobian`.
    fn gradient(&mut self) -> OptResult<Grad> {
        let residual = self.residual()?;
        let jacobian = self.jacobian()?;
        Ok(jacobian.t().dot(&residual))
    }
}

/// Solver state, exactly one of which is current at any time.
///
/// Variants:
/// - `Untried`: no solve has been attempted yet.
/// - `Continue`: a solve session is in progress.
/// - `Success`: a convergence criterion fired.
/// - `ExceededIterations`: the iteration budget ran out first.
/// - `NumericalDegeneracy`: persistent singularity or no-progress defeated
///   the damped solve after its bounded retries.
/// - `EvaluationFault`: an evaluation failure or non-finite value at a
///   linearization point, caught and converted rather than propagated.
///
/// After any `solve` call the status is terminal: never `Untried` or
/// `Continue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Untried,
    Continue,
    Success,
    ExceededIterations,
    NumericalDegeneracy,
    EvaluationFault,
}

impl Status {
    /// Human-readable label for the status, mapped exhaustively.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Untried => "Untried",
            Status::Continue => "In progress",
            Status::Success => "Converged",
            Status::ExceededIterations => "Exceeded maximum iterations",
            Status::NumericalDegeneracy => "Persistent numerical degeneracy",
            Status::EvaluationFault => "Evaluation fault",
        }
    }

    /// `true` for the four states a finished solve can report.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Status::Untried | Status::Continue)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Solver-level configuration.
///
/// Fields:
/// - `max_iterations: usize` — hard cap on accepted steps per solve session.
/// - `tols: Tolerances` — convergence tolerances.
/// - `damping: DampingOptions` — Levenberg-Marquardt damping schedule.
/// - `verbose: bool` — if `true`, prints per-iteration progress to stderr.
///
/// Constructor:
/// - `new(max_iterations, tols, verbose) -> OptResult<Self>` — builds options
///   with the default damping schedule; validation of the tolerance values is
///   handled in `Tolerances::new`.
///
/// Default:
/// - `max_iterations`: `100`
/// - `tols`: `dx_abs = 1e-8`, `dx_rel = 1e-8`, `grad = 1e-8`
/// - `damping`: `DampingOptions::default()`
/// - `verbose`: `false`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    pub max_iterations: usize,
    pub tols: Tolerances,
    pub damping: DampingOptions,
    pub verbose: bool,
}

impl SolverConfig {
    /// Create a new solver configuration with the default damping schedule.
    ///
    /// # Errors
    /// - `OptError::InvalidMaxIterations` if `max_iterations == 0`.
    pub fn new(max_iterations: usize, tols: Tolerances, verbose: bool) -> OptResult<Self> {
        if max_iterations == 0 {
            return Err(OptError::InvalidMaxIterations {
                max_iterations,
                reason: "Maximum iterations must be greater than zero.",
            });
        }
        Ok(Self { max_iterations, tols, damping: DampingOptions::default(), verbose })
    }

    /// Replace the damping schedule (already validated by its constructor).
    pub fn with_damping(mut self, damping: DampingOptions) -> Self {
        self.damping = damping;
        self
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tols: Tolerances::new(1e-8, 1e-8, 1e-8).unwrap(),
            damping: DampingOptions::default(),
            verbose: false,
        }
    }
}

/// Convergence tolerances used by the solver.
///
/// - `dx_abs`: succeed when the accepted step norm falls below this value.
/// - `dx_rel`: succeed when the accepted step norm falls below this value
///   times the parameter norm.
/// - `grad`: succeed when the gradient norm falls below this value.
///
/// Any single criterion suffices; a tolerance of zero disables its criterion
/// (comparisons are strict, and norms are never negative).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub dx_abs: f64,
    pub dx_rel: f64,
    pub grad: f64,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Rules
    /// - Each tolerance must be **finite and non-negative**.
    /// - Zero is allowed and disables the corresponding criterion.
    ///
    /// # Errors
    /// - [`OptError::InvalidTolerance`] naming the offending field.
    pub fn new(dx_abs: f64, dx_rel: f64, grad: f64) -> OptResult<Self> {
        verify_tolerance("dx_abs", dx_abs)?;
        verify_tolerance("dx_rel", dx_rel)?;
        verify_tolerance("grad", grad)?;
        Ok(Self { dx_abs, dx_rel, grad })
    }
}

/// Levenberg-Marquardt damping schedule.
///
/// - `initial`: damping weight at the start of the first solve session;
///   later sessions resume from the weight the previous session reached.
/// - `increase`: multiplier applied after a rejected step.
/// - `decrease`: multiplier applied after an accepted step.
/// - `max_rejections`: cap on consecutive rejected trials within one
///   iteration; exhausting it reports numerical degeneracy.
///
/// The defaults follow the classic Marquardt schedule (`1e-3`, `×10`, `×0.1`,
/// 20 retries).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DampingOptions {
    pub initial: f64,
    pub increase: f64,
    pub decrease: f64,
    pub max_rejections: usize,
}

impl DampingOptions {
    /// Construct a validated damping schedule.
    ///
    /// # Rules
    /// - `initial` must be finite and strictly positive.
    /// - `increase` must be finite and greater than one.
    /// - `decrease` must be finite and inside `(0, 1)`.
    /// - `max_rejections` must be at least one.
    ///
    /// # Errors
    /// - [`OptError::InvalidDamping`] / [`OptError::InvalidMaxRejections`]
    ///   naming the offending field.
    pub fn new(
        initial: f64, increase: f64, decrease: f64, max_rejections: usize,
    ) -> OptResult<Self> {
        if !initial.is_finite() || initial <= 0.0 {
            return Err(OptError::InvalidDamping {
                name: "initial",
                value: initial,
                reason: "Initial damping must be finite and strictly positive.",
            });
        }
        if !increase.is_finite() || increase <= 1.0 {
            return Err(OptError::InvalidDamping {
                name: "increase",
                value: increase,
                reason: "Damping increase must be finite and greater than one.",
            });
        }
        if !decrease.is_finite() || decrease <= 0.0 || decrease >= 1.0 {
            return Err(OptError::InvalidDamping {
                name: "decrease",
                value: decrease,
                reason: "Damping decrease must be finite and strictly between zero and one.",
            });
        }
        if max_rejections == 0 {
            return Err(OptError::InvalidMaxRejections {
                max_rejections,
                reason: "Rejection budget must be at least one.",
            });
        }
        Ok(Self { initial, increase, decrease, max_rejections })
    }
}

impl Default for DampingOptions {
    fn default() -> Self {
        Self {
            initial: DEFAULT_DAMPING,
            increase: DEFAULT_DAMPING_INCREASE,
            decrease: DEFAULT_DAMPING_DECREASE,
            max_rejections: DEFAULT_MAX_REJECTIONS,
        }
    }
}
