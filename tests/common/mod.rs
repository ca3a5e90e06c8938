//! Shared fixtures for the integration suites.
//!
//! Purpose
//! -------
//! - Provide the Bard and Meyer curve-fitting benchmarks in residual form,
//!   their measurement vectors, and the solve/assert helpers that both
//!   integration suites share.
//! - Keep scenario files focused on behavior: models and data live here,
//!   expectations live with the tests.
use ndarray::{array, Array1};
use rust_nlls::optimization::{
    errors::OptResult,
    nlls_solver::{
        kernel::StepKernel,
        problem::CachedProblem,
        solver::Solver,
        traits::{NllsProblem, ResidualModel, SolverConfig, Tolerances},
        types::{Jacobian, Params, Residual},
    },
};

/// The fifteen Bard observations, in benchmark order.
pub fn bard_measurement() -> Array1<f64> {
    array![
        0.14, 0.18, 0.22, 0.25, 0.29, 0.32, 0.35, 0.39, 0.37, 0.58, 0.73, 0.96, 1.34, 2.10, 4.39
    ]
}

/// Bard benchmark in residual form.
///
/// With `u_i = i`, `v_i = 16 - i`, `w_i = min(u_i, v_i)` for `i = 1..=15`,
/// the residuals are `r_i = y_i - (x1 + u_i / (v_i x2 + w_i x3))`. From the
/// all-ones start the fit lands in the global basin with cost about
/// 4.1074386e-3; a deeper second basin exists and is exercised by the
/// branching scenarios.
#[derive(Debug, Clone)]
pub struct BardModel {
    measurement: Array1<f64>,
}

impl BardModel {
    pub fn standard() -> Self {
        Self { measurement: bard_measurement() }
    }
}

impl ResidualModel for BardModel {
    fn parameter_count(&self) -> usize {
        3
    }

    fn residual_count(&self) -> usize {
        15
    }

    fn residual(&self, params: &Params) -> OptResult<Residual> {
        let (x1, x2, x3) = (params[0], params[1], params[2]);
        let mut residual = Residual::zeros(15);
        for i in 0..15 {
            let u = (i + 1) as f64;
            let v = 16.0 - u;
            let w = u.min(v);
            let denom = v * x2 + w * x3;
            residual[i] = self.measurement[i] - (x1 + u / denom);
        }
        Ok(residual)
    }

    fn jacobian(&self, params: &Params) -> OptResult<Jacobian> {
        let (x2, x3) = (params[1], params[2]);
        let mut jacobian = Jacobian::zeros((15, 3));
        for i in 0..15 {
            let u = (i + 1) as f64;
            let v = 16.0 - u;
            let w = u.min(v);
            let denom = v * x2 + w * x3;
            jacobian[[i, 0]] = -1.0;
            jacobian[[i, 1]] = u * v / (denom * denom);
            jacobian[[i, 2]] = u * w / (denom * denom);
        }
        Ok(jacobian)
    }
}

/// The sixteen Meyer thermistor resistance observations.
pub fn meyer_measurement() -> Array1<f64> {
    array![
        34780.0, 28610.0, 23650.0, 19630.0, 16370.0, 13720.0, 11540.0, 9744.0, 8261.0, 7030.0,
        6005.0, 5147.0, 4427.0, 3820.0, 3307.0, 2872.0
    ]
}

/// Meyer thermistor fit: `x1 exp(x2 / (t_i + x3))` against the resistance
/// data, with `t_i = 45 + 5 i`. Notoriously stiff; wild trial points
/// overflow the exponential and must be absorbed as rejections.
#[derive(Debug, Clone)]
pub struct MeyerModel {
    measurement: Array1<f64>,
}

impl MeyerModel {
    pub fn standard() -> Self {
        Self { measurement: meyer_measurement() }
    }
}

impl ResidualModel for MeyerModel {
    fn parameter_count(&self) -> usize {
        3
    }

    fn residual_count(&self) -> usize {
        16
    }

    fn residual(&self, params: &Params) -> OptResult<Residual> {
        let (x1, x2, x3) = (params[0], params[1], params[2]);
        let mut residual = Residual::zeros(16);
        for i in 0..16 {
            let t = 45.0 + 5.0 * (i + 1) as f64;
            residual[i] = x1 * (x2 / (t + x3)).exp() - self.measurement[i];
        }
        Ok(residual)
    }

    fn jacobian(&self, params: &Params) -> OptResult<Jacobian> {
        let (x1, x2, x3) = (params[0], params[1], params[2]);
        let mut jacobian = Jacobian::zeros((16, 3));
        for i in 0..16 {
            let t = 45.0 + 5.0 * (i + 1) as f64;
            let s = t + x3;
            let e = (x2 / s).exp();
            jacobian[[i, 0]] = e;
            jacobian[[i, 1]] = x1 * e / s;
            jacobian[[i, 2]] = -x1 * x2 * e / (s * s);
        }
        Ok(jacobian)
    }
}

/// Wrap `model` in a cached problem and run one solve session with the
/// standard benchmark tolerances (1e-8 absolute step, relative step, and
/// gradient).
///
/// Panics if the starting point is rejected or the session cannot start;
/// both are test configuration errors, not behavior under test. The
/// terminal status is left for the caller to assert.
pub fn fit_benchmark<M: ResidualModel>(
    model: M, start: Params, max_iterations: usize,
) -> Solver<CachedProblem<M>> {
    let problem = CachedProblem::new(model, start)
        .expect("benchmark starting points should be accepted");
    let tols =
        Tolerances::new(1e-8, 1e-8, 1e-8).expect("standard tolerances should be accepted");
    let config = SolverConfig::new(max_iterations, tols, false)
        .expect("positive iteration budgets should be accepted");
    let mut solver = Solver::new(problem, config);
    solver.solve().expect("benchmark problems have non-empty parameters");
    solver
}

/// Assert the bookkeeping guarantees that hold for every finished solver:
/// aligned histories, the accepted-step count, strictly decreasing costs,
/// finite recorded values, the evaluation-counter ordering, and a terminal
/// status.
pub fn assert_solver_invariants<P: NllsProblem, K: StepKernel>(solver: &Solver<P, K>) {
    let len = solver.cost_history().len();
    assert_eq!(solver.parameter_history().len(), len, "parameter history should align");
    assert_eq!(solver.gradient_history().len(), len, "gradient history should align");
    assert_eq!(solver.num_accepted_steps(), len.saturating_sub(1), "accepted-step count");
    assert!(
        solver.num_jacobian_evaluations() <= solver.num_residual_evaluations(),
        "Jacobian evaluations should never outnumber residual evaluations"
    );
    assert!(solver.status().is_terminal(), "a finished solve must report a terminal status");
    for pair in solver.cost_history().windows(2) {
        assert!(pair[1] < pair[0], "accepted costs must strictly decrease");
    }
    for (params, grad) in solver.parameter_history().iter().zip(solver.gradient_history()) {
        assert!(params.iter().all(|v| v.is_finite()), "recorded iterates must be finite");
        assert!(grad.iter().all(|v| v.is_finite()), "recorded gradients must be finite");
    }
    assert!(solver.cost_history().iter().all(|c| c.is_finite()), "recorded costs must be finite");
}
