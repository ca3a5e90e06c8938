//! nlls_solver::convergence — multi-criterion stopping rule.
//!
//! Evaluates the three convergence criteria after each accepted step: the
//! step norm against an absolute tolerance, the step norm against a relative
//! tolerance scaled by the parameter norm, and the gradient norm against its
//! own tolerance. Any single criterion suffices. Comparisons are strict, so
//! a tolerance of zero disables its criterion outright.
use crate::optimization::nlls_solver::traits::Tolerances;

/// Which criterion declared convergence; feeds verbose diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceReason {
    StepBelowAbsolute,
    StepBelowRelative,
    GradientBelowTolerance,
}

impl ConvergenceReason {
    /// Human-readable label for the fired criterion.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConvergenceReason::StepBelowAbsolute => "step below absolute tolerance",
            ConvergenceReason::StepBelowRelative => "step below relative tolerance",
            ConvergenceReason::GradientBelowTolerance => "gradient below tolerance",
        }
    }
}

/// Stopping rule bound to one set of tolerances.
#[derive(Debug, Clone, Copy)]
pub struct ConvergenceCheck {
    tols: Tolerances,
}

impl ConvergenceCheck {
    pub fn new(tols: Tolerances) -> Self {
        Self { tols }
    }

    /// Full three-way check run after an accepted step.
    ///
    /// # Behavior
    /// Criteria are tried in order: absolute step, relative step, gradient.
    /// The first that fires is reported.
    pub fn converged(
        &self, step_norm: f64, param_norm: f64, grad_norm: f64,
    ) -> Option<ConvergenceReason> {
        if let Some(reason) = self.step_within(step_norm, param_norm) {
            return Some(reason);
        }
        self.gradient_converged(grad_norm)
    }

    /// Step-size criteria only; also consulted for rejected steps whose
    /// trust region has already collapsed below the caller's resolution.
    pub fn step_within(&self, step_norm: f64, param_norm: f64) -> Option<ConvergenceReason> {
        if step_norm < self.tols.dx_abs {
            return Some(ConvergenceReason::StepBelowAbsolute);
        }
        if step_norm < self.tols.dx_rel * param_norm {
            return Some(ConvergenceReason::StepBelowRelative);
        }
        None
    }

    /// Gradient criterion only; consulted once at session start so an
    /// already-stationary problem succeeds without consuming iterations.
    pub fn gradient_converged(&self, grad_norm: f64) -> Option<ConvergenceReason> {
        if grad_norm < self.tols.grad {
            return Some(ConvergenceReason::GradientBelowTolerance);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Each criterion firing alone, and the documented ordering.
    // - Strict comparison semantics and zero-disables behavior.
    //
    // They intentionally DO NOT cover:
    // - How the solver reacts to a fired criterion (see solver tests).
    // -------------------------------------------------------------------------

    fn check(dx_abs: f64, dx_rel: f64, grad: f64) -> ConvergenceCheck {
        ConvergenceCheck::new(Tolerances::new(dx_abs, dx_rel, grad).expect("valid tolerances"))
    }

    #[test]
    // Purpose
    // -------
    // Each criterion can fire on its own.
    //
    // Given
    // -----
    // Tolerance sets where exactly one criterion is satisfiable.
    //
    // Expect
    // ------
    // The matching reason is reported; others return None.
    fn each_criterion_fires_alone() {
        // Act + Assert
        assert_eq!(
            check(1e-3, 0.0, 0.0).converged(1e-4, 10.0, 1.0),
            Some(ConvergenceReason::StepBelowAbsolute)
        );
        assert_eq!(
            check(0.0, 1e-2, 0.0).converged(1e-4, 10.0, 1.0),
            Some(ConvergenceReason::StepBelowRelative)
        );
        assert_eq!(
            check(0.0, 0.0, 1e-5).converged(1.0, 10.0, 1e-6),
            Some(ConvergenceReason::GradientBelowTolerance)
        );
        assert_eq!(check(0.0, 0.0, 0.0).converged(0.0, 0.0, 0.0), None);
    }

    #[test]
    // Purpose
    // -------
    // The absolute step criterion wins when several would fire.
    //
    // Given
    // -----
    // A tiny step and gradient with every tolerance loose.
    //
    // Expect
    // ------
    // `StepBelowAbsolute` is reported first.
    fn criteria_are_checked_in_documented_order() {
        // Act
        let reason = check(1.0, 1.0, 1.0).converged(1e-9, 1.0, 1e-9);

        // Assert
        assert_eq!(reason, Some(ConvergenceReason::StepBelowAbsolute));
    }

    #[test]
    // Purpose
    // -------
    // Comparisons are strict: equality does not converge.
    //
    // Given
    // -----
    // A step norm exactly at `dx_abs` and a gradient exactly at `grad`.
    //
    // Expect
    // ------
    // No criterion fires.
    fn equality_does_not_fire() {
        // Act + Assert
        assert_eq!(check(1e-3, 0.0, 0.0).step_within(1e-3, 1.0), None);
        assert_eq!(check(0.0, 0.0, 1e-5).gradient_converged(1e-5), None);
    }

    #[test]
    // Purpose
    // -------
    // The relative criterion scales with the parameter norm.
    //
    // Given
    // -----
    // A step of 0.5 against `dx_rel = 1e-2`.
    //
    // Expect
    // ------
    // Fires for a parameter norm of 100, not for a norm of 10.
    fn relative_criterion_scales_with_parameters() {
        // Arrange
        let rule = check(0.0, 1e-2, 0.0);

        // Act + Assert
        assert_eq!(rule.step_within(0.5, 100.0), Some(ConvergenceReason::StepBelowRelative));
        assert_eq!(rule.step_within(0.5, 10.0), None);
    }

    #[test]
    // Purpose
    // -------
    // Reason labels are distinct and non-empty.
    //
    // Given
    // -----
    // All three reasons.
    //
    // Expect
    // ------
    // Pairwise distinct labels.
    fn reason_labels_are_distinct() {
        // Arrange
        let all = [
            ConvergenceReason::StepBelowAbsolute,
            ConvergenceReason::StepBelowRelative,
            ConvergenceReason::GradientBelowTolerance,
        ];

        // Act + Assert
        for (i, a) in all.iter().enumerate() {
            assert!(!a.as_str().is_empty());
            for b in all.iter().skip(i + 1) {
                assert_ne!(a.as_str(), b.as_str());
            }
        }
    }
}
