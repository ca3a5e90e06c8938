//! Adapter that exposes a measurement fit as a least-squares problem.
//!
//! We convert a *maximum-likelihood* fit under Gaussian noise into a plain
//! least-squares problem: with measurement `y`, prediction `f(x)`, and noise
//! covariance `Σ = L Lᵀ`, the whitened residual `r̃(x) = L⁻¹ (f(x) - y)`
//! satisfies `½ ‖r̃‖² = ½ (f - y)ᵀ Σ⁻¹ (f - y)`, the parameter-dependent part
//! of the negative log-likelihood. Analytic Jacobians (if provided by the
//! model) are whitened with the same factor. If a Jacobian is not provided,
//! the solver layer finite-differences the **whitened** residual, so no
//! extra correction is needed in that branch.
use ndarray::Array1;

use crate::{
    likelihood::covariance::Covariance,
    optimization::{
        errors::{OptError, OptResult},
        nlls_solver::{
            traits::ResidualModel,
            types::{Jacobian, Params, Residual},
        },
    },
};

/// A deterministic forward model `f(x)` predicting the measurement vector.
///
/// Required:
/// - `parameter_count` / `prediction_count`: fixed problem dimensions.
/// - `predict`: evaluate `f(x)`.
///
/// Optional:
/// - `jacobian`: analytic `∂f/∂x` (`prediction_count × parameter_count`).
///   The default reports [`OptError::JacobianNotImplemented`], which makes
///   the solver layer fall back to finite differences.
pub trait ForwardModel {
    // Required methods
    fn parameter_count(&self) -> usize;
    fn prediction_count(&self) -> usize;
    fn predict(&self, params: &Params) -> OptResult<Array1<f64>>;

    // Optional methods
    fn jacobian(&self, _params: &Params) -> OptResult<Jacobian> {
        Err(OptError::JacobianNotImplemented)
    }
}

/// Bridges a [`ForwardModel`] plus measurement data to [`ResidualModel`].
///
/// - `residual` returns `L⁻¹ (f(x) - y)` (whitened misfit).
/// - `jacobian` returns `L⁻¹ ∂f/∂x` when the model provides a Jacobian, and
///   propagates `JacobianNotImplemented` otherwise so the finite-difference
///   fallback differentiates the whitened residual directly.
#[derive(Debug, Clone)]
pub struct MaxLikelihood<M: ForwardModel> {
    model: M,
    measurement: Array1<f64>,
    covariance: Covariance,
}

impl<M: ForwardModel> MaxLikelihood<M> {
    /// Construct a whitened fit over `model`, `measurement`, and the noise
    /// `covariance`.
    ///
    /// # Errors
    /// - `EmptyMeasurement` if `measurement` has length zero.
    /// - `NonFiniteMeasurement` for the first NaN or infinite entry.
    /// - `MeasurementDimMismatch` if the measurement disagrees with
    ///   `model.prediction_count()`.
    /// - `CovarianceDimMismatch` if the covariance disagrees with the
    ///   measurement length.
    pub fn new(model: M, measurement: Array1<f64>, covariance: Covariance) -> OptResult<Self> {
        if measurement.is_empty() {
            return Err(OptError::EmptyMeasurement);
        }
        for (index, &value) in measurement.iter().enumerate() {
            if !value.is_finite() {
                return Err(OptError::NonFiniteMeasurement { index, value });
            }
        }
        if measurement.len() != model.prediction_count() {
            return Err(OptError::MeasurementDimMismatch {
                expected: model.prediction_count(),
                found: measurement.len(),
            });
        }
        if covariance.dim() != measurement.len() {
            return Err(OptError::CovarianceDimMismatch {
                expected: measurement.len(),
                found: (covariance.dim(), covariance.dim()),
            });
        }
        Ok(Self { model, measurement, covariance })
    }

    /// Borrow the wrapped forward model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Borrow the measurement vector.
    pub fn measurement(&self) -> &Array1<f64> {
        &self.measurement
    }
}

impl<M: ForwardModel> ResidualModel for MaxLikelihood<M> {
    fn parameter_count(&self) -> usize {
        self.model.parameter_count()
    }

    fn residual_count(&self) -> usize {
        self.measurement.len()
    }

    /// Whitened misfit `L⁻¹ (f(x) - y)`.
    ///
    /// # Errors
    /// - Propagates model errors via `?`.
    /// - `ResidualDimMismatch` if the prediction length disagrees with the
    ///   measurement.
    fn residual(&self, params: &Params) -> OptResult<Residual> {
        let prediction = self.model.predict(params)?;
        if prediction.len() != self.measurement.len() {
            return Err(OptError::ResidualDimMismatch {
                expected: self.measurement.len(),
                found: prediction.len(),
            });
        }
        self.covariance.whiten(&(prediction - &self.measurement))
    }

    /// Whitened model Jacobian `L⁻¹ ∂f/∂x`.
    ///
    /// # Errors
    /// - Propagates model errors via `?`, including
    ///   `JacobianNotImplemented` for the finite-difference fallback.
    fn jacobian(&self, params: &Params) -> OptResult<Jacobian> {
        let jacobian = self.model.jacobian(params)?;
        self.covariance.whiten_columns(&jacobian)
    }
}
