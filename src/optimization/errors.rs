/// Convenient alias used by every fallible operation in the solver stack.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- Solver configuration ----
    /// Maximum iterations needs to be positive.
    InvalidMaxIterations {
        max_iterations: usize,
        reason: &'static str,
    },
    /// A convergence tolerance needs to be finite and non-negative.
    InvalidTolerance {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
    /// A damping schedule field is outside its documented range.
    InvalidDamping {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
    /// The rejection budget needs to be at least 1.
    InvalidMaxRejections {
        max_rejections: usize,
        reason: &'static str,
    },

    // ---- Problem state ----
    /// The problem holds no parameters, so there is nothing to solve.
    EmptyParameters,
    /// New parameter vector does not match the problem dimension.
    ParameterDimMismatch {
        expected: usize,
        found: usize,
    },
    /// Parameter entries need to be finite.
    NonFiniteParameters {
        index: usize,
        value: f64,
    },

    // ---- Model evaluation ----
    /// Residual length does not match the model's declared count.
    ResidualDimMismatch {
        expected: usize,
        found: usize,
    },
    /// Jacobian shape does not match the model's declared counts.
    JacobianDimMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },
    /// Jacobian entries need to be finite.
    NonFiniteJacobian {
        row: usize,
        col: usize,
        value: f64,
    },
    /// Implies that finite differences should be used.
    JacobianNotImplemented,
    /// Model-specific evaluation failure.
    EvaluationFailed {
        reason: String,
    },

    // ---- Measurement & covariance ----
    /// The measurement vector must hold at least one entry.
    EmptyMeasurement,
    /// Measurement entries need to be finite.
    NonFiniteMeasurement {
        index: usize,
        value: f64,
    },
    /// Measurement length does not match the model or covariance dimension.
    MeasurementDimMismatch {
        expected: usize,
        found: usize,
    },
    /// Measurement variances need to be finite and positive.
    InvalidVariance {
        index: usize,
        value: f64,
    },
    /// Covariance shape does not match the measurement dimension.
    CovarianceDimMismatch {
        expected: usize,
        found: (usize, usize),
    },
    /// Covariance entries need to be finite.
    NonFiniteCovariance {
        row: usize,
        col: usize,
        value: f64,
    },
    /// Covariance matrix admits no Cholesky factorization.
    CovarianceNotPositiveDefinite,

    // ---- Linear algebra kernel ----
    /// The damped normal equations have no usable spectrum left.
    SingularNormalEquations,
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Solver configuration ----
            OptError::InvalidMaxIterations { max_iterations, reason } => {
                write!(f, "Invalid maximum iterations {max_iterations}: {reason}")
            }
            OptError::InvalidTolerance { name, value, reason } => {
                write!(f, "Invalid tolerance {name} = {value}: {reason}")
            }
            OptError::InvalidDamping { name, value, reason } => {
                write!(f, "Invalid damping option {name} = {value}: {reason}")
            }
            OptError::InvalidMaxRejections { max_rejections, reason } => {
                write!(f, "Invalid rejection budget {max_rejections}: {reason}")
            }

            // ---- Problem state ----
            OptError::EmptyParameters => {
                write!(f, "Problem has no parameters set")
            }
            OptError::ParameterDimMismatch { expected, found } => {
                write!(f, "Parameter dimension mismatch: expected {expected}, found {found}")
            }
            OptError::NonFiniteParameters { index, value } => {
                write!(f, "Non-finite parameter at index {index}: {value}")
            }

            // ---- Model evaluation ----
            OptError::ResidualDimMismatch { expected, found } => {
                write!(f, "Residual dimension mismatch: expected {expected}, found {found}")
            }
            OptError::JacobianDimMismatch { expected, found } => {
                write!(
                    f,
                    "Jacobian dimension mismatch: expected {}x{}, found {}x{}",
                    expected.0, expected.1, found.0, found.1
                )
            }
            OptError::NonFiniteJacobian { row, col, value } => {
                write!(f, "Non-finite Jacobian entry at ({row}, {col}): {value}")
            }
            OptError::JacobianNotImplemented => {
                write!(f, "Analytic Jacobian not implemented")
            }
            OptError::EvaluationFailed { reason } => {
                write!(f, "Model evaluation failed: {reason}")
            }

            // ---- Measurement & covariance ----
            OptError::EmptyMeasurement => {
                write!(f, "Measurement vector is empty")
            }
            OptError::NonFiniteMeasurement { index, value } => {
                write!(f, "Non-finite measurement at index {index}: {value}")
            }
            OptError::MeasurementDimMismatch { expected, found } => {
                write!(f, "Measurement dimension mismatch: expected {expected}, found {found}")
            }
            OptError::InvalidVariance { index, value } => {
                write!(f, "Invalid measurement variance at index {index}: {value}")
            }
            OptError::CovarianceDimMismatch { expected, found } => {
                write!(
                    f,
                    "Covariance dimension mismatch: expected {expected}x{expected}, found {}x{}",
                    found.0, found.1
                )
            }
            OptError::NonFiniteCovariance { row, col, value } => {
                write!(f, "Non-finite covariance entry at ({row}, {col}): {value}")
            }
            OptError::CovarianceNotPositiveDefinite => {
                write!(f, "Covariance matrix is not positive definite")
            }

            // ---- Linear algebra kernel ----
            OptError::SingularNormalEquations => {
                write!(f, "Damped normal equations are numerically singular")
            }
        }
    }
}
