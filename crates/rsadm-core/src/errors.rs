use thiserror::Error;

/// Error type for invalid model definitions and failed simulation steps.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdmError {
    #[error("Component '{0}' is already registered")]
    DuplicateComponent(String),
    #[error("Unknown component '{0}'")]
    UnknownComponent(String),
    #[error("Component '{0}' is missing from the concentration vector")]
    MissingComponent(String),
    #[error("{solver} failed to converge: {reason}")]
    EquilibriumNonconvergence { solver: String, reason: String },
    #[error("Integrator diverged at t={time} d: {reason}")]
    IntegratorDivergence { time: f64, reason: String },
    #[error("Invalid stoichiometry for process '{process}': {reason}")]
    InvalidStoichiometry { process: String, reason: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Could not parse {format} record: {details}")]
    Parse { format: String, details: String },
}

impl AdmError {
    pub(crate) fn nonconvergence(solver: impl Into<String>, reason: impl Into<String>) -> Self {
        AdmError::EquilibriumNonconvergence {
            solver: solver.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience type for `Result<T, AdmError>`.
pub type AdmResult<T> = Result<T, AdmError>;
