use thiserror::Error;

/// Errors returned by the calculators.
///
/// Missing parameter data is not an error: it is reported as a
/// [`Diagnostic`](crate::Diagnostic) next to a zero amount.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CalculationError {
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("unknown billing model '{0}'")]
    InvalidModel(String),
}

impl CalculationError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}
