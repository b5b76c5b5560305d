use thiserror::Error;

/// Errors surfaced at the simulation boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SimulationError {
    /// An input was negative, out of range, or otherwise malformed.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// No bracket table is registered for the requested fiscal year.
    #[error("no bracket table registered for fiscal year {0}")]
    UnknownFiscalYear(i32),

    /// An internal invariant failed (negative tax, broken reconciliation).
    /// This is a defect, never an input problem.
    #[error("numerical invariant violated: {0}")]
    NumericalInstability(String),
}

impl SimulationError {
    pub(crate) fn validation(
        field: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Name of the offending input field, for validation errors.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}
