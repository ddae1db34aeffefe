//! Error types for AQI calculation

use thiserror::Error;

use crate::pollutant::Pollutant;

/// Result type alias for calculator operations
pub type Result<T> = std::result::Result<T, AqiError>;

/// Errors that can occur while building reference tables or computing indices
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AqiError {
    /// The requested standard is not the one the calculator is bound to
    #[error("Unknown standard: {0}")]
    UnknownStandard(String),

    /// Normalized concentration is not covered by any breakpoint band
    #[error("Concentration {value} of {pollutant} is outside every breakpoint band")]
    OutOfDomain { pollutant: Pollutant, value: f64 },

    /// Aggregate requested without concentrations or previously computed sub-indices
    #[error("Insufficient data: supply concentrations or compute a sub-index first")]
    InsufficientData,

    /// The reference table has no breakpoints for the pollutant
    #[error("Standard {standard} has no breakpoints for {pollutant}")]
    MissingPollutant {
        standard: String,
        pollutant: Pollutant,
    },

    /// Raw standard data failed validation
    #[error("Invalid reference table: {0}")]
    InvalidTable(String),

    /// Configuration text could not be deserialized
    #[error("Failed to parse reference table: {0}")]
    Parse(String),
}

impl AqiError {
    /// Create a new `InvalidTable` error scoped to a pollutant
    #[must_use]
    pub fn invalid_table(pollutant: Pollutant, reason: &str) -> Self {
        Self::InvalidTable(format!("{pollutant}: {reason}"))
    }
}

impl From<serde_json::Error> for AqiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
