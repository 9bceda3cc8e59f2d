//! Error types shared by every analysis stage.

/// Errors that can occur during an analysis stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// Input payload is structurally unusable (wrong arity, out-of-range
    /// coordinates, inverted bounds, malformed date string)
    InvalidInput(String),
    /// Input is well-formed but carries no usable signal (no temperature
    /// samples landed in the grid, no daylight hours to aggregate)
    NoData(String),
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisError::InvalidInput(msg) => write!(f, "Invalid input: {msg}"),
            AnalysisError::NoData(msg) => write!(f, "No data: {msg}"),
        }
    }
}

impl std::error::Error for AnalysisError {}
