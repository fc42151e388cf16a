use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CapexError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("No such project: {0}")]
    ProjectNotFound(String),

    #[error("Convergence failure: {function} did not converge after {iterations} iterations (delta: {last_delta})")]
    ConvergenceFailure {
        function: String,
        iterations: u32,
        last_delta: Decimal,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<serde_json::Error> for CapexError {
    fn from(e: serde_json::Error) -> Self {
        CapexError::SerializationError(e.to_string())
    }
}

impl From<csv::Error> for CapexError {
    fn from(e: csv::Error) -> Self {
        CapexError::Csv(e.to_string())
    }
}

impl From<std::io::Error> for CapexError {
    fn from(e: std::io::Error) -> Self {
        CapexError::Io(e.to_string())
    }
}
