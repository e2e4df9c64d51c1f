use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Malformed data at row {row}: {reason}")]
    MalformedData { row: usize, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),
}
