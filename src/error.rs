use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Required column '{0}' not found in input data")]
    MissingColumn(String),

    #[error("Invalid amount '{value}' in row {row}: expected a numeric value")]
    InvalidAmount { row: usize, value: String },

    #[error("Unparseable period '{value}' in row {row}: expected YYYY-MM, 'Mon YYYY' or 'Month YYYY'")]
    UnparseablePeriod { row: usize, value: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;
