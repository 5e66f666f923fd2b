use thiserror::Error;

/// Errors raised by the dataset adapter and the clustering engines.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Parameters rejected before any computation starts.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Input that cannot be normalized into a finite feature matrix.
    #[error("invalid data: {0}")]
    InvalidData(#[from] DataError),
    #[error("{0} not fitted. Call fit() first.")]
    NotFitted(&'static str),
}

/// Defects found while reading a feature table.
#[derive(Debug, Error, PartialEq)]
pub enum DataError {
    #[error("non-finite value {value} at row {row}, column {column}")]
    NonFinite { row: usize, column: usize, value: f64 },
    #[error("missing value at row {row}, column '{column}'")]
    Missing { row: usize, column: String },
    #[error("non-numeric value '{value}' at row {row}, column '{column}'")]
    NonNumeric {
        row: usize,
        column: String,
        value: String,
    },
    #[error("row {row} has {found} values, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("dataset has {0} rows but no feature columns")]
    NoFeatures(usize),
    #[error("unknown column '{0}'")]
    UnknownColumn(String),
    #[error("number of features ({found}) doesn't match training data ({expected})")]
    DimensionMismatch { expected: usize, found: usize },
}

impl ClusterError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        ClusterError::InvalidConfig(msg.into())
    }

    pub fn is_config(&self) -> bool {
        matches!(self, ClusterError::InvalidConfig(_))
    }

    pub fn is_data(&self) -> bool {
        matches!(self, ClusterError::InvalidData(_))
    }
}

pub type Result<T> = std::result::Result<T, ClusterError>;
