//! Error types for aviation message query parsing.

use thiserror::Error;

/// Result type alias using QueryError.
pub type QueryResult<T> = Result<T, QueryError>;

/// Maximum length of the message returned by [`QueryError::header_message`].
const HEADER_MESSAGE_MAX_LEN: usize = 300;

/// Broad class of a [`QueryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Wrong value count, empty field, out-of-range or unconvertible value.
    MalformedInput,
    /// A required option is absent.
    MissingRequired,
    /// Options that cannot be used together.
    SemanticConflict,
    /// Invalid configuration, detected at startup.
    Configuration,
    /// The authorization service failed to answer.
    Authorization,
}

/// Primary error type for query parsing and limits resolution.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum QueryError {
    // === Malformed input ===
    #[error("{count} values required for option '{option}'; '{raw}'")]
    ValueCount {
        option: String,
        count: usize,
        raw: String,
    },

    #[error("Even number of values required for option '{option}'; '{raw}'")]
    EvenValueCount { option: String, raw: String },

    #[error("Empty value for option '{option}' at position {position}; '{raw}'")]
    EmptyValue {
        option: String,
        position: usize,
        raw: String,
    },

    #[error("Value in range [{min},{max}] expected for option '{option}' at position {position}; '{raw}'")]
    OutOfRange {
        option: String,
        position: usize,
        raw: String,
        min: i32,
        max: i32,
    },

    #[error("Invalid value for option '{option}' at position {position}; '{raw}'")]
    InvalidValue {
        option: String,
        position: usize,
        raw: String,
    },

    #[error("Option '{0}' is empty")]
    EmptyOption(String),

    #[error("Invalid value for option '{option}': {message}")]
    InvalidOption { option: String, message: String },

    /// Rejected option value with a complete, fixed message.
    #[error("{0}")]
    UnknownValue(String),

    // === Missing required ===
    #[error("{0}")]
    MissingParameter(String),

    // === Semantic conflicts ===
    #[error("{0}")]
    Conflict(String),

    // === Configuration ===
    #[error("Configuration error: {0}")]
    Config(String),

    // === Authorization service ===
    #[error("Authorization failed: {0}")]
    Authorization(String),
}

impl QueryError {
    pub fn invalid_option(option: &str, message: impl Into<String>) -> Self {
        QueryError::InvalidOption {
            option: option.to_string(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            QueryError::ValueCount { .. }
            | QueryError::EvenValueCount { .. }
            | QueryError::EmptyValue { .. }
            | QueryError::OutOfRange { .. }
            | QueryError::InvalidValue { .. }
            | QueryError::EmptyOption(_)
            | QueryError::InvalidOption { .. }
            | QueryError::UnknownValue(_) => ErrorCategory::MalformedInput,

            QueryError::MissingParameter(_) => ErrorCategory::MissingRequired,
            QueryError::Conflict(_) => ErrorCategory::SemanticConflict,
            QueryError::Config(_) => ErrorCategory::Configuration,
            QueryError::Authorization(_) => ErrorCategory::Authorization,
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self.category() {
            ErrorCategory::MalformedInput
            | ErrorCategory::MissingRequired
            | ErrorCategory::SemanticConflict => 400,

            ErrorCategory::Configuration | ErrorCategory::Authorization => 500,
        }
    }

    /// Single-line message suitable for a response header.
    pub fn header_message(&self) -> String {
        self.to_string()
            .replace('\n', " ")
            .chars()
            .take(HEADER_MESSAGE_MAX_LEN)
            .collect()
    }
}

impl From<serde_yaml::Error> for QueryError {
    fn from(err: serde_yaml::Error) -> Self {
        QueryError::Config(format!("YAML error: {}", err))
    }
}

impl From<std::io::Error> for QueryError {
    fn from(err: std::io::Error) -> Self {
        QueryError::Config(err.to_string())
    }
}
