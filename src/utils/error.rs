use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedbackError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("API returned status {status}: {body}")]
    ApiStatusError { status: u16, body: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Document '{id}' not found in collection '{collection}'")]
    NotFound { collection: String, id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Data,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl FeedbackError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            FeedbackError::ConfigError { .. }
            | FeedbackError::ConfigValidationError { .. }
            | FeedbackError::InvalidConfigValueError { .. }
            | FeedbackError::MissingConfigError { .. } => ErrorCategory::Configuration,
            FeedbackError::ApiError(_) | FeedbackError::ApiStatusError { .. } => {
                ErrorCategory::Network
            }
            FeedbackError::CsvError(_)
            | FeedbackError::SerializationError(_)
            | FeedbackError::ProcessingError { .. }
            | FeedbackError::ValidationError { .. } => ErrorCategory::Data,
            FeedbackError::ZipError(_)
            | FeedbackError::IoError(_)
            | FeedbackError::NotFound { .. } => ErrorCategory::Storage,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            FeedbackError::NotFound { .. } => ErrorSeverity::Low,
            FeedbackError::ApiError(_) | FeedbackError::ApiStatusError { .. } => {
                ErrorSeverity::Medium
            }
            FeedbackError::CsvError(_)
            | FeedbackError::SerializationError(_)
            | FeedbackError::ProcessingError { .. }
            | FeedbackError::ValidationError { .. }
            | FeedbackError::ConfigError { .. }
            | FeedbackError::ConfigValidationError { .. }
            | FeedbackError::InvalidConfigValueError { .. }
            | FeedbackError::MissingConfigError { .. } => ErrorSeverity::High,
            FeedbackError::ZipError(_) | FeedbackError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the command line flags or the TOML configuration file".to_string()
            }
            ErrorCategory::Network => {
                "Check that the export endpoint is reachable and the token is valid, then retry"
                    .to_string()
            }
            ErrorCategory::Data => {
                "Check that the survey export is a JSON array of response objects".to_string()
            }
            ErrorCategory::Storage => {
                "Check that the input file exists and the output directory is writable"
                    .to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            FeedbackError::MissingConfigError { field } => {
                format!("Missing setting '{}'", field)
            }
            FeedbackError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            FeedbackError::ApiStatusError { status, .. } => {
                format!("The survey export endpoint answered with status {}", status)
            }
            FeedbackError::NotFound { collection, id } => {
                format!("No {} entry with id {}", collection, id)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FeedbackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let err = FeedbackError::MissingConfigError {
            field: "subject.user_id".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("subject.user_id"));

        let err = FeedbackError::NotFound {
            collection: "survey_responses".to_string(),
            id: "r1".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Storage);
        assert_eq!(err.severity(), ErrorSeverity::Low);
    }

    #[test]
    fn test_io_error_is_critical() {
        let err: FeedbackError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.recovery_suggestion().contains("writable"));
    }
}
