use thiserror::Error;

#[derive(Error, Debug)]
pub enum GroupsError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Attendee source unavailable: {message}")]
    SourceUnavailable { message: String },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Roster parsing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

/// 錯誤分類，對應 HTTP 狀態碼與重試策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    InvalidArgument,
    NotFound,
    SourceUnavailable,
    Storage,
    Config,
}

impl GroupsError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn source_unavailable(message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidArgument { .. } => ErrorCategory::InvalidArgument,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::SourceUnavailable { .. } | Self::ApiError(_) | Self::CsvError(_) => {
                ErrorCategory::SourceUnavailable
            }
            Self::StorageError { .. } | Self::IoError(_) | Self::SerializationError(_) => {
                ErrorCategory::Storage
            }
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Config,
        }
    }

    /// 上游暫時性失敗可由呼叫端重試，其餘皆不可
    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::SourceUnavailable
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::InvalidArgument => "Check the request parameters and try again",
            ErrorCategory::NotFound => "Verify the names or that an upcoming session exists",
            ErrorCategory::SourceUnavailable => "The upstream service failed, retry later",
            ErrorCategory::Storage => "Check the store directory and seed files",
            ErrorCategory::Config => "Fix the configuration file and restart",
        }
    }
}

pub type Result<T> = std::result::Result<T, GroupsError>;
