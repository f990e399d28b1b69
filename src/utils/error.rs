use thiserror::Error;

/// 單一 facet 查詢失敗的原因；只會被記錄，不會讓整體查詢失敗
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FacetError {
    #[error("participant not found in directory")]
    NotFound,

    #[error("directory service unavailable (HTTP {status})")]
    ServiceUnavailable { status: u16 },

    #[error("unexpected directory status: HTTP {status}")]
    UnexpectedStatus { status: u16 },

    #[error("network error: {message}")]
    Network { message: String },

    #[error("no network transport available")]
    TransportBlocked,

    #[error("unexpected response body: {message}")]
    Decode { message: String },
}

impl FacetError {
    pub fn is_transport_blocked(&self) -> bool {
        matches!(self, FacetError::TransportBlocked)
    }
}

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Invalid format: '{input}' is not a 10 digit Belgian enterprise or VAT number")]
    InvalidFormat { input: String },

    #[error("Empty input")]
    EmptyInput,

    #[error("Directory facet unavailable: {0}")]
    FacetUnavailable(#[from] FacetError),

    #[error("Detail enrichment failed: {message}")]
    EnrichmentFailed { message: String },

    #[error("No network transport available to reach the directory")]
    TransportBlocked,

    #[error("Directory unavailable: every facet failed for both schemes")]
    UpstreamUnavailable,

    #[error("Participant {participant} is not registered in the Peppol network")]
    NotRegistered { participant: String },

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Directory,
    Network,
    Configuration,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LookupError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LookupError::InvalidFormat { .. } | LookupError::EmptyInput => ErrorCategory::Input,
            LookupError::FacetUnavailable(_)
            | LookupError::EnrichmentFailed { .. }
            | LookupError::UpstreamUnavailable
            | LookupError::NotRegistered { .. } => ErrorCategory::Directory,
            LookupError::TransportBlocked | LookupError::HttpError(_) => ErrorCategory::Network,
            LookupError::ConfigError { .. }
            | LookupError::ConfigValidationError { .. }
            | LookupError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            LookupError::IoError(_) | LookupError::SerializationError(_) => {
                ErrorCategory::Internal
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            LookupError::FacetUnavailable(_) | LookupError::EnrichmentFailed { .. } => {
                ErrorSeverity::Low
            }
            LookupError::UpstreamUnavailable
            | LookupError::TransportBlocked
            | LookupError::HttpError(_) => ErrorSeverity::Medium,
            LookupError::InvalidFormat { .. }
            | LookupError::EmptyInput
            | LookupError::NotRegistered { .. } => ErrorSeverity::High,
            LookupError::IoError(_)
            | LookupError::SerializationError(_)
            | LookupError::ConfigError { .. }
            | LookupError::ConfigValidationError { .. }
            | LookupError::InvalidConfigValueError { .. } => ErrorSeverity::Critical,
        }
    }

    /// 對應的翻譯鍵，交給 i18n 產生使用者看得到的訊息
    pub fn message_key(&self) -> &'static str {
        match self {
            LookupError::InvalidFormat { .. } => "error_invalid_format",
            LookupError::EmptyInput => "error_empty_input",
            LookupError::TransportBlocked => "error_transport_blocked",
            LookupError::NotRegistered { .. } => "error_not_registered",
            LookupError::UpstreamUnavailable
            | LookupError::FacetUnavailable(_)
            | LookupError::EnrichmentFailed { .. } => "error_upstream_unavailable",
            LookupError::HttpError(_) => "error_network",
            _ => "error_unexpected",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            LookupError::InvalidFormat { .. } => {
                "Invalid format. Belgian VAT/entrepreneur numbers should be 10 digits.".to_string()
            }
            LookupError::EmptyInput => {
                "Please enter a Belgian VAT or entrepreneur number.".to_string()
            }
            LookupError::TransportBlocked => {
                "The directory could not be reached because no network route is available."
                    .to_string()
            }
            LookupError::UpstreamUnavailable => {
                "Unable to retrieve company information. The service may be temporarily unavailable."
                    .to_string()
            }
            LookupError::NotRegistered { .. } => {
                "This company is not registered in the Peppol network.".to_string()
            }
            LookupError::HttpError(_) => {
                "Network error. Please check your internet connection.".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Input => "Enter 10 digits, optionally prefixed with BE",
            ErrorCategory::Directory => "Try again later or check the number with the company",
            ErrorCategory::Network => "Check the network connection or configure a relay_url",
            ErrorCategory::Configuration => "Fix the configuration file or command line flags",
            ErrorCategory::Internal => "Re-run with --verbose and report the log output",
        }
    }
}

pub type Result<T> = std::result::Result<T, LookupError>;
