//! Error types for the meal planning core.

use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Corrupt record at {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Invalid storage path: {0}")]
    InvalidPath(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Cloneable classification of an [`ApiError`].
///
/// Used where an error has to be retained or fanned out (session error aggregation,
/// status records, log fields) and callers need to match on the kind without
/// inspecting message strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    SchemaViolation,
    ParseFailure,
    UpstreamUnavailable,
    CacheMiss,
    Timeout,
    InvalidTransition,
    StatusNotCompleted,
    InvalidRequest,
    Config,
    Storage,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::SchemaViolation => "schema_violation",
            ErrorKind::ParseFailure => "parse_failure",
            ErrorKind::UpstreamUnavailable => "upstream_unavailable",
            ErrorKind::CacheMiss => "cache_miss",
            ErrorKind::Timeout => "timeout",
            ErrorKind::InvalidTransition => "invalid_transition",
            ErrorKind::StatusNotCompleted => "status_not_completed",
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::Config => "config",
            ErrorKind::Storage => "storage",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by the planning core
#[derive(Debug, Error)]
pub enum ApiError {
    /// Generated structure failed validation against the fixed schema or domain rules.
    #[error("Schema violation in {stage}: {detail}")]
    SchemaViolation { stage: &'static str, detail: String },

    /// No JSON matching the expected shape could be extracted from generation output.
    #[error("Parse failure in {stage}: {detail}")]
    ParseFailure { stage: &'static str, detail: String },

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// No tier produced a complete bundle.
    #[error("No complete bundle for {key}{}", .cause.map(|k| format!(" (generation failed: {k})")).unwrap_or_default())]
    CacheMiss {
        key: String,
        cause: Option<ErrorKind>,
    },

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("Batch for {key} is {state}; results are readable only once completed")]
    StatusNotCompleted { key: String, state: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
}

impl ApiError {
    pub fn schema(stage: &'static str, detail: impl Into<String>) -> Self {
        ApiError::SchemaViolation {
            stage,
            detail: detail.into(),
        }
    }

    pub fn parse(stage: &'static str, detail: impl Into<String>) -> Self {
        ApiError::ParseFailure {
            stage,
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::SchemaViolation { .. } => ErrorKind::SchemaViolation,
            ApiError::ParseFailure { .. } => ErrorKind::ParseFailure,
            ApiError::UpstreamUnavailable(_) => ErrorKind::UpstreamUnavailable,
            ApiError::CacheMiss { .. } => ErrorKind::CacheMiss,
            ApiError::Timeout(_) => ErrorKind::Timeout,
            ApiError::InvalidTransition(_) => ErrorKind::InvalidTransition,
            ApiError::StatusNotCompleted { .. } => ErrorKind::StatusNotCompleted,
            ApiError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            ApiError::ConfigError(_) => ErrorKind::Config,
            ApiError::StorageError(_) => ErrorKind::Storage,
        }
    }

    /// True for the failures the generation pipeline itself can produce.
    pub fn is_generation_failure(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::SchemaViolation | ErrorKind::ParseFailure | ErrorKind::UpstreamUnavailable
        )
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
