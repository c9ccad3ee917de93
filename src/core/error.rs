use thiserror::Error;

/// Failure classes surfaced by the analytics operations.
///
/// Transport adapters map these onto their own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    FailedPrecondition,
    Upstream,
}

#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// Input rejected before storage was queried.
    #[error("{0}")]
    InvalidArgument(String),

    /// Storage returned too little history to compute a result.
    #[error("{0}")]
    FailedPrecondition(String),

    #[error("failed to {operation} for user {user_id}: {source}")]
    Upstream {
        operation: &'static str,
        user_id: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl AnalyzerError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        AnalyzerError::InvalidArgument(message.into())
    }

    pub fn failed_precondition(message: impl Into<String>) -> Self {
        AnalyzerError::FailedPrecondition(message.into())
    }

    pub fn upstream(operation: &'static str, user_id: &str, source: anyhow::Error) -> Self {
        AnalyzerError::Upstream {
            operation,
            user_id: user_id.to_string(),
            source: source.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalyzerError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            AnalyzerError::FailedPrecondition(_) => ErrorKind::FailedPrecondition,
            AnalyzerError::Upstream { .. } => ErrorKind::Upstream,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;
