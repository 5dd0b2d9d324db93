use thiserror::Error;

pub type Result<T> = std::result::Result<T, SplitError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SplitError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Storage failure: {0}")]
    Store(String),
}

impl SplitError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn denied(reason: impl Into<String>) -> Self {
        Self::PermissionDenied(reason.into())
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidState(reason.into())
    }
}

impl From<mongodb::error::Error> for SplitError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Store(err.to_string())
    }
}
