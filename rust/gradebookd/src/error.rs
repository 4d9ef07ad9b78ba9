use serde_json::json;
use thiserror::Error;

/// Domain errors raised by the grade store and the IPC handlers.
#[derive(Debug, Error)]
pub enum GradebookError {
    #[error("{0}")]
    BadParams(String),

    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("select a workspace first")]
    NoWorkspace,

    #[error("document load failed: {0}")]
    Load(String),

    #[error(transparent)]
    Db(#[from] rusqlite::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl GradebookError {
    pub fn bad_params(message: impl Into<String>) -> Self {
        Self::BadParams(message.into())
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Stable wire code for the response envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadParams(_) => "bad_params",
            Self::Validation { .. } => "validation_failed",
            Self::NotFound(_) => "not_found",
            Self::Forbidden(_) => "forbidden",
            Self::NoWorkspace => "no_workspace",
            Self::Load(_) => "load_failed",
            Self::Db(_) => "db_query_failed",
            Self::Internal(_) => "internal",
        }
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Validation { field, .. } => Some(json!({ "field": field })),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, GradebookError>;
