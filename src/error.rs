use thiserror::Error;

use crate::model::Sequence;

#[derive(Debug, Error)]
pub enum PrioError {
    #[error("not a prio directory (run `prio init` first)")]
    NotInitialized,

    #[error("prio already initialized in this directory")]
    AlreadyInitialized,

    #[error("task text cannot be empty")]
    EmptyText,

    #[error("no task at position {1} in the {0} list")]
    NoSuchPosition(Sequence, usize),

    #[error("invalid due date '{0}' (expected YYYY-MM-DD)")]
    InvalidDueDate(String),

    #[error("locked by another process: {0}")]
    Locked(String),

    #[error(transparent)]
    IdGeneration(#[from] crate::task_id::IdGenerationError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PrioError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotInitialized => "not_initialized",
            Self::AlreadyInitialized => "already_initialized",
            Self::EmptyText => "empty_text",
            Self::NoSuchPosition(_, _) => "no_such_position",
            Self::InvalidDueDate(_) => "invalid_due_date",
            Self::Locked(_) => "locked",
            Self::IdGeneration(_) => "id_generation",
            Self::Io(_) => "io_error",
            Self::Json(_) => "json_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, PrioError>;
