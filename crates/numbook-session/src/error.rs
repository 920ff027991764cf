use numbook_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
    #[error("no .txt files were uploaded")]
    InputAbsent,
    #[error("no valid phone numbers found in the uploaded files")]
    NoValidContacts,
    #[error("permission denied")]
    PermissionDenied,
    #[error("session was reset before processing finished")]
    Cancelled,
    #[error("background task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionErrorKind {
    StorageFailure,
    InputAbsent,
    NoValidContacts,
    PermissionDenied,
    Cancelled,
}

impl SessionError {
    pub fn kind(&self) -> SessionErrorKind {
        match self {
            SessionError::Storage(_) | SessionError::Task(_) => SessionErrorKind::StorageFailure,
            SessionError::InputAbsent => SessionErrorKind::InputAbsent,
            SessionError::NoValidContacts => SessionErrorKind::NoValidContacts,
            SessionError::PermissionDenied => SessionErrorKind::PermissionDenied,
            SessionError::Cancelled => SessionErrorKind::Cancelled,
        }
    }
}
