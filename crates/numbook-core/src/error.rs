use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("contact name is required")]
    EmptyContactName,
    #[error("output file name is required")]
    EmptyOutputBase,
    #[error("output file name cannot contain path separators: {0}")]
    InvalidOutputBase(String),
    #[error("per-file limit must be a number greater than 0: {0}")]
    InvalidPerFileLimit(String),
    #[error("only .txt files are supported: {0}")]
    UnsupportedUpload(String),
    #[error("invalid upload file name: {0}")]
    InvalidUploadName(String),
    #[error("invalid country code: {0}")]
    InvalidCountryCode(String),
    #[error("invalid digit bounds: {min}..={max}")]
    InvalidDigitBounds { min: usize, max: usize },
}
