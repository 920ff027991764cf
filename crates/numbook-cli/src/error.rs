use anyhow::Error;
use numbook_config::ConfigError;
use numbook_core::CoreError;
use numbook_session::{SessionError, SessionErrorKind};
use numbook_store::{StoreError, StoreErrorKind};
use std::process::ExitCode;
use thiserror::Error as ThisError;

pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_NOT_FOUND: u8 = 2;
pub const EXIT_INVALID_INPUT: u8 = 3;

#[derive(Debug, ThisError)]
pub enum CliError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not found: {0}")]
    NotFound(String),
}

pub fn invalid_input(message: impl Into<String>) -> Error {
    CliError::InvalidInput(message.into()).into()
}

pub fn not_found(message: impl Into<String>) -> Error {
    CliError::NotFound(message.into()).into()
}

pub fn report_error(err: &Error, verbose: bool) {
    if verbose {
        eprintln!("error: {:#}", err);
    } else {
        eprintln!("error: {}", err);
    }
}

pub fn exit_code_for(err: &Error) -> ExitCode {
    ExitCode::from(exit_status(err))
}

fn exit_status(err: &Error) -> u8 {
    for cause in err.chain() {
        if let Some(cli_err) = cause.downcast_ref::<CliError>() {
            return match cli_err {
                CliError::InvalidInput(_) => EXIT_INVALID_INPUT,
                CliError::NotFound(_) => EXIT_NOT_FOUND,
            };
        }
        if let Some(session_err) = cause.downcast_ref::<SessionError>() {
            return session_exit_code(session_err);
        }
        if let Some(store_err) = cause.downcast_ref::<StoreError>() {
            return store_exit_code(store_err);
        }
        if let Some(config_err) = cause.downcast_ref::<ConfigError>() {
            return config_exit_code(config_err);
        }
        if let Some(_core_err) = cause.downcast_ref::<CoreError>() {
            return EXIT_INVALID_INPUT;
        }
    }
    EXIT_FAILURE
}

fn store_exit_code(err: &StoreError) -> u8 {
    match err.kind() {
        StoreErrorKind::InputAbsent => EXIT_NOT_FOUND,
        StoreErrorKind::InvalidDataPath | StoreErrorKind::Core => EXIT_INVALID_INPUT,
        StoreErrorKind::MissingHomeDir | StoreErrorKind::Io | StoreErrorKind::Write => {
            EXIT_FAILURE
        }
    }
}

fn session_exit_code(err: &SessionError) -> u8 {
    match err.kind() {
        SessionErrorKind::InputAbsent => EXIT_NOT_FOUND,
        SessionErrorKind::NoValidContacts => EXIT_INVALID_INPUT,
        SessionErrorKind::PermissionDenied
        | SessionErrorKind::StorageFailure
        | SessionErrorKind::Cancelled => EXIT_FAILURE,
    }
}

fn config_exit_code(err: &ConfigError) -> u8 {
    match err {
        ConfigError::MissingHomeDir => EXIT_FAILURE,
        ConfigError::InvalidConfigPath(_)
        | ConfigError::MissingConfigFile(_)
        | ConfigError::InsecurePermissions(_)
        | ConfigError::InvalidSessionsDir(_)
        | ConfigError::InvalidCountryCode(_)
        | ConfigError::InvalidDigitBounds { .. }
        | ConfigError::Read { .. }
        | ConfigError::Parse { .. } => EXIT_INVALID_INPUT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_kind() {
        assert_eq!(exit_status(&not_found("x")), EXIT_NOT_FOUND);
        assert_eq!(exit_status(&invalid_input("x")), EXIT_INVALID_INPUT);
        let core = Error::new(CoreError::EmptyContactName).context("parse contact name");
        assert_eq!(exit_status(&core), EXIT_INVALID_INPUT);
        let absent = Error::new(StoreError::InputAbsent("in".into()));
        assert_eq!(exit_status(&absent), EXIT_NOT_FOUND);
        let empty = Error::new(SessionError::NoValidContacts);
        assert_eq!(exit_status(&empty), EXIT_INVALID_INPUT);
        assert_eq!(exit_status(&anyhow::anyhow!("boom")), EXIT_FAILURE);
    }
}
