use crate::error::{SessionError, SessionErrorKind};
use numbook_core::{CoreError, SessionState};
use std::fmt;

/// A generated card file handed back to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub name: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub invalid: usize,
    pub files: usize,
    pub overwritten: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub summary: Summary,
    pub files: Vec<OutputFile>,
}

#[derive(Debug)]
pub enum Reply {
    Started,
    UploadAccepted { file_name: String, total: usize },
    NothingUploaded,
    AskContactName { files: Vec<String> },
    AskOutputBase,
    AskPerFileLimit,
    /// Input rejected; the session stays where it was.
    Invalid(CoreError),
    Unexpected { state: SessionState },
    NoSession,
    Completed(Completion),
    Failed(SessionError),
    Reset,
    Purged { users: usize },
}

impl Reply {
    pub fn error_kind(&self) -> Option<SessionErrorKind> {
        match self {
            Reply::Failed(err) => Some(err.kind()),
            _ => None,
        }
    }

    /// Stable snake_case tag for machine-readable output.
    pub fn status(&self) -> &'static str {
        match self {
            Reply::Started => "started",
            Reply::UploadAccepted { .. } => "upload_accepted",
            Reply::NothingUploaded => "nothing_uploaded",
            Reply::AskContactName { .. } => "ask_contact_name",
            Reply::AskOutputBase => "ask_output_base",
            Reply::AskPerFileLimit => "ask_per_file_limit",
            Reply::Invalid(_) => "invalid",
            Reply::Unexpected { .. } => "unexpected",
            Reply::NoSession => "no_session",
            Reply::Completed(_) => "completed",
            Reply::Failed(err) => match err.kind() {
                SessionErrorKind::StorageFailure => "storage_failure",
                SessionErrorKind::InputAbsent => "input_absent",
                SessionErrorKind::NoValidContacts => "no_valid_contacts",
                SessionErrorKind::PermissionDenied => "permission_denied",
                SessionErrorKind::Cancelled => "cancelled",
            },
            Reply::Reset => "reset",
            Reply::Purged { .. } => "purged",
        }
    }

    pub fn files(&self) -> &[OutputFile] {
        match self {
            Reply::Completed(completion) => &completion.files,
            _ => &[],
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Started => write!(
                f,
                "Send one or more .txt files (one number per line). Confirm when you are done."
            ),
            Reply::UploadAccepted { file_name, total } => write!(
                f,
                "{file_name} saved. Total: {total} file(s). Confirm when you are done."
            ),
            Reply::NothingUploaded => {
                write!(f, "No .txt file uploaded yet. Upload one, then confirm.")
            }
            Reply::AskContactName { files } => {
                writeln!(f, "Uploaded files ({}):", files.len())?;
                for name in files {
                    writeln!(f, "- {name}")?;
                }
                write!(f, "\nEnter the base contact name:")
            }
            Reply::AskOutputBase => {
                write!(f, "Enter the base output file name (e.g. Contacts, Friends):")
            }
            Reply::AskPerFileLimit => {
                write!(f, "How many contacts per .vcf file at most? (number, e.g. 500)")
            }
            Reply::Invalid(err) => write!(f, "{}", invalid_message(err)),
            Reply::Unexpected { state } => match state {
                SessionState::Collecting => write!(f, "Send a .txt file or confirm your uploads."),
                SessionState::AskContactName => write!(f, "Enter the base contact name:"),
                SessionState::AskOutputBase => write!(f, "Enter the base output file name:"),
                SessionState::AskPerFileLimit => {
                    write!(f, "Enter the maximum number of contacts per file:")
                }
                SessionState::Processing => write!(f, "Still processing, please wait."),
            },
            Reply::NoSession => write!(f, "No active session. Start a new one first."),
            Reply::Completed(completion) => {
                let summary = completion.summary;
                write!(
                    f,
                    "Done!\n- Valid contacts: {}\n- Skipped lines (invalid): {}\n- VCF files: {}",
                    summary.total, summary.invalid, summary.files
                )?;
                if summary.overwritten > 0 {
                    write!(f, "\n- Overwritten files: {}", summary.overwritten)?;
                }
                Ok(())
            }
            Reply::Failed(SessionError::NoValidContacts) => {
                write!(f, "No valid numbers in the uploaded files.")
            }
            Reply::Failed(SessionError::PermissionDenied) => {
                write!(f, "You are not allowed to run this command.")
            }
            Reply::Failed(err) => write!(f, "An error occurred: {err}"),
            Reply::Reset => write!(f, "Your session cache and temporary files were removed."),
            Reply::Purged { users } => {
                write!(f, "All cached sessions ({users} user(s)) were removed.")
            }
        }
    }
}

fn invalid_message(err: &CoreError) -> String {
    match err {
        CoreError::EmptyContactName => "Contact name cannot be empty. Try again:".to_string(),
        CoreError::EmptyOutputBase => "Output file name cannot be empty. Try again:".to_string(),
        CoreError::InvalidOutputBase(_) => {
            "Output file name cannot contain path separators. Try again:".to_string()
        }
        CoreError::InvalidPerFileLimit(_) => {
            "Must be a number greater than 0. Try again:".to_string()
        }
        CoreError::UnsupportedUpload(_) => "Only .txt files are supported.".to_string(),
        other => format!("{other}. Try again:"),
    }
}

#[cfg(test)]
mod tests {
    use super::{Completion, Reply, Summary};
    use crate::error::{SessionError, SessionErrorKind};
    use numbook_core::CoreError;

    #[test]
    fn completion_summary_lists_counts() {
        let reply = Reply::Completed(Completion {
            summary: Summary {
                total: 3,
                invalid: 2,
                files: 1,
                overwritten: 0,
            },
            files: Vec::new(),
        });
        let text = reply.to_string();
        assert!(text.contains("Valid contacts: 3"));
        assert!(text.contains("Skipped lines (invalid): 2"));
        assert!(!text.contains("Overwritten"));
    }

    #[test]
    fn no_valid_contacts_differs_from_input_absent() {
        let empty = Reply::Failed(SessionError::NoValidContacts);
        let absent = Reply::Failed(SessionError::InputAbsent);
        assert_ne!(empty.to_string(), absent.to_string());
        assert_eq!(empty.error_kind(), Some(SessionErrorKind::NoValidContacts));
        assert_eq!(absent.error_kind(), Some(SessionErrorKind::InputAbsent));
        assert_eq!(empty.status(), "no_valid_contacts");
        assert_eq!(absent.status(), "input_absent");
    }

    #[test]
    fn invalid_input_reprompts() {
        let reply = Reply::Invalid(CoreError::InvalidPerFileLimit("x".to_string()));
        assert!(reply.to_string().contains("greater than 0"));
        assert!(reply.error_kind().is_none());
    }
}
