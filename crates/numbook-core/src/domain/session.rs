use crate::domain::names::{ContactName, OutputBase};
use crate::error::CoreError;
use crate::rules::batch::PerFileLimit;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SOURCE_EXTENSION: &str = "txt";
pub const SOURCE_MIME_TYPE: &str = "text/plain";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Collecting,
    AskContactName,
    AskOutputBase,
    AskPerFileLimit,
    Processing,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::Collecting => "collecting",
            SessionState::AskContactName => "ask_contact_name",
            SessionState::AskOutputBase => "ask_output_base",
            SessionState::AskPerFileLimit => "ask_per_file_limit",
            SessionState::Processing => "processing",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionData {
    pub uploaded_files: Vec<String>,
    pub contact_name: Option<ContactName>,
    pub output_base: Option<OutputBase>,
    pub per_file: Option<PerFileLimit>,
}

impl SessionData {
    pub fn record_upload(&mut self, file_name: String) {
        self.uploaded_files.push(file_name);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input<'a> {
    Upload {
        file_name: &'a str,
        mime_type: Option<&'a str>,
    },
    Confirm,
    Text(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub contact_name: ContactName,
    pub output_base: OutputBase,
    pub per_file: PerFileLimit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Store the upload under this sanitized name, then record it. The name
    /// always ends in `.txt` so the planner picks the file up.
    SaveUpload { file_name: String },
    AskContactName { files: Vec<String> },
    AskOutputBase,
    AskPerFileLimit,
    Process(ConversionRequest),
    /// Input rejected; the current prompt stands.
    Invalid(CoreError),
    NothingUploaded,
    Unexpected { state: SessionState },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: SessionState,
    pub data: SessionData,
    pub effect: Effect,
}

impl Transition {
    fn stay(state: SessionState, data: SessionData, effect: Effect) -> Self {
        Self {
            state,
            data,
            effect,
        }
    }
}

pub fn transition(state: SessionState, mut data: SessionData, input: Input<'_>) -> Transition {
    match (state, input) {
        (
            SessionState::Collecting,
            Input::Upload {
                file_name,
                mime_type,
            },
        ) => {
            if !is_text_upload(file_name, mime_type) {
                let err = CoreError::UnsupportedUpload(file_name.to_string());
                return Transition::stay(state, data, Effect::Invalid(err));
            }
            match sanitize_upload_name(file_name) {
                Ok(file_name) => Transition::stay(
                    state,
                    data,
                    Effect::SaveUpload {
                        file_name: source_file_name(file_name),
                    },
                ),
                Err(err) => Transition::stay(state, data, Effect::Invalid(err)),
            }
        }
        (SessionState::Collecting, Input::Confirm) => {
            if data.uploaded_files.is_empty() {
                return Transition::stay(state, data, Effect::NothingUploaded);
            }
            let files = data.uploaded_files.clone();
            Transition::stay(
                SessionState::AskContactName,
                data,
                Effect::AskContactName { files },
            )
        }
        (SessionState::AskContactName, Input::Text(text)) => match ContactName::new(text) {
            Ok(name) => {
                data.contact_name = Some(name);
                Transition::stay(SessionState::AskOutputBase, data, Effect::AskOutputBase)
            }
            Err(err) => Transition::stay(state, data, Effect::Invalid(err)),
        },
        (SessionState::AskOutputBase, Input::Text(text)) => match OutputBase::new(text) {
            Ok(base) => {
                data.output_base = Some(base);
                Transition::stay(SessionState::AskPerFileLimit, data, Effect::AskPerFileLimit)
            }
            Err(err) => Transition::stay(state, data, Effect::Invalid(err)),
        },
        (SessionState::AskPerFileLimit, Input::Text(text)) => {
            let per_file = match PerFileLimit::parse(text) {
                Ok(per_file) => per_file,
                Err(err) => return Transition::stay(state, data, Effect::Invalid(err)),
            };
            let (Some(contact_name), Some(output_base)) =
                (data.contact_name.clone(), data.output_base.clone())
            else {
                return Transition::stay(state, data, Effect::Unexpected { state });
            };
            data.per_file = Some(per_file);
            Transition::stay(
                SessionState::Processing,
                data,
                Effect::Process(ConversionRequest {
                    contact_name,
                    output_base,
                    per_file,
                }),
            )
        }
        (state, _) => Transition::stay(state, data, Effect::Unexpected { state }),
    }
}

pub fn is_text_upload(file_name: &str, mime_type: Option<&str>) -> bool {
    if is_source_file_name(file_name) {
        return true;
    }
    mime_type
        .and_then(|mime| mime.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(SOURCE_MIME_TYPE))
}

/// Source files picked up by the planner: `*.txt`, extension case-insensitive.
pub fn is_source_file_name(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .is_some_and(|(stem, ext)| !stem.is_empty() && ext.eq_ignore_ascii_case(SOURCE_EXTENSION))
}

/// Appends `.txt` to accepted plain-text uploads named otherwise.
fn source_file_name(file_name: String) -> String {
    if is_source_file_name(&file_name) {
        file_name
    } else {
        format!("{file_name}.{SOURCE_EXTENSION}")
    }
}

pub fn sanitize_upload_name(raw: &str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains(&['/', '\\', '\0'][..])
    {
        return Err(CoreError::InvalidUploadName(raw.to_string()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str) -> Input<'_> {
        Input::Upload {
            file_name: name,
            mime_type: None,
        }
    }

    fn collecting_with_file() -> SessionData {
        let mut data = SessionData::default();
        data.record_upload("numbers.txt".to_string());
        data
    }

    #[test]
    fn upload_txt_requests_save() {
        let step = transition(
            SessionState::Collecting,
            SessionData::default(),
            upload("numbers.TXT"),
        );
        assert_eq!(step.state, SessionState::Collecting);
        assert_eq!(
            step.effect,
            Effect::SaveUpload {
                file_name: "numbers.TXT".to_string()
            }
        );
        assert!(step.data.uploaded_files.is_empty());
    }

    #[test]
    fn upload_accepts_declared_plain_text() {
        let step = transition(
            SessionState::Collecting,
            SessionData::default(),
            Input::Upload {
                file_name: "export.csv",
                mime_type: Some("text/plain; charset=utf-8"),
            },
        );
        assert_eq!(
            step.effect,
            Effect::SaveUpload {
                file_name: "export.csv.txt".to_string()
            }
        );
        assert!(is_source_file_name("export.csv.txt"));
    }

    #[test]
    fn upload_keeps_txt_names() {
        let step = transition(
            SessionState::Collecting,
            SessionData::default(),
            upload("Numbers.TXT"),
        );
        assert_eq!(
            step.effect,
            Effect::SaveUpload {
                file_name: "Numbers.TXT".to_string()
            }
        );
    }

    #[test]
    fn upload_rejects_other_types() {
        let step = transition(
            SessionState::Collecting,
            SessionData::default(),
            Input::Upload {
                file_name: "photo.jpg",
                mime_type: Some("image/jpeg"),
            },
        );
        assert_eq!(step.state, SessionState::Collecting);
        assert!(matches!(
            step.effect,
            Effect::Invalid(CoreError::UnsupportedUpload(_))
        ));
    }

    #[test]
    fn upload_rejects_path_names() {
        let step = transition(
            SessionState::Collecting,
            SessionData::default(),
            upload("../../etc/passwd.txt"),
        );
        assert!(matches!(
            step.effect,
            Effect::Invalid(CoreError::InvalidUploadName(_))
        ));
    }

    #[test]
    fn confirm_requires_an_upload() {
        let step = transition(
            SessionState::Collecting,
            SessionData::default(),
            Input::Confirm,
        );
        assert_eq!(step.state, SessionState::Collecting);
        assert_eq!(step.effect, Effect::NothingUploaded);

        let step = transition(SessionState::Collecting, collecting_with_file(), Input::Confirm);
        assert_eq!(step.state, SessionState::AskContactName);
        assert_eq!(
            step.effect,
            Effect::AskContactName {
                files: vec!["numbers.txt".to_string()]
            }
        );
    }

    #[test]
    fn prompts_advance_through_to_processing() {
        let step = transition(
            SessionState::AskContactName,
            collecting_with_file(),
            Input::Text(" Budi "),
        );
        assert_eq!(step.state, SessionState::AskOutputBase);
        let step = transition(step.state, step.data, Input::Text("Kontak"));
        assert_eq!(step.state, SessionState::AskPerFileLimit);
        let step = transition(step.state, step.data, Input::Text("500"));
        assert_eq!(step.state, SessionState::Processing);
        match step.effect {
            Effect::Process(request) => {
                assert_eq!(request.contact_name.as_str(), "Budi");
                assert_eq!(request.output_base.as_str(), "Kontak");
                assert_eq!(request.per_file.get(), 500);
            }
            other => panic!("unexpected effect: {other:?}"),
        }
    }

    #[test]
    fn invalid_text_reprompts_without_advancing() {
        let step = transition(
            SessionState::AskContactName,
            collecting_with_file(),
            Input::Text("  "),
        );
        assert_eq!(step.state, SessionState::AskContactName);
        assert_eq!(step.effect, Effect::Invalid(CoreError::EmptyContactName));

        let mut data = collecting_with_file();
        data.contact_name = Some(ContactName::new("Budi").expect("name"));
        data.output_base = Some(OutputBase::new("Kontak").expect("base"));
        let before = data.clone();
        let step = transition(SessionState::AskPerFileLimit, data, Input::Text("0"));
        assert_eq!(step.state, SessionState::AskPerFileLimit);
        assert_eq!(step.data, before);
        assert!(matches!(
            step.effect,
            Effect::Invalid(CoreError::InvalidPerFileLimit(_))
        ));
    }

    #[test]
    fn events_outside_their_state_change_nothing() {
        let data = collecting_with_file();
        let step = transition(
            SessionState::AskContactName,
            data.clone(),
            upload("more.txt"),
        );
        assert_eq!(step.state, SessionState::AskContactName);
        assert_eq!(step.data, data);
        assert_eq!(
            step.effect,
            Effect::Unexpected {
                state: SessionState::AskContactName
            }
        );

        let step = transition(SessionState::Collecting, data.clone(), Input::Text("hello"));
        assert_eq!(step.state, SessionState::Collecting);
        assert_eq!(step.data, data);

        let step = transition(SessionState::Processing, data.clone(), Input::Confirm);
        assert_eq!(step.state, SessionState::Processing);
        assert_eq!(step.data, data);
    }

    #[test]
    fn source_file_names_match_extension() {
        assert!(is_source_file_name("a.txt"));
        assert!(is_source_file_name("A.TXT"));
        assert!(!is_source_file_name(".txt"));
        assert!(!is_source_file_name("a.csv"));
        assert!(!is_source_file_name("txt"));
    }
}
