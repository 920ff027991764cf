use crate::error::{Result, SessionError};
use crate::reply::{Completion, OutputFile, Reply, Summary};
use numbook_core::{
    transition, ConversionRequest, Effect, Input, PhoneRules, SessionData, SessionId, SessionState,
    Transition, UserId,
};
use numbook_store::{
    run_conversion, ConversionJob, ConversionReport, Session, SessionLayout, SessionStore,
    StoreError, StoreErrorKind,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tokio::task;
use tracing::{debug, info, warn};

/// Drives every user's session. Events for one user are expected one at a
/// time; different users proceed independently.
pub struct Engine {
    layout: SessionLayout,
    rules: PhoneRules,
    admins: Vec<UserId>,
    sessions: Mutex<SessionStore>,
    // Shared by per-user work, exclusive for purge. Taken before any user lock.
    storage: RwLock<()>,
    // Serializes file work on one user's tree, so a reset waits for the
    // pipeline instead of racing its writes.
    user_locks: Mutex<HashMap<UserId, Arc<AsyncMutex<()>>>>,
}

impl Engine {
    pub fn new(layout: SessionLayout, rules: PhoneRules, admins: Vec<UserId>) -> Self {
        Self {
            layout,
            rules,
            admins,
            sessions: Mutex::new(SessionStore::new()),
            storage: RwLock::new(()),
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn layout(&self) -> &SessionLayout {
        &self.layout
    }

    pub fn session(&self, user: UserId) -> Option<Session> {
        self.sessions.lock().get(user).cloned()
    }

    pub fn session_state(&self, user: UserId) -> Option<SessionState> {
        self.sessions.lock().get(user).map(|session| session.state)
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_admin(&self, user: UserId) -> bool {
        self.admins.contains(&user)
    }

    /// Starts a fresh session, discarding anything the user had before.
    pub async fn start(&self, user: UserId) -> Reply {
        let previous = self.sessions.lock().remove(user);
        if let Some(previous) = previous {
            debug!(user = %user, session = %previous.id, "discarding previous session");
        }

        let _storage = self.storage.read().await;
        let user_lock = self.user_lock(user);
        let _user = user_lock.lock().await;
        let layout = self.layout.clone();
        let prepared = blocking(move || {
            layout.remove_user(user)?;
            layout.ensure_user_dirs(user)
        })
        .await;
        if let Err(err) = prepared {
            warn!(user = %user, error = %err, "failed to prepare session storage");
            return Reply::Failed(err);
        }

        let session = Session::new(user, &self.layout);
        debug!(user = %user, session = %session.id, "session started");
        self.sessions.lock().insert(session);
        Reply::Started
    }

    pub async fn upload<R>(
        &self,
        user: UserId,
        file_name: &str,
        mime_type: Option<&str>,
        body: R,
    ) -> Reply
    where
        R: AsyncRead + Unpin + Send,
    {
        let Some(session) = self.session(user) else {
            return Reply::NoSession;
        };
        let step = transition(
            session.state,
            session.data.clone(),
            Input::Upload {
                file_name,
                mime_type,
            },
        );
        self.apply(session, step, Some(body)).await
    }

    pub async fn confirm(&self, user: UserId) -> Reply {
        self.advance(user, Input::Confirm).await
    }

    pub async fn text(&self, user: UserId, text: &str) -> Reply {
        self.advance(user, Input::Text(text)).await
    }

    /// Drops the user's session and files from any state. The record goes at
    /// once; file removal waits for a pipeline still running for this user.
    pub async fn reset(&self, user: UserId) -> Reply {
        let removed = self.sessions.lock().remove(user);
        let _storage = self.storage.read().await;
        let user_lock = self.user_lock(user);
        let _user = user_lock.lock().await;
        let layout = self.layout.clone();
        match blocking(move || layout.remove_user(user)).await {
            Ok(()) => {
                debug!(user = %user, had_session = removed.is_some(), "session reset");
                Reply::Reset
            }
            Err(err) => {
                warn!(user = %user, error = %err, "failed to remove session files");
                Reply::Failed(err)
            }
        }
    }

    /// Removes every user's files. Only allow-listed identities may do this;
    /// the check happens before anything is touched.
    pub async fn purge(&self, user: UserId) -> Reply {
        if !self.is_admin(user) {
            warn!(user = %user, "purge denied");
            return Reply::Failed(SessionError::PermissionDenied);
        }

        let _storage = self.storage.write().await;
        let cleared = self.sessions.lock().clear();
        self.user_locks.lock().clear();
        let layout = self.layout.clone();
        match blocking(move || layout.remove_all()).await {
            Ok(users) => {
                info!(user = %user, users, sessions = cleared, "purged session storage");
                Reply::Purged { users }
            }
            Err(err) => {
                warn!(user = %user, error = %err, "purge failed");
                Reply::Failed(err)
            }
        }
    }

    async fn advance(&self, user: UserId, input: Input<'_>) -> Reply {
        let Some(session) = self.session(user) else {
            return Reply::NoSession;
        };
        let step = transition(session.state, session.data.clone(), input);
        self.apply(session, step, None::<tokio::io::Empty>).await
    }

    async fn apply<R>(&self, session: Session, step: Transition, body: Option<R>) -> Reply
    where
        R: AsyncRead + Unpin + Send,
    {
        let Transition {
            state,
            data,
            effect,
        } = step;
        match effect {
            Effect::SaveUpload { file_name } => match body {
                Some(body) => self.save_upload(&session, file_name, body).await,
                None => Reply::Unexpected { state },
            },
            Effect::Process(request) => self.process(session, state, data, request).await,
            effect => {
                let updated = self
                    .sessions
                    .lock()
                    .update(session.user, session.id, state, data);
                if !updated {
                    return Reply::NoSession;
                }
                debug!(user = %session.user, state = %state, "session advanced");
                prompt_reply(state, effect)
            }
        }
    }

    async fn save_upload<R>(&self, session: &Session, file_name: String, mut body: R) -> Reply
    where
        R: AsyncRead + Unpin + Send,
    {
        let _storage = self.storage.read().await;
        let user_lock = self.user_lock(session.user);
        let _user = user_lock.lock().await;
        let path = session.input_dir.join(&file_name);
        if let Err(source) = write_stream(&path, &mut body).await {
            warn!(user = %session.user, file = %file_name, error = %source, "upload failed");
            self.teardown(session.user, session.id).await;
            return Reply::Failed(SessionError::Storage(StoreError::Write { path, source }));
        }

        let recorded =
            self.sessions
                .lock()
                .record_upload(session.user, session.id, file_name.clone());
        match recorded {
            Some(total) => {
                debug!(user = %session.user, file = %file_name, total, "upload stored");
                Reply::UploadAccepted { file_name, total }
            }
            None => Reply::NoSession,
        }
    }

    async fn process(
        &self,
        session: Session,
        state: SessionState,
        data: SessionData,
        request: ConversionRequest,
    ) -> Reply {
        // Both locks are held before the session shows as processing, so a
        // purge queued after that point waits for the pipeline.
        let _storage = self.storage.read().await;
        let user_lock = self.user_lock(session.user);
        let _user = user_lock.lock().await;
        let user = session.user;
        let updated = self.sessions.lock().update(user, session.id, state, data);
        if !updated {
            return Reply::NoSession;
        }
        let job = ConversionJob {
            input_dir: session.input_dir,
            output_dir: session.output_dir,
            contact_name: request.contact_name,
            output_base: request.output_base,
            per_file: request.per_file,
            rules: self.rules.clone(),
        };
        debug!(user = %user, per_file = %job.per_file, "processing session");
        let outcome = blocking(move || convert_and_collect(&job)).await;

        if !self.teardown(user, session.id).await {
            debug!(user = %user, "session reset while processing; result discarded");
            return Reply::Failed(SessionError::Cancelled);
        }

        match outcome {
            Ok((report, _)) if !report.has_contacts() => {
                info!(user = %user, invalid = report.invalid, "no valid numbers");
                Reply::Failed(SessionError::NoValidContacts)
            }
            Ok((report, files)) => {
                info!(
                    user = %user,
                    total = report.total,
                    invalid = report.invalid,
                    files = files.len(),
                    "conversion finished"
                );
                Reply::Completed(Completion {
                    summary: Summary {
                        total: report.total,
                        invalid: report.invalid,
                        files: files.len(),
                        overwritten: report.overwritten.len(),
                    },
                    files,
                })
            }
            Err(SessionError::Storage(err)) if err.kind() == StoreErrorKind::InputAbsent => {
                info!(user = %user, "no source files uploaded");
                Reply::Failed(SessionError::InputAbsent)
            }
            Err(err) => {
                warn!(user = %user, error = %err, "conversion failed");
                Reply::Failed(err)
            }
        }
    }

    fn user_lock(&self, user: UserId) -> Arc<AsyncMutex<()>> {
        Arc::clone(self.user_locks.lock().entry(user).or_default())
    }

    /// Removes the session record and its files if `id` is still the user's
    /// live session. Returns false when the session was already replaced or reset.
    /// Callers hold the user's lock.
    async fn teardown(&self, user: UserId, id: SessionId) -> bool {
        let removed = self.sessions.lock().remove_if_current(user, id);
        if removed.is_none() {
            return false;
        }
        let layout = self.layout.clone();
        if let Err(err) = blocking(move || layout.remove_user(user)).await {
            warn!(user = %user, error = %err, "failed to remove session files");
        }
        true
    }
}

fn prompt_reply(state: SessionState, effect: Effect) -> Reply {
    match effect {
        Effect::AskContactName { files } => Reply::AskContactName { files },
        Effect::AskOutputBase => Reply::AskOutputBase,
        Effect::AskPerFileLimit => Reply::AskPerFileLimit,
        Effect::Invalid(err) => Reply::Invalid(err),
        Effect::NothingUploaded => Reply::NothingUploaded,
        Effect::Unexpected { state } => Reply::Unexpected { state },
        Effect::SaveUpload { .. } | Effect::Process(_) => Reply::Unexpected { state },
    }
}

fn convert_and_collect(
    job: &ConversionJob,
) -> std::result::Result<(ConversionReport, Vec<OutputFile>), StoreError> {
    let report = run_conversion(job)?;
    let mut files = Vec::with_capacity(report.files.len());
    for path in &report.files {
        let data = fs::read(path)?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        files.push(OutputFile { name, data });
    }
    Ok((report, files))
}

async fn write_stream<R>(path: &Path, body: &mut R) -> io::Result<u64>
where
    R: AsyncRead + Unpin + Send,
{
    let mut file = tokio::fs::File::create(path).await?;
    let written = tokio::io::copy(body, &mut file).await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(written)
}

async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> std::result::Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    match task::spawn_blocking(work).await {
        Ok(result) => result.map_err(SessionError::from),
        Err(err) => Err(SessionError::Task(err.to_string())),
    }
}
