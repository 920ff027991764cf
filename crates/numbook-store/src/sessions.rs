use crate::paths::SessionLayout;
use numbook_core::{SessionData, SessionId, SessionState, UserId};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Changes every time the user starts over; stale work compares against it.
    pub id: SessionId,
    pub user: UserId,
    pub state: SessionState,
    pub data: SessionData,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Session {
    pub fn new(user: UserId, layout: &SessionLayout) -> Self {
        Self {
            id: SessionId::new(),
            user,
            state: SessionState::Collecting,
            data: SessionData::default(),
            input_dir: layout.input_dir(user),
            output_dir: layout.output_dir(user),
        }
    }
}

/// Live sessions, at most one per user.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<UserId, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `session`, returning the one it replaced.
    pub fn insert(&mut self, session: Session) -> Option<Session> {
        self.sessions.insert(session.user, session)
    }

    pub fn get(&self, user: UserId) -> Option<&Session> {
        self.sessions.get(&user)
    }

    /// Applies a transition result if `id` still names the user's live session.
    pub fn update(
        &mut self,
        user: UserId,
        id: SessionId,
        state: SessionState,
        data: SessionData,
    ) -> bool {
        match self.sessions.get_mut(&user) {
            Some(session) if session.id == id => {
                session.state = state;
                session.data = data;
                true
            }
            _ => false,
        }
    }

    /// Records an upload stored for session `id`.
    pub fn record_upload(
        &mut self,
        user: UserId,
        id: SessionId,
        file_name: String,
    ) -> Option<usize> {
        match self.sessions.get_mut(&user) {
            Some(session) if session.id == id => {
                session.data.record_upload(file_name);
                Some(session.data.uploaded_files.len())
            }
            _ => None,
        }
    }

    pub fn remove(&mut self, user: UserId) -> Option<Session> {
        self.sessions.remove(&user)
    }

    pub fn remove_if_current(&mut self, user: UserId, id: SessionId) -> Option<Session> {
        match self.sessions.get(&user) {
            Some(session) if session.id == id => self.sessions.remove(&user),
            _ => None,
        }
    }

    pub fn clear(&mut self) -> usize {
        let count = self.sessions.len();
        self.sessions.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
