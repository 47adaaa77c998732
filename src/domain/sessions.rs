//! In-memory conversation sessions
//!
//! Sessions live for the lifetime of the process. Each holds the ordered
//! user/assistant turns that are replayed to the upstream model on every
//! generation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub history: Vec<Turn>,
}

/// Shared map of session id to history.
///
/// The lock is only held for the duration of a single operation, never across
/// an upstream call, so two generations against the same session may
/// interleave their turns.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> String {
        let session_id = Uuid::new_v4().to_string();
        self.sessions
            .write()
            .await
            .insert(session_id.clone(), Session::default());
        session_id
    }

    /// Returns a snapshot of the session, if it exists.
    pub async fn get(&self, session_id: &str) -> Option<Session> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Returns `requested` when it names a live session, otherwise creates a
    /// fresh one and returns its id.
    pub async fn resolve_or_create(&self, requested: Option<&str>) -> String {
        let mut sessions = self.sessions.write().await;
        if let Some(session_id) = requested.filter(|id| sessions.contains_key(*id)) {
            return session_id.to_string();
        }

        let session_id = Uuid::new_v4().to_string();
        sessions.insert(session_id.clone(), Session::default());
        session_id
    }

    /// Appends a turn and returns the full history after the append.
    pub async fn append(&self, session_id: &str, turn: Turn) -> Result<Vec<Turn>, AppError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| AppError::not_found(session_id))?;
        session.history.push(turn);
        Ok(session.history.clone())
    }

    pub async fn delete(&self, session_id: &str) -> Result<(), AppError> {
        self.sessions
            .write()
            .await
            .remove(session_id)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found(session_id))
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
