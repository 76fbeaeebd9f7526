use crate::models::{Message, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// One conversation: an append-only transcript plus the model it talks to and
/// any attachment context pending for the next prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub title: String,
    pub model: String,
    pub transcript: Vec<Message>,
    pub attachment_context: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(title: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            model: model.into(),
            transcript: Vec::new(),
            attachment_context: None,
            created_at: Utc::now(),
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.transcript.push(Message {
            role: Role::User,
            content: content.into(),
        });
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.transcript.push(Message {
            role: Role::Assistant,
            content: content.into(),
        });
    }

    pub fn set_attachment(&mut self, context: impl Into<String>) {
        self.attachment_context = Some(context.into());
    }

    pub fn attachment_context(&self) -> &str {
        self.attachment_context.as_deref().unwrap_or_default()
    }

    /// Empties the transcript and drops any attachment context. The session
    /// itself survives and stays selectable.
    pub fn clear(&mut self) {
        self.transcript.clear();
        self.attachment_context = None;
    }
}

/// Owns every session of one process and tracks which one is active. Passed
/// by reference into handlers; there is no process-wide singleton.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<Uuid, Session>,
    order: Vec<Uuid>,
    active: Option<Uuid>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session and makes it the active one.
    pub fn create(&mut self, title: impl Into<String>, model: impl Into<String>) -> Uuid {
        let session = Session::new(title, model);
        let id = session.id;
        self.sessions.insert(id, session);
        self.order.push(id);
        self.active = Some(id);
        id
    }

    pub fn select(&mut self, id: Uuid) -> bool {
        if self.sessions.contains_key(&id) {
            self.active = Some(id);
            true
        } else {
            false
        }
    }

    pub fn active(&self) -> Option<&Session> {
        self.active.and_then(|id| self.sessions.get(&id))
    }

    pub fn active_mut(&mut self) -> Option<&mut Session> {
        let id = self.active?;
        self.sessions.get_mut(&id)
    }

    /// Sessions in creation order.
    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.order.iter().filter_map(|id| self.sessions.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::SessionStore;
    use crate::models::Role;

    #[test]
    fn create_activates_the_new_session() {
        let mut store = SessionStore::new();
        assert!(store.active().is_none());

        let first = store.create("Chat 1", "tinyllama:latest");
        assert_eq!(store.active().map(|session| session.id), Some(first));

        let second = store.create("Chat 2", "tinyllama:latest");
        assert_eq!(store.active().map(|session| session.id), Some(second));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn select_switches_between_sessions() {
        let mut store = SessionStore::new();
        let first = store.create("Chat 1", "tinyllama:latest");
        store.create("Chat 2", "tinyllama:latest");

        assert!(store.select(first));
        assert_eq!(store.active().map(|session| session.id), Some(first));
        assert!(!store.select(uuid::Uuid::new_v4()));
        assert_eq!(store.active().map(|session| session.id), Some(first));
    }

    #[test]
    fn listing_preserves_creation_order() {
        let mut store = SessionStore::new();
        store.create("Chat 1", "m");
        store.create("Chat 2", "m");
        store.create("Chat 3", "m");

        let titles: Vec<&str> = store.sessions().map(|session| session.title.as_str()).collect();
        assert_eq!(titles, ["Chat 1", "Chat 2", "Chat 3"]);
    }

    #[test]
    fn transcript_allows_consecutive_same_role_messages() {
        let mut store = SessionStore::new();
        store.create("Chat 1", "m");

        let session = store.active_mut().unwrap();
        session.push_user("Attached file: notes.txt");
        session.push_user("summarize it");
        session.push_assistant("Sure.");

        assert_eq!(session.transcript.len(), 3);
        assert_eq!(session.transcript[0].role, Role::User);
        assert_eq!(session.transcript[1].role, Role::User);
    }

    #[test]
    fn clear_empties_transcript_and_attachment_but_keeps_the_session() {
        let mut store = SessionStore::new();
        let id = store.create("Chat 1", "m");

        let session = store.active_mut().unwrap();
        session.push_user("hello");
        session.set_attachment("file body");
        session.clear();

        assert!(session.transcript.is_empty());
        assert_eq!(session.attachment_context(), "");
        assert_eq!(store.active().map(|session| session.id), Some(id));
    }
}
