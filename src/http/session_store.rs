//! In-process session storage for the HTTP transport.

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use crate::http::request::SessionData;

/// What [`SessionStore::save`] did with a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Saved {
    /// Stored under a newly issued id the client does not know yet.
    Created(String),
    /// Stored under the id the client presented.
    Updated(String),
    /// The session emptied out and its entry was dropped.
    Removed,
    /// Nothing to store.
    Skipped,
}

/// A thread-safe map of session id → session contents.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<DashMap<String, SessionData>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents for `id`, or an empty session when unknown.
    pub fn load(&self, id: Option<&str>) -> SessionData {
        id.and_then(|id| self.inner.get(id).map(|entry| entry.value().clone()))
            .unwrap_or_default()
    }

    /// Persist `data` for the session the client presented as `id`.
    ///
    /// Only known ids are reused; anything else gets a fresh id so clients
    /// cannot choose theirs. Empty sessions are never stored: a known id is
    /// dropped and an unknown one is ignored.
    pub fn save(&self, id: Option<&str>, data: SessionData) -> Saved {
        let known = id.filter(|id| self.inner.contains_key(*id));
        match (known, data.is_empty()) {
            (Some(id), true) => {
                self.inner.remove(id);
                Saved::Removed
            }
            (None, true) => Saved::Skipped,
            (Some(id), false) => {
                self.inner.insert(id.to_string(), data);
                Saved::Updated(id.to_string())
            }
            (None, false) => {
                let id = Uuid::new_v4().simple().to_string();
                self.inner.insert(id.clone(), data);
                Saved::Created(id)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
