//! Reporting session identity shared between the app and reporting threads.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;
use uuid::Uuid;

/// Identity attached to every report. Cloned out of [`Session`] when an event
/// is handed to a reporting thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub session_id: String,
    pub user_id: Option<String>,
    pub is_public: bool,
}

/// Shared, mutable session state. Clones refer to the same session.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<RwLock<SessionInfo>>,
}

impl Session {
    /// A fresh anonymous, private session.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(SessionInfo {
                session_id: Uuid::new_v4().to_string(),
                user_id: None,
                is_public: false,
            })),
        }
    }

    pub fn session_id(&self) -> String {
        self.inner.read().session_id.clone()
    }

    /// Start a new session id, keeping the user. Returns the new id.
    pub fn reset(&self) -> String {
        let id = Uuid::new_v4().to_string();
        self.inner.write().session_id = id.clone();
        info!(session_id = %id, "session reset");
        id
    }

    /// Set the signed-in user. An empty id signs out.
    pub fn set_user_id(&self, user_id: impl Into<String>) {
        let user_id = user_id.into();
        self.inner.write().user_id = (!user_id.is_empty()).then_some(user_id);
    }

    pub fn sign_out(&self) {
        let mut inner = self.inner.write();
        inner.user_id = None;
        inner.is_public = false;
    }

    pub fn set_public(&self, is_public: bool) {
        self.inner.write().is_public = is_public;
    }

    pub fn snapshot(&self) -> SessionInfo {
        self.inner.read().clone()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
