//! In-memory session state.
//!
//! Each browser session gets a `Session` keyed by a random id carried in a
//! cookie. Nothing is persisted: sessions disappear on restart, or once they
//! sit idle longer than the configured timeout.

use rand::Rng;
use rand::distr::Alphanumeric;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Length of generated session ids
const SESSION_ID_LEN: usize = 64;

/// State held for one browser session
#[derive(Debug, Clone)]
pub struct Session {
    is_admin: bool,
    last_seen: Instant,
}

impl Session {
    /// A fresh, unauthenticated session
    pub fn new() -> Self {
        Self {
            is_admin: false,
            last_seen: Instant::now(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn set_admin(&mut self, is_admin: bool) {
        self.is_admin = is_admin;
    }

    fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    fn is_expired(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry of live sessions.
///
/// Every session is only ever read or written by requests carrying its own
/// id, so the lock only guards the map itself.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    timeout: Duration,
}

impl SessionStore {
    /// Create an empty store whose sessions expire after `timeout` of inactivity.
    pub fn new(timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            timeout,
        }
    }

    /// Generate a random session ID.
    fn generate_session_id() -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(SESSION_ID_LEN)
            .map(char::from)
            .collect()
    }

    /// Return a live session id for the caller.
    ///
    /// Reuses `session_id` when it names an unexpired session, otherwise
    /// creates a new unauthenticated session. The flag is `true` when a new
    /// session was created (the caller must hand out the new id).
    pub async fn resolve(&self, session_id: Option<&str>) -> (String, bool) {
        let mut sessions = self.sessions.write().await;

        if let Some(id) = session_id {
            match sessions.get_mut(id) {
                Some(session) if !session.is_expired(self.timeout) => {
                    session.touch();
                    return (id.to_string(), false);
                }
                Some(_) => {
                    sessions.remove(id);
                    debug!("Session expired, issuing a new one");
                }
                None => {}
            }
        }

        let id = Self::generate_session_id();
        sessions.insert(id.clone(), Session::new());
        debug!("Created session ({} active)", sessions.len());
        (id, true)
    }

    /// Whether the session is authenticated as admin. Unknown ids are not.
    pub async fn get_is_admin(&self, session_id: &str) -> bool {
        self.sessions
            .read()
            .await
            .get(session_id)
            .is_some_and(Session::is_admin)
    }

    /// Set the admin flag of a session. Unknown ids are ignored.
    pub async fn set_is_admin(&self, session_id: &str, is_admin: bool) {
        if let Some(session) = self.sessions.write().await.get_mut(session_id) {
            session.set_admin(is_admin);
            session.touch();
        }
    }

    /// Number of sessions currently held (expired ones included until cleanup)
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Delete all sessions idle past the timeout (background cleanup task).
    pub async fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(self.timeout));
        before - sessions.len()
    }
}
