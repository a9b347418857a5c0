//! Shared web state and constants.

use crate::config::Config;
use crate::qr::RenderOptions;
use crate::session::SessionStore;

/// State shared by all routes
pub struct AppState {
    /// Per-browser session flags
    pub sessions: SessionStore,
    /// The configured admin password
    pub admin_password: String,
    /// Rendering of generated codes
    pub render: RenderOptions,
    /// Cookie name for the session ID
    pub cookie_name: String,
    /// Request body cap for uploads
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            sessions: SessionStore::new(config.session.timeout()),
            admin_password: config.admin.password.clone(),
            render: config.qr.render_options(),
            cookie_name: config.session.cookie_name.clone(),
            max_upload_bytes: config.server.max_upload_bytes,
        }
    }

    /// Exact comparison against the configured password.
    pub fn password_matches(&self, attempt: &str) -> bool {
        attempt == self.admin_password
    }
}
