//! Web UI module.
//!
//! Provides:
//! - Per-browser sessions carried in a cookie
//! - The navigation menu, rebuilt from session state on every render
//! - Routes for the scan, login, generate and logout flows

pub mod menu;
pub mod routes;
pub mod state;
pub mod templates;

pub use menu::View;
pub use routes::app_router;
pub use state::AppState;
