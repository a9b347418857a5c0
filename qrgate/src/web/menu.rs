//! Navigation menu.
//!
//! The menu is derived from the session's admin flag on every render, so a
//! login or logout shows up in the very response that performed it.

/// Every view the tool can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Scan,
    Login,
    Generate,
    Logout,
}

const PUBLIC_MENU: &[View] = &[View::Scan, View::Login];
const ADMIN_MENU: &[View] = &[View::Scan, View::Generate, View::Logout];

impl View {
    /// Menu entries available for the given admin state.
    pub fn menu(is_admin: bool) -> &'static [View] {
        if is_admin { ADMIN_MENU } else { PUBLIC_MENU }
    }

    pub fn label(&self) -> &'static str {
        match self {
            View::Scan => "Scan QR (Public)",
            View::Login => "Admin Login",
            View::Generate => "Generate QR (Admin)",
            View::Logout => "Logout",
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            View::Scan => "/scan",
            View::Login => "/login",
            View::Generate => "/generate",
            View::Logout => "/logout",
        }
    }

    /// Whether selecting this entry changes state (rendered as a POST button)
    pub fn is_action(&self) -> bool {
        match self {
            View::Logout => true,
            View::Scan | View::Login | View::Generate => false,
        }
    }
}

/// One rendered menu entry
pub struct MenuItem {
    pub label: &'static str,
    pub path: &'static str,
    pub active: bool,
    pub is_action: bool,
}

/// Navigation data shared by every page
pub struct NavContext {
    pub is_admin: bool,
    pub items: Vec<MenuItem>,
}

impl NavContext {
    pub fn new(is_admin: bool, current: View) -> Self {
        let items = View::menu(is_admin)
            .iter()
            .map(|view| MenuItem {
                label: view.label(),
                path: view.path(),
                active: *view == current,
                is_action: view.is_action(),
            })
            .collect();
        Self { is_admin, items }
    }
}
