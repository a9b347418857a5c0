//! Askama templates for the web UI.

use askama::Template;

use crate::web::menu::NavContext;

/// Result of one scanned upload
pub struct ScanOutcome {
    /// The uploaded image, inlined for display
    pub image_data_uri: String,
    /// Decoded payloads, in detection order
    pub payloads: Vec<String>,
}

/// Scan page template
#[derive(Template)]
#[template(path = "scan.html")]
pub struct ScanTemplate {
    pub nav: NavContext,
    pub outcome: Option<ScanOutcome>,
    pub error: Option<String>,
}

/// Login page template
#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub nav: NavContext,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Generator page template
#[derive(Template)]
#[template(path = "generate.html")]
pub struct GenerateTemplate {
    pub nav: NavContext,
    /// Last submitted payload, echoed back into the form
    pub text: String,
    pub warning: Option<String>,
    /// Generated PNG, inlined for preview
    pub preview_data_uri: Option<String>,
}

/// Shown instead of the generator to non-admin sessions
#[derive(Template)]
#[template(path = "unauthorized.html")]
pub struct UnauthorizedTemplate {
    pub nav: NavContext,
}
