//! Route handlers.
//!
//! Provides HTTP handlers for the four views: scan, login, generate, logout.
//! Every handler resolves the caller's session first and rebuilds the menu
//! from it, and every generate handler re-checks the admin flag itself.

use crate::qr::{self, DOWNLOAD_FILE_NAME, PNG_MIME, UploadKind};
use crate::web::menu::{NavContext, View};
use crate::web::state::AppState;
use crate::web::templates::{
    GenerateTemplate, LoginTemplate, ScanOutcome, ScanTemplate, UnauthorizedTemplate,
};
use askama::Template;
use axum::{
    Form, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Multipart field carrying the uploaded image
const UPLOAD_FIELD: &str = "image";

/// Build the application router.
pub fn app_router(state: Arc<AppState>) -> Router {
    let body_limit = state.max_upload_bytes;
    Router::new()
        .route("/", get(|| async { Redirect::to(View::Scan.path()) }))
        .route("/health", get(|| async { "ok" }))
        .route("/scan", get(scan_page).post(scan_submit))
        .route("/login", get(login_page).post(login_submit))
        .route("/generate", get(generate_page).post(generate_submit))
        .route("/generate/download", post(generate_download))
        .route("/logout", post(logout))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Resolve the caller's session, issuing a cookie if a new one was created.
async fn session_for(state: &AppState, jar: CookieJar) -> (CookieJar, String) {
    let existing = jar.get(&state.cookie_name).map(|c| c.value().to_string());
    let (session_id, created) = state.sessions.resolve(existing.as_deref()).await;

    if !created {
        return (jar, session_id);
    }

    let cookie = Cookie::build((state.cookie_name.clone(), session_id.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict);
    (jar.add(cookie), session_id)
}

/// Render a template, turning render failures into a 500.
fn render<T: Template>(template: &T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Template error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

/// Page shown when a non-admin session reaches the generator.
fn unauthorized(path: &str) -> Response {
    warn!("Rejected non-admin access to {}", path);
    let template = UnauthorizedTemplate {
        nav: NavContext::new(false, View::Generate),
    };
    (StatusCode::FORBIDDEN, render(&template)).into_response()
}

// =============================================================================
// Scan (public)
// =============================================================================

/// Scan page handler.
async fn scan_page(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let (jar, session_id) = session_for(&state, jar).await;
    let is_admin = state.sessions.get_is_admin(&session_id).await;

    let template = ScanTemplate {
        nav: NavContext::new(is_admin, View::Scan),
        outcome: None,
        error: None,
    };
    (jar, render(&template)).into_response()
}

/// An uploaded file
struct Upload {
    file_name: String,
    bytes: Bytes,
}

/// Pull the image field out of a multipart body. `None` when no file was chosen.
async fn read_upload(multipart: &mut Multipart) -> Result<Option<Upload>, String> {
    while let Some(field) = multipart.next_field().await.map_err(|e| e.to_string())? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|e| e.to_string())?;
        if bytes.is_empty() {
            return Ok(None);
        }
        return Ok(Some(Upload { file_name, bytes }));
    }
    Ok(None)
}

/// Scan upload handler.
async fn scan_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Response {
    let (jar, session_id) = session_for(&state, jar).await;
    let is_admin = state.sessions.get_is_admin(&session_id).await;

    let mut template = ScanTemplate {
        nav: NavContext::new(is_admin, View::Scan),
        outcome: None,
        error: None,
    };

    let upload = match read_upload(&mut multipart).await {
        Ok(Some(upload)) => upload,
        Ok(None) => return (jar, render(&template)).into_response(),
        Err(e) => {
            warn!("Failed to read upload: {}", e);
            template.error = Some(format!("Upload failed: {e}"));
            return (jar, render(&template)).into_response();
        }
    };

    let Some(kind) = UploadKind::from_file_name(&upload.file_name) else {
        template.error = Some(
            "Unsupported file type. Please upload a PNG, JPG or JPEG image.".to_string(),
        );
        return (jar, render(&template)).into_response();
    };

    let bytes = upload.bytes.clone();
    let decoded = tokio::task::spawn_blocking(move || qr::decode(&bytes)).await;

    match decoded {
        Ok(Ok(payloads)) => {
            // The decoder sniffs content, so label the preview the same way
            let mime = qr::sniff_mime(&upload.bytes).unwrap_or(kind.mime());
            info!(
                "Scanned {} ({} bytes): {} QR code(s)",
                upload.file_name,
                upload.bytes.len(),
                payloads.len()
            );
            template.outcome = Some(ScanOutcome {
                image_data_uri: qr::data_uri(mime, &upload.bytes),
                payloads,
            });
        }
        Ok(Err(e)) => {
            warn!("Unreadable upload {}: {}", upload.file_name, e);
            template.error = Some(format!("Could not read image: {e}"));
        }
        Err(e) => {
            error!("Decode task failed: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response();
        }
    }

    (jar, render(&template)).into_response()
}

// =============================================================================
// Login / logout
// =============================================================================

/// Login page handler.
async fn login_page(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let (jar, session_id) = session_for(&state, jar).await;

    // If already logged in, go straight to the generator
    if state.sessions.get_is_admin(&session_id).await {
        return (jar, Redirect::to(View::Generate.path())).into_response();
    }

    let template = LoginTemplate {
        nav: NavContext::new(false, View::Login),
        error: None,
        success: None,
    };
    (jar, render(&template)).into_response()
}

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    password: String,
}

/// Login form submission handler.
async fn login_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let (jar, session_id) = session_for(&state, jar).await;

    let template = if state.password_matches(&form.password) {
        state.sessions.set_is_admin(&session_id, true).await;
        info!("Admin login succeeded");
        LoginTemplate {
            nav: NavContext::new(true, View::Login),
            error: None,
            success: Some("Login successful!".to_string()),
        }
    } else {
        warn!("Admin login failed: incorrect password");
        let is_admin = state.sessions.get_is_admin(&session_id).await;
        LoginTemplate {
            nav: NavContext::new(is_admin, View::Login),
            error: Some("Incorrect password.".to_string()),
            success: None,
        }
    };

    (jar, render(&template)).into_response()
}

/// Logout handler.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let (jar, session_id) = session_for(&state, jar).await;
    state.sessions.set_is_admin(&session_id, false).await;
    info!("Admin logged out");

    (jar, Redirect::to(View::Scan.path())).into_response()
}

// =============================================================================
// Generate (admin only)
// =============================================================================

/// Generator form data.
#[derive(Deserialize)]
pub struct GenerateForm {
    #[serde(default)]
    text: String,
}

const EMPTY_TEXT_WARNING: &str = "Please enter some text first.";

/// Generator page handler.
async fn generate_page(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let (jar, session_id) = session_for(&state, jar).await;
    if !state.sessions.get_is_admin(&session_id).await {
        return (jar, unauthorized(View::Generate.path())).into_response();
    }

    let template = GenerateTemplate {
        nav: NavContext::new(true, View::Generate),
        text: String::new(),
        warning: None,
        preview_data_uri: None,
    };
    (jar, render(&template)).into_response()
}

/// Encode a payload off the async runtime. Failures are faults: logged, 500.
async fn encode_artifact(state: &AppState, text: &str) -> Result<Vec<u8>, Response> {
    let payload = text.to_string();
    let options = state.render;

    match tokio::task::spawn_blocking(move || qr::encode_png(&payload, options)).await {
        Ok(Ok(png)) => Ok(png),
        Ok(Err(e)) => {
            error!("Failed to generate QR code for {} byte payload: {}", text.len(), e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate QR code").into_response())
        }
        Err(e) => {
            error!("Encode task failed: {}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response())
        }
    }
}

/// Generator form submission handler.
async fn generate_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<GenerateForm>,
) -> Response {
    let (jar, session_id) = session_for(&state, jar).await;
    if !state.sessions.get_is_admin(&session_id).await {
        return (jar, unauthorized(View::Generate.path())).into_response();
    }

    let mut template = GenerateTemplate {
        nav: NavContext::new(true, View::Generate),
        text: form.text,
        warning: None,
        preview_data_uri: None,
    };

    if template.text.trim().is_empty() {
        template.warning = Some(EMPTY_TEXT_WARNING.to_string());
        return (jar, render(&template)).into_response();
    }

    let png = match encode_artifact(&state, &template.text).await {
        Ok(png) => png,
        Err(response) => return (jar, response).into_response(),
    };

    info!("Generated QR code ({} byte PNG)", png.len());
    template.preview_data_uri = Some(qr::data_uri(PNG_MIME, &png));
    (jar, render(&template)).into_response()
}

/// PNG download handler.
async fn generate_download(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<GenerateForm>,
) -> Response {
    let (jar, session_id) = session_for(&state, jar).await;
    if !state.sessions.get_is_admin(&session_id).await {
        return (jar, unauthorized("/generate/download")).into_response();
    }

    if form.text.trim().is_empty() {
        let template = GenerateTemplate {
            nav: NavContext::new(true, View::Generate),
            text: form.text,
            warning: Some(EMPTY_TEXT_WARNING.to_string()),
            preview_data_uri: None,
        };
        return (StatusCode::BAD_REQUEST, jar, render(&template)).into_response();
    }

    let png = match encode_artifact(&state, &form.text).await {
        Ok(png) => png,
        Err(response) => return (jar, response).into_response(),
    };

    let disposition = format!("attachment; filename=\"{DOWNLOAD_FILE_NAME}\"");
    (
        jar,
        [
            (header::CONTENT_TYPE, PNG_MIME.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        png,
    )
        .into_response()
}
