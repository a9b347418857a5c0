use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use proptest::prelude::*;
use tower::ServiceExt;

use qrgate::config::{AdminConfig, Config, QrConfig, ServerConfig, SessionConfig};
use qrgate::qr::{self, RenderOptions};
use qrgate::web::{AppState, app_router};

const PASSWORD: &str = "admin123";

fn test_state() -> Arc<AppState> {
    let config = Config {
        server: ServerConfig::default(),
        admin: AdminConfig {
            password: PASSWORD.to_string(),
        },
        session: SessionConfig::default(),
        qr: QrConfig::default(),
    };
    Arc::new(AppState::new(&config))
}

fn form_encode(text: &str) -> String {
    text.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}

fn form_request(uri: &str, body: String, cookie: Option<&str>) -> Request<Body> {
    let mut builder =
        Request::post(uri).header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    // Printable ASCII keeps the payload out of the Kanji segment heuristics
    #[test]
    fn test_generated_code_scans_back(text in "[ -~]{1,120}") {
        let png = qr::encode_png(&text, RenderOptions::default()).unwrap();
        prop_assert_eq!(qr::decode(&png).unwrap(), vec![text]);
    }

    #[test]
    fn test_download_denied_without_login(
        text in "\\PC{0,200}",
        password in "[a-zA-Z0-9]{0,16}",
    ) {
        prop_assume!(password != PASSWORD);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let (status, content_type) = runtime.block_on(async {
            let router = app_router(test_state());

            let login = router
                .clone()
                .oneshot(form_request("/login", format!("password={password}"), None))
                .await
                .unwrap();
            let cookie = login
                .headers()
                .get(header::SET_COOKIE)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(';').next())
                .map(str::to_string);

            let body = format!("text={}", form_encode(&text));
            let response = router
                .oneshot(form_request("/generate/download", body, cookie.as_deref()))
                .await
                .unwrap();
            let content_type = response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            (response.status(), content_type)
        });

        prop_assert_eq!(status, StatusCode::FORBIDDEN);
        prop_assert_ne!(content_type.as_deref(), Some(qr::PNG_MIME));
    }
}
