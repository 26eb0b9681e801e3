use axum::{
    Extension, Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
    routing::get,
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{EncodingKey, Header, encode};
use library_gate::AppState;
use library_gate::config::{
    AppConfig, GateConfig, SecurityConfig, ServerConfig, UnresolvedSessionPolicy,
};
use library_gate::security::Viewer;
use library_gate::security::middleware::access_gate_middleware;
use library_gate::server::build_router;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

// ── Fixtures ───────────────────────────────────────────────────

fn static_site() -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    fs::create_dir_all(dir.path().join("admin")).unwrap();
    fs::create_dir_all(dir.path().join("user")).unwrap();
    fs::write(dir.path().join("index.html"), "home").unwrap();
    fs::write(dir.path().join("admin/dashboard"), "admin dashboard").unwrap();
    fs::write(dir.path().join("admin/login"), "admin login").unwrap();
    fs::write(dir.path().join("user/dashboard"), "user dashboard").unwrap();
    fs::write(dir.path().join("user/login"), "user login").unwrap();
    dir
}

fn test_config(site: &TempDir) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            port: 0,
            host: "127.0.0.1".to_string(),
            static_dir: site.path().to_string_lossy().into_owned(),
        },
        gate: GateConfig::default(),
        security: SecurityConfig {
            verify_signature: false,
            jwt_secret: String::new(),
        },
    }
}

fn app_with(config: AppConfig) -> Router {
    build_router(AppState::new(Arc::new(config)))
}

/// Unsigned token carrying `payload`, as the auth service's cookies look to the gate.
fn token(payload: &str) -> String {
    format!(
        "{}.{}.signature",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(payload)
    )
}

async fn get_path(app: Router, path: &str, cookie: Option<&str>) -> Response {
    let mut builder = Request::builder().uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    app.oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

fn location(resp: &Response) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

async fn body_text(resp: Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8_lossy(&bytes).to_string()
}

// ── Tests ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_anonymous_protected_paths_redirect_to_login() {
    let site = static_site();

    let resp = get_path(app_with(test_config(&site)), "/admin/dashboard", None).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), "/admin/login");

    let resp = get_path(app_with(test_config(&site)), "/user/borrowed", None).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), "/user/login");
}

#[tokio::test]
async fn test_anonymous_public_paths_are_served() {
    let site = static_site();

    let resp = get_path(app_with(test_config(&site)), "/admin/login", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "admin login");

    let resp = get_path(app_with(test_config(&site)), "/index.html", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "home");

    let resp = get_path(app_with(test_config(&site)), "/healthz", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "ok");
}

#[tokio::test]
async fn test_admin_on_login_page_goes_to_dashboard() {
    let site = static_site();
    let cookie = format!("token={}", token(r#"{"role":"admin"}"#));

    let resp = get_path(app_with(test_config(&site)), "/admin/login", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), "/admin/dashboard");

    let resp = get_path(app_with(test_config(&site)), "/admin/dashboard", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "admin dashboard");
}

#[tokio::test]
async fn test_user_cannot_enter_admin_area() {
    let site = static_site();
    let cookie = format!("theme=dark; token={}", token(r#"{"role":"user"}"#));

    let resp = get_path(app_with(test_config(&site)), "/admin/dashboard", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), "/user/dashboard");

    let resp = get_path(app_with(test_config(&site)), "/user/dashboard", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "user dashboard");
}

#[tokio::test]
async fn test_malformed_token_follows_policy() {
    let site = static_site();
    let cookie = "token=header.!!!not-base64!!!.sig";

    let resp = get_path(app_with(test_config(&site)), "/admin/dashboard", Some(cookie)).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), "/admin/login");

    let mut config = test_config(&site);
    config.gate.unresolved_session = UnresolvedSessionPolicy::WrongRole;
    let resp = get_path(app_with(config), "/admin/dashboard", Some(cookie)).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), "/user/dashboard");
}

#[tokio::test]
async fn test_custom_cookie_name() {
    let site = static_site();
    let mut config = test_config(&site);
    config.gate.cookie_name = "library_session".to_string();
    let admin = token(r#"{"role":"admin"}"#);

    // The default cookie name is no longer read
    let resp = get_path(
        app_with(config.clone()),
        "/admin/dashboard",
        Some(&format!("token={admin}")),
    )
    .await;
    assert_eq!(location(&resp), "/admin/login");

    let resp = get_path(
        app_with(config),
        "/admin/dashboard",
        Some(&format!("library_session={admin}")),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_signature_verification() {
    let site = static_site();
    let mut config = test_config(&site);
    config.security.verify_signature = true;
    config.security.jwt_secret = "library-secret".to_string();

    let signed = encode(
        &Header::default(),
        &serde_json::json!({ "role": "admin", "sub": "1" }),
        &EncodingKey::from_secret(b"library-secret"),
    )
    .unwrap();
    let resp = get_path(
        app_with(config.clone()),
        "/admin/dashboard",
        Some(&format!("token={signed}")),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let forged = token(r#"{"role":"admin"}"#);
    let resp = get_path(
        app_with(config),
        "/admin/dashboard",
        Some(&format!("token={forged}")),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), "/admin/login");
}

#[tokio::test]
async fn test_viewer_is_exposed_to_handlers() {
    async fn whoami(Extension(viewer): Extension<Viewer>) -> String {
        format!("{viewer:?}")
    }

    let site = static_site();
    let state = AppState::new(Arc::new(test_config(&site)));
    let app = || {
        Router::new()
            .route("/user/whoami", get(whoami))
            .route("/whoami", get(whoami))
            .layer(axum::middleware::from_fn_with_state(
                state.clone(),
                access_gate_middleware,
            ))
            .with_state(state.clone())
    };

    let cookie = format!("token={}", token(r#"{"role":"user"}"#));
    let resp = get_path(app(), "/user/whoami", Some(&cookie)).await;
    assert_eq!(body_text(resp).await, "Authenticated(User)");

    let resp = get_path(app(), "/whoami", None).await;
    assert_eq!(body_text(resp).await, "Anonymous");

    let resp = get_path(app(), "/whoami", Some("token=junk")).await;
    assert_eq!(body_text(resp).await, "Unresolved");
}
