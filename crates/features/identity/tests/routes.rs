use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode, header};
use axum::middleware::from_fn_with_state;
use lovebird_domain::config::AppConfig;
use lovebird_event_bus::EventBus;
use lovebird_identity::server::{browser_session, identity_router};
use lovebird_identity::{Identity, init};
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BROWSER: &str = "lb_sid=Browser23456789abc";

fn identity(endpoint: Option<String>) -> Identity {
    let mut config = AppConfig::default();
    config.identity.endpoint_url = endpoint;
    config.identity.public_key = Some("anon-key".to_owned());
    init(&config, EventBus::new()).expect("identity")
}

fn app(identity: &Identity) -> Router {
    let (router, _api) = identity_router::<Identity>().split_for_parts();
    router
        .layer(from_fn_with_state(identity.clone(), browser_session))
        .with_state(identity.clone())
}

async fn send(app: Router, method: Method, uri: &str, cookie: Option<&str>) -> Response<Body> {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    app.oneshot(request.body(Body::empty()).unwrap()).await.unwrap()
}

fn location(response: &Response<Body>) -> &str {
    response.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()).unwrap_or_default()
}

#[tokio::test]
async fn sign_in_redirects_to_provider_and_issues_cookie() {
    let identity = identity(Some("https://abc.supabase.co".to_owned()));
    let response = send(app(&identity), Method::GET, "/auth/sign-in?provider=google", None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("https://abc.supabase.co/auth/v1/authorize?provider=google"));

    let cookie = response.headers().get(header::SET_COOKIE).and_then(|v| v.to_str().ok()).unwrap();
    assert!(cookie.starts_with("lb_sid="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
}

#[tokio::test]
async fn known_browser_keeps_its_cookie() {
    let identity = identity(Some("https://abc.supabase.co".to_owned()));
    let response = send(app(&identity), Method::GET, "/auth/sign-in", Some(BROWSER)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert!(identity.client("Browser23456789abc").has_pending_sign_in());
}

#[tokio::test]
async fn sign_in_without_endpoint_returns_home_with_error() {
    let identity = identity(None);
    let response = send(app(&identity), Method::GET, "/auth/sign-in", Some(BROWSER)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/?error="));
    assert!(location(&response).contains("SERVICE_ENDPOINT_URL"));
}

#[tokio::test]
async fn provider_error_is_flashed() {
    let identity = identity(Some("https://abc.supabase.co".to_owned()));
    let response = send(
        app(&identity),
        Method::GET,
        "/auth/callback?error=access_denied&error_description=Access%20denied",
        Some(BROWSER),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/?error=Access+denied");
}

#[tokio::test]
async fn callback_completes_the_sign_in() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "pkce"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at-1",
            "refresh_token": "rt-1",
            "expires_in": 3600,
            "user": { "id": "user-1", "email": "a@b.com" }
        })))
        .mount(&server)
        .await;

    let identity = identity(Some(server.uri()));
    let started = send(app(&identity), Method::GET, "/auth/sign-in", Some(BROWSER)).await;
    assert_eq!(started.status(), StatusCode::SEE_OTHER);

    let response = send(app(&identity), Method::GET, "/auth/callback?code=code-123", Some(BROWSER)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let session = identity.client("Browser23456789abc").session().expect("signed in");
    assert_eq!(session.email(), Some("a@b.com"));
}

#[tokio::test]
async fn sign_out_redirects_home() {
    let identity = identity(Some("https://abc.supabase.co".to_owned()));
    let response = send(app(&identity), Method::POST, "/auth/sign-out", Some(BROWSER)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}
