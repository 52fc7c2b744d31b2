use lovebird_domain::config::IdentityConfig;
use lovebird_domain::session::{AuthEvent, AuthStateChange};
use lovebird_event_bus::EventBus;
use lovebird_identity::pkce::challenge;
use lovebird_identity::{AuthClient, IdentityError, IdentityService, SessionProvider};
use serde_json::{Value, json};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "anon-key";
const WAIT: Duration = Duration::from_secs(2);

fn token(access: &str, refresh: &str, expires_in: u64) -> Value {
    json!({
        "access_token": access,
        "refresh_token": refresh,
        "token_type": "bearer",
        "expires_in": expires_in,
        "user": { "id": "user-1", "email": "a@b.com", "aud": "authenticated" }
    })
}

fn service(endpoint: &str) -> IdentityService {
    let config = IdentityConfig {
        endpoint_url: Some(endpoint.to_owned()),
        public_key: Some(KEY.to_owned()),
        request_timeout_secs: 2,
        ..IdentityConfig::default()
    };
    IdentityService::new(&config, "http://localhost:3000/auth/callback").expect("service")
}

fn watch(client: &AuthClient) -> (lovebird_event_bus::Subscription, mpsc::UnboundedReceiver<AuthStateChange>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let subscription = client
        .on_session_change(move |change: &AuthStateChange| {
            let _ = tx.send(change.clone());
        })
        .expect("subscribe");
    (subscription, rx)
}

async fn mount_pkce_exchange(server: &MockServer, expires_in: u64) {
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "pkce"))
        .and(header("apikey", KEY))
        .and(body_partial_json(json!({ "auth_code": "code-123" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(token("at-1", "rt-1", expires_in)))
        .expect(1)
        .mount(server)
        .await;
}

async fn signed_in_client(server: &MockServer, events: &EventBus, expires_in: u64) -> AuthClient {
    mount_pkce_exchange(server, expires_in).await;
    let client = AuthClient::new("browser-a", service(&server.uri()), events.clone());
    client.sign_in_with_provider("google").expect("authorize url");
    client.complete_sign_in("code-123").await.expect("sign in");
    client
}

#[tokio::test]
async fn authorize_url_carries_pkce_parameters() {
    let client = AuthClient::new("browser-a", service("https://abc.supabase.co"), EventBus::new());
    let url = client.sign_in_with_provider("google").expect("authorize url");

    assert_eq!(url.path(), "/auth/v1/authorize");
    let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    let get = |name: &str| query.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str());

    assert_eq!(get("provider"), Some("google"));
    assert_eq!(get("redirect_to"), Some("http://localhost:3000/auth/callback"));
    assert_eq!(get("code_challenge_method"), Some("s256"));
    assert_eq!(get("code_challenge").map(str::len), Some(43));
    assert!(client.has_pending_sign_in());
}

#[tokio::test]
async fn code_exchange_sends_the_matching_verifier_and_publishes_sign_in() {
    let server = MockServer::start().await;
    mount_pkce_exchange(&server, 3600).await;

    let events = EventBus::new();
    let client = AuthClient::new("browser-a", service(&server.uri()), events);
    let (_subscription, mut changes) = watch(&client);

    let url = client.sign_in_with_provider("google").expect("authorize url");
    let sent_challenge = url
        .query_pairs()
        .find(|(k, _)| k == "code_challenge")
        .map(|(_, v)| v.into_owned())
        .expect("challenge");

    let session = client.complete_sign_in("code-123").await.expect("sign in");
    assert_eq!(session.email(), Some("a@b.com"));
    assert!(session.expires_at.is_some());
    assert!(!client.has_pending_sign_in());

    let requests = server.received_requests().await.expect("recorded requests");
    let body: Value = serde_json::from_slice(&requests[0].body).expect("json body");
    let verifier = body["code_verifier"].as_str().expect("verifier");
    assert_eq!(challenge(verifier), sent_challenge);

    let change = timeout(WAIT, changes.recv()).await.expect("delivered").expect("open");
    assert_eq!(change.event, AuthEvent::SignedIn);
    assert_eq!(change.session.as_ref().and_then(|s| s.user.email.clone()).as_deref(), Some("a@b.com"));
}

#[tokio::test]
async fn callback_without_pending_sign_in_is_rejected() {
    let client = AuthClient::new("browser-a", service("https://abc.supabase.co"), EventBus::new());
    let result = client.complete_sign_in("code-123").await;
    assert!(matches!(result, Err(IdentityError::Flow { .. })));
}

#[tokio::test]
async fn rejected_code_surfaces_provider_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "error": "invalid_grant", "error_description": "Code expired" })),
        )
        .mount(&server)
        .await;

    let client = AuthClient::new("browser-a", service(&server.uri()), EventBus::new());
    client.sign_in_with_provider("google").expect("authorize url");
    let err = client.complete_sign_in("code-123").await.expect_err("rejected");

    assert!(matches!(err, IdentityError::Provider { status: 400, .. }));
    assert!(err.to_string().contains("Code expired"));
    assert!(client.session().is_none());
}

#[tokio::test]
async fn fresh_session_is_returned_without_refresh() {
    let server = MockServer::start().await;
    let client = signed_in_client(&server, &EventBus::new(), 3600).await;

    let session = client.current_session().await.expect("session").expect("signed in");
    assert_eq!(session.access_token, "at-1");
}

#[tokio::test]
async fn expiring_session_is_refreshed() {
    let server = MockServer::start().await;
    let events = EventBus::new();
    let client = signed_in_client(&server, &events, 10).await;
    let (_subscription, mut changes) = watch(&client);

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .and(body_partial_json(json!({ "refresh_token": "rt-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(token("at-2", "rt-2", 3600)))
        .expect(1)
        .mount(&server)
        .await;

    let session = client.current_session().await.expect("session").expect("signed in");
    assert_eq!(session.access_token, "at-2");
    assert_eq!(client.session().map(|s| s.refresh_token.clone()).as_deref(), Some("rt-2"));

    let change = timeout(WAIT, changes.recv()).await.expect("delivered").expect("open");
    assert_eq!(change.event, AuthEvent::TokenRefreshed);
}

#[tokio::test]
async fn failed_refresh_signs_out() {
    let server = MockServer::start().await;
    let events = EventBus::new();
    let client = signed_in_client(&server, &events, 10).await;
    let (_subscription, mut changes) = watch(&client);

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "msg": "Invalid Refresh Token" })))
        .mount(&server)
        .await;

    assert!(client.current_session().await.is_err());
    assert!(client.session().is_none());

    let change = timeout(WAIT, changes.recv()).await.expect("delivered").expect("open");
    assert_eq!(change.event, AuthEvent::SignedOut);
    assert!(change.session.is_none());
}

#[tokio::test]
async fn sign_out_revokes_and_clears_even_if_provider_fails() {
    let server = MockServer::start().await;
    let events = EventBus::new();
    let client = signed_in_client(&server, &events, 3600).await;
    let (_subscription, mut changes) = watch(&client);

    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("authorization", "Bearer at-1"))
        .and(header("apikey", KEY))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    client.sign_out().await.expect("sign out");
    assert!(client.session().is_none());
    assert!(client.current_session().await.expect("known").is_none());

    let change = timeout(WAIT, changes.recv()).await.expect("delivered").expect("open");
    assert_eq!(change.event, AuthEvent::SignedOut);
}

#[tokio::test]
async fn changes_of_other_browsers_are_not_delivered() {
    let events = EventBus::new();
    let mine = AuthClient::new("browser-a", service("https://abc.supabase.co"), events.clone());
    let other = AuthClient::new("browser-b", service("https://abc.supabase.co"), events);
    let (_subscription, mut changes) = watch(&mine);

    other.sign_out().await.expect("sign out");
    mine.sign_out().await.expect("sign out");

    let change = timeout(WAIT, changes.recv()).await.expect("delivered").expect("open");
    assert_eq!(&*change.client, "browser-a");
}

#[tokio::test]
async fn own_change_survives_a_flood_from_other_browsers() {
    let events = EventBus::new();
    let mine = AuthClient::new("browser-a", service("https://abc.supabase.co"), events.clone());
    let other = AuthClient::new("browser-b", service("https://abc.supabase.co"), events);
    let (_subscription, mut changes) = watch(&mine);

    // Without a session neither sign-out yields, so the listener only runs after the flood.
    mine.sign_out().await.expect("sign out");
    for _ in 0..300 {
        other.sign_out().await.expect("sign out");
    }

    let change = timeout(WAIT, changes.recv()).await.expect("delivered").expect("open");
    assert_eq!(&*change.client, "browser-a");
    assert_eq!(change.event, AuthEvent::SignedOut);
    assert!(timeout(Duration::from_millis(100), changes.recv()).await.is_err());
}

#[tokio::test]
async fn missing_endpoint_is_reported_structurally() {
    let service = IdentityService::new(&IdentityConfig::default(), "http://localhost/auth/callback")
        .expect("service builds without settings");
    let err = service.endpoint().expect_err("no endpoint");
    assert!(err.to_string().contains("SERVICE_ENDPOINT_URL"));

    let client = AuthClient::new("browser-a", service, EventBus::new());
    assert!(matches!(client.sign_in_with_provider("google"), Err(IdentityError::Config { .. })));
}
