//! HTTP client for the GoTrue-compatible `/auth/v1` API.

use crate::error::{IdentityError, IdentityErrorExt};
use lovebird_domain::config::IdentityConfig;
use lovebird_domain::session::Session;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, instrument, warn};
use url::Url;

const AUTH_PATH: &str = "auth/v1/";
const API_KEY_HEADER: &str = "apikey";

#[derive(Debug)]
struct ServiceInner {
    http: reqwest::Client,
    base: Result<Url, Cow<'static, str>>,
    public_key: Option<String>,
    redirect_url: String,
}

/// Shared handle to the identity service. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct IdentityService {
    inner: Arc<ServiceInner>,
}

/// Error payload variants used by GoTrue.
#[derive(Debug, Default, Deserialize)]
struct ProviderErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl IdentityService {
    /// Build the service. Missing settings do not fail here; they surface from
    /// [`IdentityService::endpoint`] and from every request.
    ///
    /// # Errors
    /// Returns [`IdentityError::Transport`] if the HTTP client cannot be constructed.
    pub fn new(config: &IdentityConfig, redirect_url: impl Into<String>) -> Result<Self, IdentityError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Building the identity HTTP client")?;

        let base = resolve_base(config.endpoint_url());
        if let Err(problem) = &base {
            warn!(%problem, "Identity endpoint unavailable");
        }

        Ok(Self {
            inner: Arc::new(ServiceInner {
                http,
                base,
                public_key: config.public_key().map(str::to_owned),
                redirect_url: redirect_url.into(),
            }),
        })
    }

    /// The resolved `/auth/v1/` base URL.
    ///
    /// # Errors
    /// Returns [`IdentityError::Config`] when the endpoint is missing or not a valid base URL.
    pub fn endpoint(&self) -> Result<&Url, IdentityError> {
        self.inner
            .base
            .as_ref()
            .map_err(|problem| IdentityError::Config { message: problem.clone(), context: None })
    }

    #[must_use]
    pub fn redirect_url(&self) -> &str {
        &self.inner.redirect_url
    }

    /// Provider authorize URL for a PKCE sign-in.
    ///
    /// # Errors
    /// Returns [`IdentityError::Config`] when the endpoint is not configured.
    pub fn authorize_url(&self, provider: &str, code_challenge: &str) -> Result<Url, IdentityError> {
        let mut url = self.url("authorize")?;
        url.query_pairs_mut()
            .append_pair("provider", provider)
            .append_pair("redirect_to", &self.inner.redirect_url)
            .append_pair("code_challenge", code_challenge)
            .append_pair("code_challenge_method", "s256");
        Ok(url)
    }

    /// `POST /token?grant_type=pkce`.
    ///
    /// # Errors
    /// Returns an error if the request fails or the provider rejects the code.
    #[instrument(skip_all)]
    pub async fn exchange_code(&self, auth_code: &str, code_verifier: &str) -> Result<Session, IdentityError> {
        let mut url = self.url("token")?;
        url.query_pairs_mut().append_pair("grant_type", "pkce");

        let request = self
            .request(url)?
            .json(&json!({ "auth_code": auth_code, "code_verifier": code_verifier }));
        read_session(request, "Exchanging the authorization code").await
    }

    /// `POST /token?grant_type=refresh_token`.
    ///
    /// # Errors
    /// Returns an error if the request fails or the refresh token is no longer valid.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<Session, IdentityError> {
        let mut url = self.url("token")?;
        url.query_pairs_mut().append_pair("grant_type", "refresh_token");

        let request = self.request(url)?.json(&json!({ "refresh_token": refresh_token }));
        read_session(request, "Refreshing the session").await
    }

    /// `POST /logout` with the session's bearer token.
    ///
    /// # Errors
    /// Returns an error if the request fails or the provider refuses the token.
    #[instrument(skip_all)]
    pub async fn logout(&self, access_token: &str) -> Result<(), IdentityError> {
        let url = self.url("logout")?;
        let response = self
            .request(url)?
            .bearer_auth(access_token)
            .send()
            .await
            .context("Revoking the session")?;

        check_status(response).await.map(|_| ())
    }

    fn url(&self, path: &str) -> Result<Url, IdentityError> {
        self.endpoint()?.join(path).context("Building an identity URL")
    }

    fn request(&self, url: Url) -> Result<RequestBuilder, IdentityError> {
        let key = self.inner.public_key.as_deref().ok_or_else(|| IdentityError::Config {
            message: "SERVICE_PUBLIC_KEY is not set".into(),
            context: None,
        })?;
        Ok(self.inner.http.post(url).header(API_KEY_HEADER, key))
    }
}

async fn read_session(request: RequestBuilder, action: &'static str) -> Result<Session, IdentityError> {
    let response = request.send().await.context(action)?;
    let response = check_status(response).await?;
    let session = response.json::<Session>().await.context(action)?;
    debug!(user = %session.user.id, "Session issued");
    Ok(session.stamped(unix_now()))
}

/// Seconds since the Unix epoch.
#[must_use]
pub fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |elapsed| elapsed.as_secs())
}

fn resolve_base(endpoint: Option<&str>) -> Result<Url, Cow<'static, str>> {
    let endpoint = endpoint.ok_or(Cow::Borrowed("SERVICE_ENDPOINT_URL is not set"))?;
    let mut url = Url::parse(endpoint).map_err(|e| Cow::Owned(format!("invalid SERVICE_ENDPOINT_URL: {e}")))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(Cow::Owned(format!("SERVICE_ENDPOINT_URL is not an http(s) base URL: {endpoint}")));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.join(AUTH_PATH).map_err(|e| Cow::Owned(format!("invalid SERVICE_ENDPOINT_URL: {e}")))
}

async fn check_status(response: Response) -> Result<Response, IdentityError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(IdentityError::Provider { status: status.as_u16(), message: provider_message(status, &body), context: None })
}

fn provider_message(status: StatusCode, body: &str) -> Cow<'static, str> {
    let parsed = serde_json::from_str::<ProviderErrorBody>(body).unwrap_or_default();
    parsed
        .error_description
        .or(parsed.msg)
        .or(parsed.message)
        .or(parsed.error)
        .map_or_else(|| Cow::Owned(status.canonical_reason().unwrap_or("request failed").to_owned()), Cow::Owned)
}
