//! Smoke tests shown on `/tests`. None of them changes any data.

use crate::error::{PagesError, PagesErrorExt};
use lovebird_domain::config::{AppConfig, IdentityConfig, ServerConfig};
use lovebird_domain::constants::SELF_TEST_PATH;
use lovebird_identity::IdentityService;
use serde::Serialize;
use serde_json::Value;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use tracing::{debug, warn};

pub const ENV_CHECK: &str = "Env Vars vorhanden";
pub const CLIENT_CHECK: &str = "Identity Client initialisiert";
pub const STATUS_CHECK: &str = "API /api/self-test";

const ENV_OK: &str = "OK";
const ENV_MISSING: &str = "Fehlend: SERVICE_ENDPOINT_URL oder SERVICE_PUBLIC_KEY";
const CLIENT_OK: &str = "client-ok";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub name: &'static str,
    pub pass: bool,
    pub details: String,
}

/// HTTP probe for the status endpoint.
#[derive(Debug, Clone)]
pub struct StatusProbe {
    http: reqwest::Client,
    url: String,
}

impl StatusProbe {
    /// Probe `diagnostics.self_test_url`, or this server when unset.
    ///
    /// # Errors
    /// Returns [`PagesError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &AppConfig) -> Result<Self, PagesError> {
        let url = config
            .diagnostics
            .self_test_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| local_url(&config.server));
        Self::with_url(url, config)
    }

    /// # Errors
    /// Returns [`PagesError::Http`] if the HTTP client cannot be built.
    pub fn with_url(url: impl Into<String>, config: &AppConfig) -> Result<Self, PagesError> {
        let http = reqwest::Client::builder()
            .timeout(config.diagnostics.timeout())
            .build()
            .context("Building the diagnostics HTTP client")?;
        Ok(Self { http, url: url.into() })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<Value, reqwest::Error> {
        self.http.get(&self.url).send().await?.json::<Value>().await
    }
}

/// Status endpoint of this server. Plain HTTP goes straight to the listener; with TLS
/// the public origin is used so the certificate matches the host name.
fn local_url(server: &ServerConfig) -> String {
    if server.ssl.is_some() {
        return format!("{}{SELF_TEST_PATH}", server.origin());
    }
    let host = match server.address {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    format!("http://{}{SELF_TEST_PATH}", SocketAddr::new(host, server.port))
}

/// Run all checks in order. Each check isolates its own failure.
pub async fn run_checks(identity: &IdentityConfig, service: &IdentityService, probe: &StatusProbe) -> Vec<CheckResult> {
    let results = vec![env_check(identity), client_check(service), status_check(probe).await];
    debug!(passed = results.iter().filter(|r| r.pass).count(), total = results.len(), "Diagnostics finished");
    results
}

fn env_check(identity: &IdentityConfig) -> CheckResult {
    let pass = identity.is_complete();
    CheckResult { name: ENV_CHECK, pass, details: if pass { ENV_OK } else { ENV_MISSING }.to_owned() }
}

fn client_check(service: &IdentityService) -> CheckResult {
    match service.endpoint() {
        Ok(_) => CheckResult { name: CLIENT_CHECK, pass: true, details: CLIENT_OK.to_owned() },
        Err(err) => CheckResult { name: CLIENT_CHECK, pass: false, details: err.to_string() },
    }
}

async fn status_check(probe: &StatusProbe) -> CheckResult {
    match probe.fetch().await {
        Ok(body) => CheckResult {
            name: STATUS_CHECK,
            pass: body.get("ok").and_then(Value::as_bool) == Some(true),
            details: body.to_string(),
        },
        Err(err) => {
            warn!(url = probe.url(), error = %err, "Status endpoint probe failed");
            CheckResult { name: STATUS_CHECK, pass: false, details: err.to_string() }
        },
    }
}
