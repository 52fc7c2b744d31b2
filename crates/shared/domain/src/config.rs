use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Top-level application configuration.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfigInner {
    pub server: ServerConfig,
    pub identity: IdentityConfig,
    pub diagnostics: DiagnosticsConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into handlers and views.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(flatten, default)]
    inner: Arc<AppConfigInner>,
}

impl Deref for AppConfig {
    type Target = AppConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for AppConfig {
    fn deref_mut(&mut self) -> &mut AppConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
    pub ssl: Option<SslConfig>,
    /// Externally visible origin, e.g. `https://lovebird.example`.
    pub public_url: Option<String>,
}

impl ServerConfig {
    /// Origin used to build absolute URLs (OAuth redirect). No trailing slash.
    #[must_use]
    pub fn origin(&self) -> String {
        self.public_url.as_deref().map(str::trim).filter(|url| !url.is_empty()).map_or_else(
            || {
                let scheme = if self.ssl.is_some() { "https" } else { "http" };
                format!("{scheme}://localhost:{}", self.port)
            },
            |url| url.trim_end_matches('/').to_owned(),
        )
    }
}

/// TLS certificate/key paths.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SslConfig {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Connection to the external identity service.
///
/// `endpoint_url` and `public_key` have no defaults. A missing value is not an error:
/// the application keeps running and reports the gap through the health check.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub endpoint_url: Option<String>,
    pub public_key: Option<String>,
    /// OAuth redirect target; defaults to `<origin>/auth/callback`.
    pub redirect_url: Option<String>,
    pub request_timeout_secs: u64,
    /// Upper bound for resolving the current session in the login view.
    pub session_timeout_secs: u64,
    pub session_cache_capacity: u64,
    pub session_idle_secs: u64,
    /// Adds `Secure` to the browser cookie.
    pub secure_cookie: bool,
}

impl IdentityConfig {
    /// The endpoint URL, if set to something other than blanks.
    #[must_use]
    pub fn endpoint_url(&self) -> Option<&str> {
        non_blank(self.endpoint_url.as_deref())
    }

    /// The public key, if set to something other than blanks.
    #[must_use]
    pub fn public_key(&self) -> Option<&str> {
        non_blank(self.public_key.as_deref())
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.endpoint_url().is_some() && self.public_key().is_some()
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub const fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }

    #[must_use]
    pub const fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }
}

/// Self-test page settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Status endpoint probed by the third check; defaults to the local listener.
    pub self_test_url: Option<String>,
    pub timeout_secs: u64,
}

impl DiagnosticsConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// --- Default ---

impl Default for ServerConfig {
    fn default() -> Self {
        Self { address: IpAddr::V4(Ipv4Addr::UNSPECIFIED), port: 3000, ssl: None, public_url: None }
    }
}

impl Default for SslConfig {
    fn default() -> Self {
        Self { cert: PathBuf::from("cert.pem"), key: PathBuf::from("key.pem") }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            endpoint_url: None,
            public_key: None,
            redirect_url: None,
            request_timeout_secs: 10,
            session_timeout_secs: 10,
            session_cache_capacity: 10_000,
            session_idle_secs: 24 * 60 * 60,
            secure_cookie: false,
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self { self_test_url: None, timeout_secs: 5 }
    }
}
