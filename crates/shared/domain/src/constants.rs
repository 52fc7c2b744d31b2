//! Names shared between the configuration loader, the HTTP layer and the views.

/// Environment variable holding the identity service endpoint.
pub const ENV_ENDPOINT_URL: &str = "SERVICE_ENDPOINT_URL";
/// Environment variable holding the identity service public (anon) key.
pub const ENV_PUBLIC_KEY: &str = "SERVICE_PUBLIC_KEY";

/// Prefix for nested configuration overrides (`LOVEBIRD__SERVER__PORT`).
pub const ENV_PREFIX: &str = "LOVEBIRD";
/// Environment variable pointing at the configuration file.
pub const ENV_CONFIG_FILE: &str = "LOVEBIRD_CONFIG";

/// `OpenAPI` tags.
pub const SYSTEM_TAG: &str = "System";
pub const AUTH_TAG: &str = "Auth";
pub const PAGES_TAG: &str = "Pages";

/// Cookie carrying the opaque browser id.
pub const BROWSER_COOKIE: &str = "lb_sid";

/// OAuth provider used by the login page.
pub const DEFAULT_PROVIDER: &str = "google";

pub const SELF_TEST_PATH: &str = "/api/self-test";
pub const CALLBACK_PATH: &str = "/auth/callback";
