use lovebird_domain::config::IdentityConfig;

pub const MISSING_ENDPOINT: &str = "Fehlt: SERVICE_ENDPOINT_URL";
pub const MISSING_PUBLIC_KEY: &str = "Fehlt: SERVICE_PUBLIC_KEY";

/// Lists the required identity settings that are unset, empty or blank.
///
/// The endpoint message always precedes the key message. An empty list means healthy.
#[must_use]
pub fn check_health(identity: &IdentityConfig) -> Vec<&'static str> {
    let mut issues = Vec::with_capacity(2);
    if identity.endpoint_url().is_none() {
        issues.push(MISSING_ENDPOINT);
    }
    if identity.public_key().is_none() {
        issues.push(MISSING_PUBLIC_KEY);
    }
    issues
}
