use std::env;
use tracing::Subscriber;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{Layer, fmt};

const LOG_FORMAT_ENV: &str = "LOVEBIRD_LOG_FORMAT";

/// Output style of the console layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleFormat {
    /// ANSI-colored, one line per event.
    #[default]
    Compact,
    /// One JSON object per line, for log shippers.
    Json,
}

impl ConsoleFormat {
    /// `json` (any case, surrounding blanks ignored) selects [`ConsoleFormat::Json`];
    /// everything else falls back to compact.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") { Self::Json } else { Self::Compact }
    }

    /// Read the format from `LOVEBIRD_LOG_FORMAT`.
    #[must_use]
    pub fn from_env() -> Self {
        env::var(LOG_FORMAT_ENV).map(|value| Self::parse(&value)).unwrap_or_default()
    }

    pub(crate) fn layer<S>(self) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        match self {
            Self::Compact => fmt::layer().compact().with_ansi(true).boxed(),
            Self::Json => fmt::layer().json().with_ansi(false).boxed(),
        }
    }
}
