//! # Logger
//!
//! Console and file logging for the Lovebird server.
//!
//! * The console layer is either compact ANSI text or one JSON object per line
//!   ([`ConsoleFormat`]); `LOVEBIRD_LOG_FORMAT=json` selects JSON via
//!   [`ConsoleFormat::from_env`].
//! * File output uses a non-blocking rolling appender. Keep the returned [`Logger`]
//!   alive so buffered lines are flushed.
//! * `RUST_LOG` overrides the default level. Without it, chatty transport crates
//!   (`hyper`, `h2`, `rustls`, `reqwest`) are capped at `warn`.
//! * Optional `opentelemetry` support attaches a layer backed by the global tracer.
//!
//! ## Example
//!
//! ```rust
//! # use lovebird_logger::{ConsoleFormat, Logger, LevelFilter};
//!
//! let _logger = Logger::builder()
//!     .name("lovebird")
//!     .console_format(ConsoleFormat::Compact)
//!     .level(LevelFilter::DEBUG)
//!     .init()
//!     .unwrap();
//! ```

mod builder;
mod error;
mod filter;
mod format;

pub use crate::builder::{LoggerBuilder, NoFile, NoName, WithFile, WithName};
pub use crate::error::{LoggerError, LoggerErrorExt};
pub use crate::format::ConsoleFormat;
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use tracing_appender::non_blocking::WorkerGuard;

/// Handle to the initialized logging system.
#[must_use = "Dropping this handle will stop background logging threads."]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// The file writer guard, if file output is enabled.
    #[must_use]
    pub const fn guard(&self) -> Option<&WorkerGuard> {
        self.guard.as_ref()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::info!("Logging system shutting down, flushing buffers...");
        }
    }
}
