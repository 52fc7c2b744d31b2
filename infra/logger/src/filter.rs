use crate::error::LoggerError;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

/// Caps applied when neither `RUST_LOG` nor an explicit filter is given.
const QUIET_DIRECTIVES: &[&str] = &["hyper=warn", "h2=warn", "rustls=warn", "reqwest=warn"];

/// Precedence: explicit filter, then `RUST_LOG`, then `level` with transport crates capped.
pub(crate) fn env_filter(level: LevelFilter, explicit: Option<&str>, from_env: bool) -> Result<EnvFilter, LoggerError> {
    let builder = EnvFilter::builder().with_default_directive(level.into());

    match explicit {
        Some(filter) => builder.parse(filter).map_err(|e| invalid(format!("Invalid env filter '{filter}': {e}"))),
        None if from_env => Ok(builder.from_env_lossy()),
        None => QUIET_DIRECTIVES.iter().try_fold(builder.parse_lossy(""), |filter, raw| {
            raw.parse::<Directive>()
                .map(|directive| filter.add_directive(directive))
                .map_err(|e| invalid(format!("Invalid directive '{raw}': {e}")))
        }),
    }
}

fn invalid(message: String) -> LoggerError {
    LoggerError::InvalidConfiguration { message: message.into(), context: None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_crates_are_capped_by_default() -> Result<(), LoggerError> {
        let rendered = env_filter(LevelFilter::INFO, None, false)?.to_string();
        for directive in QUIET_DIRECTIVES {
            assert!(rendered.contains(directive), "{rendered}");
        }
        Ok(())
    }

    #[test]
    fn explicit_filter_replaces_the_caps() -> Result<(), LoggerError> {
        let rendered = env_filter(LevelFilter::INFO, Some("lovebird=debug"), false)?.to_string();
        assert!(rendered.contains("lovebird=debug"), "{rendered}");
        assert!(!rendered.contains("hyper=warn"), "{rendered}");
        Ok(())
    }

    #[test]
    fn invalid_explicit_filter_is_rejected() {
        let result = env_filter(LevelFilter::INFO, Some("lovebird=loud"), false);
        assert!(matches!(result, Err(LoggerError::InvalidConfiguration { .. })));
    }
}
