use std::sync::Once;

use log::LevelFilter;

/// Settings for the bundled `env_logger` backend.
///
/// Filter precedence: `filter` (env_logger directive syntax, such as
/// `"primdraw_engine::render=debug"`), then `RUST_LOG`, then `level`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub filter: Option<String>,
    /// Level used when no directive is supplied. Skipped drawables and shader
    /// diagnostics are logged at `warn`, so anything below hides them.
    pub level: LevelFilter,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: None,
            level: LevelFilter::Warn,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

/// Where the active filter came from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FilterSource {
    Directives(String),
    Level(LevelFilter),
}

fn resolve_filter(config: &LoggingConfig, rust_log: Option<String>) -> FilterSource {
    match config.filter.clone().or(rust_log) {
        Some(directives) => FilterSource::Directives(directives),
        None => FilterSource::Level(config.level),
    }
}

static INIT: Once = Once::new();

/// Installs `env_logger` as the `log` backend.
///
/// Only the first call has an effect. If the host already installed a logger
/// it is left in place.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        match resolve_filter(&config, std::env::var("RUST_LOG").ok()) {
            FilterSource::Directives(directives) => builder.parse_filters(&directives),
            FilterSource::Level(level) => builder.filter_level(level),
        };
        builder.write_style(config.write_style);

        if builder.try_init().is_ok() {
            log::debug!("primdraw logging initialized");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_beats_rust_log() {
        let config = LoggingConfig {
            filter: Some("primdraw_engine=trace".into()),
            ..Default::default()
        };
        assert_eq!(
            resolve_filter(&config, Some("error".into())),
            FilterSource::Directives("primdraw_engine=trace".into())
        );
    }

    #[test]
    fn falls_back_to_rust_log_then_level() {
        let config = LoggingConfig::default();
        assert_eq!(
            resolve_filter(&config, Some("info".into())),
            FilterSource::Directives("info".into())
        );
        assert_eq!(resolve_filter(&config, None), FilterSource::Level(LevelFilter::Warn));
    }

    #[test]
    fn init_is_idempotent() {
        init_logging(LoggingConfig::default());
        init_logging(LoggingConfig {
            level: LevelFilter::Trace,
            ..Default::default()
        });
    }
}
