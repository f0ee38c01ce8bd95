use std::sync::Once;

/// Logger setup for the `sidewinder` binary.
///
/// Filter precedence: `env_filter`, then `verbose` (`debug` for everything),
/// then `RUST_LOG`, then `default_level`. Filters use the `env_logger`
/// syntax, e.g. `"sidewinder_build=debug,info"`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    /// Set by `-v`; shows per-artifact build output.
    pub verbose: bool,
    pub default_level: log::LevelFilter,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            verbose: false,
            default_level: log::LevelFilter::Info,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

static INIT: Once = Once::new();

/// Installs `env_logger` as the global logger. Only the first call counts.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = effective_filter(&config, std::env::var("RUST_LOG").ok());

        let mut builder = env_logger::Builder::new();
        builder.parse_filters(&filter);
        builder.write_style(config.write_style);
        builder.format_timestamp(None);
        builder.format_target(config.verbose);
        builder.init();

        log::debug!("logging initialized (filter: {filter})");
    });
}

fn effective_filter(config: &LoggingConfig, rust_log: Option<String>) -> String {
    if let Some(filter) = &config.env_filter {
        return filter.clone();
    }
    if config.verbose {
        return "debug".to_string();
    }
    rust_log
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| config.default_level.as_str().to_ascii_lowercase())
}
