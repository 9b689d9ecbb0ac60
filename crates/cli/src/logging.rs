use crate::config::LogSettings;
use anyhow::Result;
use sessionguard_core::tracing::{InstrumentationConfig, init_tracing};
use tracing::Level;

/// Initialize logging for the CLI
///
/// A `--log-level` flag wins over the configured level; `RUST_LOG` wins over both.
pub fn init_logging(settings: &LogSettings, level_override: Option<Level>) -> Result<()> {
    let log_level = match level_override {
        Some(level) => level.to_string().to_lowercase(),
        None => settings.level.clone(),
    };

    let config = InstrumentationConfig {
        service_name: "sessionguard-cli".to_string(),
        log_level,
        json: settings.json,
        ..InstrumentationConfig::default()
    };

    init_tracing(&config)?;
    Ok(())
}
