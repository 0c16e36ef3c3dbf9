//! Configuration loader

use config::{Config, Environment, File};
use std::path::Path;
use tracing::{info, warn};

use super::types::AppConfig;
use crate::common::errors::{EngineError, Result};
use crate::pricing::fees::FeeScheduleSet;
use crate::pricing::suitability::PlatformProfile;

/// Load configuration from file and environment variables
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with APP__, nested with __)
/// 2. Configuration file (TOML format)
/// 3. Built-in tables
///
/// A fee or profile table given in the file replaces the built-in one as a
/// whole. An empty table falls back to the built-in one.
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path).required(false));
        } else {
            warn!(path, "configuration file not found, using built-in tables");
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("APP")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| EngineError::Configuration(e.to_string()))?;

    let mut app: AppConfig = config
        .try_deserialize()
        .map_err(|e| EngineError::Configuration(e.to_string()))?;
    fill_empty_tables(&mut app);
    app.validate()?;

    info!(
        fee_version = %app.fees.version,
        effective_date = ?app.fees.effective_date,
        platforms = app.fees.platforms.len(),
        "configuration loaded"
    );
    Ok(app)
}

/// Parse configuration from TOML text
pub fn load_from_str(toml: &str) -> Result<AppConfig> {
    let config = Config::builder()
        .add_source(File::from_str(toml, config::FileFormat::Toml))
        .build()?;
    let mut app: AppConfig = config.try_deserialize()?;
    fill_empty_tables(&mut app);
    app.validate()?;
    Ok(app)
}

fn fill_empty_tables(app: &mut AppConfig) {
    if app.fees.platforms.is_empty() {
        app.fees.platforms = FeeScheduleSet::builtin().platforms;
    }
    if app.profiles.is_empty() {
        app.profiles = PlatformProfile::builtin_table();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::PlatformId;
    use crate::config::types::LogFormat;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_config_uses_builtin_tables() {
        let app = load_from_str("").unwrap();
        assert_eq!(app, AppConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let app = load_from_str(
            r#"
            [settings]
            log_level = "debug"
            log_format = "json"

            [recommendation]
            max_alternatives = 4

            [pricing.premium]
            multiplier = "1.2"
            confidence = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(app.settings.log_level, "debug");
        assert_eq!(app.settings.log_format, LogFormat::Json);
        assert_eq!(app.recommendation.max_alternatives, 4);
        assert_eq!(app.pricing.premium.multiplier, dec!(1.2));
        assert_eq!(app.pricing.quick_sale.multiplier, dec!(0.78));
        assert_eq!(app.fees.platforms.len(), PlatformId::ALL.len());
    }

    #[test]
    fn test_environment_overrides_file() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml");
        std::env::set_var("APP__RECOMMENDATION__MAX_ALTERNATIVES", "5");
        let loaded = load_config(Some(path));
        std::env::remove_var("APP__RECOMMENDATION__MAX_ALTERNATIVES");

        let app = loaded.unwrap();
        // File says 2
        assert_eq!(app.recommendation.max_alternatives, 5);
        assert_eq!(app.fees.platforms.len(), PlatformId::ALL.len());
        assert_eq!(app.pricing, AppConfig::default().pricing);
    }

    #[test]
    fn test_out_of_range_rate_rejected() {
        let err = load_from_str(
            r#"
            [fees.platforms.ebay]
            selling_rate = "1.5"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn test_unknown_platform_rejected() {
        let err = load_from_str(
            r#"
            [fees.platforms.craigslist]
            selling_rate = "0.1"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("craigslist"));
    }
}
