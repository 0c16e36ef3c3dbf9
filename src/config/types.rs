//! Configuration types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::common::errors::Result;
use crate::pricing::comparator::RecommendationSettings;
use crate::pricing::fees::{FeeModel, FeeScheduleSet};
use crate::pricing::strategy::StrategyPolicy;
use crate::pricing::suitability::{PlatformProfile, SuitabilityScorer};

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Versioned per-platform fee schedules
    #[serde(default)]
    pub fees: FeeScheduleSet,
    /// Strategy multipliers and confidences
    #[serde(default)]
    pub pricing: StrategyPolicy,
    /// Audience profiles used for suitability scoring, keyed by platform
    #[serde(default = "PlatformProfile::builtin_table")]
    pub profiles: BTreeMap<String, PlatformProfile>,
    #[serde(default)]
    pub recommendation: RecommendationSettings,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fees: FeeScheduleSet::builtin(),
            pricing: StrategyPolicy::default(),
            profiles: PlatformProfile::builtin_table(),
            recommendation: RecommendationSettings::default(),
            settings: AppSettings::default(),
        }
    }
}

impl AppConfig {
    /// Check every table the engine will be built from
    pub fn validate(&self) -> Result<()> {
        FeeModel::new(&self.fees)?;
        SuitabilityScorer::new(&self.profiles)?;
        self.pricing.validate()?;
        Ok(())
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// General application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
