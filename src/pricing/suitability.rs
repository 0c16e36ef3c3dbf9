//! Advisory platform suitability scoring
//!
//! The score blends audience, category, fee, ease-of-use and market
//! activity signals into a 0-10 value. It explains a recommendation and
//! breaks profit ties; it never overrides the profit ranking.

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::common::errors::{EngineError, Result};
use crate::common::types::{normalize_label, ItemCondition, PlatformId};
use crate::pricing::statistics::{DemandLevel, MarketActivity};
use crate::pricing::types::{SuitabilityLabel, SuitabilityScore};

const AUDIENCE_WEIGHT: f64 = 0.25;
const CATEGORY_WEIGHT: f64 = 0.25;
const FEE_WEIGHT: f64 = 0.20;
const EASE_WEIGHT: f64 = 0.15;
const MARKET_WEIGHT: f64 = 0.15;

/// How much effort listing on a platform takes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EaseOfUse {
    Easy,
    #[default]
    Moderate,
    Difficult,
}

impl EaseOfUse {
    pub fn score(&self) -> f64 {
        match self {
            EaseOfUse::Easy => 9.0,
            EaseOfUse::Moderate => 7.0,
            EaseOfUse::Difficult => 4.0,
        }
    }
}

/// Hand-authored description of a platform's audience
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformProfile {
    pub category_focus: Vec<String>,
    pub ease_of_use: EaseOfUse,
    pub buying_behavior: String,
    pub base_days_to_sell: u32,
}

impl Default for PlatformProfile {
    fn default() -> Self {
        Self {
            category_focus: Vec::new(),
            ease_of_use: EaseOfUse::Moderate,
            buying_behavior: "value_focused".to_string(),
            base_days_to_sell: 10,
        }
    }
}

impl PlatformProfile {
    fn new(focus: &[&str], ease_of_use: EaseOfUse, buying_behavior: &str, base_days: u32) -> Self {
        Self {
            category_focus: focus.iter().map(|c| c.to_string()).collect(),
            ease_of_use,
            buying_behavior: buying_behavior.to_string(),
            base_days_to_sell: base_days,
        }
    }

    /// Built-in profile for a platform
    pub fn for_platform(platform: PlatformId) -> Self {
        match platform {
            PlatformId::Ebay => Self::new(
                &["electronics", "collectibles", "automotive", "fashion"],
                EaseOfUse::Moderate,
                "research_focused",
                7,
            ),
            PlatformId::Amazon => Self::new(
                &["books", "electronics", "home", "health"],
                EaseOfUse::Difficult,
                "convenience_focused",
                3,
            ),
            PlatformId::Etsy => Self::new(
                &["handmade", "vintage", "crafts", "jewelry", "art"],
                EaseOfUse::Moderate,
                "high_quality_focused",
                10,
            ),
            PlatformId::FacebookMarketplace => Self::new(
                &["furniture", "electronics", "vehicles", "home"],
                EaseOfUse::Easy,
                "local_focused",
                5,
            ),
            PlatformId::Mercari => Self::new(
                &["fashion", "electronics", "beauty", "toys"],
                EaseOfUse::Easy,
                "deal_focused",
                10,
            ),
            PlatformId::Poshmark => Self::new(
                &["fashion", "accessories", "beauty"],
                EaseOfUse::Easy,
                "fashion_focused",
                14,
            ),
            PlatformId::Depop => Self::new(
                &["fashion", "vintage", "streetwear", "accessories"],
                EaseOfUse::Easy,
                "trend_focused",
                10,
            ),
            PlatformId::Vinted => Self::new(
                &["fashion", "accessories", "kids"],
                EaseOfUse::Easy,
                "value_focused",
                10,
            ),
        }
    }

    /// Built-in profiles keyed by platform name
    pub fn builtin_table() -> BTreeMap<String, PlatformProfile> {
        PlatformId::ALL
            .iter()
            .map(|p| (p.as_str().to_string(), Self::for_platform(*p)))
            .collect()
    }
}

/// Signals available for scoring one platform
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuitabilityInput {
    pub category: Option<String>,
    pub condition: Option<ItemCondition>,
    /// None when the market search returned nothing for this platform
    pub market: Option<MarketActivity>,
    pub profit_margin_percent: Decimal,
}

/// Scores platforms against configured profiles
#[derive(Debug, Clone)]
pub struct SuitabilityScorer {
    profiles: BTreeMap<PlatformId, PlatformProfile>,
}

impl SuitabilityScorer {
    pub fn new(profiles: &BTreeMap<String, PlatformProfile>) -> Result<Self> {
        let mut parsed = BTreeMap::new();
        for (name, profile) in profiles {
            let platform: PlatformId = name.parse().map_err(|_| {
                EngineError::Configuration(format!("profile for unknown platform '{}'", name))
            })?;
            let mut profile = profile.clone();
            profile.category_focus = profile
                .category_focus
                .iter()
                .map(|c| normalize_label(c))
                .collect();
            parsed.insert(platform, profile);
        }
        Ok(Self { profiles: parsed })
    }

    pub fn builtin() -> Self {
        Self {
            profiles: PlatformId::ALL
                .iter()
                .map(|p| (*p, PlatformProfile::for_platform(*p)))
                .collect(),
        }
    }

    /// Profile for a platform; unprofiled platforms get a neutral default
    pub fn profile(&self, platform: PlatformId) -> PlatformProfile {
        self.profiles.get(&platform).cloned().unwrap_or_default()
    }

    pub fn score(&self, platform: PlatformId, input: &SuitabilityInput) -> SuitabilityScore {
        let profile = self.profile(platform);

        let audience_match = audience_match(input.condition, &profile);
        let category_fit = category_fit(input.category.as_deref(), &profile);
        let fee_competitiveness = fee_competitiveness(input.profit_margin_percent);
        let ease_of_use = profile.ease_of_use.score();
        let market_presence = market_presence(input.market.as_ref());

        let overall = (audience_match * AUDIENCE_WEIGHT
            + category_fit * CATEGORY_WEIGHT
            + fee_competitiveness * FEE_WEIGHT
            + ease_of_use * EASE_WEIGHT
            + market_presence * MARKET_WEIGHT)
            .clamp(0.0, 10.0);
        let overall = (overall * 100.0).round() / 100.0;

        SuitabilityScore {
            platform,
            overall,
            audience_match,
            category_fit,
            fee_competitiveness,
            ease_of_use,
            market_presence,
            label: suitability_label(input.market.as_ref()),
            estimated_days_to_sell: estimated_days_to_sell(&profile, input.market.as_ref(), overall),
        }
    }
}

impl Default for SuitabilityScorer {
    fn default() -> Self {
        Self::builtin()
    }
}

fn audience_match(condition: Option<ItemCondition>, profile: &PlatformProfile) -> f64 {
    let mut score: f64 = 7.0;
    match condition {
        Some(ItemCondition::New | ItemCondition::LikeNew)
            if profile.buying_behavior.contains("high_quality") =>
        {
            score += 1.5
        }
        Some(ItemCondition::Good | ItemCondition::VeryGood) => score += 0.5,
        _ => {}
    }
    score.clamp(0.0, 10.0)
}

/// 9 for a focus category, 7 for a partial match, 5 otherwise
fn category_fit(category: Option<&str>, profile: &PlatformProfile) -> f64 {
    let category = match category.map(normalize_label) {
        Some(c) if !c.is_empty() => c,
        _ => return 5.0,
    };
    if profile.category_focus.iter().any(|focus| *focus == category) {
        9.0
    } else if profile
        .category_focus
        .iter()
        .any(|focus| category.contains(focus.as_str()) || focus.contains(category.as_str()))
    {
        7.0
    } else {
        5.0
    }
}

fn fee_competitiveness(profit_margin_percent: Decimal) -> f64 {
    let margin = profit_margin_percent.to_f64().unwrap_or(0.0);
    if margin >= 80.0 {
        10.0
    } else if margin >= 70.0 {
        8.5
    } else if margin >= 60.0 {
        7.0
    } else if margin >= 50.0 {
        5.5
    } else if margin >= 40.0 {
        4.0
    } else {
        2.0
    }
}

fn market_presence(market: Option<&MarketActivity>) -> f64 {
    let Some(market) = market else {
        // Neutral when the search returned nothing
        return 5.0;
    };
    let mut score: f64 = match market.total_listings {
        n if n > 100 => 9.0,
        n if n > 50 => 8.0,
        n if n > 20 => 6.5,
        n if n > 5 => 5.0,
        _ => 3.0,
    };
    let sold_ratio = market.sold_ratio();
    if sold_ratio > 0.5 {
        score += 1.0;
    } else if sold_ratio > 0.3 {
        score += 0.5;
    }
    score.min(10.0)
}

fn suitability_label(market: Option<&MarketActivity>) -> SuitabilityLabel {
    match market.map(|m| m.total_listings) {
        None => SuitabilityLabel::Unknown,
        Some(n) if n > 50 => SuitabilityLabel::Excellent,
        Some(n) if n > 20 => SuitabilityLabel::Good,
        Some(n) if n > 5 => SuitabilityLabel::Fair,
        Some(_) => SuitabilityLabel::Poor,
    }
}

fn estimated_days_to_sell(
    profile: &PlatformProfile,
    market: Option<&MarketActivity>,
    overall: f64,
) -> u32 {
    let mut days = profile.base_days_to_sell;
    match market.map(|m| m.demand()) {
        Some(DemandLevel::High) => days = days * 7 / 10,
        Some(DemandLevel::Low) => days = days * 3 / 2,
        _ => {}
    }
    if overall >= 8.0 {
        days = days * 4 / 5;
    } else if overall <= 5.0 {
        days = days * 13 / 10;
    }
    days
}
