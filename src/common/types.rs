//! Unified types used across all engine components

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::errors::{EngineError, Result};

/// Marketplace identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformId {
    Ebay,
    Amazon,
    Etsy,
    FacebookMarketplace,
    Mercari,
    Poshmark,
    Depop,
    Vinted,
}

impl PlatformId {
    /// Every platform the engine knows a fee formula for
    pub const ALL: [PlatformId; 8] = [
        PlatformId::Ebay,
        PlatformId::Amazon,
        PlatformId::Etsy,
        PlatformId::FacebookMarketplace,
        PlatformId::Mercari,
        PlatformId::Poshmark,
        PlatformId::Depop,
        PlatformId::Vinted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformId::Ebay => "ebay",
            PlatformId::Amazon => "amazon",
            PlatformId::Etsy => "etsy",
            PlatformId::FacebookMarketplace => "facebook_marketplace",
            PlatformId::Mercari => "mercari",
            PlatformId::Poshmark => "poshmark",
            PlatformId::Depop => "depop",
            PlatformId::Vinted => "vinted",
        }
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformId {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = normalize_label(s);
        match normalized.as_str() {
            "ebay" => Ok(PlatformId::Ebay),
            "amazon" => Ok(PlatformId::Amazon),
            "etsy" => Ok(PlatformId::Etsy),
            "facebook_marketplace" | "facebook" => Ok(PlatformId::FacebookMarketplace),
            "mercari" => Ok(PlatformId::Mercari),
            "poshmark" => Ok(PlatformId::Poshmark),
            "depop" => Ok(PlatformId::Depop),
            "vinted" => Ok(PlatformId::Vinted),
            _ => Err(EngineError::InvalidPlatform(s.to_string())),
        }
    }
}

/// Six-point item condition scale
///
/// Ordered from best to worst; the price multiplier decreases monotonically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCondition {
    New,
    LikeNew,
    VeryGood,
    #[default]
    Good,
    Acceptable,
    Poor,
}

impl ItemCondition {
    /// Fraction of the base price an item in this condition is expected to fetch
    pub fn price_multiplier(&self) -> Decimal {
        match self {
            ItemCondition::New => Decimal::new(10, 1),
            ItemCondition::LikeNew => Decimal::new(9, 1),
            ItemCondition::VeryGood => Decimal::new(8, 1),
            ItemCondition::Good => Decimal::new(7, 1),
            ItemCondition::Acceptable => Decimal::new(6, 1),
            ItemCondition::Poor => Decimal::new(4, 1),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemCondition::New => "new",
            ItemCondition::LikeNew => "like_new",
            ItemCondition::VeryGood => "very_good",
            ItemCondition::Good => "good",
            ItemCondition::Acceptable => "acceptable",
            ItemCondition::Poor => "poor",
        }
    }
}

impl fmt::Display for ItemCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemCondition {
    type Err = EngineError;

    /// Parses the six-point scale plus the coarser labels vision services emit
    fn from_str(s: &str) -> Result<Self> {
        match normalize_label(s).as_str() {
            "new" | "brand_new" | "new_with_tags" | "sealed" => Ok(ItemCondition::New),
            "like_new" | "mint" | "open_box" | "new_without_tags" => Ok(ItemCondition::LikeNew),
            "very_good" | "excellent" => Ok(ItemCondition::VeryGood),
            "good" | "used" | "pre_owned" => Ok(ItemCondition::Good),
            "acceptable" | "fair" | "worn" => Ok(ItemCondition::Acceptable),
            "poor" | "damaged" | "for_parts" => Ok(ItemCondition::Poor),
            _ => Err(EngineError::invalid_input("condition", format!("unknown condition '{}'", s))),
        }
    }
}

/// Lowercase, trim and collapse spaces/dashes to underscores
pub fn normalize_label(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

/// Round a currency amount to cents, half away from zero
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Reject negative monetary inputs
pub fn validate_amount(field: &str, amount: Decimal) -> Result<Decimal> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(EngineError::invalid_input(field, format!("must be non-negative, got {}", amount)));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_platform_round_trip() {
        for platform in PlatformId::ALL {
            assert_eq!(platform.as_str().parse::<PlatformId>().unwrap(), platform);
        }
        assert_eq!("Facebook Marketplace".parse::<PlatformId>().unwrap(), PlatformId::FacebookMarketplace);
    }

    #[test]
    fn test_unknown_platform() {
        let err = "craigslist".parse::<PlatformId>().unwrap_err();
        assert!(err.is_invalid_platform());
    }

    #[test]
    fn test_condition_aliases_are_monotonic() {
        let labels = ["new", "mint", "excellent", "used", "fair", "for parts"];
        let multipliers: Vec<Decimal> = labels
            .iter()
            .map(|l| l.parse::<ItemCondition>().unwrap().price_multiplier())
            .collect();
        assert!(multipliers.windows(2).all(|w| w[0] > w[1]));
        assert_eq!(ItemCondition::Poor.price_multiplier(), dec!(0.4));
    }

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(dec!(2.005)), dec!(2.01));
        assert_eq!(round_cents(dec!(13.2500)), dec!(13.25));
        assert_eq!(round_cents(dec!(-1.005)), dec!(-1.01));
    }

    #[test]
    fn test_amount_validation() {
        assert!(validate_amount("sale_price", dec!(-0.01)).is_err());
        assert_eq!(validate_amount("sale_price", Decimal::ZERO).unwrap(), Decimal::ZERO);
    }
}
