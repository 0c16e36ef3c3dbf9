use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::common::errors::{EngineError, Result};
use crate::common::types::{normalize_label, PlatformId};

/// A single named fee component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeLineItem {
    pub name: String,
    pub amount: Decimal,
}

impl FeeLineItem {
    pub fn new(name: impl Into<String>, amount: Decimal) -> Self {
        Self {
            name: name.into(),
            amount,
        }
    }
}

/// Fees and profit for selling one item on one platform
///
/// `total_fees` is always the sum of `fee_line_items`. Informational items
/// (monthly subscriptions, buyer-side fees) are reported but never deducted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub platform: PlatformId,
    pub sale_price: Decimal,
    pub shipping_cost: Decimal,
    /// Sale price plus shipping charged to the buyer
    pub gross_revenue: Decimal,
    pub item_cost: Decimal,
    pub total_fees: Decimal,
    pub net_revenue: Decimal,
    /// May be negative; a loss is a valid outcome
    pub net_profit: Decimal,
    pub profit_margin_percent: Decimal,
    pub fee_line_items: Vec<FeeLineItem>,
    #[serde(default)]
    pub informational_items: Vec<FeeLineItem>,
}

impl FeeBreakdown {
    /// Look up a fee line by name
    pub fn line(&self, name: &str) -> Option<Decimal> {
        self.fee_line_items
            .iter()
            .find(|item| item.name == name)
            .map(|item| item.amount)
    }

    pub fn line_total(&self) -> Decimal {
        self.fee_line_items.iter().map(|item| item.amount).sum()
    }
}

/// Named pricing strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyName {
    QuickSale,
    Competitive,
    Premium,
    AuctionStart,
}

impl StrategyName {
    pub const ALL: [StrategyName; 4] = [
        StrategyName::QuickSale,
        StrategyName::Competitive,
        StrategyName::Premium,
        StrategyName::AuctionStart,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyName::QuickSale => "quick_sale",
            StrategyName::Competitive => "competitive",
            StrategyName::Premium => "premium",
            StrategyName::AuctionStart => "auction_start",
        }
    }
}

impl fmt::Display for StrategyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a strategy price was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceBasis {
    MarketMedian,
    /// No usable observations; the price is zero
    NoMarketData,
}

/// A price's position relative to the observed median
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketPosition {
    WellBelowMarket,
    BelowMarket,
    AtMarket,
    AboveMarket,
    WellAboveMarket,
    InsufficientMarketData,
}

impl MarketPosition {
    pub fn competitive_advantage(&self) -> &'static str {
        match self {
            MarketPosition::WellBelowMarket => "high_price_advantage",
            MarketPosition::BelowMarket => "moderate_price_advantage",
            MarketPosition::AtMarket => "neutral",
            MarketPosition::AboveMarket => "quality_positioning_needed",
            MarketPosition::WellAboveMarket => "premium_justification_required",
            MarketPosition::InsufficientMarketData => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleSpeed {
    Fast,
    Medium,
    Slow,
    /// Auctions close on a schedule, not on price
    Variable,
}

/// Candidate list price derived from market statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingStrategy {
    pub name: StrategyName,
    pub price: Decimal,
    pub basis: PriceBasis,
    pub market_position: MarketPosition,
    /// What the position means for the listing, see [`MarketPosition::competitive_advantage`]
    pub competitive_advantage: String,
    /// price / median, rounded to two places; zero without market data
    pub price_ratio: Decimal,
    pub confidence: f64,
    pub expected_sale_speed: SaleSpeed,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_final_price: Option<Decimal>,
}

impl PricingStrategy {
    pub fn has_market_data(&self) -> bool {
        self.basis == PriceBasis::MarketMedian
    }
}

/// Seller preference used to choose among strategies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SellerPriority {
    QuickSale,
    MaxProfit,
    #[default]
    Balanced,
}

impl SellerPriority {
    pub fn preferred_strategy(&self) -> StrategyName {
        match self {
            SellerPriority::QuickSale => StrategyName::QuickSale,
            SellerPriority::MaxProfit => StrategyName::Premium,
            SellerPriority::Balanced => StrategyName::Competitive,
        }
    }
}

impl FromStr for SellerPriority {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_label(s).as_str() {
            "quick_sale" | "quick" => Ok(SellerPriority::QuickSale),
            "max_profit" | "profit" => Ok(SellerPriority::MaxProfit),
            "balanced" => Ok(SellerPriority::Balanced),
            _ => Err(EngineError::invalid_input("priority", format!("unknown priority '{}'", s))),
        }
    }
}

/// Qualitative platform fit derived from listing volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuitabilityLabel {
    Excellent,
    Good,
    Fair,
    Poor,
    Unknown,
}

/// Component scores behind a platform's suitability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuitabilityScore {
    pub platform: PlatformId,
    /// Weighted blend in [0, 10]
    pub overall: f64,
    pub audience_match: f64,
    pub category_fit: f64,
    pub fee_competitiveness: f64,
    pub ease_of_use: f64,
    pub market_presence: f64,
    pub label: SuitabilityLabel,
    pub estimated_days_to_sell: u32,
}

impl SuitabilityScore {
    pub fn is_poor(&self) -> bool {
        self.label == SuitabilityLabel::Poor
    }
}

/// One row of a comparison: fees plus advisory suitability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPlatform {
    pub rank: usize,
    pub breakdown: FeeBreakdown,
    pub suitability: SuitabilityScore,
}

/// A platform whose fee computation failed for a reason other than being unknown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformFailure {
    pub platform: PlatformId,
    pub error: String,
}

/// Ranked comparison across platforms for one sale price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformComparison {
    pub ranked: Vec<RankedPlatform>,
    /// Platform names rejected as unknown or unconfigured
    pub skipped: Vec<String>,
    pub errors: Vec<PlatformFailure>,
}

impl PlatformComparison {
    pub fn breakdowns(&self) -> impl Iterator<Item = &FeeBreakdown> {
        self.ranked.iter().map(|entry| &entry.breakdown)
    }
}

/// Final recommendation for where to list an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformRecommendation {
    pub top_pick: Option<RankedPlatform>,
    pub alternatives: Vec<RankedPlatform>,
    /// Net profit of the top pick over the best other platform
    pub profit_advantage: Decimal,
    /// Confidence in the ranking, 0 when nothing could be compared
    pub confidence: f64,
    pub ranked: Vec<RankedPlatform>,
    pub skipped: Vec<String>,
    pub errors: Vec<PlatformFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_parsing() {
        assert_eq!("Max Profit".parse::<SellerPriority>().unwrap(), SellerPriority::MaxProfit);
        assert_eq!("quick-sale".parse::<SellerPriority>().unwrap(), SellerPriority::QuickSale);
        assert!("cheapest".parse::<SellerPriority>().is_err());
    }

    #[test]
    fn test_positions_describe_advantage() {
        assert_eq!(MarketPosition::WellBelowMarket.competitive_advantage(), "high_price_advantage");
        assert_eq!(MarketPosition::InsufficientMarketData.competitive_advantage(), "unknown");
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_value(MarketPosition::WellAboveMarket).unwrap(),
            serde_json::json!("well_above_market")
        );
        assert_eq!(
            serde_json::to_value(StrategyName::AuctionStart).unwrap(),
            serde_json::json!(StrategyName::AuctionStart.as_str())
        );
    }
}
