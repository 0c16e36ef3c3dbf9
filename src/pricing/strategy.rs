use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::common::errors::{EngineError, Result};
use crate::common::types::{round_cents, ItemCondition};
use crate::pricing::statistics::PriceStatisticsResult;
use crate::pricing::types::{
    MarketPosition, PriceBasis, PricingStrategy, SaleSpeed, SellerPriority, StrategyName,
};

/// Strategy multipliers above this are configuration mistakes
const MAX_MULTIPLIER: Decimal = dec!(10);

/// Multiplier applied to the market median and the confidence it carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRule {
    pub multiplier: Decimal,
    pub confidence: f64,
}

impl StrategyRule {
    pub fn new(multiplier: Decimal, confidence: f64) -> Self {
        Self {
            multiplier,
            confidence,
        }
    }
}

/// Fixed multiplier policy for the four candidate prices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyPolicy {
    pub quick_sale: StrategyRule,
    pub competitive: StrategyRule,
    pub premium: StrategyRule,
    pub auction_start: StrategyRule,
    /// Expected hammer price of an auction as a fraction of the median
    pub auction_expected_final: Decimal,
}

impl Default for StrategyPolicy {
    fn default() -> Self {
        Self {
            quick_sale: StrategyRule::new(dec!(0.78), 0.9),
            competitive: StrategyRule::new(dec!(0.95), 0.8),
            premium: StrategyRule::new(dec!(1.12), 0.6),
            auction_start: StrategyRule::new(dec!(0.65), 0.7),
            auction_expected_final: dec!(0.95),
        }
    }
}

impl StrategyPolicy {
    pub fn rule(&self, name: StrategyName) -> &StrategyRule {
        match name {
            StrategyName::QuickSale => &self.quick_sale,
            StrategyName::Competitive => &self.competitive,
            StrategyName::Premium => &self.premium,
            StrategyName::AuctionStart => &self.auction_start,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for name in StrategyName::ALL {
            let rule = self.rule(name);
            if rule.multiplier <= Decimal::ZERO || rule.multiplier > MAX_MULTIPLIER {
                return Err(EngineError::Configuration(format!(
                    "pricing.{}.multiplier must be in (0, {}], got {}",
                    name, MAX_MULTIPLIER, rule.multiplier
                )));
            }
            if !(0.0..=1.0).contains(&rule.confidence) {
                return Err(EngineError::Configuration(format!(
                    "pricing.{}.confidence must be in [0, 1], got {}",
                    name, rule.confidence
                )));
            }
        }
        if self.auction_expected_final <= Decimal::ZERO
            || self.auction_expected_final > MAX_MULTIPLIER
        {
            return Err(EngineError::Configuration(format!(
                "pricing.auction_expected_final must be in (0, {}], got {}",
                MAX_MULTIPLIER, self.auction_expected_final
            )));
        }
        Ok(())
    }
}

fn sale_speed(name: StrategyName) -> SaleSpeed {
    match name {
        StrategyName::QuickSale => SaleSpeed::Fast,
        StrategyName::Competitive => SaleSpeed::Medium,
        StrategyName::Premium => SaleSpeed::Slow,
        StrategyName::AuctionStart => SaleSpeed::Variable,
    }
}

fn scale(median: Decimal, multiplier: Decimal, name: StrategyName) -> Result<Decimal> {
    median.checked_mul(multiplier).ok_or_else(|| {
        EngineError::Arithmetic(format!("{} price overflows: {} * {}", name, median, multiplier))
    })
}

/// Bucket a price by its ratio to the market median
///
/// A zero median means there is nothing to compare against.
pub fn classify_market_position(price: Decimal, median: Decimal) -> MarketPosition {
    if median <= Decimal::ZERO {
        return MarketPosition::InsufficientMarketData;
    }
    let ratio = price / median;
    if ratio < dec!(0.8) {
        MarketPosition::WellBelowMarket
    } else if ratio < dec!(0.95) {
        MarketPosition::BelowMarket
    } else if ratio < dec!(1.05) {
        MarketPosition::AtMarket
    } else if ratio < dec!(1.2) {
        MarketPosition::AboveMarket
    } else {
        MarketPosition::WellAboveMarket
    }
}

/// Scale a base price by the item's condition
pub fn adjust_for_condition(price: Decimal, condition: ItemCondition) -> Decimal {
    round_cents(price * condition.price_multiplier())
}

/// Derives candidate list prices from market statistics
#[derive(Debug, Clone, Default)]
pub struct PricingStrategyEngine {
    policy: StrategyPolicy,
}

impl PricingStrategyEngine {
    pub fn new(policy: StrategyPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self { policy })
    }

    pub fn policy(&self) -> &StrategyPolicy {
        &self.policy
    }

    /// One strategy per name, in quick_sale, competitive, premium, auction_start order
    ///
    /// Fails only when a price overflows, which takes a median near `Decimal::MAX`.
    pub fn derive_strategies(&self, stats: &PriceStatisticsResult) -> Result<Vec<PricingStrategy>> {
        StrategyName::ALL
            .iter()
            .map(|name| self.derive(*name, stats))
            .collect()
    }

    fn derive(&self, name: StrategyName, stats: &PriceStatisticsResult) -> Result<PricingStrategy> {
        let rule = self.policy.rule(name);
        let median = stats.median;

        if stats.is_empty() || median <= Decimal::ZERO {
            let market_position = MarketPosition::InsufficientMarketData;
            return Ok(PricingStrategy {
                name,
                price: Decimal::ZERO,
                basis: PriceBasis::NoMarketData,
                market_position,
                competitive_advantage: market_position.competitive_advantage().to_string(),
                price_ratio: Decimal::ZERO,
                confidence: 0.0,
                expected_sale_speed: sale_speed(name),
                expected_final_price: None,
            });
        }

        let price = round_cents(scale(median, rule.multiplier, name)?);
        let expected_final_price = match name {
            StrategyName::AuctionStart => Some(round_cents(scale(
                median,
                self.policy.auction_expected_final,
                name,
            )?)),
            _ => None,
        };
        let market_position = classify_market_position(price, median);

        Ok(PricingStrategy {
            name,
            price,
            basis: PriceBasis::MarketMedian,
            market_position,
            competitive_advantage: market_position.competitive_advantage().to_string(),
            price_ratio: (price / median).round_dp(2),
            confidence: rule.confidence,
            expected_sale_speed: sale_speed(name),
            expected_final_price,
        })
    }

    /// Pick the strategy matching the seller's priority
    pub fn select<'a>(
        &self,
        strategies: &'a [PricingStrategy],
        priority: SellerPriority,
    ) -> Option<&'a PricingStrategy> {
        let preferred = priority.preferred_strategy();
        strategies.iter().find(|s| s.name == preferred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::statistics::summarize_prices;
    use rust_decimal_macros::dec;

    fn strategy(strategies: &[PricingStrategy], name: StrategyName) -> &PricingStrategy {
        strategies.iter().find(|s| s.name == name).unwrap()
    }

    #[test]
    fn test_strategies_from_median() {
        let stats = summarize_prices(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let strategies = PricingStrategyEngine::default().derive_strategies(&stats).unwrap();
        assert_eq!(strategies.len(), 4);

        let quick = strategy(&strategies, StrategyName::QuickSale);
        assert_eq!(quick.price, dec!(23.40));
        assert_eq!(quick.confidence, 0.9);
        assert_eq!(quick.market_position, MarketPosition::WellBelowMarket);
        assert_eq!(quick.competitive_advantage, "high_price_advantage");

        let competitive = strategy(&strategies, StrategyName::Competitive);
        assert_eq!(competitive.price, dec!(28.50));
        assert_eq!(competitive.market_position, MarketPosition::AtMarket);
        assert_eq!(competitive.price_ratio, dec!(0.95));

        let premium = strategy(&strategies, StrategyName::Premium);
        assert_eq!(premium.price, dec!(33.60));
        assert_eq!(premium.market_position, MarketPosition::AboveMarket);

        let auction = strategy(&strategies, StrategyName::AuctionStart);
        assert_eq!(auction.price, dec!(19.50));
        assert_eq!(auction.expected_final_price, Some(dec!(28.50)));
        assert_eq!(auction.expected_sale_speed, SaleSpeed::Variable);
    }

    #[test]
    fn test_no_market_data() {
        let strategies = PricingStrategyEngine::default()
            .derive_strategies(&PriceStatisticsResult::default())
            .unwrap();
        assert_eq!(strategies.len(), 4);
        for s in &strategies {
            assert_eq!(s.price, Decimal::ZERO);
            assert_eq!(s.basis, PriceBasis::NoMarketData);
            assert_eq!(s.market_position, MarketPosition::InsufficientMarketData);
            assert!(!s.has_market_data());
            assert_eq!(s.competitive_advantage, "unknown");
        }
    }

    #[test]
    fn test_market_position_bands() {
        let median = dec!(100);
        assert_eq!(classify_market_position(dec!(79.99), median), MarketPosition::WellBelowMarket);
        assert_eq!(classify_market_position(dec!(80), median), MarketPosition::BelowMarket);
        assert_eq!(classify_market_position(dec!(95), median), MarketPosition::AtMarket);
        assert_eq!(classify_market_position(dec!(104.99), median), MarketPosition::AtMarket);
        assert_eq!(classify_market_position(dec!(105), median), MarketPosition::AboveMarket);
        assert_eq!(classify_market_position(dec!(120), median), MarketPosition::WellAboveMarket);
        assert_eq!(
            classify_market_position(dec!(50), Decimal::ZERO),
            MarketPosition::InsufficientMarketData
        );
    }

    #[test]
    fn test_condition_adjustment() {
        assert_eq!(adjust_for_condition(dec!(100), ItemCondition::New), dec!(100));
        assert_eq!(adjust_for_condition(dec!(100), ItemCondition::LikeNew), dec!(90));
        assert_eq!(adjust_for_condition(dec!(28.50), ItemCondition::Good), dec!(19.95));
        assert_eq!(adjust_for_condition(dec!(100), ItemCondition::Poor), dec!(40));
    }

    #[test]
    fn test_select_by_priority() {
        let engine = PricingStrategyEngine::default();
        let strategies = engine.derive_strategies(&summarize_prices(&[50.0])).unwrap();
        assert_eq!(
            engine.select(&strategies, SellerPriority::MaxProfit).unwrap().name,
            StrategyName::Premium
        );
        assert_eq!(
            engine.select(&strategies, SellerPriority::Balanced).unwrap().name,
            StrategyName::Competitive
        );
        assert_eq!(
            engine.select(&strategies, SellerPriority::QuickSale).unwrap().price,
            dec!(39.00)
        );
    }

    #[test]
    fn test_policy_validation() {
        let mut policy = StrategyPolicy::default();
        policy.premium.confidence = 1.5;
        assert!(PricingStrategyEngine::new(policy).is_err());

        let mut policy = StrategyPolicy::default();
        policy.quick_sale.multiplier = dec!(0);
        assert!(PricingStrategyEngine::new(policy).is_err());

        let mut policy = StrategyPolicy::default();
        policy.premium.multiplier = Decimal::MAX;
        assert!(PricingStrategyEngine::new(policy).is_err());
    }

    #[test]
    fn test_overflowing_price_is_an_error() {
        let stats = PriceStatisticsResult {
            min: Decimal::MAX,
            max: Decimal::MAX,
            mean: Decimal::MAX,
            median: Decimal::MAX,
            std_dev: Decimal::ZERO,
            sample_count: 1,
        };
        let err = PricingStrategyEngine::default()
            .derive_strategies(&stats)
            .unwrap_err();
        assert!(matches!(err, EngineError::Arithmetic(_)));
    }
}
