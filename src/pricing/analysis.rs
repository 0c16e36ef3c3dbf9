//! End-to-end analysis: market observations in, listing recommendation out

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::common::errors::{EngineError, Result};
use crate::common::types::{validate_amount, ItemCondition, PlatformId};
use crate::config::types::AppConfig;
use crate::pricing::comparator::{ComparisonRequest, PlatformComparator, RecommendationSettings};
use crate::pricing::fees::{FeeModel, FeeOptions};
use crate::pricing::statistics::{
    market_activity_by_platform, summarize, summarize_by_platform, PriceObservation,
    PriceStatisticsResult,
};
use crate::pricing::strategy::{adjust_for_condition, PricingStrategyEngine};
use crate::pricing::suitability::SuitabilityScorer;
use crate::pricing::types::{PlatformRecommendation, PricingStrategy, SellerPriority};

/// Everything known about an item once it has been identified and searched for
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisRequest {
    pub observations: Vec<PriceObservation>,
    pub category: Option<String>,
    /// Free-form condition label; unrecognised labels are treated as good
    pub condition: Option<String>,
    pub item_cost: Decimal,
    pub shipping_cost: Decimal,
    pub priority: SellerPriority,
    pub options: FeeOptions,
    pub platforms: Option<Vec<String>>,
}

impl AnalysisRequest {
    pub fn new(observations: Vec<PriceObservation>, item_cost: Decimal) -> Self {
        Self {
            observations,
            item_cost,
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn with_shipping(mut self, shipping_cost: Decimal) -> Self {
        self.shipping_cost = shipping_cost;
        self
    }

    pub fn with_priority(mut self, priority: SellerPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_platforms<I, S>(mut self, platforms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.platforms = Some(platforms.into_iter().map(Into::into).collect());
        self
    }

    fn resolved_condition(&self) -> ItemCondition {
        match self.condition.as_deref() {
            None => ItemCondition::default(),
            Some(label) => label.parse().unwrap_or_else(|_| {
                warn!(condition = %label, "unrecognised condition, assuming good");
                ItemCondition::default()
            }),
        }
    }
}

/// Outcome of an analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub statistics: PriceStatisticsResult,
    pub platform_statistics: BTreeMap<PlatformId, PriceStatisticsResult>,
    pub strategies: Vec<PricingStrategy>,
    pub chosen_strategy: PricingStrategy,
    pub condition: ItemCondition,
    /// Chosen strategy price scaled by condition
    pub adjusted_price: Decimal,
    /// None when there were no usable prices to price the item from
    pub recommendation: Option<PlatformRecommendation>,
}

impl AnalysisReport {
    pub fn has_market_data(&self) -> bool {
        !self.statistics.is_empty()
    }
}

/// Fee model, scorer and strategy engine loaded from one configuration
#[derive(Debug, Clone)]
pub struct ResaleEngine {
    fees: FeeModel,
    scorer: SuitabilityScorer,
    strategies: PricingStrategyEngine,
    settings: RecommendationSettings,
}

impl ResaleEngine {
    pub fn new(
        fees: FeeModel,
        scorer: SuitabilityScorer,
        strategies: PricingStrategyEngine,
        settings: RecommendationSettings,
    ) -> Self {
        Self {
            fees,
            scorer,
            strategies,
            settings,
        }
    }

    /// Validate configuration tables and build the engine
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let fees = FeeModel::new(&config.fees)?;
        let scorer = SuitabilityScorer::new(&config.profiles)?;
        let strategies = PricingStrategyEngine::new(config.pricing.clone())?;
        info!(
            fee_version = %fees.version(),
            platforms = fees.schedule_count(),
            "resale engine configured"
        );
        Ok(Self::new(fees, scorer, strategies, config.recommendation.clone()))
    }

    pub fn builtin() -> Self {
        Self::new(
            FeeModel::builtin(),
            SuitabilityScorer::builtin(),
            PricingStrategyEngine::default(),
            RecommendationSettings::default(),
        )
    }

    pub fn fees(&self) -> &FeeModel {
        &self.fees
    }

    pub fn strategies(&self) -> &PricingStrategyEngine {
        &self.strategies
    }

    pub fn comparator(&self) -> PlatformComparator<'_> {
        PlatformComparator::new(&self.fees, &self.scorer).with_settings(self.settings.clone())
    }

    /// Statistics, strategies, condition adjustment, then recommendation
    pub fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisReport> {
        validate_amount("item_cost", request.item_cost)?;
        validate_amount("shipping_cost", request.shipping_cost)?;
        request.options.validate()?;

        let statistics = summarize(&request.observations);
        let platform_statistics = summarize_by_platform(&request.observations);
        let strategies = self.strategies.derive_strategies(&statistics)?;
        let chosen_strategy = self
            .strategies
            .select(&strategies, request.priority)
            .cloned()
            .ok_or_else(|| {
                EngineError::Configuration(format!(
                    "no strategy for priority {:?}",
                    request.priority
                ))
            })?;

        let condition = request.resolved_condition();
        let adjusted_price = adjust_for_condition(chosen_strategy.price, condition);
        debug!(
            samples = statistics.sample_count,
            median = %statistics.median,
            strategy = %chosen_strategy.name,
            %adjusted_price,
            "priced item"
        );

        let recommendation = if statistics.is_empty() {
            warn!("no usable market prices, skipping platform comparison");
            None
        } else {
            let mut options = request.options.clone();
            if let Some(category) = &request.category {
                options.category = Some(category.clone());
            }
            let mut comparison =
                ComparisonRequest::new(adjusted_price, request.item_cost, request.shipping_cost)
                    .with_options(options)
                    .with_condition(condition)
                    .with_market_activity(market_activity_by_platform(&request.observations));
            comparison.platforms = request.platforms.clone();
            Some(self.comparator().recommend(&comparison)?)
        };

        Ok(AnalysisReport {
            statistics,
            platform_statistics,
            strategies,
            chosen_strategy,
            condition,
            adjusted_price,
            recommendation,
        })
    }
}

impl Default for ResaleEngine {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::types::{PriceBasis, StrategyName};
    use rust_decimal_macros::dec;

    fn observations(prices: &[Decimal]) -> Vec<PriceObservation> {
        prices.iter().map(|p| PriceObservation::new(*p)).collect()
    }

    #[test]
    fn test_balanced_good_condition() {
        let engine = ResaleEngine::builtin();
        let request = AnalysisRequest::new(
            observations(&[dec!(10), dec!(20), dec!(30), dec!(40), dec!(50)]),
            dec!(5),
        )
        .with_condition("used");

        let report = engine.analyze(&request).unwrap();
        assert_eq!(report.statistics.median, dec!(30));
        assert_eq!(report.chosen_strategy.name, StrategyName::Competitive);
        assert_eq!(report.condition, ItemCondition::Good);
        // 28.50 competitive price at 70%
        assert_eq!(report.adjusted_price, dec!(19.95));

        let recommendation = report.recommendation.unwrap();
        assert_eq!(recommendation.ranked.len(), PlatformId::ALL.len());
        for entry in &recommendation.ranked {
            assert_eq!(entry.breakdown.sale_price, dec!(19.95));
        }
    }

    #[test]
    fn test_no_market_data_skips_comparison() {
        let engine = ResaleEngine::builtin();
        let request = AnalysisRequest::new(observations(&[dec!(0), dec!(-3)]), dec!(5));

        let report = engine.analyze(&request).unwrap();
        assert!(!report.has_market_data());
        assert_eq!(report.chosen_strategy.basis, PriceBasis::NoMarketData);
        assert_eq!(report.adjusted_price, Decimal::ZERO);
        assert!(report.recommendation.is_none());
    }

    #[test]
    fn test_unknown_condition_defaults_to_good() {
        let request = AnalysisRequest::default().with_condition("slightly scuffed");
        assert_eq!(request.resolved_condition(), ItemCondition::Good);
        let request = AnalysisRequest::default().with_condition("Like New");
        assert_eq!(request.resolved_condition(), ItemCondition::LikeNew);
    }

    #[test]
    fn test_market_activity_feeds_suitability() {
        let engine = ResaleEngine::builtin();
        let mut observed = Vec::new();
        for i in 0..60 {
            observed.push(
                PriceObservation::new(Decimal::from(20 + i % 10))
                    .on(PlatformId::Ebay)
                    .sold(i % 4 != 0),
            );
        }
        let request = AnalysisRequest::new(observed, dec!(4))
            .with_priority(SellerPriority::MaxProfit)
            .with_condition("new")
            .with_platforms(["ebay", "mercari"]);

        let report = engine.analyze(&request).unwrap();
        assert_eq!(report.chosen_strategy.name, StrategyName::Premium);
        assert_eq!(report.platform_statistics[&PlatformId::Ebay].sample_count, 60);

        let recommendation = report.recommendation.unwrap();
        let ebay = recommendation
            .ranked
            .iter()
            .find(|e| e.breakdown.platform == PlatformId::Ebay)
            .unwrap();
        assert_eq!(ebay.suitability.market_presence, 9.0);
        let mercari = recommendation
            .ranked
            .iter()
            .find(|e| e.breakdown.platform == PlatformId::Mercari)
            .unwrap();
        assert_eq!(mercari.suitability.market_presence, 5.0);
    }

    #[test]
    fn test_negative_cost_rejected() {
        let engine = ResaleEngine::builtin();
        let request = AnalysisRequest::new(observations(&[dec!(10)]), dec!(-1));
        assert!(matches!(
            engine.analyze(&request),
            Err(EngineError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_negative_storage_rejected_without_market_data() {
        let engine = ResaleEngine::builtin();
        let mut request = AnalysisRequest::new(Vec::new(), dec!(1));
        request.options = FeeOptions {
            fba: true,
            storage_months: Some(dec!(-1)),
            ..FeeOptions::default()
        };
        assert!(matches!(
            engine.analyze(&request),
            Err(EngineError::InvalidInput { .. })
        ));
    }
}
