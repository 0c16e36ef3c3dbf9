//! Cross-platform fee comparison and recommendation
//!
//! One bad platform never sinks a comparison: unknown platforms are skipped
//! and per-platform failures are annotated. Only invalid direct inputs
//! (negative amounts or options) fail the whole call.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::common::errors::Result;
use crate::common::types::{round_cents, validate_amount, ItemCondition, PlatformId};
use crate::pricing::fees::FeeOptions;
use crate::pricing::statistics::MarketActivity;
use crate::pricing::suitability::{SuitabilityInput, SuitabilityScorer};
use crate::pricing::traits::FeeCalculator;
use crate::pricing::types::{
    PlatformComparison, PlatformFailure, PlatformRecommendation, RankedPlatform,
};

/// Recommendation tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationSettings {
    /// Entries listed after the top pick
    pub max_alternatives: usize,
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self { max_alternatives: 2 }
    }
}

/// One sale to evaluate across platforms
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonRequest {
    pub sale_price: Decimal,
    pub item_cost: Decimal,
    pub shipping_cost: Decimal,
    /// Platform names to evaluate; None means every configured platform
    pub platforms: Option<Vec<String>>,
    pub options: FeeOptions,
    pub condition: Option<ItemCondition>,
    pub market: BTreeMap<PlatformId, MarketActivity>,
}

impl ComparisonRequest {
    pub fn new(sale_price: Decimal, item_cost: Decimal, shipping_cost: Decimal) -> Self {
        Self {
            sale_price,
            item_cost,
            shipping_cost,
            ..Self::default()
        }
    }

    pub fn with_platforms<I, S>(mut self, platforms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.platforms = Some(platforms.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_options(mut self, options: FeeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.options.category = Some(category.into());
        self
    }

    pub fn with_condition(mut self, condition: ItemCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_market(mut self, platform: PlatformId, activity: MarketActivity) -> Self {
        self.market.insert(platform, activity);
        self
    }

    pub fn with_market_activity(mut self, market: BTreeMap<PlatformId, MarketActivity>) -> Self {
        self.market = market;
        self
    }

    fn validate(&self) -> Result<()> {
        validate_amount("sale_price", self.sale_price)?;
        validate_amount("item_cost", self.item_cost)?;
        validate_amount("shipping_cost", self.shipping_cost)?;
        self.options.validate()
    }
}

/// Ranks platforms for a sale
///
/// Holds only shared references to immutable configuration, so a single
/// comparator can serve concurrent comparisons.
pub struct PlatformComparator<'a> {
    fees: &'a dyn FeeCalculator,
    scorer: &'a SuitabilityScorer,
    settings: RecommendationSettings,
}

impl<'a> PlatformComparator<'a> {
    pub fn new(fees: &'a dyn FeeCalculator, scorer: &'a SuitabilityScorer) -> Self {
        Self {
            fees,
            scorer,
            settings: RecommendationSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: RecommendationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Compute fees on each requested platform and rank by net profit
    pub fn compare(&self, request: &ComparisonRequest) -> Result<PlatformComparison> {
        request.validate()?;

        let mut skipped = Vec::new();
        let mut platforms = Vec::new();
        match &request.platforms {
            None => platforms = self.fees.supported_platforms(),
            Some(names) => {
                for name in names {
                    match self.fees.resolve_platform(name) {
                        Ok(platform) if !platforms.contains(&platform) => platforms.push(platform),
                        Ok(_) => {}
                        Err(e) => {
                            debug!(platform = %name, error = %e, "skipping platform");
                            skipped.push(name.clone());
                        }
                    }
                }
            }
        }

        let mut ranked = Vec::with_capacity(platforms.len());
        let mut errors = Vec::new();
        for platform in platforms {
            let result = self.fees.compute_fees(
                platform,
                request.sale_price,
                request.shipping_cost,
                request.item_cost,
                &request.options,
            );
            match result {
                Ok(breakdown) => {
                    let suitability = self.scorer.score(
                        platform,
                        &SuitabilityInput {
                            category: request.options.category.clone(),
                            condition: request.condition,
                            market: request.market.get(&platform).copied(),
                            profit_margin_percent: breakdown.profit_margin_percent,
                        },
                    );
                    ranked.push(RankedPlatform {
                        rank: 0,
                        breakdown,
                        suitability,
                    });
                }
                Err(e) if e.is_invalid_platform() => {
                    debug!(platform = %platform, error = %e, "skipping platform");
                    skipped.push(platform.to_string());
                }
                Err(e) => {
                    warn!(platform = %platform, error = %e, "fee computation failed");
                    errors.push(PlatformFailure {
                        platform,
                        error: e.to_string(),
                    });
                }
            }
        }

        ranked.sort_by(rank_order);
        for (i, entry) in ranked.iter_mut().enumerate() {
            entry.rank = i + 1;
        }

        debug!(
            evaluated = ranked.len(),
            skipped = skipped.len(),
            failed = errors.len(),
            "platform comparison complete"
        );

        Ok(PlatformComparison {
            ranked,
            skipped,
            errors,
        })
    }

    /// Compare, then pick where to list
    pub fn recommend(&self, request: &ComparisonRequest) -> Result<PlatformRecommendation> {
        let comparison = self.compare(request)?;
        Ok(self.build_recommendation(comparison))
    }

    /// Compare many independent requests in parallel
    pub fn compare_batch(&self, requests: &[ComparisonRequest]) -> Vec<Result<PlatformComparison>> {
        requests.par_iter().map(|r| self.compare(r)).collect()
    }

    fn build_recommendation(&self, comparison: PlatformComparison) -> PlatformRecommendation {
        let PlatformComparison {
            ranked,
            skipped,
            errors,
        } = comparison;

        // Best entry that is not flagged poor, else the best entry outright
        let top_index = ranked
            .iter()
            .position(|entry| !entry.suitability.is_poor())
            .or_else(|| (!ranked.is_empty()).then_some(0));

        let (top_pick, alternatives, profit_advantage) = match top_index {
            None => (None, Vec::new(), Decimal::ZERO),
            Some(index) => {
                let top = ranked[index].clone();
                let others: Vec<&RankedPlatform> = ranked
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != index)
                    .map(|(_, entry)| entry)
                    .collect();
                let advantage = others
                    .first()
                    .map(|next| top.breakdown.net_profit - next.breakdown.net_profit)
                    .unwrap_or(Decimal::ZERO);
                let alternatives = others
                    .into_iter()
                    .take(self.settings.max_alternatives)
                    .cloned()
                    .collect();
                (Some(top), alternatives, advantage)
            }
        };

        let confidence = ranking_confidence(&ranked);
        if let Some(top) = &top_pick {
            debug!(
                platform = %top.breakdown.platform,
                net_profit = %top.breakdown.net_profit,
                %profit_advantage,
                confidence,
                "recommended platform"
            );
        }

        PlatformRecommendation {
            top_pick,
            alternatives,
            profit_advantage,
            confidence,
            ranked,
            skipped,
            errors,
        }
    }
}

/// Net profit (to the cent) descending, then suitability, then platform order
fn rank_order(a: &RankedPlatform, b: &RankedPlatform) -> Ordering {
    round_cents(b.breakdown.net_profit)
        .cmp(&round_cents(a.breakdown.net_profit))
        .then_with(|| {
            b.suitability
                .overall
                .partial_cmp(&a.suitability.overall)
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| a.breakdown.platform.cmp(&b.breakdown.platform))
}

/// Confidence in the ranking from how decisive the suitability scores are
fn ranking_confidence(ranked: &[RankedPlatform]) -> f64 {
    let scores: Vec<f64> = ranked.iter().map(|e| e.suitability.overall).collect();
    if scores.is_empty() {
        return 0.0;
    }
    let max = scores.iter().copied().fold(f64::MIN, f64::max);
    let min = scores.iter().copied().fold(f64::MAX, f64::min);

    if max >= 8.0 && max - min >= 2.0 {
        0.9
    } else if max >= 7.0 {
        0.8
    } else if max >= 6.0 {
        0.7
    } else {
        0.6
    }
}
