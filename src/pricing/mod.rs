//! Pricing module for fee, profit and listing-price decisions
//!
//! Everything here is pure, synchronous computation over data that has
//! already been fetched. Configuration is read-only once loaded.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PRICING (observations)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  PriceObservation[]                                         │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  statistics::summarize → min / median / mean / max          │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  PricingStrategyEngine → quick_sale, competitive,           │
//! │                          premium, auction_start             │
//! │       │                                                     │
//! │       ▼ (seller priority, condition)                        │
//! │  candidate sale price                                       │
//! └─────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    COMPARISON (per platform)                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  PlatformComparator                                         │
//! │    - FeeCalculator::compute_fees for each platform          │
//! │    - SuitabilityScorer::score (advisory, tie-break only)    │
//! │    - rank by net profit → PlatformRecommendation            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`FeeModel`]: Versioned fee schedules, implements [`FeeCalculator`]
//! - [`PricingStrategyEngine`]: Candidate prices from market statistics
//! - [`PlatformComparator`]: Ranking and recommendation across platforms
//! - [`SuitabilityScorer`]: 0-10 platform fit score
//! - [`ResaleEngine`]: The whole pipeline behind one call
//!
//! # Example
//!
//! ```
//! use resale_engine::pricing::{ComparisonRequest, FeeModel, PlatformComparator, SuitabilityScorer};
//! use rust_decimal_macros::dec;
//!
//! let fees = FeeModel::builtin();
//! let scorer = SuitabilityScorer::builtin();
//! let comparator = PlatformComparator::new(&fees, &scorer);
//!
//! let request = ComparisonRequest::new(dec!(50), dec!(10), dec!(5));
//! let recommendation = comparator.recommend(&request).unwrap();
//! assert!(recommendation.top_pick.is_some());
//! ```

pub mod analysis;
pub mod comparator;
pub mod fees;
pub mod statistics;
pub mod strategy;
pub mod suitability;
pub mod traits;
pub mod types;

pub use analysis::{AnalysisReport, AnalysisRequest, ResaleEngine};
pub use comparator::{ComparisonRequest, PlatformComparator, RecommendationSettings};
pub use fees::{FeeModel, FeeOptions, FeeSchedule, FeeScheduleSet, FlatTier, PaymentMethod};
pub use statistics::{
    market_activity_by_platform, summarize, summarize_by_platform, summarize_prices,
    DemandLevel, MarketActivity, PriceObservation, PriceStatisticsResult,
};
pub use strategy::{
    adjust_for_condition, classify_market_position, PricingStrategyEngine, StrategyPolicy,
    StrategyRule,
};
pub use suitability::{EaseOfUse, PlatformProfile, SuitabilityInput, SuitabilityScorer};
pub use traits::{BoxedFeeCalculator, FeeCalculator};
pub use types::{
    FeeBreakdown, FeeLineItem, MarketPosition, PlatformComparison, PlatformFailure,
    PlatformRecommendation, PriceBasis, PricingStrategy, RankedPlatform, SaleSpeed,
    SellerPriority, StrategyName, SuitabilityLabel, SuitabilityScore,
};
