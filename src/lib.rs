//! Resale Engine Library
//!
//! Marketplace fee schedules, net-profit comparison and pricing strategies
//! for reselling an identified item.

pub mod common;
pub mod config;
pub mod pricing;

// Re-export commonly used types
pub use common::errors::{EngineError, Result};
pub use common::types::{ItemCondition, PlatformId};
pub use config::types::AppConfig;

pub use pricing::{
    AnalysisReport, AnalysisRequest, BoxedFeeCalculator, ComparisonRequest, FeeBreakdown,
    FeeCalculator, FeeModel, FeeOptions, FeeScheduleSet, PlatformComparator,
    PlatformRecommendation, PriceObservation, PriceStatisticsResult, PricingStrategy,
    PricingStrategyEngine, ResaleEngine, SellerPriority, SuitabilityScorer,
};
