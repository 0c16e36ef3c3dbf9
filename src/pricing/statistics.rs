//! Price statistics over noisy market observations
//!
//! Market search results are sparse and messy: zero prices, missing values
//! and obvious junk are common. Everything here degrades to a zeroed result
//! instead of failing.

use std::collections::BTreeMap;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};

use crate::common::types::{round_cents, PlatformId};

/// A single market data point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub price: Decimal,
    #[serde(default)]
    pub platform: Option<PlatformId>,
    /// true for a completed sale, false for an active listing
    #[serde(default)]
    pub sold: Option<bool>,
}

impl PriceObservation {
    pub fn new(price: Decimal) -> Self {
        Self {
            price,
            platform: None,
            sold: None,
        }
    }

    pub fn on(mut self, platform: PlatformId) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn sold(mut self, sold: bool) -> Self {
        self.sold = Some(sold);
        self
    }

    fn is_usable(&self) -> bool {
        is_usable_price(self.price)
    }
}

fn is_usable_price(price: Decimal) -> bool {
    price > Decimal::ZERO
}

/// Summary statistics for a set of prices
///
/// All fields are zero when `sample_count` is zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceStatisticsResult {
    pub min: Decimal,
    pub max: Decimal,
    pub mean: Decimal,
    pub median: Decimal,
    /// Population standard deviation
    pub std_dev: Decimal,
    pub sample_count: usize,
}

impl PriceStatisticsResult {
    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }

    pub fn spread(&self) -> Decimal {
        self.max - self.min
    }
}

/// Summarize observations, discarding non-positive prices
pub fn summarize(observations: &[PriceObservation]) -> PriceStatisticsResult {
    summarize_decimals(
        observations
            .iter()
            .filter(|o| o.is_usable())
            .map(|o| o.price),
    )
}

/// Summarize raw float prices, discarding non-positive and non-finite values
pub fn summarize_prices(prices: &[f64]) -> PriceStatisticsResult {
    summarize_decimals(
        prices
            .iter()
            .filter(|p| p.is_finite())
            .filter_map(|p| Decimal::from_f64(*p)),
    )
}

/// Summarize decimal prices
///
/// The median is the true statistical median: for an even count it is the
/// mean of the two middle values. Mean, median and standard deviation are
/// rounded to cents.
pub fn summarize_decimals(prices: impl IntoIterator<Item = Decimal>) -> PriceStatisticsResult {
    let mut sorted: Vec<Decimal> = prices.into_iter().filter(|p| is_usable_price(*p)).collect();
    if sorted.is_empty() {
        return PriceStatisticsResult::default();
    }
    sorted.sort();

    let count = sorted.len();
    let mean = mean_of(&sorted);

    let mid = count / 2;
    let median = if count % 2 == 0 {
        let (low, high) = (sorted[mid - 1], sorted[mid]);
        low + (high - low) / Decimal::TWO
    } else {
        sorted[mid]
    };

    PriceStatisticsResult {
        min: sorted[0],
        max: sorted[count - 1],
        mean: round_cents(mean),
        median: round_cents(median),
        std_dev: round_cents(std_dev_of(&sorted, mean)),
        sample_count: count,
    }
}

fn mean_of(prices: &[Decimal]) -> Decimal {
    let n = Decimal::from(prices.len());
    match prices.iter().try_fold(Decimal::ZERO, |acc, p| acc.checked_add(*p)) {
        Some(sum) => sum / n,
        // Running mean never leaves the range of the inputs
        None => prices.iter().enumerate().fold(Decimal::ZERO, |mean, (i, p)| {
            let k = Decimal::from(i + 1);
            mean.checked_add((*p - mean) / k).unwrap_or(*p)
        }),
    }
}

/// Population standard deviation, in f64 when the squared deviations overflow
fn std_dev_of(prices: &[Decimal], mean: Decimal) -> Decimal {
    let n = Decimal::from(prices.len());
    let squares = prices.iter().try_fold(Decimal::ZERO, |acc, p| {
        let deviation = *p - mean;
        deviation
            .checked_mul(deviation)
            .and_then(|square| acc.checked_add(square))
    });
    if let Some(total) = squares {
        return (total / n).sqrt().unwrap_or(Decimal::ZERO);
    }

    let mean = mean.to_f64().unwrap_or(0.0);
    let variance = prices
        .iter()
        .filter_map(|p| p.to_f64())
        .map(|p| (p - mean) * (p - mean))
        .sum::<f64>()
        / prices.len() as f64;
    Decimal::from_f64(variance.sqrt()).unwrap_or(Decimal::ZERO)
}

/// Statistics per source platform; observations without a platform are left out
pub fn summarize_by_platform(
    observations: &[PriceObservation],
) -> BTreeMap<PlatformId, PriceStatisticsResult> {
    let mut grouped: BTreeMap<PlatformId, Vec<Decimal>> = BTreeMap::new();
    for observation in observations {
        if let Some(platform) = observation.platform {
            grouped.entry(platform).or_default().push(observation.price);
        }
    }
    grouped
        .into_iter()
        .map(|(platform, prices)| (platform, summarize_decimals(prices)))
        .collect()
}

/// Demand inferred from the share of listings that sold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandLevel {
    High,
    Medium,
    Low,
    Unknown,
}

/// Listing activity for one platform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketActivity {
    pub total_listings: u32,
    pub sold_listings: u32,
}

impl MarketActivity {
    pub fn new(total_listings: u32, sold_listings: u32) -> Self {
        Self {
            total_listings,
            sold_listings,
        }
    }

    /// Fraction of listings that sold, zero without listings
    pub fn sold_ratio(&self) -> f64 {
        if self.total_listings == 0 {
            0.0
        } else {
            f64::from(self.sold_listings) / f64::from(self.total_listings)
        }
    }

    pub fn demand(&self) -> DemandLevel {
        if self.total_listings == 0 {
            return DemandLevel::Unknown;
        }
        let ratio = self.sold_ratio();
        if ratio > 0.7 {
            DemandLevel::High
        } else if ratio > 0.4 {
            DemandLevel::Medium
        } else {
            DemandLevel::Low
        }
    }
}

/// Count listings and sales per platform
///
/// Every observation counts as a listing, priced or not.
pub fn market_activity_by_platform(
    observations: &[PriceObservation],
) -> BTreeMap<PlatformId, MarketActivity> {
    let mut activity: BTreeMap<PlatformId, MarketActivity> = BTreeMap::new();
    for observation in observations {
        if let Some(platform) = observation.platform {
            let entry = activity.entry(platform).or_default();
            entry.total_listings = entry.total_listings.saturating_add(1);
            if observation.sold == Some(true) {
                entry.sold_listings = entry.sold_listings.saturating_add(1);
            }
        }
    }
    activity
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_odd_count() {
        let stats = summarize_prices(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        assert_eq!(stats.sample_count, 5);
        assert_eq!(stats.min, dec!(10));
        assert_eq!(stats.max, dec!(50));
        assert_eq!(stats.median, dec!(30));
        assert_eq!(stats.mean, dec!(30));
        assert_eq!(stats.spread(), dec!(40));
        // sqrt(200)
        assert_eq!(stats.std_dev, dec!(14.14));
    }

    #[test]
    fn test_even_count_averages_middle_values() {
        let stats = summarize_prices(&[40.0, 10.0, 30.0, 20.0]);
        assert_eq!(stats.median, dec!(25));
        assert_eq!(stats.mean, dec!(25));
    }

    #[test]
    fn test_noise_is_filtered() {
        let stats = summarize_prices(&[0.0, -5.0, f64::NAN, f64::INFINITY, 12.5]);
        assert_eq!(stats.sample_count, 1);
        assert_eq!(stats.min, dec!(12.5));
        assert_eq!(stats.median, dec!(12.5));
        assert_eq!(stats.max, dec!(12.5));
        assert_eq!(stats.std_dev, Decimal::ZERO);
    }

    #[test]
    fn test_median_rounded_to_cents() {
        let stats = summarize_prices(&[19.99, 0.1]);
        assert_eq!(stats.median, dec!(10.05));
        assert_eq!(stats.mean, dec!(10.05));
        assert_eq!(stats.min, dec!(0.1));

        let stats = summarize_prices(&[0.01, 0.02]);
        assert_eq!(stats.median, dec!(0.02));
    }

    #[test]
    fn test_high_prices_are_kept() {
        let stats = summarize_prices(&[2.0e9]);
        assert_eq!(stats.sample_count, 1);
        assert_eq!(stats.median, dec!(2000000000));

        let stats = summarize_decimals([Decimal::MAX, Decimal::MAX, Decimal::MAX]);
        assert_eq!(stats.sample_count, 3);
        assert_eq!(stats.mean, Decimal::MAX);
        assert_eq!(stats.median, Decimal::MAX);
        assert_eq!(stats.std_dev, Decimal::ZERO);

        let stats = summarize_decimals([Decimal::ONE, Decimal::MAX]);
        assert_eq!(stats.sample_count, 2);
        assert_eq!(stats.median, stats.mean);
        assert!(stats.min <= stats.median && stats.median <= stats.max);
        assert!(stats.std_dev > Decimal::ZERO);
    }

    #[test]
    fn test_empty_input() {
        let stats = summarize(&[]);
        assert!(stats.is_empty());
        assert_eq!(stats, PriceStatisticsResult::default());

        let only_noise = summarize_prices(&[0.0, -1.0]);
        assert_eq!(only_noise.sample_count, 0);
        assert_eq!(only_noise.median, Decimal::ZERO);
    }

    #[test]
    fn test_min_median_max_ordering() {
        let samples: [&[f64]; 4] = [
            &[3.0],
            &[9.99, 1.0],
            &[5.0, 5.0, 5.0, 100.0],
            &[0.01, 250.0, 19.99, 19.99, 7.5, 1000.0, 42.0],
        ];
        for prices in samples {
            let stats = summarize_prices(prices);
            assert!(stats.min <= stats.median);
            assert!(stats.median <= stats.max);
        }
    }

    #[test]
    fn test_grouping_by_platform() {
        let observations = vec![
            PriceObservation::new(dec!(20)).on(PlatformId::Ebay).sold(true),
            PriceObservation::new(dec!(30)).on(PlatformId::Ebay).sold(false),
            PriceObservation::new(dec!(0)).on(PlatformId::Ebay).sold(true),
            PriceObservation::new(dec!(25)).on(PlatformId::Mercari),
            PriceObservation::new(dec!(99)),
        ];

        let stats = summarize_by_platform(&observations);
        assert_eq!(stats[&PlatformId::Ebay].sample_count, 2);
        assert_eq!(stats[&PlatformId::Ebay].median, dec!(25));
        assert_eq!(stats[&PlatformId::Mercari].median, dec!(25));
        assert!(!stats.contains_key(&PlatformId::Amazon));

        let activity = market_activity_by_platform(&observations);
        assert_eq!(activity[&PlatformId::Ebay], MarketActivity::new(3, 2));
        assert_eq!(activity[&PlatformId::Mercari], MarketActivity::new(1, 0));

        assert_eq!(summarize(&observations).sample_count, 4);
    }

    #[test]
    fn test_demand_levels() {
        assert_eq!(MarketActivity::new(0, 0).demand(), DemandLevel::Unknown);
        assert_eq!(MarketActivity::new(10, 8).demand(), DemandLevel::High);
        assert_eq!(MarketActivity::new(10, 5).demand(), DemandLevel::Medium);
        assert_eq!(MarketActivity::new(10, 4).demand(), DemandLevel::Low);
    }
}
