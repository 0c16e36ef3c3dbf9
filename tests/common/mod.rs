//! Common test utilities and fixtures
#![allow(dead_code)]

use resale_engine::common::types::PlatformId;
use resale_engine::pricing::{FeeModel, FeeOptions, PriceObservation};
use resale_engine::FeeBreakdown;
use resale_engine::FeeCalculator;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Fee breakdown from the built-in table with default options
pub fn builtin_fees(
    platform: PlatformId,
    sale_price: Decimal,
    shipping_cost: Decimal,
    item_cost: Decimal,
) -> FeeBreakdown {
    FeeModel::builtin()
        .compute_fees(platform, sale_price, shipping_cost, item_cost, &FeeOptions::default())
        .expect("built-in fee computation failed")
}

/// A small sold/active mix of sneaker listings across three platforms
pub fn sneaker_observations() -> Vec<PriceObservation> {
    let mut observations = Vec::new();
    for (i, price) in [dec!(85), dec!(92), dec!(99), dec!(104), dec!(110), dec!(120)]
        .into_iter()
        .enumerate()
    {
        observations.push(PriceObservation::new(price).on(PlatformId::Ebay).sold(i % 2 == 0));
    }
    for price in [dec!(90), dec!(95), dec!(100)] {
        observations.push(PriceObservation::new(price).on(PlatformId::Mercari).sold(true));
    }
    observations.push(PriceObservation::new(dec!(0)).on(PlatformId::Poshmark));
    observations.push(PriceObservation::new(dec!(130)).on(PlatformId::Poshmark).sold(false));
    observations
}

/// Sample analysis request documents
pub mod requests {
    /// Full request with aliases the parser must accept
    pub const SNEAKERS: &str = r#"{
        "observations": [
            {"price": "80.00", "platform": "ebay", "sold": true},
            {"price": "100.00", "platform": "ebay", "sold": true},
            {"price": 120, "platform": "mercari", "sold": false},
            {"price": "0", "platform": "mercari"},
            {"price": "95.50"}
        ],
        "category": "Fashion",
        "condition": "pre-owned",
        "item_cost": "25.00",
        "shipping_cost": "8.00",
        "priority": "max_profit",
        "options": {"payment_method": "paypal", "unknown_toggle": true},
        "platforms": ["ebay", "mercari", "depop", "craigslist"]
    }"#;

    /// Request with nothing but junk prices
    pub const NO_MARKET: &str = r#"{
        "observations": [{"price": "0"}, {"price": "-4"}],
        "item_cost": "10"
    }"#;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sneaker_observations() {
        let observations = sneaker_observations();
        assert_eq!(observations.len(), 11);
        assert!(observations.iter().any(|o| o.price.is_zero()));
    }

    #[test]
    fn test_builtin_fees_fixture() {
        let breakdown = builtin_fees(PlatformId::Ebay, dec!(100), dec!(0), dec!(20));
        assert_eq!(breakdown.net_profit, dec!(63.55));
    }
}
