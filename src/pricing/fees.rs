use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::common::errors::{EngineError, Result};
use crate::common::types::{normalize_label, round_cents, validate_amount, PlatformId};
use crate::pricing::traits::FeeCalculator;
use crate::pricing::types::{FeeBreakdown, FeeLineItem};

/// Flat fee charged instead of the percentage below a price threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatTier {
    /// Sales strictly below this price pay `flat_fee`
    pub threshold: Decimal,
    pub flat_fee: Decimal,
}

/// Fee configuration for a platform
///
/// Rates are fractions (0.029 = 2.9 %), fixed amounts are USD. Fields a
/// platform's formula does not use stay at zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeSchedule {
    /// Final value / referral / transaction / selling / commission rate
    pub selling_rate: Decimal,
    /// Category-specific replacements for `selling_rate`
    pub category_rates: BTreeMap<String, Decimal>,
    pub payment_rate: Decimal,
    pub payment_fixed: Decimal,
    pub listing_fee: Decimal,
    pub flat_tier: Option<FlatTier>,
    pub international_rate: Decimal,
    /// Monthly store plans, reported but never deducted from a sale
    pub store_subscriptions: BTreeMap<String, Decimal>,
    pub fulfillment_fee: Decimal,
    /// Per cubic foot per month
    pub storage_fee: Decimal,
    pub authentication_fee: Decimal,
    /// Paid by the buyer; metadata only
    pub buyer_fee_rate: Decimal,
    pub buyer_fee_fixed: Decimal,
}

impl FeeSchedule {
    /// eBay fee structure
    /// - 13.25% final value fee on item + shipping (10% for motors)
    /// - 2.9% + $0.30 payment processing
    /// - 1.5% extra on international sales
    pub fn ebay() -> Self {
        Self {
            selling_rate: dec!(0.1325),
            category_rates: rates(&[("motors", dec!(0.10))]),
            payment_rate: dec!(0.029),
            payment_fixed: dec!(0.30),
            international_rate: dec!(0.015),
            store_subscriptions: rates(&[
                ("basic", dec!(7.95)),
                ("premium", dec!(27.95)),
                ("anchor", dec!(349.95)),
            ]),
            ..Self::default()
        }
    }

    /// Amazon fee structure
    /// - 15% referral fee by default, category table otherwise
    /// - FBA: $3.00 fulfillment plus $0.75 per cubic foot per month
    pub fn amazon() -> Self {
        Self {
            selling_rate: dec!(0.15),
            category_rates: rates(&[
                ("electronics", dec!(0.08)),
                ("clothing", dec!(0.17)),
                ("books", dec!(0.15)),
                ("home_garden", dec!(0.15)),
                ("toys_games", dec!(0.15)),
            ]),
            fulfillment_fee: dec!(3.00),
            storage_fee: dec!(0.75),
            ..Self::default()
        }
    }

    /// Etsy fee structure
    /// - $0.20 listing fee
    /// - 6.5% transaction fee
    /// - 3% + $0.25 payment processing
    pub fn etsy() -> Self {
        Self {
            selling_rate: dec!(0.065),
            listing_fee: dec!(0.20),
            payment_rate: dec!(0.03),
            payment_fixed: dec!(0.25),
            ..Self::default()
        }
    }

    /// Facebook Marketplace fee structure
    /// - 5% selling fee on shipped items
    /// - 2.9% + $0.30 payment processing
    /// - Nothing for local pickup
    pub fn facebook_marketplace() -> Self {
        Self {
            selling_rate: dec!(0.05),
            payment_rate: dec!(0.029),
            payment_fixed: dec!(0.30),
            ..Self::default()
        }
    }

    /// Mercari fee structure
    /// - 10% selling fee
    /// - 2.9% + $0.30 payment processing
    /// - $5.00 authentication for luxury items
    pub fn mercari() -> Self {
        Self {
            selling_rate: dec!(0.10),
            payment_rate: dec!(0.029),
            payment_fixed: dec!(0.30),
            authentication_fee: dec!(5.00),
            ..Self::default()
        }
    }

    /// Poshmark fee structure
    /// - Flat $2.95 under $15, 20% otherwise
    /// - Payment processing included in the commission
    pub fn poshmark() -> Self {
        Self {
            selling_rate: dec!(0.20),
            flat_tier: Some(FlatTier {
                threshold: dec!(15.00),
                flat_fee: dec!(2.95),
            }),
            ..Self::default()
        }
    }

    /// Depop fee structure
    /// - 10% selling fee
    /// - 2.9% + $0.30 payment processing (PayPal or Depop Payments)
    pub fn depop() -> Self {
        Self {
            selling_rate: dec!(0.10),
            payment_rate: dec!(0.029),
            payment_fixed: dec!(0.30),
            ..Self::default()
        }
    }

    /// Vinted fee structure
    /// - Sellers pay nothing
    /// - Buyers pay 5% + $0.70 buyer protection
    pub fn vinted() -> Self {
        Self {
            buyer_fee_rate: dec!(0.05),
            buyer_fee_fixed: dec!(0.70),
            ..Self::default()
        }
    }

    /// Get the built-in schedule for a platform
    pub fn for_platform(platform: PlatformId) -> Self {
        match platform {
            PlatformId::Ebay => Self::ebay(),
            PlatformId::Amazon => Self::amazon(),
            PlatformId::Etsy => Self::etsy(),
            PlatformId::FacebookMarketplace => Self::facebook_marketplace(),
            PlatformId::Mercari => Self::mercari(),
            PlatformId::Poshmark => Self::poshmark(),
            PlatformId::Depop => Self::depop(),
            PlatformId::Vinted => Self::vinted(),
        }
    }

    /// Selling rate for a category, falling back to the default rate
    pub fn rate_for_category(&self, category: Option<&str>) -> Decimal {
        category
            .map(normalize_label)
            .and_then(|c| self.category_rates.get(&c).copied())
            .unwrap_or(self.selling_rate)
    }

    fn payment_fee(&self, transaction: Decimal) -> Result<Decimal> {
        checked_add(checked_mul(transaction, self.payment_rate)?, self.payment_fixed)
    }

    fn validate(&self, platform: &str) -> Result<()> {
        let mut rate_fields = vec![
            ("selling_rate".to_string(), self.selling_rate),
            ("payment_rate".to_string(), self.payment_rate),
            ("international_rate".to_string(), self.international_rate),
            ("buyer_fee_rate".to_string(), self.buyer_fee_rate),
        ];
        rate_fields.extend(
            self.category_rates
                .iter()
                .map(|(category, rate)| (format!("category_rates.{}", category), *rate)),
        );
        for (field, rate) in rate_fields {
            if rate < Decimal::ZERO || rate > Decimal::ONE {
                return Err(EngineError::Configuration(format!(
                    "{}.{} must be a fraction in [0, 1], got {}",
                    platform, field, rate
                )));
            }
        }

        let mut fixed_fields = vec![
            ("payment_fixed".to_string(), self.payment_fixed),
            ("listing_fee".to_string(), self.listing_fee),
            ("fulfillment_fee".to_string(), self.fulfillment_fee),
            ("storage_fee".to_string(), self.storage_fee),
            ("authentication_fee".to_string(), self.authentication_fee),
            ("buyer_fee_fixed".to_string(), self.buyer_fee_fixed),
        ];
        if let Some(tier) = &self.flat_tier {
            fixed_fields.push(("flat_tier.threshold".to_string(), tier.threshold));
            fixed_fields.push(("flat_tier.flat_fee".to_string(), tier.flat_fee));
        }
        fixed_fields.extend(
            self.store_subscriptions
                .iter()
                .map(|(plan, amount)| (format!("store_subscriptions.{}", plan), *amount)),
        );
        for (field, amount) in fixed_fields {
            if amount < Decimal::ZERO {
                return Err(EngineError::Configuration(format!(
                    "{}.{} must be non-negative, got {}",
                    platform, field, amount
                )));
            }
        }
        Ok(())
    }
}

fn rates(entries: &[(&str, Decimal)]) -> BTreeMap<String, Decimal> {
    entries
        .iter()
        .map(|(name, rate)| (name.to_string(), *rate))
        .collect()
}

/// Versioned table of fee schedules keyed by platform name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeScheduleSet {
    #[serde(default = "default_schedule_version")]
    pub version: String,
    #[serde(default)]
    pub effective_date: Option<NaiveDate>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub platforms: BTreeMap<String, FeeSchedule>,
}

impl FeeScheduleSet {
    /// Fee table compiled into the binary
    pub fn builtin() -> Self {
        Self {
            version: default_schedule_version(),
            effective_date: NaiveDate::from_ymd_opt(2025, 1, 1),
            currency: default_currency(),
            platforms: PlatformId::ALL
                .iter()
                .map(|p| (p.as_str().to_string(), FeeSchedule::for_platform(*p)))
                .collect(),
        }
    }

    /// Drop a platform from the table
    pub fn without(mut self, platform: PlatformId) -> Self {
        self.platforms.remove(platform.as_str());
        self
    }
}

impl Default for FeeScheduleSet {
    fn default() -> Self {
        Self::builtin()
    }
}

fn default_schedule_version() -> String {
    "2025.1".to_string()
}

fn default_currency() -> String {
    "USD".to_string()
}

/// How the buyer pays, which only changes Depop's line label
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    #[serde(alias = "depop_payments")]
    Native,
    Paypal,
}

/// Platform-specific toggles
///
/// Deserializes from an open map: unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeOptions {
    pub international: bool,
    /// eBay store plan name (basic, premium, anchor)
    pub store_subscription: Option<String>,
    pub fba: bool,
    pub cubic_feet: Option<Decimal>,
    pub storage_months: Option<Decimal>,
    pub category: Option<String>,
    pub luxury_authentication: bool,
    pub payment_method: PaymentMethod,
    pub local_pickup: bool,
}

impl FeeOptions {
    /// Parse options from a JSON object
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if let Some(cubic_feet) = self.cubic_feet {
            validate_amount("cubic_feet", cubic_feet)?;
        }
        if let Some(months) = self.storage_months {
            validate_amount("storage_months", months)?;
        }
        Ok(())
    }
}

fn checked_mul(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_mul(b)
        .ok_or_else(|| EngineError::Arithmetic(format!("{} * {} overflows", a, b)))
}

fn checked_add(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_add(b)
        .ok_or_else(|| EngineError::Arithmetic(format!("{} + {} overflows", a, b)))
}

fn checked_sub(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_sub(b)
        .ok_or_else(|| EngineError::Arithmetic(format!("{} - {} overflows", a, b)))
}

/// Accumulates fee lines for one sale
struct LineItems {
    /// Unpriced items carry no fees at all
    unpriced: bool,
    charged: Vec<FeeLineItem>,
    informational: Vec<FeeLineItem>,
}

impl LineItems {
    fn new(sale_price: Decimal) -> Self {
        Self {
            unpriced: sale_price.is_zero(),
            charged: Vec::new(),
            informational: Vec::new(),
        }
    }

    fn charge(&mut self, name: &str, amount: Decimal) {
        let amount = if self.unpriced {
            Decimal::ZERO
        } else {
            round_cents(amount)
        };
        self.charged.push(FeeLineItem::new(name, amount));
    }

    fn note(&mut self, name: impl Into<String>, amount: Decimal) {
        self.informational
            .push(FeeLineItem::new(name, round_cents(amount)));
    }

    fn total(&self) -> Result<Decimal> {
        self.charged
            .iter()
            .try_fold(Decimal::ZERO, |acc, item| checked_add(acc, item.amount))
    }
}

/// Fee computation over a validated schedule table
///
/// Read-only after construction; share it freely across threads.
#[derive(Debug, Clone)]
pub struct FeeModel {
    version: String,
    schedules: BTreeMap<PlatformId, FeeSchedule>,
}

impl FeeModel {
    /// Validate a schedule table and build a model from it
    pub fn new(set: &FeeScheduleSet) -> Result<Self> {
        let mut schedules = BTreeMap::new();
        for (name, schedule) in &set.platforms {
            let platform: PlatformId = name.parse().map_err(|_| {
                EngineError::Configuration(format!("fee schedule for unknown platform '{}'", name))
            })?;
            schedule.validate(name)?;
            let mut schedule = schedule.clone();
            schedule.category_rates = schedule
                .category_rates
                .into_iter()
                .map(|(category, rate)| (normalize_label(&category), rate))
                .collect();
            schedules.insert(platform, schedule);
        }
        Ok(Self {
            version: set.version.clone(),
            schedules,
        })
    }

    /// Model over the built-in fee table
    pub fn builtin() -> Self {
        Self {
            version: default_schedule_version(),
            schedules: PlatformId::ALL
                .iter()
                .map(|p| (*p, FeeSchedule::for_platform(*p)))
                .collect(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn schedule_count(&self) -> usize {
        self.schedules.len()
    }

    pub fn schedule(&self, platform: PlatformId) -> Result<&FeeSchedule> {
        self.schedules.get(&platform).ok_or_else(|| {
            EngineError::InvalidPlatform(format!("{} has no fee schedule loaded", platform))
        })
    }

    fn platform_lines(
        &self,
        platform: PlatformId,
        schedule: &FeeSchedule,
        sale_price: Decimal,
        transaction: Decimal,
        options: &FeeOptions,
    ) -> Result<LineItems> {
        let mut fees = LineItems::new(sale_price);

        match platform {
            PlatformId::Ebay => {
                // A category override may only lower the final value rate
                let rate = schedule
                    .rate_for_category(options.category.as_deref())
                    .min(schedule.selling_rate);
                fees.charge("final_value_fee", checked_mul(transaction, rate)?);
                fees.charge("payment_processing_fee", schedule.payment_fee(transaction)?);
                if options.international {
                    fees.charge(
                        "international_fee",
                        checked_mul(transaction, schedule.international_rate)?,
                    );
                }
                if let Some(plan) = options.store_subscription.as_deref() {
                    let plan = normalize_label(plan);
                    if let Some(monthly) = schedule.store_subscriptions.get(&plan) {
                        fees.note(format!("store_subscription_{}", plan), *monthly);
                    }
                }
            }
            PlatformId::Amazon => {
                let rate = schedule.rate_for_category(options.category.as_deref());
                fees.charge("referral_fee", checked_mul(sale_price, rate)?);
                if options.fba {
                    fees.charge("fulfillment_fee", schedule.fulfillment_fee);
                    let storage = match (options.cubic_feet, options.storage_months) {
                        (Some(cubic_feet), Some(months)) => {
                            checked_mul(checked_mul(schedule.storage_fee, cubic_feet)?, months)?
                        }
                        _ => Decimal::ZERO,
                    };
                    fees.charge("storage_fee", storage);
                }
            }
            PlatformId::Etsy => {
                fees.charge("listing_fee", schedule.listing_fee);
                fees.charge("transaction_fee", checked_mul(sale_price, schedule.selling_rate)?);
                fees.charge("payment_processing_fee", schedule.payment_fee(transaction)?);
            }
            PlatformId::FacebookMarketplace => {
                // Local pickup sales never go through checkout
                let (selling, payment) = if options.local_pickup {
                    (Decimal::ZERO, Decimal::ZERO)
                } else {
                    (
                        checked_mul(sale_price, schedule.selling_rate)?,
                        schedule.payment_fee(transaction)?,
                    )
                };
                fees.charge("selling_fee", selling);
                fees.charge("payment_processing_fee", payment);
            }
            PlatformId::Mercari => {
                fees.charge("selling_fee", checked_mul(sale_price, schedule.selling_rate)?);
                fees.charge("payment_processing_fee", schedule.payment_fee(transaction)?);
                if options.luxury_authentication {
                    fees.charge("authentication_fee", schedule.authentication_fee);
                }
            }
            PlatformId::Poshmark => {
                let commission = match &schedule.flat_tier {
                    Some(tier) if sale_price < tier.threshold => tier.flat_fee,
                    _ => checked_mul(sale_price, schedule.selling_rate)?,
                };
                fees.charge("commission", commission);
            }
            PlatformId::Depop => {
                fees.charge("selling_fee", checked_mul(sale_price, schedule.selling_rate)?);
                let label = match options.payment_method {
                    PaymentMethod::Paypal => "paypal_payment_fee",
                    PaymentMethod::Native => "depop_payments_fee",
                };
                fees.charge(label, schedule.payment_fee(transaction)?);
            }
            PlatformId::Vinted => {
                fees.charge("seller_fee", Decimal::ZERO);
                let buyer_fee = if sale_price.is_zero() {
                    Decimal::ZERO
                } else {
                    checked_add(
                        checked_mul(sale_price, schedule.buyer_fee_rate)?,
                        schedule.buyer_fee_fixed,
                    )?
                };
                fees.note("buyer_protection_fee", buyer_fee);
            }
        }

        Ok(fees)
    }
}

impl Default for FeeModel {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FeeCalculator for FeeModel {
    fn compute_fees(
        &self,
        platform: PlatformId,
        sale_price: Decimal,
        shipping_cost: Decimal,
        item_cost: Decimal,
        options: &FeeOptions,
    ) -> Result<FeeBreakdown> {
        validate_amount("sale_price", sale_price)?;
        validate_amount("shipping_cost", shipping_cost)?;
        validate_amount("item_cost", item_cost)?;
        options.validate()?;

        let schedule = self.schedule(platform)?;
        let gross_revenue = checked_add(sale_price, shipping_cost)?;
        let fees = self.platform_lines(platform, schedule, sale_price, gross_revenue, options)?;

        let total_fees = fees.total()?;
        let net_revenue = checked_sub(gross_revenue, total_fees)?;
        let net_profit = checked_sub(net_revenue, item_cost)?;
        let profit_margin_percent = if gross_revenue.is_zero() {
            Decimal::ZERO
        } else {
            let ratio = net_profit
                .checked_div(gross_revenue)
                .ok_or_else(|| EngineError::Arithmetic("profit margin overflows".to_string()))?;
            round_cents(checked_mul(ratio, Decimal::ONE_HUNDRED)?)
        };

        debug!(
            platform = %platform,
            %sale_price,
            %total_fees,
            %net_profit,
            "computed platform fees"
        );

        Ok(FeeBreakdown {
            platform,
            sale_price,
            shipping_cost,
            gross_revenue,
            item_cost,
            total_fees,
            net_revenue,
            net_profit,
            profit_margin_percent,
            fee_line_items: fees.charged,
            informational_items: fees.informational,
        })
    }

    fn supported_platforms(&self) -> Vec<PlatformId> {
        self.schedules.keys().copied().collect()
    }
}
