use rust_decimal::Decimal;

use crate::common::errors::{EngineError, Result};
use crate::common::types::PlatformId;
use crate::pricing::fees::FeeOptions;
use crate::pricing::types::FeeBreakdown;

/// Trait for computing platform fees
///
/// The comparator only talks to fee schedules through this trait, so a
/// different schedule source (or a test double) can be swapped in.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`: comparisons for different inputs
/// may run concurrently against the same calculator.
pub trait FeeCalculator: Send + Sync {
    /// Compute fees and profit for one sale on one platform
    ///
    /// # Arguments
    /// * `platform` - The marketplace
    /// * `sale_price` - Listing price paid by the buyer
    /// * `shipping_cost` - Shipping charged to the buyer
    /// * `item_cost` - What the seller paid for the item
    /// * `options` - Platform-specific toggles
    fn compute_fees(
        &self,
        platform: PlatformId,
        sale_price: Decimal,
        shipping_cost: Decimal,
        item_cost: Decimal,
        options: &FeeOptions,
    ) -> Result<FeeBreakdown>;

    /// Platforms that have a loaded fee schedule
    fn supported_platforms(&self) -> Vec<PlatformId>;

    /// Parse a platform name and check a schedule exists for it
    fn resolve_platform(&self, name: &str) -> Result<PlatformId> {
        let platform: PlatformId = name.parse()?;
        if self.supported_platforms().contains(&platform) {
            Ok(platform)
        } else {
            Err(EngineError::InvalidPlatform(format!(
                "{} has no fee schedule loaded",
                platform
            )))
        }
    }
}

/// Boxed fee calculator for dynamic dispatch
pub type BoxedFeeCalculator = Box<dyn FeeCalculator>;
