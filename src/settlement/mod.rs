pub mod engine;
pub mod handlers;

pub use engine::SettlementEngine;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Platform fee, deducted from task escrow on top of the worker payout
pub const PLATFORM_FEE_RATE: Decimal = dec!(0.25);

/// Referral commission as a fraction of the payout; drawn from the fee, so
/// the advertiser's cost per view is the same with or without a referrer
pub const REFERRAL_COMMISSION_RATE: Decimal = dec!(0.05);

/// Total escrow cost of one paid view (payout + fee)
pub const TOTAL_COST_RATE: Decimal = dec!(1.25);
