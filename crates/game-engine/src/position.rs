//! PnL and liquidation math for the single leveraged position.
//!
//! Liquidation is balance-relative: a position is force-closed once
//! `balance + pnl <= balance * -0.9`, i.e. the loss exceeds 190% of the
//! balance held before the trade. This is not a maintenance-margin formula
//! and is kept exactly as the game defines it.

use game_core::Position;

/// Fraction of the balance committed as notional when a position opens
pub const POSITION_FRACTION: f64 = 0.5;

/// `potential_balance <= balance * LIQUIDATION_RATIO` liquidates
pub const LIQUIDATION_RATIO: f64 = -0.9;

pub fn position_size(balance: f64) -> f64 {
    balance * POSITION_FRACTION
}

/// Leveraged PnL of `position` marked at `current_price`.
pub fn calculate_pnl(position: &Position, current_price: f64) -> f64 {
    let percent_change = (current_price - position.entry_price) / position.entry_price;
    let leveraged_change = percent_change * position.leverage;
    position.size * leveraged_change * position.side.direction()
}

pub fn should_liquidate(balance: f64, pnl: f64) -> bool {
    let potential_balance = balance + pnl;
    potential_balance <= balance * LIQUIDATION_RATIO
}

/// Price at which [`should_liquidate`] starts firing for `position`.
///
/// `None` when no positive price reaches the threshold, e.g. a long with
/// low leverage.
pub fn liquidation_price(position: &Position, balance: f64) -> Option<f64> {
    let exposure = position.size * position.leverage * position.side.direction();
    if balance <= 0.0 || exposure == 0.0 || position.entry_price <= 0.0 {
        return None;
    }

    let pnl_at_threshold = (LIQUIDATION_RATIO - 1.0) * balance;
    let price = position.entry_price * (1.0 + pnl_at_threshold / exposure);
    (price.is_finite() && price > 0.0).then_some(price)
}
