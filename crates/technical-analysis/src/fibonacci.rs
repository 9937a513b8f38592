//! Fibonacci retracement levels over a timeframe-sized candle window,
//! plus the extension targets used for take-profit planning.

use game_core::{Candle, FibExtension, FibLevel};

/// Candles per timeframe minute in the retracement window
pub const FIB_CANDLES_PER_MINUTE: usize = 10;

/// Distance to a level, as a fraction of the window range, that counts as confluence
pub const CONFLUENCE_THRESHOLD: f64 = 0.05;

const RETRACEMENTS: [(f64, &str, &str); 7] = [
    (0.0, "0%", "#ef4444"),
    (0.236, "23.6%", "#f97316"),
    (0.382, "38.2%", "#eab308"),
    (0.5, "50%", "#22c55e"),
    (0.618, "61.8%", "#06b6d4"),
    (0.786, "78.6%", "#3b82f6"),
    (1.0, "100%", "#a855f7"),
];

const EXTENSIONS: [(f64, &str); 4] = [
    (1.0, "100%"),
    (1.272, "127.2%"),
    (1.618, "161.8%"),
    (2.0, "200%"),
];

/// The most recent `timeframe_minutes * 10` candles (or all of them when
/// history is shorter).
pub fn fib_window(candles: &[Candle], timeframe_minutes: u32) -> &[Candle] {
    let size = (timeframe_minutes as usize).saturating_mul(FIB_CANDLES_PER_MINUTE);
    &candles[candles.len().saturating_sub(size)..]
}

/// Retracement levels for the window, ordered by ascending ratio.
///
/// `price(ratio) = high - range * ratio`, so ratio 0 is the window high and
/// ratio 1 the window low. A flat window collapses every level onto the
/// price and disables the glow.
pub fn fib_levels(candles: &[Candle], timeframe_minutes: u32, current_price: f64) -> Vec<FibLevel> {
    let window = fib_window(candles, timeframe_minutes);
    if window.is_empty() {
        return vec![];
    }

    let high = window.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
    let low = window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
    let range = high - low;

    RETRACEMENTS
        .iter()
        .map(|&(ratio, label, color)| {
            let (price, is_glowing) = if range > 0.0 {
                let price = high - range * ratio;
                (price, (current_price - price).abs() / range < CONFLUENCE_THRESHOLD)
            } else {
                (high, false)
            };

            FibLevel {
                ratio,
                price,
                label: label.to_string(),
                color: color.to_string(),
                is_glowing,
            }
        })
        .collect()
}

/// Extension targets projected upward from a swing.
pub fn fib_extensions(swing_low: f64, swing_high: f64) -> Vec<FibExtension> {
    let span = swing_high - swing_low;
    EXTENSIONS
        .iter()
        .map(|&(ratio, label)| FibExtension {
            ratio,
            price: swing_low + span * ratio,
            label: label.to_string(),
        })
        .collect()
}
