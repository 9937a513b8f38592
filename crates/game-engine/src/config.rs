use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::price::DEFAULT_VOLATILITY;

/// Ceiling for tick interval, in milliseconds
pub const MAX_TICK_INTERVAL_MS: u64 = 60_000;

/// Ceiling for candle counts and display lengths
pub const MAX_CANDLES: usize = 10_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    // Account
    pub initial_balance: f64,              // 10,000

    // Price feed
    pub start_price: f64,                  // 43,000
    pub volatility: f64,                   // 0.0008 per tick
    pub tick_interval_ms: u64,             // 100
    pub rng_seed: Option<u64>,             // deterministic feed when set

    // Candles
    pub ticks_per_candle: usize,           // 10
    pub max_candles: usize,                // 60
    pub seed_candles: usize,               // 60

    // Indicators
    pub rsi_period: usize,                 // 14
    pub macd_fast: usize,                  // 12
    pub macd_slow: usize,                  // 26
    pub macd_signal: usize,                // 9
    pub display_len: usize,                // 30

    // Player defaults
    pub default_leverage: f64,             // 10x
    pub default_timeframe_minutes: u32,    // 1

    // High score file, platform data dir when unset
    pub high_score_path: Option<PathBuf>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            initial_balance: 10_000.0,
            start_price: 43_000.0,
            volatility: DEFAULT_VOLATILITY,
            tick_interval_ms: 100,
            rng_seed: None,
            ticks_per_candle: 10,
            max_candles: 60,
            seed_candles: 60,
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            display_len: 30,
            default_leverage: 10.0,
            default_timeframe_minutes: 1,
            high_score_path: None,
        }
    }
}

impl GameConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            initial_balance: env_or("GAME_INITIAL_BALANCE", defaults.initial_balance)?,
            start_price: env_or("GAME_START_PRICE", defaults.start_price)?,
            volatility: env_or("GAME_VOLATILITY", defaults.volatility)?,
            tick_interval_ms: env_or("GAME_TICK_INTERVAL_MS", defaults.tick_interval_ms)?,
            rng_seed: env_opt("GAME_RNG_SEED")?,
            ticks_per_candle: env_or("GAME_TICKS_PER_CANDLE", defaults.ticks_per_candle)?,
            max_candles: env_or("GAME_MAX_CANDLES", defaults.max_candles)?,
            seed_candles: env_or("GAME_SEED_CANDLES", defaults.seed_candles)?,
            rsi_period: env_or("GAME_RSI_PERIOD", defaults.rsi_period)?,
            macd_fast: env_or("GAME_MACD_FAST", defaults.macd_fast)?,
            macd_slow: env_or("GAME_MACD_SLOW", defaults.macd_slow)?,
            macd_signal: env_or("GAME_MACD_SIGNAL", defaults.macd_signal)?,
            display_len: env_or("GAME_DISPLAY_LEN", defaults.display_len)?,
            default_leverage: env_or("GAME_DEFAULT_LEVERAGE", defaults.default_leverage)?,
            default_timeframe_minutes: env_or(
                "GAME_DEFAULT_TIMEFRAME",
                defaults.default_timeframe_minutes,
            )?,
            high_score_path: env::var("GAME_HIGH_SCORE_PATH").ok().map(PathBuf::from),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.initial_balance.is_finite() && self.initial_balance > 0.0) {
            bail!("initial balance must be positive, got {}", self.initial_balance);
        }
        if !(self.start_price.is_finite() && self.start_price > 0.0) {
            bail!("start price must be positive, got {}", self.start_price);
        }
        // A per-tick move of 100% or more could drive the price to zero
        if !(self.volatility >= 0.0 && self.volatility < 0.5) {
            bail!("volatility must be in [0, 0.5), got {}", self.volatility);
        }
        if !(1..=MAX_TICK_INTERVAL_MS).contains(&self.tick_interval_ms) {
            bail!(
                "tick interval must be in [1, {}]ms, got {}",
                MAX_TICK_INTERVAL_MS,
                self.tick_interval_ms
            );
        }
        if !(1..=MAX_CANDLES).contains(&self.ticks_per_candle) {
            bail!(
                "ticks per candle must be in [1, {}], got {}",
                MAX_CANDLES,
                self.ticks_per_candle
            );
        }
        if !(1..=MAX_CANDLES).contains(&self.max_candles) {
            bail!("max candles must be in [1, {}], got {}", MAX_CANDLES, self.max_candles);
        }
        if self.seed_candles > MAX_CANDLES {
            bail!("seed candles must be at most {}, got {}", MAX_CANDLES, self.seed_candles);
        }
        if self.display_len > MAX_CANDLES {
            bail!("display length must be at most {}, got {}", MAX_CANDLES, self.display_len);
        }
        if self.rsi_period == 0 || self.macd_fast == 0 || self.macd_signal == 0 {
            bail!("indicator periods must be at least 1");
        }
        if self.macd_slow < self.macd_fast {
            bail!(
                "MACD slow period ({}) must not be shorter than fast period ({})",
                self.macd_slow,
                self.macd_fast
            );
        }
        if !(self.default_leverage.is_finite() && self.default_leverage >= 1.0) {
            bail!("default leverage must be >= 1, got {}", self.default_leverage);
        }
        if self.default_timeframe_minutes == 0 {
            bail!("default timeframe must be at least 1 minute");
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", key, raw)),
        Err(_) => Ok(default),
    }
}

fn env_opt<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} has an invalid value: {:?}", key, raw)),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tick_interval(), Duration::from_millis(100));
        assert_eq!(config.ticks_per_candle, 10);
        assert_eq!(config.max_candles, 60);
    }

    #[test]
    fn test_rejects_nonsense() {
        let mut config = GameConfig::default();
        config.ticks_per_candle = 0;
        assert!(config.validate().is_err());

        let mut config = GameConfig::default();
        config.volatility = 0.75;
        assert!(config.validate().is_err());

        let mut config = GameConfig::default();
        config.macd_slow = 5;
        assert!(config.validate().is_err());

        let mut config = GameConfig::default();
        config.default_leverage = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_oversized_timing_and_history() {
        let mut config = GameConfig::default();
        config.tick_interval_ms = u64::MAX;
        assert!(config.validate().is_err());

        let mut config = GameConfig::default();
        config.tick_interval_ms = MAX_TICK_INTERVAL_MS;
        assert!(config.validate().is_ok());

        let mut config = GameConfig::default();
        config.seed_candles = MAX_CANDLES + 1;
        assert!(config.validate().is_err());

        let mut config = GameConfig::default();
        config.display_len = usize::MAX;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_override_and_parse_error() {
        env::set_var("GAME_TEST_ONLY_KEY", " 42 ");
        assert_eq!(env_or::<u64>("GAME_TEST_ONLY_KEY", 7).unwrap(), 42);
        assert_eq!(env_opt::<u64>("GAME_TEST_ONLY_KEY").unwrap(), Some(42));

        env::set_var("GAME_TEST_ONLY_KEY", "forty-two");
        assert!(env_or::<u64>("GAME_TEST_ONLY_KEY", 7).is_err());

        env::remove_var("GAME_TEST_ONLY_KEY");
        assert_eq!(env_or::<u64>("GAME_TEST_ONLY_KEY", 7).unwrap(), 7);
        assert_eq!(env_opt::<u64>("GAME_TEST_ONLY_KEY").unwrap(), None);
    }
}
