use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLC candle built from synthetic ticks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    /// A fresh candle where every price equals `price`
    pub fn opened_at(open_time: DateTime<Utc>, price: f64) -> Self {
        Self {
            open_time,
            open: price,
            high: price,
            low: price,
            close: price,
        }
    }

    /// Fold one tick into the candle.
    pub fn absorb(&mut self, price: f64) {
        if price > self.high {
            self.high = price;
        }
        if price < self.low {
            self.low = price;
        }
        self.close = price;
    }
}

/// Direction of a leveraged position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    /// +1 for long, -1 for short
    pub fn direction(&self) -> f64 {
        match self {
            PositionSide::Long => 1.0,
            PositionSide::Short => -1.0,
        }
    }
}

impl std::fmt::Display for PositionSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionSide::Long => write!(f, "long"),
            PositionSide::Short => write!(f, "short"),
        }
    }
}

impl std::str::FromStr for PositionSide {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "long" | "buy" => Ok(PositionSide::Long),
            "short" | "sell" => Ok(PositionSide::Short),
            _ => Err(anyhow::anyhow!("Invalid position side: {}", s)),
        }
    }
}

/// The single open position. Leverage and size are fixed at open time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub side: PositionSide,
    pub entry_price: f64,
    pub leverage: f64,
    /// Notional size in balance units
    pub size: f64,
    pub opened_at: DateTime<Utc>,
}

/// A Fibonacci retracement level for the current window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FibLevel {
    pub ratio: f64,
    pub price: f64,
    pub label: String,
    pub color: String,
    /// Current price sits within 5% of the window range from this level
    pub is_glowing: bool,
}

/// A Fibonacci extension (take-profit projection)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FibExtension {
    pub ratio: f64,
    pub price: f64,
    pub label: String,
}

/// MACD output, index-aligned with the candles it was computed from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MacdSeries {
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

/// Lifecycle phase derived from [`GameState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Idle,
    PositionOpen,
    GameOver,
}

impl std::fmt::Display for GamePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GamePhase::Idle => write!(f, "idle"),
            GamePhase::PositionOpen => write!(f, "position open"),
            GamePhase::GameOver => write!(f, "game over"),
        }
    }
}

/// Balance, score and position bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub balance: f64,
    pub score: u64,
    pub high_score: u64,
    pub position: Option<Position>,
    pub is_game_over: bool,
    /// Unrealized PnL of the open position, 0 when flat
    pub pnl: f64,
}

impl GameState {
    pub fn new(balance: f64, high_score: u64) -> Self {
        Self {
            balance,
            score: 0,
            high_score,
            position: None,
            is_game_over: false,
            pnl: 0.0,
        }
    }

    pub fn phase(&self) -> GamePhase {
        if self.is_game_over {
            GamePhase::GameOver
        } else if self.position.is_some() {
            GamePhase::PositionOpen
        } else {
            GamePhase::Idle
        }
    }
}

/// Read-only view handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Ticks processed since the last reset
    pub tick: u64,
    /// Oldest first, the last candle is still open
    pub candles: Vec<Candle>,
    pub game_state: GameState,
    /// Ascending by ratio
    pub fib_levels: Vec<FibLevel>,
    /// Aligned with the last `rsi.len()` candles
    pub rsi: Vec<Option<f64>>,
    pub macd: MacdSeries,
    pub current_price: f64,
    pub leverage: f64,
    pub timeframe_minutes: u32,
    pub liquidation_price: Option<f64>,
}

impl GameSnapshot {
    pub fn phase(&self) -> GamePhase {
        self.game_state.phase()
    }

    pub fn latest_rsi(&self) -> Option<f64> {
        self.rsi.last().copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candle_absorb_tracks_extremes() {
        let mut candle = Candle::opened_at(Utc::now(), 100.0);
        candle.absorb(103.0);
        candle.absorb(97.5);
        candle.absorb(101.0);

        assert_eq!(candle.open, 100.0);
        assert_eq!(candle.high, 103.0);
        assert_eq!(candle.low, 97.5);
        assert_eq!(candle.close, 101.0);
    }

    #[test]
    fn test_position_side_parse() {
        assert_eq!("long".parse::<PositionSide>().unwrap(), PositionSide::Long);
        assert_eq!("BUY".parse::<PositionSide>().unwrap(), PositionSide::Long);
        assert_eq!("Short".parse::<PositionSide>().unwrap(), PositionSide::Short);
        assert!("hold".parse::<PositionSide>().is_err());
    }

    #[test]
    fn test_phase_derivation() {
        let mut state = GameState::new(10000.0, 0);
        assert_eq!(state.phase(), GamePhase::Idle);

        state.position = Some(Position {
            side: PositionSide::Long,
            entry_price: 43000.0,
            leverage: 10.0,
            size: 5000.0,
            opened_at: Utc::now(),
        });
        assert_eq!(state.phase(), GamePhase::PositionOpen);

        state.is_game_over = true;
        assert_eq!(state.phase(), GamePhase::GameOver);
    }
}
