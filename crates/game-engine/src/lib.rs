//! Leveraged Trading Game Engine
//!
//! Synthetic price feed, candle aggregation, indicator refresh and a single
//! leveraged position with a balance-relative liquidation rule. The engine
//! itself is a plain state machine; [`scheduler`] drives it on a timer and
//! publishes snapshots over a watch channel.

pub mod candles;
pub mod config;
pub mod engine;
pub mod position;
pub mod price;
pub mod scheduler;
pub mod storage;


pub use candles::CandleAggregator;
pub use config::GameConfig;
pub use engine::{GameEngine, TickReport};
pub use position::{calculate_pnl, liquidation_price, position_size, should_liquidate};
pub use price::{next_tick, PriceGenerator};
pub use scheduler::{spawn_game, GameCommand, GameCommander, GameHandle};
pub use storage::{JsonFileStore, MemoryStore, HIGH_SCORE_KEY};
