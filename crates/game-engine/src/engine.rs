//! Game State Machine
//!
//! Owns balance, score, the candle history and the one open position.
//! Every public mutator is a complete, synchronous step; invalid requests
//! (opening twice, changing leverage mid-trade, acting after game over) are
//! silent no-ops rather than errors.

use chrono::{DateTime, Duration, Utc};
use game_core::{
    Candle, FibLevel, GamePhase, GameSnapshot, GameState, KeyValueStore, MacdSeries, Position,
    PositionSide,
};
use technical_analysis::{fib_levels, macd, rsi, trim_macd, trim_tail};

use crate::candles::CandleAggregator;
use crate::config::GameConfig;
use crate::position::{calculate_pnl, liquidation_price, position_size, should_liquidate};
use crate::price::PriceGenerator;
use crate::storage::{load_high_score, save_high_score};

/// What one tick cycle did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub price: f64,
    pub candle_closed: bool,
    pub liquidated: bool,
}

pub struct GameEngine {
    config: GameConfig,
    generator: PriceGenerator,
    candles: CandleAggregator,
    store: Box<dyn KeyValueStore>,
    state: GameState,
    leverage: f64,
    timeframe_minutes: u32,
    rsi: Vec<Option<f64>>,
    macd: MacdSeries,
    fib_levels: Vec<FibLevel>,
    /// Simulated time, advanced one tick interval per tick
    clock: DateTime<Utc>,
    tick: u64,
}

impl GameEngine {
    /// Build an engine, loading the high score from `store` once.
    pub fn new(config: GameConfig, store: Box<dyn KeyValueStore>) -> Self {
        let generator = match config.rng_seed {
            Some(seed) => PriceGenerator::with_seed(config.volatility, seed),
            None => PriceGenerator::new(config.volatility),
        };
        let high_score = load_high_score(store.as_ref());

        let mut engine = Self {
            candles: CandleAggregator::new(config.ticks_per_candle, config.max_candles),
            state: GameState::new(config.initial_balance, high_score),
            leverage: config.default_leverage,
            timeframe_minutes: config.default_timeframe_minutes,
            rsi: Vec::new(),
            macd: MacdSeries::default(),
            fib_levels: Vec::new(),
            clock: Utc::now(),
            tick: 0,
            config,
            generator,
            store,
        };
        engine.seed_history();

        tracing::info!(
            "Game engine ready: balance ${:.2}, price ${:.2}, high score {}",
            engine.state.balance,
            engine.current_price(),
            engine.state.high_score
        );
        engine
    }

    /// One scheduler cycle with the next synthetic price. `None` once the
    /// game is over.
    pub fn tick(&mut self) -> Option<TickReport> {
        if self.state.is_game_over {
            return None;
        }
        let price = self.generator.next_tick(self.current_price());
        Some(self.apply_price(price))
    }

    /// Run a full tick cycle at an externally supplied price: candle update,
    /// indicator refresh, PnL mark and liquidation check.
    pub fn apply_price(&mut self, price: f64) -> TickReport {
        if self.state.is_game_over {
            return TickReport {
                tick: self.tick,
                price: self.current_price(),
                candle_closed: false,
                liquidated: false,
            };
        }

        self.tick += 1;
        self.advance_clock();
        let candle_closed = self.candles.apply_tick(price, self.clock);

        // The open candle is part of the window, so levels move with every tick
        self.refresh_indicators();
        self.refresh_fib_levels();

        let liquidated = self.mark_position();
        tracing::trace!(tick = self.tick, price, candle_closed, liquidated, "tick");

        TickReport {
            tick: self.tick,
            price,
            candle_closed,
            liquidated,
        }
    }

    pub fn open_position(&mut self, side: PositionSide) {
        if self.state.is_game_over {
            tracing::debug!("Ignoring open {}: game is over", side);
            return;
        }
        if self.state.position.is_some() {
            tracing::debug!("Ignoring open {}: a position is already open", side);
            return;
        }

        let position = Position {
            side,
            entry_price: self.current_price(),
            leverage: self.leverage,
            size: position_size(self.state.balance),
            opened_at: self.clock,
        };
        tracing::info!(
            "Opened {} {:.0}x: ${:.2} notional @ ${:.2}",
            position.side,
            position.leverage,
            position.size,
            position.entry_price
        );

        self.state.position = Some(position);
        self.state.pnl = 0.0;
    }

    pub fn close_position(&mut self) {
        if self.state.is_game_over {
            tracing::debug!("Ignoring close: game is over");
            return;
        }
        let Some(position) = self.state.position.take() else {
            tracing::debug!("Ignoring close: no open position");
            return;
        };

        let pnl = calculate_pnl(&position, self.current_price());
        self.state.balance += pnl;
        self.state.score += pnl.floor().max(0.0) as u64;
        self.state.pnl = 0.0;

        tracing::info!(
            "Closed {} @ ${:.2}: PnL ${:.2}, balance ${:.2}, score {}",
            position.side,
            self.current_price(),
            pnl,
            self.state.balance,
            self.state.score
        );

        if self.state.balance <= 0.0 {
            self.end_game();
        } else {
            self.record_high_score();
        }
    }

    pub fn set_leverage(&mut self, leverage: f64) {
        if self.state.is_game_over {
            tracing::debug!("Ignoring leverage change to {}: game is over", leverage);
            return;
        }
        if self.state.position.is_some() {
            tracing::debug!("Ignoring leverage change to {}: position is open", leverage);
            return;
        }
        if !(leverage.is_finite() && leverage >= 1.0) {
            tracing::debug!("Ignoring invalid leverage {}", leverage);
            return;
        }
        self.leverage = leverage;
    }

    pub fn set_timeframe(&mut self, minutes: u32) {
        if self.state.is_game_over {
            tracing::debug!("Ignoring timeframe change to {}m: game is over", minutes);
            return;
        }
        if self.state.position.is_some() {
            tracing::debug!("Ignoring timeframe change to {}m: position is open", minutes);
            return;
        }
        if minutes == 0 {
            tracing::debug!("Ignoring zero-minute timeframe");
            return;
        }
        self.timeframe_minutes = minutes;
        self.refresh_fib_levels();
    }

    /// Fresh history and balance. Only the high score carries over.
    pub fn reset_game(&mut self) {
        self.state = GameState::new(self.config.initial_balance, self.state.high_score);
        self.tick = 0;
        self.seed_history();
        tracing::info!(
            "Game reset: balance ${:.2}, price ${:.2}, high score {}",
            self.state.balance,
            self.current_price(),
            self.state.high_score
        );
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let display_len = self.config.display_len;
        GameSnapshot {
            tick: self.tick,
            candles: self.candles.candles().to_vec(),
            game_state: self.state.clone(),
            fib_levels: self.fib_levels.clone(),
            rsi: trim_tail(&self.rsi, display_len),
            macd: trim_macd(&self.macd, display_len),
            current_price: self.current_price(),
            leverage: self.leverage,
            timeframe_minutes: self.timeframe_minutes,
            liquidation_price: self
                .state
                .position
                .as_ref()
                .and_then(|p| liquidation_price(p, self.state.balance)),
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase()
    }

    pub fn is_game_over(&self) -> bool {
        self.state.is_game_over
    }

    pub fn candles(&self) -> &[Candle] {
        self.candles.candles()
    }

    /// Close of the newest candle
    pub fn current_price(&self) -> f64 {
        self.candles.latest_close().unwrap_or(self.config.start_price)
    }

    pub fn leverage(&self) -> f64 {
        self.leverage
    }

    pub fn timeframe_minutes(&self) -> u32 {
        self.timeframe_minutes
    }

    /// Full-length RSI series, aligned with [`Self::candles`]
    pub fn rsi(&self) -> &[Option<f64>] {
        &self.rsi
    }

    /// Full-length MACD series, aligned with [`Self::candles`]
    pub fn macd(&self) -> &MacdSeries {
        &self.macd
    }

    pub fn fib_levels(&self) -> &[FibLevel] {
        &self.fib_levels
    }

    fn tick_millis(&self) -> i64 {
        i64::try_from(self.config.tick_interval_ms).unwrap_or(i64::MAX)
    }

    /// Step simulated time by one tick. Saturates instead of overflowing.
    fn advance_clock(&mut self) {
        if let Some(next) = self
            .clock
            .checked_add_signed(Duration::milliseconds(self.tick_millis()))
        {
            self.clock = next;
        }
    }

    /// Regenerate the seed candles from the starting price, back-dated so
    /// the newest one opens at roughly the current wall-clock time.
    fn seed_history(&mut self) {
        let seed_ticks = self
            .config
            .seed_candles
            .saturating_mul(self.config.ticks_per_candle);
        let back_ms = i64::try_from(seed_ticks)
            .ok()
            .and_then(|n| n.checked_mul(self.tick_millis()))
            .unwrap_or(i64::MAX);
        let now = Utc::now();
        self.clock = now
            .checked_sub_signed(Duration::milliseconds(back_ms))
            .unwrap_or(now);
        self.candles.open(self.clock, self.config.start_price);

        let mut price = self.config.start_price;
        for _ in 0..seed_ticks {
            price = self.generator.next_tick(price);
            self.advance_clock();
            self.candles.apply_tick(price, self.clock);
        }

        self.refresh_indicators();
        self.refresh_fib_levels();
    }

    fn refresh_indicators(&mut self) {
        let closes = self.candles.closes();
        self.rsi = rsi(&closes, self.config.rsi_period);
        self.macd = macd(
            &closes,
            self.config.macd_fast,
            self.config.macd_slow,
            self.config.macd_signal,
        );
    }

    fn refresh_fib_levels(&mut self) {
        self.fib_levels = fib_levels(
            self.candles.candles(),
            self.timeframe_minutes,
            self.current_price(),
        );
    }

    /// Mark the open position to the latest price. Returns `true` if it was
    /// liquidated.
    fn mark_position(&mut self) -> bool {
        let Some(position) = self.state.position.as_ref() else {
            self.state.pnl = 0.0;
            return false;
        };

        let (side, leverage) = (position.side, position.leverage);
        let pnl = calculate_pnl(position, self.current_price());
        self.state.pnl = pnl;
        if !should_liquidate(self.state.balance, pnl) {
            return false;
        }

        tracing::warn!(
            "LIQUIDATED {} {:.0}x @ ${:.2}: PnL ${:.2} against balance ${:.2}",
            side,
            leverage,
            self.current_price(),
            pnl,
            self.state.balance
        );
        self.end_game();
        true
    }

    /// Terminal transition shared by liquidation and a ruinous close.
    fn end_game(&mut self) {
        self.state.position = None;
        self.state.balance = 0.0;
        self.state.pnl = 0.0;
        self.state.is_game_over = true;
        self.record_high_score();
        tracing::info!(
            "Game over: score {}, high score {}",
            self.state.score,
            self.state.high_score
        );
    }

    fn record_high_score(&mut self) {
        if self.state.score > self.state.high_score {
            self.state.high_score = self.state.score;
            save_high_score(self.store.as_mut(), self.state.high_score);
            tracing::info!("New high score: {}", self.state.high_score);
        }
    }
}
