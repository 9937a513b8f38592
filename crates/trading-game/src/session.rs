use game_core::GameSnapshot;

/// Session telemetry derived from consecutive snapshots.
///
/// The watch channel only keeps the latest value, so a trade opened and
/// closed between two observed snapshots is not counted.
#[derive(Debug, Default)]
pub struct SessionStats {
    pub trades_closed: u64,
    pub winning_trades: u64,
    pub losing_trades: u64,
    pub realised_pnl: f64,
    pub liquidations: u64,
    pub games_over: u64,
    pub resets: u64,
    pub best_score: u64,
}

impl SessionStats {
    pub fn observe(&mut self, prev: &GameSnapshot, next: &GameSnapshot) {
        // Tick counter restarts on reset
        if next.tick < prev.tick || (prev.game_state.is_game_over && !next.game_state.is_game_over)
        {
            self.resets += 1;
            return;
        }

        let was_open = prev.game_state.position.is_some();
        let is_open = next.game_state.position.is_some();
        let ended = !prev.game_state.is_game_over && next.game_state.is_game_over;

        if was_open && !is_open {
            let pnl = next.game_state.balance - prev.game_state.balance;
            self.record_trade(pnl);
            // Liquidation happens on a tick, a ruinous close between ticks
            if ended && next.tick > prev.tick {
                self.liquidations += 1;
            }
        }
        if ended {
            self.games_over += 1;
        }
        self.best_score = self.best_score.max(next.game_state.score);
    }

    fn record_trade(&mut self, pnl: f64) {
        self.trades_closed += 1;
        self.realised_pnl += pnl;
        if pnl > 0.0 {
            self.winning_trades += 1;
        } else {
            self.losing_trades += 1;
        }
    }

    /// Win rate over closed trades (0-100%)
    pub fn win_rate(&self) -> f64 {
        if self.trades_closed == 0 {
            return 0.0;
        }
        (self.winning_trades as f64 / self.trades_closed as f64) * 100.0
    }

    pub fn log_summary(&self) {
        tracing::info!(
            trades_closed = self.trades_closed,
            winning_trades = self.winning_trades,
            losing_trades = self.losing_trades,
            win_rate = format!("{:.1}%", self.win_rate()),
            realised_pnl = format!("{:.2}", self.realised_pnl),
            liquidations = self.liquidations,
            games_over = self.games_over,
            resets = self.resets,
            best_score = self.best_score,
            "Session summary"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_core::PositionSide;
    use game_engine::{GameConfig, GameEngine, MemoryStore};

    fn engine() -> GameEngine {
        let config = GameConfig {
            rng_seed: Some(9),
            ..GameConfig::default()
        };
        GameEngine::new(config, Box::new(MemoryStore::new()))
    }

    /// Apply `step` and feed the before/after snapshots to `stats`.
    fn observe(stats: &mut SessionStats, engine: &mut GameEngine, step: impl FnOnce(&mut GameEngine)) {
        let prev = engine.snapshot();
        step(engine);
        stats.observe(&prev, &engine.snapshot());
    }

    #[test]
    fn test_counts_closed_trades() {
        let mut engine = engine();
        let mut stats = SessionStats::default();

        observe(&mut stats, &mut engine, |e| {
            e.apply_price(43000.0);
        });
        observe(&mut stats, &mut engine, |e| e.open_position(PositionSide::Long));
        observe(&mut stats, &mut engine, |e| {
            e.apply_price(43430.0);
        });
        observe(&mut stats, &mut engine, |e| e.close_position());

        assert_eq!(stats.trades_closed, 1);
        assert_eq!(stats.winning_trades, 1);
        assert!((stats.realised_pnl - 500.0).abs() < 1e-6);
        assert_eq!(stats.best_score, 500);
        assert_eq!(stats.win_rate(), 100.0);
    }

    #[test]
    fn test_counts_liquidation_and_reset() {
        let mut engine = engine();
        let mut stats = SessionStats::default();

        engine.apply_price(43000.0);
        engine.open_position(PositionSide::Long);
        observe(&mut stats, &mut engine, |e| {
            e.apply_price(20000.0);
        });

        assert_eq!(stats.liquidations, 1);
        assert_eq!(stats.games_over, 1);
        assert_eq!(stats.losing_trades, 1);
        assert!((stats.realised_pnl - -10_000.0).abs() < 1e-6);

        observe(&mut stats, &mut engine, |e| e.reset_game());
        assert_eq!(stats.resets, 1);
        assert_eq!(stats.trades_closed, 1);
    }

    #[test]
    fn test_idle_ticks_change_nothing() {
        let mut engine = engine();
        let mut stats = SessionStats::default();

        for _ in 0..20 {
            observe(&mut stats, &mut engine, |e| {
                e.tick();
            });
        }
        assert_eq!(stats.trades_closed, 0);
        assert_eq!(stats.resets, 0);
        assert_eq!(stats.win_rate(), 0.0);
    }
}
