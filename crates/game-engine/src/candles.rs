use chrono::{DateTime, Utc};
use game_core::Candle;

/// Folds ticks into fixed-size candles and keeps a bounded history.
///
/// The last candle in the history is always the open one; everything before
/// it is closed and never touched again.
#[derive(Debug, Clone)]
pub struct CandleAggregator {
    ticks_per_candle: usize,
    max_candles: usize,
    candles: Vec<Candle>,
    /// Ticks absorbed by the open candle
    ticks_in_candle: usize,
}

impl CandleAggregator {
    pub fn new(ticks_per_candle: usize, max_candles: usize) -> Self {
        Self {
            ticks_per_candle: ticks_per_candle.max(1),
            max_candles: max_candles.max(1),
            candles: Vec::with_capacity(max_candles.max(1) + 1),
            ticks_in_candle: 0,
        }
    }

    /// Drop all history and open a single candle at `price`.
    pub fn open(&mut self, at: DateTime<Utc>, price: f64) {
        self.candles.clear();
        self.candles.push(Candle::opened_at(at, price));
        self.ticks_in_candle = 0;
    }

    /// Apply one tick. Returns `true` when this tick completed a candle and a
    /// new one was opened at `price`.
    pub fn apply_tick(&mut self, price: f64, at: DateTime<Utc>) -> bool {
        match self.candles.last_mut() {
            Some(current) => current.absorb(price),
            None => self.candles.push(Candle::opened_at(at, price)),
        }
        self.ticks_in_candle += 1;

        if self.ticks_in_candle < self.ticks_per_candle {
            return false;
        }

        self.candles.push(Candle::opened_at(at, price));
        self.ticks_in_candle = 0;
        if self.candles.len() > self.max_candles {
            let excess = self.candles.len() - self.max_candles;
            self.candles.drain(..excess);
        }
        true
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn latest_close(&self) -> Option<f64> {
        self.candles.last().map(|c| c.close)
    }

    pub fn ticks_in_candle(&self) -> usize {
        self.ticks_in_candle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candle_closes_after_fixed_tick_count() {
        let now = Utc::now();
        let mut agg = CandleAggregator::new(10, 60);
        agg.open(now, 100.0);

        let prices = [101.0, 99.0, 103.0, 98.5, 100.0, 102.0, 97.0, 100.5, 101.5, 100.2];
        for (i, &p) in prices.iter().enumerate() {
            let closed = agg.apply_tick(p, now);
            assert_eq!(closed, i == prices.len() - 1);
        }

        let candles = agg.candles();
        assert_eq!(candles.len(), 2);

        let closed = &candles[0];
        assert_eq!(closed.open, 100.0);
        assert_eq!(closed.high, 103.0);
        assert_eq!(closed.low, 97.0);
        assert_eq!(closed.close, 100.2);
        for &p in &prices {
            assert!(closed.low <= p && p <= closed.high);
        }

        let open = &candles[1];
        assert_eq!(open.open, 100.2);
        assert_eq!(open.high, 100.2);
        assert_eq!(open.low, 100.2);
        assert_eq!(agg.ticks_in_candle(), 0);
    }

    #[test]
    fn test_history_never_exceeds_cap() {
        let now = Utc::now();
        let mut agg = CandleAggregator::new(3, 5);
        agg.open(now, 10.0);

        for i in 0..500 {
            agg.apply_tick(10.0 + (i % 7) as f64, now);
            assert!(agg.candles().len() <= 5);
        }
        assert_eq!(agg.candles().len(), 5);
    }

    #[test]
    fn test_tick_without_open_candle_starts_one() {
        let now = Utc::now();
        let mut agg = CandleAggregator::new(4, 10);

        assert!(!agg.apply_tick(50.0, now));
        assert_eq!(agg.candles().len(), 1);
        assert_eq!(agg.latest_close(), Some(50.0));
        assert_eq!(agg.ticks_in_candle(), 1);
    }

    #[test]
    fn test_open_discards_history() {
        let now = Utc::now();
        let mut agg = CandleAggregator::new(1, 10);
        agg.open(now, 10.0);
        agg.apply_tick(11.0, now);
        agg.apply_tick(12.0, now);
        assert_eq!(agg.candles().len(), 3);

        agg.open(now, 20.0);
        assert_eq!(agg.candles().len(), 1);
        assert_eq!(agg.closes(), vec![20.0]);
    }
}
