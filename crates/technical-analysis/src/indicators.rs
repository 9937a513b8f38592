use game_core::MacdSeries;

/// Exponential Moving Average
///
/// Recursive form seeded at the first value: `ema[0] = data[0]`,
/// `ema[i] = data[i] * k + ema[i - 1] * (1 - k)` with `k = 2 / (period + 1)`.
/// Entries before `period - 1` are warm-up and come back as `None`.
pub fn ema(data: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; data.len()];
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut result = Vec::with_capacity(data.len());
    let mut prev: Option<f64> = None;

    for (i, &price) in data.iter().enumerate() {
        let ema_val = match prev {
            None => price,
            Some(p) => price * multiplier + p * (1.0 - multiplier),
        };
        prev = Some(ema_val);
        result.push(if i + 1 >= period { Some(ema_val) } else { None });
    }

    result
}

/// Relative Strength Index
///
/// Plain averages over the trailing `period` close-to-close changes. The
/// output has one entry per input value and is `None` until `period + 1`
/// values exist. A window without losses reads 100.
pub fn rsi(data: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut rsi_values = vec![None; data.len()];
    if period == 0 || data.len() < period + 1 {
        return rsi_values;
    }

    for i in period..data.len() {
        let mut gains = 0.0;
        let mut losses = 0.0;

        for pair in data[i - period..=i].windows(2) {
            let change = pair[1] - pair[0];
            if change > 0.0 {
                gains += change;
            } else {
                losses += change.abs();
            }
        }

        let avg_gain = gains / period as f64;
        let avg_loss = losses / period as f64;

        let rsi = if avg_loss == 0.0 {
            100.0
        } else {
            let rs = avg_gain / avg_loss;
            100.0 - (100.0 / (1.0 + rs))
        };
        rsi_values[i] = Some(rsi);
    }

    rsi_values
}

/// MACD (Moving Average Convergence Divergence)
///
/// All three lines share the input's indexing. The signal EMA only runs over
/// the stretch where the MACD line itself is defined.
pub fn macd(data: &[f64], fast_period: usize, slow_period: usize, signal_period: usize) -> MacdSeries {
    let n = data.len();
    if fast_period == 0 || slow_period == 0 || signal_period == 0 || slow_period < fast_period {
        return MacdSeries {
            macd: vec![None; n],
            signal: vec![None; n],
            histogram: vec![None; n],
        };
    }

    let ema_fast = ema(data, fast_period);
    let ema_slow = ema(data, slow_period);

    let macd_line: Vec<Option<f64>> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(fast, slow)| match (fast, slow) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();

    let mut signal_line = vec![None; n];
    if let Some(start) = macd_line.iter().position(Option::is_some) {
        let defined: Vec<f64> = macd_line[start..].iter().flatten().copied().collect();
        for (offset, value) in ema(&defined, signal_period).into_iter().enumerate() {
            signal_line[start + offset] = value;
        }
    }

    let histogram = macd_line
        .iter()
        .zip(&signal_line)
        .map(|(m, s)| match (m, s) {
            (Some(m), Some(s)) => Some(m - s),
            _ => None,
        })
        .collect();

    MacdSeries {
        macd: macd_line,
        signal: signal_line,
        histogram,
    }
}

/// Keep only the last `len` entries of a series. Display-only; the
/// calculation must already have happened over the full history.
pub fn trim_tail<T: Clone>(series: &[T], len: usize) -> Vec<T> {
    series[series.len().saturating_sub(len)..].to_vec()
}

/// Trim every MACD line to the same tail so they stay aligned.
pub fn trim_macd(series: &MacdSeries, len: usize) -> MacdSeries {
    MacdSeries {
        macd: trim_tail(&series.macd, len),
        signal: trim_tail(&series.signal, len),
        histogram: trim_tail(&series.histogram, len),
    }
}
