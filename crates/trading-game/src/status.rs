use std::fmt::Write;

use game_core::{GamePhase, GameSnapshot};
use technical_analysis::fib_extensions;

/// One-line summary logged whenever a candle closes.
pub fn candle_line(snapshot: &GameSnapshot) -> String {
    let state = &snapshot.game_state;
    let rsi = snapshot
        .latest_rsi()
        .map(|v| format!("{:.1}", v))
        .unwrap_or_else(|| "-".to_string());

    let mut line = format!(
        "${:.2} | RSI {} | balance ${:.2} | score {}",
        snapshot.current_price, rsi, state.balance, state.score
    );
    if let Some(position) = &state.position {
        let _ = write!(
            line,
            " | {} {:.0}x PnL ${:+.2}",
            position.side, position.leverage, state.pnl
        );
    }
    line
}

/// Multi-line view of the latest snapshot for the `status` command.
pub fn render_status(snapshot: &GameSnapshot) -> String {
    let state = &snapshot.game_state;
    let mut out = String::new();

    let _ = writeln!(out, "Price:      ${:.2}", snapshot.current_price);
    let _ = writeln!(out, "Phase:      {}", snapshot.phase());
    let _ = writeln!(out, "Balance:    ${:.2}", state.balance);
    let _ = writeln!(out, "Score:      {} (high {})", state.score, state.high_score);
    let _ = writeln!(
        out,
        "Settings:   {:.0}x leverage, {}m timeframe",
        snapshot.leverage, snapshot.timeframe_minutes
    );

    match &state.position {
        Some(position) => {
            let _ = writeln!(
                out,
                "Position:   {} {:.0}x, ${:.2} @ ${:.2}, PnL ${:+.2}",
                position.side, position.leverage, position.size, position.entry_price, state.pnl
            );
            match snapshot.liquidation_price {
                Some(price) => {
                    let _ = writeln!(out, "Liquidation: ${:.2}", price);
                }
                None => {
                    let _ = writeln!(out, "Liquidation: unreachable");
                }
            }
        }
        None if snapshot.phase() == GamePhase::GameOver => {
            let _ = writeln!(out, "Position:   liquidated, type 'reset' to play again");
        }
        None => {
            let _ = writeln!(out, "Position:   flat");
        }
    }

    if let Some(rsi) = snapshot.latest_rsi() {
        let zone = if rsi >= 70.0 {
            " (overbought)"
        } else if rsi <= 30.0 {
            " (oversold)"
        } else {
            ""
        };
        let _ = writeln!(out, "RSI:        {:.1}{}", rsi, zone);
    }
    if let Some(Some(histogram)) = snapshot.macd.histogram.last() {
        let _ = writeln!(out, "MACD hist:  {:+.2}", histogram);
    }

    let glowing: Vec<String> = snapshot
        .fib_levels
        .iter()
        .filter(|l| l.is_glowing)
        .map(|l| format!("{} ${:.2}", l.label, l.price))
        .collect();
    if !glowing.is_empty() {
        let _ = writeln!(out, "Fib glow:   {}", glowing.join(", "));
    }

    if let (Some(high), Some(low)) = (snapshot.fib_levels.first(), snapshot.fib_levels.last()) {
        if high.price > low.price {
            let targets: Vec<String> = fib_extensions(low.price, high.price)
                .iter()
                .skip(1)
                .map(|e| format!("{} ${:.2}", e.label, e.price))
                .collect();
            let _ = writeln!(out, "Fib ext:    {}", targets.join(", "));
        }
    }

    out.trim_end().to_string()
}
