use anyhow::Result;
use game_core::GameSnapshot;
use game_engine::{spawn_game, GameCommand, GameCommander, GameConfig, GameEngine, JsonFileStore};
use tokio::io::{AsyncBufReadExt, BufReader};

mod commands;
mod session;
mod status;

use commands::{PlayerCommand, HELP};
use session::SessionStats;
use status::{candle_line, render_status};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load .env, init tracing
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    // Panic hook: log panic info before crashing
    std::panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
        tracing::error!("PANIC: {info}");
    }));

    tracing::info!("Starting Leverage Arcade");

    // 2. Load configuration
    let config = GameConfig::from_env()?;
    tracing::info!("Configuration loaded and validated");
    tracing::info!("  Starting balance: ${:.2}", config.initial_balance);
    tracing::info!("  Starting price: ${:.2}", config.start_price);
    tracing::info!(
        "  Tick: {}ms, {} ticks per candle, {} candles kept",
        config.tick_interval_ms,
        config.ticks_per_candle,
        config.max_candles
    );
    if let Some(seed) = config.rng_seed {
        tracing::info!("  Deterministic price feed (seed {})", seed);
    }

    // 3. High score store
    let store_path = match &config.high_score_path {
        Some(path) => path.clone(),
        None => JsonFileStore::default_path()?,
    };
    let store = JsonFileStore::new(store_path);
    tracing::info!("High score store: {}", store.path().display());

    // 4. Engine + scheduler
    let tick_interval = config.tick_interval();
    let engine = GameEngine::new(config, Box::new(store));
    let handle = spawn_game(engine, tick_interval);
    let commander = handle.commander();
    let mut snapshots = handle.subscribe();
    let mut last = snapshots.borrow_and_update().clone();
    let mut stats = SessionStats::default();

    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    // 5. Input + snapshot loop with graceful shutdown
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        tracing::info!("Input closed");
                        break;
                    }
                    Err(e) => {
                        tracing::error!("Failed to read input: {}", e);
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }

                match line.parse::<PlayerCommand>() {
                    Ok(PlayerCommand::Quit) => break,
                    Ok(PlayerCommand::Status) => println!("{}", render_status(&handle.snapshot())),
                    Ok(PlayerCommand::Help) => println!("{HELP}"),
                    Ok(command) => {
                        if let Some(command) = command.into_game_command() {
                            if !forward_command(&commander, command).await {
                                break;
                            }
                        }
                    }
                    Err(e) => tracing::warn!("{:#}", e),
                }
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    tracing::error!("Game loop stopped unexpectedly");
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                report_transition(&last, &snapshot);
                stats.observe(&last, &snapshot);
                last = snapshot;
            }
            _ = &mut shutdown => {
                tracing::info!("Shutdown signal received, exiting gracefully...");
                break;
            }
        }
    }

    handle.shutdown().await;
    stats.log_summary();
    tracing::info!("Leverage Arcade shut down.");
    Ok(())
}

/// Send `command` to the game loop. `false` once the loop is gone.
async fn forward_command(commander: &GameCommander, command: GameCommand) -> bool {
    match commander.send(command).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("Cannot reach the game loop: {}", e);
            false
        }
    }
}

/// Log candle closes and the game-over transition between two snapshots.
fn report_transition(prev: &GameSnapshot, next: &GameSnapshot) {
    if next.tick < prev.tick {
        tracing::info!("New game: {}", candle_line(next));
        return;
    }

    let prev_open = prev.candles.last().map(|c| c.open_time);
    let next_open = next.candles.last().map(|c| c.open_time);
    if next.tick > prev.tick && prev_open != next_open {
        tracing::info!("{}", candle_line(next));
    }

    if !prev.game_state.is_game_over && next.game_state.is_game_over {
        tracing::warn!(
            "*** GAME OVER *** score {} | high score {} | type 'reset' to play again",
            next.game_state.score,
            next.game_state.high_score
        );
    }
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            tracing::warn!("Cannot listen for SIGTERM: {}", e);
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Received SIGINT");
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received SIGINT");
        }
        _ = sigterm.recv() => {
            tracing::info!("Received SIGTERM");
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Received Ctrl-C");
}
