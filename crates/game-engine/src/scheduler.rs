//! Tick Scheduler
//!
//! One tokio task owns the [`GameEngine`]. Ticks and player commands are
//! handled one at a time inside the same `select!` loop, so neither ever
//! observes the other half-applied. Every step publishes a fresh
//! [`GameSnapshot`] on a watch channel.

use std::time::Duration;

use game_core::{GameError, GameSnapshot, PositionSide};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::engine::GameEngine;

const COMMAND_BUFFER: usize = 64;

/// Player actions accepted by the game loop
#[derive(Debug, Clone, PartialEq)]
pub enum GameCommand {
    OpenPosition(PositionSide),
    ClosePosition,
    SetLeverage(f64),
    SetTimeframe(u32),
    Reset,
    Shutdown,
}

/// Cloneable sender for [`GameCommand`]s
#[derive(Debug, Clone)]
pub struct GameCommander {
    tx: mpsc::Sender<GameCommand>,
}

impl GameCommander {
    pub async fn send(&self, command: GameCommand) -> Result<(), GameError> {
        self.tx.send(command).await.map_err(|_| GameError::Stopped)
    }

    pub async fn open_position(&self, side: PositionSide) -> Result<(), GameError> {
        self.send(GameCommand::OpenPosition(side)).await
    }

    pub async fn close_position(&self) -> Result<(), GameError> {
        self.send(GameCommand::ClosePosition).await
    }

    pub async fn set_leverage(&self, leverage: f64) -> Result<(), GameError> {
        self.send(GameCommand::SetLeverage(leverage)).await
    }

    pub async fn set_timeframe(&self, minutes: u32) -> Result<(), GameError> {
        self.send(GameCommand::SetTimeframe(minutes)).await
    }

    pub async fn reset(&self) -> Result<(), GameError> {
        self.send(GameCommand::Reset).await
    }
}

/// Owner-side handle of a running game loop
pub struct GameHandle {
    commander: GameCommander,
    snapshots: watch::Receiver<GameSnapshot>,
    task: JoinHandle<()>,
}

impl GameHandle {
    pub fn commander(&self) -> GameCommander {
        self.commander.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<GameSnapshot> {
        self.snapshots.clone()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> GameSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Stop the loop and wait for it to finish.
    pub async fn shutdown(self) {
        // Already gone if the send fails
        let _ = self.commander.send(GameCommand::Shutdown).await;
        if let Err(e) = self.task.await {
            tracing::error!("Game loop task failed: {}", e);
        }
    }
}

/// Move `engine` into a dedicated task ticking every `tick_interval`.
pub fn spawn_game(engine: GameEngine, tick_interval: Duration) -> GameHandle {
    let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
    let (snapshot_tx, snapshot_rx) = watch::channel(engine.snapshot());

    let task = tokio::spawn(run_game_loop(engine, tick_interval, rx, snapshot_tx));

    GameHandle {
        commander: GameCommander { tx },
        snapshots: snapshot_rx,
        task,
    }
}

async fn run_game_loop(
    mut engine: GameEngine,
    tick_interval: Duration,
    mut commands: mpsc::Receiver<GameCommand>,
    snapshots: watch::Sender<GameSnapshot>,
) {
    let mut ticker = (!engine.is_game_over()).then(|| new_ticker(tick_interval));
    tracing::info!("Game loop started ({}ms ticks)", tick_interval.as_millis());

    loop {
        tokio::select! {
            _ = next_tick(&mut ticker) => {
                engine.tick();
            }
            command = commands.recv() => {
                match command {
                    None | Some(GameCommand::Shutdown) => break,
                    Some(GameCommand::Reset) => {
                        engine.reset_game();
                        // Replace, never stack, the timer
                        ticker = Some(new_ticker(tick_interval));
                    }
                    Some(command) => apply_command(&mut engine, command),
                }
            }
        }

        if engine.is_game_over() && ticker.is_some() {
            ticker = None;
            tracing::info!("Game over, tick scheduler stopped");
        }
        snapshots.send_replace(engine.snapshot());
    }

    tracing::info!("Game loop stopped");
}

fn apply_command(engine: &mut GameEngine, command: GameCommand) {
    match command {
        GameCommand::OpenPosition(side) => engine.open_position(side),
        GameCommand::ClosePosition => engine.close_position(),
        GameCommand::SetLeverage(leverage) => engine.set_leverage(leverage),
        GameCommand::SetTimeframe(minutes) => engine.set_timeframe(minutes),
        // Handled by the loop itself
        GameCommand::Reset | GameCommand::Shutdown => {}
    }
}

fn new_ticker(period: Duration) -> Interval {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

/// Resolves on the next tick, or never when the scheduler is stopped.
async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
