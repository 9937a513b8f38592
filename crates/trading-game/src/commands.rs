use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use game_core::PositionSide;
use game_engine::GameCommand;

/// One line of player input
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    Open(PositionSide),
    Close,
    Leverage(f64),
    Timeframe(u32),
    Reset,
    Status,
    Help,
    Quit,
}

impl PlayerCommand {
    /// The engine command this maps to, `None` for commands handled locally.
    pub fn into_game_command(self) -> Option<GameCommand> {
        match self {
            PlayerCommand::Open(side) => Some(GameCommand::OpenPosition(side)),
            PlayerCommand::Close => Some(GameCommand::ClosePosition),
            PlayerCommand::Leverage(leverage) => Some(GameCommand::SetLeverage(leverage)),
            PlayerCommand::Timeframe(minutes) => Some(GameCommand::SetTimeframe(minutes)),
            PlayerCommand::Reset => Some(GameCommand::Reset),
            PlayerCommand::Status | PlayerCommand::Help | PlayerCommand::Quit => None,
        }
    }
}

impl FromStr for PlayerCommand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split_whitespace();
        let verb = parts
            .next()
            .ok_or_else(|| anyhow!("Empty command"))?
            .to_ascii_lowercase();
        let arg = parts.next();
        if parts.next().is_some() {
            bail!("Too many arguments in '{}'", s.trim());
        }

        let command = match (verb.as_str(), arg) {
            ("long" | "buy" | "short" | "sell", None) => PlayerCommand::Open(verb.parse()?),
            ("close" | "c", None) => PlayerCommand::Close,
            ("lev" | "leverage", Some(n)) => PlayerCommand::Leverage(
                n.trim_end_matches(['x', 'X'])
                    .parse()
                    .with_context(|| format!("Invalid leverage '{}'", n))?,
            ),
            ("tf" | "timeframe", Some(n)) => PlayerCommand::Timeframe(
                n.trim_end_matches(['m', 'M'])
                    .parse()
                    .with_context(|| format!("Invalid timeframe '{}'", n))?,
            ),
            ("reset" | "r", None) => PlayerCommand::Reset,
            ("status" | "s", None) => PlayerCommand::Status,
            ("help" | "h" | "?", None) => PlayerCommand::Help,
            ("quit" | "q" | "exit", None) => PlayerCommand::Quit,
            ("lev" | "leverage" | "tf" | "timeframe", None) => {
                bail!("'{}' needs a value, e.g. '{} 5'", verb, verb)
            }
            (_, Some(_)) if is_known(&verb) => bail!("'{}' takes no argument", verb),
            _ => bail!("Unknown command '{}' (type 'help')", verb),
        };
        Ok(command)
    }
}

fn is_known(verb: &str) -> bool {
    matches!(
        verb,
        "long"
            | "buy"
            | "short"
            | "sell"
            | "close"
            | "c"
            | "reset"
            | "r"
            | "status"
            | "s"
            | "help"
            | "h"
            | "?"
            | "quit"
            | "q"
            | "exit"
    )
}

pub const HELP: &str = "\
Commands:
  long | short      open a position at the current price
  close             close the open position
  lev <n>           set leverage (flat only), e.g. 'lev 25'
  tf <minutes>      set the Fibonacci timeframe (flat only), e.g. 'tf 5'
  reset             start a new game
  status            show the current state
  quit              exit";
