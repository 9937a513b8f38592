use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Game loop has stopped")]
    Stopped,
}
