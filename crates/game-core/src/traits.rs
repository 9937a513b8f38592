use crate::GameError;

/// Minimal durable key-value storage.
///
/// The engine only ever keeps one entry here (the high score), but the
/// interface stays string-keyed so any client-side medium can back it.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, GameError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), GameError>;
}

