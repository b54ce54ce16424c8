//! Error types for the state transition engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("atomic slot {index} out of range (slot count {count})")]
    SlotOutOfRange { index: usize, count: usize },

    #[error("invalid gesture sequence: {0}")]
    InvalidSequence(&'static str),

    #[error("state handler `{handler}` failed: {reason}")]
    Handler { handler: &'static str, reason: String },

    #[error("animation group already started, members can no longer be added")]
    GroupSealed,

    #[error("config parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("gesture script error: {0}")]
    Script(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
