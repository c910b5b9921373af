use std::path::PathBuf;

use thiserror::Error;

use crate::{KeyId, LogicalAction};

/// Failure to build a total key binding table
#[derive(Error, Debug)]
pub enum BindingError {
    /// An action has no key bound to it
    #[error("No key bound to action `{0}`")]
    Missing(LogicalAction),

    /// Two actions share the same physical key
    #[error("Key `{key}` is bound to both `{first}` and `{second}`")]
    Conflict {
        key: KeyId,
        first: LogicalAction,
        second: LogicalAction,
    },

    /// The binding document could not be decoded
    #[error("Invalid binding document: {0}")]
    Parse(#[from] serde_json::Error),

    /// The binding file could not be read
    #[error("Failed to read binding file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A key name that is neither a single character nor a known special key
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown key name `{0}`")]
pub struct KeyParseError(pub String);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Tick period must be greater than zero")]
    ZeroTickPeriod,

    #[error("Invalid interval for {name}: {value} must be a finite, non-negative number of seconds")]
    InvalidInterval { name: &'static str, value: f64 },
}

/// Failure reported by a vehicle sink while delivering a command
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Vehicle link is closed")]
    Closed,
}
