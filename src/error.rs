// Error types shared by the library modules. The command layer wraps these
// in `anyhow` with extra context; library code keeps them typed so callers
// (and tests) can match on what went wrong.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while talking to Pocket or mirroring a list.
#[derive(Debug, Error)]
pub enum PocketError {
    /// The OAuth flow did not finish (user declined or never authorized).
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The API answered with a non-success status. `message` is the
    /// `X-Error` header when the server sent one.
    #[error("Pocket API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("could not decode API response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Reading an answer from the terminal failed.
    #[error("could not read from the terminal: {0}")]
    Prompt(#[source] io::Error),

    /// No saved item has the given URL as resolved or given URL.
    #[error("no saved item matches {0}")]
    ItemNotFound(String),

    #[error("item {item_id} has unrecognized status {value}")]
    UnknownStatus { item_id: String, value: i64 },

    #[error("item {item_id} has unrecognized has_video value {value}")]
    UnknownVideoFlag { item_id: String, value: i64 },

    #[error("item {item_id} has an out-of-range time_added {value}")]
    InvalidTimestamp { item_id: String, value: i64 },

    #[error("failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PocketError {
    /// Helper for wrapping filesystem errors with the path they happened on.
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        PocketError::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PocketError>;
