use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Recoverable failures: reading inputs, parsing tables and caches.
///
/// Contract violations inside the DAG (conflicting node identities, malformed
/// games, inconsistent move runs) are not represented here; those panic.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("invalid FEN '{fen}': expected 6 fields, found {fields}")]
    InvalidFen { fen: String, fields: usize },

    #[error("illegal or unparsable move '{san}': {reason}")]
    San { san: String, reason: String },

    #[error("{source_name} game {game_num}: {source}")]
    IllegalMove {
        source_name: String,
        game_num: usize,
        source: Box<Error>,
    },

    #[error("{source_name} game {game_num}: bad FEN header '{fen}': {reason}")]
    BadSetup {
        source_name: String,
        game_num: usize,
        fen: String,
        reason: String,
    },

    #[error("eval cache: {0}")]
    EvalCache(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
