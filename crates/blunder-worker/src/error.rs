//! Worker error types

use chess_core::error::PgnError;
use thiserror::Error;

/// Failures of the move-search oracle (the engine process).
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Failed to spawn engine '{path}': {source}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Engine exited unexpectedly")]
    Exited,

    #[error("Engine protocol error: {0}")]
    Protocol(String),
}

/// Failures talking to the Lichess API.
#[derive(Error, Debug)]
pub enum LichessError {
    #[error("Lichess {stage} request failed: {source}")]
    Transport {
        stage: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("Lichess {stage} returned HTTP {status}: {body}")]
    Status {
        stage: &'static str,
        status: u16,
        body: String,
    },

    #[error("Lichess import succeeded but returned no game id")]
    MissingGameId,
}

/// Failures of the annotation extractor.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Annotated PGN could not be parsed: {0}")]
    Parse(#[from] PgnError),

    #[error("Player '{0}' not found in game headers")]
    PlayerNotIdentified(String),
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("PGN error: {0}")]
    Pgn(#[from] PgnError),

    #[error("Player '{0}' not found in any game")]
    PlayerNotFound(String),

    #[error("Engine error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Evaluation failed at move {move_number} ({san}): {source}")]
    Evaluation {
        move_number: u32,
        san: String,
        #[source]
        source: OracleError,
    },

    #[error("{0}")]
    Lichess(#[from] LichessError),

    #[error("Chess.com error: {0}")]
    ChessCom(String),
}

impl From<ExtractError> for WorkerError {
    fn from(e: ExtractError) -> Self {
        match e {
            ExtractError::Parse(e) => WorkerError::Pgn(e),
            ExtractError::PlayerNotIdentified(player) => WorkerError::PlayerNotFound(player),
        }
    }
}
