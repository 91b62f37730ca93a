//! PGN loading errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PgnError {
    #[error("PGN read error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PGN contains no game")]
    Empty,

    #[error("Illegal move '{san}' at ply {ply}")]
    IllegalMove { ply: usize, san: String },

    #[error("Non-standard start position not supported: {0}")]
    NonStandardStart(String),

    #[error("Game #{index}: {source}")]
    Game {
        index: usize,
        #[source]
        source: Box<PgnError>,
    },
}
