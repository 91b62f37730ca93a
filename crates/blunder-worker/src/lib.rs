pub use chess_core;

pub mod analysis;
pub mod clients;
pub mod config;
pub mod error;
pub mod extractor;
pub mod oracle;
pub mod pipeline;
pub mod report;
pub mod stockfish;
pub mod walker;
