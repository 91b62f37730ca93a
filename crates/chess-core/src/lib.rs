pub mod annotation;
pub mod error;
pub mod game_data;
pub mod pgn;
