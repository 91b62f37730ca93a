use std::collections::BTreeMap;
use std::fmt::Write;

use serde::{Deserialize, Serialize};
use shakmaty::{Color, Move};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameMetadata {
    pub white: String,
    pub black: String,
    pub result: String, // "1-0", "0-1", "1/2-1/2", "*"
    pub date: Option<String>,
    pub time_control: Option<String>,
    pub eco: Option<String>,
    pub event: Option<String>,
    pub site: Option<String>,
    pub link: Option<String>,
    /// Every header as it appeared, first value wins on duplicates.
    pub headers: BTreeMap<String, String>,
}

impl GameMetadata {
    /// Which side `player` played, matching header names case-insensitively.
    /// White is checked first, so a self-play record resolves to White.
    pub fn side_of(&self, player: &str) -> Option<Color> {
        let player = player.to_lowercase();
        if self.white.to_lowercase() == player {
            Some(Color::White)
        } else if self.black.to_lowercase() == player {
            Some(Color::Black)
        } else {
            None
        }
    }
}

/// A single half-move as read from movetext.
#[derive(Debug, Clone)]
pub struct PlyRecord {
    pub mv: Move,
    /// SAN rendered from the position before the move, with `+`/`#` suffix.
    pub san: String,
    pub uci: String,
    /// Comments following the move, joined with a single space.
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GameRecord {
    pub metadata: GameMetadata,
    pub moves: Vec<PlyRecord>,
}

impl GameRecord {
    /// Number of half-moves played by `side`.
    pub fn plies_by(&self, side: Color) -> usize {
        (0..self.moves.len()).filter(|&ply| side_to_move(ply) == side).count()
    }

    /// Render the headers and mainline as standalone PGN. Comments are dropped.
    pub fn to_pgn(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.metadata.headers {
            let value = value.replace('\\', "\\\\").replace('"', "\\\"");
            let _ = writeln!(out, "[{key} \"{value}\"]");
        }
        out.push('\n');

        for (ply, record) in self.moves.iter().enumerate() {
            if side_to_move(ply) == Color::White {
                let _ = write!(out, "{} ", move_prefix(move_number(ply), Color::White));
            }
            out.push_str(&record.san);
            out.push(' ');
        }
        out.push_str(&self.metadata.result);
        out.push('\n');
        out
    }
}

/// Full-move number of the zero-based `ply` (White's first move is ply 0).
pub fn move_number(ply: usize) -> u32 {
    (ply / 2 + 1) as u32
}

/// Side making the zero-based `ply` from the standard start.
pub fn side_to_move(ply: usize) -> Color {
    if ply % 2 == 0 {
        Color::White
    } else {
        Color::Black
    }
}

/// Move number prefix: `"12."` for White, `"12..."` for Black.
pub fn move_prefix(number: u32, side: Color) -> String {
    match side {
        Color::White => format!("{number}."),
        Color::Black => format!("{number}..."),
    }
}

pub fn side_name(side: Color) -> &'static str {
    match side {
        Color::White => "White",
        Color::Black => "Black",
    }
}
