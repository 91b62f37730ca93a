//! Annotation-extraction pipeline: pick the designated player's moves that the
//! annotation service already labelled as blunders.

use std::fmt;

use chess_core::annotation::{Annotation, Severity};
use chess_core::game_data::{move_number, move_prefix, side_to_move, GameRecord};
use chess_core::pgn::find_player_game;
use serde::Serialize;
use shakmaty::Color;
use tracing::{debug, warn};

use crate::error::ExtractError;

#[derive(Debug, Clone, Serialize)]
pub struct AnnotatedBlunder {
    pub move_number: u32,
    pub white: bool,
    pub san: String,
    /// Original comment, trimmed
    pub comment: String,
    pub annotation: Annotation,
    /// `"<n>. <san>: <comment>"` or `"<n>... <san>: <comment>"`
    pub text: String,
}

impl fmt::Display for AnnotatedBlunder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Moves by `player` whose comment carries the `Blunder` label, in game order.
pub fn extract_blunders(
    game: &GameRecord,
    player: &str,
) -> Result<Vec<AnnotatedBlunder>, ExtractError> {
    let side = game.metadata.side_of(player).ok_or_else(|| {
        warn!(player, white = %game.metadata.white, black = %game.metadata.black, "Player not in headers");
        ExtractError::PlayerNotIdentified(player.to_string())
    })?;
    debug!(player, white = side == Color::White, "Identified player side");

    let mut blunders = Vec::new();
    for (ply, record) in game.moves.iter().enumerate() {
        if side_to_move(ply) != side {
            continue;
        }
        let Some(comment) = record.comment.as_deref() else {
            continue;
        };

        let annotation = Annotation::parse(comment);
        if annotation.severity != Severity::Blunder {
            continue;
        }

        let number = move_number(ply);
        let comment = comment.trim().to_string();
        let text = format!("{} {}: {}", move_prefix(number, side), record.san, comment);
        blunders.push(AnnotatedBlunder {
            move_number: number,
            white: side == Color::White,
            san: record.san.clone(),
            comment,
            annotation,
            text,
        });
    }

    Ok(blunders)
}

/// Pick `player`'s first game out of literate PGN text, then extract.
/// Malformed or empty input is an `ExtractError::Parse` and yields no blunders.
pub fn extract_blunders_from_pgn(
    pgn: &str,
    player: &str,
) -> Result<Vec<AnnotatedBlunder>, ExtractError> {
    match find_player_game(pgn, player)? {
        Some((game, _)) => extract_blunders(&game, player),
        None => {
            warn!(player, "Player not in any annotated game");
            Err(ExtractError::PlayerNotIdentified(player.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LITERATE: &str = r#"[Event "Rated blitz game"]
[White "Honorable_Knight00"]
[Black "opponent"]
[Result "0-1"]

1. e4 { [%eval 0.17] } 1... e5 2. Qh5 Nc6 3. Bc4 g6 { (0.30 → 2.10) Mistake. Nf6 was best. }
4. Qf3 { (0.40 → -3.10) Blunder. Qe2 was best. } 4... Nf6 5. Qb3 { Inaccuracy. } 5... Nd4 0-1"#;

    #[test]
    fn test_extracts_only_designated_blunders() {
        let blunders = extract_blunders_from_pgn(LITERATE, "honorable_knight00").unwrap();
        let texts: Vec<&str> = blunders.iter().map(|b| b.text.as_str()).collect();
        assert_eq!(texts, vec!["4. Qf3: (0.40 → -3.10) Blunder. Qe2 was best."]);
        assert_eq!(blunders[0].move_number, 4);
        assert!(blunders[0].white);
        assert_eq!(blunders[0].annotation.best_move.as_deref(), Some("Qe2"));
    }

    #[test]
    fn test_opponent_labels_ignored() {
        // Black's only labelled move is a Mistake
        let blunders = extract_blunders_from_pgn(LITERATE, "OPPONENT").unwrap();
        assert!(blunders.is_empty());
    }

    #[test]
    fn test_unknown_player() {
        let err = extract_blunders_from_pgn(LITERATE, "someone_else").unwrap_err();
        assert!(matches!(err, ExtractError::PlayerNotIdentified(p) if p == "someone_else"));
    }

    #[test]
    fn test_player_game_found_after_other_games() {
        let pgn = format!("[White \"a\"]\n[Black \"b\"]\n\n1. d4 {{ Blunder. }} *\n\n{LITERATE}");
        let blunders = extract_blunders_from_pgn(&pgn, "Honorable_Knight00").unwrap();
        assert_eq!(blunders.len(), 1);
        assert_eq!(blunders[0].san, "Qf3");
    }

    #[test]
    fn test_malformed_input() {
        assert!(matches!(
            extract_blunders_from_pgn("", "x"),
            Err(ExtractError::Parse(_))
        ));
        assert!(matches!(
            extract_blunders_from_pgn("[White \"x\"]\n\n1. e4 e5 2. Ke3 *", "x"),
            Err(ExtractError::Parse(_))
        ));
    }
}
