//! PGN parsing built on pgn-reader, replaying every move with shakmaty.

use std::fs;
use std::ops::ControlFlow;
use std::path::Path;

use pgn_reader::{RawComment, RawTag, Reader, SanPlus, Skip, Visitor};
use shakmaty::{CastlingMode, Chess, Color};
use tracing::warn;

use crate::error::PgnError;
use crate::game_data::{GameMetadata, GameRecord, PlyRecord};

const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// State during movetext parsing.
struct MovetextState {
    metadata: GameMetadata,
    board: Chess,
    moves: Vec<PlyRecord>,
}

/// One game as read: the headers always, the moves only if they replay.
struct ParsedGame {
    metadata: GameMetadata,
    moves: Result<Vec<PlyRecord>, PgnError>,
}

impl ParsedGame {
    fn into_record(self) -> Result<GameRecord, PgnError> {
        Ok(GameRecord {
            metadata: self.metadata,
            moves: self.moves?,
        })
    }
}

/// Visitor that builds a `GameRecord` from the mainline, skipping variations.
struct GameBuilder;

impl Visitor for GameBuilder {
    type Tags = GameMetadata;
    type Movetext = MovetextState;
    type Output = ParsedGame;

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        ControlFlow::Continue(GameMetadata {
            result: "*".to_string(),
            ..Default::default()
        })
    }

    fn tag(
        &mut self,
        tags: &mut Self::Tags,
        name: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Self::Output> {
        let key = String::from_utf8_lossy(name).into_owned();
        if tags.headers.contains_key(&key) {
            return ControlFlow::Continue(());
        }
        let value = value.decode_utf8_lossy().into_owned();

        match key.as_str() {
            "White" => tags.white = value.clone(),
            "Black" => tags.black = value.clone(),
            "Result" => tags.result = value.clone(),
            "Date" => tags.date = Some(value.clone()),
            "TimeControl" => tags.time_control = Some(value.clone()),
            "ECO" => tags.eco = Some(value.clone()),
            "Event" => tags.event = Some(value.clone()),
            "Site" => tags.site = Some(value.clone()),
            "Link" => tags.link = Some(value.clone()),
            _ => {}
        }
        tags.headers.insert(key, value);
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        // Move numbering and side inference assume the standard start
        let custom_start = tags
            .headers
            .get("FEN")
            .filter(|fen| fen.trim() != STANDARD_START_FEN)
            .cloned();
        if let Some(fen) = custom_start {
            return ControlFlow::Break(ParsedGame {
                metadata: tags,
                moves: Err(PgnError::NonStandardStart(fen)),
            });
        }

        ControlFlow::Continue(MovetextState {
            metadata: tags,
            board: Chess::default(),
            moves: Vec::new(),
        })
    }

    fn begin_variation(&mut self, _: &mut Self::Movetext) -> ControlFlow<Self::Output, Skip> {
        ControlFlow::Continue(Skip(true))
    }

    fn san(&mut self, state: &mut Self::Movetext, san_plus: SanPlus) -> ControlFlow<Self::Output> {
        let ply = state.moves.len();
        let mv = match san_plus.san.to_move(&state.board) {
            Ok(mv) => mv,
            Err(_) => {
                return ControlFlow::Break(ParsedGame {
                    metadata: std::mem::take(&mut state.metadata),
                    moves: Err(PgnError::IllegalMove {
                        ply,
                        san: san_plus.to_string(),
                    }),
                })
            }
        };

        let uci = mv.to_uci(CastlingMode::Standard).to_string();
        let san = SanPlus::from_move_and_play_unchecked(&mut state.board, mv.clone()).to_string();

        state.moves.push(PlyRecord {
            mv,
            san,
            uci,
            comment: None,
        });
        ControlFlow::Continue(())
    }

    fn comment(
        &mut self,
        state: &mut Self::Movetext,
        comment: RawComment<'_>,
    ) -> ControlFlow<Self::Output> {
        let text = String::from_utf8_lossy(comment.as_bytes());
        let text = text.trim();

        // A comment before the first move describes the game, not a move
        if let Some(last) = state.moves.last_mut() {
            if !text.is_empty() {
                match last.comment.as_mut() {
                    Some(existing) => {
                        existing.push(' ');
                        existing.push_str(text);
                    }
                    None => last.comment = Some(text.to_string()),
                }
            }
        }
        ControlFlow::Continue(())
    }

    fn end_game(&mut self, state: Self::Movetext) -> Self::Output {
        ParsedGame {
            metadata: state.metadata,
            moves: Ok(state.moves),
        }
    }
}

/// Parse the first game of a PGN string.
pub fn parse_pgn(pgn: &str) -> Result<GameRecord, PgnError> {
    let mut reader = Reader::new(pgn.as_bytes());
    match reader.read_game(&mut GameBuilder)? {
        Some(game) => game.into_record(),
        None => Err(PgnError::Empty),
    }
}

/// Parse every game of a (possibly multi-game) PGN string.
pub fn parse_games(pgn: &str) -> Result<Vec<GameRecord>, PgnError> {
    let mut reader = Reader::new(pgn.as_bytes());
    let mut games = Vec::new();

    while let Some(game) = reader.read_game(&mut GameBuilder)? {
        let game = game.into_record().map_err(|e| PgnError::Game {
            index: games.len() + 1,
            source: Box::new(e),
        })?;
        games.push(game);
    }

    if games.is_empty() {
        return Err(PgnError::Empty);
    }
    Ok(games)
}

/// First game in which `player` is either side, compared case-insensitively.
/// Returns `None` when no game matches.
pub fn find_game_for_player<I>(games: I, player: &str) -> Option<(GameRecord, Color)>
where
    I: IntoIterator<Item = GameRecord>,
{
    games
        .into_iter()
        .find_map(|game| game.metadata.side_of(player).map(|side| (game, side)))
}

/// Scan the games of `pgn` in order and return the first one `player` took
/// part in. Games that fail to replay are skipped when they belong to other
/// players; a broken game that matches is an error.
pub fn find_player_game(pgn: &str, player: &str) -> Result<Option<(GameRecord, Color)>, PgnError> {
    let mut reader = Reader::new(pgn.as_bytes());
    let mut index = 0;

    while let Some(game) = reader.read_game(&mut GameBuilder)? {
        index += 1;
        let Some(side) = game.metadata.side_of(player) else {
            if let Err(e) = &game.moves {
                warn!(game = index, error = %e, "Skipping unreadable game");
            }
            continue;
        };
        let record = game.into_record().map_err(|e| PgnError::Game {
            index,
            source: Box::new(e),
        })?;
        return Ok(Some((record, side)));
    }

    if index == 0 {
        return Err(PgnError::Empty);
    }
    Ok(None)
}

/// Read a PGN file and pick the first game played by `player`.
pub fn load_game_for_player(
    path: &Path,
    player: &str,
) -> Result<Option<(GameRecord, Color)>, PgnError> {
    let text = fs::read_to_string(path)?;
    find_player_game(&text, player)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_GAMES: &str = r#"[Event "First"]
[White "carol"]
[Black "dave"]
[Result "1-0"]

1. e4 e5 2. Qh5 Nc6 3. Bc4 Nf6 4. Qxf7# 1-0

[Event "Second"]
[White "Bob"]
[Black "alice"]
[Result "0-1"]

1. d4 d5 0-1
"#;

    #[test]
    fn test_parse_pgn_basic() {
        let pgn = r#"[White "Player1"]
[Black "Player2"]
[Result "1-0"]
[Date "2025.01.15"]
[TimeControl "600"]

1. e4 e5 2. Nf3 Nc6 1-0"#;

        let game = parse_pgn(pgn).unwrap();
        assert_eq!(game.metadata.white, "Player1");
        assert_eq!(game.metadata.black, "Player2");
        assert_eq!(game.metadata.result, "1-0");
        assert_eq!(game.metadata.time_control.as_deref(), Some("600"));
        assert_eq!(game.moves.len(), 4);
        assert_eq!(game.moves[0].san, "e4");
        assert_eq!(game.moves[0].uci, "e2e4");
        assert_eq!(game.moves[3].san, "Nc6");
    }

    #[test]
    fn test_comments_attach_to_preceding_move() {
        let pgn = r#"[White "a"]
[Black "b"]

{ game intro } 1. e4 { first } { second } e5 2. Nf3 *"#;

        let game = parse_pgn(pgn).unwrap();
        assert_eq!(game.moves[0].comment.as_deref(), Some("first second"));
        assert_eq!(game.moves[1].comment, None);
        assert_eq!(game.moves[2].comment, None);
    }

    #[test]
    fn test_variations_are_skipped() {
        let pgn = r#"[White "a"]
[Black "b"]

1. e4 e5 (1... c5 { Sicilian } 2. Nf3) 2. Nf3 *"#;

        let game = parse_pgn(pgn).unwrap();
        let sans: Vec<&str> = game.moves.iter().map(|m| m.san.as_str()).collect();
        assert_eq!(sans, vec!["e4", "e5", "Nf3"]);
        assert_eq!(game.moves[1].comment, None);
    }

    #[test]
    fn test_san_is_canonical_with_check_suffix() {
        let pgn = "1. e4 e5 2. Qh5 Nc6 3. Bc4 Nf6 4. Qxf7 *";
        let game = parse_pgn(pgn).unwrap();
        assert_eq!(game.moves[6].san, "Qxf7#");
    }

    #[test]
    fn test_illegal_move_is_reported_with_ply() {
        let pgn = "1. e4 e5 2. Ke3 *";
        match parse_pgn(pgn) {
            Err(PgnError::IllegalMove { ply, san }) => {
                assert_eq!(ply, 2);
                assert_eq!(san, "Ke3");
            }
            other => panic!("expected illegal move, got {other:?}"),
        }
    }

    #[test]
    fn test_non_standard_start_rejected() {
        let pgn = r#"[SetUp "1"]
[FEN "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1"]

1. e4 *"#;
        assert!(matches!(parse_pgn(pgn), Err(PgnError::NonStandardStart(_))));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(parse_pgn(""), Err(PgnError::Empty)));
        assert!(matches!(parse_games("   \n"), Err(PgnError::Empty)));
    }

    #[test]
    fn test_find_game_for_player() {
        let games = parse_games(TWO_GAMES).unwrap();
        assert_eq!(games.len(), 2);

        let (game, side) = find_game_for_player(games.clone(), "Alice").unwrap();
        assert_eq!(game.metadata.event.as_deref(), Some("Second"));
        assert_eq!(side, Color::Black);

        let (game, side) = find_game_for_player(games.clone(), "CAROL").unwrap();
        assert_eq!(game.metadata.event.as_deref(), Some("First"));
        assert_eq!(side, Color::White);

        assert!(find_game_for_player(games, "mallory").is_none());
    }

    #[test]
    fn test_scan_skips_broken_games_of_other_players() {
        let pgn = format!("[White \"x\"]\n[Black \"y\"]\n\n1. e4 e5 2. Ke3 *\n\n{TWO_GAMES}");
        let (game, side) = find_player_game(&pgn, "alice").unwrap().unwrap();
        assert_eq!(game.metadata.event.as_deref(), Some("Second"));
        assert_eq!(side, Color::Black);

        assert!(find_player_game(&pgn, "mallory").unwrap().is_none());
    }

    #[test]
    fn test_scan_reports_broken_matching_game() {
        let pgn = format!("{TWO_GAMES}\n[White \"x\"]\n[Black \"y\"]\n\n1. e4 e5 2. Ke3 *\n");
        match find_player_game(&pgn, "Y") {
            Err(PgnError::Game { index, source }) => {
                assert_eq!(index, 3);
                assert!(matches!(*source, PgnError::IllegalMove { ply: 2, .. }));
            }
            other => panic!("expected per-game error, got {other:?}"),
        }
        assert!(matches!(find_player_game("", "y"), Err(PgnError::Empty)));
    }
}
