//! Direct-evaluation pipeline: replay a game and ask the oracle about every
//! move the designated side makes.

use chess_core::game_data::{move_number, GameRecord, PlyRecord};
use serde::Serialize;
use shakmaty::fen::Fen;
use shakmaty::{Chess, Color, EnPassantMode, Position};
use tracing::{debug, info};

use crate::analysis::{is_blunder, is_missed_mate, score_drop};
use crate::error::{OracleError, WorkerError};
use crate::oracle::Oracle;

#[derive(Debug, Clone, Serialize)]
pub struct Blunder {
    pub move_number: u32,
    #[serde(serialize_with = "serialize_color")]
    pub side: Color,
    pub san: String,
    #[serde(rename = "move")]
    pub uci: String,
    pub score_before: i32,
    pub score_after: i32,
    pub score_drop: i32,
    pub fen_before: String,
    pub best_move: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MissedMate {
    pub move_number: u32,
    #[serde(serialize_with = "serialize_color")]
    pub side: Color,
    pub san: String,
    #[serde(rename = "move")]
    pub uci: String,
    pub mate_in: i32,
    pub best_move: String,
    pub fen_before: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WalkReport {
    pub blunders: Vec<Blunder>,
    pub missed_mates: Vec<MissedMate>,
    /// Designated-side moves that were evaluated
    pub evaluated_moves: usize,
}

fn serialize_color<S: serde::Serializer>(side: &Color, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(chess_core::game_data::side_name(*side))
}

fn evaluation_error(ply: usize, record: &PlyRecord, source: OracleError) -> WorkerError {
    WorkerError::Evaluation {
        move_number: move_number(ply),
        san: record.san.clone(),
        source,
    }
}

/// Walk `game`, evaluating before and after each of `side`'s moves.
/// Opponent moves are played without consulting the oracle.
pub async fn detect_blunders<O: Oracle>(
    oracle: &mut O,
    game: &GameRecord,
    side: Color,
    threshold: i32,
) -> Result<WalkReport, WorkerError> {
    let mut board = Chess::default();
    let mut report = WalkReport::default();

    for (ply, record) in game.moves.iter().enumerate() {
        if board.turn() != side {
            board.play_unchecked(record.mv.clone());
            continue;
        }

        let fen_before = Fen::from_position(&board, EnPassantMode::Legal).to_string();
        let before = oracle
            .evaluate(&board, side)
            .await
            .map_err(|e| evaluation_error(ply, record, e))?;

        board.play_unchecked(record.mv.clone());

        let after = oracle
            .evaluate(&board, side)
            .await
            .map_err(|e| evaluation_error(ply, record, e))?;

        report.evaluated_moves += 1;
        let number = move_number(ply);
        let drop = score_drop(before.score, after.score);
        debug!(
            move_number = number,
            san = %record.san,
            before = before.score,
            after = after.score,
            drop,
            "Evaluated move"
        );

        if is_missed_mate(&before, &record.uci) {
            report.missed_mates.push(MissedMate {
                move_number: number,
                side,
                san: record.san.clone(),
                uci: record.uci.clone(),
                mate_in: before.mate.unwrap_or_default(),
                best_move: before.best_move.clone().unwrap_or_default(),
                fen_before: fen_before.clone(),
            });
        }

        if is_blunder(before.score, after.score, threshold) {
            info!(move_number = number, san = %record.san, drop, "Blunder detected");
            report.blunders.push(Blunder {
                move_number: number,
                side,
                san: record.san.clone(),
                uci: record.uci.clone(),
                score_before: before.score,
                score_after: after.score,
                score_drop: drop,
                fen_before,
                best_move: before.best_move,
            });
        }
    }

    Ok(report)
}

/// Run a walk on an owned oracle session and release it afterwards,
/// whether the walk succeeded or failed.
pub async fn run_with_oracle<O: Oracle>(
    mut oracle: O,
    game: &GameRecord,
    side: Color,
    threshold: i32,
) -> Result<WalkReport, WorkerError> {
    let outcome = detect_blunders(&mut oracle, game, side, threshold).await;
    oracle.close().await;
    outcome
}
