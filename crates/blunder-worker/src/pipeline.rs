//! End-to-end runs of the two pipelines

use std::time::Duration;

use chess_core::game_data::GameRecord;
use chess_core::pgn::find_player_game;
use shakmaty::Color;
use tracing::{info, warn};

use crate::clients::lichess::LichessClient;
use crate::config::{BlunderConfig, EngineSettings};
use crate::error::WorkerError;
use crate::extractor::{extract_blunders_from_pgn, AnnotatedBlunder};
use crate::stockfish::StockfishEngine;
use crate::walker::{run_with_oracle, WalkReport};

/// Pick the first game in `pgn` played by `player`.
pub fn select_game(pgn: &str, player: &str) -> Result<(GameRecord, Color), WorkerError> {
    match find_player_game(pgn, player)? {
        Some((game, side)) => {
            info!(player, white = side == Color::White, moves = game.moves.len(), "Game selected");
            Ok((game, side))
        }
        None => {
            warn!(player, "No game found for player");
            Err(WorkerError::PlayerNotFound(player.to_string()))
        }
    }
}

/// Direct pipeline. The engine is only started when the player has moves.
pub async fn run_engine(
    settings: &EngineSettings,
    config: &BlunderConfig,
    game: &GameRecord,
    side: Color,
) -> Result<WalkReport, WorkerError> {
    if game.plies_by(side) == 0 {
        info!(player = %config.player, "Player made no moves, nothing to evaluate");
        return Ok(WalkReport::default());
    }

    let engine = StockfishEngine::new(settings).await?;
    info!(path = %settings.path, depth = settings.search_depth, "Stockfish started");
    run_with_oracle(engine, game, side, config.threshold).await
}

/// Annotation pipeline: import the player's game, wait a fixed delay for
/// server analysis, export the literate PGN and extract.
pub async fn run_lichess(
    client: &LichessClient,
    pgn: &str,
    player: &str,
    wait: Duration,
) -> Result<Vec<AnnotatedBlunder>, WorkerError> {
    // Lichess imports a single game per request
    let (game, _) = select_game(pgn, player)?;
    let imported = client.import_game(&game.to_pgn()).await?;

    info!(secs = wait.as_secs(), "Waiting for Lichess analysis");
    tokio::time::sleep(wait).await;

    let literate = client.export_literate(&imported.id).await?;
    Ok(extract_blunders_from_pgn(&literate, player)?)
}
