//! Blunder scanner
//!
//! Finds the moves where a player's evaluation dropped sharply, either by
//! running a local Stockfish over the game or by reading the judgments
//! Lichess attaches to an imported game.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use blunder_worker::clients::chess_com::{ChessComClient, CHESS_COM_API};
use blunder_worker::clients::lichess::LichessClient;
use blunder_worker::config::{Overrides, WorkerConfig};
use blunder_worker::error::WorkerError;
use blunder_worker::extractor::extract_blunders_from_pgn;
use blunder_worker::{pipeline, report};

#[derive(Parser, Debug)]
#[command(name = "blunder-scan")]
#[command(about = "Find the moves where a player blundered")]
#[command(version)]
struct Cli {
    /// Print results as JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate the player's moves with a local UCI engine
    Engine {
        #[command(flatten)]
        source: SourceArgs,

        /// Minimum evaluation drop in centipawns
        #[arg(long)]
        threshold: Option<i32>,

        /// Engine search depth per position
        #[arg(long)]
        depth: Option<u32>,

        /// Path to the Stockfish binary
        #[arg(long)]
        stockfish: Option<String>,
    },
    /// Import the game to Lichess and read back its annotated blunders
    Lichess {
        #[command(flatten)]
        source: SourceArgs,

        /// Seconds to wait for Lichess server analysis
        #[arg(long)]
        wait: Option<u64>,
    },
    /// Read blunders from an already-annotated (literate) PGN file
    Literate {
        /// Annotated PGN file
        #[arg(long)]
        pgn: PathBuf,

        /// Player name as written in the White/Black headers
        #[arg(long)]
        player: Option<String>,
    },
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// PGN file to analyze
    #[arg(long, required_unless_present = "chess_com", conflicts_with = "chess_com")]
    pgn: Option<PathBuf>,

    /// Use the player's newest Chess.com game instead of a file
    #[arg(long)]
    chess_com: bool,

    /// Player name as written in the White/Black headers
    #[arg(long)]
    player: Option<String>,
}

/// Read the input PGN from a file or from Chess.com.
async fn read_source(source: &SourceArgs, player: &str) -> anyhow::Result<String> {
    if let Some(path) = &source.pgn {
        info!(path = %path.display(), "Reading PGN file");
        return fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()));
    }

    let client = ChessComClient::new(CHESS_COM_API).map_err(WorkerError::ChessCom)?;
    client
        .latest_game_pgn(player)
        .await
        .map_err(WorkerError::ChessCom)?
        .ok_or_else(|| anyhow::anyhow!("No Chess.com game found for {player}"))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Engine {
            source,
            threshold,
            depth,
            stockfish,
        } => {
            let config = WorkerConfig::load().apply(Overrides {
                player: source.player.clone(),
                threshold,
                search_depth: depth,
                stockfish_path: stockfish,
                analysis_wait_secs: None,
            });
            let blunder_config = config.blunder_config()?;
            info!(
                player = %blunder_config.player,
                threshold = blunder_config.threshold,
                depth = blunder_config.search_depth,
                "Engine mode"
            );

            let pgn = read_source(&source, &blunder_config.player).await?;
            let (game, side) = pipeline::select_game(&pgn, &blunder_config.player)?;
            let walk =
                pipeline::run_engine(&config.engine_settings(), &blunder_config, &game, side)
                    .await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&walk)?);
            } else {
                print!(
                    "{}",
                    report::render_engine_report(&blunder_config.player, side, blunder_config.threshold, &walk)
                );
            }
        }
        Command::Lichess { source, wait } => {
            let config = WorkerConfig::load().apply(Overrides {
                player: source.player.clone(),
                analysis_wait_secs: wait,
                ..Default::default()
            });
            let blunder_config = config.blunder_config()?;

            let pgn = read_source(&source, &blunder_config.player).await?;
            let client = LichessClient::new(&config.lichess_base_url, config.lichess_token.clone())
                .map_err(WorkerError::from)?;
            let blunders =
                pipeline::run_lichess(&client, pgn.trim(), &blunder_config.player, config.analysis_wait)
                    .await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&blunders)?);
            } else {
                print!("{}", report::render_annotation_report(&blunder_config.player, &blunders));
            }
        }
        Command::Literate { pgn, player } => {
            let config = WorkerConfig::load().apply(Overrides {
                player,
                ..Default::default()
            });
            let blunder_config = config.blunder_config()?;

            let text = fs::read_to_string(&pgn)
                .with_context(|| format!("Failed to read {}", pgn.display()))?;
            let blunders = extract_blunders_from_pgn(&text, &blunder_config.player)
                .map_err(WorkerError::from)?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&blunders)?);
            } else {
                print!("{}", report::render_annotation_report(&blunder_config.player, &blunders));
            }
        }
    }

    Ok(())
}
