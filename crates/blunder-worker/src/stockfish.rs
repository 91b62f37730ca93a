//! Stockfish engine wrapper using UCI protocol (async I/O)

use std::process::Stdio;

use shakmaty::fen::Fen;
use shakmaty::{Chess, Color, EnPassantMode, Position};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::debug;

use crate::config::EngineSettings;
use crate::error::OracleError;
use crate::oracle::{Evaluation, Oracle, Score};

/// Result of a single position search, relative to the side to move
#[derive(Debug, Clone)]
pub struct EvalResult {
    pub score: Option<Score>,
    /// Best move in UCI notation, `None` when the position has no legal moves
    pub best_move: Option<String>,
}

/// Stockfish engine instance
pub struct StockfishEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    depth: u32,
    closed: bool,
}

impl StockfishEngine {
    /// Spawn a new Stockfish process and initialize UCI
    pub async fn new(settings: &EngineSettings) -> Result<Self, OracleError> {
        let mut process = Command::new(&settings.path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| OracleError::Spawn {
                path: settings.path.clone(),
                source,
            })?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| OracleError::Protocol("engine stdin not captured".into()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| OracleError::Protocol("engine stdout not captured".into()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout: BufReader::new(stdout),
            depth: settings.search_depth,
            closed: false,
        };

        // Initialize UCI
        engine.send("uci").await?;
        engine.wait_for("uciok").await?;

        // Configure for analysis
        engine
            .send(&format!("setoption name Threads value {}", settings.threads))
            .await?;
        engine
            .send(&format!("setoption name Hash value {}", settings.hash_mb))
            .await?;
        engine.send("setoption name UCI_AnalyseMode value true").await?;
        engine.send("ucinewgame").await?;
        engine.send("isready").await?;
        engine.wait_for("readyok").await?;

        debug!(path = %settings.path, depth = settings.search_depth, "Engine ready");
        Ok(engine)
    }

    /// Send a command to Stockfish
    async fn send(&mut self, cmd: &str) -> Result<(), OracleError> {
        debug!(cmd, "SF <");
        self.stdin.write_all(format!("{cmd}\n").as_bytes()).await?;
        self.stdin.flush().await?;
        Ok(())
    }

    /// Read one trimmed line, failing if the process closed its output
    async fn read_line(&mut self, line: &mut String) -> Result<(), OracleError> {
        line.clear();
        let read = self.stdout.read_line(line).await?;
        if read == 0 {
            return Err(OracleError::Exited);
        }
        debug!(line = line.trim(), "SF >");
        Ok(())
    }

    /// Wait for a specific response line
    async fn wait_for(&mut self, expected: &str) -> Result<(), OracleError> {
        let mut line = String::new();
        loop {
            self.read_line(&mut line).await?;
            if line.trim() == expected {
                return Ok(());
            }
        }
    }

    /// Search a FEN position to the configured depth
    pub async fn search(&mut self, fen: &str) -> Result<EvalResult, OracleError> {
        self.send(&format!("position fen {fen}")).await?;
        self.send(&format!("go depth {}", self.depth)).await?;

        let mut result = EvalResult {
            score: None,
            best_move: None,
        };

        let mut line = String::new();
        loop {
            self.read_line(&mut line).await?;
            let trimmed = line.trim();

            if trimmed.starts_with("info") {
                // Later (deeper) lines replace earlier ones
                if let Some(score) = parse_score(trimmed) {
                    result.score = Some(score);
                }
            } else if trimmed.starts_with("bestmove") {
                result.best_move = parse_bestmove(trimmed);
                break;
            }
        }

        Ok(result)
    }

    /// Send quit command and wait for process to exit
    pub async fn quit(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let _ = self.send("quit").await;
        let _ = self.process.wait().await;
    }
}

impl Oracle for StockfishEngine {
    async fn evaluate(
        &mut self,
        position: &Chess,
        perspective: Color,
    ) -> Result<Evaluation, OracleError> {
        let fen = Fen::from_position(position, EnPassantMode::Legal).to_string();
        let result = self.search(&fen).await?;
        let score = result
            .score
            .ok_or_else(|| OracleError::Protocol(format!("no score reported for {fen}")))?;

        Ok(Evaluation::from_side_to_move(
            score,
            result.best_move,
            position.turn(),
            perspective,
        ))
    }

    async fn close(&mut self) {
        self.quit().await;
    }
}

impl Drop for StockfishEngine {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        if !self.closed {
            let _ = self.process.start_kill();
        }
    }
}

/// Parse the `score cp N` / `score mate N` pair from an info line
fn parse_score(line: &str) -> Option<Score> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let idx = parts.iter().position(|part| *part == "score")?;
    let value: i32 = parts.get(idx + 2)?.parse().ok()?;
    match *parts.get(idx + 1)? {
        "cp" => Some(Score::Cp(value)),
        "mate" => Some(Score::Mate(value)),
        _ => None,
    }
}

/// Parse the move from a `bestmove` line
fn parse_bestmove(line: &str) -> Option<String> {
    line.split_whitespace()
        .nth(1)
        .filter(|mv| *mv != "(none)" && *mv != "0000")
        .map(String::from)
}
