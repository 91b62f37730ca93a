use reqwest::Client;
use serde_json::Value;
use tracing::info;

pub const CHESS_COM_API: &str = "https://api.chess.com";

/// Time classes eligible as analysis input.
const TIME_CLASSES: [&str; 3] = ["bullet", "blitz", "rapid"];

pub struct ChessComClient {
    client: Client,
    base_url: String,
}

impl ChessComClient {
    pub fn new(base_url: &str) -> Result<Self, String> {
        let client = Client::builder()
            .user_agent("BlunderScan/1.0")
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| format!("Client setup error: {e}"))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Monthly archive URLs for a player, oldest first as Chess.com lists them.
    pub async fn fetch_archives(&self, username: &str) -> Result<Vec<String>, String> {
        let url = format!(
            "{}/pub/player/{}/games/archives",
            self.base_url,
            username.to_lowercase()
        );

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| format!("Archives request error: {e}"))?;

        if !resp.status().is_success() {
            return Err(format!("Archives HTTP {}", resp.status()));
        }

        let data: Value = resp
            .json()
            .await
            .map_err(|e| format!("Archives JSON parse error: {e}"))?;

        Ok(archive_urls(&data))
    }

    /// PGN of the player's newest bullet/blitz/rapid game in their latest archive.
    pub async fn latest_game_pgn(&self, username: &str) -> Result<Option<String>, String> {
        let archives = self.fetch_archives(username).await?;
        let Some(latest) = archives.last() else {
            info!(username, "No Chess.com archives found");
            return Ok(None);
        };
        info!(archive = %latest, "Fetching Chess.com archive");

        let resp = self
            .client
            .get(latest)
            .send()
            .await
            .map_err(|e| format!("Request error: {e}"))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !resp.status().is_success() {
            return Err(format!("HTTP {}", resp.status()));
        }

        let data: Value = resp
            .json()
            .await
            .map_err(|e| format!("JSON parse error: {e}"))?;

        Ok(newest_pgn(&data))
    }
}

fn archive_urls(data: &Value) -> Vec<String> {
    data["archives"]
        .as_array()
        .map(|archives| {
            archives
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

/// Archive games are listed oldest first; take the last eligible one.
fn newest_pgn(data: &Value) -> Option<String> {
    data["games"]
        .as_array()?
        .iter()
        .filter(|game| {
            game.get("time_class")
                .and_then(|v| v.as_str())
                .is_some_and(|class| TIME_CLASSES.contains(&class))
        })
        .filter(|game| game.get("rules").and_then(|v| v.as_str()).unwrap_or("chess") == "chess")
        .filter_map(|game| game.get("pgn").and_then(|v| v.as_str()))
        .last()
        .map(String::from)
}
