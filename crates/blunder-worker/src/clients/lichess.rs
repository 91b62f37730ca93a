use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use tracing::info;

use crate::error::LichessError;

/// A game accepted by the Lichess import endpoint.
#[derive(Debug, Clone)]
pub struct ImportedGame {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Deserialize)]
struct ImportResponse {
    id: Option<String>,
    url: Option<String>,
}

pub struct LichessClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl LichessClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, LichessError> {
        let client = Client::builder()
            .user_agent("BlunderScan/1.0")
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|source| LichessError::Transport {
                stage: "client setup",
                source,
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn import_url(&self) -> String {
        format!("{}/api/import", self.base_url)
    }

    pub fn export_url(&self, game_id: &str) -> String {
        format!("{}/game/export/{}?literate=1", self.base_url, game_id)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Upload a PGN for import. Lichess queues its own server analysis.
    pub async fn import_game(&self, pgn: &str) -> Result<ImportedGame, LichessError> {
        const STAGE: &str = "import";

        let resp = self
            .authorize(self.client.post(self.import_url()))
            .form(&[("pgn", pgn)])
            .send()
            .await
            .map_err(|source| LichessError::Transport { stage: STAGE, source })?;

        let resp = check_status(STAGE, resp).await?;
        let body: ImportResponse = resp
            .json()
            .await
            .map_err(|source| LichessError::Transport { stage: STAGE, source })?;

        let id = body.id.filter(|id| !id.is_empty()).ok_or(LichessError::MissingGameId)?;
        info!(game_id = %id, url = body.url.as_deref().unwrap_or(""), "Game imported to Lichess");

        Ok(ImportedGame { id, url: body.url })
    }

    /// Fetch the literate PGN, whose move comments carry the server's
    /// Inaccuracy/Mistake/Blunder judgments once analysis has finished.
    pub async fn export_literate(&self, game_id: &str) -> Result<String, LichessError> {
        const STAGE: &str = "export";

        let resp = self
            .authorize(self.client.get(self.export_url(game_id)))
            .header("Accept", "application/x-chess-pgn")
            .send()
            .await
            .map_err(|source| LichessError::Transport { stage: STAGE, source })?;

        let resp = check_status(STAGE, resp).await?;
        let text = resp
            .text()
            .await
            .map_err(|source| LichessError::Transport { stage: STAGE, source })?;

        info!(game_id, bytes = text.len(), "Fetched annotated PGN");
        Ok(text)
    }
}

/// Turn a non-success response into `LichessError::Status`, keeping the body.
async fn check_status(stage: &'static str, resp: Response) -> Result<Response, LichessError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = match resp.text().await {
        Ok(body) => body,
        Err(e) => format!("<unreadable body: {e}>"),
    };
    Err(LichessError::Status {
        stage,
        status: status.as_u16(),
        body,
    })
}
