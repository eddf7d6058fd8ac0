use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::error::{GameError, Result};

/// Header carrying the page's anti-forgery token on JSON requests.
pub const CSRF_HEADER: &str = "X-CSRFToken";
/// Form field carrying the anti-forgery token on the undo form.
pub const CSRF_FORM_FIELD: &str = "csrfmiddlewaretoken";

// Wire types shared by the scoring and turn endpoints
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PlayedTile {
    pub x: usize,
    pub y: usize,
    pub tile: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnAction {
    #[serde(rename = "play")]
    Play,
    #[serde(rename = "pass")]
    Pass,
    #[serde(rename = "exchange")]
    Exchange,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TurnRequest {
    pub action: TurnAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub played_tiles: Option<Vec<PlayedTile>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchanged_tiles: Option<Vec<String>>,
}

impl TurnRequest {
    pub fn play(played_tiles: Vec<PlayedTile>) -> Self {
        Self {
            action: TurnAction::Play,
            played_tiles: Some(played_tiles),
            exchanged_tiles: None,
        }
    }

    pub fn pass() -> Self {
        Self {
            action: TurnAction::Pass,
            played_tiles: None,
            exchanged_tiles: None,
        }
    }

    pub fn exchange(exchanged_tiles: Vec<String>) -> Self {
        Self {
            action: TurnAction::Exchange,
            played_tiles: None,
            exchanged_tiles: Some(exchanged_tiles),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ScoreResponse {
    pub points: i32,
    #[serde(rename = "invalidWords", default)]
    pub invalid_words: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

/// Page the browser should load after a committed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Endpoints {
    pub score_url: String,
    pub turn_url: String,
    pub update_rack_url: Option<String>,
    pub undo_turn_url: Option<String>,
}

impl Endpoints {
    /// Makes every endpoint absolute. Relative paths need a `base`.
    pub fn resolve(&self, base: Option<&Url>) -> Result<Self> {
        let resolve_one = |path: &str| -> Result<String> {
            if let Ok(url) = Url::parse(path) {
                return Ok(url.into());
            }
            let base = base.ok_or_else(|| {
                GameError::Config(format!("relative endpoint {path} needs a base URL"))
            })?;
            base.join(path)
                .map(String::from)
                .map_err(|e| GameError::Config(format!("bad endpoint {path}: {e}")))
        };
        Ok(Self {
            score_url: resolve_one(&self.score_url)?,
            turn_url: resolve_one(&self.turn_url)?,
            update_rack_url: self.update_rack_url.as_deref().map(resolve_one).transpose()?,
            undo_turn_url: self.undo_turn_url.as_deref().map(resolve_one).transpose()?,
        })
    }
}

/// Remote authority for scoring and committing turns.
#[async_trait]
pub trait GameApi: Send + Sync {
    async fn score(&self, request: &TurnRequest) -> Result<ScoreResponse>;

    async fn submit_turn(&self, request: &TurnRequest) -> Result<Redirect>;

    /// Saves the rack order. Callers ignore the outcome beyond logging.
    async fn update_rack(&self, letters: &[String]) -> Result<()>;

    async fn undo_turn(&self) -> Result<Redirect>;
}

#[derive(Debug, Clone)]
pub struct HttpGameApi {
    client: reqwest::Client,
    endpoints: Endpoints,
    csrf_token: String,
}

impl HttpGameApi {
    pub fn new(endpoints: Endpoints, csrf_token: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoints,
            csrf_token,
        })
    }

    async fn post_json<T: Serialize + ?Sized>(&self, url: &str, body: &T) -> Result<Response> {
        let response = self
            .client
            .post(url)
            .header(CSRF_HEADER, &self.csrf_token)
            .json(body)
            .send()
            .await?;
        debug!(url = %url, status = %response.status(), "POST completed");
        Ok(response)
    }
}

/// Turns a non-2xx response into `GameError::Remote`, using the body's
/// `error` field when there is one.
async fn remote_error(response: Response) -> GameError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(parsed) => parsed.error,
        Err(_) => fallback_message(status, &body),
    };
    GameError::Remote {
        status: status.as_u16(),
        message,
    }
}

fn fallback_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if !body.is_empty() && body.len() <= 200 && !body.starts_with('<') {
        return body.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("Request failed")
        .to_string()
}

#[async_trait]
impl GameApi for HttpGameApi {
    async fn score(&self, request: &TurnRequest) -> Result<ScoreResponse> {
        let response = self.post_json(&self.endpoints.score_url, request).await?;
        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }
        response
            .json::<ScoreResponse>()
            .await
            .map_err(|e| GameError::Decode(e.to_string()))
    }

    async fn submit_turn(&self, request: &TurnRequest) -> Result<Redirect> {
        let response = self.post_json(&self.endpoints.turn_url, request).await?;
        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }
        Ok(Redirect {
            location: response.url().to_string(),
        })
    }

    async fn update_rack(&self, letters: &[String]) -> Result<()> {
        let Some(url) = self.endpoints.update_rack_url.as_deref() else {
            debug!("No rack update URL configured, skipping save");
            return Ok(());
        };
        let response = self.post_json(url, letters).await?;
        if !response.status().is_success() {
            let err = remote_error(response).await;
            warn!(error = %err, "Rack update rejected");
            return Err(err);
        }
        Ok(())
    }

    async fn undo_turn(&self) -> Result<Redirect> {
        let url = self
            .endpoints
            .undo_turn_url
            .as_deref()
            .ok_or(GameError::UndoUnavailable)?;
        let response = self
            .client
            .post(url)
            .form(&[(CSRF_FORM_FIELD, self.csrf_token.as_str())])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }
        Ok(Redirect {
            location: response.url().to_string(),
        })
    }
}
