use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Body of `POST /api/config`. Only the fields of `mode` are required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigRequest {
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chromecast_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_video_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ppt_email: Option<String>,
}

impl ConfigRequest {
    pub fn led() -> Self {
        Self {
            mode: "led".into(),
            ..Default::default()
        }
    }

    pub fn web(url: &str) -> Self {
        Self {
            mode: "web".into(),
            web_url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn chromecast(name: &str, video_id: &str) -> Self {
        Self {
            mode: "chromecast".into(),
            chromecast_name: Some(name.into()),
            youtube_video_id: Some(video_id.into()),
            ..Default::default()
        }
    }

    pub fn powerpoint(email: &str) -> Self {
        Self {
            mode: "powerpoint".into(),
            ppt_email: Some(email.into()),
            ..Default::default()
        }
    }
}

/// Response of `GET`/`POST /api/config`. Fields of inactive modes are absent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConfigResponse {
    pub mode: String,
    pub last_updated: String,
    pub status: String,
    pub web_url: Option<String>,
    pub chromecast_name: Option<String>,
    pub youtube_video_id: Option<String>,
    pub ppt_email: Option<String>,
}

/// Response of `GET /api/status`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub timestamp: String,
    pub config_file_path: String,
    pub config_loaded: bool,
    pub polling_active: bool,
}

#[derive(Debug, Error)]
pub enum ClientError {
    /// The service answered with a non-success status and `{"error": ...}`.
    #[error("API error {status}: {message}")]
    Api { status: StatusCode, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct ModeClient {
    client: Client,
    base_url: String,
}

impl ModeClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Current configuration.
    pub async fn get_config(&self) -> Result<ConfigResponse, ClientError> {
        let resp = self
            .client
            .get(format!("{}/api/config", self.base_url))
            .send()
            .await?;
        Self::decode(resp).await
    }

    /// Switch mode; returns the updated configuration.
    pub async fn set_config(&self, req: &ConfigRequest) -> Result<ConfigResponse, ClientError> {
        let resp = self
            .client
            .post(format!("{}/api/config", self.base_url))
            .json(req)
            .send()
            .await?;
        Self::decode(resp).await
    }

    /// Service status, including whether the config file is being polled.
    pub async fn status(&self) -> Result<StatusResponse, ClientError> {
        let resp = self
            .client
            .get(format!("{}/api/status", self.base_url))
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json().await?);
        }

        let text = resp.text().await?;
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or(text);
        Err(ClientError::Api { status, message })
    }
}
