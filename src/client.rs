use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::models::{TrainingMeta, TrainingSession};
use crate::week::WeekWindow;

const SCHEDULE_PATH: &str = "trainings/schedule/";
const SCHEDULE_SIMPLE_PATH: &str = "trainings/schedule-simple/";
const META_PATH: &str = "trainings/meta/";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Unexpected status {0}")]
    Status(StatusCode),
    #[error("Empty response body")]
    Empty,
    #[error("Response is not JSON (content-type `{content_type}`): {source}")]
    NotJson {
        content_type: String,
        source: serde_json::Error,
    },
}

/// Client for the club content API.
///
/// The public fetch methods never fail: transport errors, error statuses and
/// unparseable bodies are logged and surface as "no data".
#[derive(Clone)]
pub struct ContentApiClient {
    client: reqwest::Client,
    base_url: Arc<Url>,
}

impl ContentApiClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: Arc::new(base_url),
        })
    }

    fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url, url::ParseError> {
        let raw = format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path);
        if query.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, query)
        }
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, FetchError> {
        let url = self.endpoint(path, query)?;
        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Err(FetchError::Empty);
        }
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(FetchError::Empty);
        }
        let json: Value = serde_json::from_str(&body)
            .map_err(|source| FetchError::NotJson {
                content_type,
                source,
            })?;
        Ok(unwrap_pagination(json))
    }

    /// Primary schedule endpoint first, the simplified one if that fails.
    async fn get_sessions(&self, query: &[(&str, String)]) -> Vec<TrainingSession> {
        let payload = match self.get_json(SCHEDULE_PATH, query).await {
            Ok(payload) => Ok(payload),
            Err(err) => {
                warn!(error = %err, endpoint = SCHEDULE_PATH, "schedule fetch failed, trying fallback");
                self.get_json(SCHEDULE_SIMPLE_PATH, query).await
            }
        };
        match payload {
            Ok(payload) => decode_sessions(payload),
            Err(err) => {
                warn!(error = %err, endpoint = SCHEDULE_SIMPLE_PATH, "schedule fallback failed");
                Vec::new()
            }
        }
    }

    /// Sessions dated inside `window`.
    pub async fn fetch_week(&self, window: WeekWindow) -> Vec<TrainingSession> {
        let query = [
            ("start", window.start().format("%Y-%m-%d").to_string()),
            ("end", window.end().format("%Y-%m-%d").to_string()),
        ];
        let sessions = self.get_sessions(&query).await;
        debug!(start = %window.start(), end = %window.end(), count = sessions.len(), "fetched week");
        sessions
    }

    /// Upcoming sessions, as served without a date range.
    pub async fn fetch_upcoming(&self) -> Vec<TrainingSession> {
        let sessions = self.get_sessions(&[]).await;
        debug!(count = sessions.len(), "fetched upcoming sessions");
        sessions
    }

    pub async fn fetch_meta(&self) -> TrainingMeta {
        let payload = match self.get_json(META_PATH, &[]).await {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, endpoint = META_PATH, "meta fetch failed");
                return TrainingMeta::default();
            }
        };
        serde_json::from_value(payload).unwrap_or_else(|err| {
            warn!(error = %err, "meta payload has unexpected shape");
            TrainingMeta::default()
        })
    }
}

/// List endpoints may answer `{count, next, previous, results: [...]}`.
fn unwrap_pagination(json: Value) -> Value {
    match json {
        Value::Object(mut map) if map.get("results").is_some_and(Value::is_array) => {
            map.remove("results").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Decodes a list payload record by record, dropping the records that do not
/// parse.
pub fn decode_sessions(payload: Value) -> Vec<TrainingSession> {
    let Value::Array(items) = payload else {
        warn!("schedule payload is not a list");
        return Vec::new();
    };
    items
        .into_iter()
        .filter_map(|item| {
            serde_json::from_value(item)
                .map_err(|err| warn!(error = %err, "dropping malformed session"))
                .ok()
        })
        .collect()
}
