use std::time::Duration;

use reqwest::blocking::Client as HttpClient;
use reqwest::header::USER_AGENT;
use serde::{Deserialize, Serialize};

/// How long a search request may run before it is abandoned.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub user_agent: String,
    pub timeout: Option<Duration>,
    pub http_client: Option<HttpClient>,
}

pub struct Client {
    http: HttpClient,
    user_agent: String,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self, FetchError> {
        let http = match config.http_client {
            Some(client) => client,
            None => HttpClient::builder()
                .timeout(config.timeout.unwrap_or(REQUEST_TIMEOUT))
                .build()?,
        };

        let user_agent = if config.user_agent.trim().is_empty() {
            format!("hnews/{}", crate::VERSION)
        } else {
            config.user_agent
        };

        Ok(Client { http, user_agent })
    }

    /// Fetches one page of search results and decodes it.
    ///
    /// The HTTP status is not inspected: the search API answers errors
    /// with a JSON body, and decoding reports anything that is not the
    /// expected shape.
    pub fn search(&self, url: &str) -> Result<SearchResponse, FetchError> {
        tracing::info!(%url, "requesting stories");

        let body = self
            .http
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()?
            .text()?;

        let response: SearchResponse = serde_json::from_str(&body)?;
        Ok(response)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub hits: Vec<Hit>,
}

/// One story record from the search endpoint. Fields the API leaves out
/// default to their empty values; an empty `url` marks a text story.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub story_text: String,
}

impl Hit {
    pub fn has_link(&self) -> bool {
        !self.url.is_empty()
    }

    /// Label shown in the story list.
    pub fn list_label(&self) -> String {
        format!("▴{} | {}", self.points, self.title)
    }
}
