//! # HTTP Clients
//!
//! [`PublishClient`] talks to the text-protocol and ingest endpoints;
//! [`LongPollClient`] follows the long-poll protocol, carrying each
//! `reconnectWith` token into the next request.

use crate::text_http::SentReply;
use serde::Deserialize;
use shared_types::{paths, Envelope, Identity, LongPollBatch, ReconnectToken};
use thiserror::Error;
use tracing::debug;

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered, but did not accept the request
    #[error("server rejected request: {0}")]
    Rejected(String),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Deserialize)]
struct IngestReply {
    #[serde(default)]
    success: bool,
}

fn trim_base(base_url: impl Into<String>) -> String {
    let mut base = base_url.into();
    while base.ends_with('/') {
        base.pop();
    }
    base
}

/// Producer client for the text-protocol and ingest endpoints.
#[derive(Debug, Clone)]
pub struct PublishClient {
    http: reqwest::Client,
    base_url: String,
    ingest_url: Option<String>,
}

impl PublishClient {
    /// Client for the text-protocol endpoint at `base_url`,
    /// e.g. `http://127.0.0.1:8003`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: trim_base(base_url),
            ingest_url: None,
        }
    }

    /// Also send [`PublishClient::ingest`] batches to `ingest_url`.
    #[must_use]
    pub fn with_ingest(mut self, ingest_url: impl Into<String>) -> Self {
        self.ingest_url = Some(trim_base(ingest_url));
        self
    }

    /// Publish `message` on `path`.
    pub async fn update(&self, path: &str, message: &str) -> Result<(), ClientError> {
        let request = format!("{path};{message}");
        let url = format!("{}/{}", self.base_url, urlencoding::encode(&request));
        debug!(path = %path, "Publishing");

        let body = self.http.get(url).send().await?.text().await?;
        let reply: SentReply = serde_json::from_str(&body)?;
        if reply.sent {
            Ok(())
        } else {
            Err(ClientError::Rejected(body))
        }
    }

    /// Subscribe `identity` to `topic`.
    pub async fn connect(&self, identity: &str, topic: &str) -> Result<(), ClientError> {
        self.update(paths::CONNECT, &paths::control_message(identity, topic))
            .await
    }

    /// Unsubscribe `identity` from `topic`.
    pub async fn disconnect(&self, identity: &str, topic: &str) -> Result<(), ClientError> {
        self.update(paths::DISCONNECT, &paths::control_message(identity, topic))
            .await
    }

    /// Publish `envelopes` in one request, in order.
    pub async fn ingest(&self, envelopes: &[Envelope]) -> Result<(), ClientError> {
        let url = format!("{}/", self.ingest_url.as_deref().unwrap_or(&self.base_url));
        debug!(items = envelopes.len(), "Ingesting");

        let body = self.http.post(url).json(envelopes).send().await?.text().await?;
        let reply: IngestReply = serde_json::from_str(&body)?;
        if reply.success {
            Ok(())
        } else {
            Err(ClientError::Rejected(body))
        }
    }
}

/// Long-poll subscriber.
#[derive(Debug, Clone)]
pub struct LongPollClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl LongPollClient {
    /// Client for the long-poll server at `base_url`, including any
    /// prefix, e.g. `http://127.0.0.1:8008/comet`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: trim_base(base_url),
            token: None,
        }
    }

    /// Wait for the next batch, confirming the previous one.
    pub async fn poll(&mut self) -> Result<LongPollBatch, ClientError> {
        let url = match &self.token {
            Some(token) => format!("{}/{}", self.base_url, token),
            None => format!("{}/", self.base_url),
        };

        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::Rejected(response.status().to_string()));
        }
        let body = response.text().await?;
        let json = body.strip_suffix(LongPollBatch::TERMINATOR).unwrap_or(&body);
        let batch: LongPollBatch = serde_json::from_str(json)?;

        debug!(items = batch.updates.len(), token = %batch.reconnect_with, "Long poll answered");
        self.token = Some(batch.reconnect_with.clone());
        Ok(batch)
    }

    /// Session identity, known after the first poll.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.token
            .as_deref()
            .and_then(ReconnectToken::parse)
            .map(|token| token.identity)
    }

    /// Token the next poll will send.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}
