//! The network-exchange seam.
//!
//! The send cycle talks to a [`Transport`] rather than to reqwest
//! directly: one POST in, one status-plus-body out. Retry, cancellation
//! and backoff policy belong to transport implementations, never to the
//! send cycle.

use async_trait::async_trait;
use tracing::debug;

use crate::error::Error;

/// Outcome of one HTTP exchange: the status code and the raw body text.
#[derive(Debug, Clone)]
pub struct TransportReply {
    pub status: u16,
    pub body: String,
}

impl TransportReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One HTTP exchange: POST `body` to `url` with `headers`, return the
/// reply or a transport-level failure.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        url: &str,
        headers: &[(&str, String)],
        body: String,
    ) -> Result<TransportReply, Error>;
}

/// The default transport over a shared reqwest client.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Use a pre-configured reqwest client (timeouts, proxies, ...).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        url: &str,
        headers: &[(&str, String)],
        body: String,
    ) -> Result<TransportReply, Error> {
        let mut request = self.client.post(url);
        for (name, value) in headers {
            request = request.header(*name, value);
        }

        debug!(url, bytes = body.len(), "posting document");
        let response = request.body(body).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, bytes = body.len(), "reply received");

        Ok(TransportReply { status, body })
    }
}
