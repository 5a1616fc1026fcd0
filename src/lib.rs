#![cfg_attr(not(test), deny(unsafe_code))]
#![warn(clippy::pedantic, clippy::unwrap_used)]

pub mod document;
pub mod error;
pub mod model;
pub mod prelude;
pub mod response;
pub mod transaction;
pub mod transport;

// Re-export main types
pub use document::{Document, NodeRef};
pub use error::{Error, ErrorKind};
pub use model::Model;
pub use response::Reply;
pub use transaction::{Message, Role, TextContent, Transaction};

use std::sync::Arc;

use bon::Builder;
use core::fmt;
use tracing::{debug, warn};

use transport::{HttpTransport, Transport};

const BASE_URL: &str = "https://api.anthropic.com";
const COMPLETE_URL: &str = "v1/complete";

/// Client for the completion service: holds the credential, the base URL
/// and the transport; [`Claude::send`] runs one full request cycle.
#[derive(Clone, Builder)]
pub struct Claude {
    #[builder(into)]
    pub(crate) api_key: String,
    #[builder(default = BASE_URL.to_string(), into)]
    pub(crate) base_url: String,
    #[builder(default = Arc::new(HttpTransport::new()))]
    pub(crate) transport: Arc<dyn Transport>,
}

impl Claude {
    /// Create a new client with the provided API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
            transport: Arc::new(HttpTransport::new()),
        }
    }

    pub fn load_from_env() -> Result<Self, std::env::VarError> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")?;
        Ok(Self::builder().api_key(api_key).build())
    }
}

impl Claude {
    /// Serializes the transaction and exchanges it with the service,
    /// returning the completion text.
    ///
    /// The cycle is sequential: serialization failure returns before any
    /// network call; a non-success status becomes a typed transport
    /// failure; a success body that is not a known reply shape becomes a
    /// malformed-response failure. The tree is never mutated, so a failed
    /// transaction can be re-sent as-is.
    pub async fn send(
        &self,
        document: &Document,
        transaction: NodeRef<Transaction>,
    ) -> Result<String, Error> {
        let body = document.serialize(transaction)?;
        debug!(bytes = body.len(), "transaction serialized");

        let url = format!("{}/{}", self.base_url, COMPLETE_URL);
        let headers = [
            ("authorization", format!("Bearer {}", self.api_key)),
            ("content-type", "application/json".to_string()),
        ];
        let reply = self.transport.send(&url, &headers, body).await?;

        if !reply.is_success() {
            warn!(status = reply.status, "service returned an error status");
            return Err(error::parse_error_response(reply.status, &reply.body));
        }

        response::extract_text(&reply.body)
    }
}

impl fmt::Debug for Claude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claude")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
