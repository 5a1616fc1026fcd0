//! Common imports for building and sending transactions.
//!
//! ```rust,no_run
//! use claude_wire::prelude::*;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Claude::new("your-api-key");
//!
//! let mut document = Document::new();
//! let transaction = document.create::<Transaction>();
//! transaction.set_model(&mut document, Model::Claude35HaikuLatest);
//! transaction
//!     .add_message(&mut document, Role::User)
//!     .add_text(&mut document, "Hey Claude!");
//!
//! let completion = client.send(&document, transaction).await?;
//! # Ok(())
//! # }
//! ```

pub use crate::{
    Claude,
    document::{Document, NodeId, NodeRef, Scalar, Schema},
    error::{Error, ErrorKind},
    model::Model,
    response::Reply,
    transaction::{ImageContent, Message, Role, TextContent, Transaction},
    transport::{HttpTransport, Transport, TransportReply},
};
