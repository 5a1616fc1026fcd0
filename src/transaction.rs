//! The request schema: a [`Transaction`] is an ordered list of
//! [`Message`]s, each a role plus an ordered list of content blocks.
//!
//! The schema types here are declared with the
//! [`parameter!`](crate::parameter), [`object!`](crate::object) and
//! [`list!`](crate::list) macros; the inherent methods on the handles are
//! the ergonomic layer over the generic `create`/`set`/`append` calls.

use std::path::Path;

use base64::Engine;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::document::{Document, NodeRef, ParameterValue, Scalar, ScalarType};
use crate::model::Model;
use crate::object;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl From<Role> for Scalar {
    fn from(role: Role) -> Self {
        Scalar::String(role.to_string())
    }
}

impl ParameterValue for Role {
    const TYPE: ScalarType = ScalarType::String;
}

/// The declared field leaves and lists of the request schema.
pub mod field {
    use crate::{list, parameter};

    parameter!(pub Model = "model": crate::model::Model);
    parameter!(pub MaxTokens = "max_tokens": u32);
    parameter!(pub Temperature = "temperature": f64);
    parameter!(pub System = "system": String);
    list!(pub Messages = "messages": crate::transaction::Message, non_empty);

    parameter!(pub Role = "role": crate::transaction::Role);
    list!(
        pub Content = "content":
            crate::transaction::TextContent | crate::transaction::ImageContent,
        non_empty
    );

    parameter!(pub TextType = "type": String, preset = "text");
    parameter!(pub Text = "text": String);

    parameter!(pub ImageType = "type": String, preset = "image");
    parameter!(pub SourceType = "type": String, preset = "base64");
    parameter!(pub MediaType = "media_type": String);
    parameter!(pub Data = "data": String);
}

object!(
    /// One full request: optional sampling parameters plus the ordered
    /// conversation. A minimal transaction serializes to just
    /// `{"messages":[...]}`.
    pub Transaction = "transaction" {
        optional field::Model,
        optional field::MaxTokens,
        optional field::Temperature,
        optional field::System,
        required field::Messages,
    }
);

object!(
    /// One conversation turn: a role and its content blocks.
    pub Message = "message" {
        required field::Role,
        required field::Content,
    }
);

object!(
    /// `{"type":"text","text":"..."}`
    pub TextContent = "text" {
        required field::TextType,
        required field::Text,
    }
);

object!(
    /// Base64 image payload, nested under an image block.
    pub ImageSource = "source" {
        required field::SourceType,
        required field::MediaType,
        required field::Data,
    }
);

object!(
    /// `{"type":"image","source":{...}}`
    pub ImageContent = "image" {
        required field::ImageType,
        required ImageSource,
    }
);

impl NodeRef<Transaction> {
    /// The `messages` list, materialized on first access.
    pub fn messages(self, document: &mut Document) -> NodeRef<field::Messages> {
        self.get_or_create::<field::Messages>(document)
    }

    /// Appends a message with the given role and returns its handle.
    pub fn add_message(self, document: &mut Document, role: Role) -> NodeRef<Message> {
        let message = self.messages(document).append::<Message>(document);
        message.set::<field::Role>(document, role);
        message
    }

    pub fn set_model(self, document: &mut Document, model: Model) {
        self.set::<field::Model>(document, model);
    }

    pub fn set_max_tokens(self, document: &mut Document, max_tokens: u32) {
        self.set::<field::MaxTokens>(document, max_tokens);
    }

    pub fn set_temperature(self, document: &mut Document, temperature: f64) {
        self.set::<field::Temperature>(document, temperature);
    }

    pub fn set_system(self, document: &mut Document, system: impl Into<String>) {
        self.set::<field::System>(document, system.into());
    }
}

impl NodeRef<Message> {
    /// The `content` list, materialized on first access.
    pub fn content(self, document: &mut Document) -> NodeRef<field::Content> {
        self.get_or_create::<field::Content>(document)
    }

    pub fn set_role(self, document: &mut Document, role: Role) {
        self.set::<field::Role>(document, role);
    }

    pub fn role(self, document: &Document) -> Option<Role> {
        self.get::<field::Role>(document)?.as_str()?.parse().ok()
    }

    /// Appends a text block and returns its handle.
    pub fn add_text(
        self,
        document: &mut Document,
        text: impl Into<String>,
    ) -> NodeRef<TextContent> {
        let block = self.content(document).append::<TextContent>(document);
        block.set::<field::Text>(document, text.into());
        block
    }

    /// Appends an image block from an already-encoded base64 payload.
    pub fn add_image(
        self,
        document: &mut Document,
        media_type: impl Into<String>,
        data: impl Into<String>,
    ) -> NodeRef<ImageContent> {
        let block = self.content(document).append::<ImageContent>(document);
        let source = block.get_or_create::<ImageSource>(document);
        source.set::<field::MediaType>(document, media_type.into());
        source.set::<field::Data>(document, data.into());
        block
    }

    /// Appends an image block read from disk, guessing the media type
    /// from the file extension.
    pub fn add_image_file(
        self,
        document: &mut Document,
        path: impl AsRef<Path>,
    ) -> Result<NodeRef<ImageContent>, std::io::Error> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(data);
        let media_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();
        Ok(self.add_image(document, media_type, encoded))
    }
}

impl NodeRef<TextContent> {
    pub fn set_text(self, document: &mut Document, text: impl Into<String>) {
        self.set::<field::Text>(document, text.into());
    }

    pub fn text(self, document: &Document) -> Option<&str> {
        self.get::<field::Text>(document)?.as_str()
    }
}
