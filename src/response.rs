use serde::Deserialize;

use crate::error::Error;
use crate::transaction::Role;

/// Token accounting reported by the chat reply shape.
#[derive(Debug, Default, Clone, Deserialize, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: Option<u32>,
    pub output_tokens: Option<u32>,
}

impl Usage {
    pub fn total_tokens(&self) -> u32 {
        self.input_tokens.unwrap_or(0) + self.output_tokens.unwrap_or(0)
    }
}

/// One content block of the chat reply shape. Unknown block types are
/// tolerated and skipped during extraction.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplyContent {
    Text { text: String },
    #[serde(other)]
    Other,
}

/// The chat reply shape: a content array plus metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    pub content: Vec<ReplyContent>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// The legacy reply shape: a single `completion` string.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyReply {
    pub completion: String,
}

/// A parsed service reply, in either shape the service is known to send.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Reply {
    Chat(ChatReply),
    Legacy(LegacyReply),
}

impl Reply {
    /// The designated completion text: the `completion` field, or the
    /// first `text` content block.
    pub fn text(&self) -> Option<&str> {
        match self {
            Reply::Legacy(reply) => Some(&reply.completion),
            Reply::Chat(reply) => reply.content.iter().find_map(|block| match block {
                ReplyContent::Text { text } => Some(text.as_str()),
                ReplyContent::Other => None,
            }),
        }
    }
}

/// Parses a success body and extracts the completion text.
pub(crate) fn extract_text(body: &str) -> Result<String, Error> {
    let reply: Reply = serde_json::from_str(body)?;
    match reply.text() {
        Some(text) => Ok(text.to_owned()),
        None => Err(Error::MissingText),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn extracts_the_legacy_completion_field() {
        let text = extract_text(r#"{"completion":"I'm doing well!"}"#).expect("legacy shape");
        assert_eq!(text, "I'm doing well!");
    }

    #[test]
    fn extracts_the_first_text_block() {
        let body = r#"{
            "id": "msg_1",
            "role": "assistant",
            "content": [{"type":"text","text":"hello"},{"type":"text","text":"again"}],
            "model": "claude-3-5-haiku-latest",
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 4, "output_tokens": 2}
        }"#;
        assert_eq!(extract_text(body).expect("chat shape"), "hello");
    }

    #[test]
    fn skips_unknown_block_types() {
        let body = r#"{"content":[{"type":"tool_use","id":"t1"},{"type":"text","text":"after"}]}"#;
        assert_eq!(extract_text(body).expect("chat shape"), "after");
    }

    #[test]
    fn unexpected_shape_is_malformed() {
        let error = extract_text(r#"{"unexpected":"shape"}"#).expect_err("neither shape");
        assert_eq!(error.kind(), ErrorKind::MalformedResponse);
    }

    #[test]
    fn non_json_body_is_malformed() {
        let error = extract_text("not json").expect_err("unparseable");
        assert_eq!(error.kind(), ErrorKind::MalformedResponse);
    }

    #[test]
    fn text_free_content_is_malformed() {
        let error = extract_text(r#"{"content":[{"type":"tool_use","id":"t1"}]}"#)
            .expect_err("no text block");
        assert!(matches!(error, Error::MissingText));
    }

    #[test]
    fn usage_totals() {
        let usage = Usage {
            input_tokens: Some(4),
            output_tokens: Some(2),
        };
        assert_eq!(usage.total_tokens(), 6);
        assert_eq!(Usage::default().total_tokens(), 0);
    }
}
