use serde::Deserialize;
use thiserror::Error;

use crate::document::ScalarType;

/// Categorizes errors into the four failure classes of the send cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller broke a declared schema; always a local programmer error.
    SchemaViolation,
    /// A required field was unset (or a required list empty) at
    /// serialization time; nothing was sent.
    IncompleteDocument,
    /// The network exchange failed or the service rejected the request.
    TransportFailure,
    /// The service replied, but the body was not the expected shape.
    MalformedResponse,
}

/// Structured error payload the service returns on failures.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
    #[serde(default)]
    pub r#type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Error)]
pub enum Error {
    /// A field name outside the object's declared set
    #[error("`{object}` has no declared field `{field}`")]
    UnknownField { object: &'static str, field: String },

    /// A singular field created twice; the first child would be orphaned
    #[error("field `{field}` of `{object}` was already created")]
    DuplicateField {
        object: &'static str,
        field: &'static str,
    },

    /// An item kind outside the list's declared allow-set
    #[error("`{item}` is not an allowed item of list `{list}`")]
    ForeignItem {
        list: &'static str,
        item: &'static str,
    },

    /// A value whose scalar type differs from the parameter's declaration
    #[error("parameter `{parameter}` takes a {expected}, got a {found}")]
    ValueType {
        parameter: &'static str,
        expected: ScalarType,
        found: ScalarType,
    },

    /// A dynamic operation applied to the wrong node kind
    #[error("`{node}` is a {found}, expected a {expected}")]
    KindMismatch {
        node: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    /// A required field left unset at serialization time
    #[error("required field `{field}` of `{object}` is unset")]
    MissingField {
        object: &'static str,
        field: &'static str,
    },

    /// A non-empty-required list left empty at serialization time
    #[error("required list `{list}` is empty")]
    EmptyList { list: &'static str },

    /// A parameter serialized directly while unset
    #[error("parameter `{parameter}` is unset")]
    UnsetParameter { parameter: &'static str },

    /// Errors from the HTTP client
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Connection-level failure reported by a transport
    #[error("connection failed: {0}")]
    Connection(String),

    /// Invalid request errors from the API
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Authentication error
    #[error("authentication error: {0}")]
    Authentication(String),

    /// Permission denied
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Resource not found
    #[error("resource not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded
    #[error("rate limit exceeded")]
    RateLimit,

    /// API overloaded
    #[error("API overloaded: {0}")]
    Overloaded(String),

    /// Generic API error
    #[error("API error: {0}")]
    Api(String),

    /// Non-success status with an unstructured body
    #[error("HTTP status {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body was not parseable JSON of a known shape
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Response parsed, but carried no completion text
    #[error("response contained no completion text")]
    MissingText,
}

impl Error {
    /// The failure class this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownField { .. }
            | Self::DuplicateField { .. }
            | Self::ForeignItem { .. }
            | Self::ValueType { .. }
            | Self::KindMismatch { .. } => ErrorKind::SchemaViolation,
            Self::MissingField { .. } | Self::EmptyList { .. } | Self::UnsetParameter { .. } => {
                ErrorKind::IncompleteDocument
            }
            Self::Http(_)
            | Self::Connection(_)
            | Self::InvalidRequest(_)
            | Self::Authentication(_)
            | Self::PermissionDenied(_)
            | Self::NotFound(_)
            | Self::RateLimit
            | Self::Overloaded(_)
            | Self::Api(_)
            | Self::Status { .. } => ErrorKind::TransportFailure,
            Self::Json(_) | Self::MissingText => ErrorKind::MalformedResponse,
        }
    }

    /// Whether a caller-side retry could plausibly succeed. The send cycle
    /// itself never retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimit | Self::Overloaded(_) | Self::Connection(_) => true,
            Self::Http(error) => error.is_timeout() || error.is_connect(),
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Turns a non-success reply into a typed error, preferring the service's
/// structured `{"error":{"type","message"}}` body and falling back to the
/// status code with the raw text.
pub fn parse_error_response(status: u16, body: &str) -> Error {
    if let Ok(payload) = serde_json::from_str::<ApiErrorResponse>(body) {
        match payload.error.r#type.as_deref() {
            Some("invalid_request_error") => Error::InvalidRequest(payload.error.message),
            Some("authentication_error") => Error::Authentication(payload.error.message),
            Some("permission_error") => Error::PermissionDenied(payload.error.message),
            Some("not_found_error") => Error::NotFound(payload.error.message),
            Some("rate_limit_error") => Error::RateLimit,
            Some("overloaded_error") => Error::Overloaded(payload.error.message),
            _ => Error::Api(payload.error.message),
        }
    } else {
        match status {
            401 => Error::Authentication(body.to_owned()),
            403 => Error::PermissionDenied(body.to_owned()),
            404 => Error::NotFound(body.to_owned()),
            429 => Error::RateLimit,
            _ => Error::Status {
                status,
                message: body.to_owned(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_error_bodies_become_typed_variants() {
        let body = r#"{"error":{"type":"rate_limit_error","message":"slow down"}}"#;
        let error = parse_error_response(429, body);
        assert!(matches!(error, Error::RateLimit));
        assert_eq!(error.kind(), ErrorKind::TransportFailure);
        assert!(error.is_retryable());
    }

    #[test]
    fn unstructured_bodies_fall_back_to_the_status() {
        let error = parse_error_response(500, "boom");
        assert!(matches!(error, Error::Status { status: 500, .. }));
        assert_eq!(error.kind(), ErrorKind::TransportFailure);
        assert!(error.is_retryable());
    }

    #[test]
    fn auth_failures_are_not_retryable() {
        let body = r#"{"error":{"type":"authentication_error","message":"bad key"}}"#;
        let error = parse_error_response(401, body);
        assert!(matches!(error, Error::Authentication(_)));
        assert!(!error.is_retryable());
    }

    #[test]
    fn unknown_error_types_stay_generic() {
        let body = r#"{"error":{"type":"weather_error","message":"raining"}}"#;
        assert!(matches!(parse_error_response(400, body), Error::Api(_)));
    }

    #[test]
    fn builder_errors_map_to_their_kinds() {
        let violation = Error::ForeignItem {
            list: "content",
            item: "message",
        };
        assert_eq!(violation.kind(), ErrorKind::SchemaViolation);
        assert!(!violation.is_retryable());

        let incomplete = Error::EmptyList { list: "messages" };
        assert_eq!(incomplete.kind(), ErrorKind::IncompleteDocument);
    }
}
