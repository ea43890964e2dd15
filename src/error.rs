//! Error Handling
//!
//! This module defines the crate's error type. Every fallible operation in the
//! SDK returns [`Error`], whose variants follow the two failure families of the
//! Zenvia API:
//!
//! - **local** failures raised before anything touches the network
//!   ([`Error::UnsupportedChannel`], [`Error::UnsupportedContent`],
//!   [`Error::EmptyMessage`]), and
//! - **remote** failures raised by the request itself ([`Error::Request`] for
//!   a non-2xx answer from the platform, [`Error::Technical`] when the platform
//!   could not be reached at all).

use std::error::Error as StdError;

use reqwest::StatusCode;
use serde_json::Value;

use crate::{channel::Channel, server::WebhookState};

const HTTP_CONFLICT: StatusCode = StatusCode::CONFLICT;

/// The **top-level error enum** for the `zenvia` crate.
///
/// It uses `#[non_exhaustive]` to allow for future additions of error variants
/// without breaking client code.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The requested channel id is not one of `sms`, `rcs`, `facebook` or
    /// `whatsapp`. Holds the rejected id.
    #[error("Unsupported channel")]
    UnsupportedChannel(String),

    /// A content kind is not permitted on the target channel.
    ///
    /// Only the first offending content (in argument order) is reported.
    #[error(
        "Content of type {content_type} is not supported in {} channel",
        .channel.display_name()
    )]
    UnsupportedContent {
        channel: Channel,
        content_type: String,
    },

    /// A content names a known `type` but lacks fields that kind requires,
    /// e.g. an inbound `text` without `text` echoed back as-is.
    #[error("Content of type {content_type} is missing required fields")]
    MalformedContent { content_type: String },

    /// A message was submitted without any content.
    #[error("A message must have at least one content")]
    EmptyMessage,

    /// The platform answered with a non-2xx status.
    #[error(transparent)]
    Request(#[from] RequestError),

    /// The request never got an answer (DNS, connection, TLS, timeout...).
    #[error(transparent)]
    Technical(#[from] TechnicalError),

    /// A successful response body could not be read into the expected type.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Represents an **I/O error**, e.g. while reading a contacts file or
    /// binding the webhook listener.
    #[error("An I/O error occurred: {0}")]
    Io(#[from] std::io::Error),

    /// A webhook lifecycle method was called in a state that does not allow it.
    #[error("Operation not allowed while the webhook is {0:?}")]
    InvalidState(WebhookState),

    /// Represents an **internal logic error** or an invalid input that should
    /// have been caught earlier (e.g. a token that is not a valid header value).
    #[error("An internal library error occurred: {0}")]
    Internal(BoxError),
}

impl Error {
    pub(crate) fn internal(err: BoxError) -> Self {
        Self::Internal(err)
    }

    /// Returns the HTTP status of a [`Error::Request`] error.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Request(err) => Some(err.status),
            _ => None,
        }
    }

    /// Whether the platform rejected the request with `409 Conflict`,
    /// i.e. an equivalent resource already exists.
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(HTTP_CONFLICT)
    }
}

/// A non-2xx answer from the Zenvia API.
///
/// The error body is kept verbatim: when it is JSON it is parsed, otherwise it
/// is stored as a JSON string (or `null` for an empty body).
#[derive(thiserror::Error, Debug)]
#[error("{message}")]
#[non_exhaustive]
pub struct RequestError {
    pub(crate) status: StatusCode,
    pub(crate) message: &'static str,
    pub(crate) body: Value,
}

impl RequestError {
    pub(crate) fn new(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            message: "Unsuccessful request",
            body,
        }
    }

    /// The HTTP status code returned by the platform.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Always `"Unsuccessful request"`.
    pub fn message(&self) -> &str {
        self.message
    }

    /// The error payload sent by the platform.
    pub fn body(&self) -> &Value {
        &self.body
    }
}

/// A transport-level failure. The underlying error is available through
/// [`std::error::Error::source`] and [`TechnicalError::caused_by`].
#[derive(thiserror::Error, Debug)]
#[error("{message}")]
#[non_exhaustive]
pub struct TechnicalError {
    pub(crate) message: String,
    #[source]
    pub(crate) caused_by: BoxError,
}

impl TechnicalError {
    pub(crate) fn new(caused_by: BoxError) -> Self {
        Self {
            message: format!("Error: {caused_by}"),
            caused_by,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn caused_by(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.caused_by.as_ref()
    }
}

/// Represents an error that occurred during **data parsing or deserialization**
/// of a successful response.
///
/// # Fields
/// - `source`: the underlying `serde_json::Error`.
/// - `body`: the original raw content that could not be parsed, useful for
///   debugging.
#[derive(thiserror::Error, Debug)]
#[error("Failed to parse the response body. Raw body content was: '{}'.", body)]
#[non_exhaustive]
pub struct ParseError {
    #[source]
    pub(crate) source: serde_json::Error,
    pub body: String,
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        if value.is_builder() {
            // Request composition errors point to misconfiguration, not to the network.
            Self::internal(value.into())
        } else {
            Self::Technical(TechnicalError::new(value.into()))
        }
    }
}

/// A convenient type alias for a boxed, trait-object error that can be sent across threads.
pub type BoxError = Box<dyn StdError + Send + Sync>;
