//! Error types for the Expo push SDK.

use serde_json::Value;
use thiserror::Error;

/// Result type for SDK operations.
pub type Result<T> = std::result::Result<T, ExpoError>;

/// Errors raised by the Expo push SDK.
///
/// API-reported failures surface as [`ExpoError::Api`] with the numeric code
/// and any details the service attached; transport and response-shape
/// failures carry a message only.
#[derive(Debug, Error)]
pub enum ExpoError {
    /// Message data was not a JSON object or null.
    #[error("message data must be a JSON object or null, {0} given")]
    InvalidMessageData(String),

    /// Priority outside of default/normal/high.
    #[error("priority must be default, normal or high, got \"{0}\"")]
    InvalidPriority(String),

    /// Token validation left no valid tokens behind.
    #[error("no valid Expo push tokens were provided")]
    NoValidTokens,

    /// Subscription tokens were empty.
    #[error("tokens must be a string or non-empty list")]
    InvalidTokens,

    /// A queued message had no recipients and no defaults were set.
    #[error("a message must have at least one recipient to send")]
    MissingRecipient,

    /// `send` was given a bare attribute map instead of a message list.
    #[error("send accepts a message or a list of messages")]
    AmbiguousSendInput,

    /// `push` was called with an empty message queue.
    #[error("you must have at least one message to push")]
    NoMessages,

    /// A subscription operation was attempted without a storage driver.
    #[error("you must provide a driver to interact with subscriptions")]
    MissingDriver,

    /// The ticket count in the response did not match the submitted batch.
    #[error("expected Expo to respond with {expected} ticket(s) but received {received}")]
    TicketCountMismatch {
        /// Tickets the batch should have produced.
        expected: usize,
        /// Tickets actually present in the response.
        received: usize,
    },

    /// The service responded with a body that is not a JSON error document.
    #[error("Expo responded with an error with status code: {status}: {body}")]
    TextResponse {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// An error reported by the Expo API itself.
    #[error("{message}")]
    Api {
        /// Human-readable error message.
        message: String,
        /// Numeric error code (HTTP status when the API code was a string).
        code: u16,
        /// Additional details attached by the API, if any.
        details: Option<Value>,
    },

    /// A receipts request failed with a non-200 status.
    #[error("request failed with status code {0}")]
    RequestFailed(u16),

    /// The receipts response did not contain the expected data shape.
    #[error("expected Expo to respond with a map from receipt IDs to receipts")]
    MalformedReceipts,

    /// The subscription storage file does not exist.
    #[error("the file {0} does not exist")]
    FileDoesNotExist(String),

    /// The subscription storage file is not a `.json` file.
    #[error("the storage file {0} must have a .json extension")]
    InvalidStorageFile(String),

    /// Subscription storage I/O failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Transport-level HTTP failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization failure.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExpoError {
    /// The numeric code carried by API-derived errors.
    pub fn code(&self) -> Option<u16> {
        match self {
            Self::Api { code, .. } => Some(*code),
            Self::TextResponse { status, .. } | Self::RequestFailed(status) => Some(*status),
            _ => None,
        }
    }

    /// Details attached by the API, if any.
    pub fn details(&self) -> Option<&Value> {
        match self {
            Self::Api { details, .. } => details.as_ref(),
            _ => None,
        }
    }
}
