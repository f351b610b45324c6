//! HTTP client for the Expo push API.

use std::io::Write;
use std::time::Duration;

use flate2::Compression;
use flate2::write::GzEncoder;
use reqwest::header::{ACCEPT, ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_TYPE};
use serde_json::{Value, json};
use tracing::debug;

use crate::error_manager;
use crate::{ExpoError, ExpoResponse, Result};

/// Base URL of the Expo push API.
pub const EXPO_BASE_URL: &str = "https://exp.host/--/api/v2";

/// Request bodies above this size are gzip-compressed.
const COMPRESSION_THRESHOLD: usize = 1024;

/// Client for the Expo push endpoints.
///
/// Stateless between calls apart from the held access token; every call is
/// independent and safely retryable by the caller.
#[derive(Debug, Clone)]
pub struct ExpoClient {
    http: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

impl ExpoClient {
    /// Create a client against the production Expo API.
    pub fn new() -> Result<Self> {
        Self::with_base_url(EXPO_BASE_URL)
    }

    /// Create a client against a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            access_token: None,
        })
    }

    /// Set the Expo access token sent as a bearer credential.
    pub fn set_access_token(&mut self, access_token: impl Into<String>) {
        self.access_token = Some(access_token.into());
    }

    /// Send a batch of flattened message payloads to `/push/send`.
    ///
    /// The response must carry exactly one ticket per recipient, in input
    /// order; any other shape raises a structured error.
    pub async fn send_push_notifications(&self, messages: &[Value]) -> Result<ExpoResponse> {
        let expected = expected_ticket_count(messages);
        let (body, compressed) = compress_body(serde_json::to_vec(messages)?);

        debug!(
            payloads = messages.len(),
            expected_tickets = expected,
            compressed,
            "sending push notifications"
        );

        let (status, text) = self.post("/push/send", body, compressed).await?;

        if status != 200 {
            return Err(error_manager::parse_error_response(status, &text));
        }

        let result: Value = match serde_json::from_str(&text) {
            Ok(Value::Null) | Err(_) => {
                return Err(error_manager::text_response_error(&text, status));
            }
            Ok(result) => result,
        };

        if result.get("errors").is_some() {
            return Err(error_manager::error_from_result(&result, status));
        }

        match result.get("data").and_then(Value::as_array).map(Vec::len) {
            Some(received) if received == expected => {}
            received => {
                return Err(ExpoError::TicketCountMismatch {
                    expected,
                    received: received.unwrap_or(0),
                });
            }
        }

        Ok(ExpoResponse::new(status, result))
    }

    /// Fetch push receipts for previously returned ticket IDs.
    pub async fn get_push_notification_receipts(
        &self,
        ticket_ids: &[String],
    ) -> Result<ExpoResponse> {
        let (body, compressed) = compress_body(serde_json::to_vec(&json!({ "ids": ticket_ids }))?);

        debug!(ids = ticket_ids.len(), compressed, "fetching push receipts");

        let (status, text) = self.post("/push/getReceipts", body, compressed).await?;

        if status != 200 {
            return Err(ExpoError::RequestFailed(status));
        }

        let Ok(result) = serde_json::from_str::<Value>(&text) else {
            return Err(ExpoError::MalformedReceipts);
        };

        // Receipts come back as a map from ticket ID to receipt.
        if !matches!(result.get("data"), Some(Value::Object(_) | Value::Array(_))) {
            return Err(ExpoError::MalformedReceipts);
        }

        Ok(ExpoResponse::new(status, result))
    }

    async fn post(&self, path: &str, body: Vec<u8>, compressed: bool) -> Result<(u16, String)> {
        let mut request = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .header(ACCEPT, "application/json")
            .header(ACCEPT_ENCODING, "gzip, deflate")
            .header(CONTENT_TYPE, "application/json");

        if compressed {
            request = request.header(CONTENT_ENCODING, "gzip");
        }
        if let Some(access_token) = &self.access_token {
            request = request.bearer_auth(access_token);
        }

        let response = request.body(body).send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        Ok((status, text))
    }
}

/// Gzip-compress a request body larger than 1 KiB.
///
/// Falls back to the uncompressed body when compression fails; oversized
/// uncompressed requests are the API's call to reject, not ours.
fn compress_body(body: Vec<u8>) -> (Vec<u8>, bool) {
    if body.len() <= COMPRESSION_THRESHOLD {
        return (body, false);
    }

    let mut encoder = GzEncoder::new(Vec::new(), Compression::new(6));
    if encoder.write_all(&body).is_err() {
        return (body, false);
    }

    match encoder.finish() {
        Ok(compressed) => (compressed, true),
        Err(_) => (body, false),
    }
}

/// Count the recipients across a batch by wrap-counting each `to` field.
///
/// Flattened payloads always carry a single token, but the count is derived
/// generically so un-flattened input still maps to the right ticket count.
fn expected_ticket_count(messages: &[Value]) -> usize {
    messages
        .iter()
        .map(|message| match message.get("to") {
            Some(Value::Array(recipients)) => recipients.len(),
            Some(Value::String(_)) => 1,
            _ => 0,
        })
        .sum()
}
