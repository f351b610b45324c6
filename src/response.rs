//! Parsed responses from the Expo API.

use serde::Deserialize;
use serde_json::Value;

/// A parsed response from the Expo API.
#[derive(Debug, Clone)]
pub struct ExpoResponse {
    body: Value,
    status: u16,
}

impl ExpoResponse {
    /// Wrap a parsed response body and its HTTP status.
    pub fn new(status: u16, body: Value) -> Self {
        Self { body, status }
    }

    /// Whether the request succeeded: status 200 and no `errors` key.
    pub fn ok(&self) -> bool {
        self.status == 200 && self.body.get("errors").is_none()
    }

    /// The HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// The `data` portion of a successful response.
    pub fn data(&self) -> Option<&Value> {
        if self.ok() { self.body.get("data") } else { None }
    }

    /// The `errors` portion of a failed response.
    pub fn errors(&self) -> Option<&Value> {
        if self.ok() { None } else { self.body.get("errors") }
    }

    /// Typed view of the push tickets in `data`.
    ///
    /// Tickets correspond to the submitted payloads by index; that positional
    /// ordering is the only correlation back to the originating tokens, so an
    /// entry that fails to parse becomes an empty ticket rather than shifting
    /// or discarding its neighbours.
    pub fn tickets(&self) -> Vec<Ticket> {
        self.data()
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .map(|entry| serde_json::from_value(entry.clone()).unwrap_or_default())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// One push ticket, returned per submitted payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ticket {
    /// `ok` or `error`.
    #[serde(default)]
    pub status: Option<String>,
    /// Receipt ID, present on accepted tickets.
    #[serde(default)]
    pub id: Option<String>,
    /// Error description, present on rejected tickets.
    #[serde(default)]
    pub message: Option<String>,
    /// Error details; `details.error` holds the machine-readable code.
    #[serde(default)]
    pub details: Option<Value>,
}

impl Ticket {
    /// The machine-readable error code, e.g. `DeviceNotRegistered`.
    pub fn error_code(&self) -> Option<&str> {
        self.details
            .as_ref()
            .and_then(|details| details.get("error"))
            .and_then(Value::as_str)
    }

    /// Whether this ticket reports a permanently invalid recipient.
    pub fn is_device_not_registered(&self) -> bool {
        self.error_code() == Some("DeviceNotRegistered")
    }
}
