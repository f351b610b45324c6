//! The Expo facade: message queueing, flattening, and dispatch.

use std::fmt;
use std::path::PathBuf;

use serde_json::Value;
use tracing::debug;

use crate::client::ExpoClient;
use crate::driver::{Driver, FileDriver};
use crate::message::ExpoMessage;
use crate::response::ExpoResponse;
use crate::subscriptions::SubscriptionManager;
use crate::token::{is_expo_push_token, validate_tokens};
use crate::{ExpoError, Result, Tokens};

/// Callback invoked with tokens whose tickets report `DeviceNotRegistered`.
type DevicesNotRegisteredHook = Box<dyn Fn(&[String]) + Send + Sync>;

/// Input accepted by [`Expo::send`].
#[derive(Debug)]
pub enum SendInput {
    /// A single message.
    Message(ExpoMessage),
    /// A list of messages.
    Messages(Vec<ExpoMessage>),
    /// Raw JSON: a list of attribute maps.
    Raw(Value),
}

impl From<ExpoMessage> for SendInput {
    fn from(message: ExpoMessage) -> Self {
        Self::Message(message)
    }
}

impl From<Vec<ExpoMessage>> for SendInput {
    fn from(messages: Vec<ExpoMessage>) -> Self {
        Self::Messages(messages)
    }
}

impl From<Value> for SendInput {
    fn from(value: Value) -> Self {
        Self::Raw(value)
    }
}

/// High-level entry point for sending Expo push notifications.
///
/// Accumulates messages and default recipients, flattens them into one
/// payload per (message, recipient) pair, dispatches the batch, and
/// correlates the returned tickets back to tokens by position.
///
/// ```no_run
/// use expo_push::{Expo, ExpoMessage};
///
/// # async fn example() -> expo_push::Result<()> {
/// let mut expo = Expo::new()?;
///
/// let message = ExpoMessage::new()
///     .title("Hello")
///     .body("World")
///     .to("ExpoPushToken[aaaabbbbccccdddd]")?;
///
/// let response = expo.send(message)?.push().await?;
/// assert!(response.ok());
/// # Ok(())
/// # }
/// ```
///
/// State is instance-local; a facade is meant to be driven by one task at a
/// time.
pub struct Expo {
    client: ExpoClient,
    subscriptions: Option<SubscriptionManager>,
    messages: Vec<ExpoMessage>,
    recipients: Option<Vec<String>>,
    devices_not_registered_hook: Option<DevicesNotRegisteredHook>,
}

impl Expo {
    /// Create a facade without subscription storage.
    pub fn new() -> Result<Self> {
        Ok(Self::with_client(ExpoClient::new()?))
    }

    /// Create a facade over a custom client.
    pub fn with_client(client: ExpoClient) -> Self {
        Self {
            client,
            subscriptions: None,
            messages: Vec::new(),
            recipients: None,
            devices_not_registered_hook: None,
        }
    }

    /// Create a facade with a storage backend for subscriptions.
    pub fn with_driver(driver: Driver) -> Result<Self> {
        let mut expo = Self::new()?;
        expo.subscriptions = Some(SubscriptionManager::new(driver));
        Ok(expo)
    }

    /// Create a facade backed by a file-based subscription store.
    pub async fn file(path: impl Into<PathBuf>) -> Result<Self> {
        let driver = FileDriver::new(path).await?;
        Self::with_driver(Driver::File(driver))
    }

    /// Attach a subscription storage backend.
    pub fn set_driver(&mut self, driver: Driver) -> &mut Self {
        self.subscriptions = Some(SubscriptionManager::new(driver));
        self
    }

    /// Set the Expo access token used for authenticated requests.
    pub fn set_access_token(&mut self, access_token: impl Into<String>) -> &mut Self {
        self.client.set_access_token(access_token);
        self
    }

    /// Register the callback invoked after a push for every token whose
    /// ticket reports `DeviceNotRegistered`.
    pub fn on_devices_not_registered(
        &mut self,
        hook: impl Fn(&[String]) + Send + Sync + 'static,
    ) -> &mut Self {
        self.devices_not_registered_hook = Some(Box::new(hook));
        self
    }

    /// Check if a value is a well-formed Expo push token.
    pub fn is_expo_push_token(&self, value: &str) -> bool {
        is_expo_push_token(value)
    }

    /// Queue the messages to send, replacing any previously queued ones.
    ///
    /// Accepts a message, a list of messages, or raw JSON attribute maps
    /// wrapped in a list. A bare single map is ambiguous and rejected.
    pub fn send(&mut self, input: impl Into<SendInput>) -> Result<&mut Self> {
        self.messages = match input.into() {
            SendInput::Message(message) => vec![message],
            SendInput::Messages(messages) => messages,
            SendInput::Raw(Value::Array(items)) => items
                .into_iter()
                .map(ExpoMessage::try_from_value)
                .collect::<Result<_>>()?,
            SendInput::Raw(_) => return Err(ExpoError::AmbiguousSendInput),
        };

        Ok(self)
    }

    /// Set the default recipients for messages without their own.
    pub fn to(&mut self, recipients: impl Into<Tokens>) -> Result<&mut Self> {
        self.recipients = Some(validate_tokens(recipients)?);
        Ok(self)
    }

    /// Use a channel's subscriptions as the default recipients.
    pub async fn to_channel(&mut self, channel: &str) -> Result<&mut Self> {
        self.recipients = self.get_subscriptions(channel).await?;
        Ok(self)
    }

    /// Send the queued messages.
    ///
    /// Flattens every message to one payload per recipient, preserving
    /// message order then per-message recipient order; that flat ordering is
    /// the positional key correlating response tickets back to tokens.
    /// Queued state is reset before the network call, so a failed send never
    /// leaves stale messages behind.
    pub async fn push(&mut self) -> Result<ExpoResponse> {
        if self.messages.is_empty() {
            return Err(ExpoError::NoMessages);
        }

        let mut payloads = Vec::new();

        for message in &self.messages {
            let mut payload = message.to_payload();

            let recipients: Vec<String> = match payload.remove("to") {
                Some(Value::Array(tokens)) => tokens
                    .into_iter()
                    .filter_map(|token| token.as_str().map(str::to_owned))
                    .collect(),
                Some(Value::String(token)) => vec![token],
                _ => self.recipients.clone().unwrap_or_default(),
            };

            if recipients.is_empty() {
                return Err(ExpoError::MissingRecipient);
            }

            for recipient in recipients {
                let mut flattened = payload.clone();
                flattened.insert("to".into(), Value::String(recipient));
                payloads.push(Value::Object(flattened));
            }
        }

        self.reset();

        let response = self.client.send_push_notifications(&payloads).await?;

        if let Some(hook) = &self.devices_not_registered_hook {
            let mut stale: Vec<String> = Vec::new();

            // Tickets line up with the flattened payloads by index.
            for (ticket, payload) in response.tickets().iter().zip(&payloads) {
                if !ticket.is_device_not_registered() {
                    continue;
                }
                if let Some(token) = payload.get("to").and_then(Value::as_str)
                    && !stale.iter().any(|t| t == token)
                {
                    stale.push(token.to_owned());
                }
            }

            if !stale.is_empty() {
                debug!(count = stale.len(), "invoking devices-not-registered hook");
                hook(&stale);
            }
        }

        Ok(response)
    }

    /// Fetch receipts for previously returned ticket IDs.
    pub async fn get_receipts(&self, ticket_ids: &[String]) -> Result<ExpoResponse> {
        self.client.get_push_notification_receipts(ticket_ids).await
    }

    /// Subscribe tokens to a channel.
    pub async fn subscribe(&self, channel: &str, tokens: impl Into<Tokens>) -> Result<bool> {
        self.manager()?.subscribe(channel, tokens).await
    }

    /// Unsubscribe tokens from a channel.
    pub async fn unsubscribe(&self, channel: &str, tokens: impl Into<Tokens>) -> Result<bool> {
        self.manager()?.unsubscribe(channel, tokens).await
    }

    /// A channel's subscriptions, or `None` when it has no entries.
    pub async fn get_subscriptions(&self, channel: &str) -> Result<Option<Vec<String>>> {
        self.manager()?.get_subscriptions(channel).await
    }

    /// Whether a channel has any subscriptions.
    pub async fn has_subscriptions(&self, channel: &str) -> Result<bool> {
        Ok(self
            .get_subscriptions(channel)
            .await?
            .is_some_and(|subscriptions| !subscriptions.is_empty()))
    }

    /// The currently queued messages.
    pub fn messages(&self) -> &[ExpoMessage] {
        &self.messages
    }

    /// The current default recipients.
    pub fn recipients(&self) -> Option<&[String]> {
        self.recipients.as_deref()
    }

    /// Clear queued messages and default recipients.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.recipients = None;
    }

    fn manager(&self) -> Result<&SubscriptionManager> {
        self.subscriptions.as_ref().ok_or(ExpoError::MissingDriver)
    }
}

impl fmt::Debug for Expo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expo")
            .field("messages", &self.messages.len())
            .field("recipients", &self.recipients)
            .field("has_driver", &self.subscriptions.is_some())
            .field(
                "has_hook",
                &self.devices_not_registered_hook.is_some(),
            )
            .finish_non_exhaustive()
    }
}
