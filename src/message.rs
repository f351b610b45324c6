//! Push notification message builder.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::token::validate_tokens;
use crate::{ExpoError, Result, Tokens};

/// Message delivery priority.
///
/// `Default` defers to each platform's own default (normal on Android,
/// high on iOS).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Use the platform default.
    #[default]
    Default,
    /// Normal priority.
    Normal,
    /// High priority (may wake the device).
    High,
}

impl FromStr for Priority {
    type Err = ExpoError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            _ => Err(ExpoError::InvalidPriority(value.to_owned())),
        }
    }
}

/// An Expo push message in the service's request format.
///
/// Built with chainable setters; unset fields are omitted entirely from the
/// wire payload. `priority` and `mutable_content` have non-null defaults and
/// are always present.
///
/// ```
/// use expo_push::ExpoMessage;
///
/// let message = ExpoMessage::new()
///     .title("Bazaar")
///     .body("Order shipped!")
///     .play_sound();
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExpoMessage {
    to: Option<Vec<String>>,
    data: Option<Value>,
    title: Option<String>,
    body: Option<String>,
    ttl: Option<u32>,
    expiration: Option<i64>,
    priority: Priority,
    subtitle: Option<String>,
    sound: Option<String>,
    badge: Option<u32>,
    channel_id: Option<String>,
    category_id: Option<String>,
    mutable_content: bool,
}

impl ExpoMessage {
    /// Create an empty message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the recipients of this message.
    ///
    /// Malformed tokens are dropped silently; errors when no valid token
    /// remains.
    pub fn to(mut self, tokens: impl Into<Tokens>) -> Result<Self> {
        self.to = Some(validate_tokens(tokens)?);
        Ok(self)
    }

    /// Set the JSON object delivered to the app.
    ///
    /// Accepts `Null` (clears the field) or an object; an empty object is
    /// kept as an explicit `{}` in the payload, distinguishing it from "no
    /// data". Arrays and primitives are rejected.
    pub fn data(mut self, data: Value) -> Result<Self> {
        match data {
            Value::Null => self.data = None,
            Value::Object(map) => self.data = Some(Value::Object(map)),
            other => {
                return Err(ExpoError::InvalidMessageData(json_type_name(&other).to_owned()));
            }
        }

        Ok(self)
    }

    /// Set the notification title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the notification body.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Seconds the message may be kept around for redelivery.
    pub fn ttl(mut self, seconds: u32) -> Self {
        self.ttl = Some(seconds);
        self
    }

    /// Unix timestamp at which the message expires.
    ///
    /// Same effect as `ttl`; when both are set the service lets `ttl` take
    /// precedence. Both may be set here.
    pub fn expiration(mut self, epoch: i64) -> Self {
        self.expiration = Some(epoch);
        self
    }

    /// Set the delivery priority: `default`, `normal` or `high`
    /// (case-insensitive).
    pub fn priority(mut self, priority: &str) -> Result<Self> {
        self.priority = priority.parse()?;
        Ok(self)
    }

    /// Set the subtitle displayed below the title (iOS).
    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    /// Set the sound to play on receipt (iOS).
    pub fn sound(mut self, sound: impl Into<String>) -> Self {
        self.sound = Some(sound.into());
        self
    }

    /// Play the device's default notification sound (iOS).
    pub fn play_sound(self) -> Self {
        self.sound("default")
    }

    /// Number to display in the app icon badge; zero clears it (iOS).
    pub fn badge(mut self, badge: u32) -> Self {
        self.badge = Some(badge);
        self
    }

    /// Android notification channel through which to display this message.
    pub fn channel_id(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }

    /// Notification category this message is associated with.
    pub fn category_id(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    /// Whether the client app may intercept this notification (iOS).
    pub fn mutable_content(mut self, mutable: bool) -> Self {
        self.mutable_content = mutable;
        self
    }

    /// Build a message from a raw attribute map.
    ///
    /// Each known key is routed through its setter so the usual validation
    /// applies; unknown keys are ignored.
    pub fn try_from_value(value: Value) -> Result<Self> {
        let attributes = match value {
            Value::Object(attributes) => attributes,
            other => {
                return Err(ExpoError::InvalidMessageData(json_type_name(&other).to_owned()));
            }
        };

        let mut message = Self::new();

        for (key, value) in attributes {
            message = match key.as_str() {
                "to" => match value {
                    Value::String(token) => message.to(token)?,
                    Value::Array(tokens) => {
                        let tokens: Vec<String> = tokens
                            .into_iter()
                            .filter_map(|t| t.as_str().map(str::to_owned))
                            .collect();
                        message.to(tokens)?
                    }
                    _ => message,
                },
                "data" => message.data(value)?,
                "title" => apply_string(message, value, |m, s| m.title(s)),
                "body" => apply_string(message, value, |m, s| m.body(s)),
                "ttl" => match value.as_u64() {
                    Some(ttl) => message.ttl(ttl as u32),
                    None => message,
                },
                "expiration" => match value.as_i64() {
                    Some(epoch) => message.expiration(epoch),
                    None => message,
                },
                "priority" => match value.as_str() {
                    Some(priority) => message.priority(priority)?,
                    None => message,
                },
                "subtitle" => apply_string(message, value, |m, s| m.subtitle(s)),
                "sound" => apply_string(message, value, |m, s| m.sound(s)),
                "badge" => match value.as_u64() {
                    Some(badge) => message.badge(badge as u32),
                    None => message,
                },
                "channelId" => apply_string(message, value, |m, s| m.channel_id(s)),
                "categoryId" => apply_string(message, value, |m, s| m.category_id(s)),
                "mutableContent" => match value.as_bool() {
                    Some(mutable) => message.mutable_content(mutable),
                    None => message,
                },
                _ => message,
            };
        }

        Ok(message)
    }

    /// Serialize to the flat key/value request payload.
    ///
    /// Unset fields are omitted; there are no null placeholders on the wire.
    pub fn to_payload(&self) -> Map<String, Value> {
        let mut payload = Map::new();

        if let Some(to) = &self.to {
            payload.insert("to".into(), json!(to));
        }
        if let Some(data) = &self.data {
            payload.insert("data".into(), data.clone());
        }
        if let Some(title) = &self.title {
            payload.insert("title".into(), json!(title));
        }
        if let Some(body) = &self.body {
            payload.insert("body".into(), json!(body));
        }
        if let Some(ttl) = self.ttl {
            payload.insert("ttl".into(), json!(ttl));
        }
        if let Some(expiration) = self.expiration {
            payload.insert("expiration".into(), json!(expiration));
        }
        payload.insert("priority".into(), json!(self.priority));
        if let Some(subtitle) = &self.subtitle {
            payload.insert("subtitle".into(), json!(subtitle));
        }
        if let Some(sound) = &self.sound {
            payload.insert("sound".into(), json!(sound));
        }
        if let Some(badge) = self.badge {
            payload.insert("badge".into(), json!(badge));
        }
        if let Some(channel_id) = &self.channel_id {
            payload.insert("channelId".into(), json!(channel_id));
        }
        if let Some(category_id) = &self.category_id {
            payload.insert("categoryId".into(), json!(category_id));
        }
        payload.insert("mutableContent".into(), json!(self.mutable_content));

        payload
    }
}

fn apply_string(
    message: ExpoMessage,
    value: Value,
    setter: impl FnOnce(ExpoMessage, String) -> ExpoMessage,
) -> ExpoMessage {
    match value {
        Value::String(s) => setter(message, s),
        _ => message,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_message_serializes_only_defaults() {
        let payload = ExpoMessage::new().to_payload();

        assert_eq!(payload.len(), 2);
        assert_eq!(payload["priority"], json!("default"));
        assert_eq!(payload["mutableContent"], json!(false));
    }

    #[test]
    fn only_explicitly_set_fields_appear() {
        let payload = ExpoMessage::new().title("T").to_payload();

        assert_eq!(payload["title"], json!("T"));
        assert!(!payload.contains_key("body"));
        assert!(!payload.contains_key("ttl"));
        assert!(!payload.contains_key("sound"));
    }

    #[test]
    fn invalid_recipients_are_dropped() {
        let message = ExpoMessage::new()
            .to(vec!["ExponentPushToken[aaaabbbbccccdddd]", "invalid-token]"])
            .unwrap();

        assert_eq!(
            message.to_payload()["to"],
            json!(["ExponentPushToken[aaaabbbbccccdddd]"])
        );
    }

    #[test]
    fn recipients_with_no_valid_token_error() {
        let result = ExpoMessage::new().to("not-a-token");
        assert!(matches!(result, Err(ExpoError::NoValidTokens)));
    }

    #[test]
    fn data_accepts_objects_and_null() {
        let message = ExpoMessage::new().data(json!({"k": "v"})).unwrap();
        assert_eq!(message.to_payload()["data"], json!({"k": "v"}));

        let message = ExpoMessage::new().data(Value::Null).unwrap();
        assert!(!message.to_payload().contains_key("data"));
    }

    #[test]
    fn empty_data_object_is_kept_explicitly() {
        let message = ExpoMessage::new().data(json!({})).unwrap();
        assert_eq!(message.to_payload()["data"], json!({}));
    }

    #[test]
    fn data_rejects_arrays_and_primitives() {
        assert!(matches!(
            ExpoMessage::new().data(json!([1, 2])),
            Err(ExpoError::InvalidMessageData(kind)) if kind == "array"
        ));
        assert!(matches!(
            ExpoMessage::new().data(json!(42)),
            Err(ExpoError::InvalidMessageData(kind)) if kind == "number"
        ));
    }

    #[test]
    fn priority_is_case_insensitive() {
        let message = ExpoMessage::new().priority("HIGH").unwrap();
        assert_eq!(message.to_payload()["priority"], json!("high"));
    }

    #[test]
    fn unknown_priority_errors() {
        assert!(matches!(
            ExpoMessage::new().priority("urgent"),
            Err(ExpoError::InvalidPriority(value)) if value == "urgent"
        ));
    }

    #[test]
    fn play_sound_sets_the_default_sound() {
        let payload = ExpoMessage::new().play_sound().to_payload();
        assert_eq!(payload["sound"], json!("default"));
    }

    #[test]
    fn ttl_and_expiration_may_coexist() {
        let payload = ExpoMessage::new().ttl(60).expiration(1_700_000_000).to_payload();
        assert_eq!(payload["ttl"], json!(60));
        assert_eq!(payload["expiration"], json!(1_700_000_000i64));
    }

    #[test]
    fn builds_from_a_raw_attribute_map() {
        let message = ExpoMessage::try_from_value(json!({
            "to": ["ExpoPushToken[aaaabbbbccccdddd]"],
            "title": "T",
            "body": "B",
            "badge": 3,
            "channelId": "promo",
            "mutableContent": true,
            "unknownKey": "ignored",
        }))
        .unwrap();

        let payload = message.to_payload();
        assert_eq!(payload["to"], json!(["ExpoPushToken[aaaabbbbccccdddd]"]));
        assert_eq!(payload["badge"], json!(3));
        assert_eq!(payload["channelId"], json!("promo"));
        assert_eq!(payload["mutableContent"], json!(true));
        assert!(!payload.contains_key("unknownKey"));
    }

    #[test]
    fn raw_map_validation_still_applies() {
        let result = ExpoMessage::try_from_value(json!({"priority": "urgent"}));
        assert!(matches!(result, Err(ExpoError::InvalidPriority(_))));
    }

    #[test]
    fn non_object_raw_input_errors() {
        let result = ExpoMessage::try_from_value(json!([1, 2]));
        assert!(matches!(result, Err(ExpoError::InvalidMessageData(_))));
    }
}
