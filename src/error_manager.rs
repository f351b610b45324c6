//! Classification of error responses from the Expo API.
//!
//! Non-200 responses arrive either as a JSON error document with an `errors`
//! list or as opaque text (HTML error pages, proxies, truncated bodies).
//! Everything funnels into a single structured [`ExpoError`].

use serde_json::Value;

use crate::ExpoError;

/// Parse a non-200 response into a structured error.
///
/// Bodies that are not JSON, or that carry no `errors` list, fall back to a
/// text error embedding the raw body.
pub fn parse_error_response(status: u16, body: &str) -> ExpoError {
    let Ok(result) = serde_json::from_str::<Value>(body) else {
        return text_response_error(body, status);
    };

    if result.is_null() || !response_has_errors(&result) {
        return text_response_error(body, status);
    }

    error_from_result(&result, status)
}

/// Build an error from a raw response body.
pub fn text_response_error(body: &str, status: u16) -> ExpoError {
    ExpoError::TextResponse {
        status,
        body: body.to_owned(),
    }
}

/// Build an error from the first entry of a parsed `errors` list.
///
/// A string API code is folded into the message as `"<code>: <message>"` and
/// the numeric code normalized to the HTTP status; a numeric code is used
/// directly when it fits a `u16`, with the HTTP status standing in otherwise.
pub fn error_from_result(result: &Value, status: u16) -> ExpoError {
    let Some(error) = result
        .get("errors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
    else {
        return ExpoError::Api {
            message: "Expected at least one error from Expo. Found none".to_owned(),
            code: status,
            details: None,
        };
    };

    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();
    let details = error.get("details").cloned();

    let (message, code) = match error.get("code") {
        Some(Value::String(code)) => (format!("{code}: {message}"), status),
        Some(Value::Number(code)) => {
            let code = code
                .as_u64()
                .and_then(|code| u16::try_from(code).ok())
                .unwrap_or(status);
            (message, code)
        }
        _ => (message, status),
    };

    ExpoError::Api {
        message,
        code,
        details,
    }
}

/// Whether a parsed response body carries a non-empty `errors` list.
pub fn response_has_errors(result: &Value) -> bool {
    result
        .get("errors")
        .and_then(Value::as_array)
        .is_some_and(|errors| !errors.is_empty())
}
