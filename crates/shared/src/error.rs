use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error body returned by the prediction service on non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }

    /// Extracts a usable `error` message from an arbitrary JSON body.
    ///
    /// Empty strings and non-string values count as absent.
    pub fn message_from(body: &Value) -> Option<String> {
        body.get("error")
            .and_then(Value::as_str)
            .filter(|message| !message.is_empty())
            .map(str::to_string)
    }
}
