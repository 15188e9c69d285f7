use thiserror::Error;

pub const NETWORK_ERROR_PREFIX: &str = "network request failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionErrorKind {
    Network,
    Http,
    Decode,
    Timeout,
    Cancelled,
}

/// Failure of a call to the prediction service.
///
/// `Display` yields the message shown to the user in the connection banner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct PredictionError {
    pub kind: PredictionErrorKind,
    pub message: String,
    pub status: Option<u16>,
}

impl PredictionError {
    fn new(kind: PredictionErrorKind, message: impl Into<String>, status: Option<u16>) -> Self {
        Self {
            kind,
            message: message.into(),
            status,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PredictionErrorKind::Network, message, None)
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::new(PredictionErrorKind::Http, message, Some(status))
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(PredictionErrorKind::Decode, message, None)
    }

    pub fn timeout() -> Self {
        Self::new(
            PredictionErrorKind::Timeout,
            "prediction service did not respond before the deadline",
            None,
        )
    }

    pub fn cancelled() -> Self {
        Self::new(
            PredictionErrorKind::Cancelled,
            "prediction request was cancelled",
            None,
        )
    }

    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::timeout();
        }
        Self::network(format!("{NETWORK_ERROR_PREFIX}: {err}"))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid api base url '{raw}': {source}")]
    InvalidBaseUrl {
        raw: String,
        source: url::ParseError,
    },
    #[error("unsupported api base url scheme '{scheme}' (expected http or https)")]
    UnsupportedScheme { scheme: String },
}
