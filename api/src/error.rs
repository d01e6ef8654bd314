use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("failed to build http client: {0}")]
    BuildClient(#[source] reqwest::Error),

    #[error("invalid api url {url}: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("{message} ({status})")]
    Remote { status: u16, message: String },

    #[error("payment provider rejected card: {0}")]
    Rejected(String),
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<ProviderErrorBody>,
}

#[derive(Deserialize)]
struct ProviderErrorBody {
    message: Option<String>,
}

impl ApiError {
    /// Build an error from a non-success response, preferring the JSON `message` field.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|body| {
                body.message
                    .or_else(|| body.error.and_then(|error| error.message))
            })
            .unwrap_or_else(|| {
                let body = body.trim();
                if body.is_empty() {
                    format!("request failed with status {status}")
                } else {
                    body.to_owned()
                }
            });
        ApiError::Remote { status, message }
    }

    /// Human-readable message for display in the error banner.
    pub fn message(&self) -> String {
        match self {
            ApiError::Remote { message, .. } => message.clone(),
            ApiError::Rejected(message) => message.clone(),
            other => other.to_string(),
        }
    }
}
