use axum::http::StatusCode;
use common_http_errors::ApiError;
use thiserror::Error;

use crate::resources::Resource;

/// Caller-visible text for every token failure.
pub const TOKEN_FAILURE_MESSAGE: &str = "Failed to get token";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token endpoint unreachable: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("token endpoint returned HTTP {status}")]
    Rejected { status: StatusCode, body: String },
    #[error("token response could not be decoded: {0}")]
    Decode(String),
}

impl AuthError {
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::Transport(_) => "transport",
            AuthError::Rejected { .. } => "rejected",
            AuthError::Decode(_) => "decode",
        }
    }

    pub fn public_message(&self) -> &'static str {
        TOKEN_FAILURE_MESSAGE
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{resource}: {source}")]
    Auth {
        resource: Resource,
        #[source]
        source: AuthError,
    },
    #[error("{resource} request failed: {source}")]
    Transport {
        resource: Resource,
        #[source]
        source: reqwest::Error,
    },
    #[error("{resource} returned HTTP {status}")]
    Rejected {
        resource: Resource,
        status: StatusCode,
        body: String,
    },
    #[error("{resource} payload is not JSON: {reason}")]
    Decode { resource: Resource, reason: String },
}

impl FetchError {
    pub fn resource(&self) -> Resource {
        match self {
            FetchError::Auth { resource, .. }
            | FetchError::Transport { resource, .. }
            | FetchError::Rejected { resource, .. }
            | FetchError::Decode { resource, .. } => *resource,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Auth { .. } => "auth",
            FetchError::Transport { .. } => "transport",
            FetchError::Rejected { .. } => "rejected",
            FetchError::Decode { .. } => "decode",
        }
    }

    /// The only text an HTTP caller sees, e.g. `Failed to fetch reg types`.
    pub fn public_message(&self) -> String {
        self.resource().descriptor().failure_message()
    }
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        let descriptor = err.resource().descriptor();
        ApiError::upstream(descriptor.error_code, err.public_message())
    }
}

#[derive(Debug, Error)]
pub enum ChargeError {
    /// The processor refused the charge (card declined, invalid source, bad params).
    #[error("charge declined ({status}): {message}")]
    Declined {
        status: StatusCode,
        code: Option<String>,
        message: String,
    },
    #[error("payment processor unreachable: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("payment processor response could not be decoded: {0}")]
    Decode(String),
}

impl ChargeError {
    pub fn kind(&self) -> &'static str {
        match self {
            ChargeError::Declined { .. } => "declined",
            ChargeError::Transport(_) => "transport",
            ChargeError::Decode(_) => "decode",
        }
    }

    /// Message returned to the client in `ChargeResult.message`.
    pub fn public_message(&self) -> String {
        match self {
            ChargeError::Declined { message, .. } => message.clone(),
            ChargeError::Transport(_) => {
                "An error occurred with our connection to the payment processor.".to_string()
            }
            ChargeError::Decode(_) => "Unexpected response from the payment processor.".to_string(),
        }
    }
}
