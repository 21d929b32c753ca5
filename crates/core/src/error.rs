//! Error types for the Wrenchwise domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Provider failures are data the cascade inspects, so `ProviderError` is
//! `Clone` and `Serialize`.

use serde::Serialize;
use thiserror::Error;

/// The top-level error type for Wrenchwise operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// A failure reported by the Model Invocation Provider.
///
/// Every variant carries a human-readable message; HTTP-backed variants also
/// carry the numeric status the provider answered with.
#[derive(Debug, Clone, Error, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider: {0}")]
    RateLimited(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Numeric status associated with this failure, when the provider gave one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiError { status_code, .. } => Some(*status_code),
            Self::RateLimited(_) => Some(429),
            Self::AuthenticationFailed(_) => Some(401),
            Self::InvalidRequest(_) => Some(400),
            _ => None,
        }
    }

    /// Build an error from an HTTP status and response body.
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status_code {
            429 => Self::RateLimited(message),
            401 | 403 => Self::AuthenticationFailed(message),
            400 => Self::InvalidRequest(message),
            _ => Self::ApiError {
                status_code,
                message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 503,
            message: "Service unavailable".into(),
        });
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("Service unavailable"));
    }

    #[test]
    fn status_codes_map_to_variants() {
        assert!(matches!(
            ProviderError::from_status(429, "slow down"),
            ProviderError::RateLimited(_)
        ));
        assert!(matches!(
            ProviderError::from_status(403, "denied"),
            ProviderError::AuthenticationFailed(_)
        ));
        assert_eq!(
            ProviderError::from_status(500, "boom").status_code(),
            Some(500)
        );
        assert_eq!(ProviderError::Network("reset".into()).status_code(), None);
    }

    #[test]
    fn provider_error_serializes_with_variant_name() {
        let err = ProviderError::ApiError {
            status_code: 500,
            message: "RESOURCE_EXHAUSTED".into(),
        };
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("api_error"));
        assert!(json.contains("RESOURCE_EXHAUSTED"));
    }
}
