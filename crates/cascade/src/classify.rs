//! Provider failure classification.

use wrenchwise_core::ProviderError;

/// How the cascade reacts to a failed tier attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Capacity exhausted; the next tier may serve the request
    QuotaExceeded,
    /// Anything else; the cascade stops
    NonRetryable,
}

const QUOTA_MARKERS: [&str; 4] = ["quota", "limit", "exhausted", "resource_exhausted"];

/// Sort a provider failure into [`ErrorKind`].
///
/// Status 429 is always quota. Otherwise both the serialized error and its
/// display text are searched for quota markers, case-insensitively.
pub fn classify(err: &ProviderError) -> ErrorKind {
    if err.status_code() == Some(429) {
        return ErrorKind::QuotaExceeded;
    }

    let serialized = serde_json::to_string(err).unwrap_or_default();
    let haystack = format!("{serialized} {err}").to_lowercase();
    if QUOTA_MARKERS.iter().any(|m| haystack.contains(m)) {
        ErrorKind::QuotaExceeded
    } else {
        ErrorKind::NonRetryable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_429_is_quota() {
        let err = ProviderError::ApiError {
            status_code: 429,
            message: "slow down".into(),
        };
        assert_eq!(classify(&err), ErrorKind::QuotaExceeded);
        assert_eq!(
            classify(&ProviderError::RateLimited("try later".into())),
            ErrorKind::QuotaExceeded
        );
    }

    #[test]
    fn quota_words_in_message() {
        for msg in [
            "Quota exceeded for metric",
            "RESOURCE_EXHAUSTED",
            "daily LIMIT reached",
            "capacity exhausted",
        ] {
            let err = ProviderError::ApiError {
                status_code: 503,
                message: msg.into(),
            };
            assert_eq!(classify(&err), ErrorKind::QuotaExceeded, "{msg}");
        }
    }

    #[test]
    fn other_failures_are_terminal() {
        for err in [
            ProviderError::AuthenticationFailed("API key not valid".into()),
            ProviderError::InvalidRequest("malformed contents".into()),
            ProviderError::Network("connection refused".into()),
            ProviderError::Timeout("no response from gemini-2.5-pro after 90s".into()),
            ProviderError::ApiError {
                status_code: 500,
                message: "internal".into(),
            },
        ] {
            assert_eq!(classify(&err), ErrorKind::NonRetryable, "{err}");
        }
    }
}
