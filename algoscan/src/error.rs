//! Error taxonomy for indexer requests.

use thiserror::Error;

/// Failure modes of a single indexer request.
#[derive(Debug, Error)]
pub enum Error {
    /// The request never produced an HTTP response (connect failure,
    /// timeout, TLS).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The indexer answered with a non-success status.
    #[error("indexer returned HTTP {status}: {body}")]
    Http {
        /// The HTTP status code.
        status: u16,
        /// A trimmed snippet of the response body.
        body: String,
    },

    /// The response body could not be decoded into the expected shape.
    #[error("decoding indexer response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The client was constructed with an unusable base URL or header
    /// value.
    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl Error {
    /// Whether retrying the same request could plausibly succeed.
    ///
    /// Transport failures and HTTP error statuses are transient — the
    /// indexer rate-limits and times out under load. A body that does
    /// not decode or a bad client configuration will not improve on a
    /// retry.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Http { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_errors_are_transient() {
        let err = Error::Http {
            status: 503,
            body: "timeout".to_owned(),
        };
        assert!(err.is_transient(), "HTTP errors should be retryable");
    }

    #[test]
    fn decode_errors_are_permanent() {
        let source = serde_json::from_str::<u64>("not json").unwrap_err();
        assert!(
            !Error::Decode(source).is_transient(),
            "decode errors should not be retried"
        );
    }

    #[test]
    fn config_errors_are_permanent() {
        let err = Error::Config("bad URL".to_owned());
        assert!(!err.is_transient(), "config errors should not be retried");
    }
}
