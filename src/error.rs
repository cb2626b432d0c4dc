//! Error types for the Mailpit client.

use thiserror::Error;

/// Error type for all Mailpit client operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid client configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// HTTP-layer failure: connect, timeout, or non-success status.
    #[error("{context}: {source}")]
    Transport {
        /// Operation and endpoint that failed.
        context: String,
        /// Underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// Well-formed response without a matching message.
    #[error("not found: {0}")]
    NotFound(String),
    /// Response body was empty or not the expected JSON shape.
    #[error("parse error: {context}: {reason}")]
    Parse {
        /// Operation and endpoint whose response failed to decode.
        context: String,
        /// Decoder message.
        reason: String,
    },
    /// Expected vs. actual mismatch in an assertion helper.
    #[error("assertion failed for message {id}: expected {check} {expected:?}, actual {actual:?}")]
    Assertion {
        /// Identifier of the inspected message.
        id: String,
        /// What was checked, e.g. `subject to contain`.
        check: String,
        /// Expected value.
        expected: String,
        /// Value found in the message.
        actual: String,
    },
    /// Invalid regular expression passed to a `*_matches` assertion.
    #[error("invalid pattern for {check} on message {id}: {source}")]
    Pattern {
        /// Identifier of the message the assertion targeted.
        id: String,
        /// Assertion the pattern was meant for, e.g. `text to match`.
        check: String,
        /// Regex compile error.
        #[source]
        source: regex::Error,
    },
}

impl Error {
    pub(crate) fn transport(context: impl Into<String>, source: reqwest::Error) -> Self {
        Error::Transport {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn parse(context: impl Into<String>, reason: impl ToString) -> Self {
        Error::Parse {
            context: context.into(),
            reason: reason.to_string(),
        }
    }

    /// `true` for [`Error::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// `true` for [`Error::Assertion`].
    pub fn is_assertion(&self) -> bool {
        matches!(self, Error::Assertion { .. })
    }

    /// `true` for [`Error::Transport`].
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport { .. })
    }
}
