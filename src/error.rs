//! Errors raised at the protocol boundary.
//!
//! None of these reach the embedding application through callbacks: the
//! router drops undecodable messages, and the sandbox ignores envelopes it
//! cannot read. They exist so each codec can report *why* it refused input.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The message was not valid JSON or did not match the envelope shape
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),

    /// An `$extended` tag this codec does not know
    #[error("unknown extended value tag '{0}'")]
    UnknownTag(String),

    /// Extended value nested deeper than the decoder allows
    #[error("value nesting too deep (max {0} levels)")]
    TooDeep(usize),

    /// Outbound envelope carrying a foreign `source` tag
    #[error("unexpected message source '{0}'")]
    ForeignSource(String),

    /// Bootstrap locator without a `#` fragment
    #[error("bootstrap locator has no fragment: {0}")]
    MissingFragment(String),

    /// Bootstrap fragment without a required key
    #[error("bootstrap parameter '{0}' is missing")]
    MissingParameter(&'static str),

    /// Bootstrap fragment key with an unparseable value
    #[error("bootstrap parameter '{name}' is invalid: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}
