//! Failure taxonomy shared by the provider and the resolution loop.
//!
//! Every way a run can go wrong is one variant of [`Failure`]. Variants that
//! wrap a lower-level error keep it as their `source`, so the top level can
//! print the whole cause chain.

use std::fmt;
use std::process::ExitStatus;
use thiserror::Error;

/// Boxed error used at the capability seams (transport, clipboard).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// API error code that marks a rejected credential.
pub const INVALID_API_KEY_CODE: &str = "invalid_api_key";

/// Structured error body returned by the completion API on a non-2xx status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: String,
    pub message: String,
    pub code: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} - {}", self.kind, self.message, self.code)
    }
}

impl std::error::Error for ApiError {}

#[derive(Error, Debug)]
pub enum Failure {
    #[error("failed to serialize request body: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to send request: {0}")]
    Transport(#[source] BoxError),

    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("API error: {0}")]
    Api(#[source] ApiError),

    #[error("API key rejected: {0}")]
    InvalidKey(#[source] ApiError),

    #[error("completion response contained no choices")]
    EmptyCompletion,

    #[error("failed reading input from terminal: {0}")]
    InputRead(#[source] std::io::Error),

    #[error("failed writing to terminal: {0}")]
    Terminal(#[from] std::io::Error),

    #[error("failed to launch shell: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("command exited with {status}")]
    Execution {
        status: ExitStatus,
        stdout: String,
        stderr: String,
    },

    #[error("failed to copy to the clipboard: {0}")]
    Clipboard(#[source] BoxError),
}

impl Failure {
    /// Stable label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Failure::Serialize(_) => "serialize",
            Failure::Transport(_) => "transport",
            Failure::Decode(_) => "decode",
            Failure::Api(_) => "api",
            Failure::InvalidKey(_) => "invalid_key",
            Failure::EmptyCompletion => "empty_completion",
            Failure::InputRead(_) => "input_read",
            Failure::Terminal(_) => "terminal",
            Failure::Spawn(_) | Failure::Execution { .. } => "execution",
            Failure::Clipboard(_) => "clipboard",
        }
    }
}

/// Maps a structured API error body to its failure kind.
///
/// A rejected key gets its own variant because the resolution loop recovers
/// from it by asking for a replacement; every other API error is surfaced.
pub fn classify_api_error(error: ApiError) -> Failure {
    if error.code == INVALID_API_KEY_CODE {
        Failure::InvalidKey(error)
    } else {
        Failure::Api(error)
    }
}
