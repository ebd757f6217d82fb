//! Error types surfaced by the controllers.
//!
//! # Design
//! - Constant display messages; context lives in structured fields.
//! - `user_message` is the only place alert text is derived from an error.

use autocompose_api_models::ResponseError;
use thiserror::Error;

/// Failures talking to the Autocompose server.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced a response (network failure, CORS, abort).
    #[error("request could not be completed")]
    Transport {
        /// Operation that issued the request.
        operation: &'static str,
        /// Transport-level reason.
        detail: String,
    },
    /// The server answered with a non-success HTTP status.
    #[error("server returned an error status")]
    Status {
        /// Operation that issued the request.
        operation: &'static str,
        /// HTTP status code.
        status: u16,
        /// Reason extracted from the error body, when present.
        detail: Option<String>,
    },
    /// The response body was not valid JSON for the expected shape.
    #[error("response body could not be decoded")]
    Decode {
        /// Operation that issued the request.
        operation: &'static str,
        /// Decoder message.
        detail: String,
    },
    /// The body decoded but violated the response contract.
    #[error("response body violated the contract")]
    Response {
        /// Operation that issued the request.
        operation: &'static str,
        /// Validation failure.
        #[source]
        source: ResponseError,
    },
}

impl ApiError {
    /// Operation label recorded when the error was raised.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Transport { operation, .. }
            | Self::Status { operation, .. }
            | Self::Decode { operation, .. }
            | Self::Response { operation, .. } => *operation,
        }
    }

    /// Text shown to the user in alerts.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport { detail, .. } => detail.clone(),
            Self::Status { status, detail, .. } => detail
                .clone()
                .unwrap_or_else(|| format!("Server responded with {status}")),
            Self::Decode { detail, .. } => format!("invalid server response ({detail})"),
            Self::Response { source, .. } => source.detail(),
        }
    }
}

/// Failure of a full job run, split by the phase that failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JobRunError {
    /// The start request failed; no job exists.
    #[error("job could not be started")]
    Start {
        /// Underlying request failure.
        #[source]
        source: ApiError,
    },
    /// A status request failed; the job may still be running server-side.
    #[error("job status polling stopped")]
    Poll {
        /// Underlying request failure.
        #[source]
        source: ApiError,
    },
}

/// Local validation failures that stop a job before any request is sent.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum JobInputError {
    /// No generated files were found on the page.
    #[error("no generated files to submit")]
    NoFiles,
}

/// Invalid item metadata on a selectable card.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ItemError {
    /// The card lacks a container id.
    #[error("item is missing an identifier")]
    MissingId,
    /// The card lacks a container name.
    #[error("item is missing a name")]
    MissingName,
}

/// Invalid grid column input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GridError {
    /// Slider value was not an integer.
    #[error("column count is not an integer")]
    NotANumber {
        /// Raw slider value.
        value: String,
    },
}

/// Invalid controller configuration overrides.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A millisecond setting was not an integer.
    #[error("configuration value is not an integer")]
    NotANumber {
        /// Attribute that failed to parse.
        field: &'static str,
        /// Raw attribute value.
        value: String,
    },
    /// A millisecond setting was outside the accepted range.
    #[error("configuration value out of range")]
    OutOfRange {
        /// Attribute that failed validation.
        field: &'static str,
        /// Parsed value.
        value: u64,
        /// Inclusive lower bound.
        min: u64,
        /// Inclusive upper bound.
        max: u64,
    },
    /// The log level was not recognised.
    #[error("unknown log level")]
    UnknownLogLevel {
        /// Raw attribute value.
        value: String,
    },
}
