//! Error taxonomy for flaky test mining.

use thiserror::Error;

/// Message shown when no CircleCI token is available.
pub const MISSING_TOKEN_HELP: &str = "no CIRCLECI_TOKEN environment variable set\n\
     Visit https://circleci.com/account/api to create a new token.\n\
     Then invoke this command with CIRCLECI_TOKEN=your_token";

/// Errors produced while mining CircleCI build history.
///
/// None of these are retried; each one aborts the run.
#[derive(Debug, Error)]
pub enum FlakyError {
    /// Missing credential, bad artifact glob, or an unusable HTTP client.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// CircleCI answered with a non-success status, the transport failed,
    /// or the payload did not have the expected shape.
    #[error("remote service error at {endpoint}{}: {message}", status_suffix(.status))]
    RemoteService {
        endpoint: String,
        status: Option<u16>,
        message: String,
    },

    /// A test report artifact could not be parsed as JUnit XML.
    #[error("malformed test report {artifact}: {message}")]
    MalformedReport { artifact: String, message: String },
}

impl FlakyError {
    pub(crate) fn missing_token() -> Self {
        Self::Configuration {
            message: MISSING_TOKEN_HELP.to_string(),
        }
    }

    pub(crate) fn remote(endpoint: &str, status: Option<u16>, message: impl Into<String>) -> Self {
        Self::RemoteService {
            endpoint: endpoint.to_string(),
            status,
            message: message.into(),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default()
}

/// Convenience result alias.
pub type FlakyResult<T> = std::result::Result<T, FlakyError>;
