use std::time::Duration;

use reqwest::{Method, StatusCode};
use thiserror::Error;

/// Every failure surfaced by the client.
///
/// All variants render as `API call failed: ...` so callers that only care
/// whether a call succeeded can treat them as one kind, while the variant
/// still tells which step went wrong.
#[derive(Debug, Error)]
pub enum Error {
    #[error("API call failed: {method} {url} returned HTTP {status}, expected {expected}{}", body_suffix(.body))]
    UnexpectedStatus {
        method: Method,
        url: String,
        expected: StatusCode,
        status: StatusCode,
        body: String,
    },

    #[error("API call failed: {url} answered with non-JSON content ({content_type})")]
    UnexpectedContentType { url: String, content_type: String },

    #[error("API call failed: could not decode JSON from {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("API call failed: deadline of {0:?} elapsed")]
    Timeout(Duration),

    #[error("API call failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API call failed: could not encode table as CSV")]
    Encode(#[from] csv::Error),

    #[error("API call failed: upload response carries no resource id")]
    MissingResourceId,

    #[error("API call failed: invalid header value for {0}")]
    InvalidHeader(String),
}

impl Error {
    /// HTTP status of the response that caused the failure, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::UnexpectedStatus { status, .. } => Some(*status),
            Error::Transport(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout(_) => true,
            Error::Transport(e) => e.is_timeout(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

// The service sometimes answers with a long HTML page; keep messages readable.
const MAX_BODY_IN_MESSAGE: usize = 512;

fn body_suffix(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return String::new();
    }
    if body.len() <= MAX_BODY_IN_MESSAGE {
        return format!("\n{}", body);
    }
    let mut end = MAX_BODY_IN_MESSAGE;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("\n{}...", &body[..end])
}
