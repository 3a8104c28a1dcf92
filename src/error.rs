// Shared error taxonomy for provider and backend operations

use std::fmt;

/// Error type for all network-facing operations
#[derive(Debug)]
pub enum Error {
    /// Bearer token missing or rejected (HTTP 401) — surfaced as "please log in"
    Auth(String),
    /// Streaming provider returned a non-2xx response
    Provider { status: u16, message: String },
    /// Backend returned a non-2xx response
    Backend { status: u16, message: String },
    /// Backend rejected a mutation that violates one of its invariants
    /// (e.g. deleting a locked tag); message passed through verbatim
    Conflict { status: u16, message: String },
    /// Client-side input rejected before any request was sent
    Validation(String),
    /// HTTP transport failure (connect, timeout, TLS)
    Request(String),
    /// Response body did not match the expected shape
    Decode(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Auth(msg) => write!(f, "Not authenticated: {}", msg),
            Error::Provider { status, message } => {
                write!(f, "Provider API error {}: {}", status, message)
            }
            Error::Backend { status, message } => {
                write!(f, "Backend API error {}: {}", status, message)
            }
            Error::Conflict { status, message } => {
                write!(f, "Backend rejected mutation ({}): {}", status, message)
            }
            Error::Validation(msg) => write!(f, "Invalid input: {}", msg),
            Error::Request(msg) => write!(f, "Request failed: {}", msg),
            Error::Decode(msg) => write!(f, "Failed to parse response: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

impl Error {
    /// True when the caller should prompt for a fresh login
    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Auth(_))
    }
}
