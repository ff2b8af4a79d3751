//! Client errors
//!
//! Every failure the protocol core can produce. Nothing in this crate
//! retries; [`ClientError::is_retryable`] lets callers apply their own policy.

use thiserror::Error;

/// Result alias used throughout the protocol core
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors returned by link execution, decoding and resource operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The supplied parameters do not match what the link accepts.
    ///
    /// Raised before any network call is attempted.
    #[error(
        "Parameter mismatch for link '{link}': missing {missing:?}, unexpected {unexpected:?}, mistyped {mistyped:?}"
    )]
    ParameterMismatch {
        link: String,
        missing: Vec<String>,
        unexpected: Vec<String>,
        mistyped: Vec<String>,
    },

    /// The server has no such resource or operation.
    #[error("Not found: {message}")]
    NotFound {
        message: String,
        exit_code: Option<i64>,
    },

    /// The resource to create already exists, locally or on the server.
    #[error("Already exists: {message}")]
    AlreadyExists {
        message: String,
        exit_code: Option<i64>,
    },

    /// The server rejected the supplied credentials.
    #[error("Invalid credentials: {message}")]
    InvalidCredentials { message: String },

    /// The server failed with a 5xx status.
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Any other non-2xx response.
    #[error("Request failed with status {status}: {message}")]
    RequestFailed {
        status: u16,
        message: String,
        exit_code: Option<i64>,
    },

    /// The transport gave up waiting for the server.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Connection-level failure (DNS, TLS, refused connection, ...).
    #[error("Network failure: {0}")]
    Network(String),

    /// The response could not be decoded into the expected shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The local handle was destroyed and can no longer be used.
    #[error("Resource destroyed: {0}")]
    ResourceDestroyed(String),

    /// The resource's loaded link map does not offer the requested operation.
    #[error("Link '{link}' is not available on {resource}")]
    LinkUnavailable { resource: String, link: String },

    /// The server reported an SSH key type this client does not know.
    #[error("Unknown SSH key type: {0}")]
    UnknownKeyType(String),

    /// A public key line could not be parsed.
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    /// A link href or configured server URL is not a valid URL.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl ClientError {
    /// Whether a caller may reasonably retry the failed operation.
    ///
    /// Only transport-level failures qualify; server verdicts and
    /// programming errors never do.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Timeout(_) | ClientError::Network(_))
    }

    pub(crate) fn already_exists(message: impl Into<String>) -> Self {
        ClientError::AlreadyExists {
            message: message.into(),
            exit_code: None,
        }
    }
}
