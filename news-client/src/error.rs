use strum_macros::Display;

/// Broad classification of client failures.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum ErrorKind {
    /// No upstream credential is configured, so nothing can be fetched.
    MissingApiKey,
    /// Every headline query of a fetch failed.
    UpstreamUnavailable,
    /// A single headline query failed at the transport level.
    Request,
    /// The upstream answered with a payload that could not be decoded.
    InvalidResponse,
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn missing_api_key() -> Self {
        Self::new(ErrorKind::MissingApiKey, "NEWS_API_KEY not configured")
    }

    pub fn upstream_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UpstreamUnavailable, message)
    }

    pub fn request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Request, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidResponse, message)
    }
}

impl From<surf::Error> for Error {
    fn from(err: surf::Error) -> Self {
        Self::new(ErrorKind::Request, err.to_string())
    }
}
