use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single HTTP exchange (size query or chunk fetch).
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error")]
    Network(#[source] reqwest::Error),

    #[error("request timed out")]
    Timeout(#[source] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: StatusCode, url: String },

    #[error("body ended early: expected {expected} bytes, received {received}")]
    Truncated { expected: u64, received: u64 },

    #[error("body exceeds range: expected {expected} bytes, received at least {received}")]
    Oversized { expected: u64, received: u64 },

    #[error("I/O error")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Network,
    Timeout,
    Status,
    Truncated,
    Oversized,
    Io,
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::Network(_) => FetchErrorKind::Network,
            FetchError::Timeout(_) => FetchErrorKind::Timeout,
            FetchError::Status { .. } => FetchErrorKind::Status,
            FetchError::Truncated { .. } => FetchErrorKind::Truncated,
            FetchError::Oversized { .. } => FetchErrorKind::Oversized,
            FetchError::Io(_) => FetchErrorKind::Io,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout(e)
        } else {
            FetchError::Network(e)
        }
    }
}

pub type FetchResult<T> = Result<T, FetchError>;
