use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::Endpoint;

/// Failure of a single endpoint request.
///
/// A non-success status, a transport error and a timeout are all reported
/// through this type and are treated identically by the poller: the signal
/// is shown as unavailable and nothing is retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EndpointError {
    #[error("HTTP {status} @ {url}")]
    Status { status: u16, url: String },
    #[error("timed out @ {url}")]
    Timeout { url: String },
    #[error("{message} @ {url}")]
    Transport { message: String, url: String },
}

impl EndpointError {
    pub(crate) fn from_reqwest(err: reqwest::Error, url: &str) -> Self {
        if err.is_timeout() {
            return EndpointError::Timeout { url: url.to_string() };
        }
        if let Some(status) = err.status() {
            return EndpointError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            };
        }
        EndpointError::Transport {
            message: err.to_string(),
            url: url.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to prepare database directory: {0}")]
    Directory(#[from] std::io::Error),
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("database task aborted: {0}")]
    Join(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} cannot be empty")]
    Empty(&'static str),
    #[error("{0} must be greater than 0")]
    Zero(&'static str),
    #[error("invalid value for {var}: {value:?}")]
    InvalidVar { var: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to build HTTP client: {0}")]
    Client(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Category of a problem seen during a poll cycle.
///
/// None of these are fatal; each is recovered where it happens and only
/// surfaces as a placeholder field or a status line.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Timeout, refused connection or non-success HTTP status.
    Network,
    /// The expected span or JSON key was not in the response body.
    Extraction,
    /// The extracted text is not a number.
    Parse,
    /// Writing or reading the measurements table failed.
    Persistence,
    /// The cycle task itself aborted.
    Cycle,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Network => write!(f, "network"),
            ErrorKind::Extraction => write!(f, "extraction"),
            ErrorKind::Parse => write!(f, "parse"),
            ErrorKind::Persistence => write!(f, "persistence"),
            ErrorKind::Cycle => write!(f, "cycle"),
        }
    }
}

/// What a [`PollIssue`] is about.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSubject {
    Endpoint(Endpoint),
    StoreWrite,
    StoreRead,
    Poller,
}

/// One recovered problem from a poll cycle.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PollIssue {
    pub kind: ErrorKind,
    pub subject: IssueSubject,
    pub message: String,
}

impl PollIssue {
    pub fn new<T: Into<String>>(kind: ErrorKind, subject: IssueSubject, message: T) -> Self {
        Self {
            kind,
            subject,
            message: message.into(),
        }
    }
}

impl fmt::Display for PollIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.subject {
            IssueSubject::Endpoint(endpoint) => {
                write!(f, "[{}] {}: {}", self.kind, endpoint, self.message)
            }
            _ => write!(f, "[{}] {}", self.kind, self.message),
        }
    }
}
