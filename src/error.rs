//! Error types for switch connection, login and data retrieval.
//!
//! This module defines all errors that can occur while talking to a switch's
//! web interface, and the coarse [`ErrorKind`] classification the probe
//! branches on.

use thiserror::Error;

/// Errors that can occur while talking to a switch.
#[derive(Error, Debug)]
pub enum SwitchError {
    /// None of the known model templates matched the switch.
    ///
    /// The contained string describes what was checked.
    #[error("switch model not detected: {0}")]
    ModelNotDetected(String),

    /// The switch rejected the credentials or the session.
    #[error("login failed: {0}")]
    LoginFailed(String),

    /// The switch could not be reached or answered with an HTTP error status.
    #[error("connection error: {0}")]
    Connection(String),

    /// The host given to the connector is not usable as an address.
    #[error("invalid host '{0}'")]
    InvalidHost(String),

    /// A page was fetched but its data block could not be extracted.
    #[error("failed to parse switch page: {0}")]
    Parse(String),

    /// An error raised by the HTTP client.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Coarse classification of [`SwitchError`] used to decide how fatal a failure is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ModelNotDetected,
    LoginFailed,
    ConnectionError,
    Unexpected,
}

impl SwitchError {
    /// Returns the classification of this error.
    ///
    /// HTTP client errors raised while connecting, sending the request or
    /// waiting for it count as connection errors; decoding failures do not.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SwitchError::ModelNotDetected(_) => ErrorKind::ModelNotDetected,
            SwitchError::LoginFailed(_) => ErrorKind::LoginFailed,
            SwitchError::Connection(_) => ErrorKind::ConnectionError,
            SwitchError::Http(err)
                if err.is_connect() || err.is_timeout() || err.is_request() =>
            {
                ErrorKind::ConnectionError
            }
            SwitchError::InvalidHost(_) | SwitchError::Parse(_) | SwitchError::Http(_) => {
                ErrorKind::Unexpected
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, SwitchError>;
