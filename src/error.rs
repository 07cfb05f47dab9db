//! Error handling.

use std::{io, result};

use thiserror::Error;

/// Result type of all ws-echo calls.
pub type Result<T, E = Error> = result::Result<T, E>;

/// Possible ws-echo errors.
///
/// Apart from [`Error::ConnectionClosed`] every variant is terminal for a run: nothing is
/// retried and the error is handed back to the caller unchanged.
#[derive(Error, Debug)]
pub enum Error {
    /// The connection could not be established: the peer is unreachable, refused the
    /// handshake, or the URI could not be resolved.
    #[error("Connection error: {0}")]
    Connection(#[source] tungstenite::Error),
    /// The URI is not a usable websocket URI.
    #[error("URL error: {0}")]
    Url(#[from] UrlError),
    /// The peer closed the session while a reply was expected.
    ///
    /// The interactive loop handles this itself and ends normally; one-shot exchanges
    /// report it as an error.
    #[error("Connection closed by peer")]
    ConnectionClosed,
    /// Writing to or reading from an established connection failed.
    #[error("Transmission error: {0}")]
    Transmission(#[source] tungstenite::Error),
    /// A payload or a reply could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),
    /// Input-output error on stdin, stdout or a payload file.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Indicates the specific type/cause of URL error.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum UrlError {
    /// The URI could not be parsed at all.
    #[error("Invalid URL: {0}")]
    Parse(#[from] url::ParseError),
    /// Unsupported URL scheme used (only `ws://` or `wss://` may be used).
    #[error("URL scheme not supported: {0}")]
    UnsupportedUrlScheme(String),
    /// The URL does not include a host name.
    #[error("No host name in the URL")]
    NoHostName,
}

/// Indicates the specific type/cause of a serialization error.
#[derive(Error, Debug)]
pub enum SerializationError {
    /// JSON encoding or decoding failed.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// YAML encoding or decoding failed.
    #[error("YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// A structured document was handed to the raw text encoding.
    #[error("Raw text encoding cannot carry a structured document")]
    DocumentAsRawText,
    /// The peer sent a binary message that is not valid UTF-8.
    #[error("Reply is not valid UTF-8")]
    Utf8,
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.into())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(err.into())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::Url(err.into())
    }
}
