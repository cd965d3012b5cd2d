use std::{io, time::Duration};

use thiserror::Error;
use tokio_modbus::ExceptionCode;

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("failed to resolve `{host}`")]
    Resolve {
        host: String,

        #[source]
        source: io::Error,
    },

    #[error("`{host}` did not resolve to any address")]
    NoAddresses { host: String },

    #[error("timed out while connecting ({0:?})")]
    Timeout(Duration),

    #[error("failed to connect")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("not connected")]
    NotConnected,

    /// The device is alive and answered with a Modbus exception.
    #[error("device responded with exception {0:?}")]
    Exception(ExceptionCode),

    /// Malformed or mismatched response, the stream may be out of sync.
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("network error")]
    Network(#[source] io::Error),

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("read {actual} words while expected {expected}")]
    ShortResponse { expected: u16, actual: usize },
}

impl TransportError {
    /// Whether the connection is unusable after this error.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::NotConnected | Self::Protocol(_) | Self::Network(_) | Self::Timeout(_))
    }
}

impl From<tokio_modbus::Error> for TransportError {
    fn from(error: tokio_modbus::Error) -> Self {
        match error {
            tokio_modbus::Error::Transport(error) => Self::Network(error),
            tokio_modbus::Error::Protocol(error) => Self::Protocol(format!("{error:?}")),
        }
    }
}
