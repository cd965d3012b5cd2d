use std::time::Duration;

use thiserror::Error;

use crate::{
    api::modbus::{ConnectError, TransportError},
    core::{catalog::Measurement, firmware::FirmwareVersion},
};

/// Poll cycle failure, the cycle produced no snapshot.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("failed to connect")]
    Connection(#[source] ConnectError),

    #[error("core status not read within {0:?}")]
    Timeout(Duration),

    #[error("no status code received")]
    NoData {
        #[source]
        source: Option<TransportError>,
    },
}

/// Write refused before touching the device.
#[derive(Debug, Error, PartialEq)]
pub enum WriteRejected {
    #[error("writes are disabled")]
    Disabled,

    #[error("`{measurement}` is not available on firmware {firmware}")]
    Unavailable { measurement: Measurement, firmware: FirmwareVersion },

    #[error("`{0}` is read-only")]
    ReadOnly(Measurement),

    #[error("{value} is not a valid operating mode")]
    InvalidMode { value: f64 },

    #[error("`{measurement}` must be within {min}..={max}, got {value}")]
    OutOfBounds { measurement: Measurement, value: f64, min: i64, max: i64 },

    #[error("{value} does not fit the `{measurement}` register")]
    Unrepresentable { measurement: Measurement, value: f64 },
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("write rejected")]
    Rejected(#[from] WriteRejected),

    #[error("failed to connect")]
    Connection(#[from] ConnectError),

    #[error("failed to write the register")]
    Transport(#[from] TransportError),
}
