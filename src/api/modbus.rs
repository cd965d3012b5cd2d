//! Modbus TCP transport to the heat pump controller.

mod endpoint;
mod error;
#[cfg(test)]
pub mod fake;
mod tcp;

use tokio_modbus::{Address, SlaveId};

pub use self::{
    endpoint::Endpoint,
    error::{ConnectError, TransportError},
    tcp::TcpTransport,
};

/// Register class addressed by a read request.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, clap::ValueEnum)]
pub enum RegisterKind {
    Holding,
    Input,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// Single-connection register transport.
///
/// Implementations are fail-fast: any error that may have left the stream in an unknown state
/// drops the connection instead of retrying in place, so the next caller reconnects from scratch.
pub trait Transport: Send {
    fn state(&self) -> ConnectionState;

    /// Number of transitions to [`ConnectionState::Disconnected`] so far.
    ///
    /// Session state derived from the device must not outlive a change of this counter.
    fn n_disconnects(&self) -> u64;

    /// Open a fresh connection, closing the current one first if any.
    fn connect(&mut self) -> impl Future<Output = Result<(), ConnectError>> + Send;

    /// Close the connection. No-op when already disconnected.
    fn disconnect(&mut self) -> impl Future<Output = ()> + Send;

    fn read_registers(
        &mut self,
        kind: RegisterKind,
        address: Address,
        count: u16,
        station_id: SlaveId,
    ) -> impl Future<Output = Result<Vec<u16>, TransportError>> + Send;

    fn write_register(
        &mut self,
        address: Address,
        value: u16,
        station_id: SlaveId,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }
}
