use std::time::Duration;

use itertools::Itertools;
use tokio::{
    net::{TcpStream, lookup_host},
    time::timeout,
};
use tokio_modbus::{
    Address,
    Slave,
    SlaveId,
    client::{Client, Context, Reader, Writer, tcp::attach_slave},
    slave::SlaveContext,
};

use crate::{
    api::modbus::{
        ConnectError,
        ConnectionState,
        Endpoint,
        RegisterKind,
        Transport,
        TransportError,
    },
    prelude::*,
};

/// Modbus TCP transport holding at most one connection.
pub struct TcpTransport {
    endpoint: Endpoint,
    context: Option<Context>,
    n_disconnects: u64,
    request_timeout: Duration,
}

impl TcpTransport {
    const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    pub const fn new(endpoint: Endpoint) -> Self {
        Self { endpoint, context: None, n_disconnects: 0, request_timeout: Self::REQUEST_TIMEOUT }
    }

    #[cfg(test)]
    pub const fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    async fn new_tcp_stream(&mut self) -> Result<TcpStream, ConnectError> {
        let addresses = lookup_host((self.endpoint.host.as_str(), self.endpoint.port))
            .await
            .map_err(|source| ConnectError::Resolve { host: self.endpoint.host.clone(), source })?
            .collect_vec();
        if addresses.is_empty() {
            return Err(ConnectError::NoAddresses { host: self.endpoint.host.clone() });
        }
        let tcp_stream = timeout(Self::CONNECT_TIMEOUT, TcpStream::connect(&*addresses))
            .await
            .map_err(|_| ConnectError::Timeout(Self::CONNECT_TIMEOUT))??;
        tcp_stream.set_nodelay(true)?;
        Ok(tcp_stream)
    }

    /// Drop the connection without closing it gracefully.
    fn drop_context(&mut self) {
        if self.context.take().is_some() {
            self.n_disconnects += 1;
            warn!(n_disconnects = self.n_disconnects, "connection dropped");
        }
    }

    /// Unwrap the request outcome and drop the connection when it cannot be trusted anymore.
    fn settle<T>(
        &mut self,
        outcome: Result<tokio_modbus::Result<T>, tokio::time::error::Elapsed>,
    ) -> Result<T, TransportError> {
        let result = match outcome {
            Ok(Ok(Ok(response))) => Ok(response),
            Ok(Ok(Err(exception))) => Err(TransportError::Exception(exception)),
            Ok(Err(error)) => Err(TransportError::from(error)),
            Err(_) => Err(TransportError::Timeout(self.request_timeout)),
        };
        if let Err(error) = &result
            && error.is_fatal()
        {
            self.drop_context();
        }
        result
    }
}

impl Transport for TcpTransport {
    fn state(&self) -> ConnectionState {
        if self.context.is_some() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    fn n_disconnects(&self) -> u64 {
        self.n_disconnects
    }

    #[instrument(skip_all, fields(endpoint = %self.endpoint))]
    async fn connect(&mut self) -> Result<(), ConnectError> {
        self.disconnect().await;
        info!("connecting…");
        let tcp_stream = self.new_tcp_stream().await?;
        self.context = Some(attach_slave(tcp_stream, Slave::tcp_device()));
        info!("connected");
        Ok(())
    }

    #[instrument(skip_all, fields(endpoint = %self.endpoint))]
    async fn disconnect(&mut self) {
        if let Some(mut context) = self.context.take() {
            let _ = timeout(self.request_timeout, context.disconnect()).await;
            self.n_disconnects += 1;
            info!(n_disconnects = self.n_disconnects, "disconnected");
        }
    }

    #[instrument(skip_all, fields(?kind, address, count, station_id))]
    async fn read_registers(
        &mut self,
        kind: RegisterKind,
        address: Address,
        count: u16,
        station_id: SlaveId,
    ) -> Result<Vec<u16>, TransportError> {
        let Some(context) = self.context.as_mut() else {
            return Err(TransportError::NotConnected);
        };
        context.set_slave(Slave(station_id));
        trace!("reading…");
        let read = match kind {
            RegisterKind::Holding => context.read_holding_registers(address, count),
            RegisterKind::Input => context.read_input_registers(address, count),
        };
        let outcome = timeout(self.request_timeout, read).await;
        let words = self.settle(outcome)?;
        if words.len() < usize::from(count) {
            return Err(TransportError::ShortResponse { expected: count, actual: words.len() });
        }
        trace!(?words, "read");
        Ok(words)
    }

    #[instrument(skip_all, fields(address, value, station_id))]
    async fn write_register(
        &mut self,
        address: Address,
        value: u16,
        station_id: SlaveId,
    ) -> Result<(), TransportError> {
        let Some(context) = self.context.as_mut() else {
            return Err(TransportError::NotConnected);
        };
        context.set_slave(Slave(station_id));
        debug!("writing…");
        let outcome =
            timeout(self.request_timeout, context.write_single_register(address, value)).await;
        self.settle(outcome)?;
        debug!("written");
        Ok(())
    }
}
