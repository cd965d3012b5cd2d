use bon::Builder;
use enumset::EnumSet;
use tokio::sync::Mutex;
use tokio_modbus::{Address, SlaveId};

use crate::{
    api::modbus::{ConnectError, Endpoint, RegisterKind, TcpTransport, Transport},
    core::{
        catalog::Measurement,
        engine::PollingEngine,
        error::{CycleError, WriteError, WriteRejected},
        feature::Feature,
        firmware::FirmwareVersion,
        snapshot::Snapshot,
        write_gate::WriteGate,
    },
    prelude::*,
};

/// Device identity, fixed for the session.
#[derive(Clone, Debug, Builder)]
pub struct Device {
    pub endpoint: Endpoint,
    pub firmware: FirmwareVersion,

    #[builder(default = 1)]
    pub station_id: SlaveId,

    #[builder(default = Feature::default_set())]
    pub features: EnumSet<Feature>,
}

/// Heat pump session: one transport shared by polling, writes and raw reads.
///
/// Transport access goes through a single FIFO mutex, so operations run in submission order.
pub struct Session<T> {
    device: Device,
    transport: Mutex<T>,
    engine: Mutex<PollingEngine>,
    write_gate: WriteGate,
}

impl Session<TcpTransport> {
    pub fn tcp(device: Device) -> Self {
        let transport = TcpTransport::new(device.endpoint.clone());
        Self::new(device, transport)
    }
}

impl<T: Transport> Session<T> {
    pub fn new(device: Device, transport: T) -> Self {
        let engine = PollingEngine::new(device.firmware, device.station_id, device.features);
        Self {
            device,
            transport: Mutex::new(transport),
            engine: Mutex::new(engine),
            write_gate: WriteGate::default(),
        }
    }

    pub async fn poll_once(&self) -> Result<Snapshot, CycleError> {
        let mut engine = self.engine.lock().await;
        let mut transport = self.transport.lock().await;
        engine.poll_once(&mut *transport).await
    }

    pub fn set_write_enabled(&self, enabled: bool) {
        self.write_gate.set_enabled(enabled);
    }

    /// Whether the measurement is read and exposed for this device.
    pub fn is_available(&self, measurement: Measurement) -> bool {
        measurement.is_available(self.device.firmware, self.device.features)
    }

    pub async fn try_write(&self, measurement: Measurement, value: f64) -> Result<(), WriteError> {
        self.write_gate.check(measurement, value, self.device.firmware)?;
        let mut transport = self.transport.lock().await;
        Self::ensure_connected(&mut *transport).await?;
        let Device { station_id, firmware, .. } = self.device;
        self.write_gate.try_write(&mut *transport, station_id, measurement, value, firmware).await
    }

    pub async fn try_write_register(&self, address: Address, value: u16) -> Result<(), WriteError> {
        if !self.write_gate.is_enabled() {
            return Err(WriteRejected::Disabled.into());
        }
        let mut transport = self.transport.lock().await;
        Self::ensure_connected(&mut *transport).await?;
        self.write_gate
            .try_write_register(&mut *transport, self.device.station_id, address, value)
            .await
    }

    /// Read raw register words for diagnostics.
    #[instrument(skip_all, fields(?kind, address, count))]
    pub async fn read_registers(
        &self,
        kind: RegisterKind,
        address: Address,
        count: u16,
    ) -> Result<Vec<u16>> {
        ensure!((1..=125).contains(&count), "register count must be within 1..=125");
        ensure!(
            u32::from(address) + u32::from(count) <= u32::from(Address::MAX) + 1,
            "registers {address}+{count} run past the last address",
        );
        let mut transport = self.transport.lock().await;
        Self::ensure_connected(&mut *transport).await?;
        transport
            .read_registers(kind, address, count, self.device.station_id)
            .await
            .with_context(|| format!("failed to read {count} registers at {address}"))
    }

    /// Close the connection, safe to call more than once.
    pub async fn shutdown(&self) {
        self.transport.lock().await.disconnect().await;
    }

    async fn ensure_connected(transport: &mut T) -> Result<(), ConnectError> {
        if !transport.is_connected() {
            transport.connect().await?;
        }
        Ok(())
    }
}
