//! One poll cycle: core status, optional extras, operating data and derived metrics.

use std::{collections::BTreeMap, time::Duration};

use chrono::Local;
use enumset::EnumSet;
use tokio::time::timeout;
use tokio_modbus::SlaveId;

use crate::{
    api::modbus::{Transport, TransportError},
    core::{
        catalog::{Group, Measurement, messages},
        cop::CopSmoother,
        decode::decode_value,
        error::CycleError,
        feature::Feature,
        firmware::FirmwareVersion,
        snapshot::{Snapshot, Value},
    },
    prelude::*,
    quantity::power::Watts,
};

/// Codes read in the core status phase.
struct CoreStatus {
    status_code: u16,
    lock_code: Option<u16>,
    error_code: Option<u16>,
}

pub struct PollingEngine {
    firmware: FirmwareVersion,
    station_id: SlaveId,
    features: EnumSet<Feature>,
    cop: CopSmoother,

    /// Transport disconnect counter the smoothing state belongs to.
    n_disconnects_seen: u64,

    warned_unknown_code: bool,
}

impl PollingEngine {
    const CORE_STATUS_TIMEOUT: Duration = Duration::from_secs(10);
    const OPERATING_DATA_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(firmware: FirmwareVersion, station_id: SlaveId, features: EnumSet<Feature>) -> Self {
        Self {
            firmware,
            station_id,
            features,
            cop: CopSmoother::default(),
            n_disconnects_seen: 0,
            warned_unknown_code: false,
        }
    }

    /// Run one full update cycle.
    #[instrument(skip_all, fields(firmware = %self.firmware, station_id = self.station_id))]
    pub async fn poll_once<T: Transport>(
        &mut self,
        transport: &mut T,
    ) -> Result<Snapshot, CycleError> {
        if !transport.is_connected() {
            transport.connect().await.map_err(CycleError::Connection)?;
        }
        self.sync_disconnects(transport);

        let core = match timeout(Self::CORE_STATUS_TIMEOUT, self.read_core_status(transport)).await
        {
            Ok(core) => core?,
            Err(_) => {
                warn!(timeout = ?Self::CORE_STATUS_TIMEOUT, "core status timed out");
                transport.disconnect().await;
                return Err(CycleError::Timeout(Self::CORE_STATUS_TIMEOUT));
            }
        };

        let status = self.translate(
            "status",
            core.status_code,
            messages::status_name(self.firmware, core.status_code),
        );
        let lock = core
            .lock_code
            .map(|code| self.translate("lock", code, messages::lock_name(self.firmware, code)));

        let sensor_error_code = self
            .read_code(transport, Measurement::SensorErrorCode)
            .await
            .unwrap_or_else(|error| {
                debug!("sensor error code unavailable: {error:#}");
                None
            });

        let measurements =
            match timeout(Self::OPERATING_DATA_TIMEOUT, self.read_operating_data(transport)).await {
                Ok(Ok(measurements)) => measurements,
                Ok(Err(error)) => {
                    warn!("partial data, operating data skipped: {error:#}");
                    BTreeMap::new()
                }
                Err(_) => {
                    warn!(
                        timeout = ?Self::OPERATING_DATA_TIMEOUT,
                        "partial data, operating data timed out",
                    );
                    transport.disconnect().await;
                    BTreeMap::new()
                }
            };

        self.sync_disconnects(transport);
        let power = |measurement: Measurement| {
            measurements.get(&measurement).and_then(Value::as_f64).map(Watts)
        };
        let cop = self.cop.update(
            power(Measurement::CurrentPowerConsumption),
            power(Measurement::CurrentHeatingPower),
        );

        let snapshot = Snapshot {
            fetched_at: Local::now(),
            connected: transport.is_connected(),
            status,
            status_code: core.status_code,
            lock,
            lock_code: core.lock_code,
            error_code: core.error_code,
            sensor_error_code,
            cop,
            measurements,
        };
        debug!(
            %snapshot.status,
            n_measurements = snapshot.measurements.len(),
            ?snapshot.cop,
            "polled",
        );
        Ok(snapshot)
    }

    /// Forget the smoothing state if the transport has disconnected since it was last updated.
    fn sync_disconnects<T: Transport>(&mut self, transport: &T) {
        let n_disconnects = transport.n_disconnects();
        if n_disconnects != self.n_disconnects_seen {
            if self.cop.last().is_some() {
                debug!(n_disconnects, "transport disconnected, resetting COP smoothing");
            }
            self.cop.reset();
            self.n_disconnects_seen = n_disconnects;
        }
    }

    /// Read the status, lock and error codes.
    ///
    /// A request timeout on the status code fails the cycle as a core status timeout.
    async fn read_core_status<T: Transport>(
        &self,
        transport: &mut T,
    ) -> Result<CoreStatus, CycleError> {
        let status_code = match self.read_code(transport, Measurement::StatusCode).await {
            Ok(code) => code.ok_or(CycleError::NoData { source: None })?,
            Err(TransportError::Timeout(after)) => {
                warn!(timeout = ?after, "status request timed out");
                return Err(CycleError::Timeout(after));
            }
            Err(error) => return Err(CycleError::NoData { source: Some(error) }),
        };
        let lock_code =
            self.read_code(transport, Measurement::LockCode).await.unwrap_or_else(|error| {
                warn!("failed to read the lock code: {error:#}");
                None
            });
        let error_code =
            self.read_code(transport, Measurement::ErrorCode).await.unwrap_or_else(|error| {
                warn!("failed to read the error code: {error:#}");
                None
            });
        Ok(CoreStatus { status_code, lock_code, error_code })
    }

    /// Read a single-word code, `None` when the firmware does not provide it.
    async fn read_code<T: Transport>(
        &self,
        transport: &mut T,
        measurement: Measurement,
    ) -> Result<Option<u16>, TransportError> {
        let Some((address, definition)) = measurement.locate(self.firmware) else {
            return Ok(None);
        };
        let words =
            transport.read_registers(definition.kind, address, 1, self.station_id).await?;
        Ok(words.first().copied())
    }

    /// Read the available operating-data groups.
    ///
    /// Device exceptions and invalid encodings skip the register, any other error aborts the phase.
    async fn read_operating_data<T: Transport>(
        &self,
        transport: &mut T,
    ) -> Result<BTreeMap<Measurement, Value>, TransportError> {
        let mut measurements = BTreeMap::new();
        for group in Group::ALL {
            for &measurement in group.measurements() {
                if !measurement.is_available(self.firmware, self.features) {
                    continue;
                }
                let Some((address, definition)) = measurement.locate(self.firmware) else {
                    continue;
                };
                let words = match transport
                    .read_registers(definition.kind, address, definition.n_words(), self.station_id)
                    .await
                {
                    Ok(words) => words,
                    Err(error) if error.is_fatal() => return Err(error),
                    Err(error) => {
                        debug!(%measurement, address, "skipped: {error:#}");
                        continue;
                    }
                };
                match decode_value(&words, &definition) {
                    Some(value) => {
                        trace!(%measurement, %value, "decoded");
                        measurements.insert(measurement, value);
                    }
                    None => debug!(%measurement, ?words, "invalid encoding, skipped"),
                }
            }
        }
        Ok(measurements)
    }

    /// Translate the code, warning about the first unknown code in the session.
    fn translate(&mut self, kind: &str, code: u16, name: Option<&'static str>) -> String {
        if name.is_none() {
            if self.warned_unknown_code {
                debug!(kind, code, "unknown code");
            } else {
                warn!(kind, code, firmware = %self.firmware, "unknown code, check the firmware version");
                self.warned_unknown_code = true;
            }
        }
        messages::or_unknown(name, code).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::api::modbus::{
        TcpTransport,
        fake::{FakeTransport, Reply, listen},
    };

    /// Device answering every register of the firmware, heating at COP 1.6.
    fn device(version: FirmwareVersion) -> FakeTransport {
        let mut transport = FakeTransport::default();
        for measurement in EnumSet::<Measurement>::all() {
            if let Some(definition) = measurement.lookup(version) {
                let address = definition.address.unwrap();
                for offset in 0..definition.n_words() {
                    transport.holding.insert(address + offset, 1);
                }
            }
        }
        let status = Measurement::StatusCode.definition(version).address.unwrap();
        transport.holding.insert(status, 2);
        let lock = Measurement::LockCode.definition(version).address.unwrap();
        transport.holding.insert(lock, 0);
        let error = Measurement::ErrorCode.definition(version).address.unwrap();
        transport.holding.insert(error, 0);
        transport.holding.insert(10, 355);
        transport.holding.insert(12, 65486);
        transport.holding.insert(70, 2500);
        transport.holding.insert(71, 4000);
        transport
    }

    fn engine(version: FirmwareVersion) -> PollingEngine {
        PollingEngine::new(version, 1, Feature::default_set())
    }

    #[tokio::test]
    async fn test_poll_once_ok() {
        let mut transport = device(FirmwareVersion::Lm);
        let snapshot = engine(FirmwareVersion::Lm).poll_once(&mut transport).await.unwrap();

        assert!(snapshot.connected);
        assert_eq!(snapshot.status, "heating");
        assert_eq!(snapshot.status_code, 2);
        assert_eq!(snapshot.lock.as_deref(), Some("none"));
        assert_eq!(snapshot.error_code, Some(0));
        assert_eq!(snapshot.sensor_error_code, Some(1));
        assert_eq!(snapshot.cop, Some(1.6));
        assert_abs_diff_eq!(snapshot.get_float(Measurement::FlowTemperature).unwrap(), 35.5);
        assert_abs_diff_eq!(snapshot.get_float(Measurement::OutsideTemperature).unwrap(), -5.0);
        assert_eq!(snapshot.get(Measurement::CompressorOutput), Some(&Value::Bool(true)));
        assert_eq!(
            snapshot.get(Measurement::OperatingMode),
            Some(&Value::Text("winter".to_string())),
        );
        assert!(snapshot.get(Measurement::HotWaterEnergy).is_some());
        assert!(snapshot.get(Measurement::CoolingEnergy).is_none());
        assert!(snapshot.get(Measurement::BrinePressure).is_none());
        assert!(snapshot.get(Measurement::PoolEnergy).is_none());
        assert!(!snapshot.measurements.contains_key(&Measurement::StatusCode));
    }

    #[tokio::test]
    async fn test_version_dependent_data() {
        let mut transport = device(FirmwareVersion::H);
        let snapshot = engine(FirmwareVersion::H).poll_once(&mut transport).await.unwrap();

        assert_eq!(snapshot.status, "heat_pump_on_heating");
        assert_eq!(snapshot.sensor_error_code, None);
        assert!(snapshot.get(Measurement::PvSurplus).is_none());
        assert!(snapshot.get(Measurement::EnvironmentalEnergy).is_none());
        assert!(snapshot.get(Measurement::OperatingMode).is_none());
        assert!(snapshot.get(Measurement::FlowTemperature).is_some());
    }

    #[tokio::test]
    async fn test_unaddressed_features_are_not_read() {
        let mut transport = device(FirmwareVersion::Lm);
        let features = Feature::Pool | Feature::SecondHeatingCircuit;
        let mut engine = PollingEngine::new(FirmwareVersion::Lm, 1, features);
        let snapshot = engine.poll_once(&mut transport).await.unwrap();

        assert!(snapshot.get(Measurement::PoolEnergy).is_none());
        assert!(snapshot.get(Measurement::Hc2ComfortSetpoint).is_none());
        assert!(snapshot.get(Measurement::FlowTemperature).is_some());
        assert!(snapshot.connected);
    }

    #[tokio::test]
    async fn test_connection_failure() {
        let mut transport = FakeTransport { refuse_connect: true, ..device(FirmwareVersion::Lm) };
        let result = engine(FirmwareVersion::Lm).poll_once(&mut transport).await;
        assert!(matches!(result, Err(CycleError::Connection(_))));
    }

    #[tokio::test]
    async fn test_no_status() {
        let mut transport = device(FirmwareVersion::J);
        transport.holding.remove(&43);
        let result = engine(FirmwareVersion::J).poll_once(&mut transport).await;
        assert!(matches!(
            result,
            Err(CycleError::NoData { source: Some(TransportError::Exception(_)) }),
        ));
        assert!(transport.connected);
    }

    #[tokio::test]
    async fn test_lock_failure_is_tolerated() {
        let mut transport = device(FirmwareVersion::J);
        transport.holding.remove(&59);
        let snapshot = engine(FirmwareVersion::J).poll_once(&mut transport).await.unwrap();
        assert_eq!(snapshot.lock, None);
        assert_eq!(snapshot.lock_code, None);
        assert_eq!(snapshot.error_code, Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_core_status_timeout() {
        let mut transport = device(FirmwareVersion::Lm);
        transport.stall_at.insert(103);
        let result = engine(FirmwareVersion::Lm).poll_once(&mut transport).await;
        assert!(matches!(result, Err(CycleError::Timeout(_))));
        assert!(!transport.connected);
        assert_eq!(transport.n_disconnects, 1);
    }

    #[tokio::test]
    async fn test_core_status_stall_over_tcp() {
        let endpoint = listen(Reply::Silence).await;
        let mut transport =
            TcpTransport::new(endpoint).with_request_timeout(Duration::from_millis(200));
        let result = engine(FirmwareVersion::Lm).poll_once(&mut transport).await;
        assert!(matches!(result, Err(CycleError::Timeout(_))), "{result:?}");
        assert!(!transport.is_connected());
        assert_eq!(transport.n_disconnects(), 1);
    }

    #[tokio::test]
    async fn test_core_status_exception_over_tcp() {
        let mut transport = TcpTransport::new(listen(Reply::Exception(0x02)).await);
        let result = engine(FirmwareVersion::Lm).poll_once(&mut transport).await;
        assert!(matches!(
            result,
            Err(CycleError::NoData { source: Some(TransportError::Exception(_)) }),
        ));
        assert!(transport.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_operating_data_timeout() {
        let mut transport = device(FirmwareVersion::Lm);
        transport.stall_at.insert(10);
        let snapshot = engine(FirmwareVersion::Lm).poll_once(&mut transport).await.unwrap();
        assert_eq!(snapshot.status, "heating");
        assert_eq!(snapshot.lock_code, Some(0));
        assert!(snapshot.measurements.is_empty());
        assert_eq!(snapshot.cop, None);
        assert!(!snapshot.connected);
    }

    #[tokio::test]
    async fn test_operating_data_network_failure() {
        let mut transport = device(FirmwareVersion::Lm);
        transport.fail_at.insert(30);
        let snapshot = engine(FirmwareVersion::Lm).poll_once(&mut transport).await.unwrap();
        assert!(snapshot.measurements.is_empty());
        assert!(!snapshot.connected);
    }

    #[tokio::test]
    async fn test_exception_skips_register() {
        let mut transport = device(FirmwareVersion::Lm);
        transport.holding.remove(&11);
        let snapshot = engine(FirmwareVersion::Lm).poll_once(&mut transport).await.unwrap();
        assert!(snapshot.get(Measurement::ReturnTemperature).is_none());
        assert!(snapshot.get(Measurement::FlowTemperature).is_some());
        assert!(snapshot.get(Measurement::HighPressure).is_some());
        assert!(snapshot.connected);
    }

    #[tokio::test]
    async fn test_cop_carried_forward() {
        let mut transport = device(FirmwareVersion::Lm);
        let mut engine = engine(FirmwareVersion::Lm);
        engine.poll_once(&mut transport).await.unwrap();
        transport.holding.insert(70, 1000);
        let snapshot = engine.poll_once(&mut transport).await.unwrap();
        assert_eq!(snapshot.cop, Some(1.6));
    }

    #[tokio::test]
    async fn test_disconnect_clears_cop() {
        let mut transport = device(FirmwareVersion::Lm);
        let mut engine = engine(FirmwareVersion::Lm);
        assert_eq!(engine.poll_once(&mut transport).await.unwrap().cop, Some(1.6));

        transport.disconnect().await;
        transport.holding.insert(70, 1000);
        let snapshot = engine.poll_once(&mut transport).await.unwrap();
        assert!(snapshot.connected);
        assert_eq!(snapshot.cop, None);
        assert_eq!(transport.n_connects, 2);
    }

    #[tokio::test]
    async fn test_unknown_status() {
        let mut transport = device(FirmwareVersion::Lm);
        transport.holding.insert(103, 999);
        let mut engine = engine(FirmwareVersion::Lm);
        let snapshot = engine.poll_once(&mut transport).await.unwrap();
        assert_eq!(snapshot.status, "unknown_999");
        assert!(engine.warned_unknown_code);
    }
}
