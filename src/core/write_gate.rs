use std::sync::atomic::{AtomicBool, Ordering};

use tokio_modbus::{Address, SlaveId};

use crate::{
    api::modbus::Transport,
    core::{
        catalog::{Access, Measurement, RegisterDefinition, Unit},
        error::{WriteError, WriteRejected},
        firmware::FirmwareVersion,
        operating_mode::OperatingMode,
    },
    prelude::*,
};

/// Refuses writes unless explicitly enabled, read-only by default.
#[derive(Debug, Default)]
pub struct WriteGate {
    enabled: AtomicBool,
}

impl WriteGate {
    pub fn set_enabled(&self, enabled: bool) {
        if self.enabled.swap(enabled, Ordering::Relaxed) != enabled {
            info!(enabled, "toggled writes");
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Validate the write and convert the value into the register address and raw word.
    pub fn check(
        &self,
        measurement: Measurement,
        value: f64,
        firmware: FirmwareVersion,
    ) -> Result<(Address, u16), WriteRejected> {
        if !self.is_enabled() {
            return Err(WriteRejected::Disabled);
        }
        let Some((address, definition)) = measurement.locate(firmware) else {
            return Err(WriteRejected::Unavailable { measurement, firmware });
        };
        match measurement.access() {
            Access::ReadOnly => return Err(WriteRejected::ReadOnly(measurement)),
            Access::ReadWrite => {}
            Access::Bounded { min, max } if !is_within(value, min, max) => {
                return Err(WriteRejected::OutOfBounds { measurement, value, min, max });
            }
            Access::Bounded { .. } => {}
        }
        if definition.unit == Unit::Mode && !is_operating_mode(value) {
            return Err(WriteRejected::InvalidMode { value });
        }
        let raw = to_raw(value, &definition)
            .ok_or(WriteRejected::Unrepresentable { measurement, value })?;
        Ok((address, raw))
    }

    #[instrument(skip_all, fields(%measurement, value, %firmware))]
    pub async fn try_write<T: Transport>(
        &self,
        transport: &mut T,
        station_id: SlaveId,
        measurement: Measurement,
        value: f64,
        firmware: FirmwareVersion,
    ) -> Result<(), WriteError> {
        let (address, raw) = self.check(measurement, value, firmware)?;
        info!(address, raw, "writing…");
        transport.write_register(address, raw, station_id).await?;
        info!("written");
        Ok(())
    }

    /// Write the raw word, only the enable flag is checked.
    #[instrument(skip_all, fields(address, value))]
    pub async fn try_write_register<T: Transport>(
        &self,
        transport: &mut T,
        station_id: SlaveId,
        address: Address,
        value: u16,
    ) -> Result<(), WriteError> {
        if !self.is_enabled() {
            return Err(WriteRejected::Disabled.into());
        }
        info!("writing…");
        transport.write_register(address, value, station_id).await?;
        info!("written");
        Ok(())
    }
}

#[expect(clippy::cast_precision_loss)]
fn is_within(value: f64, min: i64, max: i64) -> bool {
    (min as f64..=max as f64).contains(&value)
}

#[expect(clippy::cast_possible_truncation)]
fn is_operating_mode(value: f64) -> bool {
    value.fract() == 0.0 && OperatingMode::try_from(value as i64).is_ok()
}

/// Convert the scaled value into the raw register word.
///
/// Negative values of signed registers are encoded in two's complement.
#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_raw(value: f64, definition: &RegisterDefinition) -> Option<u16> {
    let raw = (value / definition.scale).round();
    if !raw.is_finite() {
        return None;
    }
    if definition.signed {
        (f64::from(i16::MIN)..=f64::from(i16::MAX)).contains(&raw).then(|| raw as i16 as u16)
    } else {
        (0.0..=f64::from(u16::MAX)).contains(&raw).then_some(raw as u16)
    }
}
