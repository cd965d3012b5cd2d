use clap::Parser;
use tokio_modbus::Address;

use crate::{cli::device::DeviceArgs, core::catalog::Measurement, prelude::*};

#[derive(Parser)]
pub struct WriteArgs {
    #[clap(flatten)]
    device: DeviceArgs,

    measurement: Measurement,

    /// Value in the measurement's unit, for example `21.5` for a setpoint or `1` for winter mode.
    #[clap(allow_hyphen_values = true)]
    value: f64,

    /// Allow writing to the controller, it is read-only otherwise.
    #[clap(long, env = "WPM_WRITE_ENABLED")]
    enable_writes: bool,
}

impl WriteArgs {
    #[instrument(skip_all, fields(measurement = %self.measurement, value = self.value))]
    pub async fn run(self) -> Result {
        let session = self.device.session();
        session.set_write_enabled(self.enable_writes);
        if !session.is_available(self.measurement) {
            warn!("the measurement is not polled with the configured features");
        }
        let result = session.try_write(self.measurement, self.value).await;
        session.shutdown().await;
        result.with_context(|| format!("failed to write `{}`", self.measurement))?;
        Ok(())
    }
}

#[derive(Parser)]
pub struct WriteRegisterArgs {
    #[clap(flatten)]
    device: DeviceArgs,

    address: Address,

    /// Raw register word.
    value: u16,

    /// Allow writing to the controller, it is read-only otherwise.
    #[clap(long, env = "WPM_WRITE_ENABLED")]
    enable_writes: bool,
}

impl WriteRegisterArgs {
    #[instrument(skip_all, fields(address = self.address, value = self.value))]
    pub async fn run(self) -> Result {
        let session = self.device.session();
        session.set_write_enabled(self.enable_writes);
        let result = session.try_write_register(self.address, self.value).await;
        session.shutdown().await;
        result.with_context(|| format!("failed to write register {}", self.address))?;
        Ok(())
    }
}
