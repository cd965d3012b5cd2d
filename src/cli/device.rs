//! Heat pump connection arguments.

use clap::Parser;
use tokio_modbus::SlaveId;

use crate::{
    api::modbus::{Endpoint, TcpTransport},
    core::{
        feature::Feature,
        firmware::FirmwareVersion,
        session::{Device, Session},
    },
};

#[must_use]
#[derive(Parser)]
pub struct DeviceArgs {
    /// Heat pump controller host name or IP address.
    #[clap(long, env = "WPM_HOST")]
    pub host: String,

    #[clap(long, env = "WPM_PORT", default_value_t = Endpoint::DEFAULT_PORT)]
    pub port: u16,

    /// Controller software generation.
    #[clap(long, env = "WPM_FIRMWARE", default_value = "l-m")]
    pub firmware: FirmwareVersion,

    /// Modbus unit identifier.
    #[clap(long, env = "WPM_STATION_ID", default_value = "1")]
    pub station_id: SlaveId,

    /// Installed features, gating the related measurements.
    #[clap(
        long,
        env = "WPM_FEATURES",
        value_delimiter = ',',
        default_value = "hot-water,defrost"
    )]
    pub features: Vec<Feature>,
}

impl DeviceArgs {
    pub fn device(&self) -> Device {
        Device::builder()
            .endpoint(Endpoint::new(&self.host, self.port))
            .firmware(self.firmware)
            .station_id(self.station_id)
            .features(self.features.iter().copied().collect())
            .build()
    }

    pub fn session(&self) -> Session<TcpTransport> {
        Session::tcp(self.device())
    }
}
