use clap::Parser;
use tokio_modbus::Address;

use crate::{
    api::modbus::RegisterKind,
    cli::device::DeviceArgs,
    prelude::*,
    tables::build_registers_table,
};

#[derive(Parser)]
pub struct ReadArgs {
    #[clap(flatten)]
    device: DeviceArgs,

    #[clap(long, default_value = "holding")]
    kind: RegisterKind,

    /// Starting register address.
    address: Address,

    /// Number of registers to read.
    #[clap(default_value = "1", value_parser = clap::value_parser!(u16).range(1..=125))]
    count: u16,
}

impl ReadArgs {
    pub async fn run(self) -> Result {
        let session = self.device.session();
        let result = session.read_registers(self.kind, self.address, self.count).await;
        session.shutdown().await;
        println!("{}", build_registers_table(self.address, &result?));
        Ok(())
    }
}
