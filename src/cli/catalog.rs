use clap::Parser;

use crate::{core::firmware::FirmwareVersion, tables::build_catalog_table};

#[derive(Parser)]
pub struct CatalogArgs {
    /// Print only this firmware version.
    #[clap(long, env = "WPM_FIRMWARE")]
    firmware: Option<FirmwareVersion>,
}

impl CatalogArgs {
    pub fn run(self) {
        let versions = self.firmware.map_or_else(|| FirmwareVersion::ALL.to_vec(), |it| vec![it]);
        for version in versions {
            println!("Firmware {version}:");
            println!("{}", build_catalog_table(version));
        }
    }
}
