mod catalog;
mod device;
mod poll;
mod read;
mod write;

use clap::{Parser, Subcommand};

use crate::cli::{
    catalog::CatalogArgs,
    poll::PollArgs,
    read::ReadArgs,
    write::{WriteArgs, WriteRegisterArgs},
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: poll the heat pump on a fixed interval and print the snapshots.
    #[clap(name = "poll")]
    Poll(Box<PollArgs>),

    /// Read raw registers.
    #[clap(name = "read")]
    Read(Box<ReadArgs>),

    /// Write a measurement setting, such as the operating mode or a setpoint.
    #[clap(name = "write")]
    Write(Box<WriteArgs>),

    /// Write a raw holding register.
    #[clap(name = "write-register")]
    WriteRegister(Box<WriteRegisterArgs>),

    /// Print the register map of the firmware version.
    #[clap(name = "catalog")]
    Catalog(CatalogArgs),
}

impl Command {
    pub async fn run(self) -> crate::prelude::Result {
        match self {
            Self::Poll(args) => args.run().await,
            Self::Read(args) => args.run().await,
            Self::Write(args) => args.run().await,
            Self::WriteRegister(args) => args.run().await,
            Self::Catalog(args) => {
                args.run();
                Ok(())
            }
        }
    }
}
