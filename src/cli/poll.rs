use std::time::Duration;

use clap::Parser;
use tokio::time::{MissedTickBehavior, interval};

use crate::{
    api::modbus::TcpTransport,
    cli::device::DeviceArgs,
    core::{catalog::Measurement, session::Session, snapshot::Snapshot},
    prelude::*,
    tables::build_snapshot_table,
};

#[derive(Parser)]
pub struct PollArgs {
    #[clap(flatten)]
    device: DeviceArgs,

    #[clap(long, env = "WPM_POLLING_INTERVAL", default_value = "30s")]
    interval: humantime::Duration,

    /// Poll once and exit, failing if the cycle fails.
    #[clap(long)]
    once: bool,

    /// Print each snapshot as a JSON line instead of a table.
    #[clap(long, env = "WPM_JSON")]
    json: bool,
}

impl PollArgs {
    pub async fn run(self) -> Result {
        let session = self.device.session();
        let result = if self.once {
            match session.poll_once().await {
                Ok(snapshot) => self.print(&snapshot),
                Err(error) => Err(Error::from(error).context("poll cycle failed")),
            }
        } else {
            self.run_loop(&session).await
        };
        session.shutdown().await;
        result
    }

    async fn run_loop(&self, session: &Session<TcpTransport>) -> Result {
        let period: Duration = self.interval.into();
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                result = &mut shutdown => {
                    result?;
                    info!("shutting down…");
                    break Ok(());
                }
                _ = interval.tick() => {
                    match session.poll_once().await {
                        Ok(snapshot) => self.print(&snapshot)?,
                        Err(error) => error!("poll cycle failed: {:#}", Error::from(error)),
                    }
                }
            }
        }
    }

    fn print(&self, snapshot: &Snapshot) -> Result {
        info!(
            %snapshot.status,
            running = snapshot.is_running(),
            defrosting = snapshot.is_defrosting(),
            cop = ?snapshot.cop,
            power_in = ?snapshot.get_float(Measurement::CurrentPowerConsumption),
            power_out = ?snapshot.get_float(Measurement::CurrentHeatingPower),
            "polled",
        );
        if self.json {
            let line = serde_json::to_string(snapshot).context("failed to serialize the snapshot")?;
            println!("{line}");
        } else {
            println!("{}", build_snapshot_table(snapshot, self.device.firmware));
        }
        Ok(())
    }
}

async fn shutdown_signal() -> Result {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate =
            signal(SignalKind::terminate()).context("failed to install the signal handler")?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.context("failed to listen for Ctrl+C")?,
            _ = terminate.recv() => {},
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await.context("failed to listen for Ctrl+C")?;

    Ok(())
}
