mod cli;
mod logger;

use clap::Parser;
use log::{debug, error, info};
use tokio::signal;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

use qmc5883::{Config, Magnetometer, Reader, RegisterBus};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logger::init(cli.level())?;
    let config = cli.config();

    #[cfg(feature = "fake-sensors")]
    let bus = qmc5883::sensors::mag::fake::FakeBus::new();

    #[cfg(all(feature = "real-sensors", not(feature = "fake-sensors")))]
    let bus = qmc5883::i2c::open_bus(config.bus)?;

    #[cfg(not(any(feature = "real-sensors", feature = "fake-sensors")))]
    anyhow::bail!("[MAIN] Aucun bus I2C : activer 'real-sensors' ou 'fake-sensors'");

    #[cfg(any(feature = "real-sensors", feature = "fake-sensors"))]
    run(bus, config, cli.json).await
}

async fn run<B>(bus: B, config: Config, json: bool) -> anyhow::Result<()>
where
    B: RegisterBus + Send + 'static,
{
    debug!("[MAIN] Configuration: {}", serde_json::to_string(&config)?);
    let token = CancellationToken::new();

    let mag = Magnetometer::new(bus, &config)?;
    let mut reader = Reader::new(mag, &config, token.child_token());

    // Ctrl-C
    {
        let token = token.clone();
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                info!("[MAIN] Arrêt demandé.");
                token.cancel();
            }
        });
    }

    while let Some(data) = reader.next().await {
        match data {
            Ok(data) if json => println!("{}", serde_json::to_string(&data)?),
            Ok(data) => info!("[MAG] Azimut: {} (x: {} y: {} z: {})", data.heading, data.raw.0, data.raw.1, data.raw.2),
            Err(e) => error!("[MAG] {:#}", e),
        }
    }

    reader.join().await?;
    info!("[MAIN] Fin.");

    Ok(())
}
