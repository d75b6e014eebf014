use std::pin::Pin;
use std::task::Poll;
use std::thread;

use anyhow::anyhow;
use futures::Stream;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::Magnetometer;
use crate::config::{Config, Mode};
use crate::i2c::RegisterBus;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Data {
    pub raw: (i16, i16, i16),
    pub heading: u16,
}

/// Lecture du capteur dans un thread dédié, les mesures sortent sous forme de Stream
pub struct Reader {
    rx: mpsc::Receiver<anyhow::Result<Data>>,
    token: CancellationToken,
    handle: thread::JoinHandle<()>,
}

impl Reader {
    pub fn new<B>(mag: Magnetometer<B>, config: &Config, token: CancellationToken) -> Self
    where
        B: RegisterBus + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(16);
        let thread_token = token.clone();
        let config = config.clone();

        info!("[MAG] Démarrage du thread ...");
        let handle = thread::spawn(move || {
            let mut mag = mag;
            let mut count: u64 = 0;

            while !thread_token.is_cancelled() && config.samples.map_or(true, |n| count < n) {
                thread::sleep(config.period);
                count += 1;

                let data = read_once(&mut mag, config.mode);
                if let Err(e) = &data {
                    warn!("[MAG] Erreur lors de la récupération des données: {:#}", e);
                }

                // Plus personne n'écoute
                if tx.blocking_send(data).is_err() {
                    break;
                }
            }

            mag.close();
            info!("[MAG] Fin du thread.");
        });

        Reader { rx, token, handle }
    }

    /// Arrête la lecture et attend la fin du thread (le capteur est alors fermé)
    pub async fn join(self) -> anyhow::Result<()> {
        let Reader { rx, token, handle } = self;
        token.cancel();
        drop(rx);

        tokio::task::spawn_blocking(move || handle.join())
            .await?
            .map_err(|_| anyhow!("[MAG] Le thread de lecture a paniqué"))
    }
}

/// Une mesure complète : axes bruts puis cap selon le mode
fn read_once<B: RegisterBus>(mag: &mut Magnetometer<B>, mode: Mode) -> anyhow::Result<Data> {
    let raw = mag.get_xyz()?;
    let heading = mag.heading_of(&raw, mode);

    Ok(Data { raw: (raw.x, raw.y, raw.z), heading })
}

impl Stream for Reader {
    type Item = anyhow::Result<Data>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut std::task::Context<'_>) -> Poll<Option<Self::Item>> {
        if self.token.is_cancelled() {
            return Poll::Ready(None);
        }

        self.rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::StreamExt;

    use super::*;
    use crate::i2c::mock::MockBus;

    fn config(mode: Mode, samples: Option<u64>) -> Config {
        Config { mode, samples, period: Duration::ZERO, ..Config::new() }
    }

    #[tokio::test]
    async fn stream_yields_requested_samples() {
        let config = config(Mode::Uncalibrated, Some(3));
        let mag = Magnetometer::new(MockBus::with_sample(1, 0, 7), &config).unwrap();

        let readings: Vec<_> = Reader::new(mag, &config, CancellationToken::new()).collect().await;

        assert_eq!(readings.len(), 3);
        for data in readings {
            assert_eq!(data.unwrap(), Data { raw: (1, 0, 7), heading: 90 });
        }
    }

    #[tokio::test]
    async fn calibrated_mode_applies_declination() {
        let config = config(Mode::Calibrated, Some(1));
        let mag = Magnetometer::new(MockBus::with_sample(40, -40, 0), &config).unwrap();

        let readings: Vec<_> = Reader::new(mag, &config, CancellationToken::new()).collect().await;

        // Mesure identique à la mesure initiale : vecteur corrigé nul, seul reste la déclinaison
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].as_ref().unwrap().heading, 15);
    }

    #[tokio::test]
    async fn read_errors_do_not_stop_the_stream() {
        let config = config(Mode::Calibrated, Some(2));
        let mut mag = Magnetometer::new(MockBus::with_sample(1, 2, 3), &config).unwrap();
        mag.bus.failing = Some(0x03);

        let readings: Vec<_> = Reader::new(mag, &config, CancellationToken::new()).collect().await;

        assert_eq!(readings.len(), 2);
        assert!(readings.iter().all(|data| data.is_err()));
    }

    #[tokio::test]
    async fn cancelled_reader_ends_the_stream() {
        let config = config(Mode::Uncalibrated, None);
        let mag = Magnetometer::new(MockBus::with_sample(0, 1, 0), &config).unwrap();
        let token = CancellationToken::new();

        let mut reader = Reader::new(mag, &config, token.clone());
        assert_eq!(reader.next().await.unwrap().unwrap().heading, 0);

        token.cancel();
        assert!(reader.next().await.is_none());
    }

    #[tokio::test]
    async fn join_stops_an_endless_reader() {
        let config = Config { period: Duration::from_millis(5), ..config(Mode::Calibrated, None) };
        let mag = Magnetometer::new(MockBus::with_sample(3, 4, 5), &config).unwrap();

        let mut reader = Reader::new(mag, &config, CancellationToken::new());
        assert!(reader.next().await.unwrap().is_ok());

        reader.join().await.unwrap();
    }
}
