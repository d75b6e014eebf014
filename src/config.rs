use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::sensors::mag::registry;

/// Calcul du cap utilisé par la boucle de lecture
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    /// Azimut brut, atan2(x, y)
    Uncalibrated,
    /// Calibration min/max et déclinaison
    Calibrated,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Config {
    pub bus: Option<u8>,
    pub address: u16,
    pub declination: i32,
    pub mode: Mode,
    pub period: Duration,
    pub samples: Option<u64>,
}

impl Config {
    pub fn new() -> Self {
        let config = Config {
            bus: None,
            address: registry::QMC5883_MAG_ADDR,
            declination: 15,
            mode: Mode::Uncalibrated,
            period: Duration::from_millis(100),
            samples: Some(10000),
        };

        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}
