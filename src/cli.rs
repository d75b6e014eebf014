use std::time::Duration;

use clap::Parser;
use log::LevelFilter;
use qmc5883::{Config, Mode};

#[derive(Debug, Parser, Clone)]
#[command(about = "Lecture de l'azimut d'un magnétomètre QMC5883")]
pub struct Cli {
    /// Numéro du bus I2C (bus par défaut sinon)
    #[arg(long)]
    pub bus: Option<u8>,

    /// Adresse du capteur
    #[arg(long, value_parser = parse_address)]
    pub address: Option<u16>,

    /// Déclinaison magnétique en degrés
    #[arg(long, allow_hyphen_values = true)]
    pub declination: Option<i32>,

    #[arg(long, value_enum)]
    pub mode: Option<Mode>,

    /// Délai avant chaque mesure
    #[arg(long)]
    pub period_ms: Option<u64>,

    /// Nombre de mesures
    #[arg(long, conflicts_with = "forever")]
    pub samples: Option<u64>,

    /// Mesure jusqu'à l'arrêt (Ctrl-C)
    #[arg(long)]
    pub forever: bool,

    /// Une ligne JSON par mesure
    #[arg(long)]
    pub json: bool,

    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    pub fn level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Warn;
        }

        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Configuration par défaut surchargée par la ligne de commande
    pub fn config(&self) -> Config {
        let mut config = Config::new();

        config.bus = self.bus.or(config.bus);
        config.address = self.address.unwrap_or(config.address);
        config.declination = self.declination.unwrap_or(config.declination);
        config.mode = self.mode.unwrap_or(config.mode);

        if let Some(period) = self.period_ms {
            config.period = Duration::from_millis(period);
        }

        if self.forever {
            config.samples = None;
        } else if self.samples.is_some() {
            config.samples = self.samples;
        }

        config
    }
}

fn parse_address(value: &str) -> Result<u16, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => value.parse(),
    };

    parsed.map_err(|e| format!("adresse invalide '{}': {}", value, e))
}
