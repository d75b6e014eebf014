//! Driver pour magnétomètre 3 axes QMC5883 sur bus I2C : lecture brute des axes
//! et calcul de l'azimut, avec calibration min/max optionnelle.

pub mod config;
pub mod i2c;
pub mod sensors;

pub use config::{Config, Mode};
pub use i2c::RegisterBus;
pub use sensors::mag::heading::{AxisSample, Calibration};
pub use sensors::mag::reader::{Data, Reader};
pub use sensors::mag::Magnetometer;
