use anyhow::Context;
use log::{debug, info};

use crate::config::{Config, Mode};
use crate::i2c::RegisterBus;

pub mod heading;
pub mod reader;
pub mod registry;

#[cfg(feature = "fake-sensors")]
pub mod fake;

use heading::{AxisSample, Calibration};

/// Magnétomètre 3 axes QMC5883 (adresse 0x1E)
pub struct Magnetometer<B: RegisterBus> {
    bus: B,
    address: u16,
    declination: i32,
    calibration: Calibration,
}

impl<B: RegisterBus> Magnetometer<B> {
    /// Constructeur, la première mesure sert de point de départ à la calibration
    pub fn new(mut bus: B, config: &Config) -> anyhow::Result<Self> {
        info!("[QMC5883] Initialisation (adresse {:#04x}) ...", config.address);

        bus.set_slave(config.address)
            .context("[QMC5883] Capteur non disponible")?;

        let first = read_axes(&mut bus).context("[QMC5883] Mesure initiale impossible")?;
        debug!("[QMC5883] Mesure initiale: x: {} y: {} z: {}", first.x, first.y, first.z);

        Ok(Magnetometer {
            bus,
            address: config.address,
            declination: config.declination,
            calibration: Calibration::new(first),
        })
    }

    /// Adresse du capteur sur le bus
    pub fn address(&self) -> u16 {
        self.address
    }

    pub fn declination(&self) -> i32 {
        self.declination
    }

    /// Permet de définir la déclinaison magnétique (en degrés) à partir d'une autre source
    pub fn set_declination(&mut self, declination: i32) {
        self.declination = declination;
    }

    /// Bornes de calibration courantes
    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Récupére les valeurs brutes des trois axes
    pub fn get_xyz(&mut self) -> anyhow::Result<AxisSample> {
        let sample = read_axes(&mut self.bus)?;
        debug!("[QMC5883] x: {} y: {} z: {}", sample.x, sample.y, sample.z);
        Ok(sample)
    }

    /// Azimut magnétique brut, sans calibration ni déclinaison
    pub fn get_azimuth(&mut self) -> anyhow::Result<u16> {
        let sample = self.get_xyz()?;
        Ok(self.heading_of(&sample, Mode::Uncalibrated))
    }

    /// Cap vrai : calibration min/max puis correction de la déclinaison
    pub fn get_true_heading_azimuth(&mut self) -> anyhow::Result<u16> {
        let sample = self.get_xyz()?;
        Ok(self.heading_of(&sample, Mode::Calibrated))
    }

    /// Cap d'une mesure déjà lue, en mode calibré les bornes sont mises à jour
    pub fn heading_of(&mut self, sample: &AxisSample, mode: Mode) -> u16 {
        if mode == Mode::Uncalibrated {
            return heading::azimuth(sample);
        }

        let (calibration, true_heading) = heading::true_heading(self.calibration, sample, self.declination);
        self.calibration = calibration;

        let (min, max) = (calibration.min(), calibration.max());
        let corrected = calibration.correct(sample);
        debug!("[QMC5883] maxx: {} minx: {}", max.x, min.x);
        debug!("[QMC5883] maxy: {} miny: {}", max.y, min.y);
        debug!("[QMC5883] maxz: {} minz: {}", max.z, min.z);
        debug!("[QMC5883] norm: x: {} y: {} z: {}", corrected.x, corrected.y, corrected.z);
        debug!("[QMC5883] Cap magnétique: {}", heading::magnetic_heading(&corrected));
        debug!("[QMC5883] Cap vrai: {}", true_heading);

        true_heading
    }

    /// Libère le bus
    pub fn close(self) -> B {
        info!("[QMC5883] Fermeture.");
        self.bus
    }
}

/// Lecture d'un registre, l'erreur de transport garde le registre en contexte
fn read_register<B: RegisterBus>(bus: &mut B, register: u8) -> anyhow::Result<u8> {
    bus.lecture_word(register)
        .with_context(|| format!("lecture du registre {:#04x} impossible", register))
}

/// Six lectures d'un octet, dans l'ordre des registres (X, Z puis Y)
fn read_axes<B: RegisterBus>(bus: &mut B) -> anyhow::Result<AxisSample> {
    let x_h = read_register(bus, registry::QMC5883_X_H)?;
    let x_l = read_register(bus, registry::QMC5883_X_L)?;
    let z_h = read_register(bus, registry::QMC5883_Z_H)?;
    let z_l = read_register(bus, registry::QMC5883_Z_L)?;
    let y_h = read_register(bus, registry::QMC5883_Y_H)?;
    let y_l = read_register(bus, registry::QMC5883_Y_L)?;

    Ok(AxisSample::new(
        heading::decode_axis(x_h, x_l),
        heading::decode_axis(y_h, y_l),
        heading::decode_axis(z_h, z_l),
    ))
}

#[cfg(test)]
mod tests {
    use nalgebra::Vector3;

    use super::*;
    use crate::i2c::mock::MockBus;

    const AXIS_REGISTERS: [u8; 6] = [0x03, 0x04, 0x05, 0x06, 0x07, 0x08];

    fn magnetometer(bus: MockBus) -> Magnetometer<MockBus> {
        Magnetometer::new(bus, &Config::new()).unwrap()
    }

    #[test]
    fn new_selects_device_and_seeds_calibration() {
        let mag = magnetometer(MockBus::with_sample(10, -1, 256));

        assert_eq!(mag.address(), 0x1E);
        assert_eq!(mag.calibration().min(), Vector3::new(10, -1, 256));
        assert_eq!(mag.calibration().max(), Vector3::new(10, -1, 256));

        let bus = mag.close();
        assert_eq!(bus.address, Some(0x1E));
        assert_eq!(bus.reads, AXIS_REGISTERS);
    }

    #[test]
    fn get_xyz_reads_six_registers_in_order() {
        let mut mag = magnetometer(MockBus::with_sample(10, -1, 256));

        let sample = mag.get_xyz().unwrap();
        assert_eq!(sample, AxisSample::new(10, -1, 256));

        let bus = mag.close();
        assert_eq!(bus.reads.len(), 12);
        assert_eq!(bus.reads[6..], AXIS_REGISTERS);
    }

    #[test]
    fn get_xyz_decodes_raw_bytes() {
        let mut bus = MockBus::default();
        bus.registers.extend([(0x03, 0x00), (0x04, 0x0A), (0x05, 0xFF), (0x06, 0xFF), (0x07, 0x80), (0x08, 0x00)]);

        let mut mag = magnetometer(bus);
        assert_eq!(mag.get_xyz().unwrap(), AxisSample::new(10, i16::MIN, -1));
    }

    #[test]
    fn new_fails_when_seed_sample_fails() {
        let mut bus = MockBus::with_sample(1, 2, 3);
        bus.failing = Some(0x07);

        let err = Magnetometer::new(bus, &Config::new()).err().unwrap();
        let chain = format!("{:#}", err);
        assert!(chain.contains("0x07"), "{}", chain);
        assert!(chain.contains("NACK"), "{}", chain);
    }

    #[test]
    fn transport_failure_aborts_read() {
        let mut mag = magnetometer(MockBus::with_sample(1, 2, 3));
        let before = *mag.calibration();

        // Aucune nouvelle lecture après le registre en échec
        mag.bus.failing = Some(0x06);
        mag.bus.reads.clear();

        assert!(mag.get_xyz().is_err());
        assert!(mag.get_true_heading_azimuth().is_err());
        assert_eq!(*mag.calibration(), before);
        assert_eq!(mag.bus.reads, [0x03, 0x04, 0x05, 0x06, 0x03, 0x04, 0x05, 0x06]);
    }

    #[test]
    fn get_azimuth_is_uncalibrated() {
        let mut mag = magnetometer(MockBus::with_sample(1, 0, 0));
        assert_eq!(mag.get_azimuth().unwrap(), 90);

        mag.bus.set_sample(0, -500, 0);
        assert_eq!(mag.get_azimuth().unwrap(), 180);

        // Le mode sans calibration ne touche pas aux bornes
        assert_eq!(mag.calibration().min(), Vector3::new(1, 0, 0));
    }

    #[test]
    fn get_true_heading_azimuth_tracks_bounds() {
        let mut mag = magnetometer(MockBus::with_sample(-100, 0, 0));

        mag.bus.set_sample(100, 0, 0);
        assert_eq!(mag.get_true_heading_azimuth().unwrap(), 195);

        mag.bus.set_sample(0, 50, 0);
        assert_eq!(mag.get_true_heading_azimuth().unwrap(), 105);

        assert_eq!(mag.calibration().min(), Vector3::new(-100, 0, 0));
        assert_eq!(mag.calibration().max(), Vector3::new(100, 50, 0));
    }

    #[test]
    fn declination_can_be_changed() {
        let mut mag = magnetometer(MockBus::with_sample(-100, 0, 0));
        mag.set_declination(-200);
        assert_eq!(mag.declination(), -200);

        // 180° - 200° = -20° soit 340°
        mag.bus.set_sample(100, 0, 0);
        assert_eq!(mag.get_true_heading_azimuth().unwrap(), 340);

        mag.set_declination(i32::MAX);
        assert_eq!(mag.get_true_heading_azimuth().unwrap(), 307);
    }
}
