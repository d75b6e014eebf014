use nalgebra::Vector3;

/// Mesure brute des trois axes (x, y, z)
pub type AxisSample = Vector3<i16>;

/// Assemble un axe à partir de ses deux registres (complément à deux, little-endian)
pub fn decode_axis(msb: u8, lsb: u8) -> i16 {
    i16::from_le_bytes([lsb, msb])
}

/// Ramène un angle (en degrés) dans [0, 360)
pub fn normalize(angle: i32) -> u16 {
    angle.rem_euclid(360) as u16
}

/// Azimut sans calibration : atan2(x, y), tronqué vers zéro
pub fn azimuth(sample: &AxisSample) -> u16 {
    let degrees = f64::from(sample.x).atan2(f64::from(sample.y)).to_degrees();
    normalize(degrees as i32)
}

/// Cap magnétique à partir d'un vecteur déjà corrigé : atan2(y, x)
pub fn magnetic_heading(corrected: &Vector3<i32>) -> u16 {
    let degrees = f64::from(corrected.y).atan2(f64::from(corrected.x)).to_degrees();
    normalize(degrees as i32)
}

/// Bornes min/max observées sur chaque axe (correction "Hard Iron")
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Calibration {
    min: Vector3<i16>,
    max: Vector3<i16>,
}

impl Calibration {
    /// Initialise les bornes avec la première mesure
    pub fn new(first: AxisSample) -> Self {
        Calibration { min: first, max: first }
    }

    pub fn min(&self) -> Vector3<i16> {
        self.min
    }

    pub fn max(&self) -> Vector3<i16> {
        self.max
    }

    /// Elargit les bornes avec une nouvelle mesure, elles ne rétrécissent jamais
    pub fn update(self, sample: &AxisSample) -> Self {
        Calibration {
            min: self.min.zip_map(sample, |a, b| a.min(b)),
            max: self.max.zip_map(sample, |a, b| a.max(b)),
        }
    }

    /// Milieu des bornes pour chaque axe
    pub fn offset(&self) -> Vector3<i32> {
        self.min.zip_map(&self.max, |min, max| (i32::from(min) + i32::from(max)) / 2)
    }

    /// Retire l'offset puis inverse l'axe X
    pub fn correct(&self, sample: &AxisSample) -> Vector3<i32> {
        let mut corrected = sample.map(i32::from) - self.offset();
        corrected.x = -corrected.x;
        corrected
    }
}

/// Cap vrai : met à jour la calibration, corrige la mesure puis applique la déclinaison.
/// Retourne la nouvelle calibration avec le cap en degrés.
pub fn true_heading(calibration: Calibration, sample: &AxisSample, declination: i32) -> (Calibration, u16) {
    let calibration = calibration.update(sample);
    let magnetic = magnetic_heading(&calibration.correct(sample));

    // La déclinaison est réduite avant l'addition, n'importe quel i32 est accepté
    (calibration, normalize(i32::from(magnetic) + declination.rem_euclid(360)))
}
