use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::registry;
use crate::i2c::RegisterBus;

/// Intensité du champ horizontal simulé (en LSB)
const FIELD: f32 = 1200.0;
/// Rotation entre deux mesures (en degrés)
const STEP: f32 = 3.0;
/// Décalage "Hard Iron" simulé
const BIAS: (i16, i16, i16) = (-340, 215, 60);
const NOISE: i16 = 8;

/// Capteur simulé : un champ qui tourne lentement, biaisé et bruité
pub struct FakeBus {
    rng: StdRng,
    angle: f32,
    registers: [u8; 6],
}

impl FakeBus {
    pub fn new() -> Self {
        FakeBus::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        FakeBus::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        FakeBus { rng, angle: 0.0, registers: [0; 6] }
    }

    /// Nouvelle mesure, rangée dans l'ordre des registres (X, Z, Y)
    fn advance(&mut self) {
        self.angle = (self.angle + STEP) % 360.0;
        let (sin, cos) = self.angle.to_radians().sin_cos();

        let x = (FIELD * cos) as i16 + BIAS.0 + self.rng.gen_range(-NOISE..=NOISE);
        let y = (FIELD * sin) as i16 + BIAS.1 + self.rng.gen_range(-NOISE..=NOISE);
        let z = BIAS.2 + self.rng.gen_range(-NOISE..=NOISE);

        for (index, value) in [x, z, y].into_iter().enumerate() {
            let [high, low] = value.to_be_bytes();
            self.registers[index * 2] = high;
            self.registers[index * 2 + 1] = low;
        }
    }
}

impl Default for FakeBus {
    fn default() -> Self {
        FakeBus::new()
    }
}

impl RegisterBus for FakeBus {
    fn set_slave(&mut self, _address: u16) -> anyhow::Result<()> {
        Ok(())
    }

    fn lecture_word(&mut self, register: u8) -> anyhow::Result<u8> {
        if register == registry::QMC5883_X_H {
            self.advance();
        }

        match register {
            registry::QMC5883_X_H..=registry::QMC5883_Y_L => Ok(self.registers[(register - registry::QMC5883_X_H) as usize]),
            _ => Ok(0),
        }
    }
}
