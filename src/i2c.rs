#[cfg(feature = "real-sensors")]
use anyhow::Context;
#[cfg(feature = "real-sensors")]
use rppal::i2c::I2c;

/// Accès registre par registre à un périphérique I2C
pub trait RegisterBus {
    /// Défini l'adresse du périphérique visé par les transactions suivantes
    fn set_slave(&mut self, address: u16) -> anyhow::Result<()>;

    /// Lecture d'un octet (word) sur la position donnée d'un registre 8 bits
    fn lecture_word(&mut self, register: u8) -> anyhow::Result<u8>;
}

/// Ouvre le bus I2C (bus par défaut de la plateforme si aucun n'est donné)
#[cfg(feature = "real-sensors")]
pub fn open_bus(bus: Option<u8>) -> anyhow::Result<I2c> {
    let i2c = match bus {
        Some(bus) => I2c::with_bus(bus).with_context(|| format!("[I2C] Ouverture du bus {} impossible", bus))?,
        None => I2c::new().context("[I2C] Ouverture du bus par défaut impossible")?,
    };

    log::info!("[I2C] Bus {} ouvert.", i2c.bus());
    Ok(i2c)
}

#[cfg(feature = "real-sensors")]
impl RegisterBus for I2c {
    fn set_slave(&mut self, address: u16) -> anyhow::Result<()> {
        self.set_slave_address(address)
            .with_context(|| format!("adresse {:#04x} refusée", address))
    }

    fn lecture_word(&mut self, register: u8) -> anyhow::Result<u8> {
        // Ecrit l'index du registre puis lis un seul octet
        let mut buffer = [0u8; 1];
        self.write_read(&[register], &mut buffer)?;
        Ok(buffer[0])
    }
}
