// QMC5883
pub const QMC5883_MAG_ADDR: u16 = 0x1E;

// Registres de contrôle (non utilisés pour le calcul)
pub const QMC5883_CONF_A: u8 = 0x00;
pub const QMC5883_CONF_B: u8 = 0x01;
pub const QMC5883_MODE: u8 = 0x02;

// Registres de sortie, attention : Z est placé avant Y
pub const QMC5883_X_H: u8 = 0x03;
pub const QMC5883_X_L: u8 = 0x04;
pub const QMC5883_Z_H: u8 = 0x05;
pub const QMC5883_Z_L: u8 = 0x06;
pub const QMC5883_Y_H: u8 = 0x07;
pub const QMC5883_Y_L: u8 = 0x08;
