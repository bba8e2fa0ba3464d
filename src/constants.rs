// MTS4x / MTS4P+T4 registers

#![allow(nonstandard_style)]
pub const MTS4X_REG_TEMP_LSB: u8 = 0x00;  // 2 bytes at 0x00 - 0x01, signed 16 bit temperature, little endian
pub const MTS4X_REG_TEMP_MSB: u8 = 0x01;
pub const MTS4X_REG_CRC_TEMP: u8 = 0x02;  // CRC8 over the two temperature bytes
pub const MTS4X_REG_STATUS: u8 = 0x03;  // Status flags, see STATUS_* masks; first byte of the scratch block
pub const MTS4X_REG_TEMP_CMD: u8 = 0x04;  // mode bits 7:6, heater nibble 3:0
pub const MTS4X_REG_TEMP_CFG: u8 = 0x05;  // rate bits 7:5, averaging bits 4:3, sleep enable bit 0
pub const MTS4X_REG_ALERT_MODE: u8 = 0x06;  // alert enable bit 7, alarm mode bit 6
pub const MTS4X_REG_TH_LSB: u8 = 0x07;  // 2 bytes at 0x07 - 0x08, high limit, little endian
pub const MTS4X_REG_TH_MSB: u8 = 0x08;
pub const MTS4X_REG_TL_LSB: u8 = 0x09;  // 2 bytes at 0x09 - 0x0a, low limit, little endian
pub const MTS4X_REG_TL_MSB: u8 = 0x0a;
pub const MTS4X_REG_CRC_SCRATCH: u8 = 0x0b;  // CRC8 over 0x03 - 0x0a

pub const MTS4X_REG_USER_DEFINE_0: u8 = 0x0c;  // 10 user bytes at 0x0c - 0x15, backed by the EEPROM user area
pub const MTS4X_USER_REGISTER_COUNT: u8 = 10;
pub const MTS4X_REG_CRC_SCRATCH_EXT: u8 = 0x16;  // CRC8 over 0x0c - 0x15
pub const MTS4X_REG_E2PROM_CMD: u8 = 0x17;  // EEPROM commands, see MTS4X_EECMD_*
pub const MTS4X_REG_DEVICE_ID_LSB: u8 = 0x18;  // 2 bytes at 0x18 - 0x19, little endian
pub const MTS4X_REG_DEVICE_ID_MSB: u8 = 0x19;
pub const MTS4X_REG_ROMCODE: u8 = 0x1a;  // 5 bytes at 0x1a - 0x1e
pub const MTS4X_ROMCODE_LEN: usize = 5;
pub const MTS4X_REG_CRC_ROMCODE: u8 = 0x1f;

pub const MTS4X_REG_PPM_CFG: u8 = 0x63;  // parasitic power configuration, low nibble

// Status register bits
pub const STATUS_ALERT_HIGH: u8 = 0x80;
pub const STATUS_ALERT_LOW: u8 = 0x40;
pub const STATUS_BUSY: u8 = 0x20;  // conversion in progress
pub const STATUS_EE_BUSY: u8 = 0x10;  // EEPROM operation in progress
pub const STATUS_HEATER_ON: u8 = 0x08;
pub const STATUS_TH_TL_ERR: u8 = 0x04;  // TL >= TH

pub const TEMP_CMD_MODE_MASK: u8 = 0xc0;
pub const TEMP_CMD_HEATER_MASK: u8 = 0x0f;
pub const TEMP_CMD_HEATER_ON: u8 = 0x0a;  // 0b1010 in the low nibble turns the heater on

pub const ALERT_EN_MASK: u8 = 0x80;
pub const ALERT_IM_MASK: u8 = 0x40;

pub const PPM_CFG_MASK: u8 = 0x0f;
pub const PPM_CFG_ENABLE: u8 = 0x0a;  // 0b1010 enables parasitic power, 0b0000 disables

// EEPROM command codes written to MTS4X_REG_E2PROM_CMD
pub const MTS4X_EECMD_COPY_PAGE: u8 = 0x08;  // scratch -> EEPROM
pub const MTS4X_EECMD_RECALL_PAGE: u8 = 0xb8;  // EEPROM page -> scratch
pub const MTS4X_EECMD_RECALL_EE: u8 = 0xb6;  // whole EEPROM -> scratch
pub const MTS4X_EECMD_WRITE_PAGE: u8 = 0x48;  // raw page write, no copy from scratch
pub const MTS4X_EECMD_SOFT_RESET: u8 = 0x6a;  // reset, reloads from EEPROM

/// default bus clock in Hz
pub const MTS4X_DEFAULT_BUS_CLOCK: u32 = 400_000;

/// busy polling interval in ms
pub const MTS4X_POLL_INTERVAL_MS: u32 = 1;

/// default timeout in ms for EEPROM commands
pub const MTS4X_EEPROM_TIMEOUT_MS: u32 = 50;


#[repr(u8)]
/// MTS4x I2C device address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceAddress {
    /// fixed address of most MTS4 / MTS4P+T4 modules
    #[default]
    Default = 0x41,
}

impl From<DeviceAddress> for u8 {
    fn from(value: DeviceAddress) -> Self {
        match value {
            DeviceAddress::Default => 0x41,
        }
    }
}
