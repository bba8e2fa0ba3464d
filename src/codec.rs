//! Pure conversions between typed values and MTS4x register bytes.

use libm::roundf;

use crate::constants::TEMP_CMD_HEATER_ON;
use crate::data::{Averaging, MeasurementMode, SampleRate, SensorConfig, TempCfg, TempCmd};

const CRC8_POLYNOMIAL: u8 = 0x31;  // x^8 + x^5 + x^4 + 1
const RAW_PER_DEGREE: f32 = 256.0;
const RAW_OFFSET_C: f32 = 25.0;


/// Temp_Cmd value for a measurement mode, heater nibble 0b1010 when `heater` is set
pub fn encode_command(mode: MeasurementMode, heater: bool) -> u8 {
    let mut cmd = TempCmd(0);
    cmd.set_mode_bits(mode as u8);
    if heater {
        cmd.set_heater_bits(TEMP_CMD_HEATER_ON);
    }
    cmd.0
}

/// mode and heater state of a Temp_Cmd value
pub fn decode_command(value: u8) -> (MeasurementMode, bool) {
    let cmd = TempCmd(value);
    (MeasurementMode::from(cmd.mode_bits()), cmd.heater_bits() == TEMP_CMD_HEATER_ON)
}

/// replace the heater nibble, keeping bits 7:4
pub fn with_heater(command: u8, heater: bool) -> u8 {
    let mut cmd = TempCmd(command);
    cmd.set_heater_bits(if heater { TEMP_CMD_HEATER_ON } else { 0 });
    cmd.0
}

/// Temp_Cfg value, unused bits 2:1 are zero
pub fn encode_config(rate: SampleRate, averaging: Averaging, sleep_enable: bool) -> u8 {
    let mut cfg = TempCfg(0);
    cfg.set_rate_bits(rate as u8);
    cfg.set_avg_bits(averaging as u8);
    cfg.set_sleep_enable(sleep_enable);
    cfg.0
}

pub fn decode_config(value: u8) -> SensorConfig {
    let cfg = TempCfg(value);
    SensorConfig {
        sample_rate: SampleRate::from(cfg.rate_bits()),
        averaging: Averaging::from(cfg.avg_bits()),
        sleep_enable: cfg.sleep_enable(),
    }
}

/// little endian two's complement combine
pub fn decode_raw_temperature(lsb: u8, msb: u8) -> i16 {
    i16::from_le_bytes([lsb, msb])
}

/// [lsb, msb] register pair for a raw value
pub fn encode_raw_temperature(raw: i16) -> [u8; 2] {
    raw.to_le_bytes()
}

pub fn raw_to_celsius(raw: i16) -> f32 {
    raw as f32 / RAW_PER_DEGREE + RAW_OFFSET_C
}

/// Nearest raw value for a temperature. Out of range values saturate at
/// `i16::MIN` / `i16::MAX`; NaN maps to 0 (25 °C).
pub fn celsius_to_raw(celsius: f32) -> i16 {
    // float to int `as` casts saturate
    roundf((celsius - RAW_OFFSET_C) * RAW_PER_DEGREE) as i16
}

/// CRC8, polynomial 0x31, init 0x00, MSB first, no final xor
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc: u8 = 0x00;
    for byte in data {
        crc ^= *byte;
        for _ in 0..8 {
            if crc & 0x80 != 0 {
                crc = (crc << 1) ^ CRC8_POLYNOMIAL;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

/// compare the checksum of `data` with the trailing byte supplied by the device
pub fn crc_matches(data: &[u8], expected: u8) -> bool {
    crc8(data) == expected
}
