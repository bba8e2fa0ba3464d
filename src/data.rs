use bitfield::bitfield;
use const_builder::ConstBuilder;

use crate::codec::raw_to_celsius;


/// Measurement mode, Temp_Cmd bits 7:6
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum MeasurementMode {
    Continuous = 0x00,
    /// power-down when sleep is enabled in the configuration
    #[default]
    Stop = 0x01,
    /// continuous, reads back as `Continuous`
    ContinuousReadback = 0x02,
    SingleShot = 0x03,
}

impl From<u8> for MeasurementMode {
    fn from(v: u8) -> Self {
        match v & 0x03 {
            0x00 => Self::Continuous,
            0x01 => Self::Stop,
            0x02 => Self::ContinuousReadback,
            _ => Self::SingleShot,
        }
    }
}


/// Averaging count, Temp_Cfg bits 4:3
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Default)]
#[repr(u8)]
pub enum Averaging {
    Avg1 = 0x00,
    #[default]
    Avg8 = 0x01,
    Avg16 = 0x02,
    Avg32 = 0x03,
}

impl Averaging {
    /// worst case conversion time in ms for this averaging count
    pub const fn conversion_time_ms(self) -> u32 {
        match self {
            Self::Avg1 => 4,    // 2.2 ms typical
            Self::Avg8 => 7,    // 5.2 ms
            Self::Avg16 => 10,  // 8.5 ms
            Self::Avg32 => 18,  // 15.3 ms
        }
    }
}

impl From<u8> for Averaging {
    fn from(v: u8) -> Self {
        match v & 0x03 {
            0x00 => Self::Avg1,
            0x01 => Self::Avg8,
            0x02 => Self::Avg16,
            _ => Self::Avg32,
        }
    }
}


/// Measurements per second, Temp_Cfg bits 7:5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Default)]
#[allow(non_camel_case_types)]
#[repr(u8)]
pub enum SampleRate {
    Mps8Hz = 0x00,
    Mps4Hz = 0x01,
    Mps2Hz = 0x02,
    #[default]
    Mps1Hz = 0x03,
    Mps0_5Hz = 0x04,     // one conversion every 2 s
    Mps0_25Hz = 0x05,    // every 4 s
    Mps0_125Hz = 0x06,   // every 8 s
    Mps0_0625Hz = 0x07,  // every 16 s
}

impl From<u8> for SampleRate {
    fn from(v: u8) -> Self {
        match v & 0x07 {
            0x00 => Self::Mps8Hz,
            0x01 => Self::Mps4Hz,
            0x02 => Self::Mps2Hz,
            0x03 => Self::Mps1Hz,
            0x04 => Self::Mps0_5Hz,
            0x05 => Self::Mps0_25Hz,
            0x06 => Self::Mps0_125Hz,
            _ => Self::Mps0_0625Hz,
        }
    }
}


/// Alert output behaviour, Alert_Mode bit 6
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum AlertMode {
    /// alarm above TH, cleared below TL
    #[default]
    HighAlarmLowClear = 0x00,
    /// alarm outside TL..TH
    HighAlarmLowAlarm = 0x01,
}

/// Which level of Alert_Mode bit 7 means "alert enabled".
///
/// Device revisions disagree on this bit, so it is part of the session setup
/// rather than hard coded. Check the datasheet of the targeted revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlertEnablePolarity {
    /// bit 7 = 1 enables the alert output
    #[default]
    SetEnables,
    /// bit 7 = 0 enables the alert output
    ClearEnables,
}


/// EEPROM operations, written to E2PROM_Cmd
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EepromCommand {
    CopyPage,
    RecallPage,
    RecallAll,
    WritePageRaw,
    SoftReset,
}


bitfield! {
    /// MTS4x STATUS bits, read fresh on every query
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct Status(u8);
    impl Debug;

    pub bool, alert_high, _: 7;
    pub bool, alert_low, _: 6;
    pub bool, busy, _: 5;                  // conversion in progress
    pub bool, eeprom_busy, _: 4;
    pub bool, heater_on, _: 3;
    pub bool, limits_misconfigured, _: 2;  // TL >= TH
    // bits 1,0 not used
}

bitfield! {
    /// Temp_Cmd register
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct TempCmd(u8);
    impl Debug;

    pub u8, mode_bits, set_mode_bits: 7, 6;
    pub u8, heater_bits, set_heater_bits: 3, 0;
    // bits 5,4 reserved, preserved on read-modify-write
}

bitfield! {
    /// Temp_Cfg register
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct TempCfg(u8);
    impl Debug;

    pub u8, rate_bits, set_rate_bits: 7, 5;
    pub u8, avg_bits, set_avg_bits: 4, 3;
    pub bool, sleep_enable, set_sleep_enable: 0;
}

bitfield! {
    /// Alert_Mode register, bit 7 meaning depends on AlertEnablePolarity
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct AlertReg(u8);
    impl Debug;

    pub bool, enable_bit, set_enable_bit: 7;
    pub bool, alarm_mode_bit, set_alarm_mode_bit: 6;
}


/// MTS4x configuration: measurement rate, averaging and sleep enable, written as one Temp_Cfg value
#[derive(ConstBuilder, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorConfig {
    #[builder(default = SampleRate::Mps1Hz)]
    pub sample_rate: SampleRate,
    #[builder(default = Averaging::Avg8)]
    pub averaging: Averaging,
    #[builder(default = true)]
    pub sleep_enable: bool,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            sample_rate: SampleRate::Mps1Hz,
            averaging: Averaging::Avg8,
            sleep_enable: true,
        }
    }
}


/// alert enable state and mode as read from the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertConfig {
    pub enabled: bool,
    pub mode: AlertMode,
}


/// A temperature result from the sensor.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct TemperatureReading {
    /// raw signed register value, 1/256 °C per LSB, offset +25 °C
    pub raw: i16,
    /// `None` when the checksum was not requested
    pub crc_ok: Option<bool>,
}

impl TemperatureReading {
    /// temperature degrees C
    pub fn celsius(&self) -> f32 {
        raw_to_celsius(self.raw)
    }
}


/// Scratch block read in one transfer, with the result of its checksum check.
/// The data is returned unmodified even when `crc_ok` is false.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Scratch<const N: usize> {
    pub data: [u8; N],
    pub crc_ok: bool,
}
