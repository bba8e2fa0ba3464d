//! no_std driver for the MTS4x / MTS4P+T4 digital temperature sensor.
//!
//! The sensor is reached through a [`RegisterBus`](transport::RegisterBus),
//! normally an [`I2cBus`](transport::I2cBus) over any embedded-hal 1.0 I²C
//! master, and waits through an embedded-hal `DelayNs`.
//!
//! ```ignore
//! let mut sensor = MTS4x::new_i2c(i2c, DeviceAddress::Default.into(), delay);
//! sensor.configure(SampleRate::Mps1Hz, Averaging::Avg8, true)?;
//! let celsius = sensor.single_shot()?;
//! ```
//!
//! One driver owns the bus for the duration of every call. Share a bus between
//! drivers only behind your own lock.

#![no_std]

#[cfg(test)]
extern crate std;

pub mod codec;
pub mod constants;
pub mod data;
pub mod error;
pub mod transport;
pub mod wait;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{I2c, SevenBitAddress};
use log::{debug, warn};

use crate::codec::{
    celsius_to_raw, crc_matches, decode_command, decode_config, decode_raw_temperature, encode_command,
    encode_config, encode_raw_temperature, raw_to_celsius, with_heater,
};
use crate::constants::{
    MTS4X_EECMD_COPY_PAGE, MTS4X_EECMD_RECALL_EE, MTS4X_EECMD_RECALL_PAGE, MTS4X_EECMD_SOFT_RESET,
    MTS4X_EECMD_WRITE_PAGE, MTS4X_REG_ALERT_MODE, MTS4X_REG_DEVICE_ID_LSB, MTS4X_REG_E2PROM_CMD, MTS4X_REG_PPM_CFG,
    MTS4X_REG_ROMCODE, MTS4X_REG_STATUS, MTS4X_REG_TEMP_CFG, MTS4X_REG_TEMP_CMD, MTS4X_REG_TEMP_LSB, MTS4X_REG_TH_LSB,
    MTS4X_REG_TL_LSB, MTS4X_REG_USER_DEFINE_0, MTS4X_ROMCODE_LEN, MTS4X_USER_REGISTER_COUNT, PPM_CFG_ENABLE,
    PPM_CFG_MASK, STATUS_BUSY, STATUS_EE_BUSY,
};
use crate::data::{
    AlertConfig, AlertEnablePolarity, AlertMode, AlertReg, Averaging, EepromCommand, MeasurementMode, SampleRate,
    Scratch, SensorConfig, Status, TemperatureReading,
};
use crate::error::{Error, ErrorKind};
use crate::transport::{read_exact, I2cBus, RegisterBus};
use crate::wait::BusyWait;

pub use crate::constants::DeviceAddress;


/// the MTS4x device session
pub struct MTS4x<B, D> {
    bus: B,
    delayer: D,
    /// configuration last written successfully
    config: SensorConfig,
    /// mode last written successfully
    last_mode: MeasurementMode,
    alert_polarity: AlertEnablePolarity,
    last_error: Option<ErrorKind>,
}

impl<I2C, D> MTS4x<I2cBus<I2C>, D>
where
    I2C: I2c<SevenBitAddress>,
    D: DelayNs,
{
    /// create new MTS4x driver on an embedded-hal I²C bus
    pub fn new_i2c(i2c: I2C, address: u8, delayer: D) -> Self {
        Self::new(I2cBus::new(i2c, address), delayer)
    }
}

impl<B, D> MTS4x<B, D>
where
    B: RegisterBus,
    D: DelayNs,
{
    /// create new MTS4x driver over any register bus
    pub fn new(bus: B, delayer: D) -> Self {
        debug!("new called");
        Self {
            bus,
            delayer,
            config: SensorConfig::default(),
            last_mode: MeasurementMode::Stop,
            alert_polarity: AlertEnablePolarity::default(),
            last_error: None,
        }
    }

    /// select which level of the alert enable bit means enabled for the targeted device revision
    pub fn with_alert_polarity(mut self, polarity: AlertEnablePolarity) -> Self {
        self.alert_polarity = polarity;
        self
    }

    /// give back the bus
    pub fn release(self) -> B {
        self.bus
    }

    /// classification of the most recent failure, `None` after a clean operation
    pub fn last_error(&self) -> Option<ErrorKind> {
        self.last_error
    }

    /// configuration last written to the device
    pub fn config(&self) -> SensorConfig {
        self.config
    }

    /// measurement mode last written to the device
    pub fn last_mode(&self) -> MeasurementMode {
        self.last_mode
    }

    pub fn alert_polarity(&self) -> AlertEnablePolarity {
        self.alert_polarity
    }

    fn record<T>(&mut self, result: Result<T, Error<B::Error>>) -> Result<T, Error<B::Error>> {
        self.last_error = result.as_ref().err().map(Error::kind);
        result
    }

    fn write_register(&mut self, register: u8, data: &[u8]) -> Result<(), Error<B::Error>> {
        let result = self.bus.write_registers(register, data).map_err(Error::Transport);
        self.record(result)
    }

    fn read_register(&mut self, register: u8, buffer: &mut [u8]) -> Result<(), Error<B::Error>> {
        let result = read_exact(&mut self.bus, register, buffer);
        self.record(result)
    }

    fn read_byte(&mut self, register: u8) -> Result<u8, Error<B::Error>> {
        let mut result_buf: [u8; 1] = [0; 1];
        self.read_register(register, &mut result_buf)?;
        Ok(result_buf[0])
    }

    /// flag a checksum mismatch on a read that still succeeds
    fn note_crc(&mut self, crc_ok: bool) {
        if !crc_ok {
            warn!("checksum mismatch");
            self.last_error = Some(ErrorKind::Integrity);
        }
    }


    /// pass a bus clock request through to the transport
    pub fn set_clock_speed(&mut self, hz: u32) -> Result<(), Error<B::Error>> {
        debug!("in set_clock_speed({})", hz);
        let result = self.bus.set_clock_speed(hz).map_err(Error::Transport);
        self.record(result)
    }

    /// write the mirrored configuration, then the measurement mode
    pub fn init_device(&mut self, mode: MeasurementMode) -> Result<(), Error<B::Error>> {
        debug!("in init_device({:?})", mode);
        let config = self.config;
        self.configure(config.sample_rate, config.averaging, config.sleep_enable)?;
        self.set_mode(mode, false)
    }

    /// write Temp_Cfg, the configuration mirror only changes once the write went through
    pub fn configure(&mut self, rate: SampleRate, averaging: Averaging, sleep_enable: bool) -> Result<(), Error<B::Error>> {
        debug!("in configure({:?}, {:?}, sleep {})", rate, averaging, sleep_enable);
        let cfg = encode_config(rate, averaging, sleep_enable);
        debug!("  writing TEMP_CFG {:#010b}", cfg);
        self.write_register(MTS4X_REG_TEMP_CFG, &[cfg])?;
        self.config = SensorConfig {
            sample_rate: rate,
            averaging,
            sleep_enable,
        };
        Ok(())
    }

    /// same as `configure` with a prepared `SensorConfig`
    pub fn set_config(&mut self, config: SensorConfig) -> Result<(), Error<B::Error>> {
        self.configure(config.sample_rate, config.averaging, config.sleep_enable)
    }

    /// read back and decode Temp_Cfg
    pub fn read_config(&mut self) -> Result<SensorConfig, Error<B::Error>> {
        debug!("in read_config");
        let cfg = self.read_byte(MTS4X_REG_TEMP_CFG)?;
        Ok(decode_config(cfg))
    }

    /// write Temp_Cmd
    pub fn set_mode(&mut self, mode: MeasurementMode, heater: bool) -> Result<(), Error<B::Error>> {
        debug!("in set_mode({:?}, heater {})", mode, heater);
        let cmd = encode_command(mode, heater);
        self.write_register(MTS4X_REG_TEMP_CMD, &[cmd])?;
        self.last_mode = mode;
        Ok(())
    }

    /// read back Temp_Cmd, `ContinuousReadback` reads as `Continuous`
    pub fn read_mode(&mut self) -> Result<(MeasurementMode, bool), Error<B::Error>> {
        debug!("in read_mode");
        let cmd = self.read_byte(MTS4X_REG_TEMP_CMD)?;
        Ok(decode_command(cmd))
    }

    /// start one conversion, heater off
    pub fn trigger_single_measurement(&mut self) -> Result<(), Error<B::Error>> {
        self.set_mode(MeasurementMode::SingleShot, false)
    }

    /// Read the temperature registers.
    ///
    /// With `wait_for_fresh` the driver first sleeps for the worst case
    /// conversion time of the configured averaging; without it the value may
    /// belong to a conversion still in flight. With `verify_crc` the trailing
    /// checksum is read in the same transfer and checked; a mismatch still
    /// returns the reading, with `crc_ok == Some(false)`.
    pub fn read_raw_temperature(&mut self, wait_for_fresh: bool, verify_crc: bool) -> Result<TemperatureReading, Error<B::Error>> {
        debug!("in read_raw_temperature(wait {}, crc {})", wait_for_fresh, verify_crc);
        if wait_for_fresh {
            self.delayer.delay_ms(self.config.averaging.conversion_time_ms());
        }
        let mut result_buf: [u8; 3] = [0; 3];
        let len = if verify_crc { 3 } else { 2 };
        self.read_register(MTS4X_REG_TEMP_LSB, &mut result_buf[..len])?;
        let raw = decode_raw_temperature(result_buf[0], result_buf[1]);
        debug!("  raw temperature = {:#06x}", raw);
        let crc_ok = if verify_crc {
            let ok = crc_matches(&result_buf[..2], result_buf[2]);
            self.note_crc(ok);
            Some(ok)
        } else {
            None
        };
        Ok(TemperatureReading { raw, crc_ok })
    }

    /// read temperature in degrees C, see `read_raw_temperature`
    pub fn read_temperature(&mut self, wait_for_fresh: bool, verify_crc: bool) -> Result<(f32, Option<bool>), Error<B::Error>> {
        let reading = self.read_raw_temperature(wait_for_fresh, verify_crc)?;
        Ok((reading.celsius(), reading.crc_ok))
    }

    /// trigger one conversion and read it back; a checksum mismatch is an error here
    pub fn single_shot(&mut self) -> Result<f32, Error<B::Error>> {
        debug!("in single_shot()");
        self.trigger_single_measurement()?;
        let reading = self.read_raw_temperature(true, true)?;
        if reading.crc_ok != Some(true) {
            return self.record(Err(Error::Integrity));
        }
        Ok(reading.celsius())
    }

    /// read the status register
    pub fn read_status(&mut self) -> Result<Status, Error<B::Error>> {
        debug!("in read_status()");
        let status = Status(self.read_byte(MTS4X_REG_STATUS)?);
        debug!("  status = {:?}", status);
        Ok(status)
    }

    /// conversion busy bit
    pub fn read_busy(&mut self) -> Result<bool, Error<B::Error>> {
        Ok(self.read_status()?.busy())
    }

    /// conversion busy bit; a failed status read counts as busy
    pub fn is_busy(&mut self) -> bool {
        match self.read_busy() {
            Ok(busy) => busy,
            Err(e) => {
                warn!("status read failed ({:?}), assuming busy", e.kind());
                true
            }
        }
    }

    pub fn is_heater_on(&mut self) -> Result<bool, Error<B::Error>> {
        Ok(self.read_status()?.heater_on())
    }

    /// poll the conversion busy bit until it clears
    pub fn wait_conversion_done(&mut self, timeout_ms: u32) -> Result<(), Error<B::Error>> {
        debug!("in wait_conversion_done({})", timeout_ms);
        self.wait_status_clear(STATUS_BUSY, timeout_ms)
    }

    /// poll the EEPROM busy bit until it clears
    pub fn wait_eeprom_ready(&mut self, timeout_ms: u32) -> Result<(), Error<B::Error>> {
        debug!("in wait_eeprom_ready({})", timeout_ms);
        self.wait_status_clear(STATUS_EE_BUSY, timeout_ms)
    }

    fn wait_status_clear(&mut self, mask: u8, timeout_ms: u32) -> Result<(), Error<B::Error>> {
        let bus = &mut self.bus;
        let result = BusyWait::new(mask, timeout_ms).run(&mut self.delayer, || {
            let mut result_buf: [u8; 1] = [0; 1];
            read_exact(&mut *bus, MTS4X_REG_STATUS, &mut result_buf)?;
            Ok(Status(result_buf[0]))
        });
        self.record(result)
    }

    pub fn heater_on(&mut self) -> Result<(), Error<B::Error>> {
        debug!("in heater_on()");
        self.set_heater(true)
    }

    pub fn heater_off(&mut self) -> Result<(), Error<B::Error>> {
        debug!("in heater_off()");
        self.set_heater(false)
    }

    // read-modify-write, only the low nibble changes
    fn set_heater(&mut self, on: bool) -> Result<(), Error<B::Error>> {
        let cmd = self.read_byte(MTS4X_REG_TEMP_CMD)?;
        let new_cmd = with_heater(cmd, on);
        debug!("  TEMP_CMD {:#010b} -> {:#010b}", cmd, new_cmd);
        self.write_register(MTS4X_REG_TEMP_CMD, &[new_cmd])
    }

    /// raw Alert_Mode register
    pub fn read_alert_register(&mut self) -> Result<u8, Error<B::Error>> {
        self.read_byte(MTS4X_REG_ALERT_MODE)
    }

    /// Set alert enable and mode, other Alert_Mode bits are kept.
    /// The mode bit is only set while the alert is enabled.
    pub fn set_alert_mode(&mut self, enabled: bool, mode: AlertMode) -> Result<(), Error<B::Error>> {
        debug!("in set_alert_mode({}, {:?})", enabled, mode);
        let mut alert = AlertReg(self.read_alert_register()?);
        let enable_level = match self.alert_polarity {
            AlertEnablePolarity::SetEnables => enabled,
            AlertEnablePolarity::ClearEnables => !enabled,
        };
        alert.set_enable_bit(enable_level);
        alert.set_alarm_mode_bit(enabled && mode == AlertMode::HighAlarmLowAlarm);
        debug!("  writing ALERT_MODE {:#010b}", alert.0);
        self.write_register(MTS4X_REG_ALERT_MODE, &[alert.0])
    }

    pub fn get_alert_mode(&mut self) -> Result<AlertConfig, Error<B::Error>> {
        debug!("in get_alert_mode");
        let alert = AlertReg(self.read_alert_register()?);
        let enabled = match self.alert_polarity {
            AlertEnablePolarity::SetEnables => alert.enable_bit(),
            AlertEnablePolarity::ClearEnables => !alert.enable_bit(),
        };
        let mode = if alert.alarm_mode_bit() {
            AlertMode::HighAlarmLowAlarm
        } else {
            AlertMode::HighAlarmLowClear
        };
        Ok(AlertConfig { enabled, mode })
    }

    /// high alert limit (TH) in degrees C
    pub fn set_high_limit(&mut self, celsius: f32) -> Result<(), Error<B::Error>> {
        debug!("in set_high_limit({})", celsius);
        self.write_limit(MTS4X_REG_TH_LSB, celsius)
    }

    /// low alert limit (TL) in degrees C
    pub fn set_low_limit(&mut self, celsius: f32) -> Result<(), Error<B::Error>> {
        debug!("in set_low_limit({})", celsius);
        self.write_limit(MTS4X_REG_TL_LSB, celsius)
    }

    pub fn get_high_limit(&mut self) -> Result<f32, Error<B::Error>> {
        self.read_limit(MTS4X_REG_TH_LSB)
    }

    pub fn get_low_limit(&mut self) -> Result<f32, Error<B::Error>> {
        self.read_limit(MTS4X_REG_TL_LSB)
    }

    fn write_limit(&mut self, register: u8, celsius: f32) -> Result<(), Error<B::Error>> {
        if celsius.is_nan() {
            return self.record(Err(Error::InvalidParameter));
        }
        let raw = celsius_to_raw(celsius);
        self.write_register(register, &encode_raw_temperature(raw))
    }

    fn read_limit(&mut self, register: u8) -> Result<f32, Error<B::Error>> {
        let mut result_buf: [u8; 2] = [0; 2];
        self.read_register(register, &mut result_buf)?;
        Ok(raw_to_celsius(decode_raw_temperature(result_buf[0], result_buf[1])))
    }

    /// 16 bit device id
    pub fn read_device_id(&mut self) -> Result<u16, Error<B::Error>> {
        debug!("in read_device_id");
        let mut result_buf: [u8; 2] = [0; 2];
        self.read_register(MTS4X_REG_DEVICE_ID_LSB, &mut result_buf)?;
        Ok(u16::from_le_bytes(result_buf))
    }

    /// the five ROM code bytes at 0x1a - 0x1e
    pub fn read_rom_code(&mut self) -> Result<[u8; MTS4X_ROMCODE_LEN], Error<B::Error>> {
        debug!("in read_rom_code");
        let mut result_buf = [0u8; MTS4X_ROMCODE_LEN];
        self.read_register(MTS4X_REG_ROMCODE, &mut result_buf)?;
        Ok(result_buf)
    }

    fn user_register(&mut self, index: u8) -> Result<u8, Error<B::Error>> {
        if index >= MTS4X_USER_REGISTER_COUNT {
            return self.record(Err(Error::InvalidParameter));
        }
        Ok(MTS4X_REG_USER_DEFINE_0 + index)
    }

    /// user register 0..=9
    pub fn read_user_register(&mut self, index: u8) -> Result<u8, Error<B::Error>> {
        debug!("in read_user_register({})", index);
        let register = self.user_register(index)?;
        self.read_byte(register)
    }

    /// user register 0..=9, persisted by `eeprom_copy_page`
    pub fn write_user_register(&mut self, index: u8, value: u8) -> Result<(), Error<B::Error>> {
        debug!("in write_user_register({}, {:#04x})", index, value);
        let register = self.user_register(index)?;
        self.write_register(register, &[value])
    }

    /// status .. TL (0x03 - 0x0a) and its checksum, in one transfer
    pub fn read_scratch(&mut self) -> Result<Scratch<8>, Error<B::Error>> {
        debug!("in read_scratch");
        self.read_checked_block(MTS4X_REG_STATUS)
    }

    /// user registers (0x0c - 0x15) and their checksum, in one transfer
    pub fn read_scratch_ext(&mut self) -> Result<Scratch<10>, Error<B::Error>> {
        debug!("in read_scratch_ext");
        self.read_checked_block(MTS4X_REG_USER_DEFINE_0)
    }

    fn read_checked_block<const N: usize>(&mut self, register: u8) -> Result<Scratch<N>, Error<B::Error>> {
        // largest block is 10 data bytes + crc
        let mut result_buf = [0u8; 11];
        self.read_register(register, &mut result_buf[..=N])?;
        let mut data = [0u8; N];
        data.copy_from_slice(&result_buf[..N]);
        let crc_ok = crc_matches(&data, result_buf[N]);
        self.note_crc(crc_ok);
        Ok(Scratch { data, crc_ok })
    }

    /// Issue an EEPROM command. With `wait_ready` the EEPROM busy bit is polled
    /// until it clears or `timeout_ms` passes; without it the call returns once
    /// the command is written and completion is left to the caller.
    pub fn eeprom_command(&mut self, command: EepromCommand, wait_ready: bool, timeout_ms: u32) -> Result<(), Error<B::Error>> {
        debug!("in eeprom_command({:?}, wait {}, timeout {} ms)", command, wait_ready, timeout_ms);
        let code = match command {
            EepromCommand::CopyPage => MTS4X_EECMD_COPY_PAGE,
            EepromCommand::RecallPage => MTS4X_EECMD_RECALL_PAGE,
            EepromCommand::RecallAll => MTS4X_EECMD_RECALL_EE,
            EepromCommand::WritePageRaw => MTS4X_EECMD_WRITE_PAGE,
            EepromCommand::SoftReset => MTS4X_EECMD_SOFT_RESET,
        };
        self.write_register(MTS4X_REG_E2PROM_CMD, &[code])?;
        if !wait_ready {
            return Ok(());
        }
        self.wait_eeprom_ready(timeout_ms)
    }

    /// scratch -> EEPROM
    pub fn eeprom_copy_page(&mut self, wait_ready: bool, timeout_ms: u32) -> Result<(), Error<B::Error>> {
        self.eeprom_command(EepromCommand::CopyPage, wait_ready, timeout_ms)
    }

    /// EEPROM page -> scratch
    pub fn eeprom_recall_page(&mut self, wait_ready: bool, timeout_ms: u32) -> Result<(), Error<B::Error>> {
        self.eeprom_command(EepromCommand::RecallPage, wait_ready, timeout_ms)
    }

    /// all of EEPROM -> scratch
    pub fn eeprom_recall_all(&mut self, wait_ready: bool, timeout_ms: u32) -> Result<(), Error<B::Error>> {
        self.eeprom_command(EepromCommand::RecallAll, wait_ready, timeout_ms)
    }

    pub fn eeprom_write_page_raw(&mut self, wait_ready: bool, timeout_ms: u32) -> Result<(), Error<B::Error>> {
        self.eeprom_command(EepromCommand::WritePageRaw, wait_ready, timeout_ms)
    }

    /// soft reset and reload from EEPROM
    pub fn soft_reset(&mut self, wait_ready: bool, timeout_ms: u32) -> Result<(), Error<B::Error>> {
        self.eeprom_command(EepromCommand::SoftReset, wait_ready, timeout_ms)
    }

    /// parasitic power pattern in PPM_Cfg, upper nibble kept
    pub fn set_parasitic_power(&mut self, enable: bool) -> Result<(), Error<B::Error>> {
        debug!("in set_parasitic_power({})", enable);
        let ppm = self.read_byte(MTS4X_REG_PPM_CFG)?;
        let new_ppm = (ppm & !PPM_CFG_MASK) | if enable { PPM_CFG_ENABLE } else { 0 };
        self.write_register(MTS4X_REG_PPM_CFG, &[new_ppm])
    }
}
