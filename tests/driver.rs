use embedded_hal::delay::DelayNs;
use mts4x_ya::codec::crc8;
use mts4x_ya::constants::{
    MTS4X_REG_ALERT_MODE, MTS4X_REG_CRC_SCRATCH, MTS4X_REG_CRC_SCRATCH_EXT, MTS4X_REG_CRC_TEMP, MTS4X_REG_STATUS,
    MTS4X_REG_TEMP_CMD, MTS4X_REG_TEMP_LSB, MTS4X_REG_TEMP_MSB, MTS4X_REG_USER_DEFINE_0, STATUS_BUSY, STATUS_EE_BUSY,
};
use mts4x_ya::data::{AlertConfig, AlertEnablePolarity, AlertMode, Averaging, MeasurementMode, SampleRate};
use mts4x_ya::error::{Error, ErrorKind};
use mts4x_ya::transport::RegisterBus;
use mts4x_ya::MTS4x;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BusFault;

/// register file standing in for the sensor
struct FakeSensor {
    regs: [u8; 0x64],
    writes: Vec<(u8, Vec<u8>)>,
    reads: usize,
    fail_writes: bool,
    /// reads with index >= this fail
    fail_reads_from: Option<usize>,
    /// bytes withheld from every read
    short_by: usize,
    clock_hz: Option<u32>,
}

impl FakeSensor {
    fn new() -> Self {
        Self {
            regs: [0; 0x64],
            writes: Vec::new(),
            reads: 0,
            fail_writes: false,
            fail_reads_from: None,
            short_by: 0,
            clock_hz: None,
        }
    }

    fn with_temperature(mut self, lsb: u8, msb: u8) -> Self {
        self.regs[MTS4X_REG_TEMP_LSB as usize] = lsb;
        self.regs[MTS4X_REG_TEMP_MSB as usize] = msb;
        self.regs[MTS4X_REG_CRC_TEMP as usize] = crc8(&[lsb, msb]);
        self
    }
}

impl RegisterBus for FakeSensor {
    type Error = BusFault;

    fn write_registers(&mut self, register: u8, data: &[u8]) -> Result<(), BusFault> {
        if self.fail_writes {
            return Err(BusFault);
        }
        self.writes.push((register, data.to_vec()));
        for (i, byte) in data.iter().enumerate() {
            self.regs[register as usize + i] = *byte;
        }
        Ok(())
    }

    fn read_registers(&mut self, register: u8, buffer: &mut [u8]) -> Result<usize, BusFault> {
        let index = self.reads;
        self.reads += 1;
        if matches!(self.fail_reads_from, Some(from) if index >= from) {
            return Err(BusFault);
        }
        let delivered = buffer.len().saturating_sub(self.short_by);
        let start = register as usize;
        buffer[..delivered].copy_from_slice(&self.regs[start..start + delivered]);
        Ok(delivered)
    }

    fn set_clock_speed(&mut self, hz: u32) -> Result<(), BusFault> {
        self.clock_hz = Some(hz);
        Ok(())
    }
}

#[derive(Default)]
struct CountingDelay {
    total_ns: u64,
}

impl CountingDelay {
    fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for CountingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
    }
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}


#[test]
fn configure_then_single_shot() {
    init_logger();
    let mut fake = FakeSensor::new().with_temperature(0x00, 0x1e);
    let mut delay = CountingDelay::default();
    {
        let mut sensor = MTS4x::new(&mut fake, &mut delay);
        sensor.configure(SampleRate::Mps1Hz, Averaging::Avg8, true).unwrap();
        sensor.trigger_single_measurement().unwrap();
        let (celsius, crc_ok) = sensor.read_temperature(true, true).unwrap();
        assert_eq!(celsius, 55.0);
        assert_eq!(crc_ok, Some(true));
        assert_eq!(sensor.last_error(), None);
    }
    assert_eq!(fake.writes, vec![(0x05, vec![0b0110_1001]), (0x04, vec![0b1100_0000])]);
    // AVG_8 guard delay
    assert_eq!(delay.total_ms(), 7);
}

#[test]
fn guard_delay_follows_configured_averaging() {
    let mut fake = FakeSensor::new().with_temperature(0x00, 0x00);
    let mut delay = CountingDelay::default();
    {
        let mut sensor = MTS4x::new(&mut fake, &mut delay);
        sensor.configure(SampleRate::Mps8Hz, Averaging::Avg32, false).unwrap();
        assert_eq!(sensor.single_shot().unwrap(), 25.0);
        sensor.read_temperature(false, false).unwrap();
    }
    assert_eq!(delay.total_ms(), 18);
}

#[test]
fn failed_writes_leave_mirrors_alone() {
    let mut fake = FakeSensor::new();
    fake.fail_writes = true;
    let mut sensor = MTS4x::new(&mut fake, CountingDelay::default());
    assert_eq!(sensor.configure(SampleRate::Mps8Hz, Averaging::Avg1, false), Err(Error::Transport(BusFault)));
    assert_eq!(sensor.set_mode(MeasurementMode::Continuous, false), Err(Error::Transport(BusFault)));
    assert_eq!(sensor.config().averaging, Averaging::Avg8);
    assert_eq!(sensor.config().sample_rate, SampleRate::Mps1Hz);
    assert_eq!(sensor.last_mode(), MeasurementMode::Stop);
    assert_eq!(sensor.last_error(), Some(ErrorKind::Transport));
}

#[test]
fn temperature_crc_mismatch_is_a_flag() {
    let mut fake = FakeSensor::new().with_temperature(0x00, 0x1e);
    fake.regs[MTS4X_REG_CRC_TEMP as usize] ^= 0xff;
    let mut sensor = MTS4x::new(&mut fake, CountingDelay::default());
    let reading = sensor.read_raw_temperature(false, true).unwrap();
    assert_eq!(reading.raw, 0x1e00);
    assert_eq!(reading.crc_ok, Some(false));
    assert_eq!(sensor.last_error(), Some(ErrorKind::Integrity));
}

#[test]
fn single_shot_rejects_crc_mismatch() {
    let mut fake = FakeSensor::new().with_temperature(0x00, 0x1e);
    fake.regs[MTS4X_REG_CRC_TEMP as usize] ^= 0x01;
    let mut sensor = MTS4x::new(&mut fake, CountingDelay::default());
    assert_eq!(sensor.single_shot(), Err(Error::Integrity));
    assert_eq!(sensor.last_error(), Some(ErrorKind::Integrity));
}

#[test]
fn short_read_is_incomplete() {
    let mut fake = FakeSensor::new().with_temperature(0x00, 0x1e);
    fake.short_by = 1;
    let mut sensor = MTS4x::new(&mut fake, CountingDelay::default());
    assert_eq!(
        sensor.read_temperature(false, true),
        Err(Error::IncompleteRead { expected: 3, received: 2 })
    );
    assert_eq!(sensor.last_error(), Some(ErrorKind::IncompleteRead));
}

#[test]
fn scratch_mismatch_returns_data_unmodified() {
    let mut fake = FakeSensor::new();
    let block = [0x08, 0xc0, 0x69, 0x80, 0x00, 0x1e, 0x00, 0xf6];
    fake.regs[MTS4X_REG_STATUS as usize..MTS4X_REG_STATUS as usize + 8].copy_from_slice(&block);
    fake.regs[MTS4X_REG_CRC_SCRATCH as usize] = crc8(&block) ^ 0x5a;
    let mut sensor = MTS4x::new(&mut fake, CountingDelay::default());
    let scratch = sensor.read_scratch().unwrap();
    assert!(!scratch.crc_ok);
    assert_eq!(scratch.data, block);
    assert_eq!(sensor.last_error(), Some(ErrorKind::Integrity));
    drop(sensor);
    // one transfer of 8 data bytes + crc
    assert_eq!(fake.reads, 1);
}

#[test]
fn extended_scratch_with_good_crc() {
    let mut fake = FakeSensor::new();
    let user = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9];
    let start = MTS4X_REG_USER_DEFINE_0 as usize;
    fake.regs[start..start + 10].copy_from_slice(&user);
    fake.regs[MTS4X_REG_CRC_SCRATCH_EXT as usize] = crc8(&user);
    let mut sensor = MTS4x::new(&mut fake, CountingDelay::default());
    let scratch = sensor.read_scratch_ext().unwrap();
    assert!(scratch.crc_ok);
    assert_eq!(scratch.data, user);
    assert_eq!(sensor.last_error(), None);
}

#[test]
fn eeprom_copy_times_out_when_busy_never_clears() {
    init_logger();
    let mut fake = FakeSensor::new();
    fake.regs[MTS4X_REG_STATUS as usize] = STATUS_EE_BUSY;
    let mut delay = CountingDelay::default();
    {
        let mut sensor = MTS4x::new(&mut fake, &mut delay);
        assert_eq!(sensor.eeprom_copy_page(true, 50), Err(Error::Timeout));
        assert_eq!(sensor.last_error(), Some(ErrorKind::Timeout));
    }
    assert_eq!(delay.total_ms(), 50);
    assert_eq!(fake.writes, vec![(0x17, vec![0x08])]);
}

#[test]
fn eeprom_recall_waits_until_ready() {
    let mut fake = FakeSensor::new();
    let mut sensor = MTS4x::new(&mut fake, CountingDelay::default());
    sensor.eeprom_recall_page(true, 50).unwrap();
    sensor.eeprom_write_page_raw(false, 50).unwrap();
    drop(sensor);
    assert_eq!(fake.writes, vec![(0x17, vec![0xb8]), (0x17, vec![0x48])]);
    assert_eq!(fake.reads, 1);
}

#[test]
fn bus_failure_while_polling_is_not_a_timeout() {
    let mut fake = FakeSensor::new();
    fake.regs[MTS4X_REG_STATUS as usize] = STATUS_EE_BUSY;
    fake.fail_reads_from = Some(3);
    let mut delay = CountingDelay::default();
    {
        let mut sensor = MTS4x::new(&mut fake, &mut delay);
        assert_eq!(sensor.soft_reset(true, 50), Err(Error::Transport(BusFault)));
        assert_eq!(sensor.last_error(), Some(ErrorKind::Transport));
    }
    assert_eq!(fake.reads, 4);
    assert_eq!(delay.total_ms(), 3);
}

#[test]
fn conversion_wait_uses_busy_bit() {
    let mut fake = FakeSensor::new();
    fake.regs[MTS4X_REG_STATUS as usize] = STATUS_BUSY;
    let mut delay = CountingDelay::default();
    {
        let mut sensor = MTS4x::new(&mut fake, &mut delay);
        assert!(sensor.is_busy());
        assert_eq!(sensor.wait_conversion_done(5), Err(Error::Timeout));
    }
    assert_eq!(delay.total_ms(), 5);
}

#[test]
fn is_busy_assumes_busy_on_failure() {
    let mut fake = FakeSensor::new();
    fake.fail_reads_from = Some(0);
    let mut sensor = MTS4x::new(&mut fake, CountingDelay::default());
    assert!(sensor.is_busy());
    assert_eq!(sensor.read_busy(), Err(Error::Transport(BusFault)));
}

#[test]
fn heater_round_trip_through_command_register() {
    let mut fake = FakeSensor::new();
    fake.regs[MTS4X_REG_TEMP_CMD as usize] = 0b1111_0000;
    let mut sensor = MTS4x::new(&mut fake, CountingDelay::default());
    sensor.heater_on().unwrap();
    assert_eq!(sensor.read_mode().unwrap(), (MeasurementMode::SingleShot, true));
    sensor.heater_off().unwrap();
    drop(sensor);
    assert_eq!(fake.regs[MTS4X_REG_TEMP_CMD as usize], 0b1111_0000);
}

#[test]
fn alert_mode_with_set_enables() {
    let mut fake = FakeSensor::new();
    fake.regs[MTS4X_REG_ALERT_MODE as usize] = 0x01;
    let mut sensor = MTS4x::new(&mut fake, CountingDelay::default());
    sensor.set_alert_mode(true, AlertMode::HighAlarmLowAlarm).unwrap();
    assert_eq!(sensor.read_alert_register().unwrap(), 0b1100_0001);
    assert_eq!(
        sensor.get_alert_mode().unwrap(),
        AlertConfig { enabled: true, mode: AlertMode::HighAlarmLowAlarm }
    );
    sensor.set_alert_mode(false, AlertMode::HighAlarmLowAlarm).unwrap();
    assert_eq!(sensor.read_alert_register().unwrap(), 0x01);
}

#[test]
fn alert_mode_with_clear_enables() {
    let mut fake = FakeSensor::new();
    let mut sensor = MTS4x::new(&mut fake, CountingDelay::default())
        .with_alert_polarity(AlertEnablePolarity::ClearEnables);
    sensor.set_alert_mode(true, AlertMode::HighAlarmLowClear).unwrap();
    assert_eq!(sensor.read_alert_register().unwrap(), 0x00);
    assert!(sensor.get_alert_mode().unwrap().enabled);
    sensor.set_alert_mode(false, AlertMode::HighAlarmLowClear).unwrap();
    assert_eq!(sensor.read_alert_register().unwrap(), 0x80);
    assert!(!sensor.get_alert_mode().unwrap().enabled);
}

#[test]
fn limits_saturate_and_read_back() {
    let mut fake = FakeSensor::new();
    let mut sensor = MTS4x::new(&mut fake, CountingDelay::default());
    sensor.set_high_limit(500.0).unwrap();
    sensor.set_low_limit(-40.0).unwrap();
    assert_eq!(sensor.get_high_limit().unwrap(), 32767.0 / 256.0 + 25.0);
    assert_eq!(sensor.get_low_limit().unwrap(), -40.0);
}

#[test]
fn init_device_writes_config_then_mode() {
    let mut fake = FakeSensor::new();
    let mut sensor = MTS4x::new(&mut fake, CountingDelay::default());
    sensor.init_device(MeasurementMode::Continuous).unwrap();
    assert_eq!(sensor.read_config().unwrap(), sensor.config());
    sensor.set_clock_speed(100_000).unwrap();
    drop(sensor);
    assert_eq!(fake.writes, vec![(0x05, vec![0b0110_1001]), (0x04, vec![0x00])]);
    assert_eq!(fake.clock_hz, Some(100_000));
}
