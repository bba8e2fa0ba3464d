// Raspberry Pi / linux i2c-dev example
//
// cargo run --example linux

#[cfg(target_os = "linux")]
fn main() -> anyhow::Result<()> {
    use std::io::Write;
    use std::thread;
    use std::time::Duration;

    use env_logger::Builder;
    use linux_embedded_hal::{Delay, I2cdev};
    use log::{error, info, LevelFilter};

    use mts4x_ya::constants::MTS4X_EEPROM_TIMEOUT_MS;
    use mts4x_ya::data::{AlertMode, Averaging, MeasurementMode, SampleRate, SensorConfig};
    use mts4x_ya::{DeviceAddress, MTS4x};

    let mut builder = Builder::from_default_env();
    builder
        .format(|buf, record| writeln!(buf, "{} - {}", record.level(), record.args()))
        .filter(None, LevelFilter::Info)
        .init();

    info!("Hello, linux Rust and mts4x-ya world!");

    let dev_i2c = I2cdev::new("/dev/i2c-1")?;
    let mut sensor = MTS4x::new_i2c(dev_i2c, DeviceAddress::Default.into(), Delay {});
    info!("created MTS4x device, device id {:#06x}", sensor.read_device_id()?);

    let config = const {
        SensorConfig::builder()
            .sample_rate(SampleRate::Mps1Hz)
            .averaging(Averaging::Avg16)
            .sleep_enable(true)
            .build()
    };
    sensor.set_config(config)?;
    sensor.set_mode(MeasurementMode::Stop, false)?;
    info!("config read back = {:?}", sensor.read_config()?);

    sensor.set_high_limit(30.0)?;
    sensor.set_low_limit(18.0)?;
    sensor.set_alert_mode(true, AlertMode::HighAlarmLowClear)?;

    // keep a boot counter in user register 0
    let boots = sensor.read_user_register(0)?.wrapping_add(1);
    sensor.write_user_register(0, boots)?;
    sensor.eeprom_copy_page(true, MTS4X_EEPROM_TIMEOUT_MS)?;
    info!("boot count {}", boots);

    loop {
        match sensor.single_shot() {
            Ok(celsius) => {
                let status = sensor.read_status()?;
                info!(" temperature = {:.3} °C, status {:?}", celsius, status);
            }
            Err(e) => error!(" single shot failed: {}", e),
        }
        thread::sleep(Duration::from_secs(1));
    }
}

#[cfg(not(target_os = "linux"))]
fn main() {}
