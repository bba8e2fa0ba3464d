//! Register level bus access used by the driver.
//!
//! The driver never talks to a bus directly; it goes through [`RegisterBus`].
//! [`I2cBus`] implements it for any embedded-hal 1.0 I²C master, other
//! transports (bit-banged, bridged, simulated) can implement it themselves.

use embedded_hal::i2c::{I2c, SevenBitAddress};
use log::debug;

use crate::constants::{DeviceAddress, MTS4X_DEFAULT_BUS_CLOCK};
use crate::error::Error;

/// Register addressed transfers. The register pointer auto-increments on the
/// device, so multi-byte transfers cover consecutive registers.
pub trait RegisterBus {
    type Error;

    /// write `data` starting at `register`
    fn write_registers(&mut self, register: u8, data: &[u8]) -> Result<(), Self::Error>;

    /// read into `buffer` starting at `register`, returns the number of bytes delivered
    fn read_registers(&mut self, register: u8, buffer: &mut [u8]) -> Result<usize, Self::Error>;

    /// bus clock request, the protocol itself does not depend on it
    fn set_clock_speed(&mut self, hz: u32) -> Result<(), Self::Error>;
}

impl<T: RegisterBus + ?Sized> RegisterBus for &mut T {
    type Error = T::Error;

    fn write_registers(&mut self, register: u8, data: &[u8]) -> Result<(), Self::Error> {
        T::write_registers(self, register, data)
    }

    fn read_registers(&mut self, register: u8, buffer: &mut [u8]) -> Result<usize, Self::Error> {
        T::read_registers(self, register, buffer)
    }

    fn set_clock_speed(&mut self, hz: u32) -> Result<(), Self::Error> {
        T::set_clock_speed(self, hz)
    }
}

/// read exactly `buffer.len()` bytes, a short read is an error
pub(crate) fn read_exact<B: RegisterBus>(bus: &mut B, register: u8, buffer: &mut [u8]) -> Result<(), Error<B::Error>> {
    let received = bus.read_registers(register, buffer).map_err(Error::Transport)?;
    if received != buffer.len() {
        return Err(Error::IncompleteRead { expected: buffer.len(), received });
    }
    Ok(())
}


// register byte + largest contiguous block (user registers)
const MAX_FRAME: usize = 11;

/// MTS4x on an embedded-hal I²C bus
pub struct I2cBus<I2C> {
    /// I²C interface
    i2c: I2C,
    /// I²C device address
    address: u8,
    clock_hz: u32,
}

impl<I2C> I2cBus<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            clock_hz: MTS4X_DEFAULT_BUS_CLOCK,
        }
    }

    /// bus at the fixed default address 0x41
    pub fn new_default(i2c: I2C) -> Self {
        Self::new(i2c, DeviceAddress::Default.into())
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// last requested bus clock in Hz
    pub fn bus_clock(&self) -> u32 {
        self.clock_hz
    }

    /// give back the I2C interface
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c<SevenBitAddress>> RegisterBus for I2cBus<I2C> {
    type Error = I2C::Error;

    // frame is [register, data..]; longer blocks go out as several frames
    fn write_registers(&mut self, register: u8, data: &[u8]) -> Result<(), Self::Error> {
        let mut frame = [0u8; MAX_FRAME];
        let mut start = register;
        for chunk in data.chunks(MAX_FRAME - 1) {
            frame[0] = start;
            frame[1..=chunk.len()].copy_from_slice(chunk);
            self.i2c.write(self.address, &frame[..=chunk.len()])?;
            start = start.wrapping_add(chunk.len() as u8);
        }
        Ok(())
    }

    fn read_registers(&mut self, register: u8, buffer: &mut [u8]) -> Result<usize, Self::Error> {
        self.i2c.write_read(self.address, &[register], buffer)?;
        Ok(buffer.len())
    }

    // embedded-hal fixes the clock when the peripheral is built
    fn set_clock_speed(&mut self, hz: u32) -> Result<(), Self::Error> {
        debug!("bus clock request {} Hz", hz);
        self.clock_hz = hz;
        Ok(())
    }
}
