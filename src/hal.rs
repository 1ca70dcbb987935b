//! Hardware abstraction traits.
//!
//! Everything above this layer is hardware-independent: the board logic talks
//! to pins and peripherals exclusively through these traits, so the whole
//! command surface can run on the host against `crate::mock`.

use defmt::Format;

use crate::gpio::Pin;

/// Register-level GPIO access.
///
/// `read_output` must return the *driven* level of an output pin (read back
/// from the data register, not from a shadow copy), so that a write which
/// silently failed to take effect is observable.
pub trait GpioBackend {
    /// Enables the pin's port clock and applies direction, drive strength and
    /// electrical type. Idempotent.
    fn configure(&mut self, pin: &Pin);
    /// Drives the output level of `pin`.
    fn write(&mut self, pin: &Pin, high: bool);
    /// Reads the sensed level of an input pin.
    fn read_input(&self, pin: &Pin) -> bool;
    /// Reads back the driven level of an output pin.
    fn read_output(&self, pin: &Pin) -> bool;
}

/// Errors on an I2C master transaction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Format)]
pub enum I2cError {
    /// The bus did not go idle within the polling budget.
    Timeout,
    /// The addressed device did not acknowledge.
    Nack,
}

/// A blocking I2C master. Transactions either complete or fail within a
/// bounded polling budget; nothing is retried here.
pub trait I2cMaster {
    fn write(&mut self, addr: u8, data: &[u8]) -> Result<(), I2cError>;
    fn read(&mut self, addr: u8, buf: &mut [u8]) -> Result<(), I2cError>;
}

/// Errors on a test UART transaction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Format)]
pub enum UartError {
    /// No data arrived within the polling budget.
    Timeout,
}

/// A blocking UART used by the `uart` console command. The firmware
/// initializes these ports with loopback enabled for testing.
pub trait UartPort {
    fn write_bytes(&mut self, data: &[u8]);
    fn read_byte(&mut self) -> Result<u8, UartError>;
}

/// Errors on an ADC conversion.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Format)]
pub enum AdcError {
    /// The conversion did not complete within the polling budget.
    Timeout,
}

/// A single analog input channel, read as a raw 12-bit value.
pub trait AdcChannel {
    fn read_raw(&mut self) -> Result<u16, AdcError>;
}
