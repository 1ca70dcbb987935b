//! In-memory peripheral backends for host-side tests.
//!
//! `MockGpio` models the data registers of all ports as plain bit arrays and
//! keeps an ordered log of every write, so tests can assert both final state
//! and write ordering. Output bits can be declared stuck low to exercise the
//! readback verification paths.

use embedded_hal::blocking::delay::DelayUs;
use heapless::{Deque, Vec};

use crate::gpio::{Direction, Pin, Port, NUM_PORTS};
use crate::hal::{AdcChannel, AdcError, GpioBackend, I2cError, I2cMaster, UartError, UartPort};

/// One logged pin write.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WriteRecord {
    pub port: Port,
    pub mask: u8,
    pub high: bool,
}

pub struct MockGpio {
    configured: [u8; NUM_PORTS],
    dir_out: [u8; NUM_PORTS],
    out: [u8; NUM_PORTS],
    input: [u8; NUM_PORTS],
    stuck_low: [u8; NUM_PORTS],
    /// Every `write` in call order.
    pub writes: Vec<WriteRecord, 256>,
}

impl MockGpio {
    pub fn new() -> Self {
        Self {
            configured: [0; NUM_PORTS],
            dir_out: [0; NUM_PORTS],
            out: [0; NUM_PORTS],
            input: [0; NUM_PORTS],
            stuck_low: [0; NUM_PORTS],
            writes: Vec::new(),
        }
    }

    /// Sets the sensed level of input pins.
    pub fn set_input(&mut self, port: Port, mask: u8, high: bool) {
        if high {
            self.input[port.index()] |= mask;
        } else {
            self.input[port.index()] &= !mask;
        }
    }

    /// Declares output pins stuck at low: writes are accepted and logged but
    /// the pins always read back 0.
    pub fn stick_low(&mut self, port: Port, mask: u8) {
        self.stuck_low[port.index()] |= mask;
    }

    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }
}

impl Default for MockGpio {
    fn default() -> Self {
        Self::new()
    }
}

impl GpioBackend for MockGpio {
    fn configure(&mut self, pin: &Pin) {
        self.configured[pin.port.index()] |= pin.mask;
        match pin.direction {
            Direction::Output => self.dir_out[pin.port.index()] |= pin.mask,
            Direction::Input => self.dir_out[pin.port.index()] &= !pin.mask,
        }
    }

    fn write(&mut self, pin: &Pin, high: bool) {
        debug_assert!(self.configured[pin.port.index()] & pin.mask != 0);
        let _ = self.writes.push(WriteRecord {
            port: pin.port,
            mask: pin.mask,
            high,
        });
        if high {
            self.out[pin.port.index()] |= pin.mask;
        } else {
            self.out[pin.port.index()] &= !pin.mask;
        }
    }

    fn read_input(&self, pin: &Pin) -> bool {
        self.input[pin.port.index()] & pin.mask != 0
    }

    fn read_output(&self, pin: &Pin) -> bool {
        (self.out[pin.port.index()] & !self.stuck_low[pin.port.index()]) & pin.mask != 0
    }
}

/// I2C bus with a fixed set of responding device addresses. Reads return the
/// canned `read_data` bytes, writes are captured for inspection.
pub struct MockI2c {
    pub devices: Vec<u8, 16>,
    pub read_data: Vec<u8, 32>,
    pub last_write: Vec<u8, 32>,
    pub last_addr: Option<u8>,
}

impl MockI2c {
    pub fn new(devices: &[u8]) -> Self {
        let mut mock = Self {
            devices: Vec::new(),
            read_data: Vec::new(),
            last_write: Vec::new(),
            last_addr: None,
        };
        let _ = mock.devices.extend_from_slice(devices);
        mock
    }
}

impl I2cMaster for MockI2c {
    fn write(&mut self, addr: u8, data: &[u8]) -> Result<(), I2cError> {
        if !self.devices.contains(&addr) {
            return Err(I2cError::Nack);
        }
        self.last_addr = Some(addr);
        self.last_write.clear();
        let _ = self.last_write.extend_from_slice(data);
        Ok(())
    }

    fn read(&mut self, addr: u8, buf: &mut [u8]) -> Result<(), I2cError> {
        if !self.devices.contains(&addr) {
            return Err(I2cError::Nack);
        }
        self.last_addr = Some(addr);
        for (i, b) in buf.iter_mut().enumerate() {
            *b = self.read_data.get(i).copied().unwrap_or(0);
        }
        Ok(())
    }
}

/// UART in loopback: written bytes come back on the read side, like the test
/// UARTs on the board.
pub struct MockUart {
    fifo: Deque<u8, 64>,
}

impl MockUart {
    pub fn new() -> Self {
        Self { fifo: Deque::new() }
    }
}

impl Default for MockUart {
    fn default() -> Self {
        Self::new()
    }
}

impl UartPort for MockUart {
    fn write_bytes(&mut self, data: &[u8]) {
        for &b in data {
            let _ = self.fifo.push_back(b);
        }
    }

    fn read_byte(&mut self) -> Result<u8, UartError> {
        self.fifo.pop_front().ok_or(UartError::Timeout)
    }
}

/// ADC channel returning a fixed raw value.
pub struct MockAdc {
    pub value: u16,
}

impl MockAdc {
    pub fn new(value: u16) -> Self {
        Self { value }
    }
}

impl AdcChannel for MockAdc {
    fn read_raw(&mut self) -> Result<u16, AdcError> {
        Ok(self.value)
    }
}

/// Delay provider that only accounts the requested time.
pub struct MockDelay {
    pub total_us: u64,
}

impl MockDelay {
    pub fn new() -> Self {
        Self { total_us: 0 }
    }
}

impl Default for MockDelay {
    fn default() -> Self {
        Self::new()
    }
}

impl DelayUs<u32> for MockDelay {
    fn delay_us(&mut self, us: u32) {
        self.total_us += us as u64;
    }
}
