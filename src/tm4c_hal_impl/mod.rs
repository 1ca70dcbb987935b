//! TM4C1290 implementations of the HAL traits in `crate::hal`.
//!
//! Only built with the `board` feature. Each sub-module wraps one peripheral
//! class of the `tm4c129x` PAC behind the corresponding trait.

pub mod adc;
pub mod delay;
pub mod gpio;
pub mod i2c;
pub mod uart;

pub use adc::Tm4cAdcChannel;
pub use delay::CycleDelay;
pub use gpio::Tm4cGpio;
pub use i2c::Tm4cI2c;
pub use uart::{ConsoleUart, Tm4cUart};

/// System clock frequency in Hz. The command module has no external crystal,
/// so the firmware runs directly off the 16 MHz precision internal
/// oscillator.
pub const SYSTEM_CLOCK_FREQ: u32 = 16_000_000;
