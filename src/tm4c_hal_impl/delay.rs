//! Busy-wait delay counted in core clock cycles.

use embedded_hal::blocking::delay::DelayUs;

pub struct CycleDelay {
    cycles_per_us: u32,
}

impl CycleDelay {
    pub fn new(sysclk_hz: u32) -> Self {
        Self {
            cycles_per_us: sysclk_hz / 1_000_000,
        }
    }
}

impl DelayUs<u32> for CycleDelay {
    fn delay_us(&mut self, us: u32) {
        // Callers cap the delay at 10 s, which fits u32 cycle counts up to
        // a 400 MHz core clock.
        cortex_m::asm::delay(us.saturating_mul(self.cycles_per_us));
    }
}
