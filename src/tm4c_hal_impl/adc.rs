//! Analog temperature inputs on ADC0.
//!
//! Every channel object owns one analog input and converts it on demand
//! through sample sequencer 3 (single sample, processor triggered). The
//! console command loop is the only caller, so sharing the sequencer between
//! channel objects is safe.

use tm4c129x::adc0::RegisterBlock;

use crate::hal::{AdcChannel, AdcError};

const SS3: u32 = 1 << 3;
/// Interrupt enable and end-of-sequence on the single sample.
const SSCTL3_IE0_END0: u32 = 0x6;

const CONVERT_POLL_BUDGET: u32 = 100_000;

pub struct Tm4cAdcChannel {
    adc: &'static RegisterBlock,
    channel: u32,
}

impl Tm4cAdcChannel {
    /// Claims analog input `channel` of ADC0 and routes its pad to analog
    /// mode. The channels used for the board temperatures are on ports B
    /// and E.
    pub fn new(channel: u32, sysctl: &tm4c129x::SYSCTL) -> Self {
        sysctl
            .rcgcadc
            .modify(|r, w| unsafe { w.bits(r.bits() | 1) });
        while sysctl.pradc.read().bits() & 1 == 0 {}

        let (port_bit, gpio, mask): (u32, &tm4c129x::gpio_porta_ahb::RegisterBlock, u32) =
            match channel {
                0 => (1 << 4, unsafe { &*tm4c129x::GPIO_PORTE_AHB::ptr() }, 0x08),
                8 => (1 << 4, unsafe { &*tm4c129x::GPIO_PORTE_AHB::ptr() }, 0x20),
                9 => (1 << 4, unsafe { &*tm4c129x::GPIO_PORTE_AHB::ptr() }, 0x10),
                10 => (1 << 1, unsafe { &*tm4c129x::GPIO_PORTB_AHB::ptr() }, 0x10),
                _ => (1 << 1, unsafe { &*tm4c129x::GPIO_PORTB_AHB::ptr() }, 0x20),
            };
        sysctl
            .rcgcgpio
            .modify(|r, w| unsafe { w.bits(r.bits() | port_bit) });
        while sysctl.prgpio.read().bits() & port_bit == 0 {}
        gpio.afsel.modify(|r, w| unsafe { w.bits(r.bits() | mask) });
        gpio.den.modify(|r, w| unsafe { w.bits(r.bits() & !mask) });
        gpio.amsel.modify(|r, w| unsafe { w.bits(r.bits() | mask) });

        let adc = unsafe { &*tm4c129x::ADC0::ptr() };
        // Sequencer 3: processor trigger, one sample, interrupt flag at end.
        adc.actss.modify(|r, w| unsafe { w.bits(r.bits() & !SS3) });
        adc.emux
            .modify(|r, w| unsafe { w.bits(r.bits() & !0xf000) });
        adc.ssctl3.write(|w| unsafe { w.bits(SSCTL3_IE0_END0) });
        adc.actss.modify(|r, w| unsafe { w.bits(r.bits() | SS3) });
        Self { adc, channel }
    }
}

impl AdcChannel for Tm4cAdcChannel {
    fn read_raw(&mut self) -> Result<u16, AdcError> {
        self.adc.ssmux3.write(|w| unsafe { w.bits(self.channel) });
        self.adc.isc.write(|w| unsafe { w.bits(SS3) });
        self.adc.pssi.write(|w| unsafe { w.bits(SS3) });
        for _ in 0..CONVERT_POLL_BUDGET {
            if self.adc.ris.read().bits() & SS3 != 0 {
                let raw = (self.adc.ssfifo3.read().bits() & 0xfff) as u16;
                self.adc.isc.write(|w| unsafe { w.bits(SS3) });
                return Ok(raw);
            }
        }
        Err(AdcError::Timeout)
    }
}
