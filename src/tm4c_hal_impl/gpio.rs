//! GPIO backend on the TM4C1290 AHB GPIO blocks.
//!
//! All GPIO ports of the chip share one register block layout, so the
//! backend addresses them through raw block pointers obtained from the PAC
//! singletons. Ownership of the blocks is claimed once via
//! [`Tm4cGpio::new`] taking the PAC peripherals by value.

use tm4c129x::gpio_porta_ahb::RegisterBlock;

use crate::gpio::{Direction, DriveStrength, IntTrigger, Pin, PinType, Port};
use crate::hal::GpioBackend;

/// Key for the GPIO commit register, needed to unlock the NMI-capable pins
/// (PD7 and PF0 are both used as power enables on this board).
const GPIO_LOCK_KEY: u32 = 0x4c4f_434b;

pub struct Tm4cGpio {
    sysctl: tm4c129x::SYSCTL,
}

impl Tm4cGpio {
    /// Claims the system control block. The GPIO blocks themselves are
    /// reached through their fixed addresses; taking the PAC `Peripherals`
    /// apart further buys nothing here since every port carries pins of
    /// several logical groups.
    pub fn new(sysctl: tm4c129x::SYSCTL) -> Self {
        Self { sysctl }
    }

    fn block(port: Port) -> &'static RegisterBlock {
        let ptr = match port {
            Port::A => tm4c129x::GPIO_PORTA_AHB::ptr(),
            Port::B => tm4c129x::GPIO_PORTB_AHB::ptr(),
            Port::C => tm4c129x::GPIO_PORTC_AHB::ptr(),
            Port::D => tm4c129x::GPIO_PORTD_AHB::ptr(),
            Port::E => tm4c129x::GPIO_PORTE_AHB::ptr(),
            Port::F => tm4c129x::GPIO_PORTF_AHB::ptr(),
            Port::G => tm4c129x::GPIO_PORTG_AHB::ptr(),
            Port::H => tm4c129x::GPIO_PORTH_AHB::ptr(),
            Port::J => tm4c129x::GPIO_PORTJ_AHB::ptr(),
            Port::K => tm4c129x::GPIO_PORTK::ptr(),
            Port::L => tm4c129x::GPIO_PORTL::ptr(),
            Port::M => tm4c129x::GPIO_PORTM::ptr(),
            Port::N => tm4c129x::GPIO_PORTN::ptr(),
            Port::P => tm4c129x::GPIO_PORTP::ptr(),
            Port::Q => tm4c129x::GPIO_PORTQ::ptr(),
        };
        unsafe { &*ptr }
    }

    fn enable_port_clock(&mut self, port: Port) {
        let bit = 1 << port.index();
        self.sysctl
            .rcgcgpio
            .modify(|r, w| unsafe { w.bits(r.bits() | bit) });
        // Wait for the peripheral to come out of reset.
        while self.sysctl.prgpio.read().bits() & bit == 0 {}
    }
}

impl GpioBackend for Tm4cGpio {
    fn configure(&mut self, pin: &Pin) {
        self.enable_port_clock(pin.port);
        let gpio = Self::block(pin.port);
        let mask = pin.mask as u32;

        // Unlock the commit register for NMI-capable pins, then allow all
        // further configuration of this pin.
        gpio.lock.write(|w| unsafe { w.bits(GPIO_LOCK_KEY) });
        gpio.cr.modify(|r, w| unsafe { w.bits(r.bits() | mask) });
        gpio.lock.write(|w| unsafe { w.bits(0) });

        // Plain digital function, no alternate mapping.
        gpio.afsel.modify(|r, w| unsafe { w.bits(r.bits() & !mask) });
        gpio.amsel.modify(|r, w| unsafe { w.bits(r.bits() & !mask) });

        match pin.direction {
            Direction::Output => gpio.dir.modify(|r, w| unsafe { w.bits(r.bits() | mask) }),
            Direction::Input => gpio.dir.modify(|r, w| unsafe { w.bits(r.bits() & !mask) }),
        }

        let (dr2, dr4, dr8) = match pin.strength {
            DriveStrength::Ma2 => (mask, 0, 0),
            DriveStrength::Ma4 => (0, mask, 0),
            DriveStrength::Ma8 => (0, 0, mask),
        };
        gpio.dr2r
            .modify(|r, w| unsafe { w.bits((r.bits() & !mask) | dr2) });
        gpio.dr4r
            .modify(|r, w| unsafe { w.bits((r.bits() & !mask) | dr4) });
        gpio.dr8r
            .modify(|r, w| unsafe { w.bits((r.bits() & !mask) | dr8) });

        let (odr, pur, pdr) = match pin.pin_type {
            PinType::Std => (0, 0, 0),
            PinType::OpenDrain => (mask, 0, 0),
            PinType::PullUp => (0, mask, 0),
            PinType::PullDown => (0, 0, mask),
        };
        gpio.odr
            .modify(|r, w| unsafe { w.bits((r.bits() & !mask) | odr) });
        gpio.pur
            .modify(|r, w| unsafe { w.bits((r.bits() & !mask) | pur) });
        gpio.pdr
            .modify(|r, w| unsafe { w.bits((r.bits() & !mask) | pdr) });

        // Edge trigger programming. The interrupt mask stays clear; no ISRs
        // are installed, the trigger only arms the raw status bit.
        let (sense_level, both, event_high) = match pin.int_trigger {
            IntTrigger::None | IntTrigger::RisingEdge => (0, 0, mask),
            IntTrigger::FallingEdge => (0, 0, 0),
            IntTrigger::BothEdges => (0, mask, 0),
        };
        gpio.im.modify(|r, w| unsafe { w.bits(r.bits() & !mask) });
        gpio.is
            .modify(|r, w| unsafe { w.bits((r.bits() & !mask) | sense_level) });
        gpio.ibe
            .modify(|r, w| unsafe { w.bits((r.bits() & !mask) | both) });
        gpio.iev
            .modify(|r, w| unsafe { w.bits((r.bits() & !mask) | event_high) });

        gpio.den.modify(|r, w| unsafe { w.bits(r.bits() | mask) });
    }

    fn write(&mut self, pin: &Pin, high: bool) {
        let gpio = Self::block(pin.port);
        let mask = pin.mask as u32;
        let set = if high { mask } else { 0 };
        gpio.data
            .modify(|r, w| unsafe { w.bits((r.bits() & !mask) | set) });
    }

    fn read_input(&self, pin: &Pin) -> bool {
        Self::block(pin.port).data.read().bits() & pin.mask as u32 != 0
    }

    fn read_output(&self, pin: &Pin) -> bool {
        // The data register reads back the level on the pad, so a stuck
        // driver is observable here.
        Self::block(pin.port).data.read().bits() & pin.mask as u32 != 0
    }
}
