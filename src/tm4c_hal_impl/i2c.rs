//! I2C master engines of the TM4C1290.
//!
//! The chip carries ten identical masters, all sharing the `i2c0` register
//! layout. Transactions are fully blocking with a bounded busy-poll; the
//! command module bus topology (port expanders, clock chips, FireFly
//! modules) sits behind these masters.

use tm4c129x::i2c0::RegisterBlock;

use crate::hal::{I2cError, I2cMaster};

// Master control/status bits.
const MCS_RUN: u32 = 1 << 0;
const MCS_START: u32 = 1 << 1;
const MCS_STOP: u32 = 1 << 2;
const MCS_ACK: u32 = 1 << 3;
const MCS_BUSY: u32 = 1 << 0;
const MCS_ERROR: u32 = 1 << 1;
const MCS_ADRACK: u32 = 1 << 2;
const MCS_DATACK: u32 = 1 << 3;

const MCR_MFE: u32 = 1 << 4;

/// Poll iterations before a transaction step is abandoned.
const BUSY_POLL_BUDGET: u32 = 100_000;

/// Standard mode, 100 kHz.
const SCL_FREQ: u32 = 100_000;

/// Routes the pads of bus 0: PB2 is SCL, PB3 is SDA (open drain).
// TODO: transcribe the pad routing of buses 1-9 from the command module
// schematic; until then those masters drive unrouted pads.
pub fn route_i2c0_pins(sysctl: &tm4c129x::SYSCTL) {
    let bit = 1 << 1;
    sysctl
        .rcgcgpio
        .modify(|r, w| unsafe { w.bits(r.bits() | bit) });
    while sysctl.prgpio.read().bits() & bit == 0 {}
    let portb = unsafe { &*tm4c129x::GPIO_PORTB_AHB::ptr() };
    portb.afsel.modify(|r, w| unsafe { w.bits(r.bits() | 0x0c) });
    portb
        .pctl
        .modify(|r, w| unsafe { w.bits((r.bits() & !0xff00) | 0x2200) });
    portb.odr.modify(|r, w| unsafe { w.bits(r.bits() | 0x08) });
    portb.den.modify(|r, w| unsafe { w.bits(r.bits() | 0x0c) });
}

pub struct Tm4cI2c {
    i2c: &'static RegisterBlock,
}

impl Tm4cI2c {
    /// Initializes master `index` (0..=9). Must be called at most once per
    /// index; pad routing of the bus pins is board wiring and happens
    /// separately.
    pub fn new(index: usize, sysctl: &tm4c129x::SYSCTL, sysclk: u32) -> Self {
        let ptr = [
            tm4c129x::I2C0::ptr(),
            tm4c129x::I2C1::ptr(),
            tm4c129x::I2C2::ptr(),
            tm4c129x::I2C3::ptr(),
            tm4c129x::I2C4::ptr(),
            tm4c129x::I2C5::ptr(),
            tm4c129x::I2C6::ptr(),
            tm4c129x::I2C7::ptr(),
            tm4c129x::I2C8::ptr(),
            tm4c129x::I2C9::ptr(),
        ][index];
        let bit = 1 << index;
        sysctl
            .rcgci2c
            .modify(|r, w| unsafe { w.bits(r.bits() | bit) });
        while sysctl.pri2c.read().bits() & bit == 0 {}

        let i2c = unsafe { &*ptr };
        i2c.mcr.write(|w| unsafe { w.bits(MCR_MFE) });
        // SCL period: 2 * (1 + TPR) * 10 clocks.
        let tpr = sysclk / (20 * SCL_FREQ) - 1;
        i2c.mtpr.write(|w| unsafe { w.bits(tpr) });
        Self { i2c }
    }

    fn wait_step(&self) -> Result<(), I2cError> {
        for _ in 0..BUSY_POLL_BUDGET {
            let mcs = self.i2c.mcs.read().bits();
            if mcs & MCS_BUSY == 0 {
                if mcs & MCS_ERROR != 0 {
                    if mcs & (MCS_ADRACK | MCS_DATACK) != 0 {
                        return Err(I2cError::Nack);
                    }
                    return Err(I2cError::Timeout);
                }
                return Ok(());
            }
        }
        Err(I2cError::Timeout)
    }

    fn control(&mut self, flags: u32) {
        self.i2c.mcs.write(|w| unsafe { w.bits(flags) });
    }
}

impl I2cMaster for Tm4cI2c {
    fn write(&mut self, addr: u8, data: &[u8]) -> Result<(), I2cError> {
        self.i2c
            .msa
            .write(|w| unsafe { w.bits((addr as u32) << 1) });
        if data.is_empty() {
            // Address probe: send the address and stop, used by the bus
            // scan.
            self.control(MCS_START | MCS_RUN | MCS_STOP);
            return self.wait_step();
        }
        let last = data.len() - 1;
        for (i, &byte) in data.iter().enumerate() {
            self.i2c.mdr.write(|w| unsafe { w.bits(byte as u32) });
            let mut flags = MCS_RUN;
            if i == 0 {
                flags |= MCS_START;
            }
            if i == last {
                flags |= MCS_STOP;
            }
            self.control(flags);
            if let Err(e) = self.wait_step() {
                if i != last {
                    // Release the bus after an aborted burst.
                    self.control(MCS_STOP);
                }
                return Err(e);
            }
        }
        Ok(())
    }

    fn read(&mut self, addr: u8, buf: &mut [u8]) -> Result<(), I2cError> {
        if buf.is_empty() {
            return Ok(());
        }
        self.i2c
            .msa
            .write(|w| unsafe { w.bits(((addr as u32) << 1) | 1) });
        let last = buf.len() - 1;
        for (i, byte) in buf.iter_mut().enumerate() {
            let mut flags = MCS_RUN;
            if i == 0 {
                flags |= MCS_START;
            }
            if i == last {
                flags |= MCS_STOP;
            } else {
                flags |= MCS_ACK;
            }
            self.control(flags);
            if let Err(e) = self.wait_step() {
                if i != last {
                    self.control(MCS_STOP);
                }
                return Err(e);
            }
            *byte = (self.i2c.mdr.read().bits() & 0xff) as u8;
        }
        Ok(())
    }
}
