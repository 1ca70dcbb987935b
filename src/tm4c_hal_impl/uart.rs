//! UARTs of the TM4C1290: the console UART and the loopback test UARTs.
//!
//! All UART blocks share the `uart0` register layout. The console runs on
//! UART0 (PA0/PA1); the test ports are UART1 (PB0/PB1), UART3 (PJ0/PJ1) and
//! UART5 (PC6/PC7), initialized with loopback enabled so that `uart` console
//! commands can exercise them without external wiring.

use tm4c129x::uart0::RegisterBlock;

use crate::hal::{UartError, UartPort};

// Register bit masks, identical across all UART instances.
const FR_TXFF: u32 = 1 << 5;
const FR_RXFE: u32 = 1 << 4;
const LCRH_8N1_FIFO: u32 = 0x70;
const CTL_UARTEN: u32 = 1 << 0;
const CTL_LBE: u32 = 1 << 7;
const CTL_TXE: u32 = 1 << 8;
const CTL_RXE: u32 = 1 << 9;

/// Poll iterations before a read gives up.
const READ_POLL_BUDGET: u32 = 1_000_000;

fn configure(uart: &RegisterBlock, sysclk: u32, baud: u32, loopback: bool) {
    let divisor = 16 * baud;
    let ibrd = sysclk / divisor;
    let fbrd = ((sysclk % divisor) * 64 + divisor / 2) / divisor;

    uart.ctl.modify(|r, w| unsafe { w.bits(r.bits() & !CTL_UARTEN) });
    uart.ibrd.write(|w| unsafe { w.bits(ibrd) });
    uart.fbrd.write(|w| unsafe { w.bits(fbrd) });
    uart.lcrh.write(|w| unsafe { w.bits(LCRH_8N1_FIFO) });
    let lbe = if loopback { CTL_LBE } else { 0 };
    uart.ctl
        .write(|w| unsafe { w.bits(CTL_UARTEN | CTL_TXE | CTL_RXE | lbe) });
}

/// Routes two pins of one GPIO port to their UART alternate function.
fn mux_pins(sysctl: &tm4c129x::SYSCTL, port_index: usize, gpio: &tm4c129x::gpio_porta_ahb::RegisterBlock, mask: u32, pctl: u32) {
    let bit = 1 << port_index;
    sysctl
        .rcgcgpio
        .modify(|r, w| unsafe { w.bits(r.bits() | bit) });
    while sysctl.prgpio.read().bits() & bit == 0 {}
    gpio.afsel.modify(|r, w| unsafe { w.bits(r.bits() | mask) });
    gpio.pctl.modify(|r, w| unsafe { w.bits(pctl) });
    gpio.den.modify(|r, w| unsafe { w.bits(r.bits() | mask) });
}

fn enable_uart_clock(sysctl: &tm4c129x::SYSCTL, index: usize) {
    let bit = 1 << index;
    sysctl
        .rcgcuart
        .modify(|r, w| unsafe { w.bits(r.bits() | bit) });
    while sysctl.pruart.read().bits() & bit == 0 {}
}

/// The console UART on UART0, PA0/PA1, 115200 baud 8N1.
pub struct ConsoleUart {
    uart: &'static RegisterBlock,
}

impl ConsoleUart {
    pub fn new(_uart: tm4c129x::UART0, sysctl: &tm4c129x::SYSCTL, sysclk: u32) -> Self {
        enable_uart_clock(sysctl, 0);
        let porta = unsafe { &*tm4c129x::GPIO_PORTA_AHB::ptr() };
        mux_pins(sysctl, 0, porta, 0x03, (porta.pctl.read().bits() & !0xff) | 0x11);
        let uart = unsafe { &*tm4c129x::UART0::ptr() };
        configure(uart, sysclk, 115_200, false);
        Self { uart }
    }

    pub fn write_byte(&mut self, byte: u8) {
        while self.uart.fr.read().bits() & FR_TXFF != 0 {}
        self.uart.dr.write(|w| unsafe { w.bits(byte as u32) });
    }

    pub fn write_str(&mut self, s: &str) {
        for &b in s.as_bytes() {
            if b == b'\n' {
                self.write_byte(b'\r');
            }
            self.write_byte(b);
        }
    }

    /// Blocks for one received byte. The console has no timeout; the
    /// operator types at their own pace.
    pub fn read_byte_blocking(&mut self) -> u8 {
        while self.uart.fr.read().bits() & FR_RXFE != 0 {}
        (self.uart.dr.read().bits() & 0xff) as u8
    }

    /// Reads one line with echo and backspace editing, without the line
    /// terminator. Input beyond the buffer is dropped.
    pub fn read_line<'a>(&mut self, buf: &'a mut [u8]) -> &'a str {
        let mut len = 0;
        loop {
            let byte = self.read_byte_blocking();
            match byte {
                b'\r' | b'\n' => {
                    self.write_str("\n");
                    break;
                }
                0x08 | 0x7f => {
                    if len > 0 {
                        len -= 1;
                        self.write_str("\x08 \x08");
                    }
                }
                0x20..=0x7e => {
                    if len < buf.len() {
                        buf[len] = byte;
                        len += 1;
                        self.write_byte(byte);
                    }
                }
                _ => (),
            }
        }
        // Only ASCII was accepted above.
        core::str::from_utf8(&buf[..len]).unwrap_or("")
    }
}

/// One of the loopback test UARTs.
pub struct Tm4cUart {
    uart: &'static RegisterBlock,
}

impl Tm4cUart {
    pub fn uart1(_uart: tm4c129x::UART1, sysctl: &tm4c129x::SYSCTL, sysclk: u32) -> Self {
        enable_uart_clock(sysctl, 1);
        let portb = unsafe { &*tm4c129x::GPIO_PORTB_AHB::ptr() };
        mux_pins(sysctl, 1, portb, 0x03, (portb.pctl.read().bits() & !0xff) | 0x11);
        let uart = unsafe { &*tm4c129x::UART1::ptr() };
        configure(uart, sysclk, 115_200, true);
        Self { uart }
    }

    pub fn uart3(_uart: tm4c129x::UART3, sysctl: &tm4c129x::SYSCTL, sysclk: u32) -> Self {
        enable_uart_clock(sysctl, 3);
        let portj = unsafe { &*tm4c129x::GPIO_PORTJ_AHB::ptr() };
        mux_pins(sysctl, 8, portj, 0x03, (portj.pctl.read().bits() & !0xff) | 0x11);
        let uart = unsafe { &*tm4c129x::UART3::ptr() };
        configure(uart, sysclk, 115_200, true);
        Self { uart }
    }

    pub fn uart5(_uart: tm4c129x::UART5, sysctl: &tm4c129x::SYSCTL, sysclk: u32) -> Self {
        enable_uart_clock(sysctl, 5);
        let portc = unsafe { &*tm4c129x::GPIO_PORTC_AHB::ptr() };
        mux_pins(
            sysctl,
            2,
            portc,
            0xc0,
            (portc.pctl.read().bits() & !0xff00_0000) | 0x1100_0000,
        );
        let uart = unsafe { &*tm4c129x::UART5::ptr() };
        configure(uart, sysclk, 115_200, true);
        Self { uart }
    }
}

impl UartPort for Tm4cUart {
    fn write_bytes(&mut self, data: &[u8]) {
        for &b in data {
            while self.uart.fr.read().bits() & FR_TXFF != 0 {}
            self.uart.dr.write(|w| unsafe { w.bits(b as u32) });
        }
    }

    fn read_byte(&mut self) -> Result<u8, UartError> {
        for _ in 0..READ_POLL_BUDGET {
            if self.uart.fr.read().bits() & FR_RXFE == 0 {
                return Ok((self.uart.dr.read().bits() & 0xff) as u8);
            }
        }
        Err(UartError::Timeout)
    }
}
