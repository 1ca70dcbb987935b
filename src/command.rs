//! Serial console command surface.
//!
//! One synchronous dispatcher: a full input line goes in, a formatted
//! response comes out. Hardware access happens exclusively through the
//! [`crate::hal`] traits held by the [`Console`], so the entire surface runs
//! on the host in tests. The console never panics on bad input; every
//! malformed command produces an `ERROR:` response.

use core::fmt::Write as _;
use core::str::SplitAsciiWhitespace;

use defmt::Format;
use embedded_hal::blocking::delay::DelayUs;

use crate::board_pins::{Board, GpioGroup};
use crate::hal::{AdcChannel, GpioBackend, I2cError, I2cMaster, UartPort};
use crate::power_control::{self, PowerDomain, PowerError, PowerState};
use crate::status_led;

pub const FW_NAME: &str = "cm-mcu-hwtest";
pub const FW_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const FW_RELEASEDATE: &str = "26 Aug 2026";

pub const UI_COMMAND_PROMPT: &str = "> ";
pub const UI_STR_OK: &str = "OK";
pub const UI_STR_WARNING: &str = "WARNING";
pub const UI_STR_ERROR: &str = "ERROR";
pub const UI_STR_FATAL: &str = "FATAL";

/// Number of I2C masters on the board.
pub const I2C_PORT_NUM: usize = 10;
/// Console numbers of the test UARTs (loopback enabled at init).
pub const UART_PORTS: [u32; 3] = [1, 3, 5];
/// Labels of the analog temperature channels, in ADC channel order.
pub const TEMP_CHANNELS: [&str; 5] = [
    "KUP MGTAVCC/ADC/AUX",
    "KUP MGTAVTT",
    "KUP DDR4/IO/Exp. Con./Misc.",
    "ZUP MGTAVCC/MGTAVTT",
    "ZUP DDR4/IO/LDO/Misc.",
];

/// Response buffer of one command. Sized for the largest fixed output, the
/// GPIO type list prefixed by an error line; heapless writes fail atomically
/// on overflow, so an undersized buffer would drop whole responses.
pub type Response = heapless::String<2048>;

/// Upper bound on `temp-a` repetitions. One repetition is about 150 bytes;
/// the bound keeps the full output inside the response buffer instead of
/// truncating mid-line.
pub const TEMP_REPEAT_MAX: u32 = 10;

/// Severity of a completed command, mirrored in the response prefix.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Format)]
pub enum CmdStatus {
    Ok,
    Warning,
    Error,
}

/// All peripherals reachable from the console.
pub struct Console<B, D, I, U, A> {
    pub board: Board<B>,
    delay: D,
    i2c: [I; I2C_PORT_NUM],
    uarts: [U; 3],
    adcs: [A; 5],
}

impl<B, D, I, U, A> Console<B, D, I, U, A>
where
    B: GpioBackend,
    D: DelayUs<u32>,
    I: I2cMaster,
    U: UartPort,
    A: AdcChannel,
{
    pub fn new(board: Board<B>, delay: D, i2c: [I; I2C_PORT_NUM], uarts: [U; 3], adcs: [A; 5]) -> Self {
        Self {
            board,
            delay,
            i2c,
            uarts,
            adcs,
        }
    }

    /// Executes one input line and formats the response into `out`.
    ///
    /// An empty line is a no-op. After every `gpio` and `power` command,
    /// successful or not, the status LEDs are re-synchronized.
    pub fn dispatch(&mut self, line: &str, out: &mut Response) -> CmdStatus {
        let mut args = line.split_ascii_whitespace();
        let cmd = match args.next() {
            Some(cmd) => cmd,
            None => return CmdStatus::Ok,
        };
        let status = if cmd.eq_ignore_ascii_case("help") {
            help(out);
            CmdStatus::Ok
        } else if cmd.eq_ignore_ascii_case("info") {
            info(out);
            CmdStatus::Ok
        } else if cmd.eq_ignore_ascii_case("delay") {
            self.cmd_delay(cmd, &mut args, out)
        } else if cmd.eq_ignore_ascii_case("gpio") {
            self.cmd_gpio(cmd, &mut args, out)
        } else if cmd.eq_ignore_ascii_case("i2c") {
            self.cmd_i2c(cmd, &mut args, out)
        } else if cmd.eq_ignore_ascii_case("i2c-det") {
            self.cmd_i2c_detect(cmd, &mut args, out)
        } else if cmd.eq_ignore_ascii_case("temp-a") {
            self.cmd_temp_analog(&mut args, out)
        } else if cmd.eq_ignore_ascii_case("uart") {
            self.cmd_uart(cmd, &mut args, out)
        } else if cmd.eq_ignore_ascii_case("power") {
            self.cmd_power(cmd, &mut args, out)
        } else {
            let _ = write!(out, "{}: Unknown command `{}'.", UI_STR_ERROR, cmd);
            CmdStatus::Error
        };
        if cmd.eq_ignore_ascii_case("gpio") || cmd.eq_ignore_ascii_case("power") {
            status_led::update(&mut self.board);
        }
        status
    }

    fn cmd_delay(
        &mut self,
        cmd: &str,
        args: &mut SplitAsciiWhitespace,
        out: &mut Response,
    ) -> CmdStatus {
        let param = match args.next() {
            Some(p) => p,
            None => {
                let _ = write!(
                    out,
                    "{}: Parameter required after command `{}'.",
                    UI_STR_ERROR, cmd
                );
                return CmdStatus::Error;
            }
        };
        let mut us = match parse_int(param) {
            Some(us) => us,
            None => return invalid_number(param, out),
        };
        // Limit the delay to max. 10 seconds.
        us = us.min(10_000_000);
        // A delay of 0 cycles would hang the hardware delay loop.
        if us > 0 {
            self.delay.delay_us(us);
        }
        let _ = write!(out, "{}.", UI_STR_OK);
        CmdStatus::Ok
    }

    fn cmd_gpio(
        &mut self,
        cmd: &str,
        args: &mut SplitAsciiWhitespace,
        out: &mut Response,
    ) -> CmdStatus {
        let gpio_type = match args.next() {
            Some(t) => t,
            None => {
                let _ = write!(
                    out,
                    "{}: GPIO type required after command `{}'.\n",
                    UI_STR_ERROR, cmd
                );
                gpio_help(out);
                return CmdStatus::Error;
            }
        };
        if gpio_type.eq_ignore_ascii_case("help") {
            gpio_help(out);
            return CmdStatus::Ok;
        }
        let group = match GpioGroup::from_name(gpio_type) {
            Some(g) => g,
            None => {
                let _ = write!(
                    out,
                    "{}: Unknown GPIO type `{}'!\n",
                    UI_STR_ERROR, gpio_type
                );
                gpio_help(out);
                return CmdStatus::Error;
            }
        };
        // Read the current value if no parameter is given.
        let set_value = match args.next() {
            Some(p) => match parse_int(p) {
                Some(v) => Some(v),
                None => return invalid_number(p, out),
            },
            None => None,
        };
        match set_value {
            Some(value) => {
                if group.group().is_read_only() {
                    let _ = write!(
                        out,
                        "{}: GPIO {} is read-only!",
                        UI_STR_WARNING, gpio_type
                    );
                    return CmdStatus::Warning;
                }
                self.board.set(group, value);
                let readback = self.board.get(group);
                if readback == value {
                    let _ = write!(
                        out,
                        "{}: GPIO {} set to 0x{:02x}.",
                        UI_STR_OK, gpio_type, readback
                    );
                    CmdStatus::Ok
                } else {
                    let _ = write!(
                        out,
                        "{}: Setting GPIO {} to 0x{:02x} failed! It was set to 0x{:02x} instead.",
                        UI_STR_ERROR, gpio_type, value, readback
                    );
                    CmdStatus::Error
                }
            }
            None => {
                let _ = write!(
                    out,
                    "{}: Current GPIO {} value: 0x{:02x}",
                    UI_STR_OK,
                    gpio_type,
                    self.board.get(group)
                );
                CmdStatus::Ok
            }
        }
    }

    fn cmd_power(
        &mut self,
        cmd: &str,
        args: &mut SplitAsciiWhitespace,
        out: &mut Response,
    ) -> CmdStatus {
        let domain_name = match args.next() {
            Some(d) => d,
            None => {
                let _ = write!(
                    out,
                    "{}: Power domain required after command `{}'.\n",
                    UI_STR_ERROR, cmd
                );
                power_help(out);
                return CmdStatus::Error;
            }
        };
        if domain_name.eq_ignore_ascii_case("help") {
            power_help(out);
            return CmdStatus::Ok;
        }
        let domain = match PowerDomain::from_name(domain_name) {
            Some(d) => d,
            None => {
                let _ = write!(
                    out,
                    "{}: Unknown power domain `{}'!\n",
                    UI_STR_ERROR, domain_name
                );
                power_help(out);
                return CmdStatus::Error;
            }
        };
        // Read the current power status if no parameter is given.
        let value = match args.next() {
            Some(p) => match parse_int(p) {
                Some(v) => Some(v),
                None => return invalid_number(p, out),
            },
            None => None,
        };
        match value {
            None => power_status(&self.board, domain, out),
            Some(value) => match power_control::set(&mut self.board, domain, value) {
                Ok(()) => {
                    let _ = write!(out, "{}.", UI_STR_OK);
                    CmdStatus::Ok
                }
                Err(PowerError::ClockDependentsPowered) => {
                    let _ = write!(
                        out,
                        "{}: Cannot power off the clock domain while the KU15P or the ZU11EG \
                         are powered. Turn them off first.",
                        UI_STR_ERROR
                    );
                    CmdStatus::Error
                }
                Err(PowerError::Readback { step, power_up }) => {
                    let _ = write!(
                        out,
                        "{}: Could not power {} {}.",
                        UI_STR_ERROR,
                        if power_up { "up" } else { "down" },
                        step.describe()
                    );
                    CmdStatus::Error
                }
            },
        }
    }

    fn cmd_i2c(
        &mut self,
        cmd: &str,
        args: &mut SplitAsciiWhitespace,
        out: &mut Response,
    ) -> CmdStatus {
        let (port, addr, read) = match parse_i2c_header(cmd, args, out) {
            Ok(h) => h,
            Err(status) => return status,
        };
        if read {
            let num = match args.next() {
                Some(p) => match parse_int(p) {
                    Some(n) => (n as usize).clamp(1, 32),
                    None => return invalid_number(p, out),
                },
                None => 1,
            };
            let mut buf = [0u8; 32];
            match self.i2c[port].read(addr, &mut buf[..num]) {
                Ok(()) => {
                    let _ = write!(out, "{}: Data:", UI_STR_OK);
                    for b in &buf[..num] {
                        let _ = write!(out, " 0x{:02x}", b);
                    }
                    CmdStatus::Ok
                }
                Err(e) => i2c_error(port, addr, e, out),
            }
        } else {
            let mut data = heapless::Vec::<u8, 32>::new();
            for p in args {
                match parse_int(p) {
                    Some(v) => {
                        let _ = data.push(v as u8);
                    }
                    None => return invalid_number(p, out),
                }
            }
            match self.i2c[port].write(addr, &data) {
                Ok(()) => {
                    let _ = write!(out, "{}.", UI_STR_OK);
                    CmdStatus::Ok
                }
                Err(e) => i2c_error(port, addr, e, out),
            }
        }
    }

    /// Scans the standard 7-bit address range by probing each address with a
    /// zero-length write.
    fn cmd_i2c_detect(
        &mut self,
        cmd: &str,
        args: &mut SplitAsciiWhitespace,
        out: &mut Response,
    ) -> CmdStatus {
        let port = match args.next() {
            Some(p) => match parse_int(p) {
                Some(n) => n as usize,
                None => return invalid_number(p, out),
            },
            None => {
                let _ = write!(
                    out,
                    "{}: I2C port required after command `{}'.",
                    UI_STR_ERROR, cmd
                );
                return CmdStatus::Error;
            }
        };
        if port >= I2C_PORT_NUM {
            return invalid_i2c_port(port, out);
        }
        let mut found = heapless::Vec::<u8, 128>::new();
        for addr in 0x08..=0x77u8 {
            match self.i2c[port].write(addr, &[]) {
                Ok(()) => {
                    let _ = found.push(addr);
                }
                Err(I2cError::Nack) => (),
                Err(I2cError::Timeout) => {
                    let _ = write!(out, "{}: Timeout on I2C port {}!", UI_STR_ERROR, port);
                    return CmdStatus::Error;
                }
            }
        }
        if found.is_empty() {
            let _ = write!(out, "{}: No devices found.", UI_STR_OK);
        } else {
            let _ = write!(out, "{}: Device(s) found at slave address(es):", UI_STR_OK);
            for addr in &found {
                let _ = write!(out, " 0x{:02x}", addr);
            }
        }
        CmdStatus::Ok
    }

    fn cmd_temp_analog(&mut self, args: &mut SplitAsciiWhitespace, out: &mut Response) -> CmdStatus {
        let count = match args.next() {
            Some(p) => match parse_int(p) {
                Some(n) => (n & 0xffffff).clamp(1, TEMP_REPEAT_MAX),
                None => return invalid_number(p, out),
            },
            None => 1,
        };
        for i in 0..count {
            let _ = write!(out, "{}: ", UI_STR_OK);
            for (ch, label) in TEMP_CHANNELS.iter().enumerate() {
                let raw = match self.adcs[ch].read_raw() {
                    Ok(raw) => raw,
                    Err(_) => {
                        let _ = write!(
                            out,
                            "{}: Timeout on ADC channel {}!",
                            UI_STR_ERROR, ch
                        );
                        return CmdStatus::Error;
                    }
                };
                if ch > 0 {
                    let _ = write!(out, ", ");
                }
                let _ = write!(out, "{}: 0x{:03x}", label, raw);
            }
            if i < count - 1 {
                let _ = out.push('\n');
            }
        }
        CmdStatus::Ok
    }

    fn cmd_uart(
        &mut self,
        cmd: &str,
        args: &mut SplitAsciiWhitespace,
        out: &mut Response,
    ) -> CmdStatus {
        let port = match args.next() {
            Some(p) => match parse_int(p) {
                Some(n) => n,
                None => return invalid_number(p, out),
            },
            None => {
                let _ = write!(
                    out,
                    "{}: UART port required after command `{}'.",
                    UI_STR_ERROR, cmd
                );
                return CmdStatus::Error;
            }
        };
        let index = match UART_PORTS.iter().position(|&p| p == port) {
            Some(i) => i,
            None => {
                let _ = write!(
                    out,
                    "{}: Invalid UART port {}! Valid ports: 1, 3, 5.",
                    UI_STR_ERROR, port
                );
                return CmdStatus::Error;
            }
        };
        // R/W: 0 = write, 1 = read.
        let read = match args.next() {
            Some(p) => match parse_int(p) {
                Some(rw) => rw != 0,
                None => return invalid_number(p, out),
            },
            None => {
                let _ = write!(
                    out,
                    "{}: Read/write required after the UART port.",
                    UI_STR_ERROR
                );
                return CmdStatus::Error;
            }
        };
        if read {
            let num = match args.next() {
                Some(p) => match parse_int(p) {
                    Some(n) => (n as usize).clamp(1, 32),
                    None => return invalid_number(p, out),
                },
                None => 1,
            };
            let mut data = heapless::Vec::<u8, 32>::new();
            for _ in 0..num {
                match self.uarts[index].read_byte() {
                    Ok(b) => {
                        let _ = data.push(b);
                    }
                    Err(_) => break,
                }
            }
            if data.is_empty() {
                let _ = write!(out, "{}: Timeout on UART port {}!", UI_STR_ERROR, port);
                return CmdStatus::Error;
            }
            let _ = write!(out, "{}: Data:", UI_STR_OK);
            for b in &data {
                let _ = write!(out, " 0x{:02x}", b);
            }
            if data.len() < num {
                let _ = write!(out, " (timeout after {} byte(s))", data.len());
            }
            CmdStatus::Ok
        } else {
            let mut data = heapless::Vec::<u8, 32>::new();
            for p in args {
                match parse_int(p) {
                    Some(v) => {
                        let _ = data.push(v as u8);
                    }
                    None => return invalid_number(p, out),
                }
            }
            self.uarts[index].write_bytes(&data);
            let _ = write!(out, "{}.", UI_STR_OK);
            CmdStatus::Ok
        }
    }
}

/// Parses `PORT SLV-ADR R/W` shared by the I2C transaction command.
fn parse_i2c_header(
    cmd: &str,
    args: &mut SplitAsciiWhitespace,
    out: &mut Response,
) -> Result<(usize, u8, bool), CmdStatus> {
    let port = match args.next() {
        Some(p) => match parse_int(p) {
            Some(n) => n as usize,
            None => return Err(invalid_number(p, out)),
        },
        None => {
            let _ = write!(
                out,
                "{}: I2C port required after command `{}'.",
                UI_STR_ERROR, cmd
            );
            return Err(CmdStatus::Error);
        }
    };
    if port >= I2C_PORT_NUM {
        return Err(invalid_i2c_port(port, out));
    }
    let addr = match args.next() {
        Some(p) => match parse_int(p) {
            Some(a) => (a & 0x7f) as u8,
            None => return Err(invalid_number(p, out)),
        },
        None => {
            let _ = write!(
                out,
                "{}: Slave address required after the I2C port.",
                UI_STR_ERROR
            );
            return Err(CmdStatus::Error);
        }
    };
    // R/W: 0 = write, 1 = read.
    let read = match args.next() {
        Some(p) => match parse_int(p) {
            Some(rw) => rw != 0,
            None => return Err(invalid_number(p, out)),
        },
        None => {
            let _ = write!(
                out,
                "{}: Read/write required after the slave address.",
                UI_STR_ERROR
            );
            return Err(CmdStatus::Error);
        }
    };
    Ok((port, addr, read))
}

fn i2c_error(port: usize, addr: u8, e: I2cError, out: &mut Response) -> CmdStatus {
    match e {
        I2cError::Nack => {
            let _ = write!(
                out,
                "{}: Device (address 0x{:02x}) did not acknowledge!",
                UI_STR_ERROR, addr
            );
        }
        I2cError::Timeout => {
            let _ = write!(out, "{}: Timeout on I2C port {}!", UI_STR_ERROR, port);
        }
    }
    CmdStatus::Error
}

fn invalid_i2c_port(port: usize, out: &mut Response) -> CmdStatus {
    let _ = write!(
        out,
        "{}: Invalid I2C port {}! Valid ports: 0..{}.",
        UI_STR_ERROR,
        port,
        I2C_PORT_NUM - 1
    );
    CmdStatus::Error
}

fn invalid_number(param: &str, out: &mut Response) -> CmdStatus {
    let _ = write!(out, "{}: Invalid number `{}'.", UI_STR_ERROR, param);
    CmdStatus::Error
}

/// Formats the status query of one power domain.
fn power_status<B: GpioBackend>(
    board: &Board<B>,
    domain: PowerDomain,
    out: &mut Response,
) -> CmdStatus {
    let status = power_control::query(board, domain);
    let (prefix, cmd_status) = match status.state {
        PowerState::Partial => (UI_STR_ERROR, CmdStatus::Error),
        _ => (UI_STR_OK, CmdStatus::Ok),
    };
    let _ = write!(out, "{}: ", prefix);
    if domain == PowerDomain::All {
        let _ = match status.state {
            PowerState::On => write!(out, "All power domains are completely ON."),
            PowerState::Off | PowerState::OffClockOn => {
                write!(out, "All power domains are completely OFF.")
            }
            PowerState::Partial => write!(out, "The power domains are PARTIALLY ON."),
        };
    } else {
        let _ = match status.state {
            PowerState::On => write!(out, "The {} power is completely ON.", domain.display()),
            PowerState::Off => write!(out, "The {} power is completely OFF.", domain.display()),
            PowerState::OffClockOn => write!(
                out,
                "The {} power is OFF, but the clock domain power is ON.",
                domain.display()
            ),
            PowerState::Partial => {
                write!(out, "The {} power is PARTIALLY ON.", domain.display())
            }
        };
    }
    let _ = write!(
        out,
        " GPIO power = 0x{:02x}, GPIO reserved = 0x{:02x}",
        status.power_ctrl, status.reserved
    );
    cmd_status
}

fn help(out: &mut Response) {
    let _ = write!(
        out,
        "Available commands:\n\
         \x20 help                                Show this help text.\n\
         \x20 delay   MICROSECONDS                Delay execution.\n\
         \x20 gpio    TYPE [VALUE]                Get/Set the value of a GPIO type.\n\
         \x20 i2c     PORT SLV-ADR R/W NUM|DATA   I2C access (R/W: 0 = write, 1 = read).\n\
         \x20 i2c-det PORT                        I2C detect devices.\n\
         \x20 info                                Show information about this firmware.\n\
         \x20 temp-a  [COUNT]                     Read analog temperatures.\n\
         \x20 uart    PORT R/W NUM|DATA           UART access (R/W: 0 = write, 1 = read).\n\
         \x20 power   DOMAIN [MODE]               Power domain control (0 = down, 1 = up)."
    );
}

fn info(out: &mut Response) {
    let _ = write!(
        out,
        "MDT-TP CM MCU `{}' firmware version {}, release date: {}",
        FW_NAME, FW_VERSION, FW_RELEASEDATE
    );
}

fn gpio_help(out: &mut Response) {
    let _ = write!(
        out,
        "Available GPIO types:\n\
         \x20 help                                Show this help text.\n\
         \x20 sm-pwr-en                           SM power enable driven to CM.\n\
         \x20 cm-ready                            CM ready signal driven to SM.\n\
         \x20 led-status                          CM status LEDs.\n\
         \x20 led-user                            User LEDs.\n\
         \x20 mux-hs-sel                          High speed signal multiplexer selection.\n\
         \x20 mux-hs-pd                           High speed signal multiplexer power down.\n\
         \x20 mux-clk-sel                         Clock multiplexer selection.\n\
         \x20 power                               Switch on/off power domains.\n\
         \x20 kup                                 Control/status of the KU15P.\n\
         \x20 zup                                 Control/status of the ZU11EG.\n\
         \x20 reset                               Reset for muxes and I2C port expanders.\n\
         \x20 reserved                            Reserved pins.\n\
         \x20 pe-int                              Interrupt of I2C port expanders.\n\
         \x20 spare                               Spare signals routed to KU15P / ZU11EG."
    );
}

fn power_help(out: &mut Response) {
    let _ = write!(
        out,
        "Available domains:\n\
         \x20 help                                Show this help text.\n\
         \x20 all                                 All switchable power domains.\n\
         \x20 clock                               Clock power domain.\n\
         \x20 firefly                             FireFly power domain.\n\
         \x20 kup                                 KU15P power, incl. clock domain.\n\
         \x20 zup                                 ZU11EG power, incl. clock domain."
    );
}

/// Parses an unsigned integer with optional `0x`/`0o`/`0b` prefix. Unlike
/// `strtol`, garbage is rejected instead of silently parsing as 0.
pub fn parse_int(s: &str) -> Option<u32> {
    let (digits, radix) = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (hex, 16)
    } else if let Some(bin) = s.strip_prefix("0b").or_else(|| s.strip_prefix("0B")) {
        (bin, 2)
    } else if let Some(oct) = s.strip_prefix("0o").or_else(|| s.strip_prefix("0O")) {
        (oct, 8)
    } else {
        (s, 10)
    };
    u32::from_str_radix(digits, radix).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board_pins::BoardConfig;
    use crate::mock::{MockAdc, MockDelay, MockGpio, MockI2c, MockUart};

    type TestConsole = Console<MockGpio, MockDelay, MockI2c, MockUart, MockAdc>;

    fn console() -> TestConsole {
        let mut board = Board::new(MockGpio::new(), BoardConfig::default());
        board.init_all();
        Console::new(
            board,
            MockDelay::new(),
            [(); I2C_PORT_NUM].map(|_| MockI2c::new(&[0x48, 0x70])),
            [(); 3].map(|_| MockUart::new()),
            [(); 5].map(|_| MockAdc::new(0x1a5)),
        )
    }

    fn run(console: &mut TestConsole, line: &str) -> (CmdStatus, Response) {
        let mut out = Response::new();
        let status = console.dispatch(line, &mut out);
        (status, out)
    }

    #[test]
    fn empty_line_is_a_no_op() {
        let mut c = console();
        let (status, out) = run(&mut c, "   ");
        assert_eq!(status, CmdStatus::Ok);
        assert!(out.is_empty());
    }

    #[test]
    fn unknown_command_is_an_error() {
        let mut c = console();
        let (status, out) = run(&mut c, "frobnicate");
        assert_eq!(status, CmdStatus::Error);
        assert_eq!(out, "ERROR: Unknown command `frobnicate'.");
    }

    #[test]
    fn gpio_read_reports_current_value() {
        let mut c = console();
        let (status, out) = run(&mut c, "gpio mux-hs-sel");
        assert_eq!(status, CmdStatus::Ok);
        assert_eq!(out, "OK: Current GPIO mux-hs-sel value: 0x01");
    }

    #[test]
    fn gpio_write_round_trips() {
        let mut c = console();
        let (status, out) = run(&mut c, "gpio led-user 0xa5");
        assert_eq!(status, CmdStatus::Ok);
        assert_eq!(out, "OK: GPIO led-user set to 0xa5.");
    }

    #[test]
    fn gpio_write_to_read_only_type_is_a_warning() {
        let mut c = console();
        let (status, out) = run(&mut c, "gpio sm-pwr-en 1");
        assert_eq!(status, CmdStatus::Warning);
        assert_eq!(out, "WARNING: GPIO sm-pwr-en is read-only!");
    }

    #[test]
    fn gpio_write_mismatch_reports_actual_value() {
        let mut c = console();
        // Bits 1 and 2 of the kup type are inputs, so they do not read back.
        let (status, out) = run(&mut c, "gpio kup 0x7");
        assert_eq!(status, CmdStatus::Error);
        assert_eq!(
            out,
            "ERROR: Setting GPIO kup to 0x07 failed! It was set to 0x01 instead."
        );
    }

    #[test]
    fn gpio_help_arrives_complete() {
        // heapless writes fail atomically, so an undersized response buffer
        // would drop the whole type list instead of truncating it.
        let mut c = console();
        let (status, out) = run(&mut c, "gpio help");
        assert_eq!(status, CmdStatus::Ok);
        assert!(!out.is_empty(), "gpio help came back empty");
        assert!(out.starts_with("Available GPIO types:"));
        assert!(out.ends_with("Spare signals routed to KU15P / ZU11EG."));
    }

    #[test]
    fn gpio_unknown_type_lists_the_types() {
        let mut c = console();
        let (status, out) = run(&mut c, "gpio bogus");
        assert_eq!(status, CmdStatus::Error);
        assert!(out.starts_with("ERROR: Unknown GPIO type `bogus'!\n"));
        // The error line plus the full type list must fit the buffer.
        assert!(out.contains("Available GPIO types:"));
        assert!(out.ends_with("Spare signals routed to KU15P / ZU11EG."));
    }

    #[test]
    fn gpio_missing_type_lists_the_types() {
        let mut c = console();
        let (status, out) = run(&mut c, "gpio");
        assert_eq!(status, CmdStatus::Error);
        assert!(out.starts_with("ERROR: GPIO type required after command `gpio'.\n"));
        assert!(out.ends_with("Spare signals routed to KU15P / ZU11EG."));
    }

    #[test]
    fn power_session_walkthrough() {
        let mut c = console();

        let (status, out) = run(&mut c, "power all");
        assert_eq!(status, CmdStatus::Ok);
        assert_eq!(
            out,
            "OK: All power domains are completely OFF. \
             GPIO power = 0x00, GPIO reserved = 0x00"
        );

        let (status, out) = run(&mut c, "power kup 1");
        assert_eq!(status, CmdStatus::Ok);
        assert_eq!(out, "OK.");

        let (status, out) = run(&mut c, "power kup");
        assert_eq!(status, CmdStatus::Ok);
        assert_eq!(
            out,
            "OK: The KU15P power is completely ON. \
             GPIO power = 0x07, GPIO reserved = 0x03"
        );

        let (status, out) = run(&mut c, "power clock 0");
        assert_eq!(status, CmdStatus::Error);
        assert_eq!(
            out,
            "ERROR: Cannot power off the clock domain while the KU15P or the ZU11EG \
             are powered. Turn them off first."
        );

        let (status, out) = run(&mut c, "power kup 0");
        assert_eq!(status, CmdStatus::Ok);
        assert_eq!(out, "OK.");

        let (status, out) = run(&mut c, "power kup");
        assert_eq!(status, CmdStatus::Ok);
        assert_eq!(
            out,
            "OK: The KU15P power is OFF, but the clock domain power is ON. \
             GPIO power = 0x00, GPIO reserved = 0x01"
        );
    }

    #[test]
    fn power_partial_state_is_an_error() {
        let mut c = console();
        c.board.set(GpioGroup::PowerCtrl, 0x01);
        let (status, out) = run(&mut c, "power kup");
        assert_eq!(status, CmdStatus::Error);
        assert_eq!(
            out,
            "ERROR: The KU15P power is PARTIALLY ON. \
             GPIO power = 0x01, GPIO reserved = 0x00"
        );
    }

    #[test]
    fn power_readback_failure_names_the_step() {
        let mut c = console();
        c.board.backend.stick_low(crate::gpio::Port::F, 0x08);
        let (status, out) = run(&mut c, "power kup 1");
        assert_eq!(status, CmdStatus::Error);
        assert_eq!(out, "ERROR: Could not power up the KU15P core.");
    }

    #[test]
    fn status_leds_follow_power_commands() {
        let mut c = console();
        run(&mut c, "power kup 1");
        assert_eq!(
            c.board.get(GpioGroup::LedCmStatus),
            status_led::LED_CM_STATUS_CLOCK | status_led::LED_CM_STATUS_KU15P
        );
        // A read-only query also re-syncs the LEDs.
        c.board.set(GpioGroup::LedCmStatus, 0x0);
        run(&mut c, "power kup");
        assert_eq!(
            c.board.get(GpioGroup::LedCmStatus),
            status_led::LED_CM_STATUS_CLOCK | status_led::LED_CM_STATUS_KU15P
        );
    }

    #[test]
    fn delay_reports_ok_and_caps_at_ten_seconds() {
        let mut c = console();
        let (status, out) = run(&mut c, "delay 500000");
        assert_eq!(status, CmdStatus::Ok);
        assert_eq!(out, "OK.");
        assert_eq!(c.delay.total_us, 500_000);

        run(&mut c, "delay 99999999");
        assert_eq!(c.delay.total_us, 500_000 + 10_000_000);

        // A zero delay never reaches the hardware loop.
        run(&mut c, "delay 0");
        assert_eq!(c.delay.total_us, 500_000 + 10_000_000);
    }

    #[test]
    fn delay_requires_a_parameter() {
        let mut c = console();
        let (status, out) = run(&mut c, "delay");
        assert_eq!(status, CmdStatus::Error);
        assert_eq!(out, "ERROR: Parameter required after command `delay'.");
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let mut c = console();
        let (status, out) = run(&mut c, "delay banana");
        assert_eq!(status, CmdStatus::Error);
        assert_eq!(out, "ERROR: Invalid number `banana'.");
    }

    #[test]
    fn i2c_write_and_nack() {
        let mut c = console();
        let (status, out) = run(&mut c, "i2c 0 0x48 0 0x12 0x34");
        assert_eq!(status, CmdStatus::Ok);
        assert_eq!(out, "OK.");
        assert_eq!(&c.i2c[0].last_write[..], &[0x12, 0x34]);

        let (status, out) = run(&mut c, "i2c 0 0x21 0 0x00");
        assert_eq!(status, CmdStatus::Error);
        assert_eq!(out, "ERROR: Device (address 0x21) did not acknowledge!");
    }

    #[test]
    fn i2c_read_renders_data_bytes() {
        let mut c = console();
        let _ = c.i2c[2].read_data.extend_from_slice(&[0xde, 0xad]);
        let (status, out) = run(&mut c, "i2c 2 0x48 1 2");
        assert_eq!(status, CmdStatus::Ok);
        assert_eq!(out, "OK: Data: 0xde 0xad");
    }

    #[test]
    fn i2c_rejects_invalid_port() {
        let mut c = console();
        let (status, out) = run(&mut c, "i2c 10 0x48 1");
        assert_eq!(status, CmdStatus::Error);
        assert_eq!(out, "ERROR: Invalid I2C port 10! Valid ports: 0..9.");
    }

    #[test]
    fn i2c_detect_lists_devices() {
        let mut c = console();
        let (status, out) = run(&mut c, "i2c-det 1");
        assert_eq!(status, CmdStatus::Ok);
        assert_eq!(out, "OK: Device(s) found at slave address(es): 0x48 0x70");
    }

    #[test]
    fn temp_a_renders_raw_hex_counts() {
        let mut c = console();
        let (status, out) = run(&mut c, "temp-a");
        assert_eq!(status, CmdStatus::Ok);
        assert_eq!(
            out,
            "OK: KUP MGTAVCC/ADC/AUX: 0x1a5, KUP MGTAVTT: 0x1a5, \
             KUP DDR4/IO/Exp. Con./Misc.: 0x1a5, ZUP MGTAVCC/MGTAVTT: 0x1a5, \
             ZUP DDR4/IO/LDO/Misc.: 0x1a5"
        );
    }

    #[test]
    fn temp_a_repeats_complete_lines() {
        let mut c = console();
        let (status, out) = run(&mut c, "temp-a 3");
        assert_eq!(status, CmdStatus::Ok);
        assert_eq!(out.split('\n').count(), 3);
        for line in out.split('\n') {
            assert!(line.starts_with("OK: "));
            assert!(line.ends_with("ZUP DDR4/IO/LDO/Misc.: 0x1a5"));
        }
    }

    #[test]
    fn temp_a_count_is_capped() {
        // A huge count must not overflow the response buffer and drop lines.
        let mut c = console();
        let (status, out) = run(&mut c, "temp-a 0xffffff");
        assert_eq!(status, CmdStatus::Ok);
        assert_eq!(out.split('\n').count(), TEMP_REPEAT_MAX as usize);
        assert!(out.ends_with("ZUP DDR4/IO/LDO/Misc.: 0x1a5"));
    }

    #[test]
    fn uart_loopback_write_then_read() {
        let mut c = console();
        let (status, out) = run(&mut c, "uart 3 0 0x41 0x42");
        assert_eq!(status, CmdStatus::Ok);
        assert_eq!(out, "OK.");

        let (status, out) = run(&mut c, "uart 3 1 2");
        assert_eq!(status, CmdStatus::Ok);
        assert_eq!(out, "OK: Data: 0x41 0x42");
    }

    #[test]
    fn uart_read_without_data_times_out() {
        let mut c = console();
        let (status, out) = run(&mut c, "uart 5 1");
        assert_eq!(status, CmdStatus::Error);
        assert_eq!(out, "ERROR: Timeout on UART port 5!");
    }

    #[test]
    fn help_lists_all_commands() {
        let mut c = console();
        let (status, out) = run(&mut c, "help");
        assert_eq!(status, CmdStatus::Ok);
        for cmd in ["delay", "gpio", "i2c", "i2c-det", "temp-a", "uart", "power"] {
            assert!(out.contains(cmd), "help misses {}", cmd);
        }
    }

    #[test]
    fn info_shows_the_firmware_banner() {
        let mut c = console();
        let (status, out) = run(&mut c, "info");
        assert_eq!(status, CmdStatus::Ok);
        assert!(out.starts_with("MDT-TP CM MCU `cm-mcu-hwtest' firmware version"));
    }

    #[test]
    fn parse_int_prefixes() {
        assert_eq!(parse_int("42"), Some(42));
        assert_eq!(parse_int("0x2a"), Some(42));
        assert_eq!(parse_int("0b101010"), Some(42));
        assert_eq!(parse_int("0o52"), Some(42));
        assert_eq!(parse_int(""), None);
        assert_eq!(parse_int("0x"), None);
        assert_eq!(parse_int("12ab"), None);
    }
}
