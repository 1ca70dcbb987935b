#![no_std]
#![no_main]

use core::panic::PanicInfo;

use cortex_m_rt::entry;
use defmt_rtt as _;

use cm_mcu_hwtest::board_pins::{Board, BoardConfig, GpioGroup, LED_USER_GREEN_0, LED_USER_GREEN_1};
use cm_mcu_hwtest::command::{
    CmdStatus, Console, Response, FW_NAME, FW_RELEASEDATE, FW_VERSION, I2C_PORT_NUM,
    UI_COMMAND_PROMPT, UI_STR_FATAL,
};
use cm_mcu_hwtest::tm4c_hal_impl::{
    i2c, ConsoleUart, CycleDelay, Tm4cAdcChannel, Tm4cGpio, Tm4cI2c, Tm4cUart, SYSTEM_CLOCK_FREQ,
};

#[panic_handler]
fn panic(_info: &PanicInfo) -> ! {
    defmt::error!("{}: Unhandled error, firmware halted.", UI_STR_FATAL);
    loop {
        cortex_m::asm::nop();
    }
}

/// ADC0 inputs of the five analog temperature channels, in the order of
/// `command::TEMP_CHANNELS`.
const TEMP_ADC_CHANNELS: [u32; 5] = [0, 8, 9, 10, 11];

#[entry]
fn main() -> ! {
    let p = tm4c129x::Peripherals::take().unwrap();
    let sysclk = SYSTEM_CLOCK_FREQ;

    // Console first so that init errors of the other peripherals could be
    // reported; the test UARTs come up in loopback.
    let mut term = ConsoleUart::new(p.UART0, &p.SYSCTL, sysclk);
    let uarts = [
        Tm4cUart::uart1(p.UART1, &p.SYSCTL, sysclk),
        Tm4cUart::uart3(p.UART3, &p.SYSCTL, sysclk),
        Tm4cUart::uart5(p.UART5, &p.SYSCTL, sysclk),
    ];
    let adcs = TEMP_ADC_CHANNELS.map(|ch| Tm4cAdcChannel::new(ch, &p.SYSCTL));
    i2c::route_i2c0_pins(&p.SYSCTL);
    let mut i2c_index = 0;
    let i2c = [(); I2C_PORT_NUM].map(|_| {
        let master = Tm4cI2c::new(i2c_index, &p.SYSCTL, sysclk);
        i2c_index += 1;
        master
    });
    let delay = CycleDelay::new(sysclk);

    // All GPIO groups to their hardware-safe defaults: everything powered
    // off, resets deasserted.
    let mut board = Board::new(Tm4cGpio::new(p.SYSCTL), BoardConfig::default());
    board.init_all();

    let mut user_leds = LED_USER_GREEN_0;
    board.set(GpioGroup::LedMcuUser, user_leds);

    let mut console = Console::new(board, delay, i2c, uarts, adcs);
    defmt::info!("{} {} up, console on UART0", FW_NAME, FW_VERSION);

    term.write_str(
        "\n\n*******************************************************************************\n",
    );
    let mut banner = Response::new();
    {
        use core::fmt::Write as _;
        let _ = write!(
            banner,
            "MDT-TP CM MCU `{}' firmware version {}, release date: {}\n",
            FW_NAME, FW_VERSION, FW_RELEASEDATE
        );
    }
    term.write_str(&banner);
    term.write_str(
        "*******************************************************************************\n\n",
    );
    term.write_str("Type `help' to get an overview of available commands.\n");

    user_leds |= LED_USER_GREEN_1;
    console.board.set(GpioGroup::LedMcuUser, user_leds);

    let mut line_buf = [0u8; 256];
    let mut out = Response::new();
    loop {
        term.write_str(UI_COMMAND_PROMPT);
        let line = term.read_line(&mut line_buf);
        out.clear();
        let status = console.dispatch(line, &mut out);
        if status == CmdStatus::Error {
            defmt::error!("command failed: {=str}", line);
        }
        if !out.is_empty() {
            term.write_str(&out);
            term.write_str("\n");
        }
    }
}
