//! Static pin configuration of the command module and the board context.
//!
//! Every logical signal group is a [`PinGroup`] with a fixed, documented bit
//! order. Default values are hardware-safety constants: all power control and
//! reserved enable bits come up 0 (everything off), the FPGA/SoC control
//! lines come up with their program/init lines deasserted.

use defmt::Format;

use crate::gpio::{Pin, PinGroup, Port};
use crate::hal::GpioBackend;

// ******************************************************************
// Pin tables.
// ******************************************************************

/// SM_PWR_ENA: PN3. Service module power enable, driven to the CM.
pub static SM_PWR_ENA: PinGroup = PinGroup {
    name: "sm-pwr-en",
    pins: &[Pin::input(Port::N, 0x08)],
};

/// CM_READY: PN2. Command module ready, driven to the SM.
pub static CM_READY: PinGroup = PinGroup {
    name: "cm-ready",
    pins: &[Pin::output(Port::N, 0x04)],
};

/// CM status LEDs on PN4, PN5, PQ0, PQ1. Functional bit order, see
/// `crate::status_led`: bit 0 clock domain, bit 1 KU15P domain,
/// bit 2 ZU11EG domain, bit 3 temperature alert.
pub static LED_CM_STATUS: PinGroup = PinGroup {
    name: "led-status",
    pins: &[
        Pin::output(Port::N, 0x10),
        Pin::output(Port::N, 0x20),
        Pin::output(Port::Q, 0x01),
        Pin::output(Port::Q, 0x02),
    ],
};

/// MCU user LEDs, MCU_USER_LED0..7 on PM0..PM7.
/// Colors in bit order: blue 0/1, orange 0/1, green 0/1, red 0/1.
pub static LED_MCU_USER: PinGroup = PinGroup {
    name: "led-user",
    pins: &[
        Pin::output(Port::M, 0x01),
        Pin::output(Port::M, 0x02),
        Pin::output(Port::M, 0x04),
        Pin::output(Port::M, 0x08),
        Pin::output(Port::M, 0x10),
        Pin::output(Port::M, 0x20),
        Pin::output(Port::M, 0x40),
        Pin::output(Port::M, 0x80),
    ],
};

/// High speed signal multiplexer selection.
/// Bit 0: B2B_MUX1_SEL (PA2), bit 1: B2B_MUX2_SEL (PA4),
/// bit 2: LTTC_MUX_SEL (PC4).
pub static MUX_HS_SEL: PinGroup = PinGroup {
    name: "mux-hs-sel",
    pins: &[
        Pin::output(Port::A, 0x04),
        Pin::output(Port::A, 0x10),
        Pin::output(Port::C, 0x10),
    ],
};

/// High speed signal multiplexer power down.
/// Bit 0: B2B_MUX1_PD (PA3), bit 1: B2B_MUX2_PD (PA5),
/// bit 2: LTTC_MUX_PD (PC5).
pub static MUX_HS_PD: PinGroup = PinGroup {
    name: "mux-hs-pd",
    pins: &[
        Pin::output(Port::A, 0x08),
        Pin::output(Port::A, 0x20),
        Pin::output(Port::C, 0x20),
    ],
};

/// Clock multiplexer selection.
/// Bit 0: AD_CLK2_KUP_SEL (PE0), bit 1: AD_CLK3_KUP_SEL (PE1),
/// bit 2: AD_CLK4_KUP_SEL (PE2), bit 3: AD_CLK5_ZUP_SEL (PN0),
/// bit 4: CLK_LHC_FPGA_SEL (PN1).
pub static MUX_CLK_SEL: PinGroup = PinGroup {
    name: "mux-clk-sel",
    pins: &[
        Pin::output(Port::E, 0x01),
        Pin::output(Port::E, 0x02),
        Pin::output(Port::E, 0x04),
        Pin::output(Port::N, 0x01),
        Pin::output(Port::N, 0x02),
    ],
};

/// Power control bits. See `crate::power_control` for the rail masks.
/// Bit 0: KUP_CORE_RUN (PF3), bit 1: KUP_P3V3_IO_RUN (PD2),
/// bit 2: KUP_DDR4_TERM_EN (PF4), bit 3: ZUP_CORE_RUN (PD6),
/// bit 4: ZUP_PS_DDR4_TERM_EN (PD7), bit 5: ZUP_PL_DDR4_TERM_EN (PF0),
/// bit 6: FIREFLY_P1V8_RUN (PF1), bit 7: FIREFLY_P3V3_RUN (PF2).
pub static POWER_CTRL: PinGroup = PinGroup {
    name: "power",
    pins: &[
        Pin::output(Port::F, 0x08),
        Pin::output(Port::D, 0x04),
        Pin::output(Port::F, 0x10),
        Pin::output(Port::D, 0x40),
        Pin::output(Port::D, 0x80),
        Pin::output(Port::F, 0x01),
        Pin::output(Port::F, 0x02),
        Pin::output(Port::F, 0x04),
    ],
};

/// Control/status of the KU15P.
/// Bit 0: KUP_PROG_B_3V3 (PK6, output), bit 1: KUP_INIT_B_3V3 (PK5, input),
/// bit 2: KUP_DONE_3V3 (PK7, input).
pub static KUP_CTRL_STAT: PinGroup = PinGroup {
    name: "kup",
    pins: &[
        Pin::output(Port::K, 0x40),
        Pin::input(Port::K, 0x20),
        Pin::input(Port::K, 0x80),
    ],
};

/// Control/status of the ZU11EG.
/// Bit 0: ZUP_PS_PROG_B (PP0, output), bit 1: ZUP_PS_INIT_B (PP1, input),
/// bit 2: ZUP_PS_DONE (PP2, input), bit 3: ZUP_PS_nPOR (PP3, output),
/// bit 4: ZUP_PS_ERR_STATUS (PP4, input), bit 5: ZUP_PS_ERR_OUT (PP5, input).
pub static ZUP_CTRL_STAT: PinGroup = PinGroup {
    name: "zup",
    pins: &[
        Pin::output(Port::P, 0x01),
        Pin::input(Port::P, 0x02),
        Pin::input(Port::P, 0x04),
        Pin::output(Port::P, 0x08),
        Pin::input(Port::P, 0x10),
        Pin::input(Port::P, 0x20),
    ],
};

/// Reset for the multiplexers and the I2C port expanders, active low.
/// Bit 0: I2C_MUX_nRST (PK0), bit 1: MCU_PEx_nRST (PK1).
pub static RESET: PinGroup = PinGroup {
    name: "reset",
    pins: &[Pin::output(Port::K, 0x01), Pin::output(Port::K, 0x02)],
};

/// Interrupt lines of the I2C port expanders.
/// Bit 0: MCU_PE0_nINT (PK2), bit 1: MCU_PE1_nINT (PK3).
pub static PE_INT: PinGroup = PinGroup {
    name: "pe-int",
    pins: &[Pin::input(Port::K, 0x04), Pin::input(Port::K, 0x08)],
};

/// Spare signals routed to the KU15P / ZU11EG.
/// Bits 0..3: MCU_2_KUP_SE0..3 (PL4..PL7),
/// bits 4..7: MCU_2_ZUP_SE0..3 (PL0..PL3).
pub static SPARE_KUP_ZUP: PinGroup = PinGroup {
    name: "spare",
    pins: &[
        Pin::output(Port::L, 0x10),
        Pin::output(Port::L, 0x20),
        Pin::output(Port::L, 0x40),
        Pin::output(Port::L, 0x80),
        Pin::output(Port::L, 0x01),
        Pin::output(Port::L, 0x02),
        Pin::output(Port::L, 0x04),
        Pin::output(Port::L, 0x08),
    ],
};

/// Reserved power enable bits feeding the clock fanout and the peripheral
/// supplies of the two FPGA domains.
/// Bit 0: PWR_CLK (PQ2), bit 1: PWR_KU15P (PQ3), bit 2: PWR_ZU11EG (PQ4).
pub static RESERVED: PinGroup = PinGroup {
    name: "reserved",
    pins: &[
        Pin::output(Port::Q, 0x04),
        Pin::output(Port::Q, 0x08),
        Pin::output(Port::Q, 0x10),
    ],
};

// ******************************************************************
// Default values applied at firmware init.
// ******************************************************************

// User LED bit masks, matching the `led-user` group order.
pub const LED_USER_BLUE_0: u32 = 0x01;
pub const LED_USER_BLUE_1: u32 = 0x02;
pub const LED_USER_ORANGE_0: u32 = 0x04;
pub const LED_USER_ORANGE_1: u32 = 0x08;
pub const LED_USER_GREEN_0: u32 = 0x10;
pub const LED_USER_GREEN_1: u32 = 0x20;
pub const LED_USER_RED_0: u32 = 0x40;
pub const LED_USER_RED_1: u32 = 0x80;

pub const GPIO_DEFAULT_CM_READY: u32 = 0x0;
pub const GPIO_DEFAULT_LED_CM_STATUS: u32 = 0x0;
pub const GPIO_DEFAULT_LED_MCU_USER: u32 = 0x00;
pub const GPIO_DEFAULT_MUX_HS_SEL: u32 = 0x1;
pub const GPIO_DEFAULT_MUX_CLK_SEL: u32 = 0x00;
pub const GPIO_DEFAULT_POWER_CTRL: u32 = 0x00;
/// Program asserted high, the rest of the output bits low.
pub const GPIO_DEFAULT_KUP_CTRL_STAT: u32 = 0x3;
pub const GPIO_DEFAULT_ZUP_CTRL_STAT: u32 = 0xb;
/// Both resets are active low and deasserted at boot.
pub const GPIO_DEFAULT_RESET: u32 = 0x3;
pub const GPIO_DEFAULT_SPARE_KUP_ZUP: u32 = 0x00;
pub const GPIO_DEFAULT_RESERVED: u32 = 0x00;

/// Polarity of the multiplexer power-down pins. Differs between hardware
/// revisions of the command module, so it is board configuration rather than
/// a constant.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Format)]
pub enum MuxPdPolarity {
    /// PD pin high powers the multiplexer down; keep it low at boot.
    ActiveHigh,
    /// PD pin low powers the multiplexer down; keep all three high at boot.
    ActiveLow,
}

/// Revision-dependent board configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Format)]
pub struct BoardConfig {
    pub mux_pd_polarity: MuxPdPolarity,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            mux_pd_polarity: MuxPdPolarity::ActiveHigh,
        }
    }
}

impl BoardConfig {
    /// Boot value of the `mux-hs-pd` group: muxes powered up.
    pub fn default_mux_pd(&self) -> u32 {
        match self.mux_pd_polarity {
            MuxPdPolarity::ActiveHigh => 0x0,
            MuxPdPolarity::ActiveLow => 0x7,
        }
    }
}

// ******************************************************************
// Group registry.
// ******************************************************************

/// Identifier of a logical signal group, as named on the serial console.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Format)]
pub enum GpioGroup {
    SmPowerEna,
    CmReady,
    LedCmStatus,
    LedMcuUser,
    MuxHsSel,
    MuxHsPd,
    MuxClkSel,
    PowerCtrl,
    KupCtrlStat,
    ZupCtrlStat,
    Reset,
    PeInt,
    SpareKupZup,
    Reserved,
}

pub const ALL_GROUPS: [GpioGroup; 14] = [
    GpioGroup::SmPowerEna,
    GpioGroup::CmReady,
    GpioGroup::LedCmStatus,
    GpioGroup::LedMcuUser,
    GpioGroup::MuxHsSel,
    GpioGroup::MuxHsPd,
    GpioGroup::MuxClkSel,
    GpioGroup::PowerCtrl,
    GpioGroup::KupCtrlStat,
    GpioGroup::ZupCtrlStat,
    GpioGroup::Reset,
    GpioGroup::PeInt,
    GpioGroup::SpareKupZup,
    GpioGroup::Reserved,
];

impl GpioGroup {
    pub fn group(self) -> &'static PinGroup {
        match self {
            GpioGroup::SmPowerEna => &SM_PWR_ENA,
            GpioGroup::CmReady => &CM_READY,
            GpioGroup::LedCmStatus => &LED_CM_STATUS,
            GpioGroup::LedMcuUser => &LED_MCU_USER,
            GpioGroup::MuxHsSel => &MUX_HS_SEL,
            GpioGroup::MuxHsPd => &MUX_HS_PD,
            GpioGroup::MuxClkSel => &MUX_CLK_SEL,
            GpioGroup::PowerCtrl => &POWER_CTRL,
            GpioGroup::KupCtrlStat => &KUP_CTRL_STAT,
            GpioGroup::ZupCtrlStat => &ZUP_CTRL_STAT,
            GpioGroup::Reset => &RESET,
            GpioGroup::PeInt => &PE_INT,
            GpioGroup::SpareKupZup => &SPARE_KUP_ZUP,
            GpioGroup::Reserved => &RESERVED,
        }
    }

    /// Console name of the group.
    pub fn name(self) -> &'static str {
        self.group().name
    }

    /// Looks a group up by its console name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        ALL_GROUPS
            .iter()
            .copied()
            .find(|g| g.name().eq_ignore_ascii_case(name))
    }
}

// ******************************************************************
// Board context.
// ******************************************************************

/// The one owner of all live GPIO state. Command processing is
/// single-threaded and synchronous, so a plain `&mut Board` is the only
/// writer at any time.
pub struct Board<B> {
    pub backend: B,
    pub config: BoardConfig,
}

impl<B: GpioBackend> Board<B> {
    pub fn new(backend: B, config: BoardConfig) -> Self {
        Self { backend, config }
    }

    /// Initializes every pin group and applies the hardware-safe boot
    /// defaults. All power control and reserved enable bits end up 0.
    pub fn init_all(&mut self) {
        for g in ALL_GROUPS {
            g.group().init(&mut self.backend);
        }
        self.set(GpioGroup::CmReady, GPIO_DEFAULT_CM_READY);
        self.set(GpioGroup::LedCmStatus, GPIO_DEFAULT_LED_CM_STATUS);
        self.set(GpioGroup::LedMcuUser, GPIO_DEFAULT_LED_MCU_USER);
        self.set(GpioGroup::MuxHsSel, GPIO_DEFAULT_MUX_HS_SEL);
        self.set(GpioGroup::MuxHsPd, self.config.default_mux_pd());
        self.set(GpioGroup::MuxClkSel, GPIO_DEFAULT_MUX_CLK_SEL);
        self.set(GpioGroup::PowerCtrl, GPIO_DEFAULT_POWER_CTRL);
        self.set(GpioGroup::KupCtrlStat, GPIO_DEFAULT_KUP_CTRL_STAT);
        self.set(GpioGroup::ZupCtrlStat, GPIO_DEFAULT_ZUP_CTRL_STAT);
        self.set(GpioGroup::Reset, GPIO_DEFAULT_RESET);
        self.set(GpioGroup::SpareKupZup, GPIO_DEFAULT_SPARE_KUP_ZUP);
        self.set(GpioGroup::Reserved, GPIO_DEFAULT_RESERVED);
    }

    /// Reads the current value of a group.
    pub fn get(&self, group: GpioGroup) -> u32 {
        group.group().get(&self.backend)
    }

    /// Writes a group value. Bits mapping to input pins are write-ignored.
    pub fn set(&mut self, group: GpioGroup, value: u32) {
        group.group().set(&mut self.backend, value);
    }
}
