//! Power domain sequencing.
//!
//! Four switchable rails hang off the power control and reserved enable
//! groups: the clock tree, the FireFly optics, the KU15P FPGA and the ZU11EG
//! SoC. Bring-up and tear-down follow a mandated order per domain; every
//! group write is verified by an immediate readback and the first mismatch
//! aborts the call. There is no rollback: a failed sequence leaves the rails
//! in their intermediate state for the operator to inspect.

use defmt::Format;

use crate::board_pins::{Board, GpioGroup};
use crate::hal::GpioBackend;

// Hardware constants, bit positions in the power control group.
pub const POWER_KU15P_CORE: u32 = 0x01;
pub const POWER_KU15P_P3V3_IO: u32 = 0x02;
pub const POWER_KU15P_DDR4_TERM_EN: u32 = 0x04;
pub const POWER_KU15P: u32 = POWER_KU15P_CORE | POWER_KU15P_P3V3_IO | POWER_KU15P_DDR4_TERM_EN;
pub const POWER_ZU11EG_CORE: u32 = 0x08;
pub const POWER_ZU11EG_PS_DDR4_TERM_EN: u32 = 0x10;
pub const POWER_ZU11EG_PL_DDR4_TERM_EN: u32 = 0x20;
pub const POWER_ZU11EG: u32 =
    POWER_ZU11EG_CORE | POWER_ZU11EG_PS_DDR4_TERM_EN | POWER_ZU11EG_PL_DDR4_TERM_EN;
pub const POWER_FIREFLY_P1V8: u32 = 0x40;
pub const POWER_FIREFLY_P3V3: u32 = 0x80;
// Enabling the 1.8 V and 3.3 V FireFly supplies at the same time reboots the
// MCU, and the FireFly modules fitted on the command module do not need the
// 1.8 V rail. The 1.8 V bit is therefore excluded from all FireFly
// operations.
pub const POWER_FIREFLY: u32 = POWER_FIREFLY_P3V3;
pub const POWER_ALL: u32 = POWER_KU15P | POWER_ZU11EG | POWER_FIREFLY;

// Bit positions in the reserved enable group.
pub const POWER_RESERVED_CLOCK: u32 = 0x01;
pub const POWER_RESERVED_KU15P: u32 = 0x02;
pub const POWER_RESERVED_ZU11EG: u32 = 0x04;
pub const POWER_RESERVED_CLOCK_KU15P: u32 = POWER_RESERVED_CLOCK | POWER_RESERVED_KU15P;
pub const POWER_RESERVED_CLOCK_ZU11EG: u32 = POWER_RESERVED_CLOCK | POWER_RESERVED_ZU11EG;
pub const POWER_RESERVED_ALL: u32 =
    POWER_RESERVED_CLOCK | POWER_RESERVED_KU15P | POWER_RESERVED_ZU11EG;

/// A switchable power domain, as named on the serial console.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Format)]
pub enum PowerDomain {
    All,
    Clock,
    FireFly,
    Ku15p,
    Zu11eg,
}

impl PowerDomain {
    pub fn from_name(name: &str) -> Option<Self> {
        const NAMES: [(&str, PowerDomain); 5] = [
            ("all", PowerDomain::All),
            ("clock", PowerDomain::Clock),
            ("firefly", PowerDomain::FireFly),
            ("kup", PowerDomain::Ku15p),
            ("zup", PowerDomain::Zu11eg),
        ];
        NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, d)| d)
    }

    /// Display name used in status messages.
    pub fn display(self) -> &'static str {
        match self {
            PowerDomain::All => "all",
            PowerDomain::Clock => "clock",
            PowerDomain::FireFly => "FireFly",
            PowerDomain::Ku15p => "KU15P",
            PowerDomain::Zu11eg => "ZU11EG",
        }
    }
}

/// Observable state of a domain. `Partial` is an error state that is never
/// entered intentionally; it is reported but not resolved automatically.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Format)]
pub enum PowerState {
    On,
    Off,
    /// The domain's own bits are clear but the shared clock domain is still
    /// up. A valid resting state for the KU15P and ZU11EG.
    OffClockOn,
    Partial,
}

/// Result of a status query: the classification plus the raw group values it
/// was derived from. Formatting is left to the caller.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Format)]
pub struct DomainStatus {
    pub domain: PowerDomain,
    pub state: PowerState,
    pub power_ctrl: u32,
    pub reserved: u32,
}

/// The sub-step of a power sequence that failed its readback check.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Format)]
pub enum PowerStep {
    Clock,
    FireFly,
    KupCore,
    KupDdr4Term,
    KupPeripherals,
    KupIo,
    ZupCore,
    ZupDdr4Term,
    ZupPeripherals,
}

impl PowerStep {
    /// Noun phrase for error messages.
    pub fn describe(self) -> &'static str {
        match self {
            PowerStep::Clock => "the clock domain",
            PowerStep::FireFly => "the FireFly domain",
            PowerStep::KupCore => "the KU15P core",
            PowerStep::KupDdr4Term => "the KU15P DDR4 termination",
            PowerStep::KupPeripherals => "the KU15P peripherals",
            PowerStep::KupIo => "the KU15P 3.3 V IO",
            PowerStep::ZupCore => "the ZU11EG core",
            PowerStep::ZupDdr4Term => "the ZU11EG DDR4 termination",
            PowerStep::ZupPeripherals => "the ZU11EG peripherals",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Format)]
pub enum PowerError {
    /// A group write did not read back as written. The sequence was aborted
    /// at this step; earlier steps remain applied.
    Readback { step: PowerStep, power_up: bool },
    /// Refused to power down the clock domain while the KU15P or ZU11EG
    /// reserved bits are still set. Nothing was mutated.
    ClockDependentsPowered,
}

/// Read-modify-write of one group with readback verification.
fn apply<B: GpioBackend>(
    board: &mut Board<B>,
    group: GpioGroup,
    mask: u32,
    on: bool,
    step: PowerStep,
    power_up: bool,
) -> Result<(), PowerError> {
    let current = board.get(group);
    let target = if on { current | mask } else { current & !mask };
    board.set(group, target);
    if board.get(group) != target {
        return Err(PowerError::Readback { step, power_up });
    }
    Ok(())
}

/// Classifies the current state of `domain` from the raw group values.
pub fn query<B: GpioBackend>(board: &Board<B>, domain: PowerDomain) -> DomainStatus {
    let power_ctrl = board.get(GpioGroup::PowerCtrl);
    let reserved = board.get(GpioGroup::Reserved);
    let state = match domain {
        PowerDomain::All => classify(power_ctrl, reserved, POWER_ALL, POWER_RESERVED_ALL, false),
        // The clock domain has no bits of its own in the power control
        // group; only the reserved bit counts.
        PowerDomain::Clock => classify(power_ctrl, reserved, 0, POWER_RESERVED_CLOCK, false),
        PowerDomain::FireFly => classify(power_ctrl, reserved, POWER_FIREFLY, 0, false),
        PowerDomain::Ku15p => classify(
            power_ctrl,
            reserved,
            POWER_KU15P,
            POWER_RESERVED_CLOCK_KU15P,
            true,
        ),
        PowerDomain::Zu11eg => classify(
            power_ctrl,
            reserved,
            POWER_ZU11EG,
            POWER_RESERVED_CLOCK_ZU11EG,
            true,
        ),
    };
    DomainStatus {
        domain,
        state,
        power_ctrl,
        reserved,
    }
}

fn classify(
    power_ctrl: u32,
    reserved: u32,
    power_mask: u32,
    reserved_mask: u32,
    clock_exception: bool,
) -> PowerState {
    let p = power_ctrl & power_mask;
    let r = reserved & reserved_mask;
    if p == power_mask && r == reserved_mask {
        PowerState::On
    } else if p == 0 && r == 0 {
        PowerState::Off
    } else if clock_exception && p == 0 && r == POWER_RESERVED_CLOCK {
        PowerState::OffClockOn
    } else {
        PowerState::Partial
    }
}

/// Powers `domain` up (`value != 0`) or down (`value == 0`), running the
/// domain-specific write sequence with readback verification after every
/// step. Returns at the first failing step without rollback.
pub fn set<B: GpioBackend>(
    board: &mut Board<B>,
    domain: PowerDomain,
    value: u32,
) -> Result<(), PowerError> {
    let up = value != 0;
    match domain {
        PowerDomain::All => set_all(board, value),
        PowerDomain::Clock => set_clock(board, up),
        PowerDomain::FireFly => set_firefly(board, up),
        PowerDomain::Ku15p => set_ku15p(board, up),
        PowerDomain::Zu11eg => set_zu11eg(board, up),
    }
}

/// All switchable domains. The clock domain comes up first and goes down
/// last; in between the order is KU15P, ZU11EG, FireFly.
fn set_all<B: GpioBackend>(board: &mut Board<B>, value: u32) -> Result<(), PowerError> {
    let up = value != 0;
    if up {
        set_clock(board, true)?;
    }
    set_ku15p(board, up)?;
    set_zu11eg(board, up)?;
    set_firefly(board, up)?;
    if !up {
        set_clock(board, false)?;
    }
    Ok(())
}

fn set_clock<B: GpioBackend>(board: &mut Board<B>, up: bool) -> Result<(), PowerError> {
    if !up {
        // The clock tree feeds the FPGA peripheral supplies; cutting it while
        // either is up would trip their power-good supervisors.
        let reserved = board.get(GpioGroup::Reserved);
        if reserved & (POWER_RESERVED_KU15P | POWER_RESERVED_ZU11EG) != 0 {
            return Err(PowerError::ClockDependentsPowered);
        }
    }
    apply(
        board,
        GpioGroup::Reserved,
        POWER_RESERVED_CLOCK,
        up,
        PowerStep::Clock,
        up,
    )
}

fn set_firefly<B: GpioBackend>(board: &mut Board<B>, up: bool) -> Result<(), PowerError> {
    apply(
        board,
        GpioGroup::PowerCtrl,
        POWER_FIREFLY,
        up,
        PowerStep::FireFly,
        up,
    )
}

/// KU15P bring-up: core, DDR4 termination, peripherals, 3.3 V IO.
/// Tear-down: 3.3 V IO, peripherals, core, DDR4 termination. The DDR4
/// termination is deliberately last on the way down even though it is second
/// on the way up; this asymmetry is tied to the power-good timing of the
/// termination regulator.
fn set_ku15p<B: GpioBackend>(board: &mut Board<B>, up: bool) -> Result<(), PowerError> {
    use GpioGroup::{PowerCtrl, Reserved};
    use PowerStep::*;
    if up {
        apply(board, PowerCtrl, POWER_KU15P_CORE, true, KupCore, up)?;
        apply(board, PowerCtrl, POWER_KU15P_DDR4_TERM_EN, true, KupDdr4Term, up)?;
        // The peripheral enable also sets the clock reserved bit; enabling
        // the KU15P peripherals with the clock tree down trips a PGOOD
        // fault.
        apply(board, Reserved, POWER_RESERVED_CLOCK_KU15P, true, KupPeripherals, up)?;
        apply(board, PowerCtrl, POWER_KU15P_P3V3_IO, true, KupIo, up)?;
    } else {
        apply(board, PowerCtrl, POWER_KU15P_P3V3_IO, false, KupIo, up)?;
        apply(board, Reserved, POWER_RESERVED_KU15P, false, KupPeripherals, up)?;
        apply(board, PowerCtrl, POWER_KU15P_CORE, false, KupCore, up)?;
        apply(board, PowerCtrl, POWER_KU15P_DDR4_TERM_EN, false, KupDdr4Term, up)?;
    }
    Ok(())
}

/// ZU11EG bring-up: core, DDR4 termination (PS and PL together),
/// peripherals. Tear-down: peripherals, core, DDR4 termination.
fn set_zu11eg<B: GpioBackend>(board: &mut Board<B>, up: bool) -> Result<(), PowerError> {
    use GpioGroup::{PowerCtrl, Reserved};
    use PowerStep::*;
    const ZUP_DDR4: u32 = POWER_ZU11EG_PS_DDR4_TERM_EN | POWER_ZU11EG_PL_DDR4_TERM_EN;
    if up {
        apply(board, PowerCtrl, POWER_ZU11EG_CORE, true, ZupCore, up)?;
        apply(board, PowerCtrl, ZUP_DDR4, true, ZupDdr4Term, up)?;
        // Also forces the clock reserved bit, same PGOOD constraint as the
        // KU15P.
        apply(board, Reserved, POWER_RESERVED_CLOCK_ZU11EG, true, ZupPeripherals, up)?;
    } else {
        apply(board, Reserved, POWER_RESERVED_ZU11EG, false, ZupPeripherals, up)?;
        apply(board, PowerCtrl, POWER_ZU11EG_CORE, false, ZupCore, up)?;
        apply(board, PowerCtrl, ZUP_DDR4, false, ZupDdr4Term, up)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board_pins::{BoardConfig, POWER_CTRL, RESERVED};
    use crate::gpio::Port;
    use crate::mock::MockGpio;

    fn board() -> Board<MockGpio> {
        let mut board = Board::new(MockGpio::new(), BoardConfig::default());
        board.init_all();
        board
    }

    #[test]
    fn boot_state_is_completely_off() {
        let board = board();
        let status = query(&board, PowerDomain::All);
        assert_eq!(status.state, PowerState::Off);
        assert_eq!(status.power_ctrl, 0x00);
        assert_eq!(status.reserved, 0x00);
    }

    #[test]
    fn ku15p_power_cycle_round_trips() {
        let mut board = board();
        let power_before = board.get(GpioGroup::PowerCtrl);
        let reserved_before = board.get(GpioGroup::Reserved);

        set(&mut board, PowerDomain::Ku15p, 1).unwrap();
        assert_eq!(board.get(GpioGroup::PowerCtrl), POWER_KU15P);
        assert_eq!(board.get(GpioGroup::Reserved), POWER_RESERVED_CLOCK_KU15P);
        assert_eq!(query(&board, PowerDomain::Ku15p).state, PowerState::On);

        set(&mut board, PowerDomain::Ku15p, 0).unwrap();
        assert_eq!(board.get(GpioGroup::PowerCtrl), power_before);
        // Powering down the KU15P leaves the shared clock bit set.
        assert_eq!(
            board.get(GpioGroup::Reserved),
            reserved_before | POWER_RESERVED_CLOCK
        );
        assert_eq!(
            query(&board, PowerDomain::Ku15p).state,
            PowerState::OffClockOn
        );
    }

    #[test]
    fn ku15p_bring_up_order() {
        let mut board = board();
        board.backend.clear_writes();
        set(&mut board, PowerDomain::Ku15p, 1).unwrap();

        // Positions of the first rising write of each sub-step's pin.
        let core = first_high_write(&board, &POWER_CTRL.pins[0]);
        let ddr4 = first_high_write(&board, &POWER_CTRL.pins[2]);
        let periph = first_high_write(&board, &RESERVED.pins[1]);
        let io = first_high_write(&board, &POWER_CTRL.pins[1]);
        assert!(core < ddr4, "core before DDR4 termination");
        assert!(ddr4 < periph, "DDR4 termination before peripherals");
        assert!(periph < io, "peripherals before IO");
    }

    #[test]
    fn ku15p_tear_down_order_is_asymmetric() {
        let mut board = board();
        set(&mut board, PowerDomain::Ku15p, 1).unwrap();
        board.backend.clear_writes();
        set(&mut board, PowerDomain::Ku15p, 0).unwrap();

        let io = first_low_write(&board, &POWER_CTRL.pins[1]);
        let periph = first_low_write(&board, &RESERVED.pins[1]);
        let core = first_low_write(&board, &POWER_CTRL.pins[0]);
        let ddr4 = first_low_write(&board, &POWER_CTRL.pins[2]);
        assert!(io < periph);
        assert!(periph < core);
        // DDR4 termination goes down last even though it came up second.
        assert!(core < ddr4);
    }

    #[test]
    fn all_powers_clock_before_fpga_cores() {
        let mut board = board();
        board.backend.clear_writes();
        set(&mut board, PowerDomain::All, 1).unwrap();

        let clock = first_high_write(&board, &RESERVED.pins[0]);
        let kup_core = first_high_write(&board, &POWER_CTRL.pins[0]);
        let zup_core = first_high_write(&board, &POWER_CTRL.pins[3]);
        assert!(clock < kup_core);
        assert!(clock < zup_core);
        assert_eq!(query(&board, PowerDomain::All).state, PowerState::On);
    }

    #[test]
    fn all_power_down_reverses_precedence() {
        let mut board = board();
        set(&mut board, PowerDomain::All, 1).unwrap();
        board.backend.clear_writes();
        set(&mut board, PowerDomain::All, 0).unwrap();

        let clock = first_low_write(&board, &RESERVED.pins[0]);
        for (group, idx) in [
            (&POWER_CTRL, 0usize),
            (&POWER_CTRL, 3),
            (&POWER_CTRL, 7),
            (&RESERVED, 1),
            (&RESERVED, 2),
        ] {
            assert!(first_low_write(&board, &group.pins[idx]) < clock);
        }
        assert_eq!(query(&board, PowerDomain::All).state, PowerState::Off);
    }

    #[test]
    fn firefly_mask_excludes_1v8() {
        let mut board = board();
        set(&mut board, PowerDomain::FireFly, 1).unwrap();
        let power = board.get(GpioGroup::PowerCtrl);
        assert_eq!(power & POWER_FIREFLY_P3V3, POWER_FIREFLY_P3V3);
        assert_eq!(power & POWER_FIREFLY_P1V8, 0);
    }

    #[test]
    fn clock_down_refused_while_ku15p_reserved() {
        let mut board = board();
        set(&mut board, PowerDomain::Ku15p, 1).unwrap();
        let reserved_before = board.get(GpioGroup::Reserved);

        let err = set(&mut board, PowerDomain::Clock, 0).unwrap_err();
        assert_eq!(err, PowerError::ClockDependentsPowered);
        // Nothing was mutated, in particular not the clock bit.
        assert_eq!(board.get(GpioGroup::Reserved), reserved_before);
    }

    #[test]
    fn clock_rmw_preserves_other_reserved_bits() {
        let mut board = board();
        set(&mut board, PowerDomain::Zu11eg, 1).unwrap();
        // Clock up is a read-modify-write; the ZU11EG bit must survive.
        set(&mut board, PowerDomain::Clock, 1).unwrap();
        assert_eq!(
            board.get(GpioGroup::Reserved),
            POWER_RESERVED_CLOCK_ZU11EG
        );
    }

    #[test]
    fn readback_failure_aborts_without_rollback() {
        let mut board = board();
        // The DDR4 termination enable is stuck low; core comes up, then the
        // sequence stops. No rollback of the core bit.
        board.backend.stick_low(Port::F, 0x10);
        let err = set(&mut board, PowerDomain::Ku15p, 1).unwrap_err();
        assert_eq!(
            err,
            PowerError::Readback {
                step: PowerStep::KupDdr4Term,
                power_up: true,
            }
        );
        assert_eq!(board.get(GpioGroup::PowerCtrl), POWER_KU15P_CORE);
        // The aborted state reads back as PARTIALLY ON.
        assert_eq!(query(&board, PowerDomain::Ku15p).state, PowerState::Partial);
    }

    #[test]
    fn query_reports_partial_mixtures() {
        let mut board = board();
        board.set(GpioGroup::PowerCtrl, POWER_KU15P_CORE);
        assert_eq!(query(&board, PowerDomain::Ku15p).state, PowerState::Partial);
        assert_eq!(query(&board, PowerDomain::All).state, PowerState::Partial);
        // FireFly only looks at its own power bit.
        assert_eq!(query(&board, PowerDomain::FireFly).state, PowerState::Off);
    }

    #[test]
    fn domain_names_resolve() {
        assert_eq!(PowerDomain::from_name("ALL"), Some(PowerDomain::All));
        assert_eq!(PowerDomain::from_name("kup"), Some(PowerDomain::Ku15p));
        assert_eq!(PowerDomain::from_name("zup"), Some(PowerDomain::Zu11eg));
        assert_eq!(PowerDomain::from_name("bogus"), None);
    }

    fn first_high_write(board: &Board<MockGpio>, pin: &crate::gpio::Pin) -> usize {
        find_write(board, pin, true)
    }

    fn first_low_write(board: &Board<MockGpio>, pin: &crate::gpio::Pin) -> usize {
        find_write(board, pin, false)
    }

    fn find_write(board: &Board<MockGpio>, pin: &crate::gpio::Pin, high: bool) -> usize {
        board
            .backend
            .writes
            .iter()
            .position(|w| w.port == pin.port && w.mask == pin.mask && w.high == high)
            .expect("expected write not recorded")
    }
}
