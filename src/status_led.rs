//! Synchronizes the CM status LEDs with the power rails.
//!
//! Called after every console command that can change GPIO or power state.
//! Each LED is updated in its own read-modify-write pass so a stuck LED
//! driver cannot corrupt the neighbouring bits.

use crate::board_pins::{Board, GpioGroup};
use crate::hal::GpioBackend;
use crate::power_control::{
    POWER_KU15P, POWER_RESERVED_CLOCK, POWER_RESERVED_KU15P, POWER_RESERVED_ZU11EG, POWER_ZU11EG,
};

pub const LED_CM_STATUS_CLOCK: u32 = 0x01;
pub const LED_CM_STATUS_KU15P: u32 = 0x02;
pub const LED_CM_STATUS_ZU11EG: u32 = 0x04;
pub const LED_CM_STATUS_TEMP_ALERT: u32 = 0x08;

/// Recomputes the status LEDs from the power control and reserved groups.
///
/// A domain LED is lit only when the domain is fully up: the clock LED
/// follows the clock reserved bit, the KU15P and ZU11EG LEDs require any of
/// their power bits and their reserved bit. The temperature alert LED has no
/// data source yet and is always cleared.
pub fn update<B: GpioBackend>(board: &mut Board<B>) {
    let mut leds = board.get(GpioGroup::LedCmStatus);
    if board.get(GpioGroup::Reserved) & POWER_RESERVED_CLOCK != 0 {
        leds |= LED_CM_STATUS_CLOCK;
    } else {
        leds &= !LED_CM_STATUS_CLOCK;
    }
    board.set(GpioGroup::LedCmStatus, leds);

    let mut leds = board.get(GpioGroup::LedCmStatus);
    if board.get(GpioGroup::PowerCtrl) & POWER_KU15P != 0
        && board.get(GpioGroup::Reserved) & POWER_RESERVED_KU15P != 0
    {
        leds |= LED_CM_STATUS_KU15P;
    } else {
        leds &= !LED_CM_STATUS_KU15P;
    }
    board.set(GpioGroup::LedCmStatus, leds);

    let mut leds = board.get(GpioGroup::LedCmStatus);
    if board.get(GpioGroup::PowerCtrl) & POWER_ZU11EG != 0
        && board.get(GpioGroup::Reserved) & POWER_RESERVED_ZU11EG != 0
    {
        leds |= LED_CM_STATUS_ZU11EG;
    } else {
        leds &= !LED_CM_STATUS_ZU11EG;
    }
    board.set(GpioGroup::LedCmStatus, leds);

    // TODO: drive the alert bit from the I2C temperature sensors once they
    // are wired into the firmware.
    leds &= !LED_CM_STATUS_TEMP_ALERT;
    board.set(GpioGroup::LedCmStatus, leds);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board_pins::BoardConfig;
    use crate::mock::MockGpio;
    use crate::power_control::{set, PowerDomain};

    fn board() -> Board<MockGpio> {
        let mut board = Board::new(MockGpio::new(), BoardConfig::default());
        board.init_all();
        board
    }

    #[test]
    fn all_leds_off_at_boot() {
        let mut board = board();
        update(&mut board);
        assert_eq!(board.get(GpioGroup::LedCmStatus), 0x0);
    }

    #[test]
    fn leds_follow_power_domains() {
        let mut board = board();

        set(&mut board, PowerDomain::Ku15p, 1).unwrap();
        update(&mut board);
        assert_eq!(
            board.get(GpioGroup::LedCmStatus),
            LED_CM_STATUS_CLOCK | LED_CM_STATUS_KU15P
        );

        set(&mut board, PowerDomain::Zu11eg, 1).unwrap();
        update(&mut board);
        assert_eq!(
            board.get(GpioGroup::LedCmStatus),
            LED_CM_STATUS_CLOCK | LED_CM_STATUS_KU15P | LED_CM_STATUS_ZU11EG
        );

        set(&mut board, PowerDomain::Ku15p, 0).unwrap();
        update(&mut board);
        assert_eq!(
            board.get(GpioGroup::LedCmStatus),
            LED_CM_STATUS_CLOCK | LED_CM_STATUS_ZU11EG
        );
    }

    #[test]
    fn clock_led_stays_on_after_fpga_power_down() {
        let mut board = board();
        set(&mut board, PowerDomain::Ku15p, 1).unwrap();
        set(&mut board, PowerDomain::Ku15p, 0).unwrap();
        update(&mut board);
        assert_eq!(board.get(GpioGroup::LedCmStatus), LED_CM_STATUS_CLOCK);
    }

    #[test]
    fn temp_alert_led_is_cleared() {
        let mut board = board();
        board.set(GpioGroup::LedCmStatus, LED_CM_STATUS_TEMP_ALERT);
        update(&mut board);
        assert_eq!(
            board.get(GpioGroup::LedCmStatus) & LED_CM_STATUS_TEMP_ALERT,
            0
        );
    }

    #[test]
    fn firefly_has_no_led() {
        let mut board = board();
        set(&mut board, PowerDomain::FireFly, 1).unwrap();
        update(&mut board);
        assert_eq!(board.get(GpioGroup::LedCmStatus), 0x0);
    }
}
