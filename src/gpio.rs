//! GPIO pin descriptors and bitfield pin groups.
//!
//! A [`Pin`] is an immutable, statically allocated descriptor; all live state
//! sits in the hardware registers behind a [`GpioBackend`]. A [`PinGroup`] is
//! an ordered list of pins read and written atomically as an integer
//! bitfield, bit 0 being the first listed pin.

use defmt::Format;

use crate::hal::GpioBackend;

/// GPIO ports of the TM4C1290 (no ports I and O).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Format)]
pub enum Port {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    J,
    K,
    L,
    M,
    N,
    P,
    Q,
}

pub const NUM_PORTS: usize = 15;

impl Port {
    /// Index of this port in the peripheral clock gating register (bit 0 =
    /// port A .. bit 14 = port Q).
    pub const fn index(self) -> usize {
        self as usize
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Format)]
pub enum Direction {
    Input,
    Output,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Format)]
pub enum DriveStrength {
    Ma2,
    Ma4,
    Ma8,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Format)]
pub enum PinType {
    /// Standard push-pull with digital function enabled.
    Std,
    OpenDrain,
    PullUp,
    PullDown,
}

/// Interrupt trigger configuration. No ISRs are installed by this crate; the
/// descriptor still models the trigger so the backend can program it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Format)]
pub enum IntTrigger {
    None,
    RisingEdge,
    FallingEdge,
    BothEdges,
}

/// Immutable descriptor of one GPIO pin.
#[derive(Debug, Format)]
pub struct Pin {
    pub port: Port,
    /// Bit mask of the pin within its port (exactly one bit set).
    pub mask: u8,
    pub strength: DriveStrength,
    pub pin_type: PinType,
    pub direction: Direction,
    pub int_trigger: IntTrigger,
}

/// Errors at the single-pin layer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Format)]
pub enum GpioError {
    /// Attempted to drive a pin that is configured as an input.
    InvalidDirection,
}

impl Pin {
    pub const fn output(port: Port, mask: u8) -> Self {
        Self {
            port,
            mask,
            strength: DriveStrength::Ma2,
            pin_type: PinType::Std,
            direction: Direction::Output,
            int_trigger: IntTrigger::None,
        }
    }

    pub const fn input(port: Port, mask: u8) -> Self {
        Self {
            port,
            mask,
            strength: DriveStrength::Ma2,
            pin_type: PinType::Std,
            direction: Direction::Input,
            int_trigger: IntTrigger::None,
        }
    }

    /// Configures the pin exactly as declared. Must be called before any
    /// `set`/`get`. Idempotent.
    pub fn init<B: GpioBackend>(&self, backend: &mut B) {
        backend.configure(self);
    }

    /// Drives the output level. Only valid for output pins; driving an input
    /// pin is a programming error and is rejected explicitly.
    pub fn set<B: GpioBackend>(&self, backend: &mut B, high: bool) -> Result<(), GpioError> {
        match self.direction {
            Direction::Output => {
                backend.write(self, high);
                Ok(())
            }
            Direction::Input => Err(GpioError::InvalidDirection),
        }
    }

    /// Reads the current level: the driven level for output pins (so stuck-at
    /// faults are observable), the sensed level for input pins.
    pub fn get<B: GpioBackend>(&self, backend: &B) -> bool {
        match self.direction {
            Direction::Output => backend.read_output(self),
            Direction::Input => backend.read_input(self),
        }
    }
}

/// A named, ordered list of pins accessed as one integer bitfield.
pub struct PinGroup {
    pub name: &'static str,
    /// Bit position i of a group value maps to `pins[i]`.
    pub pins: &'static [Pin],
}

impl PinGroup {
    /// Initializes every constituent pin, in list order.
    pub fn init<B: GpioBackend>(&self, backend: &mut B) {
        for pin in self.pins {
            pin.init(backend);
        }
    }

    /// Writes `value` to the group, bit i to `pins[i]`.
    ///
    /// Bits that map to input pins are write-ignored: the underlying `set`
    /// rejects them and the group write carries on. A `set` followed by a
    /// `get` therefore need not reproduce `value` at those bit positions.
    /// This mirrors the board's mixed control/status groups and is intended
    /// behavior.
    pub fn set<B: GpioBackend>(&self, backend: &mut B, value: u32) {
        for (i, pin) in self.pins.iter().enumerate() {
            let _ = pin.set(backend, value & (1 << i) != 0);
        }
    }

    /// Reads the group value, OR-accumulating `get(pins[i]) << i`.
    pub fn get<B: GpioBackend>(&self, backend: &B) -> u32 {
        let mut value = 0;
        for (i, pin) in self.pins.iter().enumerate() {
            value |= (pin.get(backend) as u32) << i;
        }
        value
    }

    /// True if no constituent pin is an output, i.e. writes never take
    /// effect and the console rejects them up front.
    pub fn is_read_only(&self) -> bool {
        self.pins.iter().all(|p| p.direction == Direction::Input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockGpio;

    static OUT_PAIR: PinGroup = PinGroup {
        name: "out-pair",
        pins: &[Pin::output(Port::M, 0x01), Pin::output(Port::M, 0x02)],
    };

    static MIXED: PinGroup = PinGroup {
        name: "mixed",
        pins: &[
            Pin::output(Port::K, 0x40),
            Pin::input(Port::K, 0x20),
            Pin::input(Port::K, 0x80),
        ],
    };

    static IN_ONLY: PinGroup = PinGroup {
        name: "in-only",
        pins: &[Pin::input(Port::N, 0x08)],
    };

    #[test]
    fn set_on_input_pin_is_rejected() {
        let mut b = MockGpio::new();
        IN_ONLY.init(&mut b);
        assert_eq!(
            IN_ONLY.pins[0].set(&mut b, true),
            Err(GpioError::InvalidDirection)
        );
    }

    #[test]
    fn group_set_then_get_round_trips_output_bits() {
        let mut b = MockGpio::new();
        OUT_PAIR.init(&mut b);
        for v in 0..4 {
            OUT_PAIR.set(&mut b, v);
            assert_eq!(OUT_PAIR.get(&b), v);
        }
    }

    #[test]
    fn group_set_ignores_input_bits() {
        let mut b = MockGpio::new();
        MIXED.init(&mut b);
        // Write all three bits; only bit 0 maps to an output pin.
        MIXED.set(&mut b, 0x7);
        assert_eq!(MIXED.get(&b), 0x1);
        // Input bits come from the sensed level, regardless of writes.
        b.set_input(Port::K, 0x80, true);
        assert_eq!(MIXED.get(&b), 0x5);
        MIXED.set(&mut b, 0x0);
        assert_eq!(MIXED.get(&b), 0x4);
    }

    #[test]
    fn read_only_detection() {
        assert!(IN_ONLY.is_read_only());
        assert!(!MIXED.is_read_only());
        assert!(!OUT_PAIR.is_read_only());
    }

    #[test]
    fn output_get_reads_driven_level() {
        let mut b = MockGpio::new();
        OUT_PAIR.init(&mut b);
        // A stuck-low driver is observable through get().
        b.stick_low(Port::M, 0x01);
        OUT_PAIR.set(&mut b, 0x3);
        assert_eq!(OUT_PAIR.get(&b), 0x2);
    }
}
