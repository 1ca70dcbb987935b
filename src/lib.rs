#![cfg_attr(not(test), no_std)]

//! Hardware test firmware for the MCU on a trigger-processor command module.
//!
//! The library is host-testable: all board logic runs against the
//! [`hal::GpioBackend`] trait, with an in-memory implementation in [`mock`]
//! and the TM4C1290 register implementation behind the `board` feature.

pub mod board_pins;
pub mod command;
pub mod gpio;
pub mod hal;
pub mod mock;
pub mod power_control;
pub mod status_led;

#[cfg(feature = "board")]
pub mod tm4c_hal_impl;
