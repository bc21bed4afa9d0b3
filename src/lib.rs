//! Frequency counter firmware for an ATmega128 based multimeter
//!
//! The measurement core (`counter`) only talks to hardware through the
//! `hal::GateTimer` and `hal::InputSelector` traits, so it runs unchanged on
//! the AVR and against the `testing` bench on a host.
#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod counter;
pub mod error;
pub mod hal;
pub mod logger;
pub mod report;
pub mod testing;

pub use counter::{Counter, Range, Reading};
pub use error::MeasureError;
