//! Output pins on PORTB driving the input multiplexer

use avr_device::atmega128a::PORTB;
use core::convert::Infallible;
use embedded_hal::digital::v2::OutputPin;

/// PORTB pin `P` configured as push-pull output
pub struct PortBOutput<const P: u8> {
    _private: (),
}

impl<const P: u8> PortBOutput<P> {
    pub fn new() -> Self {
        unsafe {
            let p = PORTB::ptr();
            (*p).ddrb.modify(|r, w| w.bits(r.bits() | (1 << P)));
            (*p).portb.modify(|r, w| w.bits(r.bits() & !(1 << P)));
        }
        Self { _private: () }
    }
}

impl<const P: u8> Default for PortBOutput<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const P: u8> OutputPin for PortBOutput<P> {
    type Error = Infallible;

    #[inline]
    fn set_high(&mut self) -> Result<(), Infallible> {
        // single pin, read-modify-write of the shared port register
        unsafe {
            (*PORTB::ptr()).portb.modify(|r, w| w.bits(r.bits() | (1 << P)));
        }
        Ok(())
    }

    #[inline]
    fn set_low(&mut self) -> Result<(), Infallible> {
        unsafe {
            (*PORTB::ptr()).portb.modify(|r, w| w.bits(r.bits() & !(1 << P)));
        }
        Ok(())
    }
}

/// Multiplexer wiring of the counter board
pub mod board {
    use super::PortBOutput;

    pub type ChannelSelect = PortBOutput<4>;
    pub type TapA = PortBOutput<5>;
    pub type TapB = PortBOutput<6>;
    pub type TapC = PortBOutput<7>;
}
