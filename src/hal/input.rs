//! Counter input channels, prescalers and the input multiplexer

use embedded_hal::digital::v2::OutputPin;
use ufmt::{uDisplay, uWrite, uwrite, Formatter};

/// Physical input feeding the counting hardware
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Input {
    /// High speed TTL input, wired straight to the counter pin
    Ttl,
    /// Low frequency analog front end with a ripple divider in front of it
    LowFrequency,
}

/// Divider placed between the input and the counter pin.
///
/// Only the LF input has a divider chain, the TTL input always uses `Div1`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Prescaler {
    Div1 = 1,
    Div2 = 2,
    Div4 = 4,
    Div8 = 8,
    Div16 = 16,
    Div32 = 32,
}

impl Prescaler {
    pub const LOWEST_LF: Prescaler = Prescaler::Div1;
    pub const HIGHEST_LF: Prescaler = Prescaler::Div32;

    #[inline]
    pub fn divisor(self) -> u32 {
        self as u32
    }

    /// Next smaller divider, saturating at `Div1`
    pub fn lower(self) -> Self {
        match self {
            Prescaler::Div1 | Prescaler::Div2 => Prescaler::Div1,
            Prescaler::Div4 => Prescaler::Div2,
            Prescaler::Div8 => Prescaler::Div4,
            Prescaler::Div16 => Prescaler::Div8,
            Prescaler::Div32 => Prescaler::Div16,
        }
    }

    /// Next larger divider, saturating at `HIGHEST_LF`
    pub fn higher(self) -> Self {
        match self {
            Prescaler::Div1 => Prescaler::Div2,
            Prescaler::Div2 => Prescaler::Div4,
            Prescaler::Div4 => Prescaler::Div8,
            Prescaler::Div8 => Prescaler::Div16,
            Prescaler::Div16 | Prescaler::Div32 => Prescaler::Div32,
        }
    }

    /// Divider tap index on the mux select lines (log2 of the divisor)
    #[inline]
    pub fn tap(self) -> u8 {
        self.divisor().trailing_zeros() as u8
    }
}

impl uDisplay for Input {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        match self {
            Input::Ttl => f.write_str("ttl"),
            Input::LowFrequency => f.write_str("lf"),
        }
    }
}

impl uDisplay for Prescaler {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        uwrite!(f, "/{}", self.divisor())
    }
}

/// Routes one input through one prescaler to the counter pin.
///
/// The selection must be in effect when the call returns.
pub trait InputSelector {
    type Error;

    fn select_input(&mut self, input: Input, prescaler: Prescaler) -> Result<(), Self::Error>;
}

/// Input multiplexer driven by GPIOs.
///
/// `channel` low selects the TTL input, high the LF input. `a`, `b` and `c`
/// carry the divider tap (bit 0 to bit 2); they are driven low for TTL.
pub struct PinSelector<CH, A, B, C> {
    channel: CH,
    a: A,
    b: B,
    c: C,
}

impl<CH, A, B, C, E> PinSelector<CH, A, B, C>
where
    CH: OutputPin<Error = E>,
    A: OutputPin<Error = E>,
    B: OutputPin<Error = E>,
    C: OutputPin<Error = E>,
{
    pub fn new(channel: CH, a: A, b: B, c: C) -> Self {
        Self { channel, a, b, c }
    }

    pub fn release(self) -> (CH, A, B, C) {
        (self.channel, self.a, self.b, self.c)
    }
}

fn drive<P: OutputPin>(pin: &mut P, high: bool) -> Result<(), P::Error> {
    if high {
        pin.set_high()
    } else {
        pin.set_low()
    }
}

impl<CH, A, B, C, E> InputSelector for PinSelector<CH, A, B, C>
where
    CH: OutputPin<Error = E>,
    A: OutputPin<Error = E>,
    B: OutputPin<Error = E>,
    C: OutputPin<Error = E>,
{
    type Error = E;

    fn select_input(&mut self, input: Input, prescaler: Prescaler) -> Result<(), E> {
        let tap = match input {
            Input::Ttl => 0,
            Input::LowFrequency => prescaler.tap(),
        };
        // Set the divider tap before switching the channel so the counter
        // never sees the LF input through a stale tap.
        drive(&mut self.a, tap & 0x01 != 0)?;
        drive(&mut self.b, tap & 0x02 != 0)?;
        drive(&mut self.c, tap & 0x04 != 0)?;
        drive(&mut self.channel, input == Input::LowFrequency)
    }
}
