use ufmt::{uDisplay, uWrite, Formatter};

use super::{scale, Counter};
use crate::config::CounterConfig;
use crate::error::MeasureError;
use crate::hal::{GateTimer, Input, InputSelector, Prescaler};
use crate::logger::Event;

/// Measurement range requested by the caller
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Range {
    /// No measurement
    None,
    /// Pick input and prescaler from the estimates
    Auto,
    /// TTL input, up to 4MHz
    Ttl4MHz,
    /// LF input without divider, up to 4MHz
    Lf4MHz,
    /// LF input /4, up to 16MHz
    Lf16MHz,
    /// LF input /8, up to 32MHz
    Lf32MHz,
    /// LF input /16, up to 64MHz
    Lf64MHz,
    /// LF input /32, up to 128MHz
    Lf128MHz,
}

impl Range {
    /// Manual ranges from lowest to highest ceiling
    pub const MANUAL: [Range; 6] = [
        Range::Ttl4MHz,
        Range::Lf4MHz,
        Range::Lf16MHz,
        Range::Lf32MHz,
        Range::Lf64MHz,
        Range::Lf128MHz,
    ];

    pub fn code(self) -> u8 {
        match self {
            Range::None => 0,
            Range::Auto => 1,
            Range::Ttl4MHz => 2,
            Range::Lf4MHz => 3,
            Range::Lf16MHz => 4,
            Range::Lf32MHz => 5,
            Range::Lf64MHz => 6,
            Range::Lf128MHz => 7,
        }
    }

    /// Input and prescaler a manual range is wired to
    pub fn binding(self) -> Option<(Input, Prescaler)> {
        match self {
            Range::None | Range::Auto => None,
            Range::Ttl4MHz => Some((Input::Ttl, Prescaler::Div1)),
            Range::Lf4MHz => Some((Input::LowFrequency, Prescaler::Div1)),
            Range::Lf16MHz => Some((Input::LowFrequency, Prescaler::Div4)),
            Range::Lf32MHz => Some((Input::LowFrequency, Prescaler::Div8)),
            Range::Lf64MHz => Some((Input::LowFrequency, Prescaler::Div16)),
            Range::Lf128MHz => Some((Input::LowFrequency, Prescaler::Div32)),
        }
    }

    /// Full scale of a manual range in Hz
    pub fn ceiling_hz(self) -> Option<u32> {
        match self {
            Range::None | Range::Auto => None,
            Range::Ttl4MHz | Range::Lf4MHz => Some(4_000_000),
            Range::Lf16MHz => Some(16_000_000),
            Range::Lf32MHz => Some(32_000_000),
            Range::Lf64MHz => Some(64_000_000),
            Range::Lf128MHz => Some(128_000_000),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Range::None => "none",
            Range::Auto => "auto",
            Range::Ttl4MHz => "ttl4M",
            Range::Lf4MHz => "lf4M",
            Range::Lf16MHz => "lf16M",
            Range::Lf32MHz => "lf32M",
            Range::Lf64MHz => "lf64M",
            Range::Lf128MHz => "lf128M",
        }
    }
}

impl TryFrom<u8> for Range {
    type Error = MeasureError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Range::None),
            1 => Ok(Range::Auto),
            2..=7 => Ok(Range::MANUAL[(code - 2) as usize]),
            _ => Err(MeasureError::InvalidRange(code)),
        }
    }
}

impl uDisplay for Range {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        f.write_str(self.name())
    }
}

/// Result of `Counter::take_measurement`
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Reading {
    /// Measured frequency in Hz
    pub frequency: u32,
    /// The estimate exceeded the ceiling of the requested manual range, the
    /// reading may be aliased
    pub aliasing_warning: bool,
}

/// Smallest prescaler bringing `estimate` under the pin limit, or the
/// highest one if none does
fn optimal_prescaler_for(config: &CounterConfig, input: Input, estimate: u32) -> Prescaler {
    match input {
        Input::Ttl => Prescaler::Div1,
        Input::LowFrequency => {
            let mut prescaler = Prescaler::LOWEST_LF;
            while estimate / prescaler.divisor() > config.max_input_pin_freq_hz
                && prescaler != Prescaler::HIGHEST_LF
            {
                prescaler = prescaler.higher();
            }
            prescaler
        }
    }
}

impl<T: GateTimer, S: InputSelector> Counter<T, S> {
    /// Best prescaler for `estimate` on the selected input
    pub fn optimal_prescaler(&self, estimate: u32) -> Prescaler {
        optimal_prescaler_for(&self.config, self.input, estimate)
    }

    /// Measure the signal in `range`.
    ///
    /// Both inputs are estimated first. `Auto` prefers the TTL input and falls
    /// back to the LF input with the optimal prescaler when TTL is silent.
    /// The estimate handed to the precision stage is the frequency at the
    /// counter pin, the result is scaled back by the prescaler.
    pub fn take_measurement(&mut self, range: Range) -> Result<Reading, MeasureError> {
        if range == Range::None {
            return Ok(Reading::default());
        }

        self.select(Input::Ttl, Prescaler::Div1)?;
        let estimate_ttl = self.estimate()?;
        self.select(Input::LowFrequency, Prescaler::HIGHEST_LF)?;
        let estimate_lf = self.estimate()?;

        let (input, prescaler) = match range.binding() {
            Some(binding) => binding,
            None if estimate_ttl == 0 => (
                Input::LowFrequency,
                optimal_prescaler_for(&self.config, Input::LowFrequency, estimate_lf),
            ),
            None => (Input::Ttl, Prescaler::Div1),
        };
        let estimate = match input {
            Input::Ttl => estimate_ttl,
            Input::LowFrequency => estimate_lf,
        };

        // the TTL input counts undivided and is never flagged
        let aliasing_warning = input == Input::LowFrequency
            && range.ceiling_hz().map_or(false, |ceiling| estimate > ceiling);
        if aliasing_warning {
            self.log.record(Event::Aliasing { range, estimate });
        }

        self.select(input, prescaler)?;
        let divisor = prescaler.divisor();
        let frequency = scale(
            self.measure_frequency(self.config.precision, estimate / divisor)?,
            divisor,
        );
        self.log.record(Event::Measurement { range, hz: frequency });

        Ok(Reading { frequency, aliasing_warning })
    }
}
