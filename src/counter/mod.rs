//! Adaptive frequency measurement core
//!
//! `Counter` owns the gate timer, the input multiplexer and the current
//! input selection. A measurement runs in three stages:
//!
//! 1. [`Counter::estimate`] takes a rough reading on the selected input,
//! 2. [`Counter::take_measurement`] picks input and prescaler for a range,
//! 3. [`Counter::measure_frequency`] chooses gate or edge timing to reach
//!    the requested precision.

mod estimate;
mod precision;
mod range;

pub use precision::Plan;
pub use range::{Range, Reading};

use crate::config::{CounterConfig, LOG_CAPACITY};
use crate::error::MeasureError;
use crate::hal::{GateTimer, Input, InputSelector, Prescaler};
use crate::logger::{Event, Logger};

pub struct Counter<T, S> {
    timer: T,
    selector: S,
    input: Input,
    prescaler: Prescaler,
    config: CounterConfig,
    log: Logger<LOG_CAPACITY>,
}

impl<T: GateTimer, S: InputSelector> Counter<T, S> {
    /// Create a counter with the default configuration.
    ///
    /// The hardware is not touched until the first measurement, which always
    /// selects its input before sampling.
    pub fn new(timer: T, selector: S) -> Self {
        Self::with_config(timer, selector, CounterConfig::default())
    }

    pub fn with_config(timer: T, selector: S, config: CounterConfig) -> Self {
        Self {
            timer,
            selector,
            input: Input::Ttl,
            prescaler: Prescaler::Div1,
            config,
            log: Logger::new(),
        }
    }

    /// Route `input` through `prescaler` to the counter pin
    pub fn select(&mut self, input: Input, prescaler: Prescaler) -> Result<(), MeasureError> {
        // TTL has no divider chain
        let prescaler = match input {
            Input::Ttl => Prescaler::Div1,
            Input::LowFrequency => prescaler,
        };
        self.selector
            .select_input(input, prescaler)
            .map_err(|_| MeasureError::InputSelect)?;
        self.input = input;
        self.prescaler = prescaler;
        self.log.record(Event::Selected { input, prescaler });
        Ok(())
    }

    #[inline]
    pub fn input(&self) -> Input {
        self.input
    }

    #[inline]
    pub fn prescaler(&self) -> Prescaler {
        self.prescaler
    }

    #[inline]
    pub fn config(&self) -> &CounterConfig {
        &self.config
    }

    pub fn log(&self) -> &Logger<LOG_CAPACITY> {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut Logger<LOG_CAPACITY> {
        &mut self.log
    }

    pub fn release(self) -> (T, S) {
        (self.timer, self.selector)
    }
}

/// `value * factor`, saturating at `u32::MAX`
#[inline]
fn scale(value: u32, factor: u32) -> u32 {
    value.saturating_mul(factor)
}

/// Narrow a 64 bit intermediate back to a frequency
#[inline]
fn narrow(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
