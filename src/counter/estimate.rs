use super::{narrow, scale, Counter};
use crate::error::MeasureError;
use crate::hal::{GateTimer, Input, InputSelector, Prescaler};
use crate::logger::Event;

impl<T: GateTimer, S: InputSelector> Counter<T, S> {
    /// Rough frequency of the signal on the selected input, 0 without signal.
    ///
    /// The LF input is swept from the highest prescaler down so a fast signal
    /// is never undersampled. The sweep stops once the pin sees more than the
    /// threshold rate or the lowest prescaler is reached.
    pub fn estimate(&mut self) -> Result<u32, MeasureError> {
        let sample_ms = self.config.sample_ms.max(1);
        let (pulses, prescaler) = match self.input {
            Input::Ttl => (self.timer.measure_gate(sample_ms), Prescaler::Div1),
            Input::LowFrequency => {
                let threshold = sample_ms.saturating_mul(self.config.estimate_threshold_per_ms);
                let mut prescaler = Prescaler::HIGHEST_LF;
                loop {
                    self.select(Input::LowFrequency, prescaler)?;
                    let pulses = self.timer.measure_gate(sample_ms);
                    if prescaler == Prescaler::LOWEST_LF || pulses >= threshold {
                        break (pulses, prescaler);
                    }
                    prescaler = prescaler.lower();
                }
            }
        };

        let hz = narrow(pulses as u64 * 1000 / sample_ms as u64);
        let hz = scale(hz, prescaler.divisor());
        self.log.record(Event::Estimate { input: self.input, prescaler, hz });
        Ok(hz)
    }
}
