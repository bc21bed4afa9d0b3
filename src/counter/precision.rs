use super::{narrow, Counter};
use crate::config::{CounterConfig, MAX_PRECISION};
use crate::error::MeasureError;
use crate::hal::{GateTimer, InputSelector};
use crate::logger::Event;

/// Edge count divisor; `estimate / 500` edges arrive in 2 ms
const EDGES_DIVISOR: u32 = 500;

/// How a single sampling attempt is taken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    /// Count pulses during a gate of `ms` milliseconds
    Gate { ms: u32 },
    /// Time `edges` edges, giving up after `timeout_ms`
    Edges { edges: u32, timeout_ms: u32 },
}

impl Plan {
    /// Pick the sampling mode for `estimate` at `precision` digits.
    ///
    /// Unknown or very fast signals are gate counted. Everything slower than
    /// the reference timer is edge timed, which reaches the same resolution
    /// in much less time.
    pub fn new(config: &CounterConfig, precision: u8, estimate: u32) -> Self {
        let resolution = resolution(precision);
        let max_ms = config.max_gate_ms.max(1);
        let ref_hz = config.ref_timer_freq_hz.max(1);

        if estimate == 0 || estimate >= ref_hz {
            let ms = if estimate > 0 {
                resolution / estimate as u64
            } else {
                config.sample_ms as u64
            };
            Plan::Gate { ms: clamp_ms(ms, max_ms) }
        } else {
            let ms = clamp_ms(resolution / ref_hz as u64, max_ms);
            let edges = narrow((estimate / EDGES_DIVISOR) as u64 * ms as u64).max(1);
            Plan::Edges { edges, timeout_ms: ms.saturating_mul(2) }
        }
    }
}

/// Working resolution, `10^precision * 1000`
fn resolution(precision: u8) -> u64 {
    10u64.pow(precision as u32) * 1000
}

/// Sampling windows are at least 1 ms and never longer than `max_ms`
fn clamp_ms(ms: u64, max_ms: u32) -> u32 {
    narrow(ms).clamp(1, max_ms)
}

impl<T: GateTimer, S: InputSelector> Counter<T, S> {
    /// Measure the selected input to `precision` significant digits.
    ///
    /// `estimate` is the expected frequency at the counter pin, 0 if unknown.
    /// An edge timing timeout means the signal is slower than estimated: the
    /// estimate is halved and the mode decided again, until a sample succeeds,
    /// the estimate reaches 0 (gate mode) or the retry budget runs out.
    pub fn measure_frequency(&mut self, precision: u8, estimate: u32) -> Result<u32, MeasureError> {
        if precision > MAX_PRECISION {
            return Err(MeasureError::InvalidPrecision(precision));
        }

        let mut estimate = estimate;
        let mut retries = 0u8;
        loop {
            match Plan::new(&self.config, precision, estimate) {
                Plan::Gate { ms } => {
                    let pulses = self.timer.measure_gate(ms);
                    self.log.record(Event::GateSample { ms, pulses });
                    return Ok(narrow(pulses as u64 * 1000 / ms as u64));
                }
                Plan::Edges { edges, timeout_ms } => {
                    let elapsed = self.timer.measure_edges_time(edges, timeout_ms);
                    self.log.record(Event::EdgeSample { edges, timeout_ms, elapsed });
                    if elapsed != 0 {
                        // elapsed counts pairs of reference ticks
                        let ref_hz = self.config.ref_timer_freq_hz as u64;
                        return Ok(narrow(edges as u64 * ref_hz / (elapsed as u64 * 2)));
                    }
                    if retries >= self.config.max_edge_retries {
                        return Err(MeasureError::EstimateTooHigh { estimate });
                    }
                    retries += 1;
                    estimate >>= 1;
                    self.log.record(Event::EdgeTimeout { estimate });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Bench, BenchSelector, BenchTimer, Call};
    use core::cell::RefCell;

    const REF: u32 = 16_000_000;

    fn counter(bench: &RefCell<Bench>) -> Counter<BenchTimer<'_>, BenchSelector<'_>> {
        Counter::new(BenchTimer::new(bench), BenchSelector::new(bench))
    }

    #[test]
    fn mode_follows_estimate_for_every_precision() {
        let config = CounterConfig::default();
        for precision in 0..=6 {
            for &estimate in &[1, 499, 500, 2_000_000, REF - 1] {
                assert!(
                    matches!(Plan::new(&config, precision, estimate), Plan::Edges { .. }),
                    "precision {} estimate {}",
                    precision,
                    estimate
                );
            }
            for &estimate in &[0, REF, REF + 1, u32::MAX] {
                assert!(
                    matches!(Plan::new(&config, precision, estimate), Plan::Gate { .. }),
                    "precision {} estimate {}",
                    precision,
                    estimate
                );
            }
        }
    }

    #[test]
    fn unknown_signal_uses_default_window() {
        let config = CounterConfig::default();
        assert_eq!(Plan::new(&config, 3, 0), Plan::Gate { ms: 100 });
    }

    #[test]
    fn gate_window_scales_with_precision() {
        let config = CounterConfig::default();
        assert_eq!(Plan::new(&config, 6, 20_000_000), Plan::Gate { ms: 50 });
        // 10^3 * 1000 / 20MHz rounds down to 0 and is clamped
        assert_eq!(Plan::new(&config, 3, 20_000_000), Plan::Gate { ms: 1 });
        // very high precision is capped
        assert_eq!(Plan::new(&config, 9, 16_000_000), Plan::Gate { ms: 10_000 });
    }

    #[test]
    fn zero_length_edge_window_is_clamped() {
        let config = CounterConfig::default();
        assert_eq!(
            Plan::new(&config, 3, 2_000_000),
            Plan::Edges { edges: 4_000, timeout_ms: 2 }
        );
        assert_eq!(
            Plan::new(&config, 6, 2_000_000),
            Plan::Edges { edges: 4_000 * 62, timeout_ms: 124 }
        );
    }

    #[test]
    fn slow_signals_time_at_least_one_edge() {
        let config = CounterConfig::default();
        assert_eq!(Plan::new(&config, 3, 100), Plan::Edges { edges: 1, timeout_ms: 2 });
    }

    #[test]
    fn gate_result_converts_counts_to_hz() {
        let bench = RefCell::new(Bench::new());
        bench.borrow_mut().script_gate(&[123_456]);
        let mut counter = counter(&bench);

        assert_eq!(counter.measure_frequency(6, 20_000_000), Ok(123_456 * 1000 / 50));
        assert_eq!(bench.borrow().calls(), &[Call::Gate(50)]);
    }

    #[test]
    fn gate_result_without_estimate() {
        let bench = RefCell::new(Bench::new());
        bench.borrow_mut().script_gate(&[777]);
        let mut counter = counter(&bench);

        assert_eq!(counter.measure_frequency(3, 0), Ok(7_770));
    }

    #[test]
    fn edge_result_compensates_doubled_window() {
        let bench = RefCell::new(Bench::new());
        bench.borrow_mut().script_edges(&[16_000]);
        let mut counter = counter(&bench);

        assert_eq!(
            counter.measure_frequency(3, 2_000_000),
            Ok((4_000u64 * REF as u64 / 32_000) as u32)
        );
        assert_eq!(
            bench.borrow().calls(),
            &[Call::Edges { edges: 4_000, timeout_ms: 2 }]
        );
    }

    #[test]
    fn timeout_halves_estimate_and_retries() {
        let bench = RefCell::new(Bench::new());
        bench.borrow_mut().script_edges(&[0, 0, 5_000]);
        let mut counter = counter(&bench);

        assert_eq!(counter.measure_frequency(3, 2_000_000), Ok(1_600_000));
        assert_eq!(
            bench.borrow().calls(),
            &[
                Call::Edges { edges: 4_000, timeout_ms: 2 },
                Call::Edges { edges: 2_000, timeout_ms: 2 },
                Call::Edges { edges: 1_000, timeout_ms: 2 },
            ]
        );
    }

    #[test]
    fn repeated_timeouts_fall_back_to_gate_mode() {
        let bench = RefCell::new(Bench::new());
        bench.borrow_mut().script_gate(&[42]);
        let mut counter = counter(&bench);

        // no signal at all: every edge timing times out until the estimate
        // reaches zero after 21 halvings
        assert_eq!(counter.measure_frequency(3, 2_000_000), Ok(420));
        let bench = bench.borrow();
        assert_eq!(bench.edge_count(), 21);
        assert_eq!(bench.gate_count(), 1);
        assert_eq!(bench.calls().last(), Some(&Call::Gate(100)));
    }

    #[test]
    fn retry_budget_is_enforced() {
        let bench = RefCell::new(Bench::new());
        let config = CounterConfig {
            max_edge_retries: 2,
            ..CounterConfig::default()
        };
        let mut counter =
            Counter::with_config(BenchTimer::new(&bench), BenchSelector::new(&bench), config);

        assert_eq!(
            counter.measure_frequency(3, 2_000_000),
            Err(MeasureError::EstimateTooHigh { estimate: 500_000 })
        );
        assert_eq!(bench.borrow().edge_count(), 3);
    }

    #[test]
    fn precision_beyond_working_unit_is_rejected() {
        let bench = RefCell::new(Bench::new());
        let mut counter = counter(&bench);

        assert_eq!(
            counter.measure_frequency(10, 1_000),
            Err(MeasureError::InvalidPrecision(10))
        );
        assert!(bench.borrow().calls().is_empty());
    }

    #[test]
    fn decisions_are_logged() {
        let bench = RefCell::new(Bench::new());
        bench.borrow_mut().script_edges(&[0, 8_000]);
        let mut counter = counter(&bench);

        counter.measure_frequency(3, 2_000_000).unwrap();
        let events: Vec<Event> = counter.log().iter().map(|e| e.event).collect();
        assert_eq!(
            events,
            vec![
                Event::EdgeSample { edges: 4_000, timeout_ms: 2, elapsed: 0 },
                Event::EdgeTimeout { estimate: 1_000_000 },
                Event::EdgeSample { edges: 2_000, timeout_ms: 2, elapsed: 8_000 },
            ]
        );
    }
}
