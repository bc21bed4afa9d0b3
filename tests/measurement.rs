use std::cell::RefCell;
use std::convert::Infallible;

use counter_multimeter::config::CounterConfig;
use counter_multimeter::hal::{GateTimer, Input, PinSelector, Prescaler};
use counter_multimeter::logger::LogType;
use counter_multimeter::report::{self, Command};
use counter_multimeter::testing::{Bench, BenchSelector, BenchTimer, Call, TextBuffer};
use counter_multimeter::{Counter, MeasureError, Range, Reading};
use embedded_hal_mock::pin::{Mock as PinMock, State as PinState, Transaction as PinTransaction};

/// Timer seeing the same pulse count on every gate
struct SteadyTimer {
    pulses: u32,
    elapsed: u32,
    gates: Vec<u32>,
    edges: Vec<(u32, u32)>,
    result: u32,
}

impl SteadyTimer {
    fn new(pulses: u32, elapsed: u32) -> Self {
        Self { pulses, elapsed, gates: Vec::new(), edges: Vec::new(), result: 0 }
    }
}

impl GateTimer for SteadyTimer {
    fn start_gate(&mut self, ms: u32) {
        self.gates.push(ms);
        self.result = self.pulses;
    }

    fn poll_gate(&mut self) -> nb::Result<u32, Infallible> {
        Ok(self.result)
    }

    fn start_edge_timing(&mut self, edges: u32, timeout_ms: u32) {
        self.edges.push((edges, timeout_ms));
        self.result = self.elapsed;
    }

    fn poll_edge_timing(&mut self) -> nb::Result<u32, Infallible> {
        Ok(self.result)
    }
}

fn pin(states: &[PinState]) -> PinMock {
    let transactions: Vec<PinTransaction> =
        states.iter().map(|s| PinTransaction::set(s.clone())).collect();
    PinMock::new(&transactions)
}

#[test]
fn manual_range_drives_multiplexer_pins() {
    use PinState::{High, Low};

    // TTL, LF /32 twice (before and during the sweep), then LF /8
    let ch = pin(&[Low, High, High, High]);
    let a = pin(&[Low, High, High, High]);
    let b = pin(&[Low, Low, Low, High]);
    let c = pin(&[Low, High, High, Low]);
    let selector = PinSelector::new(ch, a, b, c);
    let mut counter = Counter::new(SteadyTimer::new(100_000, 16_000), selector);

    let reading = counter.take_measurement(Range::Lf32MHz).unwrap();
    assert_eq!(reading, Reading { frequency: 32_000_000, aliasing_warning: false });

    let (timer, selector) = counter.release();
    assert_eq!(timer.gates, vec![100, 100]);
    assert_eq!(timer.edges, vec![(8_000, 2)]);

    let (mut ch, mut a, mut b, mut c) = selector.release();
    ch.done();
    a.done();
    b.done();
    c.done();
}

#[test]
fn range_none_leaves_hardware_alone() {
    let ch = pin(&[]);
    let a = pin(&[]);
    let b = pin(&[]);
    let c = pin(&[]);
    let selector = PinSelector::new(ch, a, b, c);
    let mut counter = Counter::new(SteadyTimer::new(1, 1), selector);

    assert_eq!(counter.take_measurement(Range::None), Ok(Reading::default()));

    let (timer, selector) = counter.release();
    assert!(timer.gates.is_empty());
    assert!(timer.edges.is_empty());
    let (mut ch, mut a, mut b, mut c) = selector.release();
    ch.done();
    a.done();
    b.done();
    c.done();
}

#[test]
fn auto_range_without_ttl_signal_uses_lf_policy() {
    let bench = RefCell::new(Bench::new());
    bench.borrow_mut().set_signal(0, 1_000_000);
    let mut counter = Counter::new(BenchTimer::new(&bench), BenchSelector::new(&bench));

    let reading = counter.take_measurement(Range::Auto).unwrap();
    assert_eq!(reading.frequency, 1_000_000);

    // 1MHz is below the pin limit, no divider needed
    assert_eq!((counter.input(), counter.prescaler()), (Input::LowFrequency, Prescaler::Div1));
    let bench = bench.borrow();
    let calls = bench.calls();
    assert_eq!(calls[calls.len() - 2], Call::Select(Input::LowFrequency, Prescaler::Div1));
}

#[test]
fn auto_range_scales_back_through_prescaler() {
    for &hz in &[6_000_000u32, 20_000_000, 50_000_000, 120_000_000] {
        let bench = RefCell::new(Bench::new());
        bench.borrow_mut().set_signal(0, hz);
        let mut counter = Counter::new(BenchTimer::new(&bench), BenchSelector::new(&bench));

        let reading = counter.take_measurement(Range::Auto).unwrap();
        let prescaler = counter.prescaler().divisor();
        assert!(hz / prescaler <= 4_000_000, "{} Hz through /{}", hz, prescaler);
        assert_eq!(reading.frequency % prescaler, 0);
        assert!(
            (reading.frequency as i64 - hz as i64).abs() <= prescaler as i64 * 2,
            "{} Hz measured as {}",
            hz,
            reading.frequency
        );
    }
}

#[test]
fn high_ttl_frequency_uses_gate_mode() {
    let bench = RefCell::new(Bench::new());
    bench.borrow_mut().set_signal(20_000_000, 0);
    let mut counter = Counter::new(BenchTimer::new(&bench), BenchSelector::new(&bench));

    let reading = counter.take_measurement(Range::Auto).unwrap();
    assert_eq!(reading.frequency, 20_000_000);
    assert_eq!(bench.borrow().calls().last(), Some(&Call::Gate(1)));
}

#[test]
fn slow_signal_recovers_from_optimistic_estimate() {
    let bench = RefCell::new(Bench::new());
    bench.borrow_mut().set_signal(1_000_000, 0);
    let mut counter = Counter::new(BenchTimer::new(&bench), BenchSelector::new(&bench));
    counter.select(Input::Ttl, Prescaler::Div1).unwrap();

    // four times too high: two timeouts before the edges arrive in time
    assert_eq!(counter.measure_frequency(3, 4_000_000), Ok(1_000_000));
    assert_eq!(bench.borrow().edge_count(), 3);
    let warnings = counter
        .log()
        .iter()
        .filter(|e| e.log_type == LogType::Warning)
        .count();
    assert_eq!(warnings, 2);
}

#[test]
fn serial_session_reports_readings_and_log() {
    let bench = RefCell::new(Bench::new());
    bench.borrow_mut().set_signal(0, 5_000_000);
    let config = CounterConfig { precision: 3, ..CounterConfig::default() };
    let mut counter =
        Counter::with_config(BenchTimer::new(&bench), BenchSelector::new(&bench), config);
    let mut out = TextBuffer::new();

    for &byte in b"03" {
        match Command::parse(byte).unwrap() {
            Command::Measure(range) => {
                let result = counter.take_measurement(range);
                report::write_reading(&mut out, range, &result).unwrap();
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
    assert_eq!(out.as_str(), "F none 0\r\nF lf4M 5000000 ALIAS\r\n");

    out.clear();
    counter.log().dump(&mut out, LogType::Warning).unwrap();
    assert!(out.as_str().contains("aliasing in lf4M: estimate 5000000 Hz"));

    assert_eq!(Command::parse(b'C'), Ok(Command::ClearLog));
    counter.log_mut().clear();
    assert!(counter.log().is_empty());

    let err = Command::parse(b'x').unwrap_err();
    out.clear();
    report::write_error(&mut out, &err).unwrap();
    assert_eq!(out.as_str(), "E 3 invalid range 120\r\n");
    assert_eq!(err, MeasureError::InvalidRange(b'x'));
}
