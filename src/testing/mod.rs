//! Test bench for running the measurement core without hardware
//!
//! `Bench` plays both the gate timer and the input multiplexer. Results come
//! from scripted values when some are queued, otherwise from a simulated
//! signal on each input. Every hardware call is recorded in order.

use core::cell::RefCell;
use core::convert::Infallible;

use ufmt::uWrite;

use crate::config::REF_TIMER_FREQ_HZ;
use crate::hal::{GateTimer, Input, InputSelector, Prescaler};

const SCRIPT_CAPACITY: usize = 32;
const CALL_CAPACITY: usize = 128;

/// Hardware call seen by the bench
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Call {
    Select(Input, Prescaler),
    Gate(u32),
    Edges { edges: u32, timeout_ms: u32 },
}

struct Script {
    values: [u32; SCRIPT_CAPACITY],
    head: usize,
    len: usize,
}

impl Script {
    const fn new() -> Self {
        Self {
            values: [0; SCRIPT_CAPACITY],
            head: 0,
            len: 0,
        }
    }

    fn push(&mut self, value: u32) {
        assert!(
            self.len < SCRIPT_CAPACITY,
            "bench script holds at most {} values",
            SCRIPT_CAPACITY
        );
        self.values[(self.head + self.len) % SCRIPT_CAPACITY] = value;
        self.len += 1;
    }

    fn pop(&mut self) -> Option<u32> {
        if self.len == 0 {
            return None;
        }
        let value = self.values[self.head];
        self.head = (self.head + 1) % SCRIPT_CAPACITY;
        self.len -= 1;
        Some(value)
    }
}

pub struct Bench {
    ttl_hz: u32,
    lf_hz: u32,
    ref_hz: u32,
    input: Input,
    prescaler: Prescaler,
    gate_script: Script,
    edge_script: Script,
    calls: [Call; CALL_CAPACITY],
    call_len: usize,
    gates: usize,
    edge_timings: usize,
    busy_polls: u8,
    pending_polls: u8,
    pending: u32,
    fail_selection: bool,
}

impl Bench {
    pub const fn new() -> Self {
        Self {
            ttl_hz: 0,
            lf_hz: 0,
            ref_hz: REF_TIMER_FREQ_HZ,
            input: Input::Ttl,
            prescaler: Prescaler::Div1,
            gate_script: Script::new(),
            edge_script: Script::new(),
            calls: [Call::Gate(0); CALL_CAPACITY],
            call_len: 0,
            gates: 0,
            edge_timings: 0,
            busy_polls: 0,
            pending_polls: 0,
            pending: 0,
            fail_selection: false,
        }
    }

    /// Signal present on the TTL and LF inputs, 0 for none
    pub fn set_signal(&mut self, ttl_hz: u32, lf_hz: u32) {
        self.ttl_hz = ttl_hz;
        self.lf_hz = lf_hz;
    }

    /// Queue pulse counts returned by the next gates
    pub fn script_gate(&mut self, pulses: &[u32]) {
        pulses.iter().for_each(|&p| self.gate_script.push(p));
    }

    /// Queue elapsed times returned by the next edge timings, 0 is a timeout
    pub fn script_edges(&mut self, elapsed: &[u32]) {
        elapsed.iter().for_each(|&e| self.edge_script.push(e));
    }

    /// Report `WouldBlock` this many times before each result
    pub fn set_busy_polls(&mut self, polls: u8) {
        self.busy_polls = polls;
    }

    /// Make the multiplexer reject every selection
    pub fn fail_selection(&mut self, fail: bool) {
        self.fail_selection = fail;
    }

    pub fn selection(&self) -> (Input, Prescaler) {
        (self.input, self.prescaler)
    }

    /// Recorded calls in order
    pub fn calls(&self) -> &[Call] {
        &self.calls[..self.call_len]
    }

    pub fn clear_calls(&mut self) {
        self.call_len = 0;
        self.gates = 0;
        self.edge_timings = 0;
    }

    pub fn gate_count(&self) -> usize {
        self.gates
    }

    pub fn edge_count(&self) -> usize {
        self.edge_timings
    }

    fn push_call(&mut self, call: Call) {
        assert!(
            self.call_len < CALL_CAPACITY,
            "bench call log holds at most {} calls, clear it between phases",
            CALL_CAPACITY
        );
        self.calls[self.call_len] = call;
        self.call_len += 1;
    }

    /// Frequency at the counter pin for the current selection
    fn pin_hz(&self) -> u32 {
        match self.input {
            Input::Ttl => self.ttl_hz,
            Input::LowFrequency => self.lf_hz / self.prescaler.divisor(),
        }
    }

    fn simulate_gate(&self, ms: u32) -> u32 {
        (self.pin_hz() as u64 * ms as u64 / 1000) as u32
    }

    fn simulate_edges(&self, edges: u32, timeout_ms: u32) -> u32 {
        let hz = self.pin_hz() as u64;
        if hz == 0 || edges as u64 * 1000 > hz * timeout_ms as u64 {
            return 0;
        }
        ((edges as u64 * self.ref_hz as u64 / (2 * hz)) as u32).max(1)
    }

    fn start(&mut self, result: u32) {
        self.pending = result;
        self.pending_polls = self.busy_polls;
    }

    fn poll(&mut self) -> nb::Result<u32, Infallible> {
        if self.pending_polls > 0 {
            self.pending_polls -= 1;
            return Err(nb::Error::WouldBlock);
        }
        Ok(self.pending)
    }
}

impl Default for Bench {
    fn default() -> Self {
        Self::new()
    }
}

/// Gate timer side of a shared `Bench`
pub struct BenchTimer<'a> {
    bench: &'a RefCell<Bench>,
}

impl<'a> BenchTimer<'a> {
    pub fn new(bench: &'a RefCell<Bench>) -> Self {
        Self { bench }
    }
}

impl GateTimer for BenchTimer<'_> {
    fn start_gate(&mut self, ms: u32) {
        let mut bench = self.bench.borrow_mut();
        bench.push_call(Call::Gate(ms));
        bench.gates += 1;
        let pulses = match bench.gate_script.pop() {
            Some(pulses) => pulses,
            None => bench.simulate_gate(ms),
        };
        bench.start(pulses);
    }

    fn poll_gate(&mut self) -> nb::Result<u32, Infallible> {
        self.bench.borrow_mut().poll()
    }

    fn start_edge_timing(&mut self, edges: u32, timeout_ms: u32) {
        let mut bench = self.bench.borrow_mut();
        bench.push_call(Call::Edges { edges, timeout_ms });
        bench.edge_timings += 1;
        let elapsed = match bench.edge_script.pop() {
            Some(elapsed) => elapsed,
            None => bench.simulate_edges(edges, timeout_ms),
        };
        bench.start(elapsed);
    }

    fn poll_edge_timing(&mut self) -> nb::Result<u32, Infallible> {
        self.bench.borrow_mut().poll()
    }
}

/// Input multiplexer side of a shared `Bench`
pub struct BenchSelector<'a> {
    bench: &'a RefCell<Bench>,
}

impl<'a> BenchSelector<'a> {
    pub fn new(bench: &'a RefCell<Bench>) -> Self {
        Self { bench }
    }
}

/// Selection rejected by the bench
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rejected;

impl InputSelector for BenchSelector<'_> {
    type Error = Rejected;

    fn select_input(&mut self, input: Input, prescaler: Prescaler) -> Result<(), Rejected> {
        let mut bench = self.bench.borrow_mut();
        if bench.fail_selection {
            return Err(Rejected);
        }
        bench.push_call(Call::Select(input, prescaler));
        bench.input = input;
        bench.prescaler = prescaler;
        Ok(())
    }
}

/// Fixed-size text sink for checking serial output
pub struct TextBuffer {
    bytes: [u8; 512],
    len: usize,
}

impl TextBuffer {
    pub const fn new() -> Self {
        Self {
            bytes: [0; 512],
            len: 0,
        }
    }

    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.bytes[..self.len]).unwrap_or("")
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// The buffer is full
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Overflow;

impl uWrite for TextBuffer {
    type Error = Overflow;

    fn write_str(&mut self, s: &str) -> Result<(), Overflow> {
        let end = self.len + s.len();
        if end > self.bytes.len() {
            return Err(Overflow);
        }
        self.bytes[self.len..end].copy_from_slice(s.as_bytes());
        self.len = end;
        Ok(())
    }
}
