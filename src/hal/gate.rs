//! Gate timer primitive used by the measurement core

use core::convert::Infallible;

/// Hardware able to count input pulses and to time input edges.
///
/// The `start_*`/`poll_*` pairs follow the embedded-hal 0.2 `nb` pattern; the
/// provided `measure_*` methods block on them.
pub trait GateTimer {
    /// Reset the pulse counter and open a gate of `ms` milliseconds
    fn start_gate(&mut self, ms: u32);

    /// Pulses counted once the gate has closed
    fn poll_gate(&mut self) -> nb::Result<u32, Infallible>;

    /// Start timing how long `edges` input edges take, giving up after
    /// `timeout_ms` milliseconds
    fn start_edge_timing(&mut self, edges: u32, timeout_ms: u32);

    /// Elapsed time in units of two reference timer ticks, 0 on timeout
    fn poll_edge_timing(&mut self) -> nb::Result<u32, Infallible>;

    /// Count pulses during a gate of `ms` milliseconds
    fn measure_gate(&mut self, ms: u32) -> u32 {
        self.start_gate(ms);
        match nb::block!(self.poll_gate()) {
            Ok(pulses) => pulses,
            Err(never) => match never {},
        }
    }

    /// Time `edges` edges, returns 0 if they did not arrive within `timeout_ms`
    fn measure_edges_time(&mut self, edges: u32, timeout_ms: u32) -> u32 {
        self.start_edge_timing(edges, timeout_ms);
        match nb::block!(self.poll_edge_timing()) {
            Ok(elapsed) => elapsed,
            Err(never) => match never {},
        }
    }
}
