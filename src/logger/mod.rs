//! Measurement event log
//!
//! A fixed-size ring of the most recent measurement decisions, kept in RAM
//! and written out over the serial console on request.

use ufmt::{uDisplay, uWrite, uwrite, uwriteln, Formatter};

use crate::counter::Range;
use crate::hal::{Input, Prescaler};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogType {
    Debug = 0,
    Info = 1,
    Warning = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Selected { input: Input, prescaler: Prescaler },
    Estimate { input: Input, prescaler: Prescaler, hz: u32 },
    GateSample { ms: u32, pulses: u32 },
    EdgeSample { edges: u32, timeout_ms: u32, elapsed: u32 },
    /// Edge timing timed out, retrying with the halved estimate
    EdgeTimeout { estimate: u32 },
    Aliasing { range: Range, estimate: u32 },
    Measurement { range: Range, hz: u32 },
}

impl Event {
    pub fn log_type(&self) -> LogType {
        match self {
            Event::Selected { .. } | Event::GateSample { .. } | Event::EdgeSample { .. } => {
                LogType::Debug
            }
            Event::Estimate { .. } | Event::Measurement { .. } => LogType::Info,
            Event::EdgeTimeout { .. } | Event::Aliasing { .. } => LogType::Warning,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub sequence: u32,
    pub log_type: LogType,
    pub event: Event,
}

pub struct Logger<const N: usize> {
    buffer: [Option<LogEntry>; N],
    next: usize,
    sequence: u32,
}

impl<const N: usize> Logger<N> {
    pub const fn new() -> Self {
        Self {
            buffer: [None; N],
            next: 0,
            sequence: 0,
        }
    }

    /// Append an event, overwriting the oldest one when full
    pub fn record(&mut self, event: Event) {
        if N == 0 {
            return;
        }
        self.buffer[self.next] = Some(LogEntry {
            sequence: self.sequence,
            log_type: event.log_type(),
            event,
        });
        self.next = (self.next + 1) % N;
        self.sequence = self.sequence.wrapping_add(1);
    }

    /// Entries from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> + '_ {
        (0..N).filter_map(move |i| self.buffer[(self.next + i) % N].as_ref())
    }

    pub fn latest(&self) -> Option<&LogEntry> {
        if N == 0 {
            return None;
        }
        self.buffer[(self.next + N - 1) % N].as_ref()
    }

    pub fn len(&self) -> usize {
        self.buffer.iter().filter(|e| e.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of events recorded since the last clear
    pub fn recorded(&self) -> u32 {
        self.sequence
    }

    pub fn clear(&mut self) {
        self.buffer = [None; N];
        self.next = 0;
        self.sequence = 0;
    }

    /// Write every entry at or above `min` as one line
    pub fn dump<W>(&self, w: &mut W, min: LogType) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        for entry in self.iter().filter(|e| e.log_type as u8 >= min as u8) {
            uwriteln!(w, "{}", *entry)?;
        }
        Ok(())
    }
}

impl<const N: usize> Default for Logger<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl uDisplay for LogType {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        f.write_str(match self {
            LogType::Debug => "DBG",
            LogType::Info => "INF",
            LogType::Warning => "WRN",
        })
    }
}

impl uDisplay for Event {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        match *self {
            Event::Selected { input, prescaler } => uwrite!(f, "select {} {}", input, prescaler),
            Event::Estimate { input, prescaler, hz } => {
                uwrite!(f, "estimate {} {} {} Hz", input, prescaler, hz)
            }
            Event::GateSample { ms, pulses } => uwrite!(f, "gate {} ms: {} pulses", ms, pulses),
            Event::EdgeSample { edges, timeout_ms, elapsed } => uwrite!(
                f,
                "edges {} within {} ms: elapsed {}",
                edges,
                timeout_ms,
                elapsed
            ),
            Event::EdgeTimeout { estimate } => uwrite!(f, "timeout, retry at {} Hz", estimate),
            Event::Aliasing { range, estimate } => {
                uwrite!(f, "aliasing in {}: estimate {} Hz", range, estimate)
            }
            Event::Measurement { range, hz } => uwrite!(f, "result {} {} Hz", range, hz),
        }
    }
}

impl uDisplay for LogEntry {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        uwrite!(f, "[{}] #{} {}", self.log_type, self.sequence, self.event)
    }
}
