//! Gate timer on the ATmega128 counters
//!
//! Timer1 counts input pulses on T1 (PD6). Timer0 ticks once per millisecond
//! to close gates, Timer3 runs from the CPU clock to time edges. Overflows of
//! the 16-bit counters are collected by polling, which keeps up as long as
//! the pin stays below `MAX_INPUT_PIN_FREQ_HZ`.

use avr_device::atmega128a::{PORTD, TC0, TC1, TC3};
use core::convert::Infallible;

use super::overflow::WideCounter;
use super::GateTimer;
use crate::config::{CPU_FREQ_HZ, REF_TIMER_FREQ_HZ};

// Timer0: CTC, clk/64, 250 counts = 1ms at 16MHz
const TC0_CTC_DIV64: u8 = (1 << 3) | 0b100;
const TC0_TOP: u8 = (CPU_FREQ_HZ / 64 / 1000 - 1) as u8;
// Timer1: external clock on T1, rising edge
const TC1_EXT_RISING: u8 = 0b111;
// Timer3: clk/1
const TC3_DIV1: u8 = 0b001;

// TIFR
const OCF0: u8 = 1 << 1;
const TOV1: u8 = 1 << 2;
// ETIFR
const TOV3: u8 = 1 << 2;

const T1_PIN: u8 = 1 << 6;

const REF_TICKS_PER_MS: u32 = REF_TIMER_FREQ_HZ / 1000;

enum State {
    Idle,
    Gate { ms: u32, elapsed_ms: u32 },
    Edges { edges: u32, timeout_ticks: u32 },
}

pub struct CounterTimer {
    tc0: TC0,
    tc1: TC1,
    tc3: TC3,
    state: State,
    pulse_count: WideCounter,
    ref_count: WideCounter,
}

impl CounterTimer {
    pub fn new(tc0: TC0, tc1: TC1, tc3: TC3, portd: &PORTD) -> Self {
        // T1 as input without pull-up
        portd.ddrd.modify(|r, w| unsafe { w.bits(r.bits() & !T1_PIN) });
        portd.portd.modify(|r, w| unsafe { w.bits(r.bits() & !T1_PIN) });

        tc0.tccr0.write(|w| unsafe { w.bits(0) });
        tc1.tccr1a.write(|w| unsafe { w.bits(0) });
        tc1.tccr1b.write(|w| unsafe { w.bits(0) });
        tc3.tccr3a.write(|w| unsafe { w.bits(0) });
        tc3.tccr3b.write(|w| unsafe { w.bits(0) });

        Self {
            tc0,
            tc1,
            tc3,
            state: State::Idle,
            pulse_count: WideCounter::new(),
            ref_count: WideCounter::new(),
        }
    }

    /// Hand the timers back
    pub fn release(mut self) -> (TC0, TC1, TC3) {
        self.stop();
        (self.tc0, self.tc1, self.tc3)
    }

    fn start_pulse_count(&mut self) {
        self.tc1.tccr1b.write(|w| unsafe { w.bits(0) });
        self.tc1.tcnt1.write(|w| unsafe { w.bits(0) });
        self.tc1.tifr.write(|w| unsafe { w.bits(TOV1) });
        self.pulse_count.reset();
        self.tc1.tccr1b.write(|w| unsafe { w.bits(TC1_EXT_RISING) });
    }

    fn pulses(&mut self) -> u32 {
        let count = self.tc1.tcnt1.read().bits();
        let overflowed = self.tc1.tifr.read().bits() & TOV1 != 0;
        let (pulses, consumed) = self.pulse_count.extend(count, overflowed);
        if consumed {
            self.tc1.tifr.write(|w| unsafe { w.bits(TOV1) });
        }
        pulses
    }

    fn ref_ticks(&mut self) -> u32 {
        let count = self.tc3.tcnt3.read().bits();
        let overflowed = self.tc3.etifr.read().bits() & TOV3 != 0;
        let (ticks, consumed) = self.ref_count.extend(count, overflowed);
        if consumed {
            self.tc3.etifr.write(|w| unsafe { w.bits(TOV3) });
        }
        ticks
    }

    fn stop(&mut self) {
        self.tc0.tccr0.write(|w| unsafe { w.bits(0) });
        self.tc1.tccr1b.write(|w| unsafe { w.bits(0) });
        self.tc3.tccr3b.write(|w| unsafe { w.bits(0) });
        self.state = State::Idle;
    }
}

impl GateTimer for CounterTimer {
    fn start_gate(&mut self, ms: u32) {
        self.tc0.tccr0.write(|w| unsafe { w.bits(0) });
        self.tc0.tcnt0.write(|w| unsafe { w.bits(0) });
        self.tc0.ocr0.write(|w| unsafe { w.bits(TC0_TOP) });
        self.tc0.tifr.write(|w| unsafe { w.bits(OCF0) });
        self.state = State::Gate { ms, elapsed_ms: 0 };
        self.start_pulse_count();
        self.tc0.tccr0.write(|w| unsafe { w.bits(TC0_CTC_DIV64) });
    }

    fn poll_gate(&mut self) -> nb::Result<u32, Infallible> {
        let tick = self.tc0.tifr.read().bits() & OCF0 != 0;
        if tick {
            self.tc0.tifr.write(|w| unsafe { w.bits(OCF0) });
        }
        let open = match self.state {
            State::Gate { ms, ref mut elapsed_ms } => {
                *elapsed_ms += u32::from(tick);
                *elapsed_ms < ms
            }
            _ => return Ok(0),
        };
        if open {
            // keep the overflow count current while the gate is open
            self.pulses();
            return Err(nb::Error::WouldBlock);
        }
        self.stop();
        Ok(self.pulses())
    }

    fn start_edge_timing(&mut self, edges: u32, timeout_ms: u32) {
        self.tc3.tccr3b.write(|w| unsafe { w.bits(0) });
        self.tc3.tcnt3.write(|w| unsafe { w.bits(0) });
        self.tc3.etifr.write(|w| unsafe { w.bits(TOV3) });
        self.ref_count.reset();
        self.state = State::Edges {
            edges,
            timeout_ticks: timeout_ms.saturating_mul(REF_TICKS_PER_MS),
        };
        self.start_pulse_count();
        self.tc3.tccr3b.write(|w| unsafe { w.bits(TC3_DIV1) });
    }

    fn poll_edge_timing(&mut self) -> nb::Result<u32, Infallible> {
        let (edges, timeout_ticks) = match self.state {
            State::Edges { edges, timeout_ticks } => (edges, timeout_ticks),
            _ => return Ok(0),
        };
        let ticks = self.ref_ticks();
        if self.pulses() >= edges {
            self.stop();
            // reported in pairs of reference ticks
            return Ok((ticks / 2).max(1));
        }
        if ticks >= timeout_ticks {
            self.stop();
            return Ok(0);
        }
        Err(nb::Error::WouldBlock)
    }
}
