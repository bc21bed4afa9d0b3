//! 32-bit extension of the free-running 16-bit hardware counters

/// Overflow bookkeeping for one 16-bit counter.
///
/// The counter value must be read before the overflow flag. A set flag next
/// to a value in the lower half means the wrap happened before the read and
/// belongs to this reading. In the upper half the wrap came after the read,
/// so the flag is left pending for the next poll.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WideCounter {
    overflows: u32,
}

impl WideCounter {
    pub const fn new() -> Self {
        Self { overflows: 0 }
    }

    pub fn reset(&mut self) {
        self.overflows = 0;
    }

    /// Extend `count` to 32 bits. The second value tells whether the
    /// overflow flag was consumed and has to be cleared in hardware.
    pub fn extend(&mut self, count: u16, overflowed: bool) -> (u32, bool) {
        let consumed = overflowed && count < 0x8000;
        if consumed {
            self.overflows = self.overflows.wrapping_add(1);
        }
        (self.overflows << 16 | u32::from(count), consumed)
    }
}
