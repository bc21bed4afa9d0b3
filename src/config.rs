//! Configuration constants for the frequency counter firmware

/// CPU frequency in Hz, taken from the build script
pub const CPU_FREQ_HZ: u32 = parse_hz(env!("MCU_FREQ_HZ"));

/// UART baud rate
pub const UART_BAUD: u32 = 9600;

/// Clock of the timer used for edge timing, in Hz
pub const REF_TIMER_FREQ_HZ: u32 = CPU_FREQ_HZ;

/// Gate window used for estimates and unknown signals, in milliseconds
pub const DEFAULT_SAMPLE_MS: u32 = 100;

/// Pulses per millisecond at which the LF prescaler sweep stops (500kHz)
pub const ESTIMATE_THRESHOLD_PER_MS: u32 = 500;

/// Highest frequency the counter input pin can follow after the prescaler
pub const MAX_INPUT_PIN_FREQ_HZ: u32 = 4_000_000;

/// Significant digits requested by `Counter::take_measurement`
pub const DEFAULT_PRECISION: u8 = 3;

/// Highest precision accepted by `Counter::measure_frequency`
pub const MAX_PRECISION: u8 = 9;

/// Upper bound of a single gate window in milliseconds
pub const MAX_GATE_MS: u32 = 10_000;

/// Estimate halvings allowed after edge timing timeouts
pub const MAX_EDGE_RETRIES: u8 = 32;

/// Number of entries kept by the measurement log
#[cfg(feature = "debug")]
pub const LOG_CAPACITY: usize = 32;
#[cfg(not(feature = "debug"))]
pub const LOG_CAPACITY: usize = 16;

/// Runtime tunables of the measurement core.
///
/// `Default` mirrors the constants above; the firmware never changes them,
/// tests use them to exercise limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterConfig {
    pub ref_timer_freq_hz: u32,
    pub sample_ms: u32,
    pub estimate_threshold_per_ms: u32,
    pub max_input_pin_freq_hz: u32,
    pub precision: u8,
    pub max_gate_ms: u32,
    pub max_edge_retries: u8,
}

impl CounterConfig {
    pub const fn new() -> Self {
        Self {
            ref_timer_freq_hz: REF_TIMER_FREQ_HZ,
            sample_ms: DEFAULT_SAMPLE_MS,
            estimate_threshold_per_ms: ESTIMATE_THRESHOLD_PER_MS,
            max_input_pin_freq_hz: MAX_INPUT_PIN_FREQ_HZ,
            precision: DEFAULT_PRECISION,
            max_gate_ms: MAX_GATE_MS,
            max_edge_retries: MAX_EDGE_RETRIES,
        }
    }
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self::new()
    }
}

const fn parse_hz(s: &str) -> u32 {
    let bytes = s.as_bytes();
    let mut value = 0u32;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b < b'0' || b > b'9' {
            panic!("MCU_FREQ_HZ must be a decimal number");
        }
        value = value * 10 + (b - b'0') as u32;
        i += 1;
    }
    value
}
