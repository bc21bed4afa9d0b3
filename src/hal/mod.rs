pub mod gate;
pub mod input;
pub mod overflow;

#[cfg(target_arch = "avr")]
pub mod gpio;
#[cfg(target_arch = "avr")]
pub mod timer;
#[cfg(target_arch = "avr")]
pub mod uart;

// Re-export commonly used types
pub use gate::GateTimer;
pub use input::{Input, InputSelector, PinSelector, Prescaler};
pub use overflow::WideCounter;

#[cfg(target_arch = "avr")]
pub use timer::CounterTimer;
#[cfg(target_arch = "avr")]
pub use uart::Uart;
