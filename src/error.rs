//! Error kinds reported by the measurement core

use ufmt::{uDisplay, uWrite, uwrite, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureError {
    /// Edge timing kept timing out and the retry budget ran out before the
    /// estimate dropped to zero
    EstimateTooHigh { estimate: u32 },
    /// More significant digits than the working unit can hold
    InvalidPrecision(u8),
    /// Range code received from the caller does not exist
    InvalidRange(u8),
    /// The input multiplexer refused the selection
    InputSelect,
}

impl MeasureError {
    /// Short numeric code for the serial report
    pub fn code(&self) -> u8 {
        match self {
            MeasureError::EstimateTooHigh { .. } => 1,
            MeasureError::InvalidPrecision(_) => 2,
            MeasureError::InvalidRange(_) => 3,
            MeasureError::InputSelect => 4,
        }
    }
}

impl uDisplay for MeasureError {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        match *self {
            MeasureError::EstimateTooHigh { estimate } => {
                uwrite!(f, "estimate too high ({} Hz)", estimate)
            }
            MeasureError::InvalidPrecision(digits) => uwrite!(f, "invalid precision {}", digits),
            MeasureError::InvalidRange(code) => uwrite!(f, "invalid range {}", code),
            MeasureError::InputSelect => f.write_str("input select failed"),
        }
    }
}
