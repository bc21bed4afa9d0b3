//! Serial console commands and measurement reports
//!
//! The caller sends one ASCII byte per request: `'0'`..`'7'` is a range
//! code, `'L'` dumps the measurement log, `'C'` clears it. Every measurement
//! is answered with one line:
//!
//! ```text
//! F <range> <hz>[ ALIAS]
//! E <code> <message>
//! ```

use ufmt::{uWrite, uwrite};

use crate::counter::{Range, Reading};
use crate::error::MeasureError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Measure(Range),
    DumpLog,
    ClearLog,
}

impl Command {
    pub fn parse(byte: u8) -> Result<Self, MeasureError> {
        match byte {
            b'L' | b'l' => Ok(Command::DumpLog),
            b'C' | b'c' => Ok(Command::ClearLog),
            b'0'..=b'9' => Range::try_from(byte - b'0').map(Command::Measure),
            _ => Err(MeasureError::InvalidRange(byte)),
        }
    }
}

pub fn write_reading<W>(
    w: &mut W,
    range: Range,
    result: &Result<Reading, MeasureError>,
) -> Result<(), W::Error>
where
    W: uWrite + ?Sized,
{
    match result {
        Ok(reading) => {
            uwrite!(w, "F {} {}", range, reading.frequency)?;
            if reading.aliasing_warning {
                w.write_str(" ALIAS")?;
            }
            w.write_str("\r\n")
        }
        Err(err) => write_error(w, err),
    }
}

pub fn write_error<W>(w: &mut W, err: &MeasureError) -> Result<(), W::Error>
where
    W: uWrite + ?Sized,
{
    uwrite!(w, "E {} {}", err.code(), *err)?;
    w.write_str("\r\n")
}
