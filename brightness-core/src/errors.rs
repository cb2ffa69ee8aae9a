//! Error handling.

use core::fmt;

/// Reasons for rejecting a brightness curve.
///
/// All of them are configuration errors: they are detected when the curve is
/// built, never while evaluating it.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Error {
    EmptyCurve,
    DuplicateIlluminance,
    InvalidIlluminance,
    BrightnessOutOfRange,
    TooManyBreakpoints,
}

impl Error {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyCurve => "Curve: at least one breakpoint is required",
            Self::DuplicateIlluminance => "Curve: two breakpoints share the same illuminance",
            Self::InvalidIlluminance => "Curve: illuminance must be finite and non-negative",
            Self::BrightnessOutOfRange => "Curve: brightness must be between 0 and 100",
            Self::TooManyBreakpoints => "Curve: too many breakpoints",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::error::Error for Error {}
