use crate::constants::VALUE_FIELD_SIZE;
use num_enum::{FromPrimitive, IntoPrimitive};
use std::fmt;
use strum_macros::Display;
use tracing::{debug, trace};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Offset of the numeric window inside a value field
const NUMBER_OFFSET: usize = 2;
/// Width of the numeric window
const NUMBER_WIDTH: usize = 6;
/// Offset of the multiplier character
const MULTIPLIER_OFFSET: usize = 8;

/// Physical quantity shown on one of the meter's displays.
///
/// `Display` renders the unit symbol; use [`Unit::coupling`] for the AC/DC suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Unit {
    #[default]
    #[strum(to_string = "UNK")]
    Unknown,
    #[strum(to_string = "V")]
    VoltAc,
    #[strum(to_string = "V")]
    VoltDc,
    #[strum(to_string = "A")]
    AmpereAc,
    #[strum(to_string = "A")]
    AmpereDc,
    #[strum(to_string = "Ohm")]
    Ohm,
    #[strum(to_string = "F")]
    Farad,
    #[strum(to_string = "Hz")]
    Hertz,
    #[strum(to_string = "LOGIC")]
    Logic,
    #[strum(to_string = "DIODE")]
    Diode,
    #[strum(to_string = "°C")]
    Celsius,
    #[strum(to_string = "°F")]
    Fahrenheit,
    #[strum(to_string = "RH")]
    RelativeHumidity,
    #[strum(to_string = "Pa")]
    Pascal,
    #[strum(to_string = "Psi")]
    Psi,
}

impl Unit {
    /// "AC" or "DC" for voltage and current, `None` for everything else.
    pub fn coupling(&self) -> Option<&'static str> {
        match self {
            Unit::VoltAc | Unit::AmpereAc => Some("AC"),
            Unit::VoltDc | Unit::AmpereDc => Some("DC"),
            _ => None,
        }
    }

    /// Resolve the unit of a value field.
    ///
    /// The first byte selects a category. Blank and `O`/`R` descriptors are
    /// shared by several modes and need the unit text at bytes 8..12.
    pub fn from_field(field: &[u8; VALUE_FIELD_SIZE]) -> Self {
        let text_at = |offset: usize, pattern: &[u8]| field[offset..].starts_with(pattern);

        match field[0] {
            b' ' => {
                let mut unit = Unit::Unknown;
                if text_at(9, b"Hz") {
                    unit = Unit::Hertz;
                }
                if text_at(8, b"@C") {
                    unit = Unit::Celsius;
                }
                if text_at(8, b"@F") {
                    unit = Unit::Fahrenheit;
                }
                if text_at(9, b"Pa") {
                    unit = Unit::Pascal;
                }
                if text_at(8, b"Vdc") {
                    unit = Unit::VoltDc;
                }
                unit
            }
            b'A' | b'C' => Unit::VoltAc,
            b'B' | b'D' => Unit::VoltDc,
            b'E' => Unit::Ohm,
            b'G' => Unit::Diode,
            b'H' => Unit::Farad,
            b'I' | b'K' => Unit::AmpereAc,
            b'J' | b'L' => Unit::AmpereDc,
            b'M' => Unit::Logic,
            b'O' => {
                if text_at(8, b"@F") {
                    Unit::Fahrenheit
                } else if text_at(8, b"@C") {
                    Unit::Celsius
                } else {
                    Unit::Unknown
                }
            }
            b'P' => Unit::RelativeHumidity,
            b'Q' => Unit::Psi,
            b'R' => {
                if text_at(9, b"Adc") {
                    Unit::AmpereDc
                } else if text_at(9, b"Aac") {
                    Unit::AmpereAc
                } else {
                    Unit::Unknown
                }
            }
            other => {
                debug!(descriptor = %char::from(other), "unknown unit descriptor");
                Unit::Unknown
            }
        }
    }
}

/// Decimal range prefix, tagged with the character the meter sends for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, IntoPrimitive, FromPrimitive)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum Multiplier {
    Nano = b'n',
    Micro = b'u',
    Milli = b'm',
    #[default]
    None = b' ',
    Kilo = b'k',
    Mega = b'M',
}

impl Multiplier {
    pub fn tag(&self) -> char {
        char::from(u8::from(*self))
    }

    pub fn factor(&self) -> f64 {
        match self {
            Multiplier::Nano => 1e-9,
            Multiplier::Micro => 1e-6,
            Multiplier::Milli => 1e-3,
            Multiplier::None => 1.0,
            Multiplier::Kilo => 1e3,
            Multiplier::Mega => 1e6,
        }
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// One channel of a value record.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Measurement {
    /// Magnitude as shown on the display, before applying the multiplier
    pub value: f32,
    pub unit: Unit,
    pub multiplier: Multiplier,
}

impl Measurement {
    /// Decode a 12-byte value field.
    ///
    /// `decimal_separator` is accepted as the radix in addition to `.`.
    /// Never fails: an unrecognized descriptor decodes as [`Unit::Unknown`]
    /// and a window without digits as 0.0.
    pub fn decode(field: &[u8; VALUE_FIELD_SIZE], decimal_separator: char) -> Self {
        trace!(field = hex::encode(field), "decoding value field");

        let window = &field[NUMBER_OFFSET..NUMBER_OFFSET + NUMBER_WIDTH];
        let value = parse_magnitude(window, decimal_separator);
        let multiplier = Multiplier::from_primitive(field[MULTIPLIER_OFFSET]);
        let unit = Unit::from_field(field);

        Self {
            value,
            unit,
            multiplier,
        }
    }

    /// Value in base units (multiplier applied)
    pub fn scaled_value(&self) -> f64 {
        self.value as f64 * self.multiplier.factor()
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3} {}{}", self.value, self.multiplier, self.unit)?;
        if let Some(coupling) = self.unit.coupling() {
            write!(f, " {}", coupling)?;
        }
        Ok(())
    }
}

/// Parse the leading decimal number of `window`.
///
/// Leading blanks are skipped, an optional sign and one radix (`.` or
/// `separator`) are accepted, parsing stops at the first other character.
/// A window without digits yields 0.0.
pub(crate) fn parse_magnitude(window: &[u8], separator: char) -> f32 {
    let mut chars = window
        .iter()
        .map(|&b| char::from(b))
        .skip_while(|c| c.is_ascii_whitespace())
        .peekable();

    let mut text = String::with_capacity(window.len());
    if let Some(&sign @ ('+' | '-')) = chars.peek() {
        text.push(sign);
        chars.next();
    }

    let mut digits = 0;
    let mut seen_radix = false;
    for c in chars {
        if c.is_ascii_digit() {
            text.push(c);
            digits += 1;
        } else if !seen_radix && (c == '.' || c == separator) {
            text.push('.');
            seen_radix = true;
        } else {
            break;
        }
    }

    if digits == 0 {
        return 0.0;
    }
    text.parse().unwrap_or(0.0)
}

