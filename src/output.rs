//! Rendering of value records through a user template.
//!
//! Tokens:
//! - `%D1`, `%D2`: value with three decimals
//! - `%M1`, `%M2`: multiplier character
//! - `%U1`, `%U2`: unit symbol
//! - `%T1`, `%T2`: `AC`, `DC` or nothing
//! - `%I`: record number
//! - `%C`: reception time in seconds since the epoch
//! - `%S`: reception time in seconds since start-up
//! - `%%`: a percent sign
//! - `\n`, `\\`: newline and backslash

use crate::error::FormatError;
use chrono::{DateTime, Utc};
use gdm70x_lib::Reading;
use gdm70x_lib::frame::Channel;
use gdm70x_lib::value::Measurement;
use std::str::FromStr;

/// Template used when none is given on the command line.
pub const DEFAULT_VALUE_FORMAT: &str = r"TIME: %S DATA1: %D1 %M1%U1 %T1; DATA2: %D2 %M2%U2 %T2\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Value,
    Multiplier,
    Unit,
    Coupling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Channel(Channel, Field),
    RecordNumber,
    EpochTime,
    ElapsedTime,
}

/// A parsed value template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueFormat {
    segments: Vec<Segment>,
}

impl ValueFormat {
    pub fn parse(template: &str) -> Result<Self, FormatError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().enumerate();

        while let Some((position, c)) = chars.next() {
            match c {
                '%' => {
                    let (_, token) = chars.next().ok_or(FormatError::Truncated)?;
                    let segment = match token {
                        '%' => {
                            literal.push('%');
                            continue;
                        }
                        'I' => Segment::RecordNumber,
                        'C' => Segment::EpochTime,
                        'S' => Segment::ElapsedTime,
                        'D' | 'M' | 'U' | 'T' => {
                            let channel = match chars.next() {
                                Some((_, '1')) => Channel::Primary,
                                Some((_, '2')) => Channel::Secondary,
                                _ => return Err(FormatError::MissingChannel { token, position }),
                            };
                            let field = match token {
                                'D' => Field::Value,
                                'M' => Field::Multiplier,
                                'U' => Field::Unit,
                                _ => Field::Coupling,
                            };
                            Segment::Channel(channel, field)
                        }
                        other => return Err(FormatError::UnknownToken { token: other, position }),
                    };
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(segment);
                }
                '\\' => match chars.next() {
                    Some((_, 'n')) => literal.push('\n'),
                    Some((_, '\\')) => literal.push('\\'),
                    Some((_, escape)) => return Err(FormatError::UnknownEscape { escape, position }),
                    None => return Err(FormatError::Truncated),
                },
                c => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self { segments })
    }

    /// Render `reading`, the `record`-th record since `start`.
    pub fn render(&self, reading: &Reading, record: u64, start: DateTime<Utc>) -> String {
        let received_at = reading.received_at.unwrap_or(start);
        let mut out = String::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Channel(channel, field) => {
                    let measurement = match channel {
                        Channel::Primary => &reading.primary,
                        Channel::Secondary => &reading.secondary,
                    };
                    render_field(&mut out, measurement, *field);
                }
                Segment::RecordNumber => out.push_str(&record.to_string()),
                Segment::EpochTime => out.push_str(&seconds(received_at.timestamp_millis())),
                Segment::ElapsedTime => {
                    out.push_str(&seconds((received_at - start).num_milliseconds()))
                }
            }
        }
        out
    }
}

impl FromStr for ValueFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn render_field(out: &mut String, measurement: &Measurement, field: Field) {
    match field {
        Field::Value => out.push_str(&format!("{:.3}", measurement.value)),
        Field::Multiplier => out.push(measurement.multiplier.tag()),
        Field::Unit => out.push_str(&measurement.unit.to_string()),
        Field::Coupling => out.push_str(measurement.unit.coupling().unwrap_or("")),
    }
}

fn seconds(millis: i64) -> String {
    format!("{:.3}", millis as f64 / 1000.0)
}
