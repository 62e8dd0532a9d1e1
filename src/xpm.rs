//! Screen dumps as XPM files.

use crate::error::FormatError;
use chrono::{Datelike, NaiveDateTime, Timelike};
use gdm70x_lib::Image;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Template used when none is given on the command line.
pub const DEFAULT_FILENAME_FORMAT: &str = "GDM70X-%Y%M%D-%h%m-%N.xpm";

/// Highest counter value tried by [`FilenameFormat::next_free_path`], plus one
pub const MAX_COUNTER: u32 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Second,
    Minute,
    Hour,
    Day,
    Month,
    Year,
    ShortYear,
    Counter,
}

/// A parsed image file name template.
///
/// Tokens, all zero padded: `%s` `%m` `%h` seconds, minutes and hours, `%D`
/// `%M` day and month, `%Y` four-digit year, `%y` two-digit year, `%N` a
/// four-digit counter that is raised until the name is unused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameFormat {
    segments: Vec<Segment>,
}

impl FilenameFormat {
    pub fn parse(template: &str) -> Result<Self, FormatError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().enumerate();

        while let Some((position, c)) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }
            let (_, token) = chars.next().ok_or(FormatError::Truncated)?;
            let segment = match token {
                's' => Segment::Second,
                'm' => Segment::Minute,
                'h' => Segment::Hour,
                'D' => Segment::Day,
                'M' => Segment::Month,
                'Y' => Segment::Year,
                'y' => Segment::ShortYear,
                'N' => Segment::Counter,
                other => return Err(FormatError::UnknownToken { token: other, position }),
            };
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(segment);
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self { segments })
    }

    pub fn render(&self, now: &NaiveDateTime, counter: u32) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => text.clone(),
                Segment::Second => format!("{:02}", now.second()),
                Segment::Minute => format!("{:02}", now.minute()),
                Segment::Hour => format!("{:02}", now.hour()),
                Segment::Day => format!("{:02}", now.day()),
                Segment::Month => format!("{:02}", now.month()),
                Segment::Year => format!("{:04}", now.year()),
                Segment::ShortYear => format!("{:02}", now.year().rem_euclid(100)),
                Segment::Counter => format!("{:04}", counter),
            })
            .collect()
    }

    /// First rendered name, counting up from 0, for which `exists` is false.
    pub fn next_free_path<F>(&self, now: &NaiveDateTime, exists: F) -> Result<PathBuf, FormatError>
    where
        F: Fn(&Path) -> bool,
    {
        (0..MAX_COUNTER)
            .map(|counter| PathBuf::from(self.render(now, counter)))
            .find(|path| !exists(path))
            .ok_or(FormatError::CounterExhausted { tries: MAX_COUNTER })
    }
}

impl FromStr for FilenameFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Write `image` as a two-colour XPM, dark pixels as `O`.
pub fn write_xpm<W: Write>(image: &Image, mut out: W) -> io::Result<()> {
    write!(
        out,
        "/* XPM */\nstatic char* gdm70x[] = {{\n \"{} {} 2 1\",\n\"  c white\",\n\"O c black\"",
        image.width(),
        image.height()
    )?;
    for row in 0..image.height() {
        let line: String = image.row(row).map(|dark| if dark { 'O' } else { ' ' }).collect();
        write!(out, ",\n\"{}\"", line)?;
    }
    out.write_all(b"\n};")?;
    out.flush()
}
