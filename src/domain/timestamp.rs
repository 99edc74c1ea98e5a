// Zone-less wall-clock timestamps as reported by the instruments
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimestampError {
    #[error("timestamp is empty")]
    Empty,
    #[error("timestamp '{0}' has no time component")]
    MissingTime(String),
    #[error("invalid date in timestamp '{0}'")]
    InvalidDate(String),
    #[error("invalid time in timestamp '{0}'")]
    InvalidTime(String),
}

/// A local wall-clock instant with no time zone attached.
///
/// The instruments report readings in the site's local time, sometimes with a
/// trailing `Z` or offset that does not actually describe the clock. The parser
/// therefore reads the literal calendar fields and never converts between zones:
///
/// - date and time are separated by the first `T` or space
/// - the date is `YYYY-MM-DD` or `YYYY/MM/DD`
/// - the time is `HH:MM`, `HH:MM:SS` or `HH:MM:SS.fraction`
/// - a trailing `Z` or `+HH:MM` / `-HH:MM` suffix is accepted and ignored
///
/// The raw string is kept alongside the parsed value. Equality is defined on the
/// raw string, ordering on the parsed instant.
#[derive(Debug, Clone)]
pub struct WallClock {
    raw: String,
    at: NaiveDateTime,
}

impl WallClock {
    pub fn parse(raw: &str) -> Result<Self, TimestampError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TimestampError::Empty);
        }

        let (date_part, time_part) = trimmed
            .split_once(['T', ' '])
            .ok_or_else(|| TimestampError::MissingTime(raw.to_string()))?;

        let date = parse_date(date_part).ok_or_else(|| TimestampError::InvalidDate(raw.to_string()))?;
        let time = parse_time(strip_zone(time_part.trim()))
            .ok_or_else(|| TimestampError::InvalidTime(raw.to_string()))?;

        Ok(Self {
            raw: raw.to_string(),
            at: NaiveDateTime::new(date, time),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn naive(&self) -> NaiveDateTime {
        self.at
    }

    /// Hour bucket key in the form `YYYY-MM-DD-HH`.
    pub fn hour_bucket(&self) -> String {
        format!(
            "{:04}-{:02}-{:02}-{:02}",
            self.at.year(),
            self.at.month(),
            self.at.day(),
            self.at.hour()
        )
    }
}

fn parse_date(part: &str) -> Option<NaiveDate> {
    let mut fields = part.split(['-', '/']);
    let year = fields.next()?.trim().parse::<i32>().ok()?;
    let month = fields.next()?.trim().parse::<u32>().ok()?;
    let day = fields.next()?.trim().parse::<u32>().ok()?;
    if fields.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Drop a trailing `Z` or numeric offset. The offset sign is searched after the
/// minutes field so that it cannot be confused with the date separators.
fn strip_zone(part: &str) -> &str {
    let part = part.strip_suffix(['Z', 'z']).unwrap_or(part);
    match part.get(5..).and_then(|tail| tail.find(['+', '-'])) {
        Some(idx) => &part[..idx + 5],
        None => part,
    }
}

fn parse_time(part: &str) -> Option<NaiveTime> {
    let mut fields = part.split(':');
    let hour = fields.next()?.trim().parse::<u32>().ok()?;
    let minute = fields.next()?.trim().parse::<u32>().ok()?;
    let (second, nanos) = match fields.next() {
        Some(seconds) => parse_seconds(seconds.trim())?,
        None => (0, 0),
    };
    if fields.next().is_some() {
        return None;
    }
    NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)
}

fn parse_seconds(field: &str) -> Option<(u32, u32)> {
    match field.split_once('.') {
        Some((whole, fraction)) => {
            let second = whole.parse::<u32>().ok()?;
            if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            // Nanosecond precision; longer fractions are truncated.
            let digits: String = fraction.chars().take(9).collect();
            let scale = 10u32.pow(9 - digits.len() as u32);
            Some((second, digits.parse::<u32>().ok()? * scale))
        }
        None => Some((field.parse::<u32>().ok()?, 0)),
    }
}

impl FromStr for WallClock {
    type Err = TimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl PartialEq for WallClock {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for WallClock {}

impl PartialOrd for WallClock {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WallClock {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at.cmp(&other.at).then_with(|| self.raw.cmp(&other.raw))
    }
}

impl fmt::Display for WallClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for WallClock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}
