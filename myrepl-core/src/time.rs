//! MySQL temporal values
//!
//! the server permits dates that no calendar type can hold, most
//! prominently `0000-00-00 00:00:00`, so decoded values keep a format
//! tag instead of converting to an absolute instant.
use chrono::{Datelike, Timelike};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TemporalFormat {
    /// the literal all-zero value
    Zero,
    /// date without time of day
    Date,
    DateTime,
    DateTimeMicros,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MyDateTime {
    pub format: TemporalFormat,
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub micro_second: u32,
}

impl MyDateTime {
    pub fn zero() -> Self {
        MyDateTime {
            format: TemporalFormat::Zero,
            year: 0,
            month: 0,
            day: 0,
            hour: 0,
            minute: 0,
            second: 0,
            micro_second: 0,
        }
    }

    pub fn date(year: u16, month: u8, day: u8) -> Self {
        MyDateTime {
            format: TemporalFormat::Date,
            year,
            month,
            day,
            hour: 0,
            minute: 0,
            second: 0,
            micro_second: 0,
        }
    }

    pub fn date_time(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        MyDateTime {
            format: TemporalFormat::DateTime,
            year,
            month,
            day,
            hour,
            minute,
            second,
            micro_second: 0,
        }
    }

    /// seconds since epoch normalized to UTC civil time; zero stays the
    /// literal zero value
    pub fn from_unix(secs: u32) -> Self {
        if secs == 0 {
            return Self::zero();
        }
        match chrono::DateTime::from_timestamp(secs as i64, 0) {
            Some(dt) => {
                let dt = dt.naive_utc();
                Self::date_time(
                    dt.year() as u16,
                    dt.month() as u8,
                    dt.day() as u8,
                    dt.hour() as u8,
                    dt.minute() as u8,
                    dt.second() as u8,
                )
            }
            None => Self::zero(),
        }
    }
}

impl fmt::Display for MyDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.format {
            TemporalFormat::Zero | TemporalFormat::DateTime => write!(
                f,
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                self.year, self.month, self.day, self.hour, self.minute, self.second
            ),
            TemporalFormat::DateTimeMicros => write!(
                f,
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:06}",
                self.year,
                self.month,
                self.day,
                self.hour,
                self.minute,
                self.second,
                self.micro_second
            ),
            TemporalFormat::Date => {
                write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
            }
        }
    }
}

/// signed MySQL TIME value; hours range up to +-838
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MyDuration {
    pub negative: bool,
    pub hours: u32,
    pub minutes: u8,
    pub seconds: u8,
    pub micro_second: u32,
}

impl MyDuration {
    pub fn new(negative: bool, hours: u32, minutes: u8, seconds: u8) -> Self {
        MyDuration {
            negative,
            hours,
            minutes,
            seconds,
            micro_second: 0,
        }
    }
}

impl fmt::Display for MyDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.negative { "-" } else { "" };
        if self.micro_second != 0 {
            write!(
                f,
                "{}{}:{:02}:{:02}.{:06}",
                sign, self.hours, self.minutes, self.seconds, self.micro_second
            )
        } else {
            write!(
                f,
                "{}{}:{:02}:{:02}",
                sign, self.hours, self.minutes, self.seconds
            )
        }
    }
}
