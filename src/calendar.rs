//! Business dates in the exchange's home time zone.
//!
//! TWSE trades on Asia/Taipei time, which is a fixed UTC+08:00 with no
//! daylight saving, so a constant offset is enough to anchor timestamps.
use std::fmt;
use std::str::FromStr;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::macros::{format_description, offset};
use time::{Date, Month, OffsetDateTime, UtcOffset};

use crate::error::{ExtractError, Result};

/// Asia/Taipei.
pub const EXCHANGE_OFFSET: UtcOffset = offset!(+8);

/// Calendar date of one trading session, without a time component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BusinessDate(Date);

impl BusinessDate {
    pub fn new(date: Date) -> Self {
        Self(date)
    }

    /// Parse the 8-digit `YYYYMMDD` form used by the exchange report URLs.
    pub fn parse(s: &str) -> Result<Self> {
        if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ExtractError::invalid_date(s));
        }
        let year: i32 = s[..4].parse().map_err(|_| ExtractError::invalid_date(s))?;
        let month: u8 = s[4..6].parse().map_err(|_| ExtractError::invalid_date(s))?;
        let day: u8 = s[6..].parse().map_err(|_| ExtractError::invalid_date(s))?;
        let month = Month::try_from(month).map_err(|_| ExtractError::invalid_date(s))?;
        let date = Date::from_calendar_date(year, month, day)
            .map_err(|_| ExtractError::invalid_date(s))?;
        Ok(Self(date))
    }

    /// Today's date as seen at the exchange.
    pub fn today() -> Self {
        Self(OffsetDateTime::now_utc().to_offset(EXCHANGE_OFFSET).date())
    }

    pub fn date(self) -> Date {
        self.0
    }

    /// Start of the business day in the exchange zone.
    pub fn midnight(self) -> OffsetDateTime {
        self.0.midnight().assume_offset(EXCHANGE_OFFSET)
    }

    /// `YYYYMMDD`, the inverse of [`BusinessDate::parse`].
    pub fn compact(self) -> String {
        format!(
            "{:04}{:02}{:02}",
            self.0.year(),
            self.0.month() as u8,
            self.0.day()
        )
    }
}

impl fmt::Display for BusinessDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.0.year(),
            self.0.month() as u8,
            self.0.day()
        )
    }
}

impl FromStr for BusinessDate {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for BusinessDate {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for BusinessDate {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Date::parse(&value, format_description!("[year]-[month]-[day]"))
            .map(Self)
            .map_err(D::Error::custom)
    }
}
