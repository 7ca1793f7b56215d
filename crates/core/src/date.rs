//! Calendar-date-only value used for business dates.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Wire and storage format for business dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// The calendar date a job logically belongs to.
///
/// Carries no time-of-day and no zone. When it has to be compared with an
/// instant it is read as midnight UTC.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BusinessDate(NaiveDate);

impl BusinessDate {
    pub fn from_naive(date: NaiveDate) -> Self {
        Self(date)
    }

    /// The UTC calendar date of an instant.
    pub fn from_instant(instant: DateTime<Utc>) -> Self {
        Self(instant.date_naive())
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Today's date in UTC.
    pub fn today() -> Self {
        Self::from_instant(Utc::now())
    }

    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }

    /// Midnight UTC at the start of this date.
    pub fn start_of_day(&self) -> DateTime<Utc> {
        self.0.and_time(chrono::NaiveTime::MIN).and_utc()
    }
}

impl fmt::Display for BusinessDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl FromStr for BusinessDate {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, DATE_FORMAT).map(Self)
    }
}

impl From<NaiveDate> for BusinessDate {
    fn from(value: NaiveDate) -> Self {
        Self(value)
    }
}

impl From<BusinessDate> for NaiveDate {
    fn from(value: BusinessDate) -> Self {
        value.0
    }
}

impl Serialize for BusinessDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BusinessDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse()
            .map_err(|e| serde::de::Error::custom(format!("invalid business date |{raw}|: {e}")))
    }
}
