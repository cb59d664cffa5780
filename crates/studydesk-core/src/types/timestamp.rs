// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::Display;
use std::fmt::Formatter;

use chrono::DateTime;
use chrono::FixedOffset;
use chrono::SubsecRound;
use chrono::TimeDelta;
use chrono::TimeZone;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::types::date::Date;

const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";

/// An absolute instant with millisecond precision.
///
/// The instant carries the UTC offset of the calendar it was observed in, so
/// that calendar-day questions ("is this today?", "which weekday is this?")
/// can be answered without consulting the environment. Equality and ordering
/// compare instants only: the same moment seen from two offsets is equal.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp(DateTime<FixedOffset>);

impl Timestamp {
    pub fn new(dt: DateTime<FixedOffset>) -> Self {
        Self(dt.trunc_subsecs(3))
    }

    /// Builds a timestamp from milliseconds since the Unix epoch, observed
    /// from the given offset.
    pub fn from_millis(millis: i64, offset: FixedOffset) -> Fallible<Self> {
        match DateTime::<Utc>::from_timestamp_millis(millis) {
            Some(utc) => Ok(Self(utc.with_timezone(&offset))),
            None => fail(format!("timestamp out of range: {millis} ms")),
        }
    }

    /// Milliseconds since the Unix epoch.
    pub fn as_millis(self) -> i64 {
        self.0.timestamp_millis()
    }

    pub fn into_inner(self) -> DateTime<FixedOffset> {
        self.0
    }

    pub fn offset(self) -> FixedOffset {
        *self.0.offset()
    }

    /// The current instant, in the offset of the user's local time zone.
    #[cfg(feature = "clock")]
    pub fn now() -> Self {
        Self::new(chrono::Local::now().fixed_offset())
    }

    /// The local calendar day of this timestamp.
    pub fn date(self) -> Date {
        Date::new(self.0.date_naive())
    }

    /// The same instant, seen from the calendar of `other`.
    pub fn in_offset_of(self, other: Timestamp) -> Self {
        Self(self.0.with_timezone(&other.offset()))
    }

    pub fn plus_minutes(self, minutes: i64) -> Fallible<Self> {
        let delta = TimeDelta::try_minutes(minutes)
            .ok_or_else(|| ErrorReport::new(format!("duration out of range: {minutes} minutes")))?;
        self.plus(delta)
    }

    /// Adds whole days of 86,400,000 ms each.
    pub fn plus_days(self, days: i64) -> Fallible<Self> {
        let delta = TimeDelta::try_days(days)
            .ok_or_else(|| ErrorReport::new(format!("duration out of range: {days} days")))?;
        self.plus(delta)
    }

    fn plus(self, delta: TimeDelta) -> Fallible<Self> {
        self.0
            .checked_add_signed(delta)
            .map(Self)
            .ok_or_else(|| ErrorReport::new("timestamp out of range"))
    }

    /// Midnight at the start of the next local calendar day.
    pub fn next_local_midnight(self) -> Fallible<Self> {
        let midnight = self
            .0
            .date_naive()
            .succ_opt()
            .and_then(|tomorrow| tomorrow.and_hms_opt(0, 0, 0))
            .ok_or_else(|| ErrorReport::new("timestamp out of range"))?;
        self.offset()
            .from_local_datetime(&midnight)
            .single()
            .map(Self)
            .ok_or_else(|| ErrorReport::new("timestamp out of range"))
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(FORMAT))
    }
}

impl TryFrom<String> for Timestamp {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let dt = DateTime::parse_from_rfc3339(&value)
            .map_err(|_| ErrorReport::new(format!("Failed to parse timestamp: '{value}'.")))?;
        Ok(Timestamp::new(dt))
    }
}

impl From<Timestamp> for String {
    fn from(ts: Timestamp) -> String {
        ts.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::try_from(s.to_string()).unwrap()
    }

    #[test]
    fn test_timestamp_to_string() {
        let t = ts("2023-10-05T14:30:15.123+02:00");
        assert_eq!(t.to_string(), "2023-10-05T14:30:15.123+02:00");
    }

    #[test]
    fn test_truncates_to_milliseconds() {
        let t = ts("2023-10-05T14:30:15.123456+00:00");
        assert_eq!(t.to_string(), "2023-10-05T14:30:15.123+00:00");
    }

    #[test]
    fn test_serde() -> Fallible<()> {
        let t = ts("2023-10-05T14:30:15.123-05:00");
        let serialized = serde_json::to_string(&t)?;
        assert_eq!(serialized, "\"2023-10-05T14:30:15.123-05:00\"");
        let deserialized: Timestamp = serde_json::from_str(&serialized)?;
        assert_eq!(deserialized, t);
        Ok(())
    }

    #[test]
    fn test_invalid_string() {
        assert!(Timestamp::try_from("yesterday".to_string()).is_err());
    }

    #[test]
    fn test_millis() -> Fallible<()> {
        let utc = FixedOffset::east_opt(0).unwrap();
        let t = Timestamp::from_millis(1_700_000_000_123, utc)?;
        assert_eq!(t.as_millis(), 1_700_000_000_123);
        assert_eq!(t.to_string(), "2023-11-14T22:13:20.123+00:00");
        Ok(())
    }

    #[test]
    fn test_equality_ignores_offset() {
        let a = ts("2024-03-01T23:30:00.000+00:00");
        let b = ts("2024-03-02T01:30:00.000+02:00");
        assert_eq!(a, b);
        assert_ne!(a.date(), b.date());
        assert_eq!(a.in_offset_of(b).date(), b.date());
    }

    #[test]
    fn test_plus_days() -> Fallible<()> {
        let t = ts("2024-01-01T12:00:00.000+00:00");
        assert_eq!(t.plus_days(1)?.as_millis() - t.as_millis(), 86_400_000);
        assert_eq!(t.plus_minutes(10)?.as_millis() - t.as_millis(), 600_000);
        Ok(())
    }

    #[test]
    fn test_plus_days_overflow() {
        let t = ts("2024-01-01T12:00:00.000+00:00");
        assert!(t.plus_days(i64::MAX).is_err());
    }

    #[test]
    fn test_next_local_midnight() -> Fallible<()> {
        let t = ts("2024-01-31T18:45:12.345+09:00");
        assert_eq!(t.next_local_midnight()?, ts("2024-02-01T00:00:00.000+09:00"));
        let t = ts("2024-01-31T00:00:00.000+00:00");
        assert_eq!(t.next_local_midnight()?, ts("2024-02-01T00:00:00.000+00:00"));
        Ok(())
    }
}
