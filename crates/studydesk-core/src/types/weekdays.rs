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
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;

pub const DAYS_PER_WEEK: u8 = 7;

const NAMES: [&str; DAYS_PER_WEEK as usize] = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"];

const ALL_DAYS: u8 = 0b111_1111;

/// Weekdays on which nothing may be scheduled, as indices from Sunday = 0 to
/// Saturday = 6. At least one weekday always remains available.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct NonStudyDays {
    pub(crate) mask: u8,
}

impl NonStudyDays {
    pub fn none() -> Self {
        Self { mask: 0 }
    }

    pub fn from_indices(indices: impl IntoIterator<Item = u8>) -> Fallible<Self> {
        let mut mask: u8 = 0;
        for index in indices {
            if index >= DAYS_PER_WEEK {
                return fail(format!(
                    "invalid weekday index {index}: expected 0 (Sunday) to 6 (Saturday)"
                ));
            }
            mask |= 1 << index;
        }
        if mask == ALL_DAYS {
            return fail("every weekday is marked as a non-study day");
        }
        Ok(Self { mask })
    }

    pub fn contains(self, weekday_index: u8) -> bool {
        weekday_index < DAYS_PER_WEEK && self.mask & (1 << weekday_index) != 0
    }

    pub fn is_empty(self) -> bool {
        self.mask == 0
    }

    pub fn indices(self) -> Vec<u8> {
        (0..DAYS_PER_WEEK).filter(|i| self.contains(*i)).collect()
    }
}

impl TryFrom<Vec<u8>> for NonStudyDays {
    type Error = ErrorReport;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        NonStudyDays::from_indices(value)
    }
}

impl From<NonStudyDays> for Vec<u8> {
    fn from(days: NonStudyDays) -> Vec<u8> {
        days.indices()
    }
}

/// Parses a comma-separated list of weekday indices or three-letter names,
/// e.g. `0,6` or `sun,sat`. The empty string is the empty set.
impl FromStr for NonStudyDays {
    type Err = ErrorReport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut indices = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let lower = part.to_ascii_lowercase();
            let index = match NAMES.iter().position(|name| lower.starts_with(name)) {
                Some(i) => i as u8,
                None => lower
                    .parse::<u8>()
                    .map_err(|_| ErrorReport::new(format!("invalid weekday: '{part}'")))?,
            };
            indices.push(index);
        }
        NonStudyDays::from_indices(indices)
    }
}

impl Display for NonStudyDays {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self
            .indices()
            .into_iter()
            .map(|i| NAMES[i as usize])
            .collect();
        write!(f, "{}", names.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_indices() -> Fallible<()> {
        let days = NonStudyDays::from_indices([0, 6])?;
        assert!(days.contains(0));
        assert!(days.contains(6));
        assert!(!days.contains(3));
        assert_eq!(days.indices(), vec![0, 6]);
        Ok(())
    }

    #[test]
    fn test_rejects_every_weekday() {
        let result = NonStudyDays::from_indices(0..7);
        assert_eq!(
            result,
            Err(ErrorReport::new("every weekday is marked as a non-study day"))
        );
    }

    #[test]
    fn test_rejects_out_of_range_index() {
        assert!(NonStudyDays::from_indices([7]).is_err());
    }

    #[test]
    fn test_parse() -> Fallible<()> {
        assert_eq!("sun,sat".parse::<NonStudyDays>()?, NonStudyDays::from_indices([0, 6])?);
        assert_eq!("1, 3".parse::<NonStudyDays>()?, NonStudyDays::from_indices([1, 3])?);
        assert_eq!("Friday".parse::<NonStudyDays>()?, NonStudyDays::from_indices([5])?);
        assert!("".parse::<NonStudyDays>()?.is_empty());
        assert!("someday".parse::<NonStudyDays>().is_err());
        Ok(())
    }

    #[test]
    fn test_display() -> Fallible<()> {
        assert_eq!(NonStudyDays::from_indices([6, 0])?.to_string(), "sun,sat");
        Ok(())
    }

    #[test]
    fn test_serde() -> Fallible<()> {
        let days = NonStudyDays::from_indices([2, 4])?;
        assert_eq!(serde_json::to_string(&days)?, "[2,4]");
        let parsed: NonStudyDays = serde_json::from_str("[4,2]")?;
        assert_eq!(parsed, days);
        assert!(serde_json::from_str::<NonStudyDays>("[0,1,2,3,4,5,6]").is_err());
        Ok(())
    }
}
