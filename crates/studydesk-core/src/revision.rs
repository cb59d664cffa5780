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

//! Revision scheduling: a fixed interval table indexed by how many times an
//! item has been revised, with weekday exclusions and urgency buckets.

use std::fmt::Display;
use std::fmt::Formatter;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::types::timestamp::Timestamp;
use crate::types::weekdays::DAYS_PER_WEEK;
use crate::types::weekdays::NonStudyDays;

/// Intervals in days for the first revisions. Later intervals keep doubling
/// the last entry.
pub const INTERVAL_TABLE: [u32; 5] = [1, 3, 7, 15, 30];

/// How urgent a revision item is, relative to the current time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Due today, or overdue.
    Pending,
    /// Upcoming, just completed, or manually postponed.
    Priority,
    /// Marked complete.
    Completed,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Pending => "pending",
            Category::Priority => "priority",
            Category::Completed => "completed",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = ErrorReport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Category::Pending),
            "priority" => Ok(Category::Priority),
            "completed" => Ok(Category::Completed),
            _ => fail(format!("invalid category: '{s}'")),
        }
    }
}

/// The interval in days for an item revised `revision_count` times.
pub fn interval_for(revision_count: u32) -> Fallible<u32> {
    let last = INTERVAL_TABLE.len() - 1;
    if let Some(days) = INTERVAL_TABLE.get(revision_count as usize) {
        return Ok(*days);
    }
    let doublings = revision_count - last as u32;
    2u32.checked_pow(doublings)
        .and_then(|factor| INTERVAL_TABLE[last].checked_mul(factor))
        .ok_or_else(|| {
            ErrorReport::new(format!(
                "revision interval out of range for revision count {revision_count}"
            ))
        })
}

pub fn next_revision_date(created_at: Timestamp, revision_count: u32) -> Fallible<Timestamp> {
    created_at.plus_days(interval_for(revision_count)?.into())
}

/// Moves `ts` forward one day at a time until it lands on a study day.
pub fn skip_non_study_days(ts: Timestamp, days: NonStudyDays) -> Fallible<Timestamp> {
    let mut candidate = ts;
    for _ in 0..DAYS_PER_WEEK {
        if !days.contains(candidate.date().weekday_index()) {
            return Ok(candidate);
        }
        candidate = candidate.plus_days(1)?;
    }
    fail("every weekday is marked as a non-study day")
}

/// An item scheduled for revision.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RevisionItem {
    pub created_at: Timestamp,
    /// Number of completed revision cycles.
    pub revision_count: u32,
    pub next_revision_date: Timestamp,
    pub interval_days: u32,
    pub completed_at: Option<Timestamp>,
    #[serde(default)]
    pub non_study_days: NonStudyDays,
    /// The last category assigned to the item. This goes stale as time
    /// passes: [`categorize`] is authoritative.
    pub category: Category,
}

impl RevisionItem {
    pub fn new(created_at: Timestamp, non_study_days: NonStudyDays) -> Fallible<Self> {
        Ok(Self {
            created_at,
            revision_count: 0,
            next_revision_date: next_revision_date(created_at, 0)?,
            interval_days: interval_for(0)?,
            completed_at: None,
            non_study_days,
            category: Category::Pending,
        })
    }

    pub fn validate(&self) -> Fallible<()> {
        let expected = interval_for(self.revision_count)?;
        if self.interval_days != expected {
            return fail(format!(
                "interval of {} days does not match revision count {} (expected {expected})",
                self.interval_days, self.revision_count
            ));
        }
        Ok(())
    }

    /// Recomputes the cached category at `now`.
    pub fn refresh_category(&mut self, now: Timestamp) -> Fallible<Category> {
        self.category = categorize(self, now)?;
        Ok(self.category)
    }

    /// Applies the fields present in `update`.
    pub fn merge(self, update: RevisionUpdate) -> Self {
        Self {
            created_at: self.created_at,
            revision_count: update.revision_count.unwrap_or(self.revision_count),
            next_revision_date: update.next_revision_date.unwrap_or(self.next_revision_date),
            interval_days: update.interval_days.unwrap_or(self.interval_days),
            completed_at: update.completed_at.or(self.completed_at),
            non_study_days: self.non_study_days,
            category: update.category.unwrap_or(self.category),
        }
    }
}

/// The fields of a revision item changed by a single action.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RevisionUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_revision_date: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

/// The category of `item` at `now`, comparing local calendar days in the
/// calendar of `now`.
pub fn categorize(item: &RevisionItem, now: Timestamp) -> Fallible<Category> {
    let today = now.date();
    let adjusted = skip_non_study_days(
        item.next_revision_date.in_offset_of(now),
        item.non_study_days,
    )?;
    if let Some(completed_at) = item.completed_at {
        if completed_at.in_offset_of(now).date() == today {
            return Ok(Category::Priority);
        }
    }
    if adjusted.date() == today {
        Ok(Category::Pending)
    } else if adjusted > now {
        Ok(Category::Priority)
    } else {
        Ok(Category::Pending)
    }
}

/// Marks an item complete. The revision count, interval, and next date are
/// left as they are: see [`advance_revision`] for rescheduling.
pub fn complete_revision(now: Timestamp) -> RevisionUpdate {
    RevisionUpdate {
        completed_at: Some(now),
        category: Some(Category::Completed),
        ..RevisionUpdate::default()
    }
}

/// Pushes an item to the next local midnight, whatever its interval.
pub fn postpone_revision(now: Timestamp) -> Fallible<RevisionUpdate> {
    Ok(RevisionUpdate {
        next_revision_date: Some(now.next_local_midnight()?),
        category: Some(Category::Priority),
        ..RevisionUpdate::default()
    })
}

/// Moves an item to its next interval in the table, counted from its
/// creation date.
pub fn advance_revision(item: &RevisionItem) -> Fallible<RevisionUpdate> {
    let revision_count = item
        .revision_count
        .checked_add(1)
        .ok_or_else(|| ErrorReport::new("revision count out of range"))?;
    Ok(RevisionUpdate {
        revision_count: Some(revision_count),
        interval_days: Some(interval_for(revision_count)?),
        next_revision_date: Some(next_revision_date(item.created_at, revision_count)?),
        ..RevisionUpdate::default()
    })
}
