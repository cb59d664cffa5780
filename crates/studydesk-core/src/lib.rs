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

//! studydesk-core: scheduling core for the studydesk study planner.
//!
//! Everything in this crate is a pure function of its inputs. The current
//! time is always passed in by the caller, and results are returned as
//! partial updates for the caller to merge and persist.
//! - Card review scheduling with learning steps and an ease factor
//! - Revision scheduling with a fixed interval table and non-study days
//! - Time and date helpers

pub mod card;
pub mod error;
pub mod grade;
pub mod revision;
pub mod types;

// Re-exports for convenience
pub use card::{CardState, CardUpdate, ReviewCard, grade_card};
pub use error::{ErrorReport, Fallible, fail};
pub use grade::Grade;
pub use revision::{
    Category, RevisionItem, RevisionUpdate, advance_revision, categorize, complete_revision,
    postpone_revision,
};
pub use types::date::Date;
pub use types::record_id::RecordId;
pub use types::timestamp::Timestamp;
pub use types::weekdays::NonStudyDays;
