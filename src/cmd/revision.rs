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

use studydesk_core::Category;
use studydesk_core::NonStudyDays;
use studydesk_core::RecordId;
use studydesk_core::Timestamp;

use crate::collection::Collection;
use crate::db::RevisionAction;
use crate::db::StoredRevision;
use crate::error::Fallible;
use crate::error::fail;

pub fn add_revision(
    directory: Option<String>,
    title: String,
    non_study_days: Option<NonStudyDays>,
    now: Timestamp,
) -> Fallible<RecordId> {
    let coll = Collection::new(directory)?;
    let non_study_days = non_study_days.unwrap_or(coll.config.default_non_study_days);
    let revision = StoredRevision::new(title, non_study_days, now)?;
    coll.db.insert_revision(&revision)?;
    println!(
        "Added revision {}, first due at {}.",
        revision.id, revision.item.next_revision_date
    );
    Ok(revision.id)
}

/// Every revision item with its category recomputed at `now`.
pub fn categorized_revisions(coll: &Collection, now: Timestamp) -> Fallible<Vec<StoredRevision>> {
    let mut revisions = coll.db.list_revisions()?;
    for revision in revisions.iter_mut() {
        revision.item.refresh_category(now)?;
    }
    Ok(revisions)
}

pub fn list_revisions(directory: Option<String>, now: Timestamp) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let revisions = categorized_revisions(&coll, now)?;
    if revisions.is_empty() {
        println!("No revisions.");
        return Ok(());
    }
    for category in [Category::Pending, Category::Priority, Category::Completed] {
        let bucket: Vec<&StoredRevision> = revisions
            .iter()
            .filter(|r| r.item.category == category)
            .collect();
        if bucket.is_empty() {
            continue;
        }
        println!("{category}:");
        for revision in bucket {
            println!(
                "  {}\t{}\t{}",
                revision.id, revision.item.next_revision_date, revision.title
            );
        }
    }
    Ok(())
}

pub fn apply_action(
    directory: Option<String>,
    id: RecordId,
    action: RevisionAction,
    now: Timestamp,
) -> Fallible<()> {
    let mut coll = Collection::new(directory)?;
    let Some(revision) = coll.db.apply_revision_action(&id, action, now)? else {
        return fail(format!("no revision with id {id}"));
    };
    println!(
        "Revision {id}: {}, next revision at {}.",
        revision.item.category, revision.item.next_revision_date
    );
    Ok(())
}

/// Renames a revision item or changes its non-study days.
pub fn edit_revision(
    directory: Option<String>,
    id: RecordId,
    title: Option<String>,
    non_study_days: Option<NonStudyDays>,
) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    if !coll.db.edit_revision(&id, title.as_deref(), non_study_days)? {
        return fail(format!("no revision with id {id}"));
    }
    println!("Updated revision {id}.");
    Ok(())
}

pub fn delete_revision(directory: Option<String>, id: RecordId) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    if !coll.db.delete_revision(&id)? {
        return fail(format!("no revision with id {id}"));
    }
    println!("Deleted revision {id}.");
    Ok(())
}
