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

use studydesk_core::Grade;
use studydesk_core::RecordId;
use studydesk_core::Timestamp;

use crate::collection::Collection;
use crate::db::StoredCard;
use crate::error::Fallible;
use crate::error::fail;

pub fn add_card(
    directory: Option<String>,
    front: String,
    back: String,
    now: Timestamp,
) -> Fallible<RecordId> {
    let coll = Collection::new(directory)?;
    let card = StoredCard::new(front, back, now);
    coll.db.insert_card(&card)?;
    println!("Added card {}.", card.id);
    Ok(card.id)
}

pub fn grade(
    directory: Option<String>,
    id: RecordId,
    grade: Grade,
    now: Timestamp,
) -> Fallible<()> {
    let mut coll = Collection::new(directory)?;
    let Some(stored) = coll.db.grade_card(&id, grade, now)? else {
        return fail(format!("no card with id {id}"));
    };
    let card = stored.card;
    println!(
        "Card {id} is {} with an interval of {} days and ease {:.2}. Next review at {}.",
        card.state.status(),
        card.interval_days,
        card.ease_factor,
        card.next_review
    );
    Ok(())
}

pub fn list_due(directory: Option<String>, now: Timestamp) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let due = coll.db.due_cards(now)?;
    if due.is_empty() {
        println!("No cards due.");
        return Ok(());
    }
    for stored in due {
        println!(
            "{}\t{}\t{}",
            stored.id,
            stored.card.state.status(),
            stored.front
        );
    }
    Ok(())
}

pub fn show_card(directory: Option<String>, id: RecordId) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    match coll.db.get_card(&id)? {
        Some(stored) => {
            println!("{}", serde_json::to_string_pretty(&stored)?);
            Ok(())
        }
        None => fail(format!("no card with id {id}")),
    }
}

/// Replaces the text of a card, keeping its schedule.
pub fn edit_card(
    directory: Option<String>,
    id: RecordId,
    front: Option<String>,
    back: Option<String>,
) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    if !coll.db.edit_card(&id, front.as_deref(), back.as_deref())? {
        return fail(format!("no card with id {id}"));
    }
    println!("Updated card {id}.");
    Ok(())
}

pub fn delete_card(directory: Option<String>, id: RecordId) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    if !coll.db.delete_card(&id)? {
        return fail(format!("no card with id {id}"));
    }
    println!("Deleted card {id}.");
    Ok(())
}
