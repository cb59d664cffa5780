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

use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::params;
use serde::Deserialize;
use serde::Serialize;
use studydesk_core::CardState;
use studydesk_core::Category;
use studydesk_core::Grade;
use studydesk_core::NonStudyDays;
use studydesk_core::RecordId;
use studydesk_core::ReviewCard;
use studydesk_core::RevisionItem;
use studydesk_core::RevisionUpdate;
use studydesk_core::Timestamp;
use studydesk_core::advance_revision;
use studydesk_core::complete_revision;
use studydesk_core::grade_card;
use studydesk_core::postpone_revision;

use crate::error::Context;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;

const SCHEMA: &str = "
create table if not exists cards (
    id text primary key,
    front text not null,
    back text not null,
    created_at text not null,
    last_reviewed_at text,
    ease_factor real not null,
    interval_days integer not null,
    review_count integer not null,
    lapses integer not null,
    status text not null,
    learning_step integer not null,
    next_review text not null
);

create table if not exists revisions (
    id text primary key,
    title text not null,
    created_at text not null,
    revision_count integer not null,
    next_revision_date text not null,
    interval_days integer not null,
    completed_at text,
    non_study_days text not null,
    category text not null
);
";

const CARD_COLUMNS: &str = "id, front, back, created_at, last_reviewed_at, ease_factor, \
    interval_days, review_count, lapses, status, learning_step, next_review";

const REVISION_COLUMNS: &str = "id, title, created_at, revision_count, next_revision_date, \
    interval_days, completed_at, non_study_days, category";

static CREATED: AtomicU32 = AtomicU32::new(0);

/// Salt for new record identifiers: unique within this process, and
/// distinct from other processes creating records at the same instant.
fn id_salt() -> u64 {
    let pid = u64::from(std::process::id());
    let count = u64::from(CREATED.fetch_add(1, Ordering::Relaxed));
    (pid << 32) | count
}

/// A flashcard as stored, with its scheduling state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredCard {
    pub id: RecordId,
    pub front: String,
    pub back: String,
    pub created_at: Timestamp,
    /// Stamped by the database when a grade is recorded.
    pub last_reviewed_at: Option<Timestamp>,
    pub card: ReviewCard,
}

impl StoredCard {
    pub fn new(front: String, back: String, now: Timestamp) -> Self {
        Self {
            id: RecordId::derive("card", &front, now, id_salt()),
            front,
            back,
            created_at: now,
            last_reviewed_at: None,
            card: ReviewCard::new(now),
        }
    }
}

/// A revision item as stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredRevision {
    pub id: RecordId,
    pub title: String,
    pub item: RevisionItem,
}

impl StoredRevision {
    pub fn new(title: String, non_study_days: NonStudyDays, now: Timestamp) -> Fallible<Self> {
        Ok(Self {
            id: RecordId::derive("revision", &title, now, id_salt()),
            title,
            item: RevisionItem::new(now, non_study_days)?,
        })
    }
}

/// Manual actions on a revision item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevisionAction {
    Complete,
    Postpone,
    Advance,
}

impl RevisionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RevisionAction::Complete => "complete",
            RevisionAction::Postpone => "postpone",
            RevisionAction::Advance => "advance",
        }
    }

    fn update(self, item: &RevisionItem, now: Timestamp) -> Fallible<RevisionUpdate> {
        match self {
            RevisionAction::Complete => Ok(complete_revision(now)),
            RevisionAction::Postpone => postpone_revision(now),
            RevisionAction::Advance => advance_revision(item),
        }
    }
}

impl FromStr for RevisionAction {
    type Err = ErrorReport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "complete" => Ok(RevisionAction::Complete),
            "postpone" => Ok(RevisionAction::Postpone),
            "advance" => Ok(RevisionAction::Advance),
            _ => fail(format!("unknown revision action '{s}'")),
        }
    }
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(path: &Path) -> Fallible<Self> {
        let conn = Connection::open(path).context("failed to open database")?;
        Self::with_connection(conn)
    }

    #[cfg(test)]
    pub fn in_memory() -> Fallible<Self> {
        let conn = Connection::open_in_memory().context("failed to open database")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Fallible<Self> {
        conn.execute_batch(SCHEMA)
            .context("failed to create database schema")?;
        Ok(Self { conn })
    }

    pub fn insert_card(&self, card: &StoredCard) -> Fallible<()> {
        let sql = format!(
            "insert into cards ({CARD_COLUMNS}) values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
        );
        let c = &card.card;
        self.conn
            .execute(
                &sql,
                params![
                    card.id.as_str(),
                    card.front,
                    card.back,
                    card.created_at.to_string(),
                    card.last_reviewed_at.map(|ts| ts.to_string()),
                    c.ease_factor,
                    i64::from(c.interval_days),
                    i64::from(c.review_count),
                    i64::from(c.lapses),
                    c.state.status(),
                    step_to_sql(c.state.learning_step())?,
                    c.next_review.to_string(),
                ],
            )
            .context("failed to insert card")?;
        Ok(())
    }

    pub fn get_card(&self, id: &RecordId) -> Fallible<Option<StoredCard>> {
        select_card(&self.conn, id)
    }

    /// Rewrites the text of a card in place, leaving its schedule alone.
    /// Returns whether the card exists.
    pub fn edit_card(
        &self,
        id: &RecordId,
        front: Option<&str>,
        back: Option<&str>,
    ) -> Fallible<bool> {
        let updated = self
            .conn
            .execute(
                "update cards set front = coalesce(?2, front), back = coalesce(?3, back) \
                 where id = ?1",
                params![id.as_str(), front, back],
            )
            .context("failed to edit card")?;
        Ok(updated > 0)
    }

    /// Returns whether a card was deleted.
    pub fn delete_card(&self, id: &RecordId) -> Fallible<bool> {
        let deleted = self
            .conn
            .execute("delete from cards where id = ?1", params![id.as_str()])
            .context("failed to delete card")?;
        Ok(deleted > 0)
    }

    pub fn list_cards(&self) -> Fallible<Vec<StoredCard>> {
        let sql = format!("select {CARD_COLUMNS} from cards");
        let mut stmt = self.conn.prepare(&sql).context("failed to list cards")?;
        let rows = stmt
            .query_map([], CardRow::read)
            .context("failed to list cards")?;
        let mut cards = Vec::new();
        for row in rows {
            cards.push(row.context("failed to read card")?.decode()?);
        }
        cards.sort_by_key(|card| card.created_at);
        Ok(cards)
    }

    /// Cards eligible for study at `now`, soonest first.
    pub fn due_cards(&self, now: Timestamp) -> Fallible<Vec<StoredCard>> {
        let mut due: Vec<StoredCard> = self
            .list_cards()?
            .into_iter()
            .filter(|card| card.card.is_due(now))
            .collect();
        due.sort_by_key(|card| card.card.next_review);
        Ok(due)
    }

    /// Grades a card and stores the result in one transaction. Returns `None`
    /// if there is no such card.
    pub fn grade_card(
        &mut self,
        id: &RecordId,
        grade: Grade,
        now: Timestamp,
    ) -> Fallible<Option<StoredCard>> {
        let tx = self
            .conn
            .transaction()
            .context("failed to start transaction")?;
        let Some(mut stored) = select_card(&tx, id)? else {
            return Ok(None);
        };
        let update = grade_card(&stored.card, grade, now)?;
        log::debug!(
            "Graded card {id} as {grade}: {} -> {}, next review at {}",
            stored.card.state.status(),
            update.state.unwrap_or(stored.card.state).status(),
            update.next_review
        );
        stored.card = stored.card.merge(update);
        stored.last_reviewed_at = Some(now);
        write_card(&tx, &stored)?;
        tx.commit().context("failed to commit grade")?;
        Ok(Some(stored))
    }

    pub fn insert_revision(&self, revision: &StoredRevision) -> Fallible<()> {
        let sql = format!(
            "insert into revisions ({REVISION_COLUMNS}) values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
        );
        let item = &revision.item;
        self.conn
            .execute(
                &sql,
                params![
                    revision.id.as_str(),
                    revision.title,
                    item.created_at.to_string(),
                    i64::from(item.revision_count),
                    item.next_revision_date.to_string(),
                    i64::from(item.interval_days),
                    item.completed_at.map(|ts| ts.to_string()),
                    serde_json::to_string(&item.non_study_days)?,
                    item.category.as_str(),
                ],
            )
            .context("failed to insert revision")?;
        Ok(())
    }

    pub fn get_revision(&self, id: &RecordId) -> Fallible<Option<StoredRevision>> {
        select_revision(&self.conn, id)
    }

    /// Rewrites the title or non-study days of a revision item in place.
    /// Returns whether the item exists.
    pub fn edit_revision(
        &self,
        id: &RecordId,
        title: Option<&str>,
        non_study_days: Option<NonStudyDays>,
    ) -> Fallible<bool> {
        let days = non_study_days
            .map(|days| serde_json::to_string(&days))
            .transpose()?;
        let updated = self
            .conn
            .execute(
                "update revisions set title = coalesce(?2, title), \
                 non_study_days = coalesce(?3, non_study_days) where id = ?1",
                params![id.as_str(), title, days],
            )
            .context("failed to edit revision")?;
        Ok(updated > 0)
    }

    /// Returns whether a revision item was deleted.
    pub fn delete_revision(&self, id: &RecordId) -> Fallible<bool> {
        let deleted = self
            .conn
            .execute("delete from revisions where id = ?1", params![id.as_str()])
            .context("failed to delete revision")?;
        Ok(deleted > 0)
    }

    pub fn list_revisions(&self) -> Fallible<Vec<StoredRevision>> {
        let sql = format!("select {REVISION_COLUMNS} from revisions");
        let mut stmt = self
            .conn
            .prepare(&sql)
            .context("failed to list revisions")?;
        let rows = stmt
            .query_map([], RevisionRow::read)
            .context("failed to list revisions")?;
        let mut revisions = Vec::new();
        for row in rows {
            revisions.push(row.context("failed to read revision")?.decode()?);
        }
        revisions.sort_by_key(|revision| revision.item.next_revision_date);
        Ok(revisions)
    }

    /// Applies a manual action to a revision item in one transaction. Returns
    /// `None` if there is no such item.
    pub fn apply_revision_action(
        &mut self,
        id: &RecordId,
        action: RevisionAction,
        now: Timestamp,
    ) -> Fallible<Option<StoredRevision>> {
        let tx = self
            .conn
            .transaction()
            .context("failed to start transaction")?;
        let Some(mut stored) = select_revision(&tx, id)? else {
            return Ok(None);
        };
        let update = action.update(&stored.item, now)?;
        stored.item = stored.item.merge(update);
        log::debug!(
            "Applied {} to revision {id}: next revision at {}",
            action.as_str(),
            stored.item.next_revision_date
        );
        write_revision(&tx, &stored)?;
        tx.commit().context("failed to commit revision")?;
        Ok(Some(stored))
    }
}

fn select_card(conn: &Connection, id: &RecordId) -> Fallible<Option<StoredCard>> {
    let sql = format!("select {CARD_COLUMNS} from cards where id = ?1");
    let row = conn
        .query_row(&sql, params![id.as_str()], CardRow::read)
        .optional()
        .context("failed to read card")?;
    row.map(CardRow::decode).transpose()
}

fn write_card(conn: &Connection, card: &StoredCard) -> Fallible<()> {
    let c = &card.card;
    let updated = conn
        .execute(
            "update cards set front = ?2, back = ?3, last_reviewed_at = ?4, ease_factor = ?5, \
             interval_days = ?6, review_count = ?7, lapses = ?8, status = ?9, \
             learning_step = ?10, next_review = ?11 where id = ?1",
            params![
                card.id.as_str(),
                card.front,
                card.back,
                card.last_reviewed_at.map(|ts| ts.to_string()),
                c.ease_factor,
                i64::from(c.interval_days),
                i64::from(c.review_count),
                i64::from(c.lapses),
                c.state.status(),
                step_to_sql(c.state.learning_step())?,
                c.next_review.to_string(),
            ],
        )
        .context("failed to update card")?;
    if updated == 0 {
        return fail(format!("no card with id {}", card.id));
    }
    Ok(())
}

fn select_revision(conn: &Connection, id: &RecordId) -> Fallible<Option<StoredRevision>> {
    let sql = format!("select {REVISION_COLUMNS} from revisions where id = ?1");
    let row = conn
        .query_row(&sql, params![id.as_str()], RevisionRow::read)
        .optional()
        .context("failed to read revision")?;
    row.map(RevisionRow::decode).transpose()
}

fn write_revision(conn: &Connection, revision: &StoredRevision) -> Fallible<()> {
    let item = &revision.item;
    let updated = conn
        .execute(
            "update revisions set title = ?2, revision_count = ?3, next_revision_date = ?4, \
             interval_days = ?5, completed_at = ?6, non_study_days = ?7, category = ?8 \
             where id = ?1",
            params![
                revision.id.as_str(),
                revision.title,
                i64::from(item.revision_count),
                item.next_revision_date.to_string(),
                i64::from(item.interval_days),
                item.completed_at.map(|ts| ts.to_string()),
                serde_json::to_string(&item.non_study_days)?,
                item.category.as_str(),
            ],
        )
        .context("failed to update revision")?;
    if updated == 0 {
        return fail(format!("no revision with id {}", revision.id));
    }
    Ok(())
}

fn step_to_sql(step: usize) -> Fallible<i64> {
    i64::try_from(step).map_err(|_| ErrorReport::new(format!("learning step out of range: {step}")))
}

fn count_from_sql(value: i64, column: &str) -> Fallible<u32> {
    u32::try_from(value)
        .map_err(|_| ErrorReport::new(format!("invalid {column} in database: {value}")))
}

fn timestamp_from_sql(value: String) -> Fallible<Timestamp> {
    Timestamp::try_from(value)
}

/// The raw columns of a card row.
struct CardRow {
    id: String,
    front: String,
    back: String,
    created_at: String,
    last_reviewed_at: Option<String>,
    ease_factor: f64,
    interval_days: i64,
    review_count: i64,
    lapses: i64,
    status: String,
    learning_step: i64,
    next_review: String,
}

impl CardRow {
    fn read(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            front: row.get(1)?,
            back: row.get(2)?,
            created_at: row.get(3)?,
            last_reviewed_at: row.get(4)?,
            ease_factor: row.get(5)?,
            interval_days: row.get(6)?,
            review_count: row.get(7)?,
            lapses: row.get(8)?,
            status: row.get(9)?,
            learning_step: row.get(10)?,
            next_review: row.get(11)?,
        })
    }

    fn decode(self) -> Fallible<StoredCard> {
        let learning_step = usize::try_from(self.learning_step).map_err(|_| {
            ErrorReport::new(format!(
                "invalid learning_step in database: {}",
                self.learning_step
            ))
        })?;
        let card = ReviewCard {
            ease_factor: self.ease_factor,
            interval_days: count_from_sql(self.interval_days, "interval_days")?,
            review_count: count_from_sql(self.review_count, "review_count")?,
            lapses: count_from_sql(self.lapses, "lapses")?,
            state: CardState::from_parts(&self.status, learning_step)?,
            next_review: timestamp_from_sql(self.next_review)?,
        };
        card.validate()?;
        Ok(StoredCard {
            id: RecordId::new(self.id)?,
            front: self.front,
            back: self.back,
            created_at: timestamp_from_sql(self.created_at)?,
            last_reviewed_at: self.last_reviewed_at.map(timestamp_from_sql).transpose()?,
            card,
        })
    }
}

/// The raw columns of a revision row.
struct RevisionRow {
    id: String,
    title: String,
    created_at: String,
    revision_count: i64,
    next_revision_date: String,
    interval_days: i64,
    completed_at: Option<String>,
    non_study_days: String,
    category: String,
}

impl RevisionRow {
    fn read(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            created_at: row.get(2)?,
            revision_count: row.get(3)?,
            next_revision_date: row.get(4)?,
            interval_days: row.get(5)?,
            completed_at: row.get(6)?,
            non_study_days: row.get(7)?,
            category: row.get(8)?,
        })
    }

    fn decode(self) -> Fallible<StoredRevision> {
        let non_study_days: NonStudyDays = serde_json::from_str(&self.non_study_days)?;
        let category: Category = self.category.parse()?;
        let item = RevisionItem {
            created_at: timestamp_from_sql(self.created_at)?,
            revision_count: count_from_sql(self.revision_count, "revision_count")?,
            next_revision_date: timestamp_from_sql(self.next_revision_date)?,
            interval_days: count_from_sql(self.interval_days, "interval_days")?,
            completed_at: self.completed_at.map(timestamp_from_sql).transpose()?,
            non_study_days,
            category,
        };
        item.validate()?;
        Ok(StoredRevision {
            id: RecordId::new(self.id)?,
            title: self.title,
            item,
        })
    }
}
