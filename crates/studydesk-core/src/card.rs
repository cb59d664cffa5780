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

//! Card review scheduling: sub-day learning steps followed by day-scale
//! review intervals that grow or shrink with an ease factor.

use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::grade::Grade;
use crate::types::timestamp::Timestamp;

pub type Ease = f64;

/// Waiting periods in minutes for each learning step.
pub const LEARNING_STEPS: [i64; 2] = [1, 10];

/// Interval in days after graduating through the learning steps.
pub const GRADUATING_INTERVAL: u32 = 1;

/// Interval in days after graduating straight from learning with `easy`.
pub const EASY_INTERVAL: u32 = 4;

pub const STARTING_EASE: Ease = 2.5;

pub const MINIMUM_EASE: Ease = 1.3;

/// Intervals of at least this many days mark a card as learned.
pub const LEARNED_THRESHOLD: u32 = 21;

/// Divisor applied to the interval on `hard`.
const HARD_PENALTY: f64 = 1.2;

/// Extra multiplier applied to the interval on `easy`.
const EASY_BONUS: f64 = 1.3;

const LAPSE_EASE_PENALTY: Ease = 0.2;
const HARD_EASE_PENALTY: Ease = 0.15;
const EASY_EASE_BONUS: Ease = 0.15;

/// The minimum review interval in days.
const MIN_INTERVAL: u32 = 1;

/// The lifecycle phase of a card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CardState {
    /// Short, sub-day steps before the card graduates.
    Learning { learning_step: usize },
    /// Graduated, with an interval below the learned threshold.
    Reviewing,
    /// Graduated, with a long interval.
    Learned,
}

impl CardState {
    pub fn status(&self) -> &'static str {
        match self {
            CardState::Learning { .. } => "learning",
            CardState::Reviewing => "reviewing",
            CardState::Learned => "learned",
        }
    }

    /// The current learning step. Zero outside the learning phase.
    pub fn learning_step(&self) -> usize {
        match self {
            CardState::Learning { learning_step } => *learning_step,
            CardState::Reviewing | CardState::Learned => 0,
        }
    }

    /// Rebuilds a state from its stored status name and learning step.
    pub fn from_parts(status: &str, learning_step: usize) -> Fallible<Self> {
        match status {
            "learning" => Ok(CardState::Learning { learning_step }),
            "reviewing" => Ok(CardState::Reviewing),
            "learned" => Ok(CardState::Learned),
            _ => fail(format!("invalid card status: '{status}'")),
        }
    }
}

/// Scheduling information for a card.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewCard {
    pub ease_factor: Ease,
    /// Days until the next review once the card has graduated.
    pub interval_days: u32,
    /// Number of grades applied to the card.
    pub review_count: u32,
    /// Number of times the card fell from review back into learning.
    pub lapses: u32,
    pub state: CardState,
    /// When the card becomes eligible for study.
    pub next_review: Timestamp,
}

impl ReviewCard {
    /// A card that has never been reviewed, due immediately.
    pub fn new(now: Timestamp) -> Self {
        Self {
            ease_factor: STARTING_EASE,
            interval_days: 0,
            review_count: 0,
            lapses: 0,
            state: CardState::Learning { learning_step: 0 },
            next_review: now,
        }
    }

    pub fn validate(&self) -> Fallible<()> {
        if !self.ease_factor.is_finite() || self.ease_factor < MINIMUM_EASE {
            return fail(format!(
                "ease factor {} is below the minimum of {MINIMUM_EASE}",
                self.ease_factor
            ));
        }
        match self.state {
            CardState::Learning { learning_step } if learning_step >= LEARNING_STEPS.len() => {
                fail(format!(
                    "learning step {learning_step} is out of range: there are {} steps",
                    LEARNING_STEPS.len()
                ))
            }
            _ => Ok(()),
        }
    }

    pub fn is_due(&self, now: Timestamp) -> bool {
        self.next_review <= now
    }

    /// Applies the fields present in `update`.
    pub fn merge(self, update: CardUpdate) -> Self {
        Self {
            ease_factor: update.ease_factor.unwrap_or(self.ease_factor),
            interval_days: update.interval_days.unwrap_or(self.interval_days),
            review_count: update.review_count,
            lapses: update.lapses.unwrap_or(self.lapses),
            state: update.state.unwrap_or(self.state),
            next_review: update.next_review,
        }
    }
}

/// The fields of a card changed by a single grade.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ease_factor: Option<Ease>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lapses: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<CardState>,
    pub review_count: u32,
    pub next_review: Timestamp,
}

impl CardUpdate {
    fn new(review_count: u32, next_review: Timestamp) -> Self {
        Self {
            ease_factor: None,
            interval_days: None,
            lapses: None,
            state: None,
            review_count,
            next_review,
        }
    }
}

/// Computes the changes to `card` after it is graded at `now`.
pub fn grade_card(card: &ReviewCard, grade: Grade, now: Timestamp) -> Fallible<CardUpdate> {
    card.validate()?;
    let review_count = card
        .review_count
        .checked_add(1)
        .ok_or_else(|| ErrorReport::new("review count out of range"))?;
    match card.state {
        CardState::Learning { learning_step } => {
            grade_learning(learning_step, grade, review_count, now)
        }
        CardState::Reviewing | CardState::Learned => grade_review(card, grade, review_count, now),
    }
}

fn grade_learning(
    learning_step: usize,
    grade: Grade,
    review_count: u32,
    now: Timestamp,
) -> Fallible<CardUpdate> {
    let last_step = LEARNING_STEPS.len() - 1;
    match grade {
        Grade::Again => learning_update(0, review_count, now),
        Grade::Hard => learning_update(learning_step, review_count, now),
        Grade::Good => {
            let next_step = learning_step + 1;
            if next_step > last_step {
                graduate(
                    CardState::Reviewing,
                    GRADUATING_INTERVAL,
                    review_count,
                    now,
                )
            } else {
                learning_update(next_step, review_count, now)
            }
        }
        Grade::Easy => graduate(CardState::Learned, EASY_INTERVAL, review_count, now),
    }
}

fn learning_update(step: usize, review_count: u32, now: Timestamp) -> Fallible<CardUpdate> {
    let mut update = CardUpdate::new(review_count, now.plus_minutes(LEARNING_STEPS[step])?);
    update.state = Some(CardState::Learning {
        learning_step: step,
    });
    Ok(update)
}

fn graduate(
    state: CardState,
    interval_days: u32,
    review_count: u32,
    now: Timestamp,
) -> Fallible<CardUpdate> {
    let mut update = CardUpdate::new(review_count, now.plus_days(interval_days.into())?);
    update.state = Some(state);
    update.interval_days = Some(interval_days);
    Ok(update)
}

fn grade_review(
    card: &ReviewCard,
    grade: Grade,
    review_count: u32,
    now: Timestamp,
) -> Fallible<CardUpdate> {
    let ease: Ease = card.ease_factor;
    let interval: f64 = card.interval_days.into();
    let (interval, ease_factor): (f64, Option<Ease>) = match grade {
        Grade::Again => {
            // The interval is kept as it was.
            let mut update = learning_update(0, review_count, now)?;
            update.lapses = Some(
                card.lapses
                    .checked_add(1)
                    .ok_or_else(|| ErrorReport::new("lapse count out of range"))?,
            );
            update.ease_factor = Some((ease - LAPSE_EASE_PENALTY).max(MINIMUM_EASE));
            return Ok(update);
        }
        Grade::Hard => (
            (interval / HARD_PENALTY).round(),
            Some((ease - HARD_EASE_PENALTY).max(MINIMUM_EASE)),
        ),
        Grade::Good => ((interval * ease).round(), None),
        Grade::Easy => (
            (interval * ease * EASY_BONUS).round(),
            Some(ease + EASY_EASE_BONUS),
        ),
    };
    let interval_days: u32 = whole_days(interval)?;
    let state = if interval_days >= LEARNED_THRESHOLD {
        CardState::Learned
    } else {
        CardState::Reviewing
    };
    let mut update = CardUpdate::new(review_count, now.plus_days(interval_days.into())?);
    update.ease_factor = ease_factor;
    update.interval_days = Some(interval_days);
    update.state = Some(state);
    Ok(update)
}

fn whole_days(interval: f64) -> Fallible<u32> {
    if interval > f64::from(u32::MAX) {
        return fail(format!("interval of {interval} days is out of range"));
    }
    Ok((interval as u32).max(MIN_INTERVAL))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn ts(s: &str) -> Timestamp {
        Timestamp::try_from(s.to_string()).unwrap()
    }

    fn now() -> Timestamp {
        ts("2024-01-01T12:00:00.000+00:00")
    }

    fn learning(step: usize, review_count: u32) -> ReviewCard {
        ReviewCard {
            state: CardState::Learning {
                learning_step: step,
            },
            review_count,
            ..ReviewCard::new(now())
        }
    }

    fn reviewing(interval_days: u32, ease_factor: Ease) -> ReviewCard {
        ReviewCard {
            ease_factor,
            interval_days,
            review_count: 5,
            lapses: 0,
            state: CardState::Reviewing,
            next_review: now(),
        }
    }

    fn minutes_after_now(update: &CardUpdate) -> i64 {
        (update.next_review.as_millis() - now().as_millis()) / 60_000
    }

    #[test]
    fn test_new_card() {
        let card = ReviewCard::new(now());
        assert_eq!(card.state, CardState::Learning { learning_step: 0 });
        assert_eq!(card.review_count, 0);
        assert_eq!(card.lapses, 0);
        assert!(approx_eq(card.ease_factor, STARTING_EASE));
        assert!(card.is_due(now()));
    }

    #[test]
    fn test_learning_again_resets_to_first_step() -> Fallible<()> {
        let update = grade_card(&learning(1, 2), Grade::Again, now())?;
        assert_eq!(update.state, Some(CardState::Learning { learning_step: 0 }));
        assert_eq!(minutes_after_now(&update), 1);
        assert_eq!(update.review_count, 3);
        assert_eq!(update.ease_factor, None);
        Ok(())
    }

    #[test]
    fn test_learning_hard_repeats_step() -> Fallible<()> {
        let update = grade_card(&learning(1, 0), Grade::Hard, now())?;
        assert_eq!(update.state, Some(CardState::Learning { learning_step: 1 }));
        assert_eq!(minutes_after_now(&update), 10);

        let update = grade_card(&learning(0, 0), Grade::Hard, now())?;
        assert_eq!(minutes_after_now(&update), 1);
        Ok(())
    }

    #[test]
    fn test_rejects_out_of_range_step() {
        let card = learning(LEARNING_STEPS.len(), 0);
        assert!(card.validate().is_err());
        assert!(learning(99, 0).validate().is_err());
        for grade in Grade::ALL {
            assert!(grade_card(&learning(99, 0), grade, now()).is_err());
        }
        assert!(learning(LEARNING_STEPS.len() - 1, 0).validate().is_ok());
    }

    #[test]
    fn test_learning_good_advances_step() -> Fallible<()> {
        let update = grade_card(&learning(0, 1), Grade::Good, now())?;
        assert_eq!(update.state, Some(CardState::Learning { learning_step: 1 }));
        assert_eq!(minutes_after_now(&update), 10);
        assert_eq!(update.interval_days, None);
        Ok(())
    }

    #[test]
    fn test_graduation() -> Fallible<()> {
        let card = learning(1, 3);
        let update = grade_card(&card, Grade::Good, now())?;
        let card = card.merge(update);
        assert_eq!(card.state, CardState::Reviewing);
        assert_eq!(card.state.learning_step(), 0);
        assert_eq!(card.interval_days, 1);
        assert_eq!(card.review_count, 4);
        assert_eq!(
            card.next_review.as_millis(),
            now().as_millis() + 86_400_000
        );
        Ok(())
    }

    #[test]
    fn test_consecutive_goods_graduate() -> Fallible<()> {
        let mut card = ReviewCard::new(now());
        for _ in 0..LEARNING_STEPS.len() {
            card = card.merge(grade_card(&card, Grade::Good, now())?);
        }
        assert_eq!(card.state, CardState::Reviewing);
        assert_eq!(card.interval_days, GRADUATING_INTERVAL);
        assert_eq!(card.review_count, 2);
        Ok(())
    }

    #[test]
    fn test_learning_easy_graduates_from_any_step() -> Fallible<()> {
        for step in 0..LEARNING_STEPS.len() {
            let card = learning(step, 0).merge(grade_card(&learning(step, 0), Grade::Easy, now())?);
            assert_eq!(card.state, CardState::Learned);
            assert_eq!(card.interval_days, EASY_INTERVAL);
            assert_eq!(
                card.next_review.as_millis(),
                now().as_millis() + 4 * 86_400_000
            );
        }
        Ok(())
    }

    #[test]
    fn test_easy_bonus_compounding() -> Fallible<()> {
        let card = reviewing(10, 2.5);
        let update = grade_card(&card, Grade::Easy, now())?;
        assert_eq!(update.interval_days, Some(33));
        assert!(approx_eq(update.ease_factor.unwrap(), 2.65));
        assert_eq!(update.state, Some(CardState::Learned));
        assert_eq!(
            update.next_review.as_millis(),
            now().as_millis() + 33 * 86_400_000
        );
        Ok(())
    }

    #[test]
    fn test_review_good_multiplies_by_ease() -> Fallible<()> {
        let update = grade_card(&reviewing(6, 2.5), Grade::Good, now())?;
        assert_eq!(update.interval_days, Some(15));
        assert_eq!(update.ease_factor, None);
        assert_eq!(update.state, Some(CardState::Reviewing));

        let update = grade_card(&reviewing(10, 2.5), Grade::Good, now())?;
        assert_eq!(update.interval_days, Some(25));
        assert_eq!(update.state, Some(CardState::Learned));
        Ok(())
    }

    #[test]
    fn test_review_hard_shrinks_interval() -> Fallible<()> {
        let update = grade_card(&reviewing(10, 2.5), Grade::Hard, now())?;
        assert_eq!(update.interval_days, Some(8));
        assert!(approx_eq(update.ease_factor.unwrap(), 2.35));

        let update = grade_card(&reviewing(1, 2.5), Grade::Hard, now())?;
        assert_eq!(update.interval_days, Some(1));
        Ok(())
    }

    #[test]
    fn test_learned_card_drops_back_to_reviewing() -> Fallible<()> {
        let card = ReviewCard {
            state: CardState::Learned,
            ..reviewing(22, 2.0)
        };
        let update = grade_card(&card, Grade::Hard, now())?;
        assert_eq!(update.interval_days, Some(18));
        assert_eq!(update.state, Some(CardState::Reviewing));
        Ok(())
    }

    #[test]
    fn test_zero_interval_is_clamped() -> Fallible<()> {
        let update = grade_card(&reviewing(0, 2.5), Grade::Good, now())?;
        assert_eq!(update.interval_days, Some(1));
        assert!(update.next_review > now());
        Ok(())
    }

    #[test]
    fn test_lapse() -> Fallible<()> {
        for state in [CardState::Reviewing, CardState::Learned] {
            let card = ReviewCard {
                state,
                lapses: 2,
                ..reviewing(30, 2.5)
            };
            let updated = card.merge(grade_card(&card, Grade::Again, now())?);
            assert_eq!(updated.state, CardState::Learning { learning_step: 0 });
            assert_eq!(updated.lapses, 3);
            assert_eq!(updated.interval_days, 30);
            assert!(approx_eq(updated.ease_factor, 2.3));
            assert_eq!(
                updated.next_review.as_millis(),
                now().as_millis() + 60_000
            );
        }
        Ok(())
    }

    #[test]
    fn test_ease_floor() -> Fallible<()> {
        let mut card = reviewing(10, 1.5);
        for i in 0..20 {
            let grade = if i % 3 == 0 { Grade::Again } else { Grade::Hard };
            if let CardState::Learning { .. } = card.state {
                card.state = CardState::Reviewing;
            }
            card = card.merge(grade_card(&card, grade, now())?);
            assert!(card.ease_factor >= MINIMUM_EASE);
        }
        assert!(approx_eq(card.ease_factor, MINIMUM_EASE));
        Ok(())
    }

    #[test]
    fn test_every_grade_counts_a_review() -> Fallible<()> {
        let cards = [learning(0, 7), learning(1, 7), reviewing(3, 2.0)];
        for card in cards {
            for grade in Grade::ALL {
                let card = ReviewCard {
                    review_count: 7,
                    ..card
                };
                assert_eq!(grade_card(&card, grade, now())?.review_count, 8);
            }
        }
        Ok(())
    }

    #[test]
    fn test_next_review_is_in_the_future() -> Fallible<()> {
        let cards = [learning(0, 0), learning(1, 0), reviewing(0, 1.3), reviewing(50, 3.0)];
        for card in cards {
            for grade in Grade::ALL {
                assert!(grade_card(&card, grade, now())?.next_review > now());
            }
        }
        Ok(())
    }

    #[test]
    fn test_rejects_ease_below_minimum() {
        let card = reviewing(10, 1.0);
        assert!(grade_card(&card, Grade::Good, now()).is_err());
        let card = reviewing(10, f64::NAN);
        assert!(grade_card(&card, Grade::Good, now()).is_err());
    }

    #[test]
    fn test_huge_interval_is_an_error() {
        let card = reviewing(u32::MAX, 2.5);
        assert!(grade_card(&card, Grade::Easy, now()).is_err());
    }

    #[test]
    fn test_state_from_parts() -> Fallible<()> {
        assert_eq!(
            CardState::from_parts("learning", 1)?,
            CardState::Learning { learning_step: 1 }
        );
        assert_eq!(CardState::from_parts("learned", 0)?, CardState::Learned);
        assert!(CardState::from_parts("unlearned", 0).is_err());
        Ok(())
    }

    #[test]
    fn test_update_serializes_changed_fields_only() -> Fallible<()> {
        let update = grade_card(&learning(0, 0), Grade::Good, now())?;
        let json = serde_json::to_value(update)?;
        let object = json.as_object().unwrap();
        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(keys, vec!["next_review", "review_count", "state"]);
        assert_eq!(json["state"]["status"], "learning");
        assert_eq!(json["state"]["learning_step"], 1);
        Ok(())
    }
}
