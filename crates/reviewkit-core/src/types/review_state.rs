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

use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::scheduler::Days;
use crate::scheduler::Ease;
use crate::scheduler::Quality;
use crate::scheduler::Schedule;
use crate::scheduler::SchedulerParams;
use crate::scheduler::next_schedule;
use crate::types::ids::ItemId;
use crate::types::ids::LearnerId;
use crate::types::ids::TopicId;
use crate::types::timestamp::Timestamp;

/// Outcome recorded against an item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemStatus {
    /// Registered, not yet answered.
    Pending,
    /// Answered wrong, or last rated below full recall.
    Wrong,
    /// Last rated as fully recalled.
    Correct,
}

impl ItemStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Wrong => "wrong",
            ItemStatus::Correct => "correct",
        }
    }

    pub fn is_success(self) -> bool {
        self == ItemStatus::Correct
    }
}

impl TryFrom<String> for ItemStatus {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(ItemStatus::Pending),
            "wrong" => Ok(ItemStatus::Wrong),
            "correct" => Ok(ItemStatus::Correct),
            _ => Err(ErrorReport::new(format!("invalid item status: {value}"))),
        }
    }
}

/// Scheduling state for one (learner, item) pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewState {
    pub learner: LearnerId,
    pub item: ItemId,
    pub topic: TopicId,
    pub status: ItemStatus,
    /// Governs interval growth. Never below the scheduler's floor.
    pub ease_factor: Ease,
    /// Days until the next review after the most recent rating. Zero until
    /// the first rating.
    pub interval_days: Days,
    /// Consecutive successful reviews.
    pub repetitions: u32,
    /// Absent until the first rating.
    pub next_due_at: Option<Timestamp>,
    pub last_rated_at: Option<Timestamp>,
    pub last_quality: Option<Quality>,
    /// Revision counter for optimistic concurrency. Zero means the state has
    /// never been stored.
    pub version: u64,
}

impl ReviewState {
    /// A state that has never been rated.
    pub fn new(
        params: &SchedulerParams,
        learner: LearnerId,
        item: ItemId,
        topic: TopicId,
        status: ItemStatus,
    ) -> Self {
        Self {
            learner,
            item,
            topic,
            status,
            ease_factor: params.initial_ease,
            interval_days: 0,
            repetitions: 0,
            next_due_at: None,
            last_rated_at: None,
            last_quality: None,
            version: 0,
        }
    }

    pub fn is_rated(&self) -> bool {
        self.last_rated_at.is_some()
    }

    fn schedule(&self) -> Schedule {
        Schedule {
            ease: self.ease_factor,
            interval: self.interval_days,
            repetitions: self.repetitions,
        }
    }
}

/// Applies a rating to a state. Pure: the caller persists the result.
pub fn update_review_state(
    params: &SchedulerParams,
    state: &ReviewState,
    quality: Quality,
    rated_at: Timestamp,
) -> ReviewState {
    let Schedule {
        ease,
        interval,
        repetitions,
    } = next_schedule(params, state.schedule(), quality);
    let status = match quality {
        Quality::Full => ItemStatus::Correct,
        Quality::Fail | Quality::Partial => ItemStatus::Wrong,
    };
    ReviewState {
        learner: state.learner,
        item: state.item,
        topic: state.topic.clone(),
        status,
        ease_factor: ease,
        interval_days: interval,
        repetitions,
        next_due_at: Some(rated_at.plus_days(interval)),
        last_rated_at: Some(rated_at),
        last_quality: Some(quality),
        version: state.version,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn make_timestamp(s: &str) -> Timestamp {
        let ndt = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.3f").unwrap();
        Timestamp::new(ndt)
    }

    fn fresh() -> ReviewState {
        ReviewState::new(
            &SchedulerParams::default(),
            LearnerId(1),
            ItemId(10),
            TopicId::new("algebra"),
            ItemStatus::Pending,
        )
    }

    #[test]
    fn test_new() {
        let state = fresh();
        assert!(!state.is_rated());
        assert_eq!(state.interval_days, 0);
        assert_eq!(state.next_due_at, None);
        assert!(approx_eq(state.ease_factor, 2.5));
    }

    #[test]
    fn test_full_full_full() {
        let params = SchedulerParams::default();
        let t0 = make_timestamp("2024-01-01T12:00:00.000");
        let s1 = update_review_state(&params, &fresh(), Quality::Full, t0);
        assert!(approx_eq(s1.ease_factor, 2.6));
        assert_eq!((s1.interval_days, s1.repetitions), (1, 1));
        assert_eq!(s1.next_due_at, Some(make_timestamp("2024-01-02T12:00:00.000")));
        assert_eq!(s1.status, ItemStatus::Correct);

        let t1 = make_timestamp("2024-01-02T12:00:00.000");
        let s2 = update_review_state(&params, &s1, Quality::Full, t1);
        assert!(approx_eq(s2.ease_factor, 2.7));
        assert_eq!((s2.interval_days, s2.repetitions), (6, 2));

        let t2 = make_timestamp("2024-01-08T12:00:00.000");
        let s3 = update_review_state(&params, &s2, Quality::Full, t2);
        assert!(approx_eq(s3.ease_factor, 2.8));
        assert_eq!((s3.interval_days, s3.repetitions), (16, 3));
        assert_eq!(s3.next_due_at, Some(make_timestamp("2024-01-24T12:00:00.000")));
    }

    #[test]
    fn test_fail_marks_wrong() {
        let params = SchedulerParams::default();
        let t0 = make_timestamp("2024-03-01T09:30:00.000");
        let state = update_review_state(&params, &fresh(), Quality::Fail, t0);
        assert!(approx_eq(state.ease_factor, 2.0));
        assert_eq!((state.interval_days, state.repetitions), (1, 0));
        assert_eq!(state.status, ItemStatus::Wrong);
        assert_eq!(state.last_quality, Some(Quality::Fail));
    }

    /// After every update, the due date is the rating time plus the interval.
    #[test]
    fn test_due_date_follows_interval() {
        let params = SchedulerParams::default();
        let mut state = fresh();
        let mut now = make_timestamp("2024-01-01T00:00:00.000");
        let qualities = [
            Quality::Full,
            Quality::Partial,
            Quality::Full,
            Quality::Fail,
            Quality::Full,
            Quality::Full,
            Quality::Partial,
        ];
        for q in qualities {
            state = update_review_state(&params, &state, q, now);
            assert_eq!(state.last_rated_at, Some(now));
            assert_eq!(state.next_due_at, Some(now.plus_days(state.interval_days)));
            now = now.plus_days(state.interval_days);
        }
    }

    #[test]
    fn test_update_keeps_identity_and_version() {
        let params = SchedulerParams::default();
        let mut state = fresh();
        state.version = 4;
        let t0 = make_timestamp("2024-01-01T00:00:00.000");
        let next = update_review_state(&params, &state, Quality::Partial, t0);
        assert_eq!(next.learner, state.learner);
        assert_eq!(next.item, state.item);
        assert_eq!(next.topic, state.topic);
        assert_eq!(next.version, 4);
    }

    #[test]
    fn test_status_strings() {
        for status in [ItemStatus::Pending, ItemStatus::Wrong, ItemStatus::Correct] {
            assert_eq!(
                ItemStatus::try_from(status.as_str().to_string()).unwrap(),
                status
            );
        }
        assert!(ItemStatus::try_from("done".to_string()).is_err());
    }
}
