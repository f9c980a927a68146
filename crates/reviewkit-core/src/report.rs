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

//! Weekly activity and mastery summary for one learner.

use chrono::Datelike;
use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveTime;
use serde::Deserialize;
use serde::Serialize;

use crate::rng::TinyRng;
use crate::rng::sample;
use crate::scheduler::Quality;
use crate::types::ids::ItemId;
use crate::types::review_state::ReviewState;
use crate::types::timestamp::Timestamp;

/// How many weak items to recommend.
pub const WEAK_SAMPLE_SIZE: usize = 3;

/// Seven days from midnight of `start`, end exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl ReportWindow {
    pub fn week_starting(day: NaiveDate) -> Self {
        let start = Timestamp::new(day.and_time(NaiveTime::MIN));
        Self {
            start,
            end: start.plus_days(7),
        }
    }

    /// The Monday-to-Sunday week containing `ts`.
    pub fn week_of(ts: Timestamp) -> Self {
        let day = ts.into_inner().date();
        let back = Duration::days(i64::from(day.weekday().num_days_from_monday()));
        let monday = day.checked_sub_signed(back).unwrap_or(day);
        Self::week_starting(monday)
    }

    pub fn contains(&self, ts: Timestamp) -> bool {
        self.start <= ts && ts < self.end
    }

    pub fn first_day(&self) -> NaiveDate {
        self.start.into_inner().date()
    }

    pub fn last_day(&self) -> NaiveDate {
        let end = self.end.into_inner().date();
        end.pred_opt().unwrap_or(end)
    }
}

/// Mastery distribution of a learner's items, with the week's activity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MasteryReport {
    pub window: ReportWindow,
    /// Items created within the window.
    pub uploaded: usize,
    /// Items last rated within the window.
    pub reviews: usize,
    pub fail: usize,
    pub partial: usize,
    pub full: usize,
    pub unrated: usize,
    /// Items last rated below full recall, picked at random.
    pub recommended: Vec<ItemId>,
}

impl MasteryReport {
    pub fn total(&self) -> usize {
        self.fail + self.partial + self.full + self.unrated
    }
}

/// Summarizes `states`. The count of items created in the window comes
/// from the caller, since review states do not record it.
pub fn mastery_report(
    states: &[ReviewState],
    window: ReportWindow,
    uploaded: usize,
    rng: &mut TinyRng,
) -> MasteryReport {
    let mut report = MasteryReport {
        window,
        uploaded,
        reviews: 0,
        fail: 0,
        partial: 0,
        full: 0,
        unrated: 0,
        recommended: Vec::new(),
    };
    let mut weak: Vec<ItemId> = Vec::new();
    for state in states {
        match state.last_quality {
            None => report.unrated += 1,
            Some(Quality::Fail) => report.fail += 1,
            Some(Quality::Partial) => report.partial += 1,
            Some(Quality::Full) => report.full += 1,
        }
        if matches!(state.last_quality, Some(Quality::Fail | Quality::Partial)) {
            weak.push(state.item);
        }
        if state.last_rated_at.is_some_and(|t| window.contains(t)) {
            report.reviews += 1;
        }
    }
    weak.sort();
    let mut recommended = sample(weak, WEAK_SAMPLE_SIZE, rng);
    recommended.sort();
    report.recommended = recommended;
    report
}
