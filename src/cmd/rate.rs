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

use reviewkit_core::ErrorReport;
use reviewkit_core::Fallible;
use reviewkit_core::ItemId;
use reviewkit_core::LearnerId;
use reviewkit_core::Quality;
use reviewkit_core::ReviewState;
use reviewkit_core::Timestamp;
use reviewkit_core::rating::record_rating;

use crate::cmd::Context;

/// Attempts before a lost race is reported to the user.
const MAX_ATTEMPTS: usize = 3;

/// Parses a rating given as a name (`fail`, `partial`, `full`) or a number.
/// Numbers are read on the 0..2 scale, or the 1..3 scale if `legacy`.
pub fn parse_quality(text: &str, legacy: bool) -> Fallible<Quality> {
    let text = text.trim();
    match text.parse::<i64>() {
        Ok(n) if legacy => Quality::from_mastery_level(n),
        Ok(n) => Quality::from_score(n),
        Err(_) if legacy => Err(ErrorReport::invalid_quality(format!(
            "legacy mastery levels are numbers from 1 to 3, got: {text}"
        ))),
        Err(_) => Quality::try_from(text.to_lowercase()),
    }
}

pub fn rate_item(
    ctx: &Context,
    learner: LearnerId,
    item: ItemId,
    quality: Quality,
    now: Timestamp,
) -> Fallible<ReviewState> {
    let mut attempt = 1;
    loop {
        match record_rating(
            &ctx.db,
            &ctx.db,
            &ctx.config.scheduler,
            learner,
            item,
            quality,
            now,
        ) {
            Ok(state) => return Ok(state),
            Err(e) if e.is_retryable() && attempt < MAX_ATTEMPTS => {
                log::warn!("Rating item {item} raced with another write (attempt {attempt}): {e}");
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

pub fn print_rated(state: &ReviewState) {
    let due = match state.next_due_at {
        Some(due) => due.to_string(),
        None => "now".to_string(),
    };
    println!(
        "Item {}: {}, ease {:.2}, interval {} day(s), next due {due}.",
        state.item,
        state.status.as_str(),
        state.ease_factor,
        state.interval_days,
    );
}
