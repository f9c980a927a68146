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

use crate::error::Fallible;
use crate::scheduler::Quality;
use crate::scheduler::SchedulerParams;
use crate::store::ReviewStore;
use crate::store::TopicResolver;
use crate::types::ids::ItemId;
use crate::types::ids::LearnerId;
use crate::types::ids::TopicId;
use crate::types::review_state::ItemStatus;
use crate::types::review_state::ReviewState;
use crate::types::review_state::update_review_state;
use crate::types::timestamp::Timestamp;

/// Reads the current state of an item, applies a rating, and writes it back
/// guarded by the version that was read.
///
/// A `ConcurrentModification` error means another rating won the race; the
/// caller should call this again, not replay the write.
pub fn record_rating(
    store: &impl ReviewStore,
    topics: &impl TopicResolver,
    params: &SchedulerParams,
    learner: LearnerId,
    item: ItemId,
    quality: Quality,
    now: Timestamp,
) -> Fallible<ReviewState> {
    let current = match store.get_state(learner, item)? {
        Some(state) => state,
        None => ReviewState::new(
            params,
            learner,
            item,
            topics.topic_of(item)?,
            ItemStatus::Pending,
        ),
    };
    let next = update_review_state(params, &current, quality, now);
    let stored = store.upsert_state(&next, current.version)?;
    log::debug!(
        "Rated item {item} for learner {learner} as {}: next due {}",
        quality.as_str(),
        stored
            .next_due_at
            .map(|t| t.to_string())
            .unwrap_or_default()
    );
    Ok(stored)
}

/// Records that a learner has an item with the given outcome, without
/// scheduling it. A non-success status makes the item due right away. An
/// existing state is returned unchanged.
pub fn register_item(
    store: &impl ReviewStore,
    params: &SchedulerParams,
    learner: LearnerId,
    item: ItemId,
    topic: TopicId,
    status: ItemStatus,
) -> Fallible<ReviewState> {
    if let Some(existing) = store.get_state(learner, item)? {
        return Ok(existing);
    }
    let state = ReviewState::new(params, learner, item, topic, status);
    store.upsert_state(&state, 0)
}
