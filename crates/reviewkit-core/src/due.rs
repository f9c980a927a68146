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

use std::collections::BTreeSet;

use crate::error::Fallible;
use crate::store::DueCandidate;
use crate::store::ReviewStore;
use crate::types::ids::ItemId;
use crate::types::ids::LearnerId;
use crate::types::review_state::ReviewState;
use crate::types::timestamp::Timestamp;

/// Whether an item with the given state is due at `as_of`.
///
/// Three cases are due: the item was never rated (no state), it carries a
/// non-success status but was never scheduled, or its due date has passed.
pub fn is_due(state: Option<&ReviewState>, as_of: Timestamp) -> bool {
    match state {
        None => true,
        Some(state) => match state.next_due_at {
            None => !state.status.is_success(),
            Some(next_due_at) => next_due_at <= as_of,
        },
    }
}

/// The due items of a learner, with their states.
pub fn due_candidates(
    store: &impl ReviewStore,
    learner: LearnerId,
    as_of: Timestamp,
) -> Fallible<Vec<DueCandidate>> {
    let mut due: Vec<DueCandidate> = store
        .due_candidates(learner, as_of)?
        .into_iter()
        .filter(|c| is_due(c.state.as_ref(), as_of))
        .collect();
    due.sort_by_key(|c| c.item);
    due.dedup_by_key(|c| c.item);
    Ok(due)
}

/// The identifiers of the items a learner has due.
pub fn due_items(
    store: &impl ReviewStore,
    learner: LearnerId,
    as_of: Timestamp,
) -> Fallible<BTreeSet<ItemId>> {
    let due = due_candidates(store, learner, as_of)?;
    Ok(due.into_iter().map(|c| c.item).collect())
}
