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

//! The persistence and topic metadata seams, plus an in-memory store.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::due::is_due;
use crate::error::ErrorKind;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::types::ids::ItemId;
use crate::types::ids::LearnerId;
use crate::types::ids::TopicId;
use crate::types::review_state::ReviewState;
use crate::types::timestamp::Timestamp;

/// An item of a learner together with its state, if it has one.
#[derive(Clone, Debug, PartialEq)]
pub struct DueCandidate {
    pub item: ItemId,
    pub state: Option<ReviewState>,
}

/// Storage of review states, keyed by (learner, item).
pub trait ReviewStore {
    fn get_state(&self, learner: LearnerId, item: ItemId) -> Fallible<Option<ReviewState>>;

    /// Writes `state` if the stored revision still equals `expected_version`
    /// (zero when no state is stored yet). Returns the state as stored, with
    /// its version bumped. A mismatch is a `ConcurrentModification`.
    fn upsert_state(&self, state: &ReviewState, expected_version: u64) -> Fallible<ReviewState>;

    /// Every item of the learner that may be due at `as_of`, in one read.
    /// May return extra candidates; never omits a due one.
    fn due_candidates(&self, learner: LearnerId, as_of: Timestamp)
    -> Fallible<Vec<DueCandidate>>;

    fn states_for_learner(&self, learner: LearnerId) -> Fallible<Vec<ReviewState>>;
}

/// Resolves the knowledge topic of an item.
pub trait TopicResolver {
    fn topic_of(&self, item: ItemId) -> Fallible<TopicId>;
}

pub fn unknown_item(item: ItemId) -> ErrorReport {
    ErrorReport::with_kind(ErrorKind::UnknownItem, format!("unknown item: {item}"))
}

pub fn unknown_learner(learner: LearnerId) -> ErrorReport {
    ErrorReport::with_kind(
        ErrorKind::UnknownLearner,
        format!("unknown learner: {learner}"),
    )
}

pub fn version_mismatch(item: ItemId, expected: u64, found: u64) -> ErrorReport {
    ErrorReport::concurrent_modification(format!(
        "state of item {item} changed concurrently: expected version {expected}, found {found}"
    ))
}

#[derive(Default)]
struct Inner {
    learners: BTreeSet<LearnerId>,
    /// Owner and topic of every item.
    items: BTreeMap<ItemId, (LearnerId, TopicId)>,
    states: HashMap<(LearnerId, ItemId), ReviewState>,
}

/// A store held in memory. Each operation takes one lock, so the
/// compare-and-set in `upsert_state` is atomic.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_learner(&self, learner: LearnerId) -> Fallible<()> {
        self.lock()?.learners.insert(learner);
        Ok(())
    }

    pub fn add_item(&self, learner: LearnerId, item: ItemId, topic: TopicId) -> Fallible<()> {
        let mut inner = self.lock()?;
        if !inner.learners.contains(&learner) {
            return Err(unknown_learner(learner));
        }
        if let Some((owner, _)) = inner.items.get(&item) {
            if *owner != learner {
                return Err(ErrorReport::storage(format!(
                    "item {item} already belongs to learner {owner}"
                )));
            }
        }
        inner.items.insert(item, (learner, topic));
        Ok(())
    }

    fn lock(&self) -> Fallible<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| ErrorReport::storage("memory store lock poisoned"))
    }
}

impl Inner {
    fn check_owner(&self, learner: LearnerId, item: ItemId) -> Fallible<()> {
        if !self.learners.contains(&learner) {
            return Err(unknown_learner(learner));
        }
        match self.items.get(&item) {
            Some((owner, _)) if *owner == learner => Ok(()),
            _ => Err(unknown_item(item)),
        }
    }
}

impl ReviewStore for MemoryStore {
    fn get_state(&self, learner: LearnerId, item: ItemId) -> Fallible<Option<ReviewState>> {
        let inner = self.lock()?;
        inner.check_owner(learner, item)?;
        Ok(inner.states.get(&(learner, item)).cloned())
    }

    fn upsert_state(&self, state: &ReviewState, expected_version: u64) -> Fallible<ReviewState> {
        let mut inner = self.lock()?;
        inner.check_owner(state.learner, state.item)?;
        let key = (state.learner, state.item);
        let found = inner.states.get(&key).map(|s| s.version).unwrap_or(0);
        if found != expected_version {
            return Err(version_mismatch(state.item, expected_version, found));
        }
        let mut stored = state.clone();
        stored.version = found + 1;
        inner.states.insert(key, stored.clone());
        Ok(stored)
    }

    fn due_candidates(
        &self,
        learner: LearnerId,
        as_of: Timestamp,
    ) -> Fallible<Vec<DueCandidate>> {
        let inner = self.lock()?;
        if !inner.learners.contains(&learner) {
            return Err(unknown_learner(learner));
        }
        let candidates = inner
            .items
            .iter()
            .filter(|(_, (owner, _))| *owner == learner)
            .map(|(item, _)| DueCandidate {
                item: *item,
                state: inner.states.get(&(learner, *item)).cloned(),
            })
            .filter(|c| is_due(c.state.as_ref(), as_of))
            .collect();
        Ok(candidates)
    }

    fn states_for_learner(&self, learner: LearnerId) -> Fallible<Vec<ReviewState>> {
        let inner = self.lock()?;
        if !inner.learners.contains(&learner) {
            return Err(unknown_learner(learner));
        }
        let mut states: Vec<ReviewState> = inner
            .states
            .values()
            .filter(|s| s.learner == learner)
            .cloned()
            .collect();
        states.sort_by_key(|s| s.item);
        Ok(states)
    }
}

impl TopicResolver for MemoryStore {
    fn topic_of(&self, item: ItemId) -> Fallible<TopicId> {
        let inner = self.lock()?;
        inner
            .items
            .get(&item)
            .map(|(_, topic)| topic.clone())
            .ok_or_else(|| unknown_item(item))
    }
}
