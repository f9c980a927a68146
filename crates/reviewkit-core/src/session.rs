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

use crate::due::due_candidates;
use crate::error::Fallible;
use crate::interleave::DueItem;
use crate::interleave::InterleavePolicy;
use crate::interleave::SessionEntry;
use crate::interleave::arrange;
use crate::rng::TinyRng;
use crate::store::ReviewStore;
use crate::store::TopicResolver;
use crate::types::ids::LearnerId;
use crate::types::timestamp::Timestamp;

/// Today's review list for one learner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewSession {
    pub learner: LearnerId,
    pub built_at: Timestamp,
    /// Number of due items before the session cap was applied.
    pub total_due: usize,
    pub entries: Vec<SessionEntry>,
}

impl ReviewSession {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct ReviewSessionBuilder {
    policy: InterleavePolicy,
}

impl ReviewSessionBuilder {
    pub fn new(policy: InterleavePolicy) -> Self {
        Self { policy }
    }

    pub fn build(
        &self,
        store: &impl ReviewStore,
        topics: &impl TopicResolver,
        learner: LearnerId,
        now: Timestamp,
        max_session_size: usize,
        rng: &mut TinyRng,
    ) -> Fallible<ReviewSession> {
        let candidates = due_candidates(store, learner, now)?;
        let mut due: Vec<DueItem> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let item = match candidate.state {
                Some(state) => DueItem {
                    item: candidate.item,
                    ease_factor: state.is_rated().then_some(state.ease_factor),
                    topic: state.topic,
                },
                None => DueItem {
                    item: candidate.item,
                    topic: topics.topic_of(candidate.item)?,
                    ease_factor: None,
                },
            };
            due.push(item);
        }
        let total_due = due.len();
        let entries = arrange(due, max_session_size, &self.policy, rng);
        log::debug!(
            "Built session for learner {learner}: {} of {total_due} due items",
            entries.len()
        );
        Ok(ReviewSession {
            learner,
            built_at: now,
            total_due,
            entries,
        })
    }
}

impl Default for ReviewSessionBuilder {
    fn default() -> Self {
        Self::new(InterleavePolicy::default())
    }
}
