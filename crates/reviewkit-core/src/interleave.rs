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

//! Arranges due items into a session so that topics alternate.
//!
//! Items are bucketed by topic. Each step picks a topic at random, never the
//! one just emitted unless nothing else is left, and draws a short run from
//! it. A move is only taken if the rest of the session can still be filled
//! without a run longer than `max_run`; when the input makes that
//! impossible, the largest bucket is drawn from instead.

use std::collections::BTreeMap;
use std::collections::VecDeque;

use serde::Deserialize;
use serde::Serialize;

use crate::rng::TinyRng;
use crate::scheduler::Ease;
use crate::types::ids::ItemId;
use crate::types::ids::TopicId;

pub const DEFAULT_SESSION_SIZE: usize = 15;

/// An item eligible for the session.
#[derive(Clone, Debug, PartialEq)]
pub struct DueItem {
    pub item: ItemId,
    pub topic: TopicId,
    /// Absent for items that were never rated.
    pub ease_factor: Option<Ease>,
}

/// One slot of the arranged session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionEntry {
    pub item: ItemId,
    pub topic: TopicId,
    /// The item is well memorized: show a fresh variant instead of the
    /// original.
    pub prefer_variant: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InterleavePolicy {
    /// Longest run of same-topic items drawn at once.
    pub max_run: usize,
    /// Ease factor at and above which an item prefers a variant.
    pub variant_threshold: Ease,
}

impl Default for InterleavePolicy {
    fn default() -> Self {
        Self {
            max_run: 2,
            variant_threshold: 2.8,
        }
    }
}

type Buckets = BTreeMap<TopicId, VecDeque<DueItem>>;

pub fn arrange(
    due: Vec<DueItem>,
    max_session_size: usize,
    policy: &InterleavePolicy,
    rng: &mut TinyRng,
) -> Vec<SessionEntry> {
    let max_run = policy.max_run.max(1);
    let mut buckets: Buckets = BTreeMap::new();
    for item in due {
        buckets.entry(item.topic.clone()).or_default().push_back(item);
    }
    for bucket in buckets.values_mut() {
        bucket.make_contiguous().sort_by_key(|d| d.item);
    }

    let mut session: Vec<SessionEntry> = Vec::new();
    let mut last: Option<TopicId> = None;
    while session.len() < max_session_size && !buckets.is_empty() {
        let room = max_session_size - session.len();
        let moves = candidate_moves(&buckets, last.as_ref(), max_run, room);
        let Some(pick) = rng.index(moves.len()) else {
            break;
        };
        let (topic, draws) = &moves[pick];
        let draw = match rng.index(draws.len()) {
            Some(i) => draws[i],
            None => 1,
        };
        let topic = topic.clone();
        if let Some(bucket) = buckets.get_mut(&topic) {
            for item in bucket.drain(..draw.min(bucket.len())) {
                let prefer_variant = item
                    .ease_factor
                    .is_some_and(|ease| ease >= policy.variant_threshold);
                session.push(SessionEntry {
                    item: item.item,
                    topic: item.topic,
                    prefer_variant,
                });
            }
            if bucket.is_empty() {
                buckets.remove(&topic);
            }
        }
        last = Some(topic);
    }
    session
}

/// Every topic that may be drawn next, with the run lengths allowed for it.
fn candidate_moves(
    buckets: &Buckets,
    last: Option<&TopicId>,
    max_run: usize,
    room: usize,
) -> Vec<(TopicId, Vec<usize>)> {
    let mut eligible: Vec<&TopicId> = buckets.keys().filter(|t| Some(*t) != last).collect();
    if eligible.is_empty() {
        eligible = buckets.keys().collect();
    }
    let sizes = |topic: &TopicId| -> Vec<usize> {
        let available = buckets[topic].len().min(max_run).min(room);
        (1..=available).collect()
    };
    let guarded: Vec<(TopicId, Vec<usize>)> = eligible
        .iter()
        .map(|topic| {
            let draws = sizes(topic)
                .into_iter()
                .filter(|draw| arrangeable_after(buckets, topic, *draw, max_run, room - draw))
                .collect::<Vec<_>>();
            ((*topic).clone(), draws)
        })
        .filter(|(_, draws)| !draws.is_empty())
        .collect();
    if !guarded.is_empty() {
        return guarded;
    }
    // No layout avoids a long run. Drain the largest bucket to keep the
    // runs that must happen as few as possible.
    let largest = eligible
        .into_iter()
        .max_by_key(|topic| buckets[*topic].len());
    match largest {
        Some(topic) => {
            let draw = buckets[topic].len().min(max_run).min(room);
            vec![(topic.clone(), vec![draw])]
        }
        None => vec![],
    }
}

/// Whether, after drawing `draw` items of `drawn`, the next `slots` session
/// slots (or all remaining items, if fewer) can be filled in runs of at
/// most `max_run` with no two adjacent runs sharing a topic.
///
/// Filling `k` slots with `c` items of one topic takes `ceil(c / max_run)`
/// runs, each separated from the next by at least one of the `k - c` other
/// items. The topic just drawn cannot open the next run. Each topic thus
/// contributes at most some `cap` items, and the slots can be filled iff
/// the capped contributions add up to `k`.
fn arrangeable_after(
    buckets: &Buckets,
    drawn: &TopicId,
    draw: usize,
    max_run: usize,
    slots: usize,
) -> bool {
    let remaining = |topic: &TopicId, bucket: &VecDeque<DueItem>| -> usize {
        if topic == drawn {
            bucket.len() - draw
        } else {
            bucket.len()
        }
    };
    let total: usize = buckets.iter().map(|(t, b)| remaining(t, b)).sum();
    let k = total.min(slots);
    let fillable: usize = buckets
        .iter()
        .map(|(topic, bucket)| {
            let opens = usize::from(topic != drawn);
            let mut c = remaining(topic, bucket).min(k);
            while c > 0 && c.div_ceil(max_run) > k - c + opens {
                c -= 1;
            }
            c
        })
        .sum();
    fillable >= k
}
