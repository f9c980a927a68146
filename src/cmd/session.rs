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

use reviewkit_core::Fallible;
use reviewkit_core::LearnerId;
use reviewkit_core::ReviewSession;
use reviewkit_core::ReviewSessionBuilder;
use reviewkit_core::Timestamp;
use reviewkit_core::rng::TinyRng;

use crate::cmd::Context;

/// Today's review list. Without a seed the order changes on every call.
pub fn build_session(
    ctx: &Context,
    learner: LearnerId,
    limit: Option<usize>,
    seed: Option<u64>,
    now: Timestamp,
) -> Fallible<ReviewSession> {
    let mut rng = match seed {
        Some(seed) => TinyRng::from_seed(seed),
        None => TinyRng::from_clock(),
    };
    let size = limit.unwrap_or(ctx.config.session.max_session_size);
    let builder = ReviewSessionBuilder::new(ctx.config.session.policy());
    builder.build(&ctx.db, &ctx.db, learner, now, size, &mut rng)
}

pub fn render_session(session: &ReviewSession, json: bool) -> Fallible<String> {
    if json {
        return Ok(serde_json::to_string_pretty(session)?);
    }
    if session.is_empty() {
        return Ok("Nothing due.".to_string());
    }
    let mut lines = vec![format!(
        "{} of {} due item(s):",
        session.entries.len(),
        session.total_due
    )];
    for (idx, entry) in session.entries.iter().enumerate() {
        let variant = if entry.prefer_variant { " (variant)" } else { "" };
        lines.push(format!(
            "{:>3}. item {} [{}]{variant}",
            idx + 1,
            entry.item,
            entry.topic
        ));
    }
    Ok(lines.join("\n"))
}
