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

use std::fmt::Display;
use std::fmt::Formatter;
use std::fs::read_to_string;
use std::path::Path;

use clap::ValueEnum;
use reviewkit_core::Analysis;
use reviewkit_core::Fallible;
use reviewkit_core::ItemId;
use reviewkit_core::ItemStatus;
use reviewkit_core::LearnerId;
use reviewkit_core::ReviewState;
use reviewkit_core::Timestamp;
use reviewkit_core::fail;
use reviewkit_core::rating::register_item;

use crate::cmd::Context;

/// How the learner did on a problem when it was first uploaded.
#[derive(ValueEnum, Clone, Copy, PartialEq, Debug)]
pub enum InitialStatus {
    /// Not attempted yet.
    Pending,
    /// Answered wrong.
    Wrong,
}

impl Display for InitialStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            InitialStatus::Pending => write!(f, "pending"),
            InitialStatus::Wrong => write!(f, "wrong"),
        }
    }
}

impl From<InitialStatus> for ItemStatus {
    fn from(value: InitialStatus) -> Self {
        match value {
            InitialStatus::Pending => ItemStatus::Pending,
            InitialStatus::Wrong => ItemStatus::Wrong,
        }
    }
}

pub fn add_learner(ctx: &Context, learner: LearnerId, name: &str) -> Fallible<()> {
    if name.trim().is_empty() {
        return fail("learner name must not be empty");
    }
    ctx.db.add_learner(learner, name, Timestamp::now())?;
    log::info!("Added learner {learner}");
    println!("Added learner {learner} ({name}).");
    Ok(())
}

/// Reads an analysis given inline or from a file. Text that is not JSON is
/// kept as a raw analysis.
pub fn read_analysis(inline: Option<String>, file: Option<&Path>) -> Fallible<Option<Analysis>> {
    let text = match (inline, file) {
        (Some(text), _) => text,
        (None, Some(path)) => read_to_string(path)?,
        (None, None) => return Ok(None),
    };
    let analysis = match Analysis::from_json(&text) {
        Ok(analysis) => analysis,
        Err(e) => {
            log::debug!("Analysis is not JSON, storing as raw text: {e}");
            Analysis::Raw(text.trim().to_string())
        }
    };
    Ok(Some(analysis))
}

pub fn add_item(
    ctx: &Context,
    learner: LearnerId,
    item: Option<ItemId>,
    analysis: Option<&Analysis>,
    status: InitialStatus,
) -> Fallible<ReviewState> {
    let (item, topic) = ctx.db.add_item(learner, item, analysis, Timestamp::now())?;
    register_item(
        &ctx.db,
        &ctx.config.scheduler,
        learner,
        item,
        topic,
        status.into(),
    )
}

pub fn print_added(state: &ReviewState) {
    println!(
        "Added item {} under topic {} ({}).",
        state.item,
        state.topic,
        state.status.as_str()
    );
}
