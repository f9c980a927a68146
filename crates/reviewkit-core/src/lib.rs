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

//! reviewkit-core: scheduling core for reviewkit.
//!
//! This library provides storage-agnostic types and algorithms for:
//! - A modified SM-2 scheduler with a partial-credit tier
//! - Selecting the items a learner has due
//! - Interleaving due items by topic into a bounded session
//! - Mastery reporting

pub mod due;
pub mod error;
pub mod interleave;
pub mod rating;
pub mod report;
pub mod rng;
pub mod scheduler;
pub mod session;
pub mod store;
pub mod types;

// Re-exports for convenience
pub use error::{ErrorKind, ErrorReport, Fallible, fail};
pub use interleave::{InterleavePolicy, SessionEntry};
pub use scheduler::{Quality, SchedulerParams};
pub use session::{ReviewSession, ReviewSessionBuilder};
pub use store::{ReviewStore, TopicResolver};
pub use types::analysis::Analysis;
pub use types::ids::{ItemId, LearnerId, TopicId};
pub use types::review_state::{ItemStatus, ReviewState, update_review_state};
pub use types::timestamp::Timestamp;
