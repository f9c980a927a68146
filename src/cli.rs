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

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;
use clap::Subcommand;
use reviewkit_core::Fallible;
use reviewkit_core::ItemId;
use reviewkit_core::LearnerId;
use reviewkit_core::Timestamp;

use crate::cmd::Context;
use crate::cmd::add::InitialStatus;
use crate::cmd::add::add_item;
use crate::cmd::add::add_learner;
use crate::cmd::add::print_added;
use crate::cmd::add::read_analysis;
use crate::cmd::rate::parse_quality;
use crate::cmd::rate::print_rated;
use crate::cmd::rate::rate_item;
use crate::cmd::session::build_session;
use crate::cmd::session::render_session;
use crate::cmd::stats::learner_report;
use crate::cmd::stats::render_report;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file. By default, reviewkit.toml in the current directory is used if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Path to the database. Overrides the configured path.
    #[arg(long, global = true)]
    database: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a learner.
    AddLearner {
        /// Numeric learner identifier.
        learner: u64,
        /// Display name.
        name: String,
    },
    /// Register a problem for a learner. It is due immediately.
    Add {
        /// The learner the problem belongs to.
        learner: u64,
        /// Item identifier. By default, one is allocated.
        #[arg(long)]
        id: Option<u64>,
        /// The problem's analysis, as JSON or free text.
        #[arg(long)]
        analysis: Option<String>,
        /// Read the analysis from a file instead.
        #[arg(long, conflicts_with = "analysis")]
        analysis_file: Option<PathBuf>,
        /// How the learner did when the problem was uploaded.
        #[arg(long, default_value_t = InitialStatus::Wrong)]
        status: InitialStatus,
    },
    /// Record a review rating.
    Rate {
        learner: u64,
        item: u64,
        /// One of fail, partial, full, or a score from 0 to 2.
        quality: String,
        /// Read a numeric quality as a mastery level from 1 to 3.
        #[arg(long)]
        legacy: bool,
    },
    /// Print today's review list.
    Session {
        learner: u64,
        /// Maximum number of items. By default, the configured session size.
        #[arg(long)]
        limit: Option<usize>,
        /// Seed for the ordering. By default, the order is random.
        #[arg(long)]
        seed: Option<u64>,
        /// Print the session as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print a learner's mastery report.
    Stats {
        learner: u64,
        /// First day of the week to report on (YYYY-MM-DD). By default, the current week.
        #[arg(long)]
        week_start: Option<NaiveDate>,
        /// Seed for picking recommended items.
        #[arg(long)]
        seed: Option<u64>,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
}

pub fn entrypoint() -> Fallible<()> {
    let cli: Cli = Cli::parse();
    let ctx = Context::open(cli.config.as_deref(), cli.database)?;
    match cli.command {
        Command::AddLearner { learner, name } => add_learner(&ctx, LearnerId(learner), &name),
        Command::Add {
            learner,
            id,
            analysis,
            analysis_file,
            status,
        } => {
            let analysis = read_analysis(analysis, analysis_file.as_deref())?;
            let state = add_item(
                &ctx,
                LearnerId(learner),
                id.map(ItemId),
                analysis.as_ref(),
                status,
            )?;
            print_added(&state);
            Ok(())
        }
        Command::Rate {
            learner,
            item,
            quality,
            legacy,
        } => {
            let quality = parse_quality(&quality, legacy)?;
            let state = rate_item(
                &ctx,
                LearnerId(learner),
                ItemId(item),
                quality,
                Timestamp::now(),
            )?;
            print_rated(&state);
            Ok(())
        }
        Command::Session {
            learner,
            limit,
            seed,
            json,
        } => {
            let session = build_session(&ctx, LearnerId(learner), limit, seed, Timestamp::now())?;
            println!("{}", render_session(&session, json)?);
            Ok(())
        }
        Command::Stats {
            learner,
            week_start,
            seed,
            json,
        } => {
            let report =
                learner_report(&ctx, LearnerId(learner), week_start, seed, Timestamp::now())?;
            println!("{}", render_report(&report, json)?);
            Ok(())
        }
    }
}
