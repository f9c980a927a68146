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

use chrono::NaiveDate;
use reviewkit_core::Fallible;
use reviewkit_core::LearnerId;
use reviewkit_core::ReviewStore;
use reviewkit_core::Timestamp;
use reviewkit_core::report::MasteryReport;
use reviewkit_core::report::ReportWindow;
use reviewkit_core::report::mastery_report;
use reviewkit_core::rng::TinyRng;

use crate::cmd::Context;

/// The report for the week starting on `week_start`, or the current week.
pub fn learner_report(
    ctx: &Context,
    learner: LearnerId,
    week_start: Option<NaiveDate>,
    seed: Option<u64>,
    now: Timestamp,
) -> Fallible<MasteryReport> {
    let mut rng = match seed {
        Some(seed) => TinyRng::from_seed(seed),
        None => TinyRng::from_clock(),
    };
    let window = match week_start {
        Some(day) => ReportWindow::week_starting(day),
        None => ReportWindow::week_of(now),
    };
    let states = ctx.db.states_for_learner(learner)?;
    let uploaded = ctx.db.items_created_in(learner, &window)?;
    Ok(mastery_report(&states, window, uploaded, &mut rng))
}

pub fn render_report(report: &MasteryReport, json: bool) -> Fallible<String> {
    if json {
        return Ok(serde_json::to_string_pretty(report)?);
    }
    let recommended = if report.recommended.is_empty() {
        "none".to_string()
    } else {
        report
            .recommended
            .iter()
            .map(|item| item.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let lines = [
        format!(
            "Week: {} to {}",
            report.window.first_day(),
            report.window.last_day()
        ),
        format!("Uploaded: {}", report.uploaded),
        format!("Reviewed: {}", report.reviews),
        format!("Items: {}", report.total()),
        format!("  full:    {}", report.full),
        format!("  partial: {}", report.partial),
        format!("  fail:    {}", report.fail),
        format!("  unrated: {}", report.unrated),
        format!("Review next: {recommended}"),
    ];
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;
    use reviewkit_core::ItemId;
    use reviewkit_core::Quality;

    use super::*;
    use crate::cmd::add::InitialStatus;
    use crate::cmd::add::add_item;
    use crate::cmd::rate::rate_item;

    fn make_timestamp(s: &str) -> Timestamp {
        let ndt = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.3f").unwrap();
        Timestamp::new(ndt)
    }

    #[test]
    fn test_report() -> Fallible<()> {
        let ctx = Context::in_memory()?;
        let now = Timestamp::now();
        ctx.db.add_learner(LearnerId(1), "ada", now)?;
        let qualities = [
            Some(Quality::Fail),
            Some(Quality::Partial),
            Some(Quality::Full),
            None,
        ];
        for (idx, quality) in qualities.into_iter().enumerate() {
            let item = ItemId(idx as u64 + 1);
            add_item(&ctx, LearnerId(1), Some(item), None, InitialStatus::Wrong)?;
            if let Some(quality) = quality {
                rate_item(&ctx, LearnerId(1), item, quality, now)?;
            }
        }
        let report = learner_report(&ctx, LearnerId(1), None, Some(7), now)?;
        assert_eq!((report.fail, report.partial, report.full, report.unrated), (1, 1, 1, 1));
        assert_eq!(report.recommended, vec![ItemId(1), ItemId(2)]);
        assert_eq!(report.reviews, 3);
        assert!(report.window.contains(now));

        let text = render_report(&report, false)?;
        assert!(text.starts_with("Week: "));
        assert!(text.contains("\nReviewed: 3\nItems: 4\n"));
        assert!(text.ends_with("Review next: 1, 2"));
        Ok(())
    }

    #[test]
    fn test_explicit_week() -> Fallible<()> {
        let ctx = Context::in_memory()?;
        let t0 = make_timestamp("2024-01-03T09:00:00.000");
        ctx.db.add_learner(LearnerId(1), "ada", t0)?;
        ctx.db.add_item(LearnerId(1), Some(ItemId(1)), None, t0)?;
        ctx.db.add_item(LearnerId(1), Some(ItemId(2)), None, t0.plus_days(7))?;
        rate_item(&ctx, LearnerId(1), ItemId(1), Quality::Full, t0)?;
        rate_item(&ctx, LearnerId(1), ItemId(2), Quality::Fail, t0.plus_days(7))?;

        let monday = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let report = learner_report(&ctx, LearnerId(1), Some(monday), Some(0), t0)?;
        assert_eq!((report.uploaded, report.reviews), (1, 1));
        let text = render_report(&report, false)?;
        assert!(text.starts_with("Week: 2024-01-01 to 2024-01-07\nUploaded: 1\n"));

        let next = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        let report = learner_report(&ctx, LearnerId(1), Some(next), Some(0), t0)?;
        assert_eq!((report.uploaded, report.reviews), (1, 1));
        assert_eq!(report.recommended, vec![ItemId(2)]);
        Ok(())
    }

    #[test]
    fn test_empty_report() -> Fallible<()> {
        let ctx = Context::in_memory()?;
        let now = Timestamp::now();
        ctx.db.add_learner(LearnerId(1), "ada", now)?;
        let report = learner_report(&ctx, LearnerId(1), None, Some(0), now)?;
        assert_eq!(report.total(), 0);
        assert_eq!(report.uploaded, 0);
        assert!(render_report(&report, false)?.ends_with("Review next: none"));
        let json = render_report(&report, true)?;
        assert_eq!(serde_json::from_str::<MasteryReport>(&json)?, report);
        Ok(())
    }
}
