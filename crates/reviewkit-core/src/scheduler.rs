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

//! A modified SM-2 scheduler with a partial-credit tier.

use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;

pub type Ease = f64;
pub type Days = u32;

/// No configuration can take the ease factor below this.
pub const EASE_FLOOR: Ease = 1.3;

/// The learner's self-reported recall quality.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Quality {
    /// Not understood. Resets the schedule.
    Fail,
    /// Half understood. The interval grows slowly.
    Partial,
    /// Mastered.
    Full,
}

impl Quality {
    pub fn as_str(&self) -> &str {
        match self {
            Quality::Fail => "fail",
            Quality::Partial => "partial",
            Quality::Full => "full",
        }
    }

    /// The canonical score: 0, 1 or 2.
    pub fn score(self) -> u8 {
        match self {
            Quality::Fail => 0,
            Quality::Partial => 1,
            Quality::Full => 2,
        }
    }

    /// Converts from the canonical score scale (0 = fail, 1 = partial,
    /// 2 = full).
    pub fn from_score(score: i64) -> Result<Self, ErrorReport> {
        match score {
            0 => Ok(Quality::Fail),
            1 => Ok(Quality::Partial),
            2 => Ok(Quality::Full),
            _ => Err(ErrorReport::invalid_quality(format!(
                "invalid quality score: {score}"
            ))),
        }
    }

    /// Converts from the legacy mastery level scale (1 = fail,
    /// 2 = partial, 3 = full).
    pub fn from_mastery_level(level: i64) -> Result<Self, ErrorReport> {
        match level {
            1 => Ok(Quality::Fail),
            2 => Ok(Quality::Partial),
            3 => Ok(Quality::Full),
            _ => Err(ErrorReport::invalid_quality(format!(
                "invalid mastery level: {level}"
            ))),
        }
    }
}

impl TryFrom<String> for Quality {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "fail" => Ok(Quality::Fail),
            "partial" => Ok(Quality::Partial),
            "full" => Ok(Quality::Full),
            _ => Err(ErrorReport::invalid_quality(format!(
                "invalid quality string: {value}"
            ))),
        }
    }
}

/// Tuning constants. Immutable once built; the defaults are the canonical
/// ones.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerParams {
    pub initial_ease: Ease,
    pub min_ease: Ease,
    pub fail_penalty: Ease,
    pub partial_penalty: Ease,
    pub full_bonus: Ease,
    /// Interval multiplier for a partial recall after the second repetition.
    pub partial_growth: f64,
    pub partial_second_interval: Days,
    pub full_second_interval: Days,
}

impl Default for SchedulerParams {
    fn default() -> Self {
        Self {
            initial_ease: 2.5,
            min_ease: EASE_FLOOR,
            fail_penalty: 0.5,
            partial_penalty: 0.2,
            full_bonus: 0.1,
            partial_growth: 1.2,
            partial_second_interval: 3,
            full_second_interval: 6,
        }
    }
}

/// The scheduling triple SM-2 operates on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Schedule {
    pub ease: Ease,
    pub interval: Days,
    pub repetitions: u32,
}

/// Applies one rating to a schedule.
pub fn next_schedule(params: &SchedulerParams, current: Schedule, quality: Quality) -> Schedule {
    let Schedule {
        ease,
        interval,
        repetitions,
    } = current;
    match quality {
        Quality::Fail => Schedule {
            ease: clamp_ease(params, ease - params.fail_penalty),
            interval: 1,
            repetitions: 0,
        },
        Quality::Partial => Schedule {
            ease: clamp_ease(params, ease - params.partial_penalty),
            interval: match repetitions {
                0 => 1,
                1 => params.partial_second_interval.max(1),
                _ => grow(interval, params.partial_growth),
            },
            repetitions: repetitions.saturating_add(1),
        },
        Quality::Full => Schedule {
            ease: clamp_ease(params, ease + params.full_bonus),
            interval: match repetitions {
                0 => 1,
                1 => params.full_second_interval.max(1),
                _ => grow(interval, ease),
            },
            repetitions: repetitions.saturating_add(1),
        },
    }
}

fn clamp_ease(params: &SchedulerParams, ease: Ease) -> Ease {
    f64::max(params.min_ease.max(EASE_FLOOR), ease)
}

/// `max(1, floor(interval * factor))`.
fn grow(interval: Days, factor: f64) -> Days {
    let grown = (f64::from(interval) * factor).floor();
    if grown < 1.0 {
        1
    } else if grown >= f64::from(Days::MAX) {
        Days::MAX
    } else {
        grown as Days
    }
}

#[cfg(test)]
mod tests {
    use std::iter::zip;

    use super::*;
    use crate::error::ErrorKind;
    use crate::error::Fallible;

    /// Approximate equality.
    fn feq(a: f64, b: f64) -> bool {
        f64::abs(a - b) < 1e-9
    }

    fn fresh() -> Schedule {
        Schedule {
            ease: 2.5,
            interval: 0,
            repetitions: 0,
        }
    }

    fn sim(qualities: &[Quality]) -> Vec<Schedule> {
        let params = SchedulerParams::default();
        let mut current = fresh();
        let mut steps = vec![];
        for q in qualities {
            current = next_schedule(&params, current, *q);
            steps.push(current);
        }
        steps
    }

    /// Test a sequence of three full recalls.
    #[test]
    fn test_3f() {
        let actual = sim(&[Quality::Full, Quality::Full, Quality::Full]);
        let expected = [(2.6, 1, 1), (2.7, 6, 2), (2.8, 16, 3)];
        for (step, (ease, interval, repetitions)) in zip(actual, expected) {
            assert!(feq(step.ease, ease));
            assert_eq!(step.interval, interval);
            assert_eq!(step.repetitions, repetitions);
        }
    }

    #[test]
    fn test_fail_from_fresh() {
        let step = sim(&[Quality::Fail])[0];
        assert!(feq(step.ease, 2.0));
        assert_eq!(step.interval, 1);
        assert_eq!(step.repetitions, 0);
    }

    #[test]
    fn test_partial_intervals() {
        let steps = sim(&[Quality::Partial, Quality::Partial, Quality::Partial]);
        assert_eq!(steps[0].interval, 1);
        assert_eq!(steps[1].interval, 3);
        // floor(3 * 1.2) = 3
        assert_eq!(steps[2].interval, 3);
        assert!(feq(steps[2].ease, 1.9));
    }

    #[test]
    fn test_partial_growth_on_long_interval() {
        let params = SchedulerParams::default();
        let current = Schedule {
            ease: 2.5,
            interval: 10,
            repetitions: 4,
        };
        let next = next_schedule(&params, current, Quality::Partial);
        assert_eq!(next.interval, 12);
        assert_eq!(next.repetitions, 5);
    }

    #[test]
    fn test_full_uses_prior_ease() {
        let params = SchedulerParams::default();
        let current = Schedule {
            ease: 1.3,
            interval: 1,
            repetitions: 2,
        };
        let next = next_schedule(&params, current, Quality::Full);
        // floor(1 * 1.3) = 1
        assert_eq!(next.interval, 1);
        assert!(feq(next.ease, 1.4));
    }

    #[test]
    fn test_fail_resets_at_any_point() {
        let params = SchedulerParams::default();
        for repetitions in [0, 1, 2, 5, 40] {
            for interval in [0, 1, 6, 300] {
                let current = Schedule {
                    ease: 2.2,
                    interval,
                    repetitions,
                };
                let next = next_schedule(&params, current, Quality::Fail);
                assert_eq!(next.repetitions, 0);
                assert_eq!(next.interval, 1);
            }
        }
    }

    #[test]
    fn test_ease_floor_holds() {
        let params = SchedulerParams::default();
        let qualities = [Quality::Fail, Quality::Partial, Quality::Full];
        let mut current = fresh();
        for i in 0..300 {
            current = next_schedule(&params, current, qualities[(i * 7 + i / 3) % 3]);
            assert!(current.ease >= 1.3);
            assert!(current.interval >= 1);
        }
        for _ in 0..20 {
            current = next_schedule(&params, current, Quality::Fail);
            assert!(feq(current.ease, 1.3) || current.ease > 1.3);
        }
        assert!(feq(current.ease, 1.3));
    }

    #[test]
    fn test_interval_saturates() {
        assert_eq!(grow(Days::MAX, 2.5), Days::MAX);
        assert_eq!(grow(0, 2.5), 1);
    }

    #[test]
    fn test_repetitions_saturate() {
        let params = SchedulerParams::default();
        let current = Schedule {
            ease: 2.5,
            interval: 10,
            repetitions: u32::MAX,
        };
        for quality in [Quality::Partial, Quality::Full] {
            assert_eq!(next_schedule(&params, current, quality).repetitions, u32::MAX);
        }
    }

    /// Loose parameters cannot break the ease floor or produce a zero
    /// interval.
    #[test]
    fn test_invariants_hold_for_loose_params() {
        let params = SchedulerParams {
            initial_ease: 1.0,
            min_ease: 0.5,
            partial_second_interval: 0,
            full_second_interval: 0,
            ..SchedulerParams::default()
        };
        let start = Schedule {
            ease: params.initial_ease,
            interval: 0,
            repetitions: 0,
        };
        let failed = next_schedule(&params, start, Quality::Fail);
        assert!(feq(failed.ease, EASE_FLOOR));
        for quality in [Quality::Partial, Quality::Full] {
            let first = next_schedule(&params, start, quality);
            assert!(first.ease >= EASE_FLOOR);
            let second = next_schedule(&params, first, quality);
            assert_eq!(second.repetitions, 2);
            assert_eq!(second.interval, 1);
        }
    }

    #[test]
    fn test_scales_agree() -> Fallible<()> {
        for (score, level) in [(0, 1), (1, 2), (2, 3)] {
            assert_eq!(Quality::from_score(score)?, Quality::from_mastery_level(level)?);
        }
        Ok(())
    }

    #[test]
    fn test_invalid_quality() {
        for score in [-1, 3, 99] {
            let err = Quality::from_score(score).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidQuality);
        }
        for level in [0, 4] {
            assert!(Quality::from_mastery_level(level).is_err());
        }
        for s in ["", "good", "FULL"] {
            assert!(Quality::try_from(s.to_string()).is_err());
        }
    }

    #[test]
    fn test_quality_string_roundtrip() -> Fallible<()> {
        for q in [Quality::Fail, Quality::Partial, Quality::Full] {
            assert_eq!(q, Quality::try_from(q.as_str().to_string())?);
            assert_eq!(q, Quality::from_score(i64::from(q.score()))?);
        }
        Ok(())
    }

    #[test]
    fn test_params_from_partial_json() -> Fallible<()> {
        let params: SchedulerParams = serde_json::from_str(r#"{"fail_penalty": 0.3}"#)?;
        assert!(feq(params.fail_penalty, 0.3));
        assert!(feq(params.initial_ease, 2.5));
        assert_eq!(params.full_second_interval, 6);
        Ok(())
    }
}
