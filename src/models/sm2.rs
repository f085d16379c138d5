//! SM-2 (SuperMemo 2) spaced repetition algorithm implementation.
//!
//! The SM-2 algorithm calculates optimal review intervals based on recall quality:
//! - Each card has an easiness factor (EF) that adjusts based on performance
//! - Quality grades 0-2: Reset interval and repetitions (card needs relearning)
//! - Quality grades 3-5: Increase interval progressively (1 day → 6 days → EF multiplier)
//! - EF is adjusted after each review and has a minimum value of 1.3
//! - Higher quality responses lead to longer intervals between reviews

use super::{MIN_EASINESS_FACTOR, SchedulingState};
use crate::error::ScheduleError;
use chrono::{Days, NaiveDate};

pub const MAX_QUALITY: u8 = 5;

/// Lowest quality that counts as a successful recall.
pub const PASSING_QUALITY: u8 = 3;

/// Rejects qualities outside 0-5.
pub fn validate_quality(quality: u8) -> Result<u8, ScheduleError> {
    if quality > MAX_QUALITY {
        return Err(ScheduleError::InvalidQuality(quality));
    }
    Ok(quality)
}

/// Calculates the next scheduling state according to the SM-2 algorithm.
/// quality: 0-5 (0 = complete blackout, 5 = perfect response)
pub fn schedule(
    quality: u8,
    prior: &SchedulingState,
    today: NaiveDate,
) -> Result<SchedulingState, ScheduleError> {
    let quality = validate_quality(quality)?;

    // EF' = EF + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02)), floored at 1.3
    let miss = f64::from(MAX_QUALITY - quality);
    let easiness_factor =
        (prior.easiness_factor + (0.1 - miss * (0.08 + miss * 0.02))).max(MIN_EASINESS_FACTOR);

    let (interval_days, repetitions) = if quality < PASSING_QUALITY {
        (1, 0)
    } else {
        let repetitions = prior.repetitions.saturating_add(1);
        let interval = match repetitions {
            1 => 1,
            2 => 6,
            _ => {
                let scaled = (f64::from(prior.interval_days) * easiness_factor).round();
                if scaled > f64::from(u32::MAX) {
                    return Err(ScheduleError::DateOutOfRange {
                        interval_days: scaled as u64,
                    });
                }
                (scaled as u32).max(1)
            }
        };
        (interval, repetitions)
    };

    let next_review_date = today
        .checked_add_days(Days::new(u64::from(interval_days)))
        .ok_or(ScheduleError::DateOutOfRange {
            interval_days: u64::from(interval_days),
        })?;

    Ok(SchedulingState {
        easiness_factor,
        interval_days,
        repetitions,
        next_review_date,
    })
}

/// Intervals the again (1), hard (3), good (4) and easy (5) bands would give.
pub fn preview_intervals(prior: &SchedulingState, today: NaiveDate) -> [u32; 4] {
    [1, 3, 4, 5].map(|quality| {
        schedule(quality, prior, today)
            .map(|next| next.interval_days)
            .unwrap_or(1)
    })
}

/// Format an interval in days to a short string such as `6d`, `2w` or `3mo`
pub fn format_interval(days: u32) -> String {
    match days {
        0 => "now".to_string(),
        1..=6 => format!("{}d", days),
        7..=29 => format!("{}w", days / 7),
        30..=364 => format!("{}mo", days / 30),
        _ => format!("{}y", days / 365),
    }
}
