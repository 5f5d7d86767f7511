//! crates/study_tracker_core/src/streak.rs
//!
//! Calendar streaks over a user's daily activity.

use chrono::{Days, NaiveDate};
use std::collections::BTreeSet;

use crate::domain::DailyActivity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreakSummary {
    /// Consecutive active days ending today, or ending yesterday if nothing
    /// has been logged today yet.
    pub current_streak: u32,
    pub longest_streak: u32,
    pub active_days: u32,
}

/// Summarizes activity up to and including `today`. Days after `today` and
/// days without any minutes are ignored.
pub fn summarize(activity: &[DailyActivity], today: NaiveDate) -> StreakSummary {
    let days: BTreeSet<NaiveDate> = activity
        .iter()
        .filter(|d| d.date <= today && d.total_minutes > 0)
        .map(|d| d.date)
        .collect();

    StreakSummary {
        current_streak: current_streak(&days, today),
        longest_streak: longest_streak(&days),
        active_days: days.len() as u32,
    }
}

fn current_streak(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let start = if days.contains(&today) {
        today
    } else {
        match today.checked_sub_days(Days::new(1)) {
            Some(yesterday) if days.contains(&yesterday) => yesterday,
            _ => return 0,
        }
    };

    let mut streak = 0;
    let mut cursor = Some(start);
    while let Some(day) = cursor.filter(|d| days.contains(d)) {
        streak += 1;
        cursor = day.checked_sub_days(Days::new(1));
    }
    streak
}

fn longest_streak(days: &BTreeSet<NaiveDate>) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;

    for &day in days {
        run = match previous.and_then(|p| p.checked_add_days(Days::new(1))) {
            Some(expected) if expected == day => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(day);
    }
    longest
}
