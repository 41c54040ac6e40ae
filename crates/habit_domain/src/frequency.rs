//! Decides whether a habit is due on the day after a reference date.
//!
//! Every run prepares the *next* day's entries, so all checks here look at
//! `reference + 1 day`. Reference dates are calendar dates already resolved in
//! the run's timezone (see [`crate::context::RunContext::reference_date`]).

use chrono::{Datelike, NaiveDate, Weekday};

use crate::habit::{weekday_name, Frequency, HabitDefinition};

pub fn is_due_tomorrow(habit: &HabitDefinition, reference: NaiveDate) -> bool {
    if !habit.enabled {
        return false;
    }
    let Some(target) = reference.succ_opt() else {
        return false;
    };
    habit.schedule().contains(target.weekday())
}

/// Habits due tomorrow, in input order.
pub fn due_habits(habits: &[HabitDefinition], reference: NaiveDate) -> Vec<HabitDefinition> {
    habits
        .iter()
        .filter(|habit| is_due_tomorrow(habit, reference))
        .cloned()
        .collect()
}

pub fn is_daily(habit: &HabitDefinition) -> bool {
    habit.schedule() == Frequency::DAILY
}

pub fn is_weekdays_only(habit: &HabitDefinition) -> bool {
    habit.schedule() == Frequency::WEEKDAYS
}

pub fn is_weekends_only(habit: &HabitDefinition) -> bool {
    habit.schedule() == Frequency::WEEKENDS
}

pub fn scheduled_weekdays(habit: &HabitDefinition) -> Vec<Weekday> {
    habit.schedule().days()
}

/// First date in `from + 1 ..= from + 7` on which the habit is due.
///
/// A frequency is a subset of a single week, so a week-long scan always finds
/// the next occurrence if there is one.
pub fn next_due_date(habit: &HabitDefinition, from: NaiveDate) -> Option<NaiveDate> {
    if !habit.enabled {
        return None;
    }
    let mut probe = from;
    for _ in 0..7 {
        if is_due_tomorrow(habit, probe) {
            return probe.succ_opt();
        }
        probe = probe.succ_opt()?;
    }
    None
}

/// Short label for logs, e.g. `daily`, `weekdays` or `monday, thursday`.
pub fn describe_frequency(habit: &HabitDefinition) -> String {
    let schedule = habit.schedule();
    if schedule == Frequency::DAILY {
        "daily".to_string()
    } else if schedule == Frequency::WEEKDAYS {
        "weekdays".to_string()
    } else if schedule == Frequency::WEEKENDS {
        "weekends".to_string()
    } else if schedule.is_empty() {
        "never".to_string()
    } else {
        schedule
            .days()
            .into_iter()
            .map(weekday_name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}
