use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use habit_domain::TimeRange;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreatedEntry {
    pub habit: String,
    pub template_id: String,
    pub record_id: String,
    pub range: TimeRange,
    /// Local `HH:MM - HH:MM` rendering of `range`.
    pub display: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SkippedHabit {
    pub habit: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HabitFailure {
    pub habit: String,
    pub error: String,
}

/// Outcome of one scheduling run. Partial failure is reported per habit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub reference_date: NaiveDate,
    pub target_date: Option<NaiveDate>,
    pub timezone: String,
    pub created: Vec<CreatedEntry>,
    pub skipped: Vec<SkippedHabit>,
    pub failures: Vec<HabitFailure>,
}

impl RunReport {
    pub fn new(reference_date: NaiveDate, target_date: Option<NaiveDate>, timezone: &str) -> Self {
        Self {
            reference_date,
            target_date,
            timezone: timezone.to_string(),
            created: Vec::new(),
            skipped: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn succeeded(&self) -> usize {
        self.created.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} created, {} skipped, {} failed",
            self.succeeded(),
            self.skipped_count(),
            self.failed_count()
        )
    }

    pub(crate) fn record_failure(&mut self, habit: &str, error: impl ToString) {
        self.failures.push(HabitFailure {
            habit: habit.to_string(),
            error: error.to_string(),
        });
    }
}
