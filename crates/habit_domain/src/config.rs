use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::habit::HabitDefinition;
use crate::time_range::{is_valid_time_format, is_valid_timezone};

/// Habit definitions as read from disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct HabitsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default)]
    pub habits: Vec<HabitDefinition>,
}

/// A problem with one habit's configuration. Issues never stop loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub habit: Option<String>,
    pub message: String,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.habit {
            Some(habit) => write!(f, "habit `{}`: {}", habit, self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl HabitsConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&raw)?;
        let issues = config.validate();
        for issue in &issues {
            tracing::warn!(path = %path.display(), %issue, "habit config issue");
        }
        tracing::info!(
            path = %path.display(),
            habit_count = config.habits.len(),
            issue_count = issues.len(),
            "loaded habit config"
        );
        Ok(config)
    }

    /// Accepts either `{ "timezone": .., "habits": [..] }` or a bare array of habits.
    /// Unknown top-level keys are rejected.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim_start().starts_with('[') {
            let habits: Vec<HabitDefinition> = serde_json::from_str(raw)?;
            return Ok(Self {
                timezone: None,
                habits,
            });
        }
        Ok(serde_json::from_str(raw)?)
    }

    pub fn enabled_habits(&self) -> impl Iterator<Item = &HabitDefinition> {
        self.habits.iter().filter(|habit| habit.enabled)
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if let Some(timezone) = &self.timezone {
            if !is_valid_timezone(timezone) {
                issues.push(ConfigIssue {
                    habit: None,
                    message: format!("unknown timezone `{timezone}`"),
                });
            }
        }
        for habit in &self.habits {
            let mut push = |message: String| {
                issues.push(ConfigIssue {
                    habit: Some(habit.name.clone()),
                    message,
                })
            };
            if habit.name.trim().is_empty() {
                push("name is empty".to_string());
            }
            if habit.template_id.trim().is_empty() {
                push("templateId is empty".to_string());
            }
            for (label, value) in [("startTime", &habit.start_time), ("endTime", &habit.end_time)] {
                if !is_valid_time_format(value) {
                    push(format!("{label} `{value}` is not HH:MM"));
                }
            }
            if habit.start_time == habit.end_time {
                push("startTime and endTime are identical".to_string());
            }
            for token in habit.invalid_frequency_tokens() {
                push(format!("unknown weekday `{token}` ignored"));
            }
            if habit.schedule().is_empty() {
                push("frequency has no valid weekdays; habit will never run".to_string());
            }
        }
        issues
    }
}
