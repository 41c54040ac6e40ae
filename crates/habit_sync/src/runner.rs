use std::sync::Arc;

use anyhow::Result;
use tracing::instrument;

use habit_domain::{
    frequency::{describe_frequency, due_habits},
    time_range::{calculate_time_range, format_time_range_for_display},
    HabitDefinition, RunContext,
};

use crate::report::{CreatedEntry, RunReport, SkippedHabit};
use crate::retry::{retry_async, RetryPolicy};
use crate::sink::{TemplateRequest, TemplateSink};

/// Creates tomorrow's habit entries through a [`TemplateSink`].
pub struct HabitRunner {
    sink: Arc<dyn TemplateSink>,
    retry: RetryPolicy,
}

impl HabitRunner {
    pub fn new(sink: Arc<dyn TemplateSink>) -> Self {
        Self {
            sink,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Runs every habit independently: a habit that cannot be scheduled or
    /// created is listed in `failures` and the others carry on.
    #[instrument(skip(self, habits, context), fields(timezone = context.timezone_name(), habit_count = habits.len()))]
    pub async fn run(&self, habits: &[HabitDefinition], context: &RunContext) -> RunReport {
        let reference_date = context.reference_date();
        let timezone = context.timezone_name();
        let mut report = RunReport::new(reference_date, context.target_date(), timezone);

        let due = due_habits(habits, reference_date);
        for habit in habits {
            if !habit.enabled {
                report.skipped.push(SkippedHabit {
                    habit: habit.name.clone(),
                    reason: "disabled".to_string(),
                });
            } else if !due.contains(habit) {
                tracing::debug!(habit = %habit.name, frequency = %describe_frequency(habit), "not due tomorrow");
                report.skipped.push(SkippedHabit {
                    habit: habit.name.clone(),
                    reason: format!("not scheduled ({})", describe_frequency(habit)),
                });
            }
        }

        let mut pending = Vec::new();
        for habit in &due {
            let range = match calculate_time_range(habit, timezone, context.reference) {
                Ok(range) => range,
                Err(err) => {
                    tracing::warn!(habit = %habit.name, error = %err, "unable to compute time range");
                    report.record_failure(&habit.name, err);
                    continue;
                }
            };
            let window = format_time_range_for_display(&range, timezone)
                .unwrap_or_else(|_| format!("{} - {}", range.start_iso(), range.end_iso()));

            let request = TemplateRequest::for_habit(&habit.name, &habit.template_id, range);
            let sink = Arc::clone(&self.sink);
            let retry = self.retry;
            let handle = tokio::spawn(async move {
                let label = format!("create entry for `{}`", request.habit_name);
                let result: Result<String> =
                    retry_async(retry, &label, || sink.create_from_template(&request)).await;
                (request, result)
            });
            pending.push((habit.name.clone(), window, handle));
        }

        for (name, window, handle) in pending {
            match handle.await {
                Ok((request, Ok(record_id))) => {
                    tracing::info!(habit = %name, %record_id, %window, "habit entry created");
                    report.created.push(CreatedEntry {
                        habit: name,
                        template_id: request.template_id,
                        record_id,
                        range: request.range,
                        display: window,
                    });
                }
                Ok((_, Err(err))) => {
                    let message = format!("{err:#}");
                    tracing::error!(habit = %name, error = %message, "habit entry creation failed");
                    report.record_failure(&name, message);
                }
                Err(err) => {
                    tracing::error!(habit = %name, error = %err, "habit task aborted");
                    report.record_failure(&name, err);
                }
            }
        }

        tracing::info!(summary = %report.summary(), "habit run finished");
        report
    }
}
