pub mod notion;
pub mod report;
pub mod retry;
pub mod runner;
pub mod sink;

pub use crate::notion::{NotionConfig, NotionTemplateSink};
pub use crate::report::{CreatedEntry, HabitFailure, RunReport, SkippedHabit};
pub use crate::retry::RetryPolicy;
pub use crate::runner::HabitRunner;
pub use crate::sink::{TemplateRequest, TemplateSink, HABIT_TAG};
