pub mod config;
pub mod context;
pub mod error;
pub mod frequency;
pub mod habit;
pub mod time_range;

pub use crate::context::RunContext;
pub use crate::error::{ConfigError, ScheduleError};
pub use crate::habit::{Frequency, HabitDefinition};
pub use crate::time_range::TimeRange;
