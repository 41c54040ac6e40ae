use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use habit_domain::TimeRange;

/// Tag stamped on every entry created by a habit run.
pub const HABIT_TAG: &str = "HABIT";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplateRequest {
    pub template_id: String,
    pub habit_name: String,
    pub tag: String,
    pub range: TimeRange,
}

impl TemplateRequest {
    pub fn for_habit(habit_name: &str, template_id: &str, range: TimeRange) -> Self {
        Self {
            template_id: template_id.to_string(),
            habit_name: habit_name.to_string(),
            tag: HABIT_TAG.to_string(),
            range,
        }
    }
}

/// Backend that instantiates a page template with the supplied properties.
/// Returns the identifier of the created record.
#[async_trait]
pub trait TemplateSink: Send + Sync {
    async fn create_from_template(&self, request: &TemplateRequest) -> Result<String>;
}
