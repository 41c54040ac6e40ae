use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::sink::{TemplateRequest, TemplateSink};

pub const DEFAULT_API_BASE: &str = "https://api.notion.com";
pub const DEFAULT_NOTION_VERSION: &str = "2025-09-03";

/// Connection details and property names for the target Notion database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotionConfig {
    pub api_key: String,
    pub database_id: String,
    pub api_base: String,
    pub notion_version: String,
    pub tag_property: String,
    pub date_property: String,
}

impl NotionConfig {
    pub fn new(api_key: impl Into<String>, database_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            database_id: database_id.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            notion_version: DEFAULT_NOTION_VERSION.to_string(),
            tag_property: "Tags".to_string(),
            date_property: "Date".to_string(),
        }
    }
}

/// Creates pages from Notion templates over the public REST API.
pub struct NotionTemplateSink {
    client: reqwest::Client,
    config: NotionConfig,
}

#[derive(Debug, Deserialize)]
struct CreatedPage {
    id: String,
}

impl NotionTemplateSink {
    pub fn new(config: NotionConfig) -> Result<Self> {
        anyhow::ensure!(!config.api_key.trim().is_empty(), "notion api key is empty");
        anyhow::ensure!(
            !config.database_id.trim().is_empty(),
            "notion database id is empty"
        );
        let client = reqwest::Client::builder()
            .user_agent(concat!("habit_sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build http client")?;
        Ok(Self { client, config })
    }

    pub fn page_body(&self, request: &TemplateRequest) -> Value {
        let mut properties = serde_json::Map::new();
        properties.insert(
            self.config.tag_property.clone(),
            json!({ "select": { "name": request.tag } }),
        );
        properties.insert(
            self.config.date_property.clone(),
            json!({
                "date": {
                    "start": request.range.start_iso(),
                    "end": request.range.end_iso(),
                }
            }),
        );
        json!({
            "parent": { "database_id": self.config.database_id },
            "template": { "type": "template_id", "template_id": request.template_id },
            "properties": properties,
        })
    }

    fn pages_url(&self) -> String {
        format!("{}/v1/pages", self.config.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl TemplateSink for NotionTemplateSink {
    async fn create_from_template(&self, request: &TemplateRequest) -> Result<String> {
        let response = self
            .client
            .post(self.pages_url())
            .bearer_auth(&self.config.api_key)
            .header("Notion-Version", &self.config.notion_version)
            .json(&self.page_body(request))
            .send()
            .await
            .with_context(|| format!("request for habit `{}` failed", request.habit_name))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("notion responded with {status}: {body}"));
        }
        let page: CreatedPage = response
            .json()
            .await
            .context("unexpected notion response")?;
        tracing::debug!(habit = %request.habit_name, page_id = %page.id, "notion page created");
        Ok(page.id)
    }
}
