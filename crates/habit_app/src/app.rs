use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use habit_sync::{NotionConfig, NotionTemplateSink, RetryPolicy, TemplateSink};
use tracing::{info, warn};

use crate::server::{router, AppState};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub habits_path: PathBuf,
    /// Overrides the timezone stored in the habit file.
    pub timezone: Option<String>,
    pub bind_addr: SocketAddr,
    pub webhook_secret: Option<String>,
    pub notion: NotionConfig,
    pub retry_attempts: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = var("HABITS_CONFIG_PATH") {
            config.habits_path = PathBuf::from(path);
        }
        config.timezone = var("HABITS_TIMEZONE");
        if let Some(addr) = var("WEBHOOK_BIND_ADDR") {
            config.bind_addr = addr
                .parse()
                .with_context(|| format!("WEBHOOK_BIND_ADDR `{addr}` is not a socket address"))?;
        }
        config.webhook_secret = var("WEBHOOK_SECRET");
        if let Some(key) = var("NOTION_API_KEY") {
            config.notion.api_key = key;
        }
        if let Some(database) = var("NOTION_DATABASE_ID") {
            config.notion.database_id = database;
        }
        if let Some(base) = var("NOTION_API_BASE") {
            config.notion.api_base = base;
        }
        if let Some(version) = var("NOTION_VERSION") {
            config.notion.notion_version = version;
        }
        if let Some(property) = var("NOTION_TAG_PROPERTY") {
            config.notion.tag_property = property;
        }
        if let Some(property) = var("NOTION_DATE_PROPERTY") {
            config.notion.date_property = property;
        }
        if let Some(attempts) = var("RETRY_MAX_ATTEMPTS") {
            match attempts.parse::<u32>() {
                Ok(value) if value > 0 => config.retry_attempts = value,
                _ => warn!(value = %attempts, "ignoring invalid RETRY_MAX_ATTEMPTS"),
            }
        }
        Ok(config)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default().with_max_attempts(self.retry_attempts)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            habits_path: PathBuf::from("habits.json"),
            timezone: None,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            webhook_secret: None,
            notion: NotionConfig::new("", ""),
            retry_attempts: 3,
        }
    }
}

pub async fn run(config: AppConfig) -> Result<()> {
    if config.webhook_secret.is_none() {
        warn!("WEBHOOK_SECRET is not set; every webhook call will be rejected");
    }
    let sink: Arc<dyn TemplateSink> = Arc::new(
        NotionTemplateSink::new(config.notion.clone())
            .context("failed to initialize notion client")?,
    );
    let bind_addr = config.bind_addr;
    let api_base = config.notion.api_base.clone();
    let state = AppState::new(config, sink);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!(addr = %bind_addr, notion_api = %api_base, "habit webhook listening");
    axum::serve(listener, router(state))
        .await
        .context("webhook server terminated")?;
    Ok(())
}
