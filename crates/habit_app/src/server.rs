use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use habit_domain::{
    config::HabitsConfig, time_range::current_time_in_timezone, RunContext,
};
use habit_sync::{HabitRunner, RunReport, TemplateSink};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::app::AppConfig;

pub const SECRET_HEADER: &str = "x-webhook-secret";
const DEFAULT_TIMEZONE: &str = "UTC";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    config: Arc<AppConfig>,
    sink: Arc<dyn TemplateSink>,
    last_report: Arc<RwLock<Option<RunReport>>>,
}

impl AppState {
    pub fn new(config: AppConfig, sink: Arc<dyn TemplateSink>) -> Self {
        Self {
            config: Arc::new(config),
            sink,
            last_report: Arc::new(RwLock::new(None)),
        }
    }

    pub fn last_report(&self) -> Option<RunReport> {
        self.last_report.read().clone()
    }
}

/// API Response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebhookRequest {
    reference_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    timezone: String,
    local_time: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(run_habits))
        .route("/health", get(health_check))
        .route("/runs/last", get(last_run))
        .with_state(state)
}

fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::<()>::err(message))).into_response()
}

fn authorized(config: &AppConfig, headers: &HeaderMap) -> bool {
    let Some(expected) = config.webhook_secret.as_deref() else {
        return false;
    };
    headers
        .get(SECRET_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|provided| provided == expected)
        .unwrap_or(false)
}

fn resolve_timezone(config: &AppConfig, habits: Option<&HabitsConfig>) -> String {
    config
        .timezone
        .clone()
        .or_else(|| habits.and_then(|file| file.timezone.clone()))
        .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string())
}

/// Reads the habit file off the async runtime.
async fn load_habits(path: PathBuf) -> anyhow::Result<HabitsConfig> {
    let habits = tokio::task::spawn_blocking(move || HabitsConfig::load(path))
        .await
        .context("habit loader task failed")??;
    Ok(habits)
}

/// POST /webhook - Create tomorrow's habit entries
async fn run_habits(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    if !authorized(&state.config, &headers) {
        tracing::warn!("rejected webhook call with missing or wrong secret");
        return failure(StatusCode::UNAUTHORIZED, "unauthorized");
    }

    let request = if body.iter().all(u8::is_ascii_whitespace) {
        WebhookRequest::default()
    } else {
        match serde_json::from_slice::<WebhookRequest>(&body) {
            Ok(request) => request,
            Err(err) => return failure(StatusCode::BAD_REQUEST, format!("invalid request body: {err}")),
        }
    };

    let habits = match load_habits(state.config.habits_path.clone()).await {
        Ok(habits) => habits,
        Err(err) => {
            let message = format!("{err:#}");
            tracing::error!(error = %message, "unable to load habits");
            return failure(StatusCode::INTERNAL_SERVER_ERROR, message);
        }
    };
    let timezone = resolve_timezone(&state.config, Some(&habits));
    let context = match RunContext::new(&timezone, request.reference_date) {
        Ok(context) => context,
        Err(err) => {
            tracing::error!(error = %err, "unable to build run context");
            return failure(StatusCode::INTERNAL_SERVER_ERROR, err.to_string());
        }
    };

    let runner = HabitRunner::new(Arc::clone(&state.sink)).with_retry(state.config.retry_policy());
    let report = runner.run(&habits.habits, &context).await;
    *state.last_report.write() = Some(report.clone());

    (StatusCode::OK, Json(ApiResponse::ok(report))).into_response()
}

/// GET /health - Health check
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let habits = load_habits(state.config.habits_path.clone()).await;
    if let Err(err) = &habits {
        let message = format!("{err:#}");
        tracing::warn!(error = %message, "health check could not read habits");
    }
    let timezone = resolve_timezone(&state.config, habits.ok().as_ref());
    let local_time = current_time_in_timezone(&timezone).ok();
    Json(ApiResponse::ok(HealthResponse {
        status: "ok",
        timezone,
        local_time,
    }))
}

/// GET /runs/last - Most recent run report
async fn last_run(State(state): State<AppState>) -> Response {
    match state.last_report() {
        Some(report) => (StatusCode::OK, Json(ApiResponse::ok(report))).into_response(),
        None => failure(StatusCode::NOT_FOUND, "no run recorded yet"),
    }
}
