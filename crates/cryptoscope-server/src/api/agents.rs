use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{Duration, Utc};
use cryptoscope_core::{RequestContext, TaskDescriptor};
use cryptoscope_db::{AgentRow, AgentStats, AgentStatus, AgentTaskRow};
use cryptoscope_notify::NotifyError;
use serde::Deserialize;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState};
use crate::middleware::RequestId;

const STATS_WINDOW_DAYS: i64 = 7;
const DEFAULT_TASK_LIMIT: i64 = 20;

#[derive(Debug, Deserialize)]
pub(super) struct TasksQuery {
    pub agent_id: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RegisterAgentBody {
    pub name: String,
    pub api_key: String,
}

pub(super) async fn register_agent(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<RegisterAgentBody>,
) -> Result<(StatusCode, Json<ApiResponse<AgentRow>>), ApiError> {
    if body.name.trim().is_empty() || body.api_key.trim().is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "name and api_key are required",
        ));
    }

    let agent = cryptoscope_db::create_agent(&state.pool, ctx, body.name.trim(), body.api_key.trim())
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(req_id.0, agent))))
}

pub(super) async fn list_agents(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<ApiResponse<Vec<AgentRow>>>, ApiError> {
    let agents = cryptoscope_db::list_agents(&state.pool, ctx)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(req_id.0, agents)))
}

async fn set_status(
    state: &AppState,
    req_id: RequestId,
    ctx: RequestContext,
    agent_id: i64,
    status: AgentStatus,
) -> Result<Json<ApiResponse<AgentRow>>, ApiError> {
    let agent = cryptoscope_db::set_agent_status(&state.pool, ctx, agent_id, status)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    tracing::info!(agent_id, status = status.as_str(), "agent status changed");
    Ok(Json(ApiResponse::new(req_id.0, agent)))
}

pub(super) async fn pause_agent(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(ctx): Extension<RequestContext>,
    Path(agent_id): Path<i64>,
) -> Result<Json<ApiResponse<AgentRow>>, ApiError> {
    set_status(&state, req_id, ctx, agent_id, AgentStatus::Paused).await
}

pub(super) async fn resume_agent(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(ctx): Extension<RequestContext>,
    Path(agent_id): Path<i64>,
) -> Result<Json<ApiResponse<AgentRow>>, ApiError> {
    set_status(&state, req_id, ctx, agent_id, AgentStatus::Active).await
}

pub(super) async fn delete_agent(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(ctx): Extension<RequestContext>,
    Path(agent_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    cryptoscope_db::delete_agent(&state.pool, ctx, agent_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    tracing::info!(agent_id, "agent deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Agent counts plus task outcomes over the last seven days.
pub(super) async fn agent_stats(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<ApiResponse<AgentStats>>, ApiError> {
    let since = Utc::now() - Duration::days(STATS_WINDOW_DAYS);
    let stats = cryptoscope_db::agent_stats(&state.pool, ctx, since)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(req_id.0, stats)))
}

pub(super) async fn list_tasks(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<TasksQuery>,
) -> Result<Json<ApiResponse<Vec<AgentTaskRow>>>, ApiError> {
    let limit = normalize_limit(query.limit, DEFAULT_TASK_LIMIT);
    let tasks = cryptoscope_db::list_agent_tasks(&state.pool, ctx, query.agent_id, limit)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(req_id.0, tasks)))
}

/// Records the task, forwards it to the automation platform with the
/// agent's key, and stores the outcome on the task row.
///
/// A platform rejection fails the task with the platform's raw response
/// text and is returned as `502 upstream_failure` carrying that text.
/// Agents that are not active get `409 conflict` and nothing is stored.
pub(super) async fn submit_task(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(ctx): Extension<RequestContext>,
    Path(agent_id): Path<i64>,
    Json(descriptor): Json<TaskDescriptor>,
) -> Result<(StatusCode, Json<ApiResponse<AgentTaskRow>>), ApiError> {
    descriptor
        .validate()
        .map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e.to_string()))?;

    let agent = cryptoscope_db::get_agent_for_user(&state.pool, ctx, agent_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    if agent.status != AgentStatus::Active.as_str() {
        return Err(ApiError::new(
            req_id.0,
            "conflict",
            format!("agent is {}", agent.status),
        ));
    }
    let task = cryptoscope_db::create_agent_task(&state.pool, &agent, &descriptor)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    match state
        .services
        .automation
        .submit(&agent.api_key, &descriptor)
        .await
    {
        Ok(receipt) => {
            cryptoscope_db::mark_agent_task_submitted(
                &state.pool,
                task.id,
                receipt.external_task_id.as_deref(),
            )
            .await
            .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
            let done = cryptoscope_db::complete_agent_task(&state.pool, task.id)
                .await
                .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

            tracing::info!(
                agent_id,
                task_id = done.id,
                task_type = %done.task_type,
                "agent task accepted by automation platform"
            );
            Ok((StatusCode::CREATED, Json(ApiResponse::new(req_id.0, done))))
        }
        Err(e) => {
            let message = match &e {
                NotifyError::UpstreamFailure { body, .. } => body.clone(),
                other => other.to_string(),
            };
            tracing::warn!(agent_id, task_id = task.id, error = %e, "agent task submission failed");

            if let Err(db_err) =
                cryptoscope_db::fail_agent_task(&state.pool, task.id, &message).await
            {
                tracing::error!(task_id = task.id, error = %db_err, "failed to record task failure");
            }
            Err(ApiError::new(req_id.0, "upstream_failure", message))
        }
    }
}
