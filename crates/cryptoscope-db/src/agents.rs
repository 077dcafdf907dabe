//! Automation agents and the tasks submitted through them.
//!
//! Agents are `active` or `paused`; only active agents take new tasks.
//! Task status moves `queued → running → done`, with `failed` reachable from
//! `queued` or `running`.

use chrono::{DateTime, Utc};
use cryptoscope_core::{RequestContext, TaskDescriptor};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const AGENT_COLUMNS: &str = "id, user_id, name, api_key, status, tasks_completed, created_at";
const AGENT_TASK_COLUMNS: &str = "id, public_id, agent_id, user_id, task_type, payload, status, \
     external_task_id, error_message, created_at, updated_at";

#[derive(Clone, sqlx::FromRow, Serialize)]
pub struct AgentRow {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    #[serde(skip)]
    pub api_key: String,
    pub status: String,
    pub tasks_completed: i64,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for AgentRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRow")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("name", &self.name)
            .field("api_key", &"[redacted]")
            .field("status", &self.status)
            .field("tasks_completed", &self.tasks_completed)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct AgentTaskRow {
    pub id: i64,
    pub public_id: Uuid,
    pub agent_id: i64,
    pub user_id: i64,
    pub task_type: String,
    /// The full task descriptor as sent to the platform.
    pub payload: serde_json::Value,
    pub status: String,
    pub external_task_id: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentStatus {
    Active,
    Paused,
}

impl AgentStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AgentStatus::Active => "active",
            AgentStatus::Paused => "paused",
        }
    }
}

/// Per-user agent counts plus task outcomes since a cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow, Serialize)]
pub struct AgentStats {
    pub total_agents: i64,
    pub active_agents: i64,
    pub paused_agents: i64,
    pub completed_tasks: i64,
    pub failed_tasks: i64,
    /// Not limited by the cutoff.
    pub queued_tasks: i64,
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_agent(
    pool: &PgPool,
    ctx: RequestContext,
    name: &str,
    api_key: &str,
) -> Result<AgentRow, DbError> {
    let row = sqlx::query_as::<_, AgentRow>(&format!(
        "INSERT INTO agents (user_id, name, api_key) VALUES ($1, $2, $3) \
         RETURNING {AGENT_COLUMNS}"
    ))
    .bind(ctx.user_id)
    .bind(name)
    .bind(api_key)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if the caller owns no such agent.
pub async fn get_agent_for_user(
    pool: &PgPool,
    ctx: RequestContext,
    agent_id: i64,
) -> Result<AgentRow, DbError> {
    sqlx::query_as::<_, AgentRow>(&format!(
        "SELECT {AGENT_COLUMNS} FROM agents WHERE id = $1 AND user_id = $2"
    ))
    .bind(agent_id)
    .bind(ctx.user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// The caller's agents, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_agents(pool: &PgPool, ctx: RequestContext) -> Result<Vec<AgentRow>, DbError> {
    let rows = sqlx::query_as::<_, AgentRow>(&format!(
        "SELECT {AGENT_COLUMNS} FROM agents WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
    ))
    .bind(ctx.user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Pauses or resumes one of the caller's agents. Setting the current status
/// again is a no-op that still returns the row.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the caller owns no such agent.
pub async fn set_agent_status(
    pool: &PgPool,
    ctx: RequestContext,
    agent_id: i64,
    status: AgentStatus,
) -> Result<AgentRow, DbError> {
    sqlx::query_as::<_, AgentRow>(&format!(
        "UPDATE agents SET status = $1, updated_at = NOW() \
         WHERE id = $2 AND user_id = $3 \
         RETURNING {AGENT_COLUMNS}"
    ))
    .bind(status.as_str())
    .bind(agent_id)
    .bind(ctx.user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Deletes an agent together with its tasks.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the caller owns no such agent.
pub async fn delete_agent(pool: &PgPool, ctx: RequestContext, agent_id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM agents WHERE id = $1 AND user_id = $2")
        .bind(agent_id)
        .bind(ctx.user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn agent_stats(
    pool: &PgPool,
    ctx: RequestContext,
    since: DateTime<Utc>,
) -> Result<AgentStats, DbError> {
    let stats = sqlx::query_as::<_, AgentStats>(
        "SELECT a.total_agents, a.active_agents, a.paused_agents, \
                t.completed_tasks, t.failed_tasks, t.queued_tasks \
         FROM ( \
             SELECT COUNT(*) AS total_agents, \
                    COUNT(*) FILTER (WHERE status = 'active') AS active_agents, \
                    COUNT(*) FILTER (WHERE status = 'paused') AS paused_agents \
             FROM agents WHERE user_id = $1 \
         ) a \
         CROSS JOIN ( \
             SELECT COUNT(*) FILTER (WHERE status = 'done' AND created_at >= $2) \
                        AS completed_tasks, \
                    COUNT(*) FILTER (WHERE status = 'failed' AND created_at >= $2) \
                        AS failed_tasks, \
                    COUNT(*) FILTER (WHERE status = 'queued') AS queued_tasks \
             FROM agent_tasks WHERE user_id = $1 \
         ) t",
    )
    .bind(ctx.user_id)
    .bind(since)
    .fetch_one(pool)
    .await?;
    Ok(stats)
}

/// The caller's most recent tasks, optionally for one agent only.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_agent_tasks(
    pool: &PgPool,
    ctx: RequestContext,
    agent_id: Option<i64>,
    limit: i64,
) -> Result<Vec<AgentTaskRow>, DbError> {
    let rows = sqlx::query_as::<_, AgentTaskRow>(&format!(
        "SELECT {AGENT_TASK_COLUMNS} FROM agent_tasks \
         WHERE user_id = $1 AND ($2::BIGINT IS NULL OR agent_id = $2) \
         ORDER BY created_at DESC, id DESC \
         LIMIT $3"
    ))
    .bind(ctx.user_id)
    .bind(agent_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Records a `queued` task for an agent.
///
/// # Errors
///
/// Returns [`DbError::Json`] if the descriptor cannot be encoded, or
/// [`DbError::Sqlx`] if the insert fails.
pub async fn create_agent_task(
    pool: &PgPool,
    agent: &AgentRow,
    descriptor: &TaskDescriptor,
) -> Result<AgentTaskRow, DbError> {
    let payload = serde_json::to_value(descriptor)?;
    let row = sqlx::query_as::<_, AgentTaskRow>(&format!(
        "INSERT INTO agent_tasks (public_id, agent_id, user_id, task_type, payload, status) \
         VALUES ($1, $2, $3, $4, $5, 'queued') \
         RETURNING {AGENT_TASK_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(agent.id)
    .bind(agent.user_id)
    .bind(descriptor.kind().as_str())
    .bind(payload)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// `queued → running` once the platform has accepted the task.
///
/// # Errors
///
/// Returns [`DbError::InvalidAgentTaskTransition`] if the task is not queued.
pub async fn mark_agent_task_submitted(
    pool: &PgPool,
    id: i64,
    external_task_id: Option<&str>,
) -> Result<AgentTaskRow, DbError> {
    sqlx::query_as::<_, AgentTaskRow>(&format!(
        "UPDATE agent_tasks \
         SET status = 'running', external_task_id = $1, updated_at = NOW() \
         WHERE id = $2 AND status = 'queued' \
         RETURNING {AGENT_TASK_COLUMNS}"
    ))
    .bind(external_task_id)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::InvalidAgentTaskTransition {
        id,
        expected_status: "queued",
    })
}

/// `queued | running → failed`, recording the error text verbatim.
///
/// # Errors
///
/// Returns [`DbError::InvalidAgentTaskTransition`] if the task already finished.
pub async fn fail_agent_task(
    pool: &PgPool,
    id: i64,
    error_message: &str,
) -> Result<AgentTaskRow, DbError> {
    sqlx::query_as::<_, AgentTaskRow>(&format!(
        "UPDATE agent_tasks \
         SET status = 'failed', error_message = $1, updated_at = NOW() \
         WHERE id = $2 AND status IN ('queued', 'running') \
         RETURNING {AGENT_TASK_COLUMNS}"
    ))
    .bind(error_message)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::InvalidAgentTaskTransition {
        id,
        expected_status: "queued|running",
    })
}

/// `running → done`, bumping the agent's completed-task counter in the same
/// transaction.
///
/// # Errors
///
/// Returns [`DbError::InvalidAgentTaskTransition`] if the task is not running.
pub async fn complete_agent_task(pool: &PgPool, id: i64) -> Result<AgentTaskRow, DbError> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, AgentTaskRow>(&format!(
        "UPDATE agent_tasks SET status = 'done', updated_at = NOW() \
         WHERE id = $1 AND status = 'running' \
         RETURNING {AGENT_TASK_COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(DbError::InvalidAgentTaskTransition {
        id,
        expected_status: "running",
    })?;

    sqlx::query(
        "UPDATE agents SET tasks_completed = tasks_completed + 1, updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(row.agent_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no task has this id.
pub async fn get_agent_task(pool: &PgPool, id: i64) -> Result<AgentTaskRow, DbError> {
    sqlx::query_as::<_, AgentTaskRow>(&format!(
        "SELECT {AGENT_TASK_COLUMNS} FROM agent_tasks WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}
