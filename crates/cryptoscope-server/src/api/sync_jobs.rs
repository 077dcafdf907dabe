use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use cryptoscope_core::RequestContext;
use cryptoscope_db::SyncJobRow;
use serde::Deserialize;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState};
use crate::jobs::run_sync_job;
use crate::middleware::RequestId;

const DEFAULT_JOB_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
pub(super) struct SyncJobsQuery {
    pub account_id: Option<i64>,
    pub limit: Option<i64>,
}

/// Creates a `pending` job and runs it in the background.
///
/// Responds `202` with the job row as created; poll `/api/v1/sync-jobs`
/// for its outcome.
pub(super) async fn trigger_sync(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(ctx): Extension<RequestContext>,
    Path(account_id): Path<i64>,
) -> Result<(StatusCode, Json<ApiResponse<SyncJobRow>>), ApiError> {
    let account = cryptoscope_db::get_account_for_user(&state.pool, ctx, account_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let job = cryptoscope_db::create_sync_job(&state.pool, account.id, "api")
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let pool = state.pool.clone();
    let services = Arc::clone(&state.services);
    let job_id = job.id;
    tokio::spawn(async move {
        if let Err(e) = run_sync_job(&pool, &services, job_id, &account).await {
            tracing::error!(job_id, account_id = account.id, error = %e, "background sync job failed");
        }
    });

    tracing::info!(account_id, job_id, "sync job queued");
    Ok((StatusCode::ACCEPTED, Json(ApiResponse::new(req_id.0, job))))
}

pub(super) async fn list_sync_jobs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<SyncJobsQuery>,
) -> Result<Json<ApiResponse<Vec<SyncJobRow>>>, ApiError> {
    let limit = normalize_limit(query.limit, DEFAULT_JOB_LIMIT);
    let jobs = cryptoscope_db::list_sync_jobs(&state.pool, ctx, query.account_id, limit)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(req_id.0, jobs)))
}
