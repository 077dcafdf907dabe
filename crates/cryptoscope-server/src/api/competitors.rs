use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use cryptoscope_core::{Competitor, RequestContext};
use serde::Deserialize;

use super::{map_db_error, map_job_error, ApiError, ApiResponse, AppState};
use crate::jobs::refresh_competitor_now;
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub(super) struct AddCompetitorBody {
    pub handle: String,
}

pub(super) async fn list_competitors(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<ApiResponse<Vec<Competitor>>>, ApiError> {
    let competitors = cryptoscope_db::list_competitors(&state.pool, ctx)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(req_id.0, competitors)))
}

pub(super) async fn add_competitor(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<AddCompetitorBody>,
) -> Result<(StatusCode, Json<ApiResponse<Competitor>>), ApiError> {
    if body.handle.trim().trim_start_matches('@').is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "handle must not be empty",
        ));
    }

    let mut competitor = cryptoscope_db::add_competitor(&state.pool, ctx, &body.handle)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    // First counts are fetched straight away; a failure leaves the row for
    // the next scheduled refresh.
    if competitor.last_synced_at.is_none() && state.services.profiles.is_some() {
        match refresh_competitor_now(&state.pool, &state.services, &competitor).await {
            Ok(updated) => competitor = updated,
            Err(e) => tracing::warn!(
                competitor_id = competitor.id,
                error = %e,
                "initial competitor refresh failed"
            ),
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(req_id.0, competitor)),
    ))
}

pub(super) async fn remove_competitor(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(ctx): Extension<RequestContext>,
    Path(competitor_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    cryptoscope_db::remove_competitor(&state.pool, ctx, competitor_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn refresh_competitor(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(ctx): Extension<RequestContext>,
    Path(competitor_id): Path<i64>,
) -> Result<Json<ApiResponse<Competitor>>, ApiError> {
    let competitor = cryptoscope_db::get_competitor_for_user(&state.pool, ctx, competitor_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let refreshed = refresh_competitor_now(&state.pool, &state.services, &competitor)
        .await
        .map_err(|e| map_job_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(req_id.0, refreshed)))
}
