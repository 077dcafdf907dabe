use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::Utc;
use cryptoscope_core::{Alert, RequestContext};
use cryptoscope_insights::{detect_alerts, rank_alerts};
use serde::Deserialize;

use super::{map_db_error, map_job_error, normalize_limit, ApiError, ApiResponse, AppState};
use crate::jobs::alerts::load_account_window;
use crate::middleware::RequestId;

const DEFAULT_ALERT_LIMIT: i64 = 20;

#[derive(Debug, Deserialize)]
pub(super) struct AlertsQuery {
    pub account_id: Option<i64>,
    pub limit: Option<i64>,
}

/// Freshly evaluated alerts for the caller's accounts, ranked.
///
/// `account_id` narrows the account alerts; the caller's competitor alerts
/// are always included.
/// Nothing here reads or writes the notification ledger.
pub(super) async fn list_alerts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<AlertsQuery>,
) -> Result<Json<ApiResponse<Vec<Alert>>>, ApiError> {
    let limit = normalize_limit(query.limit, DEFAULT_ALERT_LIMIT);
    let db_err = |e: &cryptoscope_db::DbError| map_db_error(req_id.0.clone(), e);

    let accounts = match query.account_id {
        Some(id) => vec![cryptoscope_db::get_account_for_user(&state.pool, ctx, id)
            .await
            .map_err(|e| db_err(&e))?],
        None => cryptoscope_db::list_accounts_for_user(&state.pool, ctx)
            .await
            .map_err(|e| db_err(&e))?,
    };

    let now = Utc::now();
    let mut windows = Vec::with_capacity(accounts.len());
    for account in &accounts {
        let window = load_account_window(&state.pool, account, now)
            .await
            .map_err(|e| map_job_error(req_id.0.clone(), &e))?;
        windows.push(window);
    }

    let competitors = cryptoscope_db::list_competitors(&state.pool, ctx)
        .await
        .map_err(|e| db_err(&e))?;

    let alerts = rank_alerts(
        detect_alerts(now, &windows, &competitors),
        usize::try_from(limit).unwrap_or(usize::MAX),
    );
    Ok(Json(ApiResponse::new(req_id.0.clone(), alerts)))
}
