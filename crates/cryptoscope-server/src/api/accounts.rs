use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{Duration, Utc};
use cryptoscope_core::{Account, HashtagPeriod, Mention, RequestContext};
use cryptoscope_insights::{
    best_posting_hours, filter_by_keywords, mention_timeline, BestHour, HashtagTrend,
    HealthReport, SentimentBreakdown, TimelineDay, BEST_TIME_LOOKBACK_DAYS,
};
use serde::{Deserialize, Serialize};

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState};
use crate::middleware::RequestId;

const HEALTH_WINDOW_DAYS: i64 = 30;
const DEFAULT_SENTIMENT_DAYS: i64 = 7;
const DEFAULT_TIMELINE_DAYS: i64 = 14;
const MAX_SENTIMENT_DAYS: i64 = 90;
const DEFAULT_HASHTAG_LIMIT: i64 = 20;

#[derive(Debug, Deserialize)]
pub(super) struct ConnectAccountBody {
    pub handle: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SentimentQuery {
    pub days: Option<i64>,
    pub timeline_days: Option<i64>,
    /// Comma-separated; when present, matching mentions are returned too.
    pub keywords: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct SentimentView {
    pub days: i64,
    pub breakdown: SentimentBreakdown,
    pub health_score: i64,
    pub timeline: Vec<TimelineDay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matching_mentions: Option<Vec<Mention>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct HashtagQuery {
    pub period: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct HashtagView {
    pub period: HashtagPeriod,
    pub hashtags: Vec<HashtagTrend>,
}

/// Resolves an account the caller owns, or 404.
pub(super) async fn owned_account(
    state: &AppState,
    ctx: RequestContext,
    account_id: i64,
    req_id: &RequestId,
) -> Result<Account, ApiError> {
    cryptoscope_db::get_account_for_user(&state.pool, ctx, account_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))
}

pub(super) async fn list_accounts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<ApiResponse<Vec<Account>>>, ApiError> {
    let accounts = cryptoscope_db::list_accounts_for_user(&state.pool, ctx)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(req_id.0, accounts)))
}

pub(super) async fn connect_account(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<ConnectAccountBody>,
) -> Result<(StatusCode, Json<ApiResponse<Account>>), ApiError> {
    let handle = body.handle.trim().trim_start_matches('@');
    if handle.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "handle must not be empty",
        ));
    }

    let account = cryptoscope_db::create_account(
        &state.pool,
        ctx,
        handle,
        body.display_name.as_deref(),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(account_id = account.id, handle = %account.handle, "account connected");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(req_id.0, account)),
    ))
}

pub(super) async fn disconnect_account(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(ctx): Extension<RequestContext>,
    Path(account_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    cryptoscope_db::delete_account(&state.pool, ctx, account_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    tracing::info!(account_id, "account disconnected");
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn account_health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(ctx): Extension<RequestContext>,
    Path(account_id): Path<i64>,
) -> Result<Json<ApiResponse<HealthReport>>, ApiError> {
    let account = owned_account(&state, ctx, account_id, &req_id).await?;
    let now = Utc::now();
    let since = now - Duration::days(HEALTH_WINDOW_DAYS);

    let mentions = cryptoscope_db::list_mentions_since(&state.pool, account.id, since)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let snapshots = cryptoscope_db::list_snapshots_since(&state.pool, account.id, since)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let report = HealthReport::build(now, &mentions, &snapshots);
    Ok(Json(ApiResponse::new(req_id.0, report)))
}

pub(super) async fn account_sentiment(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(ctx): Extension<RequestContext>,
    Path(account_id): Path<i64>,
    Query(query): Query<SentimentQuery>,
) -> Result<Json<ApiResponse<SentimentView>>, ApiError> {
    let account = owned_account(&state, ctx, account_id, &req_id).await?;
    let days = query
        .days
        .unwrap_or(DEFAULT_SENTIMENT_DAYS)
        .clamp(1, MAX_SENTIMENT_DAYS);
    let timeline_days = query
        .timeline_days
        .unwrap_or(DEFAULT_TIMELINE_DAYS)
        .clamp(1, MAX_SENTIMENT_DAYS);

    let now = Utc::now();
    let since = now - Duration::days(days.max(timeline_days));
    let mentions = cryptoscope_db::list_mentions_since(&state.pool, account.id, since)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let window_start = now - Duration::days(days);
    let in_window: Vec<Mention> = mentions
        .iter()
        .filter(|m| m.published_at >= window_start)
        .cloned()
        .collect();
    let breakdown = SentimentBreakdown::from_mentions(&in_window);

    let matching_mentions = query.keywords.as_deref().map(|raw| {
        let keywords: Vec<String> = raw.split(',').map(str::to_owned).collect();
        filter_by_keywords(&in_window, &keywords)
            .into_iter()
            .cloned()
            .collect()
    });

    Ok(Json(ApiResponse::new(
        req_id.0,
        SentimentView {
            days,
            health_score: breakdown.health_score(),
            breakdown,
            timeline: mention_timeline(now, &mentions, timeline_days),
            matching_mentions,
        },
    )))
}

pub(super) async fn best_times(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(ctx): Extension<RequestContext>,
    Path(account_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<BestHour>>>, ApiError> {
    let account = owned_account(&state, ctx, account_id, &req_id).await?;
    let now = Utc::now();
    let since = now - Duration::days(BEST_TIME_LOOKBACK_DAYS);

    let posts = cryptoscope_db::list_posts_since(&state.pool, account.id, since)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(
        req_id.0,
        best_posting_hours(now, &posts),
    )))
}

pub(super) async fn trending_hashtags(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(ctx): Extension<RequestContext>,
    Path(account_id): Path<i64>,
    Query(query): Query<HashtagQuery>,
) -> Result<Json<ApiResponse<HashtagView>>, ApiError> {
    let period = match query.period.as_deref() {
        None => HashtagPeriod::Month,
        Some(raw) => raw
            .parse::<HashtagPeriod>()
            .map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e.to_string()))?,
    };
    let limit = normalize_limit(query.limit, DEFAULT_HASHTAG_LIMIT);

    let account = owned_account(&state, ctx, account_id, &req_id).await?;
    let rows = cryptoscope_db::list_hashtag_analytics(&state.pool, account.id, period)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let hashtags = cryptoscope_insights::trending_hashtags(
        &rows,
        period,
        usize::try_from(limit).unwrap_or(usize::MAX),
    );
    Ok(Json(ApiResponse::new(
        req_id.0,
        HashtagView { period, hashtags },
    )))
}
