use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{Duration, Utc};
use cryptoscope_core::RequestContext;
use cryptoscope_insights::{
    compare_with_competitors, dashboard_stats, follower_growth, top_mentioners, top_posts,
    CompetitorComparison, DashboardStats, GrowthPoint, Mentioner, TopPost,
    DASHBOARD_WINDOW_DAYS,
};
use serde::Deserialize;

use super::accounts::owned_account;
use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState};
use crate::middleware::RequestId;

const DEFAULT_WINDOW_DAYS: i64 = 30;
const MAX_WINDOW_DAYS: i64 = 365;
const DEFAULT_TOP_POSTS: i64 = 10;
const DEFAULT_TOP_MENTIONERS: i64 = 20;

#[derive(Debug, Deserialize)]
pub(super) struct WindowQuery {
    pub days: Option<i64>,
    pub limit: Option<i64>,
}

impl WindowQuery {
    fn days(&self) -> i64 {
        self.days
            .unwrap_or(DEFAULT_WINDOW_DAYS)
            .clamp(1, MAX_WINDOW_DAYS)
    }

    fn limit(&self, default: i64) -> usize {
        usize::try_from(normalize_limit(self.limit, default)).unwrap_or(usize::MAX)
    }
}

pub(super) async fn follower_growth_series(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(ctx): Extension<RequestContext>,
    Path(account_id): Path<i64>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<ApiResponse<Vec<GrowthPoint>>>, ApiError> {
    let account = owned_account(&state, ctx, account_id, &req_id).await?;
    let since = Utc::now() - Duration::days(query.days());
    let snapshots = cryptoscope_db::list_snapshots_since(&state.pool, account.id, since)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(req_id.0, follower_growth(&snapshots))))
}

pub(super) async fn top_posts_by_engagement(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(ctx): Extension<RequestContext>,
    Path(account_id): Path<i64>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<ApiResponse<Vec<TopPost>>>, ApiError> {
    let account = owned_account(&state, ctx, account_id, &req_id).await?;
    let since = Utc::now() - Duration::days(query.days());
    let posts = cryptoscope_db::list_posts_since(&state.pool, account.id, since)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(
        req_id.0,
        top_posts(&account.handle, &posts, query.limit(DEFAULT_TOP_POSTS)),
    )))
}

pub(super) async fn dashboard(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(ctx): Extension<RequestContext>,
    Path(account_id): Path<i64>,
) -> Result<Json<ApiResponse<DashboardStats>>, ApiError> {
    let account = owned_account(&state, ctx, account_id, &req_id).await?;
    let now = Utc::now();
    let since = now - Duration::days(DASHBOARD_WINDOW_DAYS);
    let db_err = |e: cryptoscope_db::DbError| map_db_error(req_id.0.clone(), &e);

    // The latest snapshot may predate the window.
    let latest = cryptoscope_db::list_recent_snapshots(&state.pool, account.id, 1)
        .await
        .map_err(db_err)?;
    let mut snapshots = cryptoscope_db::list_snapshots_since(&state.pool, account.id, since)
        .await
        .map_err(db_err)?;
    snapshots.extend(latest.into_iter().filter(|s| s.captured_at < since));
    let posts = cryptoscope_db::list_posts_since(&state.pool, account.id, since)
        .await
        .map_err(db_err)?;
    let mentions = cryptoscope_db::list_mentions_since(&state.pool, account.id, since)
        .await
        .map_err(db_err)?;

    Ok(Json(ApiResponse::new(
        req_id.0.clone(),
        dashboard_stats(now, &account, &snapshots, &posts, &mentions),
    )))
}

pub(super) async fn competitor_comparison(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(ctx): Extension<RequestContext>,
    Path(account_id): Path<i64>,
) -> Result<Json<ApiResponse<CompetitorComparison>>, ApiError> {
    let account = owned_account(&state, ctx, account_id, &req_id).await?;
    let latest = cryptoscope_db::list_recent_snapshots(&state.pool, account.id, 1)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let competitors = cryptoscope_db::list_competitors(&state.pool, ctx)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(
        req_id.0,
        compare_with_competitors(&account, latest.first(), &competitors),
    )))
}

pub(super) async fn top_mentioner_list(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(ctx): Extension<RequestContext>,
    Path(account_id): Path<i64>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<ApiResponse<Vec<Mentioner>>>, ApiError> {
    let account = owned_account(&state, ctx, account_id, &req_id).await?;
    let since = Utc::now() - Duration::days(query.days());
    let mentions = cryptoscope_db::list_mentions_since(&state.pool, account.id, since)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(
        req_id.0,
        top_mentioners(&mentions, query.limit(DEFAULT_TOP_MENTIONERS)),
    )))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use chrono::{Duration, Utc};
    use cryptoscope_core::{Observation, Sentiment};
    use cryptoscope_db::{NewMention, NewPost};
    use sqlx::PgPool;

    use crate::api::test_support::{app, seed_account, seed_user, send};

    async fn post(pool: &PgPool, account_id: i64, id: &str, likes: i64, retweets: i64) {
        let post = NewPost {
            external_id: id.to_owned(),
            text: String::new(),
            published_at: Utc::now() - Duration::hours(6),
            like_count: likes,
            retweet_count: retweets,
            reply_count: 0,
            impression_count: 0,
        };
        cryptoscope_db::upsert_post(pool, account_id, &post)
            .await
            .unwrap();
    }

    async fn mention(pool: &PgPool, account_id: i64, id: &str, author: &str) {
        let mention = NewMention {
            external_id: id.to_owned(),
            author_handle: author.to_owned(),
            author_follower_count: 100,
            text: "gm".to_owned(),
            published_at: Utc::now() - Duration::hours(2),
            sentiment: Sentiment::Positive,
            like_count: 0,
        };
        cryptoscope_db::insert_mention_if_new(pool, account_id, &mention)
            .await
            .unwrap();
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn growth_series_is_chronological(pool: PgPool) {
        let ctx = seed_user(&pool, "g@example.com").await;
        let account = seed_account(&pool, ctx, "grower").await;
        for followers in [1_000, 1_250] {
            let observation = Observation {
                follower_count: followers,
                ..Observation::default()
            };
            cryptoscope_db::ingest_snapshot(&pool, ctx, account.id, &observation)
                .await
                .unwrap();
        }

        let uri = format!("/api/v1/accounts/{}/growth?days=7", account.id);
        let (status, json) = send(app(pool), "GET", &uri, Some(ctx), None).await;
        assert_eq!(status, StatusCode::OK);
        let points = json["data"].as_array().unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0]["follower_count"], 1_000);
        assert_eq!(points[1]["follower_delta"], 250);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn top_posts_and_dashboard(pool: PgPool) {
        let ctx = seed_user(&pool, "t@example.com").await;
        let account = seed_account(&pool, ctx, "poster").await;
        post(&pool, account.id, "low", 5, 0).await;
        post(&pool, account.id, "high", 5, 10).await;
        mention(&pool, account.id, "m-1", "fan").await;

        let uri = format!("/api/v1/accounts/{}/top-posts?limit=1", account.id);
        let (status, json) = send(app(pool.clone()), "GET", &uri, Some(ctx), None).await;
        assert_eq!(status, StatusCode::OK);
        let top = json["data"].as_array().unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0]["external_id"], "high");
        assert_eq!(top[0]["engagement_score"], 25);

        let uri = format!("/api/v1/accounts/{}/dashboard", account.id);
        let (status, json) = send(app(pool), "GET", &uri, Some(ctx), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["posts_7d"], 2);
        assert_eq!(json["data"]["mentions_7d"], 1);
        assert_eq!(json["data"]["account"]["handle"], "poster");
        assert!(json["data"]["latest_snapshot"].is_null());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn comparison_includes_competitors(pool: PgPool) {
        let ctx = seed_user(&pool, "c@example.com").await;
        let account = seed_account(&pool, ctx, "me").await;
        let rival = cryptoscope_db::add_competitor(&pool, ctx, "rival").await.unwrap();
        cryptoscope_db::refresh_competitor(&pool, rival.id, 50_000, 10, 3.0)
            .await
            .unwrap();

        let uri = format!("/api/v1/accounts/{}/comparison", account.id);
        let (status, json) = send(app(pool), "GET", &uri, Some(ctx), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["rank"], 2);
        let entries = json["data"]["entries"].as_array().unwrap();
        assert_eq!(entries[0]["handle"], "rival");
        assert_eq!(entries[1]["is_own_account"], true);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn top_mentioners_for_owner_only(pool: PgPool) {
        let owner = seed_user(&pool, "m@example.com").await;
        let other = seed_user(&pool, "n@example.com").await;
        let account = seed_account(&pool, owner, "loud").await;
        mention(&pool, account.id, "m-1", "whale").await;
        mention(&pool, account.id, "m-2", "whale").await;
        mention(&pool, account.id, "m-3", "shrimp").await;

        let uri = format!("/api/v1/accounts/{}/top-mentioners", account.id);
        let (status, json) = send(app(pool.clone()), "GET", &uri, Some(owner), None).await;
        assert_eq!(status, StatusCode::OK);
        let top = json["data"].as_array().unwrap();
        assert_eq!(top[0]["handle"], "whale");
        assert_eq!(top[0]["mention_count"], 2);
        assert_eq!(top[0]["dominant_sentiment"], "positive");

        let (status, _) = send(app(pool), "GET", &uri, Some(other), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
