mod accounts;
mod agents;
mod alerts;
mod analytics;
mod competitors;
mod content;
mod settings;
mod sync_jobs;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use cryptoscope_db::DbError;
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::jobs::{JobError, Services};
use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, require_user, AuthState, RateLimitState,
    RequestId, USER_ID_HEADER,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub services: Arc<Services>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(request_id: String, data: T) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" | "quota_exceeded" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "upstream_failure" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn normalize_limit(limit: Option<i64>, default: i64) -> i64 {
    limit.unwrap_or(default).clamp(1, 200)
}

pub(super) fn map_db_error(request_id: String, error: &DbError) -> ApiError {
    match error {
        DbError::NotFound => ApiError::new(request_id, "not_found", "resource not found"),
        DbError::QuotaExceeded { limit } => ApiError::new(
            request_id,
            "quota_exceeded",
            format!("competitor limit reached: at most {limit} per user"),
        ),
        DbError::InvalidSyncJobTransition { .. } | DbError::InvalidAgentTaskTransition { .. } => {
            tracing::warn!(error = %error, "rejected state transition");
            ApiError::new(request_id, "conflict", error.to_string())
        }
        _ => {
            tracing::error!(error = %error, "database query failed");
            ApiError::new(request_id, "internal_error", "database query failed")
        }
    }
}

pub(super) fn map_job_error(request_id: String, error: &JobError) -> ApiError {
    match error {
        JobError::Db(db) => map_db_error(request_id, db),
        JobError::Source(_) | JobError::SourceUnavailable => {
            tracing::warn!(error = %error, "profile source failed");
            ApiError::new(request_id, "upstream_failure", error.to_string())
        }
        JobError::Notify(_) => {
            tracing::error!(error = %error, "pipeline failed");
            ApiError::new(request_id, "internal_error", "pipeline failed")
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
            HeaderName::from_static(USER_ID_HEADER),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/alerts", get(alerts::list_alerts))
        .route(
            "/api/v1/accounts",
            get(accounts::list_accounts).post(accounts::connect_account),
        )
        .route(
            "/api/v1/accounts/{account_id}",
            delete(accounts::disconnect_account),
        )
        .route(
            "/api/v1/accounts/{account_id}/health",
            get(accounts::account_health),
        )
        .route(
            "/api/v1/accounts/{account_id}/sentiment",
            get(accounts::account_sentiment),
        )
        .route(
            "/api/v1/accounts/{account_id}/best-times",
            get(accounts::best_times),
        )
        .route(
            "/api/v1/accounts/{account_id}/hashtags",
            get(accounts::trending_hashtags),
        )
        .route(
            "/api/v1/accounts/{account_id}/growth",
            get(analytics::follower_growth_series),
        )
        .route(
            "/api/v1/accounts/{account_id}/top-posts",
            get(analytics::top_posts_by_engagement),
        )
        .route(
            "/api/v1/accounts/{account_id}/dashboard",
            get(analytics::dashboard),
        )
        .route(
            "/api/v1/accounts/{account_id}/comparison",
            get(analytics::competitor_comparison),
        )
        .route(
            "/api/v1/accounts/{account_id}/top-mentioners",
            get(analytics::top_mentioner_list),
        )
        .route(
            "/api/v1/accounts/{account_id}/sync",
            post(sync_jobs::trigger_sync),
        )
        .route("/api/v1/sync-jobs", get(sync_jobs::list_sync_jobs))
        .route(
            "/api/v1/competitors",
            get(competitors::list_competitors).post(competitors::add_competitor),
        )
        .route(
            "/api/v1/competitors/{competitor_id}",
            delete(competitors::remove_competitor),
        )
        .route(
            "/api/v1/competitors/{competitor_id}/refresh",
            post(competitors::refresh_competitor),
        )
        .route(
            "/api/v1/agents",
            get(agents::list_agents).post(agents::register_agent),
        )
        .route("/api/v1/agents/stats", get(agents::agent_stats))
        .route("/api/v1/agents/tasks", get(agents::list_tasks))
        .route("/api/v1/agents/{agent_id}", delete(agents::delete_agent))
        .route("/api/v1/agents/{agent_id}/pause", post(agents::pause_agent))
        .route("/api/v1/agents/{agent_id}/resume", post(agents::resume_agent))
        .route(
            "/api/v1/agents/{agent_id}/tasks",
            post(agents::submit_task),
        )
        .route(
            "/api/v1/content/suggestions",
            post(content::suggestions),
        )
        .route("/api/v1/content/thread", post(content::thread))
        .route(
            "/api/v1/settings/notifications",
            put(settings::update_notifications),
        )
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                ))
                .layer(axum::middleware::from_fn(require_user)),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match cryptoscope_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

#[must_use]
pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use cryptoscope_core::{Account, RequestContext};
    use sqlx::PgPool;
    use tower::ServiceExt;

    use super::{build_app, default_rate_limit_state, AppState};
    use crate::jobs::fakes::services;
    use crate::jobs::Services;
    use crate::middleware::AuthState;

    pub(crate) fn app_with(pool: PgPool, services: Services) -> Router {
        build_app(
            AppState {
                pool,
                services: Arc::new(services),
            },
            AuthState::disabled(),
            default_rate_limit_state(),
        )
    }

    pub(crate) fn app(pool: PgPool) -> Router {
        app_with(pool, services(None, None, "http://127.0.0.1:9"))
    }

    pub(crate) async fn seed_user(pool: &PgPool, email: &str) -> RequestContext {
        let id = cryptoscope_db::create_user(pool, email, None)
            .await
            .expect("create user");
        RequestContext::new(id)
    }

    pub(crate) async fn seed_account(pool: &PgPool, ctx: RequestContext, handle: &str) -> Account {
        cryptoscope_db::create_account(pool, ctx, handle, None)
            .await
            .expect("create account")
    }

    /// Sends one request as `ctx` and returns the status with the parsed body.
    pub(crate) async fn send(
        app: Router,
        method: &str,
        uri: &str,
        ctx: Option<RequestContext>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(ctx) = ctx {
            builder = builder.header("x-user-id", ctx.user_id.to_string());
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };

        let response = app.oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json parse")
        };
        (status, json)
    }
}
