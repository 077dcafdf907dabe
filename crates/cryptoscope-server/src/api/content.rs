use axum::{Extension, Json};
use cryptoscope_insights::{build_thread, tweet_suggestions, ThreadStyle, Tone, MAX_THREAD_POINTS};
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiResponse};
use crate::middleware::RequestId;

const DEFAULT_SUGGESTION_COUNT: usize = 3;

#[derive(Debug, Deserialize)]
pub(super) struct SuggestionsBody {
    pub topic: String,
    pub tone: Option<String>,
    pub count: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ThreadBody {
    pub topic: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    pub style: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct SuggestionsView {
    pub tone: Tone,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct ThreadView {
    pub style: ThreadStyle,
    pub posts: Vec<String>,
}

fn require_topic(req_id: &RequestId, topic: &str) -> Result<(), ApiError> {
    if topic.trim().is_empty() {
        return Err(ApiError::new(
            req_id.0.clone(),
            "validation_error",
            "topic must not be empty",
        ));
    }
    Ok(())
}

pub(super) async fn suggestions(
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<SuggestionsBody>,
) -> Result<Json<ApiResponse<SuggestionsView>>, ApiError> {
    require_topic(&req_id, &body.topic)?;
    let tone = match body.tone.as_deref() {
        None => Tone::default(),
        Some(raw) => raw
            .parse::<Tone>()
            .map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e))?,
    };
    let count = body.count.unwrap_or(DEFAULT_SUGGESTION_COUNT).max(1);

    let suggestions = tweet_suggestions(&body.topic, tone, count);
    Ok(Json(ApiResponse::new(
        req_id.0,
        SuggestionsView { tone, suggestions },
    )))
}

pub(super) async fn thread(
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ThreadBody>,
) -> Result<Json<ApiResponse<ThreadView>>, ApiError> {
    require_topic(&req_id, &body.topic)?;
    if body.key_points.len() > MAX_THREAD_POINTS {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            format!("at most {MAX_THREAD_POINTS} key points are allowed"),
        ));
    }
    let style = match body.style.as_deref() {
        None => ThreadStyle::default(),
        Some(raw) => raw
            .parse::<ThreadStyle>()
            .map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e))?,
    };

    let posts = build_thread(&body.topic, &body.key_points, style);
    Ok(Json(ApiResponse::new(req_id.0, ThreadView { style, posts })))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::PgPool;

    use crate::api::test_support::{app, seed_user, send};

    #[sqlx::test(migrations = "../../migrations")]
    async fn suggestions_follow_tone_and_count(pool: PgPool) {
        let ctx = seed_user(&pool, "c@example.com").await;
        let body = json!({"topic": "Solana", "tone": "alpha", "count": 2});
        let (status, json) = send(
            app(pool),
            "POST",
            "/api/v1/content/suggestions",
            Some(ctx),
            Some(body),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["tone"], "alpha");
        let suggestions = json["data"]["suggestions"].as_array().unwrap();
        assert_eq!(suggestions.len(), 2);
        assert!(suggestions[0].as_str().unwrap().contains("Solana"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn unknown_tone_is_validation_error(pool: PgPool) {
        let ctx = seed_user(&pool, "t@example.com").await;
        let body = json!({"topic": "Solana", "tone": "angry"});
        let (status, json) = send(
            app(pool),
            "POST",
            "/api/v1/content/suggestions",
            Some(ctx),
            Some(body),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["message"], "unknown tone: angry");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn thread_wraps_points_with_hook_and_close(pool: PgPool) {
        let ctx = seed_user(&pool, "th@example.com").await;
        let body = json!({
            "topic": "restaking",
            "key_points": ["security is shared", "yield stacks"],
            "style": "alpha_leak"
        });
        let (status, json) =
            send(app(pool.clone()), "POST", "/api/v1/content/thread", Some(ctx), Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        let posts = json["data"]["posts"].as_array().unwrap();
        assert_eq!(posts.len(), 4);
        assert_eq!(posts[1], "2/ security is shared");

        let too_many: Vec<String> = (0..21).map(|i| format!("point {i}")).collect();
        let body = json!({"topic": "restaking", "key_points": too_many});
        let (status, _) = send(app(pool), "POST", "/api/v1/content/thread", Some(ctx), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
