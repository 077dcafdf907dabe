use axum::{extract::State, Extension, Json};
use cryptoscope_core::RequestContext;
use serde::{Deserialize, Serialize};

use super::{map_db_error, ApiError, ApiResponse, AppState};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize, Serialize)]
pub(super) struct NotificationSettings {
    pub email_notifications: bool,
}

/// Turns alert and weekly-report emails on or off for the caller.
pub(super) async fn update_notifications(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<NotificationSettings>,
) -> Result<Json<ApiResponse<NotificationSettings>>, ApiError> {
    cryptoscope_db::set_email_notifications(&state.pool, ctx.user_id, body.email_notifications)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    tracing::info!(
        user_id = ctx.user_id,
        enabled = body.email_notifications,
        "email notification preference updated"
    );
    Ok(Json(ApiResponse::new(req_id.0, body)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::PgPool;

    use crate::api::test_support::{app, seed_user, send};

    #[sqlx::test(migrations = "../../migrations")]
    async fn opting_out_is_persisted(pool: PgPool) {
        let ctx = seed_user(&pool, "prefs@example.com").await;
        let (status, json) = send(
            app(pool.clone()),
            "PUT",
            "/api/v1/settings/notifications",
            Some(ctx),
            Some(json!({"email_notifications": false})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["email_notifications"], false);

        let contact = cryptoscope_db::get_user_contact(&pool, ctx.user_id)
            .await
            .unwrap();
        assert!(!contact.email_notifications);
    }
}
