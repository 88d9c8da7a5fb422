//! Authentication middleware
//!
//! Provides session-based authentication for API routes

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde_json::json;
use std::ops::Deref;
use tower_sessions::Session;

use crate::entity::user;
use crate::state::AppState;

/// Session key for storing the user id
pub const SESSION_USER_KEY: &str = "user_id";
pub const SESSION_TIMESTAMP_KEY: &str = "timestamp";

/// Database connection wrapper for use in handlers via Extension
#[derive(Clone)]
pub struct DbConn(pub DatabaseConnection);

impl Deref for DbConn {
    type Target = DatabaseConnection;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Extension to store current user in request
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
    pub full_name: String,
}

/// Paths that don't require authentication
fn is_public_path(path: &str) -> bool {
    // Only API routes are authenticated
    if !path.starts_with("/api") {
        return true;
    }

    matches!(path, "/api/login" | "/api/register" | "/api/health")
}

/// Authentication middleware
pub async fn auth_layer(
    State(state): State<AppState>,
    session: Session,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    // All handlers access the db via Extension<DbConn>
    request.extensions_mut().insert(DbConn(state.db.clone()));

    if is_public_path(&path) {
        return next.run(request).await;
    }

    let user_id: Option<i64> = session.get(SESSION_USER_KEY).await.unwrap_or(None);

    let Some(user_id) = user_id else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"code": 401, "message": "Unauthorized"})),
        ).into_response();
    };

    match user::Entity::find_by_id(user_id).one(&state.db).await {
        Ok(Some(user_model)) => {
            request.extensions_mut().insert(CurrentUser {
                id: user_model.id,
                email: user_model.email,
                full_name: user_model.full_name,
            });

            next.run(request).await
        }
        Ok(None) => {
            tracing::warn!("Session refers to missing user: {}", user_id);
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"code": 401, "message": "invalid_session"})),
            ).into_response()
        }
        Err(e) => {
            tracing::error!("Database error during auth: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"code": 500, "message": "internal error"})),
            ).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_paths() {
        assert!(is_public_path("/api/login"));
        assert!(is_public_path("/api/register"));
        assert!(is_public_path("/api/health"));
        assert!(is_public_path("/index.html"));
        assert!(!is_public_path("/api/groups"));
        assert!(!is_public_path("/api/groups/1/draw"));
        assert!(!is_public_path("/api/logout"));
    }
}
