//! Authentication handlers
//!
//! Implements register, login, logout, and current user endpoints

use axum::{extract::State, Extension, Json};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::entity::user::{self, UserResponse};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{CurrentUser, SESSION_TIMESTAMP_KEY, SESSION_USER_KEY};
use crate::middleware::DbConn;
use crate::routes::ApiResponse;
use crate::state::AppState;

/// Register request body
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Insert a user. A concurrent registration that won the race on the same
/// email surfaces as the unique index violation and becomes a conflict.
async fn insert_user(
    db: &DatabaseConnection,
    email: String,
    full_name: String,
    password_hash: String,
) -> AppResult<user::Model> {
    user::ActiveModel {
        email: Set(email),
        full_name: Set(full_name),
        password: Set(password_hash),
        avatar_url: Set(None),
        created_at: Set(chrono::Utc::now().timestamp()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("Email already taken".to_string())
        }
        _ => AppError::Database(e),
    })
}

/// POST /api/register
pub async fn register(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let name = req.name.trim();
    let email = req.email.trim().to_lowercase();
    if name.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation("Missing fields".to_string()));
    }
    if !email.contains('@') {
        return Err(AppError::Validation("Invalid email".to_string()));
    }

    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&*db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict("Email already taken".to_string()));
    }

    let hashed = bcrypt::hash(&req.password, state.config.auth.bcrypt_cost)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

    let new_user = insert_user(&db, email, name.to_string(), hashed).await?;

    tracing::info!("User registered: {}", new_user.email);
    Ok(Json(ApiResponse::success(new_user.into())))
}

/// POST /api/login
pub async fn login(
    Extension(db): Extension<DbConn>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    if req.email.is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest("Missing email or password".to_string()));
    }

    let email = req.email.trim().to_lowercase();
    let db_user = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&*db)
        .await?;

    let Some(db_user) = db_user else {
        tracing::warn!("Login failed: user not found - {}", email);
        return Err(AppError::BadRequest("email or password error".to_string()));
    };

    let password_valid = bcrypt::verify(&req.password, &db_user.password).unwrap_or(false);
    if !password_valid {
        tracing::warn!("Login failed: wrong password - {}", email);
        return Err(AppError::BadRequest("email or password error".to_string()));
    }

    session
        .insert(SESSION_USER_KEY, db_user.id)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to save session: {}", e)))?;
    if let Err(e) = session.insert(SESSION_TIMESTAMP_KEY, chrono::Utc::now().timestamp()).await {
        tracing::error!("Failed to save session timestamp: {}", e);
    }

    tracing::info!("User logged in: {}", db_user.email);
    Ok(Json(ApiResponse::success(db_user.into())))
}

/// POST /api/logout
pub async fn logout(
    session: Session,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<ApiResponse<()>>> {
    session
        .flush()
        .await
        .map_err(|e| AppError::Internal(format!("Failed to flush session: {}", e)))?;

    tracing::info!("User logged out: {}", current_user.email);
    Ok(Json(ApiResponse::success_msg("logout success")))
}

/// GET /api/user/current
pub async fn current_user(
    Extension(user): Extension<CurrentUser>,
) -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::success(serde_json::json!({
        "id": user.id,
        "email": user.email,
        "fullName": user.full_name,
    })))
}
