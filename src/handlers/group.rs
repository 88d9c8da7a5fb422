//! Group handlers
//!
//! Implements group creation, membership, the admin view and the draw trigger

use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::draw::store::load_matches;
use crate::draw::DrawOutcome;
use crate::entity::group::{self, GroupResponse, GroupStatus};
use crate::entity::group_member::{self, GroupMemberResponse};
use crate::entity::user;
use crate::error::{AppError, AppResult, OptionExt};
use crate::middleware::auth::CurrentUser;
use crate::middleware::DbConn;
use crate::routes::ApiResponse;
use crate::state::AppState;

/// Create group request
#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub budget: Option<String>,
    /// YYYY-MM-DD
    pub date: Option<String>,
}

/// Group with its members
#[derive(Debug, Serialize)]
pub struct GroupDetailResponse {
    #[serde(flatten)]
    pub group: GroupResponse,
    pub members: Vec<GroupMemberResponse>,
}

/// One drawn pair with display names
#[derive(Debug, Serialize)]
pub struct MatchDetail {
    pub id: i64,
    #[serde(rename = "isRevealed")]
    pub is_revealed: bool,
    pub santa: MatchPerson,
    pub recipient: MatchPerson,
}

#[derive(Debug, Serialize)]
pub struct MatchPerson {
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(rename = "fullName")]
    pub full_name: String,
}

/// Admin view: members plus every pairing once drawn
#[derive(Debug, Serialize)]
pub struct AdminGroupResponse {
    pub group: GroupDetailResponse,
    pub matches: Vec<MatchDetail>,
}

/// The caller's own recipient
#[derive(Debug, Serialize)]
pub struct MyMatchResponse {
    #[serde(rename = "groupId")]
    pub group_id: i64,
    pub recipient: MatchPerson,
    pub wishlist: Option<String>,
    #[serde(rename = "isRevealed")]
    pub is_revealed: bool,
}

async fn find_group(db: &DatabaseConnection, group_id: i64) -> AppResult<group::Model> {
    group::Entity::find_by_id(group_id)
        .one(db)
        .await?
        .ok_or_not_found("Group not found")
}

async fn find_membership(
    db: &DatabaseConnection,
    group_id: i64,
    user_id: i64,
) -> AppResult<Option<group_member::Model>> {
    Ok(group_member::Entity::find()
        .filter(group_member::Column::GroupId.eq(group_id))
        .filter(group_member::Column::UserId.eq(user_id))
        .one(db)
        .await?)
}

/// Users keyed by id
async fn users_by_id(
    db: &DatabaseConnection,
    ids: Vec<i64>,
) -> AppResult<HashMap<i64, user::Model>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let users = user::Entity::find()
        .filter(user::Column::Id.is_in(ids))
        .all(db)
        .await?;
    Ok(users.into_iter().map(|u| (u.id, u)).collect())
}

async fn group_detail(
    db: &DatabaseConnection,
    group: group::Model,
    viewer_id: i64,
) -> AppResult<GroupDetailResponse> {
    let members = group_member::Entity::find()
        .filter(group_member::Column::GroupId.eq(group.id))
        .order_by_asc(group_member::Column::JoinedAt)
        .order_by_asc(group_member::Column::Id)
        .all(db)
        .await?;

    let users = users_by_id(db, members.iter().map(|m| m.user_id).collect()).await?;
    let members = members
        .into_iter()
        .map(|m| {
            let info = users.get(&m.user_id).cloned();
            let resp = GroupMemberResponse::from(m);
            match info {
                Some(u) => resp.with_user_info(u.full_name, u.avatar_url),
                None => resp,
            }
        })
        .collect();

    Ok(GroupDetailResponse {
        group: GroupResponse::from(group).for_user(viewer_id),
        members,
    })
}

fn parse_exchange_date(date: Option<String>) -> AppResult<Option<NaiveDate>> {
    match date.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| AppError::Validation(format!("Invalid date: {}", s))),
    }
}

/// POST /api/groups
pub async fn create_group(
    Extension(db): Extension<DbConn>,
    Extension(current_user): Extension<CurrentUser>,
    Json(req): Json<CreateGroupRequest>,
) -> AppResult<Json<ApiResponse<GroupResponse>>> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }
    let budget_limit = req.budget.map(|b| b.trim().to_string()).filter(|b| !b.is_empty());
    let exchange_date = parse_exchange_date(req.date)?;
    let admin_id = current_user.id;

    // Group and the creator's membership are written together
    let group = (&*db)
        .transaction::<_, group::Model, sea_orm::DbErr>(|txn| {
            Box::pin(async move {
                let now = chrono::Utc::now().timestamp();
                let group = group::ActiveModel {
                    name: Set(name),
                    budget_limit: Set(budget_limit),
                    exchange_date: Set(exchange_date),
                    admin_user_id: Set(admin_id),
                    status: Set(GroupStatus::Planning.as_str().to_string()),
                    created_at: Set(now),
                    ..Default::default()
                }
                .insert(txn)
                .await?;

                group_member::ActiveModel {
                    group_id: Set(group.id),
                    user_id: Set(admin_id),
                    wishlist: Set(None),
                    joined_at: Set(now),
                    ..Default::default()
                }
                .insert(txn)
                .await?;

                Ok(group)
            })
        })
        .await
        .map_err(|e| match e {
            TransactionError::Connection(err) | TransactionError::Transaction(err) => {
                AppError::Database(err)
            }
        })?;

    tracing::info!("Group {} created by user {}", group.id, admin_id);
    Ok(Json(ApiResponse::success(GroupResponse::from(group).for_user(admin_id))))
}

/// GET /api/groups - groups the current user belongs to
pub async fn list_groups(
    Extension(db): Extension<DbConn>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<ApiResponse<Vec<GroupResponse>>>> {
    let memberships = group_member::Entity::find()
        .filter(group_member::Column::UserId.eq(current_user.id))
        .all(&*db)
        .await?;

    let group_ids: Vec<i64> = memberships.iter().map(|m| m.group_id).collect();
    if group_ids.is_empty() {
        return Ok(Json(ApiResponse::success(Vec::new())));
    }

    let groups = group::Entity::find()
        .filter(group::Column::Id.is_in(group_ids))
        .order_by_desc(group::Column::CreatedAt)
        .order_by_desc(group::Column::Id)
        .all(&*db)
        .await?;

    let groups = groups
        .into_iter()
        .map(|g| GroupResponse::from(g).for_user(current_user.id))
        .collect();
    Ok(Json(ApiResponse::success(groups)))
}

/// GET /api/groups/:id
pub async fn get_group(
    Extension(db): Extension<DbConn>,
    Extension(current_user): Extension<CurrentUser>,
    Path(group_id): Path<i64>,
) -> AppResult<Json<ApiResponse<GroupDetailResponse>>> {
    let group = find_group(&db, group_id).await?;
    let detail = group_detail(&db, group, current_user.id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// POST /api/groups/:id/join
pub async fn join_group(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Extension(current_user): Extension<CurrentUser>,
    Path(group_id): Path<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    find_group(&db, group_id).await?;

    // Status check and insert must not interleave with a draw
    let _guard = state.draws.lock_group(group_id).await;
    let group = find_group(&db, group_id).await?;
    if group.status() != GroupStatus::Planning {
        return Err(AppError::Conflict(
            "Group is already closed for new members".to_string(),
        ));
    }

    if find_membership(&db, group_id, current_user.id).await?.is_some() {
        return Err(AppError::Conflict("Already a member".to_string()));
    }

    group_member::ActiveModel {
        group_id: Set(group_id),
        user_id: Set(current_user.id),
        wishlist: Set(None),
        joined_at: Set(chrono::Utc::now().timestamp()),
        ..Default::default()
    }
    .insert(&*db)
    .await?;

    tracing::info!("User {} joined group {}", current_user.id, group_id);
    Ok(Json(ApiResponse::success_msg("joined")))
}

/// GET /api/groups/:id/admin - full view including all pairings
pub async fn admin_view(
    Extension(db): Extension<DbConn>,
    Extension(current_user): Extension<CurrentUser>,
    Path(group_id): Path<i64>,
) -> AppResult<Json<ApiResponse<AdminGroupResponse>>> {
    let group = find_group(&db, group_id).await?;
    if !group.is_admin(current_user.id) {
        return Err(AppError::Forbidden(
            "Access denied. You are not the admin.".to_string(),
        ));
    }

    let drawn = group.status() == GroupStatus::Drawn;
    let detail = group_detail(&db, group, current_user.id).await?;

    let mut matches = Vec::new();
    if drawn {
        let rows = load_matches(&db, group_id).await?;
        let ids = rows
            .iter()
            .flat_map(|m| [m.santa_user_id, m.recipient_user_id])
            .collect();
        let users = users_by_id(&db, ids).await?;
        let person = |user_id: i64| MatchPerson {
            user_id,
            full_name: users
                .get(&user_id)
                .map(|u| u.full_name.clone())
                .unwrap_or_default(),
        };

        matches = rows
            .iter()
            .map(|m| MatchDetail {
                id: m.id,
                is_revealed: m.is_revealed,
                santa: person(m.santa_user_id),
                recipient: person(m.recipient_user_id),
            })
            .collect();
    }

    Ok(Json(ApiResponse::success(AdminGroupResponse {
        group: detail,
        matches,
    })))
}

/// POST /api/groups/:id/draw
pub async fn draw_names(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Extension(current_user): Extension<CurrentUser>,
    Path(group_id): Path<i64>,
) -> AppResult<Json<ApiResponse<DrawOutcome>>> {
    let outcome = state.draws.draw_group(&db, current_user.id, group_id).await?;
    Ok(Json(ApiResponse::success(outcome)))
}

/// GET /api/groups/:id/match - who the current user gives to
pub async fn my_match(
    Extension(db): Extension<DbConn>,
    Extension(current_user): Extension<CurrentUser>,
    Path(group_id): Path<i64>,
) -> AppResult<Json<ApiResponse<MyMatchResponse>>> {
    let group = find_group(&db, group_id).await?;
    if find_membership(&db, group_id, current_user.id).await?.is_none() {
        return Err(AppError::Forbidden("Not a member of this group".to_string()));
    }
    if group.status() == GroupStatus::Planning {
        return Err(AppError::NotFound("Names have not been drawn yet".to_string()));
    }

    let own = load_matches(&db, group_id)
        .await?
        .into_iter()
        .find(|m| m.santa_user_id == current_user.id)
        .ok_or_not_found("No match for current user")?;

    let recipient = user::Entity::find_by_id(own.recipient_user_id)
        .one(&*db)
        .await?
        .ok_or_not_found("Recipient not found")?;
    let wishlist = find_membership(&db, group_id, recipient.id)
        .await?
        .and_then(|m| m.wishlist);

    Ok(Json(ApiResponse::success(MyMatchResponse {
        group_id,
        recipient: MatchPerson {
            user_id: recipient.id,
            full_name: recipient.full_name,
        },
        wishlist,
        is_revealed: own.is_revealed,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exchange_date() {
        assert_eq!(parse_exchange_date(None).unwrap(), None);
        assert_eq!(parse_exchange_date(Some("  ".to_string())).unwrap(), None);
        assert_eq!(
            parse_exchange_date(Some("2026-12-24".to_string())).unwrap(),
            NaiveDate::from_ymd_opt(2026, 12, 24)
        );
        assert!(matches!(
            parse_exchange_date(Some("24/12/2026".to_string())),
            Err(AppError::Validation(_))
        ));
    }
}
