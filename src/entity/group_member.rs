//! GroupMember entity - group membership table
//!
//! Table: santa_group_member

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "santa_group_member")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub group_id: i64,

    pub user_id: i64,

    /// Stored only, not managed by this service
    #[sea_orm(column_type = "Text", nullable)]
    pub wishlist: Option<String>,

    /// Unix timestamp
    pub joined_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Group member response (with user details)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupMemberResponse {
    pub id: i64,
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(rename = "fullName")]
    pub full_name: Option<String>,
    #[serde(rename = "avatarUrl")]
    pub avatar_url: Option<String>,
    #[serde(rename = "joinedAt")]
    pub joined_at: i64,
}

impl From<Model> for GroupMemberResponse {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            full_name: None,
            avatar_url: None,
            joined_at: model.joined_at,
        }
    }
}

impl GroupMemberResponse {
    pub fn with_user_info(mut self, full_name: String, avatar_url: Option<String>) -> Self {
        self.full_name = Some(full_name);
        self.avatar_url = avatar_url;
        self
    }
}
