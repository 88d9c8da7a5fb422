//! Group entity - gift exchange group table
//!
//! Table: santa_group

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Group lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupStatus {
    /// Accepting members, no matches yet
    Planning,
    /// Matches drawn
    Drawn,
    /// Exchange finished
    Completed,
}

impl GroupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupStatus::Planning => "planning",
            GroupStatus::Drawn => "drawn",
            GroupStatus::Completed => "completed",
        }
    }
}

impl From<&str> for GroupStatus {
    fn from(value: &str) -> Self {
        match value {
            "drawn" => GroupStatus::Drawn,
            "completed" => GroupStatus::Completed,
            _ => GroupStatus::Planning,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "santa_group")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(column_type = "String(Some(64))")]
    pub name: String,

    /// Free-form spending limit, e.g. "$25"
    #[sea_orm(column_type = "String(Some(32))", nullable)]
    pub budget_limit: Option<String>,

    pub exchange_date: Option<Date>,

    pub admin_user_id: i64,

    /// planning | drawn | completed
    #[sea_orm(column_type = "String(Some(16))")]
    pub status: String,

    /// Unix timestamp
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

// Members and matches are queried manually by group_id

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn status(&self) -> GroupStatus {
        GroupStatus::from(self.status.as_str())
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_user_id == user_id
    }
}

/// Group response
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupResponse {
    pub id: i64,
    pub name: String,
    #[serde(rename = "budgetLimit")]
    pub budget_limit: Option<String>,
    #[serde(rename = "exchangeDate")]
    pub exchange_date: Option<Date>,
    #[serde(rename = "adminUserId")]
    pub admin_user_id: i64,
    pub status: GroupStatus,
    /// Whether the requesting user is the group admin
    pub admin: bool,
}

impl From<Model> for GroupResponse {
    fn from(model: Model) -> Self {
        let status = model.status();
        Self {
            id: model.id,
            name: model.name,
            budget_limit: model.budget_limit,
            exchange_date: model.exchange_date,
            admin_user_id: model.admin_user_id,
            status,
            admin: false,
        }
    }
}

impl GroupResponse {
    pub fn for_user(mut self, user_id: i64) -> Self {
        self.admin = self.admin_user_id == user_id;
        self
    }
}
