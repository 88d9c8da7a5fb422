//! Match entity - drawn giver/recipient pairs
//!
//! Table: santa_match. Rows for a group are only ever replaced as a whole
//! by a draw.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "santa_match")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub group_id: i64,

    /// Giver
    pub santa_user_id: i64,

    pub recipient_user_id: i64,

    pub is_revealed: bool,

    /// Unix timestamp
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
